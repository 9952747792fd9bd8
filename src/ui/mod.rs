//! Interactive terminal front-end. Presentation only: profile
//! collection, job-list display, and recommendation rendering. The
//! fitness markers and the Medium-tier caveat are display concerns and
//! live here, not in the data model.

use std::sync::Arc;

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Select};

use crate::config::{Config, LlmProvider};
use crate::extract::{heuristics, JobRecord};
use crate::ops;
use crate::rank::{CandidateProfile, Fitness, Recommendation};
use crate::AppState;

/// Input-boundary cap on the experience field.
const MAX_EXPERIENCE_CHARS: usize = 100;

/// How many job rows the list view prints before eliding.
const JOB_LIST_PREVIEW: usize = 20;

const MEDIUM_CAVEAT: &str = "（参考程度にご検討ください。正確ではない可能性があります）";

/// Per-session state: one extraction run's records plus the
/// recommendations scoped to them. Reset on reload, replaced on each
/// ranking call.
#[derive(Default)]
pub struct Session {
    pub jobs: Vec<JobRecord>,
    pub recommendations: Vec<Recommendation>,
}

pub async fn run_app(state: Arc<AppState>) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut session = Session::default();

    println!(
        "{}",
        style("jobscout - AI powered job matching").cyan().bold()
    );

    loop {
        let items = [
            "Load job listings",
            "Deep crawl for more listings",
            "Fetch job details",
            "Get AI recommendations",
            "Show loaded jobs",
            "Category summary",
            "LLM settings",
            "Quit",
        ];
        let choice = Select::with_theme(&theme)
            .with_prompt("Menu")
            .items(&items)
            .default(0)
            .interact()?;

        match choice {
            0 => load_jobs(&state, &mut session).await,
            1 => crawl_jobs(&state, &mut session).await,
            2 => enrich_jobs(&state, &mut session).await,
            3 => rank_flow(&state, &mut session, &theme).await?,
            4 => show_jobs(&session),
            5 => show_categories(&session),
            6 => llm_settings(&state, &theme).await?,
            _ => break,
        }
        println!();
    }

    Ok(())
}

async fn load_jobs(state: &AppState, session: &mut Session) {
    let url = Config::load().effective_start_url();
    println!("Fetching listings from {}...", style(&url).dim());

    match ops::run_extract(&state.site, &url).await {
        Ok(jobs) if jobs.is_empty() => {
            println!("{}", style("No job records found on the page.").yellow());
        }
        Ok(jobs) => {
            println!("{}", style(format!("{}件の求人があります", jobs.len())).green());
            session.jobs = jobs;
            session.recommendations.clear();
        }
        Err(e) => {
            println!("{}", style(format!("Failed to load jobs: {e}")).red());
        }
    }
}

async fn crawl_jobs(state: &AppState, session: &mut Session) {
    let config = Config::load();
    let url = config.effective_start_url();
    println!(
        "Deep crawling from {} (this respects a {}ms delay between requests)...",
        style(&url).dim(),
        config.crawl.request_delay_ms
    );

    match ops::run_crawl(&state.site, config.crawl, &url).await {
        Ok(jobs) if jobs.is_empty() => {
            println!("{}", style("The crawl found no job records.").yellow());
        }
        Ok(jobs) => {
            println!("{}", style(format!("{}件の求人があります", jobs.len())).green());
            session.jobs = jobs;
            session.recommendations.clear();
        }
        Err(e) => {
            println!("{}", style(format!("Crawl failed: {e}")).red());
        }
    }
}

async fn enrich_jobs(state: &AppState, session: &mut Session) {
    if session.jobs.is_empty() {
        println!("{}", style("Load job listings first.").yellow());
        return;
    }

    let config = Config::load();
    println!("Fetching detail pages for up to {} jobs...", config.crawl.max_jobs);

    match ops::run_enrich(&state.site, config.crawl, &mut session.jobs).await {
        Ok(enriched) => {
            println!(
                "{}",
                style(format!("{enriched}件の求人に詳細情報を追加しました")).green()
            );
        }
        Err(e) => {
            println!("{}", style(format!("Detail fetch failed: {e}")).red());
        }
    }
}

async fn rank_flow(state: &AppState, session: &mut Session, theme: &ColorfulTheme) -> Result<()> {
    if session.jobs.is_empty() {
        println!(
            "{}",
            style("Load job listings first, there is nothing to rank yet.").yellow()
        );
        return Ok(());
    }

    let profile = collect_profile(theme)?;
    println!("Analyzing {} jobs against your profile...", session.jobs.len());

    let llm = state.llm.lock().unwrap().clone();
    let outcome = ops::run_rank(&llm, &profile, &session.jobs).await;

    session.recommendations = outcome.recommendations.clone();
    display_recommendations(session, &outcome.message);
    Ok(())
}

fn collect_profile(theme: &ColorfulTheme) -> Result<CandidateProfile> {
    let industry: String = Input::with_theme(theme)
        .with_prompt("業界 (例: 自動車業界, IT業界, 製造業)")
        .validate_with(require_nonempty)
        .interact_text()?;

    let job_type: String = Input::with_theme(theme)
        .with_prompt("職種 (例: 生産技術, システム開発, 営業)")
        .validate_with(require_nonempty)
        .interact_text()?;

    let work_experience: String = Input::with_theme(theme)
        .with_prompt(format!("これまでのご経験 ({MAX_EXPERIENCE_CHARS}文字以内)"))
        .validate_with(|input: &String| -> Result<(), String> {
            if input.trim().is_empty() {
                return Err("入力してください".to_string());
            }
            if input.chars().count() > MAX_EXPERIENCE_CHARS {
                return Err(format!("{MAX_EXPERIENCE_CHARS}文字以内で入力してください"));
            }
            Ok(())
        })
        .interact_text()?;

    Ok(CandidateProfile {
        industry,
        job_type,
        work_experience,
    })
}

fn require_nonempty(input: &String) -> Result<(), String> {
    if input.trim().is_empty() {
        Err("入力してください".to_string())
    } else {
        Ok(())
    }
}

fn display_recommendations(session: &Session, message: &str) {
    println!("\n{}", style(message).green());
    if session.recommendations.is_empty() {
        return;
    }

    let high: Vec<&Recommendation> = by_fitness(session, Fitness::High);
    let medium: Vec<&Recommendation> = by_fitness(session, Fitness::Medium);
    let other: Vec<&Recommendation> = by_fitness(session, Fitness::LowOrNone);

    println!(
        "総提案数: {}  推奨度高: {}  参考: {}",
        session.recommendations.len(),
        high.len(),
        medium.len()
    );

    if !high.is_empty() {
        println!("\n{}", style("◎ 推奨求人").bold());
        for (i, rec) in high.iter().enumerate() {
            print_entry(session, i + 1, rec);
        }
    }

    if !medium.is_empty() {
        println!("\n{}", style("○ 参考求人").bold());
        println!("{}", style(MEDIUM_CAVEAT).dim());
        for (i, rec) in medium.iter().enumerate() {
            print_entry(session, high.len() + i + 1, rec);
        }
    }

    if !other.is_empty() {
        println!("\n{}", style("△ その他の提案").bold());
        for (i, rec) in other.iter().enumerate() {
            print_entry(session, high.len() + medium.len() + i + 1, rec);
        }
    }
}

fn by_fitness(session: &Session, fitness: Fitness) -> Vec<&Recommendation> {
    session
        .recommendations
        .iter()
        .filter(|rec| rec.fitness == fitness)
        .collect()
}

fn print_entry(session: &Session, position: usize, rec: &Recommendation) {
    // job_reference was validated against this snapshot by the parser.
    let Some(job) = session.jobs.get(rec.job_reference - 1) else {
        return;
    };

    println!("{}. {}", position, style(&job.title).bold());
    println!("   {}", style(&job.url).dim());
    println!("   {}", rendered_reason(rec));
}

/// Builds the display reason: fitness marker prefix, the model's
/// justification, appended notes, and the Medium-tier caveat.
fn rendered_reason(rec: &Recommendation) -> String {
    let marker = match rec.fitness {
        Fitness::Medium => "【適合度: 中・参考】".to_string(),
        other => format!("【適合度: {}】", other.as_japanese()),
    };

    let mut reason = format!("{}{}", marker, rec.reason);
    if let Some(notes) = &rec.notes {
        reason.push_str(&format!(" ※{}", notes));
    }
    if rec.fitness == Fitness::Medium {
        reason.push_str(MEDIUM_CAVEAT);
    }
    reason
}

fn show_jobs(session: &Session) {
    if session.jobs.is_empty() {
        println!("{}", style("No jobs loaded yet.").yellow());
        return;
    }

    for (i, job) in session.jobs.iter().take(JOB_LIST_PREVIEW).enumerate() {
        let code = job.job_code.as_deref().unwrap_or("-");
        println!(
            "{:3}. [{}] {} {}",
            i + 1,
            code,
            job.title,
            style(format!("({})", job.source.as_str())).dim()
        );
        if let Some(meta) = job.metadata_summary() {
            println!("     {}", style(meta).dim());
        }
    }
    if session.jobs.len() > JOB_LIST_PREVIEW {
        println!("... and {} more", session.jobs.len() - JOB_LIST_PREVIEW);
    }
}

fn show_categories(session: &Session) {
    if session.jobs.is_empty() {
        println!("{}", style("No jobs loaded yet.").yellow());
        return;
    }

    for (label, count) in heuristics::categorize(&session.jobs) {
        println!("{:<12} {}", label, count);
    }
}

async fn llm_settings(state: &AppState, theme: &ColorfulTheme) -> Result<()> {
    let providers = ["LM Studio (local)", "OpenAI"];
    let choice = Select::with_theme(theme)
        .with_prompt("Provider")
        .items(&providers)
        .default(0)
        .interact()?;

    let provider = if choice == 0 {
        LlmProvider::LmStudio
    } else {
        LlmProvider::OpenAi
    };

    let mut config = Config::load();
    config.llm_provider = provider;

    let api_key = if provider == LlmProvider::OpenAi {
        match config.resolve_api_key() {
            Some(key) => Some(key),
            None => {
                let entered: String = Input::with_theme(theme)
                    .with_prompt("OpenAI API key")
                    .allow_empty(true)
                    .interact_text()?;
                let entered = entered.trim().to_string();
                if entered.is_empty() {
                    None
                } else {
                    config.openai_api_key = Some(entered.clone());
                    Some(entered)
                }
            }
        }
    } else {
        None
    };

    state
        .llm
        .lock()
        .unwrap()
        .set_auth(provider.base_url(), api_key);

    let models = {
        let llm = state.llm.lock().unwrap().clone();
        llm.fetch_models().await
    };

    match models {
        Ok(models) if !models.is_empty() => {
            let idx = Select::with_theme(theme)
                .with_prompt("Model")
                .items(&models)
                .default(0)
                .interact()?;
            let chosen = models[idx].clone();
            state.llm.lock().unwrap().set_model(&chosen);
            config.last_model = Some(chosen);
        }
        _ => {
            let fallback = provider.default_model();
            println!(
                "{}",
                style(format!("Could not list models; using {fallback}")).yellow()
            );
            state.llm.lock().unwrap().set_model(fallback);
            config.last_model = Some(fallback.to_string());
        }
    }

    config.save()?;
    Ok(())
}
