use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use clap::{Parser, Subcommand};

mod config;
mod extract;
mod fetch;
mod llm;
mod ops;
mod rank;
mod ui;

use fetch::JobSiteClient;
use llm::LlmClient;

#[derive(Parser)]
#[command(name = "jobscout")]
#[command(version = "1.0")]
#[command(about = "Recruiting-portal job extraction and AI matching", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Fetch the listing page and print the extracted jobs
    Extract {
        /// Listing URL (defaults to the configured portal)
        url: Option<String>,
    },
    /// Deep-crawl job-related links from the start URL
    Crawl {
        /// Start URL (defaults to the configured portal)
        url: Option<String>,
    },
    /// Open the interactive menu (default)
    Menu,
}

pub struct AppState {
    pub site: Arc<JobSiteClient>,
    pub llm: Arc<Mutex<LlmClient>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let app_dir = config::Config::get_app_data_dir();

    // Setup logging: full logs to file, only errors to stderr so the
    // interactive prompts stay readable.
    let file_appender = tracing_appender::rolling::never(app_dir, "debug.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(tracing_subscriber::EnvFilter::new("debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new("error")),
        )
        .init();

    let cfg = config::Config::load();
    let site = Arc::new(JobSiteClient::new());

    let mut llm_client = LlmClient::new(
        Some(cfg.llm_provider.base_url().to_string()),
        Some(cfg.llm_provider.default_model().to_string()),
        cfg.resolve_api_key(),
    );

    // Saved model first, then auto-detect from the provider.
    if let Some(saved_model) = config::Config::get_last_model() {
        tracing::info!("Loaded saved model from config: {}", saved_model);
        llm_client.set_model(&saved_model);
    } else if let Ok(models) = llm_client.fetch_models().await {
        if let Some(first) = models.first() {
            tracing::info!("Auto-detected LLM model: {}", first);
            llm_client.set_model(first);
            let _ = config::Config::save_model(first);
        }
    }

    let llm = Arc::new(Mutex::new(llm_client));
    let state = Arc::new(AppState {
        site: site.clone(),
        llm,
    });

    let command = cli.command.unwrap_or(Commands::Menu);

    match command {
        Commands::Extract { url } => {
            let url = url.unwrap_or_else(|| cfg.effective_start_url());
            let jobs = ops::run_extract(&site, &url).await?;
            print_job_summary(&jobs);
        }
        Commands::Crawl { url } => {
            let url = url.unwrap_or_else(|| cfg.effective_start_url());
            let jobs = ops::run_crawl(&site, cfg.crawl, &url).await?;
            print_job_summary(&jobs);
        }
        Commands::Menu => {
            ui::run_app(state).await?;
        }
    }

    drop(_guard);
    Ok(())
}

fn print_job_summary(jobs: &[extract::JobRecord]) {
    println!("{} job records", jobs.len());
    for (i, job) in jobs.iter().enumerate() {
        let code = job.job_code.as_deref().unwrap_or("-");
        println!("{:3}. [{}] {}", i + 1, code, job.title);
        println!("     {}", job.url);
    }
    if !jobs.is_empty() {
        println!();
        for (label, count) in extract::heuristics::categorize(jobs) {
            println!("{}: {}", label, count);
        }
    }
}
