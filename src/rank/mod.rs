//! Candidate-profile ranking against the extracted job list.
//!
//! The prompt template (`prompts`) and the reply parser (`parser`) share
//! one output grammar; everything else here is the workflow glue that
//! turns a profile plus a job snapshot into a `RankingOutcome`.

pub mod parser;
pub mod prompts;

use crate::extract::JobRecord;
use crate::llm::{ChatMessage, LlmClient};

use parser::ResponseParser;

/// The three free-text fields describing the candidate. Presence is
/// enforced at the input boundary; the ranking stage tolerates anything.
#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub industry: String,
    pub job_type: String,
    pub work_experience: String,
}

/// Coarse confidence bucket per recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fitness {
    High,
    Medium,
    LowOrNone,
}

impl Fitness {
    pub fn as_japanese(&self) -> &'static str {
        match self {
            Fitness::High => "高",
            Fitness::Medium => "中",
            Fitness::LowOrNone => "低",
        }
    }
}

/// One validated ranking entry. `job_reference` is the 1-based ordinal
/// into the job list as it was presented to the model, not the job code.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub job_reference: usize,
    pub fitness: Fitness,
    pub reason: String,
    pub notes: Option<String>,
}

/// What a ranking call produced: zero or more recommendations plus a
/// human-readable summary line for the front-end.
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    pub recommendations: Vec<Recommendation>,
    pub message: String,
}

impl RankingOutcome {
    fn empty(message: impl Into<String>) -> Self {
        Self {
            recommendations: Vec::new(),
            message: message.into(),
        }
    }
}

/// Runs one ranking call. Model failures and unparseable replies come
/// back as an empty outcome with a message; this function never fails.
pub async fn rank_jobs(
    llm: &LlmClient,
    profile: &CandidateProfile,
    jobs: &[JobRecord],
) -> RankingOutcome {
    if jobs.is_empty() {
        return RankingOutcome::empty("申し訳ございませんが、求人情報が見つかりませんでした。");
    }

    tracing::info!("ranking {} jobs with model {}", jobs.len(), llm.model);
    let prompt = prompts::build_ranking_prompt(profile, jobs);
    let messages = [
        ChatMessage::system(prompts::RANKING_SYSTEM),
        ChatMessage::user(prompt),
    ];

    let reply = match llm.chat(&messages).await {
        Ok((reply, usage)) => {
            if let Some(usage) = usage {
                tracing::debug!(
                    "ranking call used {} tokens ({} prompt / {} completion)",
                    usage.total_tokens,
                    usage.prompt_tokens,
                    usage.completion_tokens
                );
            }
            reply
        }
        Err(e) => {
            tracing::error!("ranking call failed: {}", e);
            return RankingOutcome::empty(format!(
                "申し訳ございません、分析中にエラーが発生しました: {}",
                e
            ));
        }
    };

    tracing::debug!("raw ranking reply:\n{}", reply);
    let recommendations = ResponseParser::new().parse(&reply, jobs.len());

    if recommendations.is_empty() {
        return RankingOutcome::empty(
            "申し訳ございませんが、現在のプロフィールに適合する求人が見つかりませんでした。より詳細な経験やスキル、ご希望をお聞かせください。",
        );
    }

    let message = format!(
        "{}件の最適な求人をご提案いたします。",
        recommendations.len()
    );
    RankingOutcome {
        recommendations,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitness_labels_match_the_prompt_grammar() {
        assert_eq!(Fitness::High.as_japanese(), "高");
        assert_eq!(Fitness::Medium.as_japanese(), "中");
        assert_eq!(Fitness::LowOrNone.as_japanese(), "低");
    }

    #[test]
    fn empty_outcome_carries_message_and_no_entries() {
        let outcome = RankingOutcome::empty("nothing");
        assert!(outcome.recommendations.is_empty());
        assert_eq!(outcome.message, "nothing");
    }
}
