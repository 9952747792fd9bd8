//! Orchestration workflows wiring the pipeline stages together:
//! fetch -> extract -> (categorize) and profile -> prompt -> model ->
//! parse. Stage failures degrade per the error policy; nothing here
//! panics on bad remote data.

use std::time::Duration;

use crate::config::CrawlLimits;
use crate::extract::detail::DetailParser;
use crate::extract::{heuristics, JobExtractor, JobRecord};
use crate::fetch::crawl::DeepCrawler;
use crate::fetch::JobSiteClient;
use crate::llm::LlmClient;
use crate::rank::{self, CandidateProfile, RankingOutcome};

/// Fetches one listing page and extracts job records from it. An empty
/// result is a valid outcome, reported but not an error.
pub async fn run_extract(site: &JobSiteClient, url: &str) -> anyhow::Result<Vec<JobRecord>> {
    tracing::info!("Fetching job listings from {}", url);
    let document = site.fetch_document(url).await?;
    tracing::info!("Decoded {} as {}", document.url, document.encoding);

    let extractor = JobExtractor::new()?;
    let records = extractor.extract(&document.text, url);

    if records.is_empty() {
        tracing::warn!("No job records found at {}", url);
    } else {
        tracing::info!("Extracted {} job records", records.len());
        for (label, count) in heuristics::categorize(&records) {
            tracing::info!("  {}: {}", label, count);
        }
    }

    Ok(records)
}

/// Deep-crawls job-related links from the start URL under the configured
/// bounds.
pub async fn run_crawl(
    site: &JobSiteClient,
    limits: CrawlLimits,
    start_url: &str,
) -> anyhow::Result<Vec<JobRecord>> {
    tracing::info!(
        "Starting deep crawl from {} (max {} jobs, depth {})",
        start_url,
        limits.max_jobs,
        limits.max_depth
    );
    let crawler = DeepCrawler::new(site, limits)?;
    crawler.crawl(start_url).await
}

/// Visits each coded record's detail page and fills the optional
/// description/location/category fields. Per-record failures are
/// skipped; the inter-request delay applies here as everywhere else.
pub async fn run_enrich(
    site: &JobSiteClient,
    limits: CrawlLimits,
    records: &mut [JobRecord],
) -> anyhow::Result<usize> {
    let parser = DetailParser::new()?;
    let mut enriched = 0usize;
    let mut first_request = true;

    for record in records.iter_mut().take(limits.max_jobs) {
        if record.job_code.is_none() || record.description.is_some() {
            continue;
        }

        if !first_request {
            tokio::time::sleep(Duration::from_millis(limits.request_delay_ms)).await;
        }
        first_request = false;

        let document = match site.fetch_document(&record.url).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Skipping detail page {}: {}", record.url, e);
                continue;
            }
        };

        let detail = parser.parse(&document.text);
        let found_any =
            detail.description.is_some() || detail.location.is_some() || detail.category.is_some();

        if let Some(description) = detail.description {
            record.description = Some(description);
        }
        if let Some(location) = detail.location {
            record.location = Some(location);
        }
        if let Some(category) = detail.category {
            record.category = Some(category);
        }
        if found_any {
            enriched += 1;
        }
    }

    tracing::info!("Enriched {} records with detail-page fields", enriched);
    Ok(enriched)
}

/// Runs one ranking call against the current job snapshot.
pub async fn run_rank(
    llm: &LlmClient,
    profile: &CandidateProfile,
    jobs: &[JobRecord],
) -> RankingOutcome {
    rank::rank_jobs(llm, profile, jobs).await
}
