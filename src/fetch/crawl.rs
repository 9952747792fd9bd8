//! Bounded deep crawl: breadth-first traversal of job-related links from
//! a start page, merging every page's extracted records.
//!
//! Depth, breadth, and total-record caps plus the inter-request delay are
//! correctness invariants here, not tuning: the traversal must terminate
//! and must not hammer the portal.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

use crate::config::CrawlLimits;
use crate::extract::{normalize, JobExtractor, JobRecord};
use crate::fetch::JobSiteClient;

/// URL/anchor-text vocabulary marking a link as worth following.
const CRAWL_LINK_VOCAB: &[&str] = &[
    "job",
    "career",
    "recruit",
    "position",
    "employment",
    "求人",
    "募集",
    "採用",
    "職種",
    "キャリア",
];

pub struct DeepCrawler<'a> {
    site: &'a JobSiteClient,
    extractor: JobExtractor,
    limits: CrawlLimits,
}

impl<'a> DeepCrawler<'a> {
    pub fn new(site: &'a JobSiteClient, limits: CrawlLimits) -> anyhow::Result<Self> {
        Ok(Self {
            site,
            extractor: JobExtractor::new()?,
            limits,
        })
    }

    /// Traverses from `start_url`, collecting at most `max_jobs` records.
    /// Per-page failures are skipped; the crawl itself only fails if the
    /// start URL is unusable.
    pub async fn crawl(&self, start_url: &str) -> anyhow::Result<Vec<JobRecord>> {
        Url::parse(start_url)?;

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<(String, u32)> = VecDeque::new();
        let mut records: Vec<JobRecord> = Vec::new();
        let mut first_request = true;

        frontier.push_back((start_url.to_string(), 0));

        while let Some((url, depth)) = frontier.pop_front() {
            if records.len() >= self.limits.max_jobs {
                tracing::info!("record cap {} reached, stopping crawl", self.limits.max_jobs);
                break;
            }
            if !visited.insert(url.clone()) {
                continue;
            }

            if !first_request {
                tokio::time::sleep(Duration::from_millis(self.limits.request_delay_ms)).await;
            }
            first_request = false;

            tracing::info!("crawling (depth {}): {}", depth, url);
            let document = match self.site.fetch_document(&url).await {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", url, e);
                    continue;
                }
            };

            let page_records = self.extractor.extract(&document.text, &url);
            tracing::debug!("{} records on {}", page_records.len(), url);
            records.extend(page_records);
            records = normalize::dedupe(records);

            if depth < self.limits.max_depth {
                let links = job_related_links(&document.text, &url, self.limits.links_per_page);
                for link in links.into_iter().take(self.limits.pages_per_level) {
                    if !visited.contains(&link) {
                        frontier.push_back((link, depth + 1));
                    }
                }
            }
        }

        records.truncate(self.limits.max_jobs);
        tracing::info!("crawl finished with {} records", records.len());
        Ok(records)
    }
}

/// Collects same-domain links whose URL or anchor text matches the job
/// vocabulary, deduplicated, capped at `cap`.
fn job_related_links(html: &str, page_url: &str, cap: usize) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&anchor_selector) {
        if links.len() >= cap {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if resolved.host_str() != base.host_str() {
            continue;
        }

        let anchor_text = anchor.text().collect::<String>().to_lowercase();
        let url_lower = resolved.as_str().to_lowercase();
        let relevant = CRAWL_LINK_VOCAB
            .iter()
            .any(|token| url_lower.contains(token) || anchor_text.contains(token));
        if !relevant {
            continue;
        }

        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://progres02.jposting.net/pgmitsubishielectric/u/index.phtml";

    #[test]
    fn keeps_same_domain_job_links_only() {
        let html = r#"
            <html><body>
              <a href="job.phtml?job_code=1">求人一覧</a>
              <a href="https://progres02.jposting.net/pg/u/career.phtml">キャリア採用</a>
              <a href="https://elsewhere.example.com/jobs">external jobs</a>
              <a href="privacy.phtml">プライバシーポリシー</a>
            </body></html>
        "#;

        let links = job_related_links(html, PAGE_URL, 20);
        assert_eq!(links.len(), 2);
        assert!(links[0].contains("job.phtml"));
        assert!(links[1].contains("career.phtml"));
    }

    #[test]
    fn anchor_text_vocabulary_also_qualifies_a_link() {
        let html = r#"
            <html><body><a href="list.phtml?page=2">中途採用の募集一覧</a></body></html>
        "#;

        let links = job_related_links(html, PAGE_URL, 20);
        assert_eq!(links.len(), 1);
        assert!(links[0].ends_with("list.phtml?page=2"));
    }

    #[test]
    fn link_collection_respects_cap_and_dedupes() {
        let mut body = String::new();
        for i in 0..30 {
            body.push_str(&format!("<a href=\"job.phtml?page={i}\">jobs {i}</a>"));
        }
        body.push_str("<a href=\"job.phtml?page=0\">jobs again</a>");
        let html = format!("<html><body>{body}</body></html>");

        let links = job_related_links(&html, PAGE_URL, 20);
        assert_eq!(links.len(), 20);
        let unique: HashSet<_> = links.iter().collect();
        assert_eq!(unique.len(), 20);
    }
}
