//! Structural job extraction from recruiting-portal HTML.
//!
//! A document of unknown shape goes through an ordered set of strategies:
//! anchors carrying a `job_code` parameter (the only source of a stable
//! dedup key), then table rows, list items and tagged divs, and finally a
//! raw line scan of the page text when structure yields too little. Each
//! strategy is a pure pass over the parsed document; malformed input
//! degrades to fewer records, never to an error.

pub mod detail;
pub mod heuristics;
pub mod normalize;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Which strategy produced a record. Diagnostics only; ranking never
/// looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStrategy {
    Link,
    Table,
    List,
    Div,
    FreeText,
}

impl SourceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStrategy::Link => "link",
            SourceStrategy::Table => "table",
            SourceStrategy::List => "list",
            SourceStrategy::Div => "div",
            SourceStrategy::FreeText => "free-text",
        }
    }
}

/// One normalized job posting.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub title: String,
    pub url: String,
    pub job_code: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub source: SourceStrategy,
}

impl JobRecord {
    /// Compact one-line summary of the optional detail fields, for list
    /// views. `None` when nothing has been enriched yet.
    pub fn metadata_summary(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.category.as_deref(),
            self.location.as_deref(),
            self.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }
}

/// Anchor text bounds before cleaning (the anchor strategy is stricter
/// than the shared predicate: the link text must be a full title).
const MIN_ANCHOR_TITLE_CHARS: usize = 6;
const MAX_ANCHOR_TITLE_CHARS: usize = 300;

/// Title caps per strategy; links keep more of the text.
const LINK_TITLE_CAP: usize = 200;
const STRUCTURAL_TITLE_CAP: usize = 150;

/// When the anchor strategy alone finds at least this many coded records
/// the page clearly is a proper listing and the weaker strategies are
/// skipped.
const MIN_ANCHOR_RESULTS: usize = 5;

/// Below this many structural results the free-text line scan engages.
const MIN_STRUCTURAL_RESULTS: usize = 3;

/// Class tokens marking a div as job-related markup.
const DIV_CLASS_TOKENS: &[&str] = &["job", "position", "career", "recruit"];

/// Extractor with its selectors and the job-code pattern compiled once.
pub struct JobExtractor {
    anchor_selector: Selector,
    row_selector: Selector,
    cell_selector: Selector,
    item_selector: Selector,
    div_selector: Selector,
    link_selector: Selector,
    job_code_pattern: Regex,
}

impl JobExtractor {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            anchor_selector: compile("a[href]")?,
            row_selector: compile("tr")?,
            cell_selector: compile("td, th")?,
            item_selector: compile("li")?,
            div_selector: compile("div")?,
            link_selector: compile("a")?,
            job_code_pattern: Regex::new(r"job_code=(\d+)")?,
        })
    }

    /// Runs the strategy pipeline over a decoded document. `page_url` is
    /// the document's own URL, used as join base and as the fallback URL
    /// for records found without a link.
    pub fn extract(&self, html: &str, page_url: &str) -> Vec<JobRecord> {
        let document = Html::parse_document(html);
        let base = match Url::parse(page_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("unparseable page url {}: {}", page_url, e);
                return Vec::new();
            }
        };

        let mut records = self.extract_from_links(&document, &base);
        tracing::debug!("anchor strategy found {} records", records.len());

        if records.len() < MIN_ANCHOR_RESULTS {
            records.extend(self.extract_from_tables(&document, &base));
            records.extend(self.extract_from_lists(&document, &base));
            records.extend(self.extract_from_divs(&document, &base));
        }

        let mut records = normalize::dedupe(records);

        if records.len() < MIN_STRUCTURAL_RESULTS {
            tracing::debug!(
                "only {} structural records, engaging free-text scan",
                records.len()
            );
            records.extend(self.extract_from_text(&document, &base));
            records = normalize::dedupe(records);
        }

        records
    }

    /// Anchor strategy: every link whose href carries `job_code=<digits>`
    /// is a posting; the digits become the dedup key.
    fn extract_from_links(&self, document: &Html, base: &Url) -> Vec<JobRecord> {
        let mut records = Vec::new();

        for anchor in document.select(&self.anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(captures) = self.job_code_pattern.captures(href) else {
                continue;
            };
            let job_code = captures[1].to_string();

            let text = element_text(&anchor);
            let len = text.chars().count();
            if len < MIN_ANCHOR_TITLE_CHARS || len > MAX_ANCHOR_TITLE_CHARS {
                continue;
            }

            records.push(JobRecord {
                title: normalize::clean_title(&text, LINK_TITLE_CAP),
                url: normalize::resolve_url(href, base),
                job_code: Some(job_code),
                description: None,
                location: None,
                category: None,
                source: SourceStrategy::Link,
            });
        }

        records
    }

    /// Table strategy: the first cell of each row is a title candidate.
    fn extract_from_tables(&self, document: &Html, base: &Url) -> Vec<JobRecord> {
        let mut records = Vec::new();

        for row in document.select(&self.row_selector) {
            let Some(cell) = row.select(&self.cell_selector).next() else {
                continue;
            };
            let text = element_text(&cell);
            if !heuristics::looks_like_job_title(&text) {
                continue;
            }

            records.push(self.structural_record(&text, &cell, base, SourceStrategy::Table));
        }

        records
    }

    /// List strategy: the shared predicate over list-item text.
    fn extract_from_lists(&self, document: &Html, base: &Url) -> Vec<JobRecord> {
        let mut records = Vec::new();

        for item in document.select(&self.item_selector) {
            let text = element_text(&item);
            if !heuristics::looks_like_job_title(&text) {
                continue;
            }

            records.push(self.structural_record(&text, &item, base, SourceStrategy::List));
        }

        records
    }

    /// Tagged-div strategy: divs marked job-related by their class only
    /// need plausible length; untagged divs must pass the full predicate.
    fn extract_from_divs(&self, document: &Html, base: &Url) -> Vec<JobRecord> {
        let mut records = Vec::new();

        for div in document.select(&self.div_selector) {
            let text = element_text(&div);

            let class_tagged = div.value().attr("class").is_some_and(|classes| {
                let classes = classes.to_lowercase();
                DIV_CLASS_TOKENS.iter().any(|token| classes.contains(token))
            });

            let accepted = heuristics::looks_like_job_title(&text)
                || (class_tagged && heuristics::title_length_ok(&text));
            if !accepted {
                continue;
            }

            records.push(self.structural_record(&text, &div, base, SourceStrategy::Div));
        }

        records
    }

    /// Free-text fallback: line scan of the whole page text; records get
    /// the page URL since no element-level link exists.
    fn extract_from_text(&self, document: &Html, base: &Url) -> Vec<JobRecord> {
        let page_text = document.root_element().text().collect::<String>();

        page_text
            .lines()
            .map(str::trim)
            .filter(|line| heuristics::looks_like_job_title(line))
            .map(|line| JobRecord {
                title: normalize::clean_title(line, STRUCTURAL_TITLE_CAP),
                url: base.to_string(),
                job_code: None,
                description: None,
                location: None,
                category: None,
                source: SourceStrategy::FreeText,
            })
            .collect()
    }

    fn structural_record(
        &self,
        text: &str,
        element: &ElementRef<'_>,
        base: &Url,
        source: SourceStrategy,
    ) -> JobRecord {
        let url = element
            .select(&self.link_selector)
            .find_map(|link| link.value().attr("href"))
            .map(|href| normalize::resolve_url(href, base))
            .unwrap_or_else(|| base.to_string());

        let job_code = element
            .select(&self.link_selector)
            .find_map(|link| link.value().attr("href"))
            .and_then(|href| self.job_code_pattern.captures(href))
            .map(|captures| captures[1].to_string());

        JobRecord {
            title: normalize::clean_title(text, STRUCTURAL_TITLE_CAP),
            url,
            job_code,
            description: None,
            location: None,
            category: None,
            source,
        }
    }
}

fn compile(selector: &str) -> anyhow::Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow::anyhow!("invalid selector '{selector}': {e}"))
}

/// Flattens an element's text nodes into one whitespace-collapsed string.
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_URL: &str = "https://progres02.jposting.net/pgmitsubishielectric/u/job.phtml";

    fn extractor() -> JobExtractor {
        JobExtractor::new().expect("selectors compile")
    }

    #[test]
    fn anchor_strategy_extracts_coded_records_in_order() {
        let html = r#"
            <html><body>
              <a href="job.phtml?job_code=101">電力システム開発エンジニア（神戸）</a>
              <a href="job.phtml?job_code=102">FAシステム設計エンジニア（名古屋）</a>
              <a href="/pg/u/job.phtml?job_code=103">人事企画スタッフ（本社）</a>
              <a href="about.html">会社概要</a>
            </body></html>
        "#;

        let records = extractor().extract(html, LISTING_URL);
        // Anchor results stay below the fast-path threshold, so weaker
        // strategies also ran; nothing else on the page qualifies, so
        // exactly the three coded records come back, in order.
        assert_eq!(records.len(), 3);
        let coded: Vec<_> = records.iter().filter(|r| r.job_code.is_some()).collect();
        assert_eq!(coded.len(), 3);
        assert_eq!(coded[0].job_code.as_deref(), Some("101"));
        assert_eq!(coded[1].job_code.as_deref(), Some("102"));
        assert_eq!(coded[2].job_code.as_deref(), Some("103"));
        assert_eq!(coded[0].source, SourceStrategy::Link);
        assert!(coded[0].url.ends_with("job.phtml?job_code=101"));
        assert!(coded[2].url.starts_with("https://progres02.jposting.net/pg/u/"));
    }

    #[test]
    fn duplicate_job_codes_collapse_to_first_seen() {
        let html = r#"
            <html><body>
              <a href="?job_code=500">生産技術エンジニア（姫路製作所）</a>
              <a href="?job_code=500">生産技術エンジニア（姫路製作所・再掲）</a>
            </body></html>
        "#;

        let records = extractor().extract(html, LISTING_URL);
        let coded: Vec<_> = records.iter().filter(|r| r.job_code.is_some()).collect();
        assert_eq!(coded.len(), 1);
        assert!(coded[0].title.contains("姫路製作所"));
    }

    #[test]
    fn anchor_text_outside_length_bounds_is_rejected() {
        let long_title = "開発".repeat(200);
        let html = format!(
            r#"<html><body>
              <a href="?job_code=1">短い</a>
              <a href="?job_code=2">{long_title}</a>
            </body></html>"#
        );

        let records = extractor().extract(&html, LISTING_URL);
        assert!(records.iter().all(|r| r.job_code.is_none()));
    }

    #[test]
    fn table_rows_pass_through_title_predicate() {
        let html = r#"
            <html><body><table>
              <tr><td><a href="/detail/1">品質管理エンジニア（静岡）</a></td><td>静岡</td></tr>
              <tr><td>勤務地</td><td>全国</td></tr>
            </table></body></html>
        "#;

        let records = extractor().extract(html, LISTING_URL);
        let table: Vec<_> = records
            .iter()
            .filter(|r| r.source == SourceStrategy::Table)
            .collect();
        assert_eq!(table.len(), 1);
        assert!(table[0].title.contains("品質管理エンジニア"));
        assert_eq!(
            table[0].url,
            "https://progres02.jposting.net/detail/1"
        );
    }

    #[test]
    fn list_items_yield_records() {
        let html = r#"
            <html><body><ul>
              <li>宇宙機器の電気設計エンジニア（鎌倉）</li>
              <li>お問い合わせ</li>
            </ul></body></html>
        "#;

        let records = extractor().extract(html, LISTING_URL);
        assert!(records
            .iter()
            .any(|r| r.source == SourceStrategy::List && r.title.contains("電気設計")));
    }

    #[test]
    fn class_tagged_div_needs_only_plausible_length() {
        // No positive vocabulary token, but the markup says job.
        let html = r#"
            <html><body>
              <div class="job-item">モーション制御スペシャリスト職</div>
            </body></html>
        "#;

        let records = extractor().extract(html, LISTING_URL);
        assert!(records
            .iter()
            .any(|r| r.source == SourceStrategy::Div && r.title.contains("モーション制御")));
    }

    #[test]
    fn free_text_fallback_engages_on_structureless_page() {
        let html = r#"
            <html><body><pre>
採用情報のご案内
パワーデバイス設計エンジニア（福岡）
変電システム保守技術者（全国転勤あり）
            </pre></body></html>
        "#;

        let records = extractor().extract(html, LISTING_URL);
        let free: Vec<_> = records
            .iter()
            .filter(|r| r.source == SourceStrategy::FreeText)
            .collect();
        assert!(!free.is_empty());
        assert!(free.iter().all(|r| r.url == LISTING_URL));
    }

    #[test]
    fn malformed_html_degrades_to_empty_not_panic() {
        let records = extractor().extract("<table><tr><td></a></div>", LISTING_URL);
        assert!(records.is_empty());
    }

    #[test]
    fn emitted_titles_are_within_bounds() {
        let padded = format!(
            "<html><body><a href='?job_code=9'>{}　エンジニア</a></body></html>",
            "長い説明文の職種名".repeat(20)
        );

        let records = extractor().extract(&padded, LISTING_URL);
        for record in records {
            let len = record.title.chars().count();
            assert!((5..=300).contains(&len), "title length {len} out of bounds");
        }
    }
}
