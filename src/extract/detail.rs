//! Best-effort field extraction from an individual job detail page.
//! Everything here is optional enrichment: a field that cannot be found
//! stays `None` and the record remains usable.

use scraper::{Html, Selector};

use super::heuristics;

/// Description candidates must be substantial but not the whole page.
const MIN_DESCRIPTION_CHARS: usize = 50;
const MAX_DESCRIPTION_CHARS: usize = 1000;
const DESCRIPTION_CAP: usize = 500;

const MAX_LOCATION_CHARS: usize = 100;

const LOCATION_KEYWORDS: &[&str] = &[
    "勤務地",
    "所在地",
    "勤務先",
    "場所",
    "東京",
    "大阪",
    "神戸",
    "製作所",
];

/// Optional fields pulled from a detail page.
#[derive(Debug, Default)]
pub struct JobDetail {
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
}

pub struct DetailParser {
    description_selector: Selector,
}

impl DetailParser {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            description_selector: super::compile(
                ".job-description, .description, .content, .detail, [class*=\"desc\"], p",
            )?,
        })
    }

    pub fn parse(&self, html: &str) -> JobDetail {
        let document = Html::parse_document(html);
        let page_text = document.root_element().text().collect::<String>();

        JobDetail {
            description: self.extract_description(&document),
            location: extract_location(&page_text),
            category: heuristics::category_for_text(&page_text.to_lowercase())
                .map(str::to_string),
        }
    }

    /// Picks the longest plausibly-sized description block, capped for
    /// display.
    fn extract_description(&self, document: &Html) -> Option<String> {
        document
            .select(&self.description_selector)
            .map(|element| super::element_text(&element))
            .filter(|text| {
                let len = text.chars().count();
                (MIN_DESCRIPTION_CHARS..MAX_DESCRIPTION_CHARS).contains(&len)
            })
            .max_by_key(|text| text.chars().count())
            .map(|text| text.chars().take(DESCRIPTION_CAP).collect())
    }
}

/// First reasonably short line mentioning a location keyword.
fn extract_location(page_text: &str) -> Option<String> {
    page_text
        .lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty()
                && line.chars().count() < MAX_LOCATION_CHARS
                && LOCATION_KEYWORDS.iter().any(|keyword| line.contains(keyword))
        })
        .map(str::to_string)
}
