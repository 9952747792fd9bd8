//! Record normalization: title cleaning, URL resolution, and the
//! first-seen-wins dedup that guarantees at most one record per posting.

use std::collections::HashSet;

use url::Url;

use super::JobRecord;

/// Collapses whitespace/newline runs to single spaces, trims, and caps the
/// result at `max_chars`, replacing the tail with `...`. Idempotent: a
/// cleaned title passes through unchanged.
pub fn clean_title(raw: &str, max_chars: usize) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() > max_chars {
        let kept: String = collapsed.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept.trim_end())
    } else {
        collapsed
    }
}

/// Builds an absolute URL from an href. Absolute hrefs pass through; the
/// rest join against the page URL. A join failure falls back to the page
/// URL itself rather than dropping the record.
pub fn resolve_url(href: &str, base: &Url) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    base.join(href)
        .map(Into::into)
        .unwrap_or_else(|_| base.to_string())
}

/// Keeps the first occurrence per key, preserving order. Records with a
/// job code are keyed by it; the rest fall back to the cleaned title.
/// Coded records also register their title so a weaker strategy cannot
/// re-introduce the same posting without its code.
pub fn dedupe(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen_codes: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();

    records
        .into_iter()
        .filter(|record| match &record.job_code {
            Some(code) => {
                if !seen_codes.insert(code.clone()) {
                    return false;
                }
                seen_titles.insert(record.title.clone());
                true
            }
            None => seen_titles.insert(record.title.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{JobRecord, SourceStrategy};

    fn record(title: &str, code: Option<&str>) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            url: "https://example.com/job".to_string(),
            job_code: code.map(str::to_string),
            description: None,
            location: None,
            category: None,
            source: SourceStrategy::Link,
        }
    }

    #[test]
    fn clean_collapses_whitespace_and_newlines() {
        assert_eq!(
            clean_title("  生産技術\n\nエンジニア \t 募集  ", 200),
            "生産技術 エンジニア 募集"
        );
    }

    #[test]
    fn clean_caps_length_with_ellipsis() {
        let raw = "あ".repeat(250);
        let cleaned = clean_title(&raw, 200);
        assert_eq!(cleaned.chars().count(), 200);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn clean_is_idempotent() {
        for raw in [
            "  生産技術\nエンジニア  ",
            &"あ".repeat(250),
            "short title",
        ] {
            let once = clean_title(raw, 150);
            assert_eq!(clean_title(&once, 150), once);
        }
    }

    #[test]
    fn resolve_passes_through_absolute() {
        let base = Url::parse("https://progres02.jposting.net/u/job.phtml").unwrap();
        assert_eq!(
            resolve_url("https://other.example.com/x", &base),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn resolve_joins_relative_against_base() {
        let base = Url::parse("https://progres02.jposting.net/u/job.phtml").unwrap();
        assert_eq!(
            resolve_url("job.phtml?job_code=100", &base),
            "https://progres02.jposting.net/u/job.phtml?job_code=100"
        );
        assert_eq!(
            resolve_url("/pg/u/detail", &base),
            "https://progres02.jposting.net/pg/u/detail"
        );
    }

    #[test]
    fn dedupe_drops_repeated_codes_keeps_order() {
        let records = vec![
            record("開発エンジニアA", Some("100")),
            record("開発エンジニアB", Some("200")),
            record("開発エンジニアA再掲", Some("100")),
            record("開発エンジニアC", Some("300")),
        ];

        let deduped = dedupe(records);
        let codes: Vec<_> = deduped
            .iter()
            .map(|r| r.job_code.as_deref().unwrap())
            .collect();
        assert_eq!(codes, ["100", "200", "300"]);
    }

    #[test]
    fn dedupe_keys_uncoded_records_by_title() {
        let records = vec![
            record("品質管理スタッフ", None),
            record("品質管理スタッフ", None),
            record("生産技術エンジニア", None),
        ];

        assert_eq!(dedupe(records).len(), 2);
    }

    #[test]
    fn dedupe_blocks_uncoded_duplicate_of_coded_record() {
        let records = vec![
            record("生産技術エンジニア", Some("100")),
            record("生産技術エンジニア", None),
        ];

        let deduped = dedupe(records);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].job_code.as_deref(), Some("100"));
    }
}
