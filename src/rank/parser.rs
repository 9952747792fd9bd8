//! Ranking response parser: a line-oriented state machine over the
//! model's free-text reply.
//!
//! Two states: idle (no open entry) and accumulating (an ordinal marker
//! opened an entry whose fields are being collected). A new ordinal
//! marker or end of input flushes the open entry through validation.
//! Deviations from the requested grammar degrade to dropped entries with
//! a diagnostic, never to a failure.

use regex::Regex;

use crate::rank::{Fitness, Recommendation};

/// Hard cap on emitted recommendations, matching the prompt's instruction.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Phrases that short-circuit the whole reply to "no suitable match".
const NO_MATCH_MARKERS: &[&str] = &["適合する求人がありません", "適合しない"];

const FITNESS_LABELS: &[&str] = &["適合度", "Fitness"];
const REASON_LABELS: &[&str] = &["提案理由", "理由", "Reason"];
const NOTES_LABELS: &[&str] = &["注意点", "Notes", "Note"];

/// Ordinal-marker surface forms the model has been observed to produce.
/// Group 2 is always the referenced job number; bracketed forms come
/// first so the bare-number forms cannot shadow them.
const ORDINAL_PATTERNS: [&str; 8] = [
    r"(\d+)番目[：:]\s*\[(\d+)\]",
    r"(\d+)番目[：:]\s*\[?求人番号\s*(\d+)\]?",
    r"(\d+)番目[：:]\s*(\d+)",
    r"第(\d+)位[：:]\s*\[(\d+)\]",
    r"第(\d+)位[：:]\s*(\d+)",
    r"(?i)rank\s*(\d+)[：:]\s*\[?(\d+)\]?",
    r"^(\d+)\.\s*\[(\d+)\]",
    r"^(\d+)\.\s*(\d+)\s*$",
];

/// An entry being accumulated between two ordinal markers.
struct OpenEntry {
    job_reference: usize,
    fitness: Option<Fitness>,
    reason: String,
    notes: Option<String>,
}

impl OpenEntry {
    fn new(job_reference: usize) -> Self {
        Self {
            job_reference,
            fitness: None,
            reason: String::new(),
            notes: None,
        }
    }
}

pub struct ResponseParser {
    ordinal_patterns: Vec<Regex>,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            ordinal_patterns: ORDINAL_PATTERNS
                .iter()
                .map(|pattern| Regex::new(pattern).expect("ordinal pattern compiles"))
                .collect(),
        }
    }

    /// Parses the reply against `job_count` enumerated jobs. Line-ending
    /// style and trailing blank lines do not affect the result.
    pub fn parse(&self, reply: &str, job_count: usize) -> Vec<Recommendation> {
        if NO_MATCH_MARKERS.iter().any(|marker| reply.contains(marker)) {
            tracing::info!("model declared no suitable match");
            return Vec::new();
        }

        let mut recommendations = Vec::new();
        let mut current: Option<OpenEntry> = None;

        for raw_line in reply.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(job_reference) = self.match_ordinal(line) {
                flush_entry(current.take(), job_count, &mut recommendations);
                current = Some(OpenEntry::new(job_reference));
                continue;
            }

            if let Some(value) = field_value(line, FITNESS_LABELS) {
                if let Some(entry) = current.as_mut() {
                    entry.fitness = Some(parse_fitness(value));
                }
                continue;
            }

            if let Some(value) = field_value(line, REASON_LABELS) {
                if let Some(entry) = current.as_mut() {
                    entry.reason = value.to_string();
                }
                continue;
            }

            if let Some(value) = field_value(line, NOTES_LABELS) {
                if let Some(entry) = current.as_mut() {
                    if !value.is_empty() {
                        entry.notes = Some(value.to_string());
                    }
                }
                continue;
            }

            // Justifications wrap across lines; anything that is not a
            // stray marker continues the reason.
            if let Some(entry) = current.as_mut() {
                if !looks_like_stray_marker(line) {
                    if entry.reason.is_empty() {
                        entry.reason = line.to_string();
                    } else {
                        entry.reason.push(' ');
                        entry.reason.push_str(line);
                    }
                }
            }
        }

        flush_entry(current.take(), job_count, &mut recommendations);
        recommendations.truncate(MAX_RECOMMENDATIONS);
        recommendations
    }

    fn match_ordinal(&self, line: &str) -> Option<usize> {
        for pattern in &self.ordinal_patterns {
            if let Some(captures) = pattern.captures(line) {
                if let Ok(reference) = captures[2].parse::<usize>() {
                    return Some(reference);
                }
            }
        }
        None
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates and emits an accumulated entry. Entries without reason text
/// or with an out-of-range job reference are dropped with a diagnostic.
fn flush_entry(
    entry: Option<OpenEntry>,
    job_count: usize,
    recommendations: &mut Vec<Recommendation>,
) {
    let Some(entry) = entry else {
        return;
    };

    if entry.reason.trim().is_empty() {
        tracing::warn!(
            "dropping ranking entry for job {}: no reason text",
            entry.job_reference
        );
        return;
    }
    if entry.job_reference < 1 || entry.job_reference > job_count {
        tracing::warn!(
            "dropping ranking entry: job reference {} outside 1..={}",
            entry.job_reference,
            job_count
        );
        return;
    }

    recommendations.push(Recommendation {
        job_reference: entry.job_reference,
        fitness: entry.fitness.unwrap_or(Fitness::LowOrNone),
        reason: entry.reason.trim().to_string(),
        notes: entry.notes,
    });
}

/// Strips a recognized field label (with `:` or `：`, spacing tolerated,
/// ASCII labels case-insensitive) and returns the value part.
fn field_value<'a>(line: &'a str, labels: &[&str]) -> Option<&'a str> {
    for label in labels {
        let Some(head) = line.get(..label.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(label) {
            continue;
        }
        let rest = line[label.len()..]
            .trim_start()
            .trim_start_matches([':', '：'])
            .trim();
        return Some(rest);
    }
    None
}

fn parse_fitness(value: &str) -> Fitness {
    let lower = value.to_lowercase();
    if value.contains('高') || lower.contains("high") {
        Fitness::High
    } else if value.contains('中') || lower.contains("medium") {
        Fitness::Medium
    } else {
        Fitness::LowOrNone
    }
}

/// A non-label line that still looks like grammar debris (numbering,
/// label stems) rather than justification prose.
fn looks_like_stray_marker(line: &str) -> bool {
    let Some(first) = line.chars().next() else {
        return true;
    };
    if first.is_ascii_digit() || matches!(first, '第' | '適' | '提' | '理' | '注') {
        return true;
    }
    let lower = line.to_lowercase();
    ["rank", "fitness", "reason", "note"]
        .iter()
        .any(|stem| lower.starts_with(stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(reply: &str, job_count: usize) -> Vec<Recommendation> {
        ResponseParser::new().parse(reply, job_count)
    }

    #[test]
    fn canonical_single_entry_reply() {
        let reply = "1番目: [3]\n適合度: 高\n提案理由: matches experience";
        let recs = parse(reply, 5);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].job_reference, 3);
        assert_eq!(recs[0].fitness, Fitness::High);
        assert_eq!(recs[0].reason, "matches experience");
    }

    #[test]
    fn accepts_varied_ordinal_surface_forms() {
        for (reply, expected) in [
            ("1番目: [12]\n提案理由: 経験が活かせます", 12),
            ("1番目: 7\n提案理由: 経験が活かせます", 7),
            ("1番目: [求人番号 4]\n提案理由: 経験が活かせます", 4),
            ("第1位: [9]\n提案理由: 経験が活かせます", 9),
            ("Rank 1: 2\n提案理由: 経験が活かせます", 2),
            ("1. [6]\n提案理由: 経験が活かせます", 6),
        ] {
            let recs = parse(reply, 20);
            assert_eq!(recs.len(), 1, "reply failed: {reply}");
            assert_eq!(recs[0].job_reference, expected, "reply: {reply}");
        }
    }

    #[test]
    fn fullwidth_colon_and_label_variants() {
        let reply = "1番目： [2]\n適合度： 中\n理由： 段階的なステップアップに向いています\n注意点： 新しい工程知識の習得が必要です";
        let recs = parse(reply, 5);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].fitness, Fitness::Medium);
        assert!(recs[0].reason.contains("ステップアップ"));
        assert_eq!(
            recs[0].notes.as_deref(),
            Some("新しい工程知識の習得が必要です")
        );
    }

    #[test]
    fn multi_line_reason_is_accumulated() {
        let reply = "1番目: [1]\n適合度: 高\n提案理由: 製造現場での経験が\nそのまま製造技術職で活かせます\nキャリアの横展開として現実的です";
        let recs = parse(reply, 3);

        assert_eq!(recs.len(), 1);
        assert_eq!(
            recs[0].reason,
            "製造現場での経験が そのまま製造技術職で活かせます キャリアの横展開として現実的です"
        );
    }

    #[test]
    fn out_of_range_ordinal_is_dropped_not_fatal() {
        let reply = "1番目: [99]\n適合度: 高\n提案理由: 素晴らしい適合です";
        assert!(parse(reply, 5).is_empty());

        let reply = "1番目: [99]\n提案理由: ダメ\n2番目: [2]\n適合度: 高\n提案理由: こちらは有効です";
        let recs = parse(reply, 5);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].job_reference, 2);
    }

    #[test]
    fn entry_without_reason_is_dropped() {
        let reply = "1番目: [2]\n適合度: 高\n2番目: [3]\n適合度: 中\n提案理由: 有効な理由があります";
        let recs = parse(reply, 5);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].job_reference, 3);
    }

    #[test]
    fn no_match_marker_short_circuits_everything() {
        let reply = "検討しましたが、適合する求人がありません。\n1番目: [1]\n提案理由: これは無視されるべきです";
        assert!(parse(reply, 5).is_empty());
    }

    #[test]
    fn output_is_capped_at_five() {
        let mut reply = String::new();
        for i in 1..=8 {
            reply.push_str(&format!(
                "{i}番目: [{i}]\n適合度: 高\n提案理由: 理由その{i}\n"
            ));
        }

        let recs = parse(&reply, 10);
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        let refs: Vec<_> = recs.iter().map(|r| r.job_reference).collect();
        assert_eq!(refs, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn crlf_and_trailing_blanks_do_not_change_the_result() {
        let lf = "1番目: [3]\n適合度: 高\n提案理由: matches experience";
        let crlf = "1番目: [3]\r\n適合度: 高\r\n提案理由: matches experience\r\n\r\n\r\n";

        let a = parse(lf, 5);
        let b = parse(crlf, 5);
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].job_reference, b[0].job_reference);
        assert_eq!(a[0].reason, b[0].reason);
    }

    #[test]
    fn missing_fitness_defaults_to_low_or_none() {
        let reply = "1番目: [1]\n提案理由: 挑戦的な選択肢としてはあり得ます";
        let recs = parse(reply, 5);
        assert_eq!(recs[0].fitness, Fitness::LowOrNone);
    }

    #[test]
    fn preamble_prose_before_first_marker_is_ignored() {
        let reply = "ご提案は以下のとおりです。\nよくご検討ください。\n\n1番目: [2]\n適合度: 高\n提案理由: 経験の直接転用が可能です";
        let recs = parse(reply, 5);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].reason, "経験の直接転用が可能です");
    }

    #[test]
    fn english_labels_are_tolerated() {
        let reply = "Rank 1: [2]\nFitness: High\nReason: direct skill transfer\nNotes: relocation required";
        let recs = parse(reply, 5);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].fitness, Fitness::High);
        assert_eq!(recs[0].reason, "direct skill transfer");
        assert_eq!(recs[0].notes.as_deref(), Some("relocation required"));
    }

    #[test]
    fn garbage_reply_yields_empty_list() {
        assert!(parse("completely unrelated text\nno markers at all", 5).is_empty());
        assert!(parse("", 5).is_empty());
    }
}
