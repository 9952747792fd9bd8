//! Shared title heuristics: the title-likelihood predicate used by every
//! extraction strategy, plus the keyword-based category classifier.

use super::JobRecord;

/// Tokens that commonly appear in posting titles on Japanese recruiting
/// portals (role words, seniority words, bracket markers, contract types).
const JOB_TITLE_INDICATORS: &[&str] = &[
    "【",
    "】",
    "エンジニア",
    "技術者",
    "開発",
    "設計",
    "営業",
    "企画",
    "管理",
    "人事",
    "システム",
    "ソフト",
    "ハード",
    "製造",
    "品質",
    "生産",
    "プロジェクト",
    "マネージャー",
    "スタッフ",
    "主任",
    "課長",
    "部長",
    "担当",
    "責任者",
    "正社員",
    "契約",
    "派遣",
    "募集",
    "経験",
    "未経験",
    "WEB面接",
    "Engineer",
    "Developer",
    "Manager",
    "Specialist",
    "Designer",
    "Lead",
    "Senior",
];

/// Navigation chrome, media links, and standalone location names. A string
/// consisting almost entirely of one of these is not a title.
const NAV_EXCLUSIONS: &[&str] = &[
    "職種名",
    "勤務地",
    "応募",
    "選考",
    "面接",
    "説明会",
    "動画",
    "YouTube",
    "http",
    "www",
    "Copyright",
    "©",
    "全国",
    "北海道",
    "東京",
    "大阪",
    "神奈川",
    "apply",
];

const MIN_TITLE_CHARS: usize = 5;
const MAX_TITLE_CHARS: usize = 200;

/// Residue below this many chars after removing an excluded token means the
/// string carried no real content besides that token.
const MIN_RESIDUE_CHARS: usize = 5;

/// Decides whether a text fragment plausibly is a job title. The single
/// most reused piece of logic in the extractor; every strategy funnels its
/// candidates through here.
pub fn looks_like_job_title(text: &str) -> bool {
    let len = text.chars().count();
    if len < MIN_TITLE_CHARS || len > MAX_TITLE_CHARS {
        return false;
    }

    for excluded in NAV_EXCLUSIONS {
        if text.contains(excluded)
            && text.replace(excluded, "").trim().chars().count() < MIN_RESIDUE_CHARS
        {
            return false;
        }
    }

    JOB_TITLE_INDICATORS
        .iter()
        .any(|indicator| text.contains(indicator))
}

/// Length-only relaxation of the predicate, for elements whose markup
/// already marks them as job-related (e.g. a `class="job-item"` div).
pub fn title_length_ok(text: &str) -> bool {
    let len = text.chars().count();
    (MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len)
}

/// Category labels in display order. その他 is the catch-all.
pub const CATEGORY_LABELS: [&str; 5] = [
    "エンジニア系",
    "ビジネス系",
    "製造・生産系",
    "IT・デジタル系",
    "その他",
];

const CATEGORY_RULES: [(&str, &[&str]); 4] = [
    ("エンジニア系", &["エンジニア", "開発", "設計", "技術"]),
    ("ビジネス系", &["営業", "企画", "人事", "採用", "マーケティング"]),
    ("製造・生産系", &["製造", "生産", "品質", "組立"]),
    ("IT・デジタル系", &["it", "システム", "ai", "dx", "デジタル"]),
];

/// First matching category for lower-cased text, `None` when nothing
/// matches (the caller decides whether that means その他).
pub fn category_for_text(text: &str) -> Option<&'static str> {
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(label, _)| *label)
}

/// Aggregates records into the five fixed categories, first match wins.
/// Display-only; never feeds into ranking.
pub fn categorize(records: &[JobRecord]) -> Vec<(&'static str, usize)> {
    let mut counts = [0usize; 5];

    for record in records {
        let title = record.title.to_lowercase();
        let idx = match category_for_text(&title) {
            Some(label) => CATEGORY_RULES
                .iter()
                .position(|(rule_label, _)| *rule_label == label)
                .unwrap_or(CATEGORY_RULES.len()),
            None => CATEGORY_RULES.len(),
        };
        counts[idx] += 1;
    }

    CATEGORY_LABELS
        .iter()
        .zip(counts)
        .map(|(label, count)| (*label, count))
        .collect()
}
