//! Prompt constants and the ranking prompt builder.
//!
//! The output grammar fixed here (ordinal marker, 適合度 line, 提案理由
//! line, optional 注意点 line, 5-entry cap) is what `rank::parser`
//! consumes. Change the two in lockstep.

use crate::extract::JobRecord;
use crate::rank::CandidateProfile;

/// System prompt for every ranking call.
pub const RANKING_SYSTEM: &str = "あなたは経験豊富な採用コンサルタントです。クライアントの転職成功を最優先に、専門的で価値のある提案を行ってください。";

const UNSPECIFIED: &str = "未指定";

fn or_unspecified(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNSPECIFIED
    } else {
        trimmed
    }
}

/// Serializes the profile and the enumerated job titles into the ranking
/// instruction document. Deterministic: same inputs, same prompt. Only
/// titles are sent, never URLs or descriptions.
pub fn build_ranking_prompt(profile: &CandidateProfile, jobs: &[JobRecord]) -> String {
    let mut jobs_text = String::new();
    for (i, job) in jobs.iter().enumerate() {
        jobs_text.push_str(&format!("{}. {}\n", i + 1, job.title));
    }

    format!(
        r#"あなたは経験豊富な採用コンサルタントです。以下のクライアントプロフィールと求人リストを専門的な視点で分析し、戦略的な転職提案を行ってください。

【クライアントプロフィール】
業界: {industry}
職種: {job_type}
これまでのご経験: {work_experience}

【求人リスト】
{jobs_text}
【分析指示】
以下の観点から各求人を評価し、クライアントにとって価値のあるキャリア提案を行ってください：

1. **経験活用性**: 記載された具体的な経験をどの程度活かせるか
2. **キャリアパス現実性**: 現在の経験レベルから現実的に到達可能か
3. **スキル転換可能性**: 既存スキルを新分野でどう活用できるか
4. **業界適合性**: 業界知識・経験の活用可能性
5. **成長機会**: 中長期的な成長機会とリスク評価

【出力形式】
以下の形式で最大5件まで提案してください（現実的なキャリアパスを重視してください）：

1番目: [求人番号]
適合度: [高/中/低]
提案理由: [クライアントの具体的な経験をどう活かせるか、現実的なキャリアステップとしてどう位置づけられるかを2-3文で説明]
注意点: [転職時の課題や習得すべきスキルがあれば1文で]

【重要な判断基準】
- 記載された具体的な経験内容を最重視してください
- ブルーカラー→ホワイトカラーのような大幅な職種転換は慎重に判断してください
- 現実的なキャリアステップを提案してください（例: 製造現場→製造技術、営業→営業企画など）
- 経験を活かした横展開や、段階的なステップアップを重視してください
- 真に現実的な提案がない場合のみ「適合する求人がありません」と回答してください
"#,
        industry = or_unspecified(&profile.industry),
        job_type = or_unspecified(&profile.job_type),
        work_experience = or_unspecified(&profile.work_experience),
    )
}
