//! 将提供商的原始类别得分归一化为固定情感词表。
//!
//! 百分比使用 `f64::round` 保留两位小数（四舍五入，0.5 远离零）。

use tracing::debug;

use crate::models::review::{
    AnalysisResult, NormalizedScore, RawClassification, SentimentLabel,
};

/// 将提供商标签映射为展示标签，未知标签原样透传
pub fn display_label(provider_label: &str) -> String {
    SentimentLabel::from_provider_label(provider_label)
        .map(|label| label.as_str().to_string())
        .unwrap_or_else(|| provider_label.to_string())
}

/// 将 [0,1] 的置信度转换为保留两位小数的百分比
pub fn to_percentage(confidence: f64) -> f64 {
    // 加 0.0 将 -0.0 归为 0.0
    let percent = (confidence.clamp(0.0, 1.0) + 0.0) * 100.0;
    (percent * 100.0).round() / 100.0
}

/// 归一化原始分类结果
///
/// 输入为空、任一条目缺少置信度或置信度非有限值时返回 `Unknown` 与空列表，不会失败。
pub fn normalize(raw: &RawClassification) -> AnalysisResult {
    let mut entries = Vec::with_capacity(raw.len());
    for item in raw {
        match item.score {
            Some(score) if score.is_finite() => entries.push((item.label.as_str(), score + 0.0)),
            _ => {
                debug!("Discarding classification with invalid score for '{}'", item.label);
                return AnalysisResult::unknown();
            }
        }
    }

    if entries.is_empty() {
        return AnalysisResult::unknown();
    }

    // sort_by 是稳定排序，分数相同时保留提供商的原始顺序
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    let scores: Vec<NormalizedScore> = entries
        .into_iter()
        .map(|(label, score)| NormalizedScore::new(display_label(label), to_percentage(score)))
        .collect();

    let sentiment = scores[0].name.clone();
    AnalysisResult::new(sentiment, scores)
}
