use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 无法判定情感时使用的标签
pub const UNKNOWN_SENTIMENT: &str = "Unknown";

/// 情感标签（固定词表）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    /// 将提供商的类别标识映射到固定词表，未知标识返回 None
    pub fn from_provider_label(label: &str) -> Option<Self> {
        match label {
            "LABEL_0" | "negative" => Some(SentimentLabel::Negative),
            "LABEL_1" | "neutral" => Some(SentimentLabel::Neutral),
            "LABEL_2" | "positive" => Some(SentimentLabel::Positive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Positive => "Positive",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 提供商返回的单个类别得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScore {
    pub label: String,
    /// 缺失的置信度交给归一化阶段处理，而不是在解析时失败
    #[serde(default)]
    pub score: Option<f64>,
}

impl RawScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score: Some(score),
        }
    }
}

/// 一次分类调用的原始结果（无序）
pub type RawClassification = Vec<RawScore>;

/// 归一化后的类别得分，value 为百分比（保留两位小数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScore {
    pub name: String,
    pub value: f64,
}

impl NormalizedScore {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// 分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: String,
    pub scores: Vec<NormalizedScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl AnalysisResult {
    pub fn new(sentiment: impl Into<String>, scores: Vec<NormalizedScore>) -> Self {
        Self {
            sentiment: sentiment.into(),
            scores,
            id: None,
            timestamp: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_SENTIMENT, Vec::new())
    }

    pub fn is_unknown(&self) -> bool {
        self.scores.is_empty() && self.sentiment == UNKNOWN_SENTIMENT
    }
}

/// 待持久化的评论记录
///
/// `id` 与 `timestamp` 为空时由存储层分配。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Option<i64>,
    pub text: String,
    pub sentiment: String,
    pub scores: Vec<NormalizedScore>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ReviewRecord {
    pub fn new(text: impl Into<String>, analysis: &AnalysisResult) -> Self {
        Self {
            id: None,
            text: text.into(),
            sentiment: analysis.sentiment.clone(),
            scores: analysis.scores.clone(),
            timestamp: None,
        }
    }

    /// sentiment 必须等于得分最高的类别
    pub fn is_consistent(&self) -> bool {
        match self.scores.first() {
            Some(top) => top.name == self.sentiment,
            None => true,
        }
    }
}

/// 已持久化的评论记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReviewRecord {
    pub id: i64,
    pub text: String,
    pub sentiment: String,
    pub scores: Vec<NormalizedScore>,
    pub timestamp: DateTime<Utc>,
}

impl StoredReviewRecord {
    pub fn to_analysis(&self) -> AnalysisResult {
        AnalysisResult {
            sentiment: self.sentiment.clone(),
            scores: self.scores.clone(),
            id: Some(self.id),
            timestamp: Some(self.timestamp),
        }
    }
}

/// 历史查询的响应视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    pub sentiment: String,
    pub scores: Vec<NormalizedScore>,
    /// ISO-8601 UTC
    pub timestamp: String,
}

impl From<StoredReviewRecord> for HistoryEntry {
    fn from(record: StoredReviewRecord) -> Self {
        Self {
            text: record.text,
            sentiment: record.sentiment,
            scores: record.scores,
            timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}
