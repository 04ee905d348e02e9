pub mod review;

pub use review::{
    AnalysisResult, HistoryEntry, NormalizedScore, RawClassification, RawScore, ReviewRecord,
    SentimentLabel, StoredReviewRecord, UNKNOWN_SENTIMENT,
};
