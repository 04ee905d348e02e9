// Core modules
pub mod ai;
pub mod cli;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod storage;

pub mod infrastructure;

pub use ai::{normalize, HuggingFaceClassifier, SentimentClassifier};
pub use config::Config;
pub use infrastructure::error::SentimentError;
pub use models::review::{AnalysisResult, HistoryEntry, NormalizedScore, ReviewRecord, StoredReviewRecord};
pub use pipeline::SentimentPipeline;
pub use storage::{ReviewStore, StorageType};
