pub mod normalizer;
pub mod providers;

pub use normalizer::normalize;
pub use providers::{ClassifierConfig, HuggingFaceClassifier, SentimentClassifier};
