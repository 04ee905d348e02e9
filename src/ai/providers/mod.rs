use async_trait::async_trait;

use crate::infrastructure::error::SentimentError;
use crate::models::review::RawClassification;

pub mod huggingface;

pub use huggingface::{ClassifierConfig, HuggingFaceClassifier};

/// 文本分类提供商 trait
///
/// 每次调用恰好发起一次外部请求，不重试、不缓存。
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// 获取提供商名称
    fn name(&self) -> &str;

    /// 是否已配置凭据
    fn is_available(&self) -> bool;

    /// 对文本进行分类，返回原始的类别得分
    async fn classify(&self, text: &str) -> Result<RawClassification, SentimentError>;
}
