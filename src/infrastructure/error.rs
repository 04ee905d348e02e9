use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 情感分析流水线错误类型
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SentimentError {
    #[error("API token is not configured; set HUGGINGFACE_API_TOKEN")]
    MissingCredential,

    #[error("transport error: {message}")]
    Transport { message: String, url: Option<String> },

    #[error("provider error {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("store unavailable ({storage_type}): {message}")]
    StoreUnavailable { message: String, storage_type: String },

    #[error("invalid review record: {message}")]
    InvalidRecord { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },
}

/// 出错的流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorStage {
    Classification,
    Storage,
    Configuration,
}

impl SentimentError {
    /// 获取出错阶段
    pub fn stage(&self) -> ErrorStage {
        match self {
            SentimentError::MissingCredential => ErrorStage::Classification,
            SentimentError::Transport { .. } => ErrorStage::Classification,
            SentimentError::Provider { .. } => ErrorStage::Classification,
            SentimentError::StoreUnavailable { .. } => ErrorStage::Storage,
            SentimentError::InvalidRecord { .. } => ErrorStage::Storage,
            SentimentError::Configuration { .. } => ErrorStage::Configuration,
        }
    }

    /// 调用方是否可以自行重试（本 crate 内部从不重试）
    pub fn is_retryable(&self) -> bool {
        match self {
            SentimentError::Transport { .. } => true,
            SentimentError::StoreUnavailable { .. } => true,
            SentimentError::Provider { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// 错误类型名，用于日志与 JSON 输出
    pub fn kind(&self) -> &'static str {
        match self {
            SentimentError::MissingCredential => "MissingCredential",
            SentimentError::Transport { .. } => "TransportError",
            SentimentError::Provider { .. } => "ProviderError",
            SentimentError::StoreUnavailable { .. } => "StoreUnavailable",
            SentimentError::InvalidRecord { .. } => "InvalidRecord",
            SentimentError::Configuration { .. } => "ConfigurationError",
        }
    }

    /// 创建传输错误
    pub fn transport(message: impl Into<String>, url: Option<String>) -> Self {
        SentimentError::Transport {
            message: message.into(),
            url,
        }
    }

    /// 创建提供商错误
    pub fn provider(status: u16, body: impl Into<String>) -> Self {
        SentimentError::Provider {
            status,
            body: body.into(),
        }
    }

    /// 创建存储错误
    pub fn store(message: impl Into<String>, storage_type: impl Into<String>) -> Self {
        SentimentError::StoreUnavailable {
            message: message.into(),
            storage_type: storage_type.into(),
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        SentimentError::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(feature = "storage-sqlite")]
impl From<sqlx::Error> for SentimentError {
    fn from(error: sqlx::Error) -> Self {
        SentimentError::StoreUnavailable {
            message: error.to_string(),
            storage_type: "SQLite".to_string(),
        }
    }
}
