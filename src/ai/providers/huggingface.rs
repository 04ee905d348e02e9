use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SentimentClassifier;
use crate::config::{Config, DEFAULT_API_URL};
use crate::infrastructure::error::SentimentError;
use crate::models::review::{RawClassification, RawScore};

/// Hugging Face Inference API 分类器
pub struct HuggingFaceClassifier {
    client: Arc<reqwest::Client>,
    config: ClassifierConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub api_token: Option<String>,
    pub api_url: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl From<&Config> for ClassifierConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_token: config.api_token.clone(),
            api_url: config.api_url.clone(),
        }
    }
}

/// 推理请求体
#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// 推理响应：单条输入通常返回 `[[{label, score}, ...]]`，部分部署返回未嵌套的列表
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batched(Vec<Vec<RawScore>>),
    Flat(Vec<RawScore>),
}

impl InferenceResponse {
    fn into_classification(self) -> RawClassification {
        match self {
            InferenceResponse::Batched(batches) => batches.into_iter().next().unwrap_or_default(),
            InferenceResponse::Flat(scores) => scores,
        }
    }
}

/// 解析响应体，形状不符时返回 None
fn parse_inference_response(body: &str) -> Option<RawClassification> {
    if body.trim().is_empty() {
        return None;
    }

    serde_json::from_str::<InferenceResponse>(body)
        .ok()
        .map(InferenceResponse::into_classification)
}

impl HuggingFaceClassifier {
    /// 创建新的分类器
    pub fn new(client: Arc<reqwest::Client>, config: ClassifierConfig) -> Self {
        Self { client, config }
    }

    /// 根据应用配置创建分类器，请求超时在共享 client 上设置
    pub fn from_config(config: &Config) -> Result<Self, SentimentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SentimentError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::new(Arc::new(client), ClassifierConfig::from(config)))
    }

    fn token(&self) -> Option<&str> {
        self.config
            .api_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }
}

#[async_trait]
impl SentimentClassifier for HuggingFaceClassifier {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn is_available(&self) -> bool {
        self.token().is_some()
    }

    async fn classify(&self, text: &str) -> Result<RawClassification, SentimentError> {
        let token = self.token().ok_or(SentimentError::MissingCredential)?;
        let url = &self.config.api_url;

        debug!("Sending classification request to {} ({} bytes)", url, text.len());

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&InferenceRequest { inputs: text })
            .send()
            .await
            .map_err(|e| {
                SentimentError::transport(
                    format!("Failed to send request to Hugging Face: {}", e),
                    Some(url.clone()),
                )
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SentimentError::transport(
                format!("Failed to read Hugging Face response: {}", e),
                Some(url.clone()),
            )
        })?;

        if !status.is_success() {
            warn!("Hugging Face API returned {}: {}", status, body);
            return Err(SentimentError::provider(status.as_u16(), body));
        }

        match parse_inference_response(&body) {
            Some(classification) => {
                debug!("Received {} class scores", classification.len());
                Ok(classification)
            }
            None => {
                warn!("Unexpected Hugging Face response shape: {}", body);
                Err(SentimentError::provider(status.as_u16(), body))
            }
        }
    }
}
