use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::infrastructure::error::SentimentError;
use crate::models::review::{ReviewRecord, StoredReviewRecord};

#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

#[cfg(feature = "storage-sqlite")]
pub use sqlite::SQLiteProvider;

/// 存储类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    SQLite,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::SQLite => f.write_str("SQLite"),
        }
    }
}

/// 评论记录存储 trait
///
/// 记录只追加，不更新也不删除。
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// 获取存储类型
    fn storage_type(&self) -> StorageType;

    /// 追加一条记录，分配 id 与时间戳并返回持久化后的形式
    async fn append(&self, record: &ReviewRecord) -> Result<StoredReviewRecord, SentimentError>;

    /// 按时间倒序返回最近的至多 `limit` 条记录（时间相同按 id 倒序）
    async fn recent(&self, limit: usize) -> Result<Vec<StoredReviewRecord>, SentimentError>;

    /// 记录总数
    async fn count(&self) -> Result<usize, SentimentError>;

    /// 健康检查
    async fn health_check(&self) -> Result<bool, SentimentError>;

    /// 获取存储统计信息
    async fn get_storage_stats(&self) -> Result<StorageStats, SentimentError>;
}

/// 存储统计信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_reviews: usize,
    pub oldest_review: Option<DateTime<Utc>>,
    pub newest_review: Option<DateTime<Utc>>,
    pub sentiment_distribution: HashMap<String, usize>,
}
