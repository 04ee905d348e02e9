use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, error, info};

use super::{ReviewStore, StorageStats, StorageType};
use crate::config::is_in_memory_database;
use crate::infrastructure::error::SentimentError;
use crate::models::review::{NormalizedScore, ReviewRecord, StoredReviewRecord};

/// SQLite 存储提供商
pub struct SQLiteProvider {
    pool: SqlitePool,
    table_name: String,
}

/// 固定宽度的 RFC 3339 字符串，字典序即时间序
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, SentimentError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SentimentError::store(format!("Failed to parse timestamp '{}': {}", value, e), "SQLite"))
}

impl SQLiteProvider {
    /// 创建新的 SQLite 提供商，数据库文件不存在时自动创建
    pub async fn new(connection_string: &str, table_name: String) -> Result<Self, SentimentError> {
        if table_name.is_empty() || !table_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SentimentError::config(format!("Invalid table name '{}'", table_name)));
        }
        if is_in_memory_database(connection_string) {
            return Err(SentimentError::config(format!(
                "In-memory database '{}' is not durable; use a file path",
                connection_string
            )));
        }

        let options = SqliteConnectOptions::from_str(connection_string)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let provider = Self { pool, table_name };

        // 创建表结构
        provider.create_tables().await?;

        Ok(provider)
    }

    /// 创建数据库表
    async fn create_tables(&self) -> Result<(), SentimentError> {
        let create_table_sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                sentiment TEXT NOT NULL,
                scores TEXT NOT NULL DEFAULT '[]',
                timestamp TEXT NOT NULL
            )
            "#,
            self.table_name
        );

        sqlx::query(&create_table_sql).execute(&self.pool).await?;

        let index_sql = format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_timestamp ON {} (timestamp, id)",
            self.table_name, self.table_name
        );
        sqlx::query(&index_sql).execute(&self.pool).await?;

        info!("SQLite table '{}' created or verified", self.table_name);
        Ok(())
    }

    /// 关闭连接池，等待正在进行的写入完成
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// 从行数据提取记录
    fn extract_record_from_row(&self, row: &SqliteRow) -> Result<StoredReviewRecord, SentimentError> {
        let scores_str: String = row.try_get("scores")?;
        let scores: Vec<NormalizedScore> = serde_json::from_str(&scores_str)
            .map_err(|e| SentimentError::store(format!("Failed to parse scores: {}", e), "SQLite"))?;

        let timestamp_str: String = row.try_get("timestamp")?;

        Ok(StoredReviewRecord {
            id: row.try_get("id")?,
            text: row.try_get("text")?,
            sentiment: row.try_get("sentiment")?,
            scores,
            timestamp: parse_timestamp(&timestamp_str)?,
        })
    }
}

#[async_trait]
impl ReviewStore for SQLiteProvider {
    fn storage_type(&self) -> StorageType {
        StorageType::SQLite
    }

    async fn append(&self, record: &ReviewRecord) -> Result<StoredReviewRecord, SentimentError> {
        if !record.is_consistent() {
            return Err(SentimentError::InvalidRecord {
                message: format!(
                    "sentiment '{}' does not match top score '{}'",
                    record.sentiment,
                    record.scores.first().map(|s| s.name.as_str()).unwrap_or_default()
                ),
            });
        }

        let timestamp = record.timestamp.unwrap_or_else(Utc::now).trunc_subsecs(6);
        let scores_json = serde_json::to_string(&record.scores).map_err(|e| SentimentError::InvalidRecord {
            message: format!("Failed to serialize scores: {}", e),
        })?;

        // 单条 INSERT，要么整体写入要么不写入
        let result = match record.id {
            Some(id) => {
                let insert_sql = format!(
                    "INSERT INTO {} (id, text, sentiment, scores, timestamp) VALUES (?, ?, ?, ?, ?)",
                    self.table_name
                );
                sqlx::query(&insert_sql)
                    .bind(id)
                    .bind(&record.text)
                    .bind(&record.sentiment)
                    .bind(&scores_json)
                    .bind(format_timestamp(&timestamp))
                    .execute(&self.pool)
                    .await
            }
            None => {
                let insert_sql = format!(
                    "INSERT INTO {} (text, sentiment, scores, timestamp) VALUES (?, ?, ?, ?)",
                    self.table_name
                );
                sqlx::query(&insert_sql)
                    .bind(&record.text)
                    .bind(&record.sentiment)
                    .bind(&scores_json)
                    .bind(format_timestamp(&timestamp))
                    .execute(&self.pool)
                    .await
            }
        };

        let result = result.map_err(|e| {
            error!("Failed to store review: {}", e);
            SentimentError::from(e)
        })?;

        let id = result.last_insert_rowid();
        debug!("Stored review with ID: {}", id);

        Ok(StoredReviewRecord {
            id,
            text: record.text.clone(),
            sentiment: record.sentiment.clone(),
            scores: record.scores.clone(),
            timestamp,
        })
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredReviewRecord>, SentimentError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let select_sql = format!(
            r#"
            SELECT id, text, sentiment, scores, timestamp
            FROM {}
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
            self.table_name
        );

        let rows = sqlx::query(&select_sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(|row| self.extract_record_from_row(row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                error!("Failed to extract review from row: {}", e);
                e
            })?;

        debug!("Listed {} recent reviews", records.len());
        Ok(records)
    }

    async fn count(&self) -> Result<usize, SentimentError> {
        let count_sql = format!("SELECT COUNT(*) FROM {}", self.table_name);
        let (count,): (i64,) = sqlx::query_as(&count_sql).fetch_one(&self.pool).await?;
        Ok(count as usize)
    }

    async fn health_check(&self) -> Result<bool, SentimentError> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(true),
            Err(e) => {
                error!("SQLite health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn get_storage_stats(&self) -> Result<StorageStats, SentimentError> {
        let stats_sql = format!(
            r#"
            SELECT
                COUNT(*) as total_reviews,
                MIN(timestamp) as oldest_review,
                MAX(timestamp) as newest_review
            FROM {}
            "#,
            self.table_name
        );

        let row = sqlx::query(&stats_sql).fetch_one(&self.pool).await?;

        let total_reviews: i64 = row.try_get("total_reviews")?;
        let oldest_review_str: Option<String> = row.try_get("oldest_review")?;
        let newest_review_str: Option<String> = row.try_get("newest_review")?;

        let distribution_sql = format!(
            "SELECT sentiment, COUNT(*) as total FROM {} GROUP BY sentiment",
            self.table_name
        );
        let distribution: Vec<(String, i64)> = sqlx::query_as(&distribution_sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(StorageStats {
            total_reviews: total_reviews as usize,
            oldest_review: oldest_review_str.as_deref().map(parse_timestamp).transpose()?,
            newest_review: newest_review_str.as_deref().map(parse_timestamp).transpose()?,
            sentiment_distribution: distribution
                .into_iter()
                .map(|(sentiment, total)| (sentiment, total as usize))
                .collect::<HashMap<_, _>>(),
        })
    }
}
