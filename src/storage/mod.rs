pub mod providers;

use std::sync::Arc;

use crate::config::Config;
use crate::infrastructure::error::SentimentError;

pub use providers::{ReviewStore, StorageStats, StorageType};

#[cfg(feature = "storage-sqlite")]
pub use providers::SQLiteProvider;

/// 根据配置打开评论存储
#[cfg(feature = "storage-sqlite")]
pub async fn connect(config: &Config) -> Result<Arc<dyn ReviewStore>, SentimentError> {
    let provider = SQLiteProvider::new(&config.database_url, config.table_name.clone()).await?;
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "storage-sqlite"))]
pub async fn connect(config: &Config) -> Result<Arc<dyn ReviewStore>, SentimentError> {
    Err(SentimentError::config(format!(
        "No storage backend compiled in for '{}'; enable the storage-sqlite feature",
        config.database_url
    )))
}
