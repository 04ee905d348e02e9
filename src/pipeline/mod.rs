use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::ai::normalizer::normalize;
use crate::ai::providers::SentimentClassifier;
use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::infrastructure::error::SentimentError;
use crate::models::review::{AnalysisResult, HistoryEntry, RawClassification, ReviewRecord};
use crate::storage::providers::{ReviewStore, StorageStats};

/// 情感分析流水线：分类 → 归一化 → 持久化 → 返回
pub struct SentimentPipeline {
    classifier: Arc<dyn SentimentClassifier>,
    store: Arc<dyn ReviewStore>,
    /// 分类调用的并发控制信号量，未设置时不限制
    semaphore: Option<Arc<Semaphore>>,
    history_limit: usize,
}

impl SentimentPipeline {
    pub fn new(classifier: Arc<dyn SentimentClassifier>, store: Arc<dyn ReviewStore>) -> Self {
        Self {
            classifier,
            store,
            semaphore: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// 限制同时进行的外部分类请求数量
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.semaphore = Some(Arc::new(Semaphore::new(max_concurrency.max(1))));
        self
    }

    /// 调用方未指定数量时 history 返回的记录数
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// 分析文本并持久化结果
    ///
    /// 分类失败时不写入任何记录；写入失败时分类结果被丢弃并返回存储错误。
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, SentimentError> {
        let start_time = Instant::now();

        let raw = self.classify(text).await.map_err(|e| {
            warn!("Classification via {} failed: {}", self.classifier.name(), e);
            e
        })?;

        let analysis = normalize(&raw);
        if analysis.is_unknown() {
            warn!("Provider returned no usable scores; recording as {}", analysis.sentiment);
        } else {
            debug!("Normalized {} scores, top label {}", analysis.scores.len(), analysis.sentiment);
        }

        let record = ReviewRecord::new(text, &analysis);
        let stored = match self.store.append(&record).await {
            Ok(stored) => stored,
            Err(e) => {
                error!("Failed to persist review to {}: {}", self.store.storage_type(), e);
                return Err(e);
            }
        };

        info!(
            "Analyzed review {} as {} in {:.2?}",
            stored.id,
            stored.sentiment,
            start_time.elapsed()
        );

        Ok(stored.to_analysis())
    }

    async fn classify(&self, text: &str) -> Result<RawClassification, SentimentError> {
        match &self.semaphore {
            Some(semaphore) => {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| SentimentError::config(format!("Classifier admission closed: {}", e)))?;
                self.classifier.classify(text).await
            }
            None => self.classifier.classify(text).await,
        }
    }

    /// 返回最近的评论记录，limit 为 None 时使用默认数量
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, SentimentError> {
        let limit = limit.unwrap_or(self.history_limit);
        let records = self.store.recent(limit).await?;
        Ok(records.into_iter().map(HistoryEntry::from).collect())
    }

    pub async fn stats(&self) -> Result<StorageStats, SentimentError> {
        self.store.get_storage_stats().await
    }

    pub async fn health_check(&self) -> Result<bool, SentimentError> {
        self.store.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::review::{RawScore, StoredReviewRecord};
    use crate::storage::providers::StorageType;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct StubClassifier {
        response: Result<RawClassification, SentimentError>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl StubClassifier {
        fn new(response: Result<RawClassification, SentimentError>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl SentimentClassifier for StubClassifier {
        fn name(&self) -> &str {
            "stub"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn classify(&self, _text: &str) -> Result<RawClassification, SentimentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    /// 内存存储，可配置为写入失败
    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<StoredReviewRecord>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl ReviewStore for MemoryStore {
        fn storage_type(&self) -> StorageType {
            StorageType::SQLite
        }

        async fn append(&self, record: &ReviewRecord) -> Result<StoredReviewRecord, SentimentError> {
            if self.fail_writes {
                return Err(SentimentError::store("disk full", "memory"));
            }
            let mut records = self.records.lock().unwrap();
            let stored = StoredReviewRecord {
                id: records.len() as i64 + 1,
                text: record.text.clone(),
                sentiment: record.sentiment.clone(),
                scores: record.scores.clone(),
                timestamp: record.timestamp.unwrap_or_else(Utc::now),
            };
            records.push(stored.clone());
            Ok(stored)
        }

        async fn recent(&self, limit: usize) -> Result<Vec<StoredReviewRecord>, SentimentError> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().rev().take(limit).cloned().collect())
        }

        async fn count(&self) -> Result<usize, SentimentError> {
            Ok(self.records.lock().unwrap().len())
        }

        async fn health_check(&self) -> Result<bool, SentimentError> {
            Ok(!self.fail_writes)
        }

        async fn get_storage_stats(&self) -> Result<StorageStats, SentimentError> {
            let records = self.records.lock().unwrap();
            Ok(StorageStats {
                total_reviews: records.len(),
                oldest_review: records.first().map(|r| r.timestamp),
                newest_review: records.last().map(|r| r.timestamp),
                sentiment_distribution: HashMap::new(),
            })
        }
    }

    fn positive_scores() -> RawClassification {
        vec![
            RawScore::new("LABEL_2", 0.87),
            RawScore::new("LABEL_0", 0.10),
            RawScore::new("LABEL_1", 0.03),
        ]
    }

    #[tokio::test]
    async fn test_analyze_persists_normalized_result() {
        let classifier = Arc::new(StubClassifier::new(Ok(positive_scores())));
        let store = Arc::new(MemoryStore::default());
        let pipeline = SentimentPipeline::new(classifier.clone(), store.clone());

        let result = pipeline.analyze("This is great").await.unwrap();
        assert_eq!(result.sentiment, "Positive");
        assert_eq!(result.scores.len(), 3);
        assert_eq!(result.scores[0].value, 87.0);
        assert_eq!(result.id, Some(1));
        assert!(result.timestamp.is_some());

        let stored = store.recent(1).await.unwrap();
        assert_eq!(stored[0].text, "This is great");
        assert_eq!(stored[0].sentiment, "Positive");
        assert_eq!(stored[0].scores, result.scores);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classification_error_skips_store() {
        let classifier = Arc::new(StubClassifier::new(Err(SentimentError::provider(503, "loading"))));
        let store = Arc::new(MemoryStore::default());
        let pipeline = SentimentPipeline::new(classifier, store.clone());

        let result = pipeline.analyze("text").await;
        assert_eq!(result, Err(SentimentError::provider(503, "loading")));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_error_is_surfaced() {
        let classifier = Arc::new(StubClassifier::new(Ok(positive_scores())));
        let store = Arc::new(MemoryStore {
            fail_writes: true,
            ..Default::default()
        });
        let pipeline = SentimentPipeline::new(classifier.clone(), store);

        let result = pipeline.analyze("text").await;
        assert!(matches!(result, Err(SentimentError::StoreUnavailable { .. })));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_classification_is_recorded_as_unknown() {
        let classifier = Arc::new(StubClassifier::new(Ok(Vec::new())));
        let store = Arc::new(MemoryStore::default());
        let pipeline = SentimentPipeline::new(classifier, store.clone());

        let result = pipeline.analyze("").await.unwrap();
        assert_eq!(result.sentiment, "Unknown");
        assert!(result.scores.is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_history_uses_default_limit() {
        let classifier = Arc::new(StubClassifier::new(Ok(positive_scores())));
        let store = Arc::new(MemoryStore::default());
        let pipeline = SentimentPipeline::new(classifier, store).with_history_limit(3);

        for i in 0..5 {
            pipeline.analyze(&format!("review {}", i)).await.unwrap();
        }

        let history = pipeline.history(None).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].text, "review 4");

        assert_eq!(pipeline.history(Some(10)).await.unwrap().len(), 5);
        assert!(pipeline.history(Some(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_max_concurrency_bounds_classifier_calls() {
        let classifier = Arc::new(
            StubClassifier::new(Ok(positive_scores())).with_delay(Duration::from_millis(20)),
        );
        let store = Arc::new(MemoryStore::default());
        let pipeline = Arc::new(
            SentimentPipeline::new(classifier.clone(), store.clone()).with_max_concurrency(2),
        );

        let mut handles = Vec::new();
        for i in 0..6 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                pipeline.analyze(&format!("text {}", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 6);
        assert!(classifier.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(store.count().await.unwrap(), 6);
    }
}
