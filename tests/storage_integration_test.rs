#![cfg(feature = "storage-sqlite")]

use sentiment_review::config::Config;
use sentiment_review::models::review::{AnalysisResult, NormalizedScore, ReviewRecord};
use sentiment_review::storage::{self, ReviewStore, StorageType};

fn create_test_record(text: &str, sentiment: &str) -> ReviewRecord {
    let analysis = AnalysisResult::new(
        sentiment,
        vec![NormalizedScore::new(sentiment, 80.0), NormalizedScore::new("Neutral", 20.0)],
    );
    ReviewRecord::new(text, &analysis)
}

#[tokio::test]
async fn test_store_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database_url: format!("sqlite://{}", dir.path().join("history.db").display()),
        table_name: "test_reviews".to_string(),
        ..Default::default()
    };

    let store = storage::connect(&config).await.expect("Failed to open store");
    assert_eq!(store.storage_type(), StorageType::SQLite);
    assert!(store.health_check().await.unwrap());

    // 追加后立即读取，得到刚写入的记录
    let stored = store
        .append(&create_test_record("Fast delivery", "Positive"))
        .await
        .expect("Failed to append review");
    let latest = store.recent(1).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0], stored);
    assert!(latest[0].id > 0);

    for i in 0..12 {
        store
            .append(&create_test_record(&format!("review {}", i), "Negative"))
            .await
            .unwrap();
    }

    assert_eq!(store.count().await.unwrap(), 13);
    assert_eq!(store.recent(config.history_limit).await.unwrap().len(), 10);
    assert_eq!(store.recent(100).await.unwrap().len(), 13);
    assert!(store.recent(0).await.unwrap().is_empty());

    let newest = store.recent(3).await.unwrap();
    assert_eq!(newest[0].text, "review 11");
    assert!(newest.windows(2).all(|w| (w[0].timestamp, w[0].id) > (w[1].timestamp, w[1].id)));

    let stats = store.get_storage_stats().await.unwrap();
    assert_eq!(stats.total_reviews, 13);
    assert_eq!(stats.sentiment_distribution.get("Negative"), Some(&12));
    assert_eq!(stats.sentiment_distribution.get("Positive"), Some(&1));
}

#[tokio::test]
async fn test_concurrent_appends() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database_url: format!("sqlite://{}", dir.path().join("concurrent.db").display()),
        ..Default::default()
    };
    let store = storage::connect(&config).await.unwrap();

    let appends = (0..8).map(|i| {
        let store = store.clone();
        async move { store.append(&create_test_record(&format!("c{}", i), "Positive")).await }
    });
    let results = futures::future::join_all(appends).await;

    let mut ids: Vec<i64> = results.into_iter().map(|r| r.unwrap().id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(store.count().await.unwrap(), 8);
}
