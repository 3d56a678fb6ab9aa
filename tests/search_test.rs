//! Keyword search through the public facade

mod common;

use common::{raw, test_index};
use content_index::models::MediaType;
use serde_json::json;

#[tokio::test]
async fn test_scenario_a_single_match() {
    let index = test_index();
    index
        .ingest(
            Some("A"),
            &raw(json!({
                "id": "100_5",
                "name": "Movie.mkv",
                "caption": "Great film",
                "size": 600_000_000u64,
                "type": "video",
            })),
        )
        .await
        .unwrap();

    let results = index.search(Some("A"), "great", 10).await;
    assert_eq!(results.len(), 1);

    let record = &results[0];
    assert_eq!(record.record_id, "100_5");
    assert_eq!(record.tenant_id.as_deref(), Some("A"));
    assert_eq!(record.media_type, MediaType::Video);
    assert_eq!(record.size_bytes, 600_000_000);
    assert_eq!(record.keywords, vec!["movie", "mkv", "great", "film"]);
    assert_eq!(record.source_ref.as_ref().unwrap().channel, "100");
}

#[tokio::test]
async fn test_scenario_b_tenants_are_isolated() {
    let index = test_index();
    for (tenant, id) in [("A", "1"), ("B", "2")] {
        index
            .ingest(
                Some(tenant),
                &raw(json!({"id": id, "name": "Movie.mkv", "caption": "Great film", "type": "video"})),
            )
            .await
            .unwrap();
    }

    let a = index.search(Some("A"), "movie great", 10).await;
    assert_eq!(a.len(), 1);
    assert!(a.iter().all(|r| r.tenant_id.as_deref() == Some("A")));

    let b = index.search(Some("B"), "movie", 10).await;
    assert_eq!(b.len(), 1);
    assert_eq!(b[0].record_id, "2");

    assert!(index.search(None, "movie", 10).await.is_empty());
    assert!(index.search(Some("C"), "movie", 10).await.is_empty());
}

#[tokio::test]
async fn test_global_partition_is_isolated_from_tenants() {
    let index = test_index();
    index
        .ingest(None, &raw(json!({"id": "1", "name": "shared notes", "type": "document"})))
        .await
        .unwrap();
    index
        .ingest(Some("A"), &raw(json!({"id": "1", "name": "tenant notes", "type": "document"})))
        .await
        .unwrap();

    let global = index.search(None, "notes", 10).await;
    assert_eq!(global.len(), 1);
    assert_eq!(global[0].name, "shared notes");

    // A blank tenant is the global partition
    assert_eq!(index.search(Some("  "), "notes", 10).await.len(), 1);
}

#[tokio::test]
async fn test_short_and_stop_word_queries_still_match() {
    let index = test_index();
    index
        .ingest(Some("A"), &raw(json!({"id": "9", "name": "Go the distance", "type": "audio"})))
        .await
        .unwrap();

    // "go" and "the" are never keywords but still match the name
    assert_eq!(index.search(Some("A"), "go", 10).await.len(), 1);
    assert_eq!(index.search(Some("A"), "THE", 10).await.len(), 1);
    assert!(index.search(Some("A"), "   ", 10).await.is_empty());
    assert!(index.search(Some("A"), "", 10).await.is_empty());
}

#[tokio::test]
async fn test_search_tracks_access() {
    let index = test_index();
    index
        .ingest(Some("A"), &raw(json!({"id": "3", "name": "lecture recording", "type": "video"})))
        .await
        .unwrap();

    index.search(Some("A"), "lecture", 10).await;
    index.search(Some("A"), "recording", 10).await;

    let record = index.get(Some("A"), "3").await.unwrap().unwrap();
    assert_eq!(record.access_count, 2);
    assert!(record.last_accessed.is_some());
}

#[tokio::test]
async fn test_search_order_and_limit() {
    let index = test_index();
    for i in 1..=5 {
        index
            .ingest(
                Some("A"),
                &raw(json!({"id": i.to_string(), "name": format!("episode {}", i), "type": "video"})),
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let ids: Vec<String> = index
        .search(Some("A"), "episode", 3)
        .await
        .into_iter()
        .map(|r| r.record_id)
        .collect();
    assert_eq!(ids, vec!["5", "4", "3"]);
}

#[tokio::test]
async fn test_ingest_rejects_unusable_ids() {
    let index = test_index();

    let err = index
        .ingest(Some("A"), &raw(json!({"name": "no id"})))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    let err = index
        .ingest(Some("A"), &raw(json!({"id": "not an id", "name": "x"})))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    assert!(index.recent(Some("A"), 10).await.is_empty());
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let index = test_index();
    index
        .ingest(Some("A"), &raw(json!({"id": "4", "name": "temporary", "type": "photo"})))
        .await
        .unwrap();

    assert!(index.remove(Some("A"), "4").await.unwrap());
    assert!(!index.remove(Some("A"), "4").await.unwrap());
    assert!(index.search(Some("A"), "temporary", 10).await.is_empty());
    assert!(index.get(Some("A"), "4").await.unwrap().is_none());
}
