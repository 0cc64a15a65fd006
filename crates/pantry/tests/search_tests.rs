//! Elasticsearch indexer against a mock cluster, and full reindexing.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::RecordingIndexer;

use pantry::config::SearchConfig;
use pantry::db::Database;
use pantry::record::ProductRecord;
use pantry::search::{reindex_all, ElasticsearchIndexer, SearchIndexer};
use pantry::store::{RecordStore, SqliteRecordStore};

fn indexer_for(server: &MockServer) -> ElasticsearchIndexer {
    ElasticsearchIndexer::new(&SearchConfig {
        enabled: true,
        url: server.uri(),
        index: "products".to_string(),
        health_timeout_secs: 1,
        request_timeout_secs: 5,
    })
    .unwrap()
}

fn record(code: &str) -> ProductRecord {
    let mut record = ProductRecord::new(code, Utc::now());
    record.product_name = Some(format!("Product {}", code));
    record
}

#[tokio::test]
async fn test_bulk_index_sends_ndjson() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/_bulk"))
        .and(header("content-type", "application/x-ndjson"))
        .and(body_string_contains(r#"{"index":{"_id":"1"}}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 3,
            "errors": false,
            "items": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(indexer_for(&server).bulk_index(&[record("1"), record("2")]).await);
}

#[tokio::test]
async fn test_bulk_index_reports_item_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "errors": true })))
        .mount(&server)
        .await;

    assert!(!indexer_for(&server).bulk_index(&[record("1")]).await);
}

#[tokio::test]
async fn test_ensure_index_tolerates_existing_index() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "type": "resource_already_exists_exception" },
            "status": 400
        })))
        .mount(&server)
        .await;

    assert!(indexer_for(&server).ensure_index().await);
}

#[tokio::test]
async fn test_ensure_index_rejects_bad_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "type": "mapper_parsing_exception" },
            "status": 400
        })))
        .mount(&server)
        .await;

    assert!(!indexer_for(&server).ensure_index().await);
}

#[tokio::test]
async fn test_index_one_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/products/_doc/5"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/products/_doc/5"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/products/_doc/6"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let indexer = indexer_for(&server);
    assert!(indexer.index_one(&record("5")).await);
    assert!(indexer.delete("5").await);
    assert!(indexer.delete("6").await);
}

#[tokio::test]
async fn test_document_ids_are_path_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/products/_doc/a%2Fb%3Fx"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/products/_doc/..%2Fother"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let indexer = indexer_for(&server);
    assert!(indexer.index_one(&record("a/b?x")).await);
    assert!(indexer.delete("../other").await);
    assert!(!indexer.delete("..").await);
    assert!(!indexer.index_one(&record(".")).await);
}

#[tokio::test]
async fn test_search_parses_hits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/_search"))
        .and(body_string_contains("multi_match"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": {
                "total": { "value": 1, "relation": "eq" },
                "hits": [{
                    "_id": "42",
                    "_score": 1.5,
                    "_source": { "code": "42", "status": "published", "product_name": "Oat Milk" }
                }]
            }
        })))
        .mount(&server)
        .await;

    let results = indexer_for(&server).search("oat", 0, 10).await;
    assert_eq!(results.total, 1);
    assert_eq!(results.hits[0].id, "42");
    assert_eq!(results.hits[0].score, Some(1.5));
    assert_eq!(
        results.hits[0].document.product_name.as_deref(),
        Some("Oat Milk")
    );
}

#[tokio::test]
async fn test_search_failure_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/_search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let results = indexer_for(&server).search("oat", 0, 10).await;
    assert_eq!(results.total, 0);
    assert!(results.hits.is_empty());
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "yellow" })))
        .mount(&server)
        .await;

    let health = indexer_for(&server).health_check().await;
    assert!(health.available);
    assert_eq!(health.status, "yellow");
}

#[tokio::test]
async fn test_health_check_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "green" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let health = indexer_for(&server).health_check().await;
    assert!(!health.available);
    assert_eq!(health.status, "unavailable");
}

#[tokio::test]
async fn test_reindex_all_in_chunks() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteRecordStore::new(db);
    for i in 0..7 {
        store.upsert(&record(&format!("{:03}", i))).unwrap();
    }

    let indexer = RecordingIndexer::default();
    let summary = reindex_all(Arc::new(store), &indexer, 3).await.unwrap();

    assert_eq!(summary.total, 7);
    assert_eq!(summary.indexed, 7);
    assert_eq!(summary.failed_chunks, 0);
    let sizes: Vec<usize> = indexer.bulks().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[tokio::test]
async fn test_reindex_counts_rejected_chunks() {
    let store = SqliteRecordStore::new(Database::open_in_memory().unwrap());
    store.upsert(&record("1")).unwrap();

    let indexer = RecordingIndexer::rejecting();
    let summary = reindex_all(Arc::new(store), &indexer, 100).await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.indexed, 0);
    assert_eq!(summary.failed_chunks, 1);
}

#[tokio::test]
async fn test_reindex_empty_store() {
    let store = SqliteRecordStore::new(Database::open_in_memory().unwrap());
    let summary = reindex_all(Arc::new(store), &RecordingIndexer::default(), 100)
        .await
        .unwrap();
    assert_eq!(summary.total, 0);
}
