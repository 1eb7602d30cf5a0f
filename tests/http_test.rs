mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog_mirror::config::Config;
use catalog_mirror::scheduler::SyncRunner;
use catalog_mirror::server::{make_app, ServerState};
use common::{setup_pool, RecordingCatalog};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

async fn make_test_app(catalog: RecordingCatalog) -> (Router, sqlx::SqlitePool) {
    let pool = setup_pool().await;
    let runner = Arc::new(SyncRunner::new(pool.clone(), Arc::new(catalog), 1));
    let app = make_app(ServerState::new(runner, &Config::default()));
    (app, pool)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn seeded_catalog() -> RecordingCatalog {
    let catalog = RecordingCatalog::default();
    catalog.add_batch("b1", "T", "img").await;
    catalog.set_lectures("b1", json!({"classes": [{"n": 1}]})).await;
    catalog.set_documents("b1", json!({"topics": [{"n": 1}]})).await;
    catalog
}

#[tokio::test]
async fn home_reports_service_info() {
    let (app, _pool) = make_test_app(RecordingCatalog::default()).await;
    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Healthy");
    assert_eq!(body["sync_interval"], "Every 2 minutes");
    assert_eq!(body["endpoints"]["all_batches"], "/allbatch");
    assert_eq!(body["endpoints"]["force_sync"], "/force-sync");
    assert_eq!(body["endpoints"]["batch_details"], "/chapter/[batch_id]");
    assert_eq!(body["endpoints"]["pdf_details"], "/pdf/[batch_id]");
    assert_eq!(body["author"], "catalog-mirror");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn force_sync_then_read_back() {
    let (app, _pool) = make_test_app(seeded_catalog().await).await;

    let (status, body) = get(&app, "/force-sync").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().starts_with("Sync successful"));
    assert_eq!(body["report"]["batches_written"], 1);

    let (status, body) = get(&app, "/allbatch").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    let entry = data[0].as_object().unwrap();
    assert_eq!(entry["id"], "b1");
    assert_eq!(entry["title"], "T");
    assert_eq!(entry["banner"], "img");
    assert!(entry.contains_key("lastUpdated"));
    assert!(!entry.contains_key("lectures"));
    assert!(!entry.contains_key("documents"));

    let (status, body) = get(&app, "/chapter/b1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "classes": [{"n": 1}]}));

    let (status, body) = get(&app, "/pdf/b1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "topics": [{"n": 1}]}));
}

#[tokio::test]
async fn unknown_ids_are_not_found_with_200() {
    let (app, _pool) = make_test_app(RecordingCatalog::default()).await;

    let (status, body) = get(&app, "/chapter/unknown-id").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": false, "message": "Batch not found"}));

    let (status, body) = get(&app, "/pdf/unknown-id").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": false, "message": "PDFs not found"}));
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let (app, _pool) = make_test_app(RecordingCatalog::default()).await;
    let (status, body) = get(&app, "/allbatch").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": []}));
}

#[tokio::test]
async fn force_sync_failure_is_500() {
    let catalog = RecordingCatalog::default();
    catalog.fail_listing("upstream down").await;
    let (app, _pool) = make_test_app(catalog).await;

    let (status, body) = get(&app, "/force-sync").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("upstream down"));
}

#[tokio::test]
async fn store_errors_are_500() {
    let (app, pool) = make_test_app(RecordingCatalog::default()).await;
    sqlx::query("DROP TABLE batches")
        .execute(&pool)
        .await
        .unwrap();

    for uri in ["/allbatch", "/chapter/b1", "/pdf/b1"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn cors_is_permissive() {
    let (app, _pool) = make_test_app(RecordingCatalog::default()).await;
    let request = Request::builder()
        .uri("/allbatch")
        .header("Origin", "https://frontend.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|h| h.to_str().ok()),
        Some("*")
    );
}
