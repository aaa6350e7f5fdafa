//! Integration tests for the reindexing API against a real entity store.
//!
//! These tests seed the `entities` table, drive jobs through the HTTP
//! surface, and poll `/api/reindex/{id}` until the worker reaches a
//! terminal status, verifying stats, persistence fallback, and log
//! retention end to end.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use reindexd_db::Database;
use reindexd_server::jobs::{DbEntitySource, NullSearchSink};
use reindexd_server::{create_app, AppState, EntityCatalog, ReindexConfig, ReindexManager};
use reindexd_types::REINDEX_JOB_EXTENSION;

/// Helper: in-memory database plus the full app wired to a real
/// `DbEntitySource`.
async fn test_setup() -> (Router, Database) {
    let db = Database::new_in_memory().await.expect("in-memory DB for tests");
    let manager = ReindexManager::new(
        db.clone(),
        Arc::new(DbEntitySource::new(db.clone())),
        Arc::new(NullSearchSink),
        EntityCatalog::with_defaults(),
        ReindexConfig::default(),
    );
    let app = create_app(AppState::new(db.clone(), manager));
    (app, db)
}

/// Seed `count` rows of one entity type.
async fn seed_entities(db: &Database, entity_type: &str, count: usize) {
    for i in 0..count {
        db.upsert_entity(
            &format!("{entity_type}-{i:04}"),
            entity_type,
            &format!(r#"{{"name":"{entity_type}-{i}"}}"#),
        )
        .await
        .expect("seed entity");
    }
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Submit a job for the given entity types and return the record JSON.
async fn submit(app: &Router, entities: &[&str]) -> serde_json::Value {
    let spec = serde_json::json!({ "name": "reindex", "entities": entities });
    let response = app
        .clone()
        .oneshot(post_json("/api/reindex", spec.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// Poll the job until it reaches a terminal status.
async fn wait_terminal(app: &Router, id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(get_req(&format!("/api/reindex/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let record = body_json(response).await;
        match record["status"].as_str().unwrap() {
            "STARTED" | "RUNNING" => {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            _ => return record,
        }
    }
    panic!("job {id} never reached a terminal status");
}

#[tokio::test]
async fn test_job_indexes_seeded_entities() {
    let (app, db) = test_setup().await;
    seed_entities(&db, "table", 7).await;

    let record = submit(&app, &["table"]).await;
    assert_eq!(record["status"], "STARTED");
    let id = record["id"].as_str().unwrap().to_string();

    let finished = wait_terminal(&app, &id).await;
    assert_eq!(finished["status"], "COMPLETED");
    assert_eq!(finished["stats"]["total"], 7);
    assert_eq!(finished["stats"]["success"], 7);
    assert_eq!(finished["stats"]["failed"], 0);
    assert_eq!(finished["stats"]["pending"], 0);
    // Null sink accepts everything; no failure context on the wire.
    assert!(finished.get("failure").is_none());
}

#[tokio::test]
async fn test_multi_entity_job_counts_all_types() {
    let (app, db) = test_setup().await;
    seed_entities(&db, "table", 3).await;
    seed_entities(&db, "topic", 2).await;

    let record = submit(&app, &["table", "topic"]).await;
    let id = record["id"].as_str().unwrap().to_string();

    let finished = wait_terminal(&app, &id).await;
    assert_eq!(finished["status"], "COMPLETED");
    assert_eq!(finished["stats"]["total"], 5);
    assert_eq!(finished["stats"]["success"], 5);
}

#[tokio::test]
async fn test_finished_job_survives_in_extension_log() {
    let (app, db) = test_setup().await;
    seed_entities(&db, "table", 2).await;

    let record = submit(&app, &["table"]).await;
    let id = record["id"].as_str().unwrap().to_string();
    wait_terminal(&app, &id).await;

    // The persisted snapshot carries the terminal state.
    let row = db
        .latest_extension_record(&id, REINDEX_JOB_EXTENSION)
        .await
        .unwrap()
        .expect("extension-log row");
    let persisted: serde_json::Value = serde_json::from_str(&row.json).unwrap();
    assert_eq!(persisted["status"], "COMPLETED");
    assert_eq!(persisted["stats"]["success"], 2);
}

#[tokio::test]
async fn test_latest_reflects_most_recent_run() {
    let (app, db) = test_setup().await;
    seed_entities(&db, "table", 1).await;
    seed_entities(&db, "topic", 1).await;

    let first = submit(&app, &["table"]).await;
    wait_terminal(&app, first["id"].as_str().unwrap()).await;
    let second = submit(&app, &["topic"]).await;
    wait_terminal(&app, second["id"].as_str().unwrap()).await;

    let response = app.clone().oneshot(get_req("/api/reindex/latest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let latest = body_json(response).await;
    assert_eq!(latest["id"], second["id"]);
}

#[tokio::test]
async fn test_extension_log_retains_five_runs() {
    let (app, db) = test_setup().await;
    let entities = [
        "table", "topic", "dashboard", "pipeline", "mlmodel", "container", "query",
    ];
    for entity in entities {
        seed_entities(&db, entity, 1).await;
        let record = submit(&app, &[entity]).await;
        wait_terminal(&app, record["id"].as_str().unwrap()).await;
    }

    let rows = db
        .all_extension_records(REINDEX_JOB_EXTENSION)
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);

    // Newest run is still the first row of the log.
    let newest: serde_json::Value = serde_json::from_str(&rows[0].json).unwrap();
    let entity_set: Vec<&str> = newest["entities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(entity_set, vec!["query"]);
}

#[tokio::test]
async fn test_unknown_entity_rejected_with_details() {
    let (app, _db) = test_setup().await;

    let spec = serde_json::json!({ "name": "reindex", "entities": ["spreadsheet"] });
    let response = app
        .oneshot(post_json("/api/reindex", spec.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(
        error["details"],
        "Entity Type : spreadsheet is not a valid Entity"
    );
}
