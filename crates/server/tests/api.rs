use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;

use benchforge_server::db;
use benchforge_server::db::store::{self, SqlProjectStore, SqliteSink};
use benchforge_server::orchestrator::launcher::{LaunchSpec, ProcessLauncher, ProcessOutput};
use benchforge_server::orchestrator::registry::RuntimeRegistry;
use benchforge_server::orchestrator::{
    OrchestratorSettings, ProjectRecord, RunOrchestrator,
};
use benchforge_server::server::config::ServerConfig;
use benchforge_server::web::{create_axum_router, AppState};

/// Stands in for docker: reports a clean exit without launching anything.
struct NoopLauncher;

#[async_trait]
impl ProcessLauncher for NoopLauncher {
    async fn launch(&self, _spec: &LaunchSpec) -> io::Result<ProcessOutput> {
        Ok(ProcessOutput {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

fn write_test_archive(path: &Path) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("run.sh", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"#!/bin/sh\necho ok\n").unwrap();
    writer.finish().unwrap();
}

struct TestApp {
    dir: tempfile::TempDir,
    router: axum::Router,
    db_pool: sqlx::SqlitePool,
}

async fn test_app(synthesize_fallback: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let database_url = format!("sqlite://{}/test.db?mode=rwc", dir.path().display());
    let db_pool = db::init_pool(&database_url).await.unwrap();

    let mut config = ServerConfig::load(None).unwrap();
    config.uploads_dir = dir.path().display().to_string();
    config.synthesize_fallback_result = synthesize_fallback;

    let orchestrator = Arc::new(RunOrchestrator::new(
        Arc::new(SqlProjectStore::new(db_pool.clone())),
        Arc::new(NoopLauncher),
        Arc::new(SqliteSink::new(db_pool.clone())),
        RuntimeRegistry::with_defaults(),
        OrchestratorSettings {
            uploads_dir: dir.path().to_path_buf(),
            uploads_volume: config.uploads_volume.clone(),
            metrics_api_url: config.metrics_api_url.clone(),
            run_timeout: Some(Duration::from_secs(5)),
            synthesize_fallback_result: synthesize_fallback,
        },
    ));

    let router = create_axum_router(AppState {
        db_pool: db_pool.clone(),
        orchestrator,
        config: Arc::new(config),
    });

    TestApp {
        dir,
        router,
        db_pool,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn ingested_result_comes_back_from_the_project_filter() {
    let app = test_app(false).await;

    let document = json!({
        "projectId": "p1",
        "runtime": "node20",
        "fields": { "execution_time": { "value": 2.0, "unit": "seconds" } },
        "timeseriesFields": {},
        "timestamp": 1700000000000i64
    });

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/benchmarks", document))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert!(created["id"].is_string());

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/benchmarks?projectId=p1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["projectId"], "p1");
    assert_eq!(listed[0]["timestamp"], 1700000000000i64);
    assert_eq!(listed[0]["fields"]["execution_time"]["value"], 2.0);

    // Path-parameter form of the same filter.
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/benchmarks/p1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/benchmarks?projectId=other"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn ingest_without_project_id_is_a_client_error() {
    let app = test_app(false).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/benchmarks",
            json!({ "runtime": "node20" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("projectId"));
}

#[tokio::test]
async fn ingest_without_timestamp_gets_a_server_assigned_one() {
    let app = test_app(false).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/benchmarks",
            json!({ "projectId": "p1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert!(created["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(created["runtime"], "unknown");
}

#[tokio::test]
async fn empty_store_lists_as_an_empty_array() {
    let app = test_app(false).await;
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/benchmarks"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn health_endpoints_answer_ok() {
    let app = test_app(false).await;
    for uri in ["/api/benchmarks/health", "/api/containermanager/health"] {
        let response = app.router.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn run_container_round_trip_with_fallback_result() {
    let app = test_app(true).await;

    store::insert_project(
        &app.db_pool,
        &ProjectRecord {
            id: "p1".to_string(),
            project_name: "Simple Test Node".to_string(),
            runtime: "node20".to_string(),
            archive_path: "p1.zip".to_string(),
        },
    )
    .await
    .unwrap();
    write_test_archive(&app.dir.path().join("p1.zip"));

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/containermanager/run-container",
            json!({ "id": "p1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Simple Test Node"));
    assert_eq!(body["results"]["projectId"], "p1");

    // The staged copy is gone, the archive is not.
    assert!(!app.dir.path().join("p1").exists());
    assert!(app.dir.path().join("p1.zip").exists());

    // The fallback result landed in the store.
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/benchmarks?projectId=p1"))
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["runtime"], "node20");
}

#[tokio::test]
async fn run_container_validation_errors() {
    let app = test_app(false).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/containermanager/run-container",
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/containermanager/run-container",
            json!({ "id": "ghost" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
