use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use pbm_exporter::config::Config;
use pbm_exporter::exporter::Exporter;
use pbm_exporter::models::{AgentEntry, BackupEntry, StatusSnapshot, SubsystemHealth};
use pbm_exporter::routes::create_router;
use pbm_exporter::state::AppState;
use pbm_exporter::store::{ScrapeError, StatusSource};
use std::sync::Mutex;
use tower::ServiceExt;

/// A status source that pops one canned result per scrape, so tests can
/// drive successive reads through the HTTP layer.
struct ScriptedSource {
    results: Mutex<Vec<Result<StatusSnapshot, ScrapeError>>>,
}

impl ScriptedSource {
    fn new(results: Vec<Result<StatusSnapshot, ScrapeError>>) -> Self {
        ScriptedSource {
            results: Mutex::new(results),
        }
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn snapshot(&self) -> Result<StatusSnapshot, ScrapeError> {
        let mut results = self.results.lock().expect("scripted source lock poisoned");
        assert!(!results.is_empty(), "more scrapes than scripted results");
        results.remove(0)
    }
}

/// A status source whose read never completes, for exercising the scrape
/// deadline.
struct StalledSource;

#[async_trait]
impl StatusSource for StalledSource {
    async fn snapshot(&self) -> Result<StatusSnapshot, ScrapeError> {
        std::future::pending().await
    }
}

fn test_config() -> Config {
    Config {
        mongodb_uri: "mongodb://localhost:27017".to_string(),
        port: 9090,
        log_level: "info".to_string(),
        log_format: "console".to_string(),
    }
}

fn build_app(results: Vec<Result<StatusSnapshot, ScrapeError>>) -> Router {
    let state = AppState {
        config: Arc::new(test_config()),
        exporter: Arc::new(Exporter::new(Arc::new(ScriptedSource::new(results)))),
    };
    create_router(state)
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("response body should be UTF-8")
}

#[tokio::test]
async fn test_metrics_endpoint_renders_exposition_text() {
    let snapshot = StatusSnapshot {
        backups: vec![BackupEntry::new("2024-01-01T00:00:00Z", "done")],
        agents: vec![AgentEntry {
            replica_set: "rs0".to_string(),
            node: "host1".to_string(),
            pbms: SubsystemHealth { ok: true },
            nodes: SubsystemHealth { ok: true },
            stors: SubsystemHealth { ok: true },
        }],
        pitr: None,
    };
    let app = build_app(vec![Ok(snapshot)]);

    let response = app.oneshot(get("/metrics")).await.expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("Content-Type")
            .expect("Content-Type header missing"),
        "text/plain; version=0.0.4; charset=utf-8"
    );

    let body = body_string(response).await;
    assert!(body.contains("pbm_snapshots_total{status=\"done\"} 1"));
    assert!(body.contains("pbm_nodes{host=\"rs0/host1\",rs=\"rs0\",status=\"ok\"} 1"));
    assert!(body.contains("pbm_nodes_total{status=\"ok\"} 1"));
}

/// Statuses observed on an earlier scrape keep rendering (at zero) on
/// later scrapes where they no longer occur.
#[tokio::test]
async fn test_label_memory_survives_across_scrapes() {
    let first = StatusSnapshot {
        backups: vec![BackupEntry::new("2024-01-01T00:00:00Z", "running")],
        ..Default::default()
    };
    let second = StatusSnapshot {
        backups: vec![BackupEntry::new("2024-01-02T00:00:00Z", "done")],
        ..Default::default()
    };
    let app = build_app(vec![Ok(first), Ok(second)]);

    let response = app
        .clone()
        .oneshot(get("/metrics"))
        .await
        .expect("first scrape failed");
    let body = body_string(response).await;
    assert!(body.contains("pbm_snapshots_total{status=\"running\"} 1"));

    let response = app
        .oneshot(get("/metrics"))
        .await
        .expect("second scrape failed");
    let body = body_string(response).await;
    assert!(body.contains("pbm_snapshots_total{status=\"running\"} 0"));
    assert!(body.contains("pbm_snapshots_total{status=\"done\"} 1"));
}

#[tokio::test]
async fn test_read_failure_returns_500() {
    let app = build_app(vec![Err(ScrapeError::Query {
        operation: "find backups",
        cause: "connection reset".to_string(),
    })]);

    let response = app.oneshot(get("/metrics")).await.expect("request failed");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Internal Server Error");
}

/// A read that hangs is abandoned at the scrape deadline and surfaces as
/// a 500, the same as any other read failure. Paused time lets the test
/// cross the 30s deadline without waiting it out.
#[tokio::test(start_paused = true)]
async fn test_scrape_exceeding_deadline_returns_500() {
    let state = AppState {
        config: Arc::new(test_config()),
        exporter: Arc::new(Exporter::new(Arc::new(StalledSource))),
    };
    let app = create_router(state);

    let response = app.oneshot(get("/metrics")).await.expect("request failed");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Internal Server Error");
}

/// A failed scrape must not disturb state left by a successful one.
#[tokio::test]
async fn test_failed_scrape_leaves_previous_state_intact() {
    let snapshot = StatusSnapshot {
        backups: vec![BackupEntry::new("2024-01-01T00:00:00Z", "done")],
        ..Default::default()
    };
    let app = build_app(vec![
        Ok(snapshot),
        Err(ScrapeError::Connect("server unreachable".to_string())),
        Ok(StatusSnapshot::default()),
    ]);

    let ok = app
        .clone()
        .oneshot(get("/metrics"))
        .await
        .expect("first scrape failed");
    assert_eq!(ok.status(), StatusCode::OK);

    let failed = app
        .clone()
        .oneshot(get("/metrics"))
        .await
        .expect("second scrape failed");
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Third scrape reads empty but the "done" status is remembered.
    let after = app
        .oneshot(get("/metrics"))
        .await
        .expect("third scrape failed");
    let body = body_string(after).await;
    assert!(body.contains("pbm_snapshots_total{status=\"done\"} 0"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_app(vec![]);
    let response = app.oneshot(get("/health")).await.expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");
}
