//! Integration tests for the docdash binary. Uses assert_cmd to run the
//! binary, a real temp config, and an in-process HTTP backend. No mocks.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use axum::routing::{get, post};
use axum::{Json, Router};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::net::TcpListener as StdTcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Pick a free port by binding to :0 and extracting the assigned port.
fn free_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Write a minimal YAML config pointing at `port`.
fn write_config(dir: &tempfile::TempDir, port: u16) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        format!(
            "api:\n  base_url: http://127.0.0.1:{}\n  auth_token: test-token\n",
            port
        ),
    )
    .unwrap();
    path
}

/// Serve `app` on `port` from a background thread for the binary under test.
fn spawn_test_server(port: u16, app: Router) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
                .await
                .unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    })
}

fn health_router() -> Router {
    Router::new().route(
        "/api/v1/health",
        get(|| async {
            Json(json!({
                "status": "healthy",
                "uptime": 7265.0,
                "memory_usage": {"rss": 312.5, "vms": 1024.0, "cpu_percent": 12.5},
                "active_sessions": 3,
                "total_requests": 1429,
                "average_response_time": 0.84,
            }))
        }),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn health_prints_formatted_snapshot() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let _server = spawn_test_server(port, health_router());
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("docdash"));
    cmd.arg("--config").arg(&config_path).arg("health");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("healthy"))
        .stdout(predicate::str::contains("2h 1m"))
        .stdout(predicate::str::contains("active sessions:   3"));
}

#[test]
fn health_with_config_env_var() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let _server = spawn_test_server(port, health_router());
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("docdash"));
    cmd.env("DOCDASH_CONFIG", &config_path).arg("health");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("healthy"));
}

/// With no uploads the guidance answer is printed without any network call;
/// the configured port has nothing listening on it.
#[test]
fn ask_without_uploads_prints_guidance() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let mut cmd = Command::from(cargo_bin_cmd!("docdash"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("ask")
        .arg("What is covered?");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("What is covered?"))
        .stdout(predicate::str::contains("System Guidance"))
        .stdout(predicate::str::contains("Upload documents first"));
}

/// Unsupported files fail the gate before any request is issued; the
/// configured port has nothing listening, so success of the gate path would
/// be indistinguishable from a network attempt.
#[test]
fn upload_rejects_unsupported_file_before_network() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);
    let spreadsheet = dir.path().join("data.xlsx");
    std::fs::write(&spreadsheet, b"not a document").unwrap();

    let mut cmd = Command::from(cargo_bin_cmd!("docdash"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("upload")
        .arg(&spreadsheet);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file type"));
}

#[test]
fn ask_with_doc_uploads_then_answers() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);
    let pdf = dir.path().join("policy.pdf");
    std::fs::write(&pdf, b"%PDF-1.4 test").unwrap();

    // The query handler echoes the received documents list into the answer
    // so the test can see what the binary sent.
    let app = Router::new()
        .route(
            "/api/v1/upload",
            post(|_body: axum::body::Bytes| async {
                Json(json!({
                    "message": "File processed successfully",
                    "file_path": "/tmp/uploads/policy.pdf",
                    "filename": "policy.pdf",
                    "size": "13 Bytes",
                }))
            }),
        )
        .route(
            "/api/v1/query",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "session_id": "sess-1",
                    "answers": [{
                        "question": body["questions"][0],
                        "answer": format!("Answered against {}", body["documents"]),
                        "confidence_score": 0.92,
                        "source_citations": ["policy.pdf p.3"],
                    }],
                    "status": "success",
                }))
            }),
        );
    let _server = spawn_test_server(port, app);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("docdash"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("ask")
        .arg("--doc")
        .arg(&pdf)
        .arg("What is covered?");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("uploaded"))
        .stdout(predicate::str::contains(
            "Answered against [\"/tmp/uploads/policy.pdf\"]",
        ))
        .stdout(predicate::str::contains("confidence: 0.92 (high)"))
        .stdout(predicate::str::contains("sources: policy.pdf p.3"));
}

/// Several questions are submitted one at a time: the backend sees one
/// single-question request per question, in the order they were given.
#[test]
fn ask_submits_each_question_in_its_own_request() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);
    let pdf = dir.path().join("policy.pdf");
    std::fs::write(&pdf, b"%PDF-1.4 test").unwrap();

    let questions_seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = questions_seen.clone();
    let app = Router::new()
        .route(
            "/api/v1/upload",
            post(|_body: axum::body::Bytes| async {
                Json(json!({
                    "message": "File processed successfully",
                    "file_path": "/tmp/uploads/policy.pdf",
                    "filename": "policy.pdf",
                    "size": "13 Bytes",
                }))
            }),
        )
        .route(
            "/api/v1/query",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    let n = {
                        let mut seen = recorder.lock().unwrap();
                        seen.push(body["questions"].clone());
                        seen.len()
                    };
                    Json(json!({
                        "session_id": "sess-1",
                        "answers": [{
                            "question": body["questions"][0],
                            "answer": format!("Answer number {}", n),
                            "confidence_score": 0.9,
                            "source_citations": ["policy.pdf p.1"],
                        }],
                        "status": "success",
                    }))
                }
            }),
        );
    let _server = spawn_test_server(port, app);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("docdash"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("ask")
        .arg("--doc")
        .arg(&pdf)
        .arg("What is covered?")
        .arg("What is the waiting period?");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Q: What is covered?"))
        .stdout(predicate::str::contains("Q: What is the waiting period?"))
        // First answer is printed before the second question is asked.
        .stdout(
            predicate::str::is_match("(?s)Answer number 1.*Q: What is the waiting period?.*Answer number 2")
                .unwrap(),
        );

    let seen = questions_seen.lock().unwrap();
    assert_eq!(seen.len(), 2, "one request per question");
    assert_eq!(seen[0], json!(["What is covered?"]));
    assert_eq!(seen[1], json!(["What is the waiting period?"]));
}

#[test]
fn health_watch_polls_at_configured_interval() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        format!(
            "api:\n  base_url: http://127.0.0.1:{}\n  auth_token: test-token\n\
             dashboard:\n  health_interval_secs: 1\n",
            port
        ),
    )
    .unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/api/v1/health",
        get(move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Json(json!({
                    "status": "healthy",
                    "uptime": 42.0,
                    "memory_usage": {"rss": 100.0, "vms": 200.0, "cpu_percent": 5.0},
                    "active_sessions": 1,
                    "total_requests": n,
                    "average_response_time": 0.5,
                }))
            }
        }),
    );
    let _server = spawn_test_server(port, app);
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut cmd = Command::from(cargo_bin_cmd!("docdash"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("health")
        .arg("--watch")
        .arg("2");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("total requests:    1"))
        .stdout(predicate::str::contains("total requests:    2"));

    assert_eq!(hits.load(Ordering::SeqCst), 2, "one fetch per tick");
}

#[test]
fn questions_can_come_from_stdin() {
    let port = free_port();
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, port);

    let mut cmd = Command::from(cargo_bin_cmd!("docdash"));
    cmd.arg("--config")
        .arg(&config_path)
        .arg("ask")
        .write_stdin("What is the waiting period?\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("What is the waiting period?"))
        .stdout(predicate::str::contains("System Guidance"));
}

#[test]
fn unknown_command_shows_usage() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, free_port());

    let mut cmd = Command::from(cargo_bin_cmd!("docdash"));
    cmd.arg("--config").arg(&config_path).arg("frobnicate");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: docdash"));
}
