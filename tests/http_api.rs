use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tracker::history::HistoryTracker;
use tracker::http::{router, shared};
use tracker::service::Tracker;

fn app() -> Router {
    router(shared(Tracker::in_memory(HistoryTracker::new())))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_version() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn post_without_id_creates_and_with_id_updates() {
    let app = app();
    let (status, created) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({
            "name": "Write report",
            "description": "numbers",
            "startTime": "2025-03-01T09:00:00",
            "duration": 60
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["status"], "NEW");
    assert_eq!(created["duration"], 60);

    let (status, updated) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({ "id": 1, "name": "Write report", "status": "DONE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "DONE");
    assert_eq!(updated["startTime"], Value::Null);

    let (status, fetched) = send(&app, "GET", "/tasks/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "DONE");

    let (_, history) = send(&app, "GET", "/history", None).await;
    assert_eq!(history[0]["id"], 1);
    assert_eq!(history[0]["type"], "TASK");
}

#[tokio::test]
async fn overlapping_schedule_is_not_acceptable() {
    let app = app();
    let first = json!({ "name": "A", "startTime": "2025-03-01T09:00:00", "duration": 60 });
    let second = json!({ "name": "B", "startTime": "2025-03-01T09:30:00", "duration": 60 });

    let (status, _) = send(&app, "POST", "/tasks", Some(first)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app, "POST", "/tasks", Some(second)).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["code"], "SCHEDULE_CONFLICT");

    let (_, tasks) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app();
    for uri in ["/tasks/9", "/epics/9", "/subtasks/9", "/epics/9/subtasks"] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    let (status, _) = send(
        &app,
        "POST",
        "/subtasks",
        Some(json!({ "epicId": 9, "name": "Orphan" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn epic_endpoints_expose_derived_state() {
    let app = app();
    let (status, epic) = send(&app, "POST", "/epics", Some(json!({ "name": "Move" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let epic_id = epic["id"].as_u64().unwrap();

    for (name, status, hour) in [("Pack", "DONE", "09"), ("Load", "NEW", "11")] {
        let (code, _) = send(
            &app,
            "POST",
            "/subtasks",
            Some(json!({
                "epicId": epic_id,
                "name": name,
                "status": status,
                "startTime": format!("2025-03-01T{hour}:00:00"),
                "duration": 30
            })),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (_, epic) = send(&app, "GET", &format!("/epics/{epic_id}"), None).await;
    assert_eq!(epic["status"], "IN_PROGRESS");
    assert_eq!(epic["duration"], 60);
    assert_eq!(epic["startTime"], "2025-03-01T09:00:00");

    let (_, subtasks) = send(&app, "GET", &format!("/epics/{epic_id}/subtasks"), None).await;
    assert_eq!(subtasks.as_array().unwrap().len(), 2);

    let (_, prioritized) = send(&app, "GET", "/prioritized", None).await;
    let names: Vec<&str> = prioritized
        .as_array()
        .unwrap()
        .iter()
        .map(|entity| entity["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Pack", "Load"]);

    let (status, deleted) = send(&app, "DELETE", &format!("/epics/{epic_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"], true);
    let (_, subtasks) = send(&app, "GET", "/subtasks", None).await;
    assert!(subtasks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn changing_a_subtask_epic_is_a_bad_request() {
    let app = app();
    send(&app, "POST", "/epics", Some(json!({ "name": "First" }))).await;
    send(&app, "POST", "/epics", Some(json!({ "name": "Second" }))).await;
    let (_, sub) = send(
        &app,
        "POST",
        "/subtasks",
        Some(json!({ "epicId": 1, "name": "Sub" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/subtasks",
        Some(json!({ "id": sub["id"], "epicId": 2, "name": "Sub" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn deletes_are_idempotent() {
    let app = app();
    send(&app, "POST", "/tasks", Some(json!({ "name": "Gone soon" }))).await;

    let (status, body) = send(&app, "DELETE", "/tasks/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, body) = send(&app, "DELETE", "/tasks/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], false);

    let (status, _) = send(&app, "DELETE", "/tasks", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn out_of_range_duration_is_rejected_before_the_store() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({ "name": "t", "duration": 999_999_999_999_999_999i64 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.as_str().unwrap().contains("out of range"));

    let (status, body) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({
            "name": "Endless",
            "startTime": "2025-03-01T09:00:00",
            "duration": 1_000_000_000_000i64
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, tasks) = send(&app, "GET", "/tasks", None).await;
    assert!(tasks.as_array().unwrap().is_empty());
}
