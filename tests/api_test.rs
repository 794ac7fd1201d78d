use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use tower::util::ServiceExt;

use taskboard::api::router;
use taskboard::state::AppState;

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test db");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    router(AppState { db: pool })
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body is not JSON")
    };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_task_defaults() {
    let app = test_app().await;

    let (status, task) = send(
        &app,
        json_request("POST", "/api/tasks", &json!({ "title": "Write copy" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["title"], "Write copy");
    assert_eq!(task["status"], "todo");
    assert_eq!(task["completed"], false);
    assert_eq!(task["priority"], 0);
    assert_eq!(task["projectId"], Value::Null);
}

#[tokio::test]
async fn test_create_task_rejects_blank_title() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        json_request("POST", "/api/tasks", &json!({ "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing title never reaches the store either.
    let (status, _) = send(
        &app,
        json_request("POST", "/api/tasks", &json!({ "description": "no title" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_create_task_rejects_bad_priority() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        json_request("POST", "/api/tasks", &json!({ "title": "x", "priority": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_project_task_round_trip() {
    let app = test_app().await;

    let (status, project) = send(
        &app,
        json_request("POST", "/api/projects", &json!({ "name": "Launch" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["name"], "Launch");
    let project_id = project["id"].as_i64().expect("project id");

    let (status, task) = send(
        &app,
        json_request(
            "POST",
            "/api/tasks",
            &json!({ "title": "Write copy", "projectId": project_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["projectId"], json!(project_id));

    let (status, tasks) = send(&app, get("/api/tasks")).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks.as_array().expect("task list");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["projectId"], json!(project_id));
    assert_eq!(tasks[0]["id"], task["id"]);
}

#[tokio::test]
async fn test_update_task_derives_completed_and_stamps() {
    let app = test_app().await;

    let (_, task) = send(
        &app,
        json_request("POST", "/api/tasks", &json!({ "title": "Write copy" })),
    )
    .await;

    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            "/api/tasks",
            &json!({
                "id": task["id"],
                "title": "Write copy",
                "description": "final pass",
                "priority": 1,
                "status": "done",
                "completed": false
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "done");
    assert_eq!(updated["completed"], true);
    assert!(
        updated["updatedAt"].as_str().expect("updatedAt")
            > task["updatedAt"].as_str().expect("updatedAt")
    );
}

#[tokio::test]
async fn test_update_unknown_task_is_404() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/tasks",
            &json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "title": "ghost",
                "priority": 0,
                "status": "todo",
                "completed": false
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_task_is_idempotent() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        delete("/api/tasks?id=00000000-0000-0000-0000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (status, _) = send(&app, delete("/api/tasks")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_project_validates_id() {
    let app = test_app().await;

    let (status, _) = send(&app, delete("/api/projects")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, delete("/api/projects?id=launch")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown numeric id is a no-op, not an error.
    let (status, body) = send(&app, delete("/api/projects?id=999")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project deleted successfully");
}

#[tokio::test]
async fn test_category_crud() {
    let app = test_app().await;

    let (status, category) = send(
        &app,
        json_request("POST", "/api/categories", &json!({ "name": "Errands" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = category["id"].as_i64().expect("category id");
    assert!(category["color"].is_string());

    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            "/api/categories",
            &json!({ "id": id, "name": "Chores", "color": "#ff0000" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Chores");
    assert_eq!(updated["color"], "#ff0000");

    let (status, _) = send(&app, delete("/api/categories?id=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, delete(&format!("/api/categories?id={id}"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, categories) = send(&app, get("/api/categories")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories.as_array().expect("category list").len(), 0);
}

#[tokio::test]
async fn test_stats_scenario() {
    let app = test_app().await;

    let (status, stats) = send(&app, get("/api/tasks/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalTasks"], 0);
    assert_eq!(stats["completionPercentage"], 0);

    let (_, project) = send(
        &app,
        json_request("POST", "/api/projects", &json!({ "name": "Launch" })),
    )
    .await;
    send(
        &app,
        json_request(
            "POST",
            "/api/tasks",
            &json!({ "title": "Write copy", "projectId": project["id"] }),
        ),
    )
    .await;

    let (status, stats) = send(&app, get("/api/tasks/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalTasks"], 1);
    assert_eq!(stats["completedTasks"], 0);
    assert_eq!(stats["completionPercentage"], 0);
    assert_eq!(stats["overdueTasks"], 0);
    assert_eq!(stats["highPriorityTasks"], 0);
}
