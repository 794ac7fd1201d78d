use axum::Json;
use axum::extract::Query;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

#[derive(Deserialize)]
struct DeleteParams {
    id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/tasks",
            get(list_tasks)
                .post(create_task)
                .put(update_task)
                .delete(delete_task),
        )
        .route("/api/tasks/stats", get(task_stats))
        .route(
            "/api/projects",
            get(list_projects)
                .post(create_project)
                .put(update_project)
                .delete(delete_project),
        )
        .route(
            "/api/categories",
            get(list_categories)
                .post(create_category)
                .put(update_category)
                .delete(delete_category),
        )
        .with_state(state)
}

fn require_non_empty(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn require_valid_priority(priority: i32) -> Result<(), AppError> {
    if !(0..=2).contains(&priority) {
        return Err(AppError::BadRequest(format!(
            "Invalid priority: {priority}"
        )));
    }
    Ok(())
}

/// Parses the `?id=` query parameter of a project/category delete. Rejected
/// before the store is touched when missing or non-numeric.
fn require_numeric_id(params: &DeleteParams, entity: &str) -> Result<i64, AppError> {
    let id = params
        .id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(format!("{entity} ID is required")))?;
    id.parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid {entity} ID")))
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = repository::fetch_tasks(&state.db).await?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<NewTaskRequest>,
) -> Result<Json<Task>, AppError> {
    require_non_empty(&req.title, "Task title")?;
    if let Some(priority) = req.priority {
        require_valid_priority(priority)?;
    }
    let task = repository::insert_task(&state.db, req).await?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    require_non_empty(&req.title, "Task title")?;
    require_valid_priority(req.priority)?;
    let task = repository::update_task(&state.db, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, AppError> {
    let id = params
        .id
        .ok_or_else(|| AppError::BadRequest("Task ID is required".to_string()))?;
    // Deleting an unknown id is an idempotent no-op.
    repository::delete_task(&state.db, &id).await?;
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

async fn task_stats(State(state): State<AppState>) -> Result<Json<TaskStats>, AppError> {
    let stats = repository::task_stats(&state.db).await?;
    Ok(Json(stats))
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, AppError> {
    let projects = repository::fetch_projects(&state.db).await?;
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<NewProjectRequest>,
) -> Result<Json<Project>, AppError> {
    require_non_empty(&req.name, "Project name")?;
    let project = repository::insert_project(&state.db, req).await?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<AppState>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, AppError> {
    require_non_empty(&req.name, "Project name")?;
    let project = repository::update_project(&state.db, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, AppError> {
    let id = require_numeric_id(&params, "Project")?;
    repository::delete_project(&state.db, id).await?;
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = repository::fetch_categories(&state.db).await?;
    Ok(Json(categories))
}

async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<NewCategoryRequest>,
) -> Result<Json<Category>, AppError> {
    require_non_empty(&req.name, "Category name")?;
    let category = repository::insert_category(&state.db, req).await?;
    Ok(Json(category))
}

async fn update_category(
    State(state): State<AppState>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, AppError> {
    require_non_empty(&req.name, "Category name")?;
    let category = repository::update_category(&state.db, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, AppError> {
    let id = require_numeric_id(&params, "Category")?;
    repository::delete_category(&state.db, id).await?;
    Ok(Json(json!({ "message": "Category deleted successfully" })))
}
