use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::models::{
    Category, NewCategoryRequest, NewProjectRequest, NewTaskRequest, Project, Task, TaskStats,
    UpdateCategoryRequest, UpdateProjectRequest, UpdateTaskRequest,
};
use crate::models::project::DEFAULT_COLOR;
use crate::models::task::{PRIORITY_HIGH, STATUS_DONE, STATUS_TODO};

pub async fn fetch_projects(db: &SqlitePool) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT id, name, description, color, created_at, updated_at \
         FROM projects ORDER BY created_at ASC",
    )
    .fetch_all(db)
    .await
}

pub async fn insert_project(
    db: &SqlitePool,
    req: NewProjectRequest,
) -> Result<Project, sqlx::Error> {
    let now = Utc::now();
    let color = req.color.unwrap_or_else(|| DEFAULT_COLOR.to_string());

    let result = sqlx::query(
        "INSERT INTO projects (name, description, color, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(&color)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(Project {
        id: result.last_insert_rowid(),
        name: req.name,
        description: req.description,
        color,
        created_at: now,
        updated_at: now,
    })
}

pub async fn find_project_by_id(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT id, name, description, color, created_at, updated_at \
         FROM projects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn update_project(
    db: &SqlitePool,
    req: UpdateProjectRequest,
) -> Result<Option<Project>, sqlx::Error> {
    let mut current = match find_project_by_id(db, req.id).await? {
        Some(p) => p,
        None => return Ok(None),
    };

    current.name = req.name;
    current.description = req.description;
    current.updated_at = Utc::now();

    sqlx::query("UPDATE projects SET name = ?, description = ?, updated_at = ? WHERE id = ?")
        .bind(&current.name)
        .bind(&current.description)
        .bind(current.updated_at)
        .bind(current.id)
        .execute(db)
        .await?;

    Ok(Some(current))
}

pub async fn delete_project(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_categories(db: &SqlitePool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "SELECT id, name, color, created_at FROM categories ORDER BY created_at ASC",
    )
    .fetch_all(db)
    .await
}

pub async fn insert_category(
    db: &SqlitePool,
    req: NewCategoryRequest,
) -> Result<Category, sqlx::Error> {
    let now = Utc::now();
    let color = req.color.unwrap_or_else(|| DEFAULT_COLOR.to_string());

    let result = sqlx::query("INSERT INTO categories (name, color, created_at) VALUES (?, ?, ?)")
        .bind(&req.name)
        .bind(&color)
        .bind(now)
        .execute(db)
        .await?;

    Ok(Category {
        id: result.last_insert_rowid(),
        name: req.name,
        color,
        created_at: now,
    })
}

pub async fn find_category_by_id(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "SELECT id, name, color, created_at FROM categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn update_category(
    db: &SqlitePool,
    req: UpdateCategoryRequest,
) -> Result<Option<Category>, sqlx::Error> {
    let mut current = match find_category_by_id(db, req.id).await? {
        Some(c) => c,
        None => return Ok(None),
    };

    current.name = req.name;
    if let Some(color) = req.color {
        current.color = color;
    }

    sqlx::query("UPDATE categories SET name = ?, color = ? WHERE id = ?")
        .bind(&current.name)
        .bind(&current.color)
        .bind(current.id)
        .execute(db)
        .await?;

    Ok(Some(current))
}

pub async fn delete_category(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_tasks(db: &SqlitePool) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT id, title, description, priority, status, due_date, completed, \
         project_id, category_id, created_at, updated_at \
         FROM tasks ORDER BY created_at ASC",
    )
    .fetch_all(db)
    .await
}

pub async fn insert_task(db: &SqlitePool, req: NewTaskRequest) -> Result<Task, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    // New tasks always start in "todo" regardless of client input.
    let status = STATUS_TODO.to_string();
    let priority = req.priority.unwrap_or(0);

    sqlx::query(
        "INSERT INTO tasks \
         (id, title, description, priority, status, due_date, completed, \
         project_id, category_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(priority)
    .bind(&status)
    .bind(req.due_date)
    .bind(req.project_id)
    .bind(req.category_id)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(Task {
        id,
        title: req.title,
        description: req.description,
        priority,
        status,
        due_date: req.due_date,
        completed: false,
        project_id: req.project_id,
        category_id: req.category_id,
        created_at: now,
        updated_at: now,
    })
}

pub async fn find_task_by_id(db: &SqlitePool, id: &str) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT id, title, description, priority, status, due_date, completed, \
         project_id, category_id, created_at, updated_at \
         FROM tasks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn update_task(
    db: &SqlitePool,
    req: UpdateTaskRequest,
) -> Result<Option<Task>, sqlx::Error> {
    let mut current = match find_task_by_id(db, &req.id).await? {
        Some(t) => t,
        None => return Ok(None),
    };

    current.title = req.title;
    current.description = req.description;
    current.priority = req.priority;
    current.status = req.status;
    // Status is the source of truth; completed is derived, never stored
    // independently.
    current.completed = current.status == STATUS_DONE;
    current.updated_at = Utc::now();

    sqlx::query(
        "UPDATE tasks \
         SET title = ?, description = ?, priority = ?, status = ?, completed = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&current.title)
    .bind(&current.description)
    .bind(current.priority)
    .bind(&current.status)
    .bind(current.completed)
    .bind(current.updated_at)
    .bind(&current.id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn delete_task(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Debug, FromRow)]
struct StatsRow {
    total: i64,
    completed: i64,
    overdue: i64,
    high_priority: i64,
}

/// One aggregate pass over the task table. No caching; every call re-scans.
pub async fn task_stats(db: &SqlitePool) -> Result<TaskStats, sqlx::Error> {
    let now = Utc::now();

    let row = sqlx::query_as::<_, StatsRow>(
        "SELECT \
         COUNT(*) AS total, \
         COALESCE(SUM(CASE WHEN completed = 1 THEN 1 ELSE 0 END), 0) AS completed, \
         COALESCE(SUM(CASE WHEN due_date IS NOT NULL AND due_date < ? AND completed = 0 \
             THEN 1 ELSE 0 END), 0) AS overdue, \
         COALESCE(SUM(CASE WHEN priority = ? THEN 1 ELSE 0 END), 0) AS high_priority \
         FROM tasks",
    )
    .bind(now)
    .bind(PRIORITY_HIGH)
    .fetch_one(db)
    .await?;

    let completion_percentage = if row.total > 0 {
        ((row.completed as f64 / row.total as f64) * 100.0).round() as i64
    } else {
        0
    };

    Ok(TaskStats {
        total_tasks: row.total,
        completed_tasks: row.completed,
        completion_percentage,
        overdue_tasks: row.overdue,
        high_priority_tasks: row.high_priority,
    })
}
