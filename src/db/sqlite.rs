use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::errors::{Result, StoreError};
use crate::db::store::TaskStore;
use crate::models::{NewTask, Task, TaskRow, TaskUpdate};

/// SQLite-backed task store. Every operation is a single statement, so
/// concurrent writers are serialised by SQLite itself.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    // NULL `completed` counts as false, same as `TaskRow` reads it
    #[tracing::instrument(skip(self))]
    async fn list_tasks(&self, completed: Option<bool>) -> Result<Vec<Task>> {
        let rows = match completed {
            Some(completed) => {
                sqlx::query_as::<_, TaskRow>(
                    r#"
                    SELECT id, title, description, completed, created_at, updated_at
                    FROM tasks
                    WHERE COALESCE(completed, 0) = ?
                    ORDER BY id
                    "#,
                )
                .bind(completed)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, TaskRow>(
                    r#"
                    SELECT id, title, description, completed, created_at, updated_at
                    FROM tasks
                    ORDER BY id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!("Loaded {} tasks", rows.len());
        Ok(rows.into_iter().map(Task::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_task(&self, id: i64) -> Result<Task> {
        sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, completed, created_at, updated_at
            FROM tasks
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Task::from)
        .ok_or(StoreError::NotFound)
    }

    #[tracing::instrument(skip(self, draft), fields(title_len = draft.title.len()))]
    async fn create_task(&self, draft: NewTask) -> Result<Task> {
        if draft.title.is_empty() {
            return Err(StoreError::Invalid("title is required"));
        }

        let now = Utc::now();
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks (title, description, completed, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(false)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        debug!(task_id = row.id, "Created task");
        Ok(row.into())
    }

    #[tracing::instrument(skip(self, update), fields(task_id = update.id))]
    async fn update_task(&self, update: TaskUpdate) -> Result<Task> {
        if update.id <= 0 {
            return Err(StoreError::Invalid("invalid id"));
        }
        if update.title.is_empty() {
            return Err(StoreError::Invalid("title is required"));
        }

        let now = Utc::now();
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, completed = ?, updated_at = ?
            WHERE id = ?
            RETURNING created_at
            "#,
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.completed)
        .bind(now)
        .bind(update.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(Task {
            id: update.id,
            title: update.title,
            description: update.description,
            completed: update.completed,
            created_at,
            updated_at: now,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_task(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
