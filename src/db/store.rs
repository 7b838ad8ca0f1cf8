use async_trait::async_trait;
use std::sync::Arc;

use crate::db::errors::Result;
use crate::models::{NewTask, Task, TaskUpdate};

/// Persistence capability consumed by the HTTP handlers.
///
/// Implementations own their backing storage. Validation and not-found
/// outcomes are reported as [`StoreError::Invalid`] and
/// [`StoreError::NotFound`]; everything else is a backend failure.
///
/// [`StoreError::Invalid`]: crate::db::StoreError::Invalid
/// [`StoreError::NotFound`]: crate::db::StoreError::NotFound
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks in insertion order, optionally restricted by completion.
    async fn list_tasks(&self, completed: Option<bool>) -> Result<Vec<Task>>;

    async fn get_task(&self, id: i64) -> Result<Task>;

    /// Insert a task. The store assigns the id and both timestamps and
    /// forces `completed = false`.
    async fn create_task(&self, draft: NewTask) -> Result<Task>;

    /// Replace title/description/completed and refresh `updated_at`.
    ///
    /// The returned task carries the caller's values; only `created_at` and
    /// `updated_at` come from the store.
    async fn update_task(&self, update: TaskUpdate) -> Result<Task>;

    async fn delete_task(&self, id: i64) -> Result<()>;
}

pub type SharedStore = Arc<dyn TaskStore>;
