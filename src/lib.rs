pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;

// Re-export commonly used types
pub use models::{NewTask, Task, TaskUpdate};

pub use db::{
    create_in_memory_pool, create_pool, health_check, init_schema, SharedStore, SqliteTaskStore,
    StoreError, TaskStore,
};

pub use auth::{AuthError, CurrentUser, TokenCodec};

pub use config::{AppConfig, ConfigError};
