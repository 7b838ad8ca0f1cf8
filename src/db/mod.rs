pub mod connection;
pub mod errors;
pub mod sqlite;
pub mod store;


pub use connection::*;
pub use errors::*;
pub use sqlite::SqliteTaskStore;
pub use store::{SharedStore, TaskStore};
