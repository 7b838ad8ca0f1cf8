use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    /// Caller-supplied data failed a store-level rule; the message is safe to
    /// show to clients.
    #[error("{0}")]
    Invalid(&'static str),

    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    Query(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
