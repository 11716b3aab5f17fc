use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Entity not found: {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Stale write: {kind} with id {id} was modified concurrently")]
    Conflict { kind: &'static str, id: String },
}

impl CatalogError {
    /// Shorthand for the domain-invariant error kind.
    pub fn invalid(message: impl Into<String>) -> Self {
        CatalogError::InvalidOperation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
