use thiserror::Error;

/// Failure of a repository operation. Every backend reports the same
/// kinds so that callers can not tell the backends apart.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("An entity with id: `{0}` already exists")]
    Conflict(String),
    #[error("The entity with id: `{0}` was not found")]
    NotFound(String),
    #[error("No entities matched the query")]
    Empty,
    #[error("The storage backend failed: {0}")]
    Backend(#[source] anyhow::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        Self::Backend(e.into())
    }
}

/// Turns an empty query result into `StorageError::Empty`
pub fn non_empty<T>(items: Vec<T>) -> Result<Vec<T>, StorageError> {
    if items.is_empty() {
        Err(StorageError::Empty)
    } else {
        Ok(items)
    }
}
