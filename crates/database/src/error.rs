use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to prepare the database location: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Column '{column}' holds an invalid value: {reason}")]
    CorruptValue { column: String, reason: String },

    #[error("The requested data was not found in the database.")]
    NotFound,
}
