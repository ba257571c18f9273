//! Error types for the document layer.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for document store operations.
pub type DbResult<T> = Result<T, DbError>;

/// Document store error types.
#[derive(Debug, Error, Diagnostic)]
pub enum DbError {
    /// Could not reach or authenticate against the store
    #[error("Failed to connect to document store at {url}")]
    #[diagnostic(
        code(storefront_db::connection_failed),
        help("Check TARGET_DB_URL and that the document store is running")
    )]
    Connection {
        url: String,
        #[source]
        cause: surrealdb::Error,
    },

    /// SurrealDB query error
    #[error("Database error: {0}")]
    Surreal(#[from] surrealdb::Error),

    /// Document not found
    #[error("{collection} document not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document rejected by the store
    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },
}

impl DbError {
    /// Create a connection error.
    pub fn connection(url: impl Into<String>, cause: surrealdb::Error) -> Self {
        Self::Connection {
            url: url.into(),
            cause,
        }
    }

    /// Create a not found error.
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    /// Create an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}
