//! Database-specific error types and conversions.

use juris_core::error::JurisError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// Retryable optimistic-transaction conflict between writers.
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Duplicate {entity}")]
    Duplicate { entity: String },

    #[error("Referenced {entity} does not exist: {id}")]
    MissingReference { entity: String, id: String },

    #[error("Corrupt {entity} row: {reason}")]
    Corrupt { entity: String, reason: String },

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl DbError {
    /// Classify a failed statement. Unique index violations become
    /// [`DbError::Duplicate`], transaction races [`DbError::Conflict`];
    /// anything else is reported verbatim.
    pub(crate) fn statement(entity: &str, err: surrealdb::Error) -> Self {
        Self::classify(entity, err.to_string())
    }

    fn classify(entity: &str, message: String) -> Self {
        if message.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
            }
        } else if message.contains("Transaction conflict") || message.contains("retry the transaction") {
            DbError::Conflict(message)
        } else {
            DbError::Query(message)
        }
    }

    pub(crate) fn corrupt(entity: &str, reason: impl std::fmt::Display) -> Self {
        DbError::Corrupt {
            entity: entity.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<DbError> for JurisError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => JurisError::NotFound { entity, id },
            DbError::Duplicate { entity } => JurisError::AlreadyExists { entity },
            DbError::MissingReference { entity, id } => JurisError::MissingReference { entity, id },
            DbError::Hashing(msg) => JurisError::Crypto(msg),
            other => JurisError::Database(other.to_string()),
        }
    }
}
