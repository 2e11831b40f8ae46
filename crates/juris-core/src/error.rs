//! Error types for Juris accounts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JurisError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Referenced {entity} does not exist: {id}")]
    MissingReference { entity: String, id: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Asset storage error: {0}")]
    Storage(String),
}

impl JurisError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type JurisResult<T> = Result<T, JurisError>;
