//! Juris Core: domain models, error types and repository traits shared
//! by the storage and authentication crates.

pub mod assets;
pub mod email;
pub mod error;
pub mod models;
pub mod repository;

pub use email::{Email, EmailError};
pub use error::{JurisError, JurisResult};
