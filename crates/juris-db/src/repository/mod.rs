//! SurrealDB repository implementations.

mod client;
mod user;

pub use client::SurrealClientRepository;
pub use user::SurrealUserRepository;
