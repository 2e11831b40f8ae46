//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations must enforce
//! email uniqueness and the one-to-one user/client link with storage
//! constraints rather than check-then-insert.

use uuid::Uuid;

use crate::email::Email;
use crate::error::JurisResult;
use crate::models::{
    client::{Client, CreateClient, UpdateClient},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with `AlreadyExists` when the email is
    /// taken.
    fn create(&self, input: CreateUser) -> impl Future<Output = JurisResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = JurisResult<User>> + Send;
    fn get_by_email(&self, email: &Email) -> impl Future<Output = JurisResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = JurisResult<User>> + Send;
    /// Re-hash the credential. `None` marks the password unusable.
    fn set_password(
        &self,
        id: Uuid,
        password: Option<String>,
    ) -> impl Future<Output = JurisResult<User>> + Send;
    /// Hard delete. The owned client profile goes with it.
    fn delete(&self, id: Uuid) -> impl Future<Output = JurisResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = JurisResult<PaginatedResult<User>>> + Send;
}

pub trait ClientRepository: Send + Sync {
    /// Insert a profile for an existing user. Fails with
    /// `MissingReference` for an unknown user and `AlreadyExists` when the
    /// user already owns a profile.
    fn create(&self, input: CreateClient) -> impl Future<Output = JurisResult<Client>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = JurisResult<Client>> + Send;
    fn get_by_user(&self, user_id: Uuid) -> impl Future<Output = JurisResult<Client>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateClient,
    ) -> impl Future<Output = JurisResult<Client>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = JurisResult<()>> + Send;
}
