//! SurrealDB implementation of [`ClientRepository`].
//!
//! The owning user's existence is checked inside the same statement that
//! creates the profile, and the `idx_client_user` unique index keeps the
//! link one-to-one.

use chrono::{DateTime, Utc};
use juris_core::error::JurisResult;
use juris_core::models::client::{Client, CreateClient, UpdateClient};
use juris_core::repository::ClientRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::retry;

/// Error text thrown when the referenced user record is absent.
const MISSING_USER: &str = "client profile references a missing user";

#[derive(Debug, SurrealValue)]
struct ClientRow {
    user_id: String,
    name: Option<String>,
    account_type: Option<String>,
    account_usecase: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ClientRowWithId {
    record_id: String,
    user_id: String,
    name: Option<String>,
    account_type: Option<String>,
    account_usecase: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn row_to_client(row: ClientRow, id: Uuid) -> Result<Client, DbError> {
    let user_id = Uuid::parse_str(&row.user_id)
        .map_err(|e| DbError::corrupt("client", format!("invalid user UUID: {e}")))?;
    Ok(Client {
        id,
        user_id,
        name: row.name,
        account_type: row.account_type,
        account_usecase: row.account_usecase,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl ClientRowWithId {
    fn try_into_client(self) -> Result<Client, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::corrupt("client", format!("invalid UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::corrupt("client", format!("invalid user UUID: {e}")))?;
        Ok(Client {
            id,
            user_id,
            name: self.name,
            account_type: self.account_type,
            account_usecase: self.account_usecase,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Client profile repository.
#[derive(Clone)]
pub struct SurrealClientRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealClientRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// One attempt at the guarded profile insert.
    async fn insert(&self, id: Uuid, input: &CreateClient) -> Result<ClientRow, DbError> {
        let id_str = id.to_string();
        let user_id_str = input.user_id.to_string();

        let query = format!(
            "IF array::len(SELECT VALUE id FROM type::record('user', $user_id)) = 0 {{ \
                 THROW '{MISSING_USER}'; \
             }} ELSE {{ \
                 CREATE type::record('client', $id) SET \
                 user_id = $user_id, \
                 name = $name, \
                 account_type = $account_type, \
                 account_usecase = $account_usecase; \
             }}"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("user_id", user_id_str.clone()))
            .bind(("name", input.name.clone()))
            .bind(("account_type", input.account_type.clone()))
            .bind(("account_usecase", input.account_usecase.clone()))
            .await?;

        let mut result = result.check().map_err(|e| {
            if e.to_string().contains(MISSING_USER) {
                DbError::MissingReference {
                    entity: "user".into(),
                    id: user_id_str,
                }
            } else {
                DbError::statement("client", e)
            }
        })?;

        let rows: Vec<ClientRow> = result.take(0)?;
        rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "client".into(),
            id: id_str,
        })
    }

    /// Decide a write conflict that outlived its retries: if the user now
    /// owns a profile the other writer won.
    async fn settle_conflict(&self, user_id: Uuid, reason: String) -> DbError {
        match self.get_by_user(user_id).await {
            Ok(_) => DbError::Duplicate {
                entity: "client".into(),
            },
            Err(_) => DbError::Conflict(reason),
        }
    }
}

impl<C: Connection> ClientRepository for SurrealClientRepository<C> {
    async fn create(&self, input: CreateClient) -> JurisResult<Client> {
        input.validate()?;

        let id = Uuid::new_v4();
        let inserted = retry::on_conflict("client", || self.insert(id, &input)).await;
        let row = match inserted {
            Err(DbError::Conflict(reason)) => {
                return Err(self.settle_conflict(input.user_id, reason).await.into());
            }
            other => other?,
        };

        info!(client_id = %id, user_id = %input.user_id, "Created client profile");
        row_to_client(row, id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> JurisResult<Client> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('client', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client".into(),
            id: id_str,
        })?;

        row_to_client(row, id).map_err(Into::into)
    }

    async fn get_by_user(&self, user_id: Uuid) -> JurisResult<Client> {
        let user_id_str = user_id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM client WHERE user_id = $user_id")
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client".into(),
            id: format!("user_id={user_id_str}"),
        })?;

        row.try_into_client().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateClient) -> JurisResult<Client> {
        input.validate()?;
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.account_type.is_some() {
            sets.push("account_type = $account_type");
        }
        if input.account_usecase.is_some() {
            sets.push("account_usecase = $account_usecase");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('client', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(account_type) = input.account_type {
            builder = builder.bind(("account_type", account_type));
        }
        if let Some(account_usecase) = input.account_usecase {
            builder = builder.bind(("account_usecase", account_usecase));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("client", e))?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "client".into(),
            id: id_str,
        })?;

        row_to_client(row, id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> JurisResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('client', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::statement("client", e))?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "client".into(),
                id: id_str,
            }
            .into());
        }

        info!(client_id = %id, "Deleted client profile");
        Ok(())
    }
}
