//! SurrealDB connection management.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::repository::{SurrealClientRepository, SurrealUserRepository};
use crate::schema::run_migrations;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket address (e.g., `127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
    /// Server-side pepper handed to the user repository for password
    /// hashing.
    pub pepper: Option<String>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "juris".into(),
            database: "accounts".into(),
            username: "root".into(),
            password: "root".into(),
            pepper: None,
        }
    }
}

/// A migrated connection to the account store, and the repositories that
/// share it.
///
/// ```no_run
/// use juris_core::repository::ClientRepository;
/// use juris_db::{DbConfig, DbManager};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = DbManager::connect(&DbConfig::default()).await?;
/// let clients = manager.client_repository();
/// let _profile = clients.get_by_user(uuid::Uuid::new_v4()).await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
    pepper: Option<String>,
}

impl DbManager {
    /// Connect over WebSocket, sign in as root, select the configured
    /// namespace and database, and bring the schema up to date.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to account store"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        run_migrations(&db).await?;
        info!("Account store ready");

        Ok(Self {
            db,
            pepper: config.pepper.clone(),
        })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }

    /// User repository over this connection, hashing with the configured
    /// pepper.
    pub fn user_repository(&self) -> SurrealUserRepository<Client> {
        match &self.pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(self.db.clone(), pepper.clone()),
            None => SurrealUserRepository::new(self.db.clone()),
        }
    }

    pub fn client_repository(&self) -> SurrealClientRepository<Client> {
        SurrealClientRepository::new(self.db.clone())
    }
}
