//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as strings.
//! Uniqueness and the user → client cascade live in the schema so that
//! concurrent writers cannot bypass them.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "accounts_and_clients",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- User accounts
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string \
    ASSERT string::len($value) > 0 AND string::len($value) <= 250;
DEFINE FIELD name ON TABLE user TYPE string DEFAULT '';
DEFINE FIELD phone_number ON TABLE user TYPE option<string>;
DEFINE FIELD country ON TABLE user TYPE option<string>;
DEFINE FIELD state ON TABLE user TYPE option<string>;
DEFINE FIELD city ON TABLE user TYPE option<string>;
DEFINE FIELD profile_picture ON TABLE user TYPE option<string>;
DEFINE FIELD otp ON TABLE user TYPE option<string>;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD is_verified ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD is_staff ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD is_superuser ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD is_client ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD is_lawyer ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD is_google_user ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD last_login ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Client profiles (one per user)
-- =======================================================================
DEFINE TABLE client SCHEMAFULL;
DEFINE FIELD user_id ON TABLE client TYPE string;
DEFINE FIELD name ON TABLE client TYPE option<string>;
DEFINE FIELD account_type ON TABLE client TYPE option<string>;
DEFINE FIELD account_usecase ON TABLE client TYPE option<string>;
DEFINE FIELD created_at ON TABLE client TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE client TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_client_user ON TABLE client COLUMNS user_id UNIQUE;

-- Deleting an account removes its client profile.
DEFINE EVENT user_delete_cascade_client ON TABLE user \
    WHEN $event = 'DELETE' \
    THEN (DELETE client WHERE user_id = meta::id($before.id));
";

/// Run all pending migrations against the given SurrealDB instance.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_declares_storage_constraints() {
        assert!(SCHEMA_V1.contains("idx_user_email ON TABLE user COLUMNS email UNIQUE"));
        assert!(SCHEMA_V1.contains("idx_client_user ON TABLE client COLUMNS user_id UNIQUE"));
        assert!(SCHEMA_V1.contains("DEFINE EVENT user_delete_cascade_client"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
