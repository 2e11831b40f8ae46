//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time. Accounts created without a password get
//! an unusable credential: `!` followed by random data, which no Argon2
//! verification can ever match.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use juris_core::email::Email;
use juris_core::error::JurisResult;
use juris_core::models::user::{
    CreateUser, UNUSABLE_PASSWORD_PREFIX, UpdateUser, User, UserFields,
};
use juris_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::DbError;
use crate::retry;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    email: String,
    name: String,
    phone_number: Option<String>,
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    profile_picture: Option<String>,
    otp: Option<String>,
    password_hash: String,
    is_active: bool,
    is_verified: bool,
    is_staff: bool,
    is_superuser: bool,
    is_client: bool,
    is_lawyer: bool,
    is_google_user: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: String,
    name: String,
    phone_number: Option<String>,
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    profile_picture: Option<String>,
    otp: Option<String>,
    password_hash: String,
    is_active: bool,
    is_verified: bool,
    is_staff: bool,
    is_superuser: bool,
    is_client: bool,
    is_lawyer: bool,
    is_google_user: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> User {
        User {
            id,
            email: self.email,
            name: self.name,
            phone_number: self.phone_number,
            country: self.country,
            state: self.state,
            city: self.city,
            profile_picture: self.profile_picture,
            otp: self.otp,
            password_hash: self.password_hash,
            is_active: self.is_active,
            is_verified: self.is_verified,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            is_client: self.is_client,
            is_lawyer: self.is_lawyer,
            is_google_user: self.is_google_user,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::corrupt("user", format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            email: self.email,
            name: self.name,
            phone_number: self.phone_number,
            country: self.country,
            state: self.state,
            city: self.city,
            profile_picture: self.profile_picture,
            otp: self.otp,
            password_hash: self.password_hash,
            is_active: self.is_active,
            is_verified: self.is_verified,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            is_client: self.is_client,
            is_lawyer: self.is_lawyer,
            is_google_user: self.is_google_user,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hashing(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hashing(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// A credential that never verifies (30 random bytes, base64url).
fn unusable_password() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 30] = rand::Rng::random(&mut rng);
    format!("{UNUSABLE_PASSWORD_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash `password`, treating an absent or empty one as unusable.
fn credential(password: Option<&str>, pepper: Option<&str>) -> Result<String, DbError> {
    match password {
        Some(p) if !p.is_empty() => hash_password(p, pepper),
        _ => Ok(unusable_password()),
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    /// One attempt at the account insert.
    async fn insert(
        &self,
        id: Uuid,
        email: &Email,
        password_hash: &str,
        fields: &UserFields,
    ) -> Result<UserRow, DbError> {
        let id_str = id.to_string();
        let fields = fields.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email = $email, name = $name, \
                 phone_number = $phone_number, country = $country, \
                 state = $state, city = $city, \
                 profile_picture = $profile_picture, otp = $otp, \
                 password_hash = $password_hash, \
                 is_active = $is_active, is_verified = $is_verified, \
                 is_staff = $is_staff, is_superuser = $is_superuser, \
                 is_client = $is_client, is_lawyer = $is_lawyer, \
                 is_google_user = $is_google_user",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", email.as_str().to_string()))
            .bind(("name", fields.name))
            .bind(("phone_number", fields.phone_number))
            .bind(("country", fields.country))
            .bind(("state", fields.state))
            .bind(("city", fields.city))
            .bind(("profile_picture", fields.profile_picture))
            .bind(("otp", fields.otp))
            .bind(("password_hash", password_hash.to_string()))
            .bind(("is_active", fields.is_active))
            .bind(("is_verified", fields.is_verified))
            // Superusers are always staff.
            .bind(("is_staff", fields.is_staff || fields.is_superuser))
            .bind(("is_superuser", fields.is_superuser))
            .bind(("is_client", fields.is_client))
            .bind(("is_lawyer", fields.is_lawyer))
            .bind(("is_google_user", fields.is_google_user))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("user", e))?;

        let rows: Vec<UserRow> = result.take(0)?;
        rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })
    }

    /// Decide a write conflict that outlived its retries: if the email
    /// now belongs to an account the other writer won.
    async fn settle_conflict(&self, email: &Email, reason: String) -> DbError {
        match self.get_by_email(email).await {
            Ok(_) => DbError::Duplicate {
                entity: "user".into(),
            },
            Err(_) => DbError::Conflict(reason),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> JurisResult<User> {
        input.fields.validate()?;

        let id = Uuid::new_v4();
        let password_hash = credential(input.password.as_deref(), self.pepper.as_deref())?;
        let email = input.email;
        let fields = input.fields;

        let inserted = retry::on_conflict("user", || {
            self.insert(id, &email, &password_hash, &fields)
        })
        .await;
        let row = match inserted {
            Err(DbError::Conflict(reason)) => {
                return Err(self.settle_conflict(&email, reason).await.into());
            }
            other => other?,
        };

        info!(user_id = %id, "Created user account");
        Ok(row.into_user(id))
    }

    async fn get_by_id(&self, id: Uuid) -> JurisResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_email(&self, email: &Email) -> JurisResult<User> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM user WHERE email = $email")
            .bind(("email", email.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> JurisResult<User> {
        input.validate()?;
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.phone_number.is_some() {
            sets.push("phone_number = $phone_number");
        }
        if input.country.is_some() {
            sets.push("country = $country");
        }
        if input.state.is_some() {
            sets.push("state = $state");
        }
        if input.city.is_some() {
            sets.push("city = $city");
        }
        if input.profile_picture.is_some() {
            sets.push("profile_picture = $profile_picture");
        }
        if input.otp.is_some() {
            sets.push("otp = $otp");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        if input.is_verified.is_some() {
            sets.push("is_verified = $is_verified");
        }
        if input.is_superuser.is_some() {
            sets.push("is_superuser = $is_superuser");
        }
        // Superusers are always staff: promotion grants staff, and a staff
        // demotion leaves a standing superuser untouched.
        match (input.is_superuser, input.is_staff) {
            (Some(true), _) => sets.push("is_staff = true"),
            (Some(false), Some(_)) => sets.push("is_staff = $is_staff"),
            (None, Some(_)) => sets.push("is_staff = $is_staff OR is_superuser"),
            (_, None) => {}
        }
        if input.is_client.is_some() {
            sets.push("is_client = $is_client");
        }
        if input.is_lawyer.is_some() {
            sets.push("is_lawyer = $is_lawyer");
        }
        if input.is_google_user.is_some() {
            sets.push("is_google_user = $is_google_user");
        }
        if input.last_login.is_some() {
            sets.push("last_login = $last_login");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let db = &self.db;
        let (query, id_ref, input_ref) = (&query, &id_str, &input);
        let row = retry::on_conflict("user", || async move {
            let input = input_ref.clone();
            let mut builder = db.query(query.as_str()).bind(("id", id_ref.clone()));

            if let Some(email) = input.email {
                builder = builder.bind(("email", email.into_inner()));
            }
            if let Some(name) = input.name {
                builder = builder.bind(("name", name));
            }
            // Clearable fields: Some(Some(v)) = set, Some(None) = clear
            if let Some(phone_number) = input.phone_number {
                builder = builder.bind(("phone_number", phone_number));
            }
            if let Some(country) = input.country {
                builder = builder.bind(("country", country));
            }
            if let Some(state) = input.state {
                builder = builder.bind(("state", state));
            }
            if let Some(city) = input.city {
                builder = builder.bind(("city", city));
            }
            if let Some(profile_picture) = input.profile_picture {
                builder = builder.bind(("profile_picture", profile_picture));
            }
            if let Some(otp) = input.otp {
                builder = builder.bind(("otp", otp));
            }
            if let Some(is_active) = input.is_active {
                builder = builder.bind(("is_active", is_active));
            }
            if let Some(is_verified) = input.is_verified {
                builder = builder.bind(("is_verified", is_verified));
            }
            if let Some(is_staff) = input.is_staff {
                builder = builder.bind(("is_staff", is_staff));
            }
            if let Some(is_superuser) = input.is_superuser {
                builder = builder.bind(("is_superuser", is_superuser));
            }
            if let Some(is_client) = input.is_client {
                builder = builder.bind(("is_client", is_client));
            }
            if let Some(is_lawyer) = input.is_lawyer {
                builder = builder.bind(("is_lawyer", is_lawyer));
            }
            if let Some(is_google_user) = input.is_google_user {
                builder = builder.bind(("is_google_user", is_google_user));
            }
            if let Some(last_login) = input.last_login {
                builder = builder.bind(("last_login", last_login));
            }

            let mut result = builder
                .await?
                .check()
                .map_err(|e| DbError::statement("user", e))?;

            let rows: Vec<UserRow> = result.take(0)?;
            rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: "user".into(),
                id: id_ref.clone(),
            })
        })
        .await?;

        Ok(row.into_user(id))
    }

    async fn set_password(&self, id: Uuid, password: Option<String>) -> JurisResult<User> {
        let id_str = id.to_string();
        let password_hash = credential(password.as_deref(), self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 password_hash = $password_hash, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        info!(user_id = %id, "Changed user password");
        Ok(row.into_user(id))
    }

    async fn delete(&self, id: Uuid) -> JurisResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query("DELETE type::record('user', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: id_str,
            }
            .into());
        }

        info!(user_id = %id, "Deleted user account");
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> JurisResult<PaginatedResult<User>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_argon2id_and_salted() {
        let a = hash_password("hunter2", None).unwrap();
        let b = hash_password("hunter2", None).unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
    }

    #[test]
    fn missing_or_empty_password_is_unusable() {
        for password in [None, Some("")] {
            let stored = credential(password, None).unwrap();
            assert!(stored.starts_with(UNUSABLE_PASSWORD_PREFIX));
            assert_eq!(stored.len(), 41);
        }
        assert_ne!(unusable_password(), unusable_password());
    }
}
