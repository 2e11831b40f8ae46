//! User account domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check_length;
use crate::email::Email;
use crate::error::{JurisError, JurisResult};

pub const NAME_MAX_LENGTH: usize = 250;
pub const PHONE_MAX_LENGTH: usize = 100;
pub const LOCATION_MAX_LENGTH: usize = 250;
pub const OTP_MAX_LENGTH: usize = 150;

/// Prefix every unusable credential starts with. Argon2 PHC strings begin
/// with `$`, so the two can never collide.
pub const UNUSABLE_PASSWORD_PREFIX: char = '!';

/// Boolean role/status attributes a capability check can ask about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountFlag {
    Active,
    Verified,
    Staff,
    Superuser,
    Client,
    Lawyer,
    GoogleUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Normalized login identifier.
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    /// Reference returned by the asset store, not the image itself.
    pub profile_picture: Option<String>,
    pub otp: Option<String>,
    /// Argon2id PHC string, or an unusable marker starting with `!`.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_client: bool,
    pub is_lawyer: bool,
    pub is_google_user: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Raw value of a single flag.
    pub fn flag(&self, flag: AccountFlag) -> bool {
        match flag {
            AccountFlag::Active => self.is_active,
            AccountFlag::Verified => self.is_verified,
            AccountFlag::Staff => self.is_staff,
            AccountFlag::Superuser => self.is_superuser,
            AccountFlag::Client => self.is_client,
            AccountFlag::Lawyer => self.is_lawyer,
            AccountFlag::GoogleUser => self.is_google_user,
        }
    }

    /// Capability check. Disabled accounts have no capabilities and
    /// active superusers have all of them.
    pub fn has_permission(&self, flag: AccountFlag) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_superuser || self.flag(flag)
    }

    /// Whether a local password can ever verify for this account.
    pub fn has_usable_password(&self) -> bool {
        !self.password_hash.is_empty() && !self.password_hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// Attributes accepted alongside email and password when an account is
/// created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFields {
    pub name: String,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub profile_picture: Option<String>,
    pub otp: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_client: bool,
    pub is_lawyer: bool,
    pub is_google_user: bool,
}

impl Default for UserFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone_number: None,
            country: None,
            state: None,
            city: None,
            profile_picture: None,
            otp: None,
            is_active: true,
            is_verified: false,
            is_staff: false,
            is_superuser: false,
            is_client: false,
            is_lawyer: false,
            is_google_user: false,
        }
    }
}

impl UserFields {
    pub fn validate(&self) -> JurisResult<()> {
        check_length("name", Some(&self.name), NAME_MAX_LENGTH)?;
        check_length("phone_number", self.phone_number.as_deref(), PHONE_MAX_LENGTH)?;
        check_length("country", self.country.as_deref(), LOCATION_MAX_LENGTH)?;
        check_length("state", self.state.as_deref(), LOCATION_MAX_LENGTH)?;
        check_length("city", self.city.as_deref(), LOCATION_MAX_LENGTH)?;
        check_length("otp", self.otp.as_deref(), OTP_MAX_LENGTH)
    }
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: Email,
    /// Raw password (hashed with Argon2id before storage). `None` stores
    /// an unusable credential.
    pub password: Option<String>,
    pub fields: UserFields,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub email: Option<Email>,
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub phone_number: Option<Option<String>>,
    pub country: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub profile_picture: Option<Option<String>>,
    pub otp: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_client: Option<bool>,
    pub is_lawyer: Option<bool>,
    pub is_google_user: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UpdateUser {
    pub fn validate(&self) -> JurisResult<()> {
        if self.is_superuser == Some(true) && self.is_staff == Some(false) {
            return Err(JurisError::validation("a superuser must also be staff"));
        }
        check_length("name", self.name.as_deref(), NAME_MAX_LENGTH)?;
        check_length("phone_number", flatten(&self.phone_number), PHONE_MAX_LENGTH)?;
        check_length("country", flatten(&self.country), LOCATION_MAX_LENGTH)?;
        check_length("state", flatten(&self.state), LOCATION_MAX_LENGTH)?;
        check_length("city", flatten(&self.city), LOCATION_MAX_LENGTH)?;
        check_length("otp", flatten(&self.otp), OTP_MAX_LENGTH)
    }
}

fn flatten(value: &Option<Option<String>>) -> Option<&str> {
    value.as_ref().and_then(|v| v.as_deref())
}
