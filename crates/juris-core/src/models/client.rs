//! Client profile domain model.
//!
//! A client profile is a one-to-one extension of a [`User`](super::user::User)
//! and never outlives it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check_length;
use crate::error::JurisResult;

pub const CLIENT_FIELD_MAX_LENGTH: usize = 250;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    /// Owning user account.
    pub user_id: Uuid,
    pub name: Option<String>,
    pub account_type: Option<String>,
    pub account_usecase: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClient {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub account_type: Option<String>,
    pub account_usecase: Option<String>,
}

impl CreateClient {
    pub fn validate(&self) -> JurisResult<()> {
        check_length("name", self.name.as_deref(), CLIENT_FIELD_MAX_LENGTH)?;
        check_length(
            "account_type",
            self.account_type.as_deref(),
            CLIENT_FIELD_MAX_LENGTH,
        )?;
        check_length(
            "account_usecase",
            self.account_usecase.as_deref(),
            CLIENT_FIELD_MAX_LENGTH,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateClient {
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub name: Option<Option<String>>,
    pub account_type: Option<Option<String>>,
    pub account_usecase: Option<Option<String>>,
}

impl UpdateClient {
    pub fn validate(&self) -> JurisResult<()> {
        for (field, value) in [
            ("name", &self.name),
            ("account_type", &self.account_type),
            ("account_usecase", &self.account_usecase),
        ] {
            let value = value.as_ref().and_then(|v| v.as_deref());
            check_length(field, value, CLIENT_FIELD_MAX_LENGTH)?;
        }
        Ok(())
    }
}
