//! Account operations that sit above the repositories.
//!
//! Each operation takes the repository (and any collaborator) explicitly,
//! so callers decide which storage backend is in play.

use juris_core::assets::{AssetStore, PROFILE_PICTURE_PREFIX};
use juris_core::email::Email;
use juris_core::error::{JurisError, JurisResult};
use juris_core::models::client::{Client, CreateClient};
use juris_core::models::user::{CreateUser, UpdateUser, User, UserFields};
use juris_core::repository::{ClientRepository, UserRepository};
use tracing::info;
use uuid::Uuid;

use crate::error::AuthError;
use crate::token::{TokenIssuer, TokenPair};

/// Raw account request as it arrives from a caller.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub email: Option<String>,
    pub password: Option<String>,
    pub fields: UserFields,
}

fn non_empty(password: Option<String>) -> Option<String> {
    password.filter(|p| !p.is_empty())
}

/// Create a regular account.
///
/// The email is required and normalized before it reaches storage. A
/// missing or empty password is only accepted for Google-federated
/// accounts, which then carry an unusable credential.
pub async fn create_user<U: UserRepository>(repo: &U, account: NewAccount) -> JurisResult<User> {
    let raw = account
        .email
        .ok_or_else(|| JurisError::validation("email is required"))?;
    let email = Email::parse(&raw).map_err(|e| JurisError::validation(e.to_string()))?;

    let password = non_empty(account.password);
    if password.is_none() && !account.fields.is_google_user {
        return Err(JurisError::validation(
            "password is required unless the account signs in with Google",
        ));
    }
    account.fields.validate()?;

    repo.create(CreateUser {
        email,
        password,
        fields: account.fields,
    })
    .await
}

/// Create an administrative account with staff and superuser flags set.
pub async fn create_superuser<U: UserRepository>(
    repo: &U,
    mut account: NewAccount,
) -> JurisResult<User> {
    account.password = non_empty(account.password);
    if account.password.is_none() {
        return Err(JurisError::validation("superuser must have a password"));
    }
    account.fields.is_superuser = true;
    account.fields.is_staff = true;

    let user = create_user(repo, account).await?;
    info!(user_id = %user.id, "Created superuser");
    Ok(user)
}

/// Attach a client profile to an existing account.
pub async fn create_client_profile<C: ClientRepository>(
    repo: &C,
    input: CreateClient,
) -> JurisResult<Client> {
    repo.create(input).await
}

/// Mint a fresh refresh/access pair for `user`.
pub fn issue_tokens<T: TokenIssuer>(issuer: &T, user: &User) -> Result<TokenPair, AuthError> {
    issuer.issue(user)
}

/// Upload a profile picture and record the returned reference on the
/// account.
pub async fn set_profile_picture<U, S>(
    users: &U,
    store: &S,
    user_id: Uuid,
    file_name: &str,
    bytes: Vec<u8>,
) -> JurisResult<User>
where
    U: UserRepository,
    S: AssetStore,
{
    // Fail before uploading for unknown accounts.
    users.get_by_id(user_id).await?;

    let reference = store.store(PROFILE_PICTURE_PREFIX, file_name, bytes).await?;
    users
        .update(
            user_id,
            UpdateUser {
                profile_picture: Some(Some(reference)),
                ..Default::default()
            },
        )
        .await
}
