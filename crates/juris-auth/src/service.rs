//! Authentication service: login, token refresh and access token checks.

use chrono::Utc;
use juris_core::email::Email;
use juris_core::error::{JurisError, JurisResult};
use juris_core::models::user::{UpdateUser, User};
use juris_core::repository::UserRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{Claims, TokenIssuer, TokenPair, TokenType};

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Signed JWT refresh token.
    pub refresh_token: String,
    pub user_id: Uuid,
    /// Access token lifetime in seconds, as reported by the issuer.
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over the repository and token issuer so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, T: TokenIssuer> {
    user_repo: U,
    issuer: T,
    config: AuthConfig,
}

impl<U: UserRepository, T: TokenIssuer> AuthService<U, T> {
    pub fn new(user_repo: U, issuer: T, config: AuthConfig) -> Self {
        Self {
            user_repo,
            issuer,
            config,
        }
    }

    /// Authenticate with email + password and issue a token pair.
    pub async fn login(&self, input: LoginInput) -> JurisResult<LoginOutput> {
        // 1. Look up the account. A malformed email is just an unknown one.
        let Ok(email) = Email::parse(&input.email) else {
            warn!("Login rejected: malformed email");
            return Err(AuthError::InvalidCredentials.into());
        };
        let user = match self.user_repo.get_by_email(&email).await {
            Ok(u) => u,
            Err(JurisError::NotFound { .. }) => {
                warn!("Login rejected: unknown account");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        // 2. Verify password.
        let valid = password::check_password(&user, &input.password, self.config.pepper.as_deref())?;
        if !valid {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        // 3. Check account status.
        if !user.is_active {
            warn!(user_id = %user.id, "Login rejected: account inactive");
            return Err(AuthError::AccountInactive.into());
        }

        // 4. Stamp last login.
        self.user_repo
            .update(
                user.id,
                UpdateUser {
                    last_login: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        // 5. Issue tokens.
        let pair = self.issuer.issue(&user)?;
        info!(user_id = %user.id, "Login succeeded");

        Ok(LoginOutput {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user_id: user.id,
            expires_in: self.issuer.access_token_lifetime_secs(),
        })
    }

    /// Exchange a refresh token for a new pair, provided the account
    /// still exists and is active.
    pub async fn refresh(&self, refresh_token: &str) -> JurisResult<TokenPair> {
        let claims = self.issuer.verify(refresh_token, TokenType::Refresh)?;
        let user = self.load_subject(&claims).await?;

        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        Ok(self.issuer.issue(&user)?)
    }

    /// Stateless verification of an access token.
    pub fn validate_access_token(&self, token: &str) -> JurisResult<Claims> {
        Ok(self.issuer.verify(token, TokenType::Access)?)
    }

    async fn load_subject(&self, claims: &Claims) -> JurisResult<User> {
        let user_id = claims.user_id()?;
        self.user_repo.get_by_id(user_id).await.map_err(|e| match e {
            JurisError::NotFound { .. } => {
                AuthError::TokenInvalid("subject no longer exists".into()).into()
            }
            other => other,
        })
    }
}
