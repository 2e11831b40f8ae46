//! JWT refresh/access token pair issuance and verification.
//!
//! A refresh token is signed first; the access token copies its subject
//! and issuer with a shorter expiry and its own `jti`. Nothing is
//! persisted, so verification is purely a signature/expiry check.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use juris_core::models::user::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AuthConfig, JwtAlgorithm};
use crate::error::AuthError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID (UUID string).
    pub sub: String,
    pub token_type: TokenType,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

impl Claims {
    /// The subject parsed back into a user ID.
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| AuthError::TokenInvalid(format!("bad subject: {e}")))
    }
}

/// A freshly signed credential pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub refresh_token: String,
    pub access_token: String,
}

/// Issues and verifies tokens bound to an account identity.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<TokenPair, AuthError>;

    /// Verify signature, expiry and issuer, and that the token is of the
    /// `expected` type.
    fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError>;

    /// Seconds an issued access token stays valid.
    fn access_token_lifetime_secs(&self) -> u64;
}

/// [`TokenIssuer`] backed by `jsonwebtoken`.
#[derive(Debug, Clone)]
pub struct JwtTokenIssuer {
    config: AuthConfig,
}

impl JwtTokenIssuer {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn algorithm(&self) -> Algorithm {
        match self.config.jwt_algorithm {
            JwtAlgorithm::Hs256 => Algorithm::HS256,
            JwtAlgorithm::EdDsa => Algorithm::EdDSA,
        }
    }

    fn encoding_key(&self) -> Result<EncodingKey, AuthError> {
        match self.config.jwt_algorithm {
            JwtAlgorithm::Hs256 => {
                if self.config.jwt_secret.is_empty() {
                    return Err(AuthError::Crypto("JWT secret is not configured".into()));
                }
                Ok(EncodingKey::from_secret(self.config.jwt_secret.as_bytes()))
            }
            JwtAlgorithm::EdDsa => EncodingKey::from_ed_pem(self.config.jwt_private_key_pem.as_bytes())
                .map_err(|e| AuthError::Crypto(format!("bad private key: {e}"))),
        }
    }

    fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        match self.config.jwt_algorithm {
            JwtAlgorithm::Hs256 => Ok(DecodingKey::from_secret(self.config.jwt_secret.as_bytes())),
            JwtAlgorithm::EdDsa => DecodingKey::from_ed_pem(self.config.jwt_public_key_pem.as_bytes())
                .map_err(|e| AuthError::Crypto(format!("bad public key: {e}"))),
        }
    }

    /// Claims for a new refresh token.
    pub fn refresh_claims(&self, user_id: Uuid) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user_id.to_string(),
            token_type: TokenType::Refresh,
            iss: self.config.jwt_issuer.clone(),
            iat: now,
            exp: now + self.config.refresh_token_lifetime_secs as i64,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Derive access claims from refresh claims.
    pub fn access_claims(&self, refresh: &Claims) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: refresh.sub.clone(),
            token_type: TokenType::Access,
            iss: refresh.iss.clone(),
            iat: now,
            exp: now + self.config.access_token_lifetime_secs as i64,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Sign arbitrary claims with the configured key.
    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        let key = self.encoding_key()?;
        jsonwebtoken::encode(&Header::new(self.algorithm()), claims, &key)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Decode and verify a token of any type.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let key = self.decoding_key()?;

        let mut validation = Validation::new(self.algorithm());
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        jsonwebtoken::decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user: &User) -> Result<TokenPair, AuthError> {
        let refresh = self.refresh_claims(user.id);
        let access = self.access_claims(&refresh);
        Ok(TokenPair {
            refresh_token: self.encode(&refresh)?,
            access_token: self.encode(&access)?,
        })
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if claims.token_type != expected {
            return Err(AuthError::TokenInvalid(format!(
                "expected {expected:?} token, got {:?}",
                claims.token_type
            )));
        }
        Ok(claims)
    }

    fn access_token_lifetime_secs(&self) -> u64 {
        self.config.access_token_lifetime_secs
    }
}
