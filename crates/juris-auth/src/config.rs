//! Authentication configuration.

/// Signing scheme for issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// HMAC-SHA256 with [`AuthConfig::jwt_secret`].
    Hs256,
    /// Ed25519 with the PEM key pair in [`AuthConfig`].
    EdDsa,
}

/// Configuration for token issuance and password verification.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_algorithm: JwtAlgorithm,
    /// Shared secret for HS256.
    pub jwt_secret: String,
    /// PEM-encoded Ed25519 private key for EdDSA signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for EdDSA verification.
    pub jwt_public_key_pem: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Access token lifetime in seconds (default: 300 = 5 minutes).
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 86_400 = 1 day).
    pub refresh_token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id
    /// verification. Must match the pepper the user repository hashes
    /// with.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_algorithm: JwtAlgorithm::Hs256,
            jwt_secret: String::new(),
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            jwt_issuer: "juris".into(),
            access_token_lifetime_secs: 300,
            refresh_token_lifetime_secs: 86_400,
            pepper: None,
        }
    }
}
