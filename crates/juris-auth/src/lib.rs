//! Juris Auth: account creation, password verification and JWT token
//! pair issuance.

pub mod accounts;
pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use accounts::{
    NewAccount, create_client_profile, create_superuser, create_user, issue_tokens,
    set_profile_picture,
};
pub use config::{AuthConfig, JwtAlgorithm};
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput};
pub use token::{Claims, JwtTokenIssuer, TokenIssuer, TokenPair, TokenType};
