//! Identity Provider Integration
//!
//! The external identity provider owns credentials and token issuance; the
//! platform keeps a local record per account. This module defines the
//! fallible contract the rest of the platform codes against, plus the HTTP
//! implementation.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Role;

pub use http::{HttpIdentityProvider, HttpIdentityProviderConfig};

/// Errors surfaced by the identity provider.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    Invalid,

    #[error("account not found")]
    NotFound,

    #[error("email already registered")]
    EmailExists,

    #[error("identity provider error: {0}")]
    Transport(String),
}

/// Claims extracted from a verified token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub subject_id: String,
    pub email: String,
    pub role_claim: Option<Role>,
}

/// Partial update pushed to a remote identity record.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

/// Contract with the external identity provider.
///
/// Every method is a blocking round trip to the provider; callers sequence
/// them explicitly and never retry automatically.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer token and return its claims.
    async fn verify_token(&self, raw_token: &str) -> Result<TokenClaims, IdentityError>;

    /// Look up the remote id for an email, if an account exists.
    async fn find_by_email(&self, email: &str) -> Result<Option<String>, IdentityError>;

    /// Create a remote account and return its id. Password may be absent
    /// when authentication is fully delegated (e.g. federated sign-in).
    async fn create_account(&self, email: &str, password: Option<&str>) -> Result<String, IdentityError>;

    /// Attach a role claim to the remote account, to be embedded in tokens
    /// it mints from then on.
    async fn set_role_claim(&self, remote_id: &str, role: Role) -> Result<(), IdentityError>;

    /// Push an email and/or password change to the remote account.
    async fn update_account(&self, remote_id: &str, update: &AccountUpdate) -> Result<(), IdentityError>;

    /// Delete the remote account. Returns `NotFound` if it is already gone,
    /// which deletion flows treat as success.
    async fn delete_account(&self, remote_id: &str) -> Result<(), IdentityError>;

    /// Mint a one-time login token for the account (password login flow).
    async fn mint_login_token(&self, remote_id: &str) -> Result<String, IdentityError>;
}
