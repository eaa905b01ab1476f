//! Token Verification
//!
//! Turns a raw bearer token into a [`Principal`] via the identity provider.
//! Verification failures map to 401 without forwarding provider internals.

use std::sync::Arc;

use tracing::warn;

use crate::domain::Principal;
use crate::error::{ClinicError, Result};
use crate::identity::{IdentityError, IdentityProvider};

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub struct TokenVerifier {
    idp: Arc<dyn IdentityProvider>,
}

impl TokenVerifier {
    pub fn new(idp: Arc<dyn IdentityProvider>) -> Self {
        Self { idp }
    }

    /// Verify a raw bearer token. Mutates no state.
    pub async fn verify(&self, raw_token: &str) -> Result<Principal> {
        if raw_token.is_empty() {
            return Err(ClinicError::unauthorized("Authorization token is missing"));
        }

        match self.idp.verify_token(raw_token).await {
            Ok(claims) => Ok(Principal::new(claims.subject_id, claims.email, claims.role_claim)),
            Err(IdentityError::Expired) => {
                Err(ClinicError::unauthorized("Authorization token has expired"))
            }
            Err(IdentityError::Invalid) | Err(IdentityError::NotFound) => {
                Err(ClinicError::unauthorized("Invalid authorization token"))
            }
            Err(e) => {
                // Provider internals never reach the client.
                warn!(error = %e, "token verification failed upstream");
                Err(ClinicError::unauthorized("Authentication failed"))
            }
        }
    }
}
