//! Role Authorization
//!
//! Allow/deny decisions for a verified principal against a required role.
//! The two policies reflect two trust models: trusting the token's role
//! claim outright, or re-deriving the role from the local record and
//! checking the identity binding on every request. The policy is chosen
//! once at startup and injected, never mixed per-route.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Principal, Role};
use crate::error::{ClinicError, Result};
use crate::repository::UserStore;

#[async_trait]
pub trait RolePolicy: Send + Sync {
    /// Allow or deny `principal` for an operation requiring `required`.
    /// Pure with respect to state; the re-derive policy performs one
    /// read-only lookup.
    async fn authorize(&self, principal: &Principal, required: Role) -> Result<()>;

    fn name(&self) -> &'static str;
}

fn role_denied(required: Role) -> ClinicError {
    ClinicError::forbidden(format!("Access denied: {} role required", required))
}

/// Trusts the token's role claim. No lookup; a stale or forged claim is
/// undetectable.
pub struct TrustClaimPolicy;

#[async_trait]
impl RolePolicy for TrustClaimPolicy {
    async fn authorize(&self, principal: &Principal, required: Role) -> Result<()> {
        match principal.role_claim {
            Some(claim) if claim == required => Ok(()),
            _ => Err(role_denied(required)),
        }
    }

    fn name(&self) -> &'static str {
        "trust-claim"
    }
}

/// Re-derives the role from the stored record and checks that the record's
/// external id still matches the token subject. Catches tokens whose
/// subject no longer matches the record, e.g. a recreated remote account.
pub struct RederivePolicy {
    users: Arc<dyn UserStore>,
}

impl RederivePolicy {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl RolePolicy for RederivePolicy {
    async fn authorize(&self, principal: &Principal, required: Role) -> Result<()> {
        let record = self
            .users
            .find_by_email(&principal.email)
            .await?
            .ok_or_else(|| ClinicError::forbidden("Access denied: unknown principal"))?;

        if record.external_id != principal.subject_id {
            return Err(ClinicError::forbidden("Access denied: identity binding mismatch"));
        }

        if record.role != required {
            return Err(role_denied(required));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "re-derive"
    }
}
