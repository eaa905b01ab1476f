//! Account Lifecycle
//!
//! Orchestrates dual-system account creation, update, and deletion across
//! the identity provider and the local record store. The two systems share
//! no transaction boundary: multi-step flows rely on compensating actions.
//! A crash between the remote create and the local insert can still leave a
//! remote-only orphan; that residue is a documented limitation of the
//! design, not something this service papers over.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::domain::{AvailabilitySlot, Profile, Role, UserRecord};
use crate::error::{ClinicError, Result};
use crate::identity::{AccountUpdate, IdentityError, IdentityProvider};
use crate::repository::{ProfilePatch, UserStore, UserUpdate};
use crate::service::password::PasswordService;

/// Partial account update accepted by the admin update endpoint.
///
/// `role` is never a legal patch field; its presence fails the request
/// rather than being silently dropped.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub profile: Option<ProfilePatch>,
    pub availability: Option<Vec<AvailabilitySlot>>,
}

/// Result of a successful password login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub role: Role,
    pub user_id: String,
}

/// Map identity provider failures from account operations. Verification
/// failures are mapped separately by the token verifier.
fn idp_error(e: IdentityError) -> ClinicError {
    match e {
        IdentityError::EmailExists => ClinicError::conflict("Email already exists at identity provider"),
        IdentityError::NotFound => ClinicError::not_found("Account not found at identity provider"),
        IdentityError::Expired | IdentityError::Invalid => {
            ClinicError::unauthorized("Invalid authorization token")
        }
        IdentityError::Transport(message) => {
            ClinicError::upstream(format!("identity provider call failed: {}", message))
        }
    }
}

fn validate_availability(slots: &[AvailabilitySlot]) -> Result<()> {
    for slot in slots {
        if slot.day.trim().is_empty()
            || slot.start_time.trim().is_empty()
            || slot.end_time.trim().is_empty()
        {
            return Err(ClinicError::validation("Invalid availability format"));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    idp: Arc<dyn IdentityProvider>,
    passwords: Arc<PasswordService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        idp: Arc<dyn IdentityProvider>,
        passwords: Arc<PasswordService>,
    ) -> Self {
        Self { users, idp, passwords }
    }

    /// Register a new patient account.
    pub async fn create_patient(&self, email: &str, password: &str, profile: Profile) -> Result<UserRecord> {
        self.create_account(email, password, Role::Patient, |remote_id, hash| {
            UserRecord::new_patient(remote_id, email, hash, profile)
        })
        .await
    }

    /// Provision a doctor account. Availability is validated before any
    /// side effect.
    pub async fn create_doctor(
        &self,
        email: &str,
        password: &str,
        profile: Profile,
        availability: Vec<AvailabilitySlot>,
    ) -> Result<UserRecord> {
        if profile.first_name.trim().is_empty() || profile.last_name.trim().is_empty() {
            return Err(ClinicError::validation(
                "Invalid input: firstName and lastName are required",
            ));
        }
        validate_availability(&availability)?;

        self.create_account(email, password, Role::Doctor, |remote_id, hash| {
            UserRecord::new_doctor(remote_id, email, hash, profile, availability)
        })
        .await
    }

    /// Dual-write creation: remote identity record first, then the local
    /// record linked by external id. A failed local insert deletes the
    /// just-created remote account so no orphan survives the request.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
        build: impl FnOnce(String, Option<String>) -> UserRecord + Send,
    ) -> Result<UserRecord> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClinicError::validation(
                "Invalid input: email and password are required",
            ));
        }

        if self.users.find_by_email(email).await?.is_some() {
            return Err(ClinicError::conflict("Email already exists"));
        }

        // Checked before creation so a duplicate surfaces as a clean 409
        // instead of a create-then-fail.
        if self.idp.find_by_email(email).await.map_err(idp_error)?.is_some() {
            return Err(ClinicError::conflict("Email already exists at identity provider"));
        }

        let remote_id = self
            .idp
            .create_account(email, Some(password))
            .await
            .map_err(idp_error)?;

        if let Err(e) = self.idp.set_role_claim(&remote_id, role).await {
            self.compensate_remote_create(&remote_id, email).await;
            return Err(idp_error(e));
        }

        let password_hash = Some(self.passwords.hash_password(password)?);
        let record = build(remote_id.clone(), password_hash);

        if let Err(e) = self.users.insert(&record).await {
            self.compensate_remote_create(&remote_id, email).await;
            return Err(e);
        }

        info!(external_id = %remote_id, %role, "account created");
        Ok(record)
    }

    /// Delete a remote account created earlier in the same request. Failure
    /// here leaves a remote-only orphan, so it is logged loudly, but the
    /// original error is what the caller sees.
    async fn compensate_remote_create(&self, remote_id: &str, email: &str) {
        match self.idp.delete_account(remote_id).await {
            Ok(()) | Err(IdentityError::NotFound) => {
                info!(%remote_id, "compensated remote account creation");
            }
            Err(e) => {
                error!(%remote_id, %email, error = %e, "compensation failed: remote account orphaned");
            }
        }
    }

    /// Apply a partial account update. Remote-facing changes (email,
    /// password) go to the identity provider first; the local record is
    /// only touched after the remote update succeeds.
    pub async fn update_account(&self, external_id: &str, patch: &AccountPatch) -> Result<()> {
        if patch.role.is_some() {
            return Err(ClinicError::validation("Role is immutable and cannot be updated"));
        }
        if let Some(ref availability) = patch.availability {
            validate_availability(availability)?;
        }

        let record = self
            .users
            .find_by_external_id(external_id)
            .await?
            .ok_or_else(|| ClinicError::not_found("Account not found"))?;

        let email_change = patch
            .email
            .as_deref()
            .filter(|email| *email != record.email);

        if let Some(email) = email_change {
            if self.users.find_by_email(email).await?.is_some() {
                return Err(ClinicError::conflict("Email already exists"));
            }
        }

        if email_change.is_some() || patch.password.is_some() {
            let remote_update = AccountUpdate {
                email: email_change.map(str::to_string),
                password: patch.password.clone(),
            };
            self.idp
                .update_account(external_id, &remote_update)
                .await
                .map_err(idp_error)?;
        }

        let password_hash = match patch.password.as_deref() {
            Some(password) => Some(self.passwords.hash_password(password)?),
            None => None,
        };

        let update = UserUpdate {
            email: email_change.map(str::to_string),
            password_hash,
            profile: patch.profile.clone(),
            availability: patch.availability.clone(),
            otp: None,
        };

        if !self.users.update_fields(external_id, &update).await? {
            // The record existed moments ago; losing it mid-update is a
            // race with a concurrent delete. Reported, not retried.
            return Err(ClinicError::upstream("user record disappeared during update"));
        }

        Ok(())
    }

    /// Delete an account from both systems. A remote record that is already
    /// gone is tolerated so deletion stays idempotent from the caller's
    /// view of the provider.
    pub async fn delete_account(&self, external_id: &str) -> Result<()> {
        if self.users.find_by_external_id(external_id).await?.is_none() {
            return Err(ClinicError::not_found("Account not found"));
        }

        match self.idp.delete_account(external_id).await {
            Ok(()) => {}
            Err(IdentityError::NotFound) => {
                warn!(%external_id, "remote identity record already absent during delete");
            }
            Err(e) => return Err(idp_error(e)),
        }

        if !self.users.delete(external_id).await? {
            return Err(ClinicError::upstream("user record delete reported no rows"));
        }

        info!(%external_id, "account deleted");
        Ok(())
    }

    /// Password login: verify against the local hash, then mint a login
    /// token at the identity provider.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let record = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| ClinicError::unauthorized("Invalid credentials"))?;

        let valid = record
            .password_hash
            .as_deref()
            .map(|hash| self.passwords.verify_password(password, hash))
            .unwrap_or(false);

        if !valid {
            return Err(ClinicError::unauthorized("Invalid credentials"));
        }

        let token = self
            .idp
            .mint_login_token(&record.external_id)
            .await
            .map_err(|e| {
                warn!(external_id = %record.external_id, error = %e, "login token minting failed");
                ClinicError::upstream("login token minting failed")
            })?;

        Ok(LoginOutcome {
            token,
            role: record.role,
            user_id: record.external_id,
        })
    }

    /// Federated login: the provider-verified token proves the remote
    /// account exists. First sight of an email creates a local patient
    /// record bound to the token's subject id. No compensation applies on
    /// insert failure because this flow never created the remote account.
    pub async fn google_login(&self, id_token: &str) -> Result<UserRecord> {
        let claims = match self.idp.verify_token(id_token).await {
            Ok(claims) => claims,
            Err(IdentityError::Expired) | Err(IdentityError::Invalid) | Err(IdentityError::NotFound) => {
                return Err(ClinicError::unauthorized("Invalid Google token"));
            }
            Err(e) => return Err(idp_error(e)),
        };

        if claims.email.is_empty() {
            return Err(ClinicError::unauthorized("Invalid Google token"));
        }

        if let Some(record) = self.users.find_by_email(&claims.email).await? {
            if record.external_id != claims.subject_id {
                return Err(ClinicError::forbidden("Access denied: identity binding mismatch"));
            }
            return Ok(record);
        }

        // Only patients may self-provision through federated login.
        self.idp
            .set_role_claim(&claims.subject_id, Role::Patient)
            .await
            .map_err(idp_error)?;

        let record = UserRecord::new_patient(&claims.subject_id, &claims.email, None, Profile::default());
        self.users.insert(&record).await?;

        info!(external_id = %claims.subject_id, "patient provisioned via federated login");
        Ok(record)
    }
}
