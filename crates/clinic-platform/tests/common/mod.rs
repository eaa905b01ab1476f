//! Shared test doubles: in-memory user store, mock identity provider, and
//! mock mail sender.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use clinic_platform::domain::{Role, UserRecord};
use clinic_platform::error::{ClinicError, Result};
use clinic_platform::identity::{
    AccountUpdate, IdentityError, IdentityProvider, TokenClaims,
};
use clinic_platform::repository::{OtpState, UserStore, UserUpdate};
use clinic_platform::service::MailSender;

// ============================================================================
// In-memory user store
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserStore {
    records: Mutex<HashMap<String, UserRecord>>,
    pub fail_next_insert: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn get(&self, external_id: &str) -> Option<UserRecord> {
        self.records.lock().get(external_id).cloned()
    }

    pub fn get_by_email(&self, email: &str) -> Option<UserRecord> {
        self.records.lock().values().find(|r| r.email == email).cloned()
    }

    pub fn put(&self, record: UserRecord) {
        self.records.lock().insert(record.external_id.clone(), record);
    }

    /// Mutate a stored record in place, e.g. to age an OTP expiry.
    pub fn tweak<F: FnOnce(&mut UserRecord)>(&self, email: &str, f: F) {
        let mut records = self.records.lock();
        let record = records
            .values_mut()
            .find(|r| r.email == email)
            .expect("record not found");
        f(record);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.get_by_email(email))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserRecord>> {
        Ok(self.get(external_id))
    }

    async fn insert(&self, record: &UserRecord) -> Result<()> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(ClinicError::upstream("simulated insert failure"));
        }
        let mut records = self.records.lock();
        if records.contains_key(&record.external_id)
            || records.values().any(|r| r.email == record.email)
        {
            return Err(ClinicError::conflict("duplicate key"));
        }
        records.insert(record.external_id.clone(), record.clone());
        Ok(())
    }

    async fn update_fields(&self, external_id: &str, update: &UserUpdate) -> Result<bool> {
        let mut records = self.records.lock();
        let Some(record) = records.get_mut(external_id) else {
            return Ok(false);
        };

        if let Some(ref email) = update.email {
            record.email = email.clone();
        }
        if let Some(ref hash) = update.password_hash {
            record.password_hash = Some(hash.clone());
        }
        if let Some(ref patch) = update.profile {
            if let Some(ref v) = patch.first_name {
                record.profile.first_name = v.clone();
            }
            if let Some(ref v) = patch.last_name {
                record.profile.last_name = v.clone();
            }
            if let Some(ref v) = patch.phone {
                record.profile.phone = v.clone();
            }
            if let Some(ref v) = patch.address {
                record.profile.address = v.clone();
            }
            if let Some(ref v) = patch.specialization {
                record.profile.specialization = Some(v.clone());
            }
            if let Some(ref v) = patch.license_number {
                record.profile.license_number = Some(v.clone());
            }
        }
        if let Some(ref availability) = update.availability {
            record.availability = Some(availability.clone());
        }
        match update.otp {
            Some(OtpState::Issued { ref code, expires_at }) => {
                record.otp = Some(code.clone());
                record.otp_expiry = Some(expires_at);
            }
            Some(OtpState::Cleared) => {
                record.otp = None;
                record.otp_expiry = None;
            }
            None => {}
        }
        record.updated_at = chrono::Utc::now();
        Ok(true)
    }

    async fn delete(&self, external_id: &str) -> Result<bool> {
        Ok(self.records.lock().remove(external_id).is_some())
    }

    async fn list_doctors(&self, specialization: Option<&str>, limit: Option<i64>) -> Result<Vec<UserRecord>> {
        let mut doctors: Vec<UserRecord> = self
            .records
            .lock()
            .values()
            .filter(|r| r.role == Role::Doctor)
            .filter(|r| match specialization {
                Some(s) => r.profile.specialization.as_deref() == Some(s),
                None => true,
            })
            .cloned()
            .collect();
        doctors.sort_by(|a, b| {
            (&a.profile.first_name, &a.profile.last_name)
                .cmp(&(&b.profile.first_name, &b.profile.last_name))
        });
        if let Some(limit) = limit {
            doctors.truncate(limit as usize);
        }
        Ok(doctors)
    }
}

// ============================================================================
// Mock identity provider
// ============================================================================

#[derive(Debug, Clone)]
pub struct RemoteAccount {
    pub email: String,
    pub password: Option<String>,
    pub role_claim: Option<Role>,
}

enum TokenState {
    Valid(TokenClaims),
    Expired,
}

#[derive(Default)]
pub struct MockIdentityProvider {
    accounts: Mutex<HashMap<String, RemoteAccount>>,
    tokens: Mutex<HashMap<String, TokenState>>,
    pub fail_create: AtomicBool,
    pub fail_set_role: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_account(&self, email: &str, role: Option<Role>) -> String {
        let id = format!("remote-{}", uuid::Uuid::new_v4());
        self.accounts.lock().insert(
            id.clone(),
            RemoteAccount {
                email: email.to_string(),
                password: None,
                role_claim: role,
            },
        );
        id
    }

    /// Register a token whose claims mirror the stored account.
    pub fn issue_token(&self, remote_id: &str) -> String {
        let account = self
            .accounts
            .lock()
            .get(remote_id)
            .cloned()
            .expect("remote account not found");
        self.issue_token_with_claims(remote_id, &account.email, account.role_claim)
    }

    /// Register a token with arbitrary claims, e.g. a stale subject id.
    pub fn issue_token_with_claims(&self, subject_id: &str, email: &str, role: Option<Role>) -> String {
        let token = format!("tok-{}", uuid::Uuid::new_v4());
        self.tokens.lock().insert(
            token.clone(),
            TokenState::Valid(TokenClaims {
                subject_id: subject_id.to_string(),
                email: email.to_string(),
                role_claim: role,
            }),
        );
        token
    }

    pub fn issue_expired_token(&self) -> String {
        let token = format!("tok-{}", uuid::Uuid::new_v4());
        self.tokens.lock().insert(token.clone(), TokenState::Expired);
        token
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().len()
    }

    pub fn has_account(&self, remote_id: &str) -> bool {
        self.accounts.lock().contains_key(remote_id)
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.accounts.lock().values().any(|a| a.email == email)
    }

    pub fn account(&self, remote_id: &str) -> Option<RemoteAccount> {
        self.accounts.lock().get(remote_id).cloned()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn verify_token(&self, raw_token: &str) -> std::result::Result<TokenClaims, IdentityError> {
        match self.tokens.lock().get(raw_token) {
            Some(TokenState::Valid(claims)) => Ok(claims.clone()),
            Some(TokenState::Expired) => Err(IdentityError::Expired),
            None => Err(IdentityError::Invalid),
        }
    }

    async fn find_by_email(&self, email: &str) -> std::result::Result<Option<String>, IdentityError> {
        Ok(self
            .accounts
            .lock()
            .iter()
            .find(|(_, a)| a.email == email)
            .map(|(id, _)| id.clone()))
    }

    async fn create_account(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> std::result::Result<String, IdentityError> {
        if self.fail_create.swap(false, Ordering::SeqCst) {
            return Err(IdentityError::Transport("simulated create failure".to_string()));
        }
        let mut accounts = self.accounts.lock();
        if accounts.values().any(|a| a.email == email) {
            return Err(IdentityError::EmailExists);
        }
        let id = format!("remote-{}", uuid::Uuid::new_v4());
        accounts.insert(
            id.clone(),
            RemoteAccount {
                email: email.to_string(),
                password: password.map(str::to_string),
                role_claim: None,
            },
        );
        Ok(id)
    }

    async fn set_role_claim(&self, remote_id: &str, role: Role) -> std::result::Result<(), IdentityError> {
        if self.fail_set_role.swap(false, Ordering::SeqCst) {
            return Err(IdentityError::Transport("simulated claim failure".to_string()));
        }
        let mut accounts = self.accounts.lock();
        let account = accounts.get_mut(remote_id).ok_or(IdentityError::NotFound)?;
        account.role_claim = Some(role);
        Ok(())
    }

    async fn update_account(
        &self,
        remote_id: &str,
        update: &AccountUpdate,
    ) -> std::result::Result<(), IdentityError> {
        let mut accounts = self.accounts.lock();
        let account = accounts.get_mut(remote_id).ok_or(IdentityError::NotFound)?;
        if let Some(ref email) = update.email {
            account.email = email.clone();
        }
        if let Some(ref password) = update.password {
            account.password = Some(password.clone());
        }
        Ok(())
    }

    async fn delete_account(&self, remote_id: &str) -> std::result::Result<(), IdentityError> {
        if self.fail_delete.swap(false, Ordering::SeqCst) {
            return Err(IdentityError::Transport("simulated delete failure".to_string()));
        }
        match self.accounts.lock().remove(remote_id) {
            Some(_) => Ok(()),
            None => Err(IdentityError::NotFound),
        }
    }

    async fn mint_login_token(&self, remote_id: &str) -> std::result::Result<String, IdentityError> {
        if !self.accounts.lock().contains_key(remote_id) {
            return Err(IdentityError::NotFound);
        }
        Ok(format!("login-{}", remote_id))
    }
}

// ============================================================================
// Mock mail sender
// ============================================================================

#[derive(Default)]
pub struct MockMailSender {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl MockMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_code(&self) -> Option<String> {
        self.sent.lock().last().map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl MailSender for MockMailSender {
    async fn send_otp(&self, email: &str, code: &str) -> bool {
        if self.fail.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().push((email.to_string(), code.to_string()));
        true
    }
}
