//! Password Reset
//!
//! One-time numeric codes with a fixed validity window. Code delivery is
//! best-effort: a failed send is logged and the request still succeeds, so
//! a flaky mail relay cannot lock users out of requesting a reset.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::warn;

use crate::error::{ClinicError, Result};
use crate::identity::{AccountUpdate, IdentityError, IdentityProvider};
use crate::repository::{OtpState, UserStore, UserUpdate};
use crate::service::mail::MailSender;
use crate::service::password::PasswordService;

/// Validity window for a one-time code, inclusive: a code is still valid
/// exactly this many seconds after issuance.
pub const OTP_VALIDITY_SECS: i64 = 600;

fn generate_otp() -> String {
    rand::thread_rng().gen_range(10000..=99999).to_string()
}

#[derive(Clone)]
pub struct PasswordResetService {
    users: Arc<dyn UserStore>,
    idp: Arc<dyn IdentityProvider>,
    mail: Arc<dyn MailSender>,
    passwords: Arc<PasswordService>,
}

impl PasswordResetService {
    pub fn new(
        users: Arc<dyn UserStore>,
        idp: Arc<dyn IdentityProvider>,
        mail: Arc<dyn MailSender>,
        passwords: Arc<PasswordService>,
    ) -> Self {
        Self { users, idp, mail, passwords }
    }

    /// Issue a one-time code and dispatch it to the account email.
    pub async fn request_reset(&self, email: &str) -> Result<()> {
        let record = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| ClinicError::not_found("Email not found"))?;

        let code = generate_otp();
        let update = UserUpdate {
            otp: Some(OtpState::Issued {
                code: code.clone(),
                expires_at: Utc::now() + Duration::seconds(OTP_VALIDITY_SECS),
            }),
            ..Default::default()
        };
        self.users.update_fields(&record.external_id, &update).await?;

        if !self.mail.send_otp(email, &code).await {
            warn!(%email, "one-time code delivery failed; reset still requestable");
        }

        Ok(())
    }

    /// Check a submitted code against the stored one. The expiry boundary
    /// is inclusive: a code verified exactly at its expiry instant is valid.
    pub async fn verify_reset(&self, email: &str, code: &str) -> Result<()> {
        let record = self.users.find_by_email(email).await?;

        let valid = match record {
            Some(ref record) => {
                record.otp.as_deref() == Some(code)
                    && record
                        .otp_expiry
                        .map(|expiry| Utc::now() <= expiry)
                        .unwrap_or(false)
            }
            None => false,
        };

        if !valid {
            return Err(ClinicError::validation("Invalid or expired OTP"));
        }

        Ok(())
    }

    /// Finish the reset: clear the stored code, then push the new password
    /// to the identity provider and the local hash.
    pub async fn complete_reset(&self, email: &str, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(ClinicError::validation("Invalid input: newPassword is required"));
        }

        let record = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| ClinicError::not_found("User not found"))?;

        self.users
            .update_fields(
                &record.external_id,
                &UserUpdate {
                    otp: Some(OtpState::Cleared),
                    ..Default::default()
                },
            )
            .await?;

        let remote_update = AccountUpdate {
            email: None,
            password: Some(new_password.to_string()),
        };
        match self.idp.update_account(&record.external_id, &remote_update).await {
            Ok(()) => {}
            Err(IdentityError::NotFound) => {
                return Err(ClinicError::not_found("User not found at identity provider"));
            }
            Err(e) => {
                return Err(ClinicError::upstream(format!("identity provider call failed: {}", e)));
            }
        }

        let hash = self.passwords.hash_password(new_password)?;
        self.users
            .update_fields(
                &record.external_id,
                &UserUpdate {
                    password_hash: Some(hash),
                    ..Default::default()
                },
            )
            .await?;

        Ok(())
    }
}
