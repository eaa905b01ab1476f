//! Principal Record Store
//!
//! Persistence for user records. Services code against the [`UserStore`]
//! trait so the account lifecycle is testable without a database; the
//! MongoDB implementation lives in [`user`].

pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AvailabilitySlot, UserRecord};
use crate::error::Result;

pub use user::UserRepository;

/// Partial profile update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
}

/// Password-reset code state transition. The code and its expiry always
/// move together.
#[derive(Debug, Clone, PartialEq)]
pub enum OtpState {
    Issued { code: String, expires_at: DateTime<Utc> },
    Cleared,
}

/// Partial update applied to a user record. Never a full overwrite:
/// unspecified fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub profile: Option<ProfilePatch>,
    pub availability: Option<Vec<AvailabilitySlot>>,
    pub otp: Option<OtpState>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.profile.is_none()
            && self.availability.is_none()
            && self.otp.is_none()
    }
}

/// Store contract for user records, keyed by the external identity id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserRecord>>;

    async fn insert(&self, record: &UserRecord) -> Result<()>;

    /// Apply a partial update. Returns `false` when no record matched.
    async fn update_fields(&self, external_id: &str, update: &UserUpdate) -> Result<bool>;

    /// Delete a record. Returns `false` when no record matched.
    async fn delete(&self, external_id: &str) -> Result<bool>;

    /// List doctor records sorted by first/last name, optionally filtered
    /// by specialization and capped at `limit`.
    async fn list_doctors(&self, specialization: Option<&str>, limit: Option<i64>) -> Result<Vec<UserRecord>>;
}
