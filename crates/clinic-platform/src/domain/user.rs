//! User Record Entities
//!
//! The locally persisted profile/role record for every account. Exactly one
//! record exists per email and per external identity id; both are created
//! together with the remote identity record (see the account service).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. Immutable after creation; no operation mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile fields common to all roles; doctors additionally carry
/// specialization and license number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub address: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// A single availability entry for a doctor.
///
/// Fields default to empty strings so an incomplete entry deserializes and
/// is rejected by availability validation with a proper error body, not by
/// the JSON layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

/// Persistent user record, stored in the `users` collection.
///
/// `_id` is the external identity id, which makes the identity binding the
/// primary key: a token's subject id either resolves to exactly one record
/// or to none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// External identity id (primary key)
    #[serde(rename = "_id")]
    pub external_id: String,

    /// Email address (unique)
    pub email: String,

    /// Argon2id hash of the account password. Absent when authentication is
    /// fully delegated to the identity provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    pub role: Role,

    pub profile: Profile,

    /// Weekly availability (doctors only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<AvailabilitySlot>>,

    /// Transient password-reset state. `otp` and `otp_expiry` are always
    /// set or cleared together.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_bson_datetime"
    )]
    pub otp_expiry: Option<DateTime<Utc>>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// BSON datetime round-trip for optional timestamps, keeping `otpExpiry`
/// queryable by date in Mongo.
mod optional_bson_datetime {
    use bson::DateTime as BsonDateTime;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(BsonDateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<BsonDateTime>::deserialize(deserializer)?.map(BsonDateTime::to_chrono))
    }
}

impl UserRecord {
    pub fn new_patient(
        external_id: impl Into<String>,
        email: impl Into<String>,
        password_hash: Option<String>,
        profile: Profile,
    ) -> Self {
        let now = Utc::now();
        Self {
            external_id: external_id.into(),
            email: email.into(),
            password_hash,
            role: Role::Patient,
            profile,
            availability: None,
            otp: None,
            otp_expiry: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_doctor(
        external_id: impl Into<String>,
        email: impl Into<String>,
        password_hash: Option<String>,
        profile: Profile,
        availability: Vec<AvailabilitySlot>,
    ) -> Self {
        let now = Utc::now();
        Self {
            external_id: external_id.into(),
            email: email.into(),
            password_hash,
            role: Role::Doctor,
            profile,
            availability: Some(availability),
            otp: None,
            otp_expiry: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }
}
