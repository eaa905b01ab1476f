//! Request Principal
//!
//! The verified identity extracted from a bearer token. Lives for one
//! request; carries no local state.

use serde::{Deserialize, Serialize};

use crate::domain::Role;

/// Verified token identity for the current request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Stable external identity id (token subject)
    pub subject_id: String,

    /// Email address from the verified token
    pub email: String,

    /// Role claim embedded in the token. Absent on tokens minted before
    /// the role claim was attached; the re-derive policy does not need it.
    pub role_claim: Option<Role>,
}

impl Principal {
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>, role_claim: Option<Role>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            role_claim,
        }
    }
}
