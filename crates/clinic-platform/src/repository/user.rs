//! User Repository (MongoDB)

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};

use crate::domain::{Role, UserRecord};
use crate::error::Result;
use crate::repository::{OtpState, ProfilePatch, UserStore, UserUpdate};

pub struct UserRepository {
    collection: Collection<UserRecord>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

/// Flatten a profile patch into dotted `$set` paths so untouched profile
/// fields survive the update.
fn profile_set_fields(set: &mut Document, patch: &ProfilePatch) {
    if let Some(ref v) = patch.first_name {
        set.insert("profile.firstName", v);
    }
    if let Some(ref v) = patch.last_name {
        set.insert("profile.lastName", v);
    }
    if let Some(ref v) = patch.phone {
        set.insert("profile.phone", v);
    }
    if let Some(ref v) = patch.address {
        set.insert("profile.address", v);
    }
    if let Some(ref v) = patch.specialization {
        set.insert("profile.specialization", v);
    }
    if let Some(ref v) = patch.license_number {
        set.insert("profile.licenseNumber", v);
    }
}

fn build_update_document(update: &UserUpdate) -> Result<Document> {
    let mut set = doc! {};
    let mut unset = doc! {};

    if let Some(ref email) = update.email {
        set.insert("email", email);
    }
    if let Some(ref hash) = update.password_hash {
        set.insert("passwordHash", hash);
    }
    if let Some(ref patch) = update.profile {
        profile_set_fields(&mut set, patch);
    }
    if let Some(ref availability) = update.availability {
        set.insert("availability", bson::to_bson(availability)?);
    }
    match update.otp {
        Some(OtpState::Issued { ref code, expires_at }) => {
            set.insert("otp", code);
            set.insert("otpExpiry", bson::DateTime::from_chrono(expires_at));
        }
        Some(OtpState::Cleared) => {
            unset.insert("otp", "");
            unset.insert("otpExpiry", "");
        }
        None => {}
    }

    set.insert("updatedAt", bson::DateTime::now());

    let mut document = doc! { "$set": set };
    if !unset.is_empty() {
        document.insert("$unset", unset);
    }
    Ok(document)
}

#[async_trait::async_trait]
impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserRecord>> {
        Ok(self.collection.find_one(doc! { "_id": external_id }).await?)
    }

    async fn insert(&self, record: &UserRecord) -> Result<()> {
        self.collection.insert_one(record).await?;
        Ok(())
    }

    async fn update_fields(&self, external_id: &str, update: &UserUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(self
                .collection
                .count_documents(doc! { "_id": external_id })
                .await?
                > 0);
        }

        let document = build_update_document(update)?;
        let result = self
            .collection
            .update_one(doc! { "_id": external_id }, document)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, external_id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": external_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_doctors(&self, specialization: Option<&str>, limit: Option<i64>) -> Result<Vec<UserRecord>> {
        let mut filter = doc! { "role": Role::Doctor.as_str() };
        if let Some(specialization) = specialization {
            filter.insert("profile.specialization", specialization);
        }

        let mut query = self
            .collection
            .find(filter)
            .sort(doc! { "profile.firstName": 1, "profile.lastName": 1 });
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        Ok(query.await?.try_collect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AvailabilitySlot;

    #[test]
    fn test_profile_patch_uses_dotted_paths() {
        let update = UserUpdate {
            profile: Some(ProfilePatch {
                first_name: Some("Ada".to_string()),
                specialization: Some("Cardiology".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let document = build_update_document(&update).unwrap();
        let set = document.get_document("$set").unwrap();
        assert_eq!(set.get_str("profile.firstName").unwrap(), "Ada");
        assert_eq!(set.get_str("profile.specialization").unwrap(), "Cardiology");
        assert!(!set.contains_key("profile"));
        assert!(!set.contains_key("profile.lastName"));
    }

    #[test]
    fn test_otp_issued_sets_both_fields() {
        let update = UserUpdate {
            otp: Some(OtpState::Issued {
                code: "12345".to_string(),
                expires_at: chrono::Utc::now(),
            }),
            ..Default::default()
        };

        let document = build_update_document(&update).unwrap();
        let set = document.get_document("$set").unwrap();
        assert_eq!(set.get_str("otp").unwrap(), "12345");
        assert!(set.get_datetime("otpExpiry").is_ok());
        assert!(!document.contains_key("$unset"));
    }

    #[test]
    fn test_otp_cleared_unsets_both_fields() {
        let update = UserUpdate {
            otp: Some(OtpState::Cleared),
            ..Default::default()
        };

        let document = build_update_document(&update).unwrap();
        let unset = document.get_document("$unset").unwrap();
        assert!(unset.contains_key("otp"));
        assert!(unset.contains_key("otpExpiry"));
    }

    #[test]
    fn test_availability_serializes_whole_sequence() {
        let update = UserUpdate {
            availability: Some(vec![AvailabilitySlot {
                day: "Mon".to_string(),
                start_time: "09:00".to_string(),
                end_time: "12:00".to_string(),
            }]),
            ..Default::default()
        };

        let document = build_update_document(&update).unwrap();
        let set = document.get_document("$set").unwrap();
        let slots = set.get_array("availability").unwrap();
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_update_always_touches_updated_at() {
        let update = UserUpdate {
            email: Some("new@x.com".to_string()),
            ..Default::default()
        };
        let document = build_update_document(&update).unwrap();
        let set = document.get_document("$set").unwrap();
        assert!(set.get_datetime("updatedAt").is_ok());
    }
}
