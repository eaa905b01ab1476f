//! Doctors Admin API
//!
//! REST endpoints for doctor account management.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::domain::{AvailabilitySlot, Profile, Role, UserRecord};
use crate::error::ClinicError;
use crate::api::common::{ApiResult, MessageResponse};
use crate::api::middleware::RequireAdmin;
use crate::repository::UserStore;
use crate::service::account::AccountPatch;
use crate::service::AccountService;

/// Doctor response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorResponse {
    pub doctor_id: String,
    pub email: String,
    pub role: Role,
    pub profile: Profile,
    pub availability: Vec<AvailabilitySlot>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRecord> for DoctorResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            doctor_id: record.external_id,
            email: record.email,
            role: record.role,
            profile: record.profile,
            availability: record.availability.unwrap_or_default(),
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the doctors list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorsQuery {
    pub specialization: Option<String>,
    pub limit: Option<i64>,
}

/// Doctors admin state
#[derive(Clone)]
pub struct DoctorsState {
    pub accounts: AccountService,
    pub users: Arc<dyn UserStore>,
}

async fn find_doctor(state: &DoctorsState, id: &str) -> Result<UserRecord, ClinicError> {
    state
        .users
        .find_by_external_id(id)
        .await?
        .filter(UserRecord::is_doctor)
        .ok_or_else(|| ClinicError::not_found("Doctor not found"))
}

/// List doctors
#[utoipa::path(
    get,
    path = "",
    tag = "doctors",
    responses(
        (status = 200, description = "Doctor list", body = [DoctorResponse]),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_doctors(
    State(state): State<DoctorsState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<DoctorsQuery>,
) -> ApiResult<Vec<DoctorResponse>> {
    let doctors = state
        .users
        .list_doctors(query.specialization.as_deref(), query.limit)
        .await?;

    Ok(Json(doctors.into_iter().map(DoctorResponse::from).collect()))
}

/// Get doctor by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "doctors",
    responses(
        (status = 200, description = "Doctor", body = DoctorResponse),
        (status = 404, description = "Doctor not found")
    )
)]
pub async fn get_doctor(
    State(state): State<DoctorsState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> ApiResult<DoctorResponse> {
    let doctor = find_doctor(&state, &id).await?;
    Ok(Json(doctor.into()))
}

/// Update doctor
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "doctors",
    request_body = AccountPatch,
    responses(
        (status = 200, description = "Doctor updated", body = MessageResponse),
        (status = 404, description = "Doctor not found"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn update_doctor(
    State(state): State<DoctorsState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Json(patch): Json<AccountPatch>,
) -> ApiResult<MessageResponse> {
    find_doctor(&state, &id).await?;
    state.accounts.update_account(&id, &patch).await?;
    Ok(Json(MessageResponse::new("Doctor updated successfully")))
}

/// Delete doctor
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "doctors",
    responses(
        (status = 200, description = "Doctor deleted", body = MessageResponse),
        (status = 404, description = "Doctor not found")
    )
)]
pub async fn delete_doctor(
    State(state): State<DoctorsState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    find_doctor(&state, &id).await?;
    state.accounts.delete_account(&id).await?;
    Ok(Json(MessageResponse::new("Doctor deleted successfully")))
}

/// Create the doctors admin router
pub fn doctors_router(state: DoctorsState) -> Router {
    Router::new()
        .route("/", get(list_doctors))
        .route(
            "/:id",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
        .with_state(state)
}
