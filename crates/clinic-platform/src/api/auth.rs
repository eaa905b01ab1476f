//! Auth API Endpoints
//!
//! Public authentication flows and the admin-only doctor provisioning
//! entry point:
//! - POST /register - Patient self-registration
//! - POST /login - Password-based login (mints a login token)
//! - POST /google-login - Federated login
//! - GET /me - Current user info
//! - POST /forgot-password, /verify-otp, /reset-password - Password reset
//! - POST /logout - Logout (stateless tokens; client discards)
//! - POST /create-doctor - Admin provisioning of a doctor account

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::domain::{AvailabilitySlot, Profile, Role};
use crate::error::ClinicError;
use crate::api::common::{ApiResult, MessageResponse};
use crate::api::middleware::{Authenticated, RequireAdmin};
use crate::repository::UserStore;
use crate::service::{AccountService, PasswordResetService};

/// Patient registration request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub role: Role,
    pub user_id: String,
}

/// Password login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// One-time login token minted by the identity provider
    pub token: String,
    pub role: Role,
    pub user_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginResponse {
    pub message: String,
    pub role: Role,
    pub user_id: String,
}

/// Current user info response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<AvailabilitySlot>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

/// Doctor provisioning request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub license_number: String,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorResponse {
    pub message: String,
    pub role: Role,
    pub doctor_id: String,
}

/// Auth API state
#[derive(Clone)]
pub struct AuthApiState {
    pub accounts: AccountService,
    pub reset: PasswordResetService,
    pub users: Arc<dyn UserStore>,
}

/// Register a new patient account
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn register(
    State(state): State<AuthApiState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ClinicError> {
    let profile = Profile {
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        address: req.address,
        specialization: None,
        license_number: None,
    };

    let record = state.accounts.create_patient(&req.email, &req.password, profile).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            role: record.role,
            user_id: record.external_id,
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthApiState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let outcome = state.accounts.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        role: outcome.role,
        user_id: outcome.user_id,
    }))
}

/// Login with a provider-verified id token
#[utoipa::path(
    post,
    path = "/google-login",
    tag = "auth",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = GoogleLoginResponse),
        (status = 401, description = "Invalid token")
    )
)]
pub async fn google_login(
    State(state): State<AuthApiState>,
    Json(req): Json<GoogleLoginRequest>,
) -> ApiResult<GoogleLoginResponse> {
    let record = state.accounts.google_login(&req.id_token).await?;

    Ok(Json(GoogleLoginResponse {
        message: "Login successful".to_string(),
        role: record.role,
        user_id: record.external_id,
    }))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user info", body = MeResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    )
)]
pub async fn me(
    State(state): State<AuthApiState>,
    Authenticated(principal): Authenticated,
) -> ApiResult<MeResponse> {
    let record = state
        .users
        .find_by_external_id(&principal.subject_id)
        .await?
        .ok_or_else(|| ClinicError::not_found("User not found"))?;

    Ok(Json(MeResponse {
        user_id: record.external_id,
        email: record.email,
        role: record.role,
        profile: record.profile,
        availability: record.availability,
    }))
}

/// Request a password reset code
#[utoipa::path(
    post,
    path = "/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 404, description = "Email not found")
    )
)]
pub async fn forgot_password(
    State(state): State<AuthApiState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<MessageResponse> {
    state.reset.request_reset(&req.email).await?;
    Ok(Json(MessageResponse::new("OTP sent to email")))
}

/// Verify a password reset code
#[utoipa::path(
    post,
    path = "/verify-otp",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code valid", body = MessageResponse),
        (status = 400, description = "Invalid or expired code")
    )
)]
pub async fn verify_otp(
    State(state): State<AuthApiState>,
    Json(req): Json<VerifyOtpRequest>,
) -> ApiResult<MessageResponse> {
    state.reset.verify_reset(&req.email, &req.otp).await?;
    Ok(Json(MessageResponse::new("OTP verified")))
}

/// Complete a password reset
#[utoipa::path(
    post,
    path = "/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn reset_password(
    State(state): State<AuthApiState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<MessageResponse> {
    state.reset.complete_reset(&req.email, &req.new_password).await?;
    Ok(Json(MessageResponse::new("Password reset successful")))
}

/// Logout. Login tokens are one-time and short-lived; nothing to revoke
/// server-side.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(Authenticated(_principal): Authenticated) -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully"))
}

/// Provision a doctor account (admin only)
#[utoipa::path(
    post,
    path = "/create-doctor",
    tag = "auth",
    request_body = CreateDoctorRequest,
    responses(
        (status = 201, description = "Doctor created", body = CreateDoctorResponse),
        (status = 400, description = "Invalid availability"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn create_doctor(
    State(state): State<AuthApiState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<CreateDoctorResponse>), ClinicError> {
    let profile = Profile {
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        address: req.address,
        specialization: Some(req.specialization),
        license_number: Some(req.license_number),
    };

    let record = state
        .accounts
        .create_doctor(&req.email, &req.password, profile, req.availability)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateDoctorResponse {
            message: "Doctor created successfully".to_string(),
            role: record.role,
            doctor_id: record.external_id,
        }),
    ))
}

/// Create the auth router
pub fn auth_router(state: AuthApiState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/google-login", post(google_login))
        .route("/me", get(me))
        .route("/forgot-password", post(forgot_password))
        .route("/verify-otp", post(verify_otp))
        .route("/reset-password", post(reset_password))
        .route("/logout", post(logout))
        .route("/create-doctor", post(create_doctor))
        .with_state(state)
}
