//! OpenAPI Documentation

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clinic Booking API",
        description = "Authentication, account lifecycle, and doctor administration"
    ),
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::google_login,
        crate::api::auth::me,
        crate::api::auth::forgot_password,
        crate::api::auth::verify_otp,
        crate::api::auth::reset_password,
        crate::api::auth::logout,
        crate::api::auth::create_doctor,
        crate::api::doctors::list_doctors,
        crate::api::doctors::get_doctor,
        crate::api::doctors::update_doctor,
        crate::api::doctors::delete_doctor,
    ),
    components(schemas(
        crate::domain::Role,
        crate::domain::Profile,
        crate::domain::AvailabilitySlot,
        crate::repository::ProfilePatch,
        crate::service::account::AccountPatch,
        crate::api::common::ApiError,
        crate::api::common::MessageResponse,
        crate::api::auth::RegisterRequest,
        crate::api::auth::RegisterResponse,
        crate::api::auth::LoginRequest,
        crate::api::auth::LoginResponse,
        crate::api::auth::GoogleLoginRequest,
        crate::api::auth::GoogleLoginResponse,
        crate::api::auth::MeResponse,
        crate::api::auth::ForgotPasswordRequest,
        crate::api::auth::VerifyOtpRequest,
        crate::api::auth::ResetPasswordRequest,
        crate::api::auth::CreateDoctorRequest,
        crate::api::auth::CreateDoctorResponse,
        crate::api::doctors::DoctorResponse,
    )),
    tags(
        (name = "auth", description = "Authentication and account flows"),
        (name = "doctors", description = "Doctor administration")
    )
)]
pub struct ApiDoc;
