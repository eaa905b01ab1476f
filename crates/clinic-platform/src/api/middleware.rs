//! API Middleware
//!
//! Authentication and role stages for Axum. The token stage yields a
//! verified [`Principal`]; the role stage consults the injected policy
//! before the handler runs, so the trust model is a startup decision and
//! never mixed per-route.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::domain::{Principal, Role};
use crate::error::ClinicError;
use crate::service::{extract_bearer_token, RolePolicy, TokenVerifier};

/// Shared authentication state, injected as a request extension.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub policy: Arc<dyn RolePolicy>,
}

fn app_state(parts: &Parts) -> Result<AppState, Response> {
    parts.extensions.get::<AppState>().cloned().ok_or_else(|| {
        ClinicError::upstream("authentication state not configured").into_response()
    })
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<Principal, Response> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ClinicError::unauthorized("Authorization token is missing").into_response())?;

    let token = extract_bearer_token(header)
        .ok_or_else(|| ClinicError::unauthorized("Authorization token is missing").into_response())?;

    state
        .verifier
        .verify(token)
        .await
        .map_err(|e| e.into_response())
}

/// Extractor for authenticated requests.
pub struct Authenticated(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_state = app_state(parts)?;
        let principal = authenticate(parts, &app_state).await?;
        Ok(Authenticated(principal))
    }
}

/// Extractor for admin-only requests: token stage followed by the role
/// stage against [`Role::Admin`].
pub struct RequireAdmin(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_state = app_state(parts)?;
        let principal = authenticate(parts, &app_state).await?;

        app_state
            .policy
            .authorize(&principal, Role::Admin)
            .await
            .map_err(|e| e.into_response())?;

        Ok(RequireAdmin(principal))
    }
}
