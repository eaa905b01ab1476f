//! API Layer
//!
//! REST endpoints for the clinic booking backend: public auth flows and
//! admin doctor management.

pub mod auth;
pub mod common;
pub mod doctors;
pub mod middleware;
pub mod openapi;

pub use common::*;
pub use middleware::{AppState, Authenticated, RequireAdmin};

pub use auth::{auth_router, AuthApiState};
pub use doctors::{doctors_router, DoctorsState};
pub use openapi::ApiDoc;
