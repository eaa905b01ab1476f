//! Clinic Booking Platform
//!
//! Core platform providing:
//! - Local user records (patients, doctors, admins) backed by MongoDB
//! - Integration with an external identity provider (token verification,
//!   account lifecycle, login token minting)
//! - Role-based authorization with a pluggable policy
//! - Dual-write account creation with compensating rollback
//! - Password reset with one-time codes

pub mod domain;
pub mod identity;
pub mod repository;
pub mod service;
pub mod api;
pub mod error;

pub use domain::*;
pub use error::ClinicError;
