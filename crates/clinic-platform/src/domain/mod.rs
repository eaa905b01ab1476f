//! Domain Models
//!
//! Core domain entities for the clinic booking platform.
//! User records are keyed by the stable external identity id so that the
//! local store and the identity provider always agree on the primary key.

pub mod principal;
pub mod user;

pub use principal::*;
pub use user::*;
