//! Service Layer
//!
//! Business logic: token verification, role authorization, the account
//! lifecycle (dual-write creation with compensation), password reset, and
//! the outbound mail collaborator.

pub mod account;
pub mod auth;
pub mod authorization;
pub mod mail;
pub mod password;
pub mod password_reset;

pub use account::{AccountPatch, AccountService, LoginOutcome};
pub use auth::{extract_bearer_token, TokenVerifier};
pub use authorization::{RederivePolicy, RolePolicy, TrustClaimPolicy};
pub use mail::{LogMailSender, MailSender};
pub use password::PasswordService;
pub use password_reset::{PasswordResetService, OTP_VALIDITY_SECS};
