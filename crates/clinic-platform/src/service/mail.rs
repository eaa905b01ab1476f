//! Mail Collaborator
//!
//! Outbound delivery of one-time codes. The platform treats delivery as
//! best-effort: a failed send is logged by the caller, never surfaced as a
//! request failure.

use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait MailSender: Send + Sync {
    /// Deliver a one-time code. Returns `false` on delivery failure.
    async fn send_otp(&self, email: &str, code: &str) -> bool;
}

/// Development sender: logs the code instead of delivering it.
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send_otp(&self, email: &str, code: &str) -> bool {
        info!(%email, %code, "one-time code issued (log delivery)");
        true
    }
}
