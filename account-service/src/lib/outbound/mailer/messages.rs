use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

/// Wire message queued for the mail worker.
///
/// The worker owns rendering and delivery; this core only queues the notice.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetNoticeMessage {
    pub account_id: String,
    pub email: String,
    pub reset_token: String,
    pub issued_at: DateTime<Utc>,
}
