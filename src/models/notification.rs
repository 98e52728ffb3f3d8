use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::StaffRole;

/// A fire-and-forget message to a role's task queue or a specific account.
/// Notifications are advisory; no core invariant depends on their delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub bill_number: Option<String>,
    pub recipient_role: Option<StaffRole>,
    pub recipient_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether this notification targets the given account.
    pub fn targets(&self, account_id: &str, role: StaffRole) -> bool {
        self.recipient_id.as_deref() == Some(account_id)
            || self.recipient_role == Some(role)
    }
}
