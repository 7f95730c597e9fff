use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reminder waiting beyond the 24-hour timer horizon. Persisted, then
/// re-evaluated at the next application start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReminder {
    pub id: Uuid,
    /// Fire time, milliseconds since epoch.
    pub timestamp: i64,
    pub title: String,
    pub body: String,
}

/// Body for POST /reminders.
#[derive(Debug, Deserialize)]
pub struct CreateReminderRequest {
    /// RFC 3339 fire time.
    pub when: chrono::DateTime<chrono::Utc>,
    pub title: String,
    #[serde(default)]
    pub body: String,
}
