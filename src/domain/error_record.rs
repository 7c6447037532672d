use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit trail entry written when a mutating operation fails.
///
/// Records are never read back by the core; they exist for operators and
/// dead-letter inspection. `raw_message` carries the triggering payload when
/// one is available.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub uuid: Uuid,
    pub card_id: Option<Uuid>,
    pub error_message: String,
    pub raw_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(
        card_id: Option<Uuid>,
        error_message: impl Into<String>,
        raw_message: Option<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            card_id,
            error_message: error_message.into(),
            raw_message,
            created_at: Utc::now(),
        }
    }
}
