//! Task snapshot used by the task event relay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub status: String,
    /// Assigned users, in assignment order
    pub assignees: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}
