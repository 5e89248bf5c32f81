use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::tool::Verdict;

/// Emitted after a recalculation changed a persisted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ScoreEvent {
    TrustScoreChanged {
        user_id: String,
        previous: Option<i32>,
        current: i32,
    },
    VerdictChanged {
        tool_id: Uuid,
        previous: Option<Verdict>,
        current: Option<Verdict>,
    },
}
