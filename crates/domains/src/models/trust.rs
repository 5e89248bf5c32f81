use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw signals the trust formula consumes, gathered in one aggregate query
/// over the user's reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewActivity {
    pub review_count: i64,
    pub helpful_votes: i64,
    pub total_votes: i64,
}

/// Per-signal contribution, kept for auditability of a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustBreakdown {
    pub baseline: f64,
    pub volume: f64,
    pub reception: f64,
    pub verification: f64,
    pub role: f64,
}

impl TrustBreakdown {
    pub fn raw_total(&self) -> f64 {
        self.baseline + self.volume + self.reception + self.verification + self.role
    }
}

/// Result of a trust recalculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustScore {
    pub user_id: String,
    /// Clamped into [0, 100].
    pub score: i32,
    pub review_count: i64,
    pub helpful_votes_received: i64,
    pub total_votes_received: i64,
    pub breakdown: TrustBreakdown,
    pub calculated_at: DateTime<Utc>,
}

/// Read-path view of the persisted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum TrustScoreReading {
    NotCalculated {
        user_id: String,
    },
    Calculated {
        user_id: String,
        score: i32,
        helpful_votes_received: i64,
        calculated_at: DateTime<Utc>,
    },
}
