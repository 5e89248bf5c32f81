use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::DomainError;
use crate::models::user::Role;

/// Lowest and highest value any review sub-score may take.
pub const MIN_REVIEW_SCORE: f64 = 0.0;
pub const MAX_REVIEW_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    Community,
    Expert,
}

impl ReviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::Community => "community",
            ReviewKind::Expert => "expert",
        }
    }
}

impl FromStr for ReviewKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "community" => Ok(ReviewKind::Community),
            "expert" => Ok(ReviewKind::Expert),
            other => Err(DomainError::invalid(format!("unknown review type `{other}`"))),
        }
    }
}

/// A single helpful / not-helpful judgement on a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Helpful,
    NotHelpful,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Helpful => "helpful",
            VoteType::NotHelpful => "not_helpful",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = DomainError;

    /// Only the two exact literals are accepted; no case folding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "helpful" => Ok(VoteType::Helpful),
            "not_helpful" => Ok(VoteType::NotHelpful),
            other => Err(DomainError::invalid(format!(
                "voteType must be `helpful` or `not_helpful`, got `{other}`"
            ))),
        }
    }
}

/// A user's evaluation of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub tool_id: Uuid,
    pub user_id: String,
    pub overall_score: Option<f64>,
    pub value_score: Option<f64>,
    pub usage_score: Option<f64>,
    pub integration_score: Option<f64>,
    #[serde(rename = "type")]
    pub kind: ReviewKind,
    pub content: Option<String>,
    /// Denormalized from the vote ledger; rewritten by recount on every vote.
    pub helpful_votes: i64,
    pub total_votes: i64,
    pub bookmarked_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Submission payload for a new review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub tool_id: Uuid,
    pub user_id: String,
    pub overall_score: Option<f64>,
    pub value_score: Option<f64>,
    pub usage_score: Option<f64>,
    pub integration_score: Option<f64>,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: ReviewKind,
    pub content: Option<String>,
}

fn default_kind() -> ReviewKind {
    ReviewKind::Community
}

impl NewReview {
    /// Rejects non-finite or out-of-range scores before anything is written.
    pub fn validate(&self) -> Result<(), DomainError> {
        let scores = [
            ("overallScore", self.overall_score),
            ("valueScore", self.value_score),
            ("usageScore", self.usage_score),
            ("integrationScore", self.integration_score),
        ];
        for (field, score) in scores {
            if let Some(s) = score {
                if !s.is_finite() || !(MIN_REVIEW_SCORE..=MAX_REVIEW_SCORE).contains(&s) {
                    return Err(DomainError::invalid(format!(
                        "{field} must be between {MIN_REVIEW_SCORE} and {MAX_REVIEW_SCORE}"
                    )));
                }
            }
        }
        if self.user_id.trim().is_empty() {
            return Err(DomainError::invalid("userId is required"));
        }
        Ok(())
    }

    pub fn into_review(self) -> Review {
        Review {
            id: Uuid::new_v4(),
            tool_id: self.tool_id,
            user_id: self.user_id,
            overall_score: self.overall_score,
            value_score: self.value_score,
            usage_score: self.usage_score,
            integration_score: self.integration_score,
            kind: self.kind,
            content: self.content,
            helpful_votes: 0,
            total_votes: 0,
            bookmarked_by: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// One row of the vote ledger, unique per (review_id, user_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVote {
    pub review_id: Uuid,
    pub user_id: String,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counter state of a review right after a vote was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub review_id: Uuid,
    pub vote_type: VoteType,
    pub helpful_votes: i64,
    pub total_votes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkState {
    pub review_id: Uuid,
    pub bookmarked: bool,
}

/// A review joined with its author's persisted trust score and role,
/// which is everything the verdict weighting needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredReview {
    pub review_id: Uuid,
    pub kind: ReviewKind,
    pub overall_score: Option<f64>,
    pub value_score: Option<f64>,
    pub usage_score: Option<f64>,
    pub integration_score: Option<f64>,
    pub reviewer_trust_score: i32,
    pub reviewer_role: Role,
}
