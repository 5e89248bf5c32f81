use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::DomainError;

/// Consensus recommendation for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Keep,
    Try,
    Stop,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Keep => "keep",
            Verdict::Try => "try",
            Verdict::Stop => "stop",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(Verdict::Keep),
            "try" => Ok(Verdict::Try),
            "stop" => Ok(Verdict::Stop),
            other => Err(DomainError::invalid(format!("unknown verdict `{other}`"))),
        }
    }
}

/// The four review sub-scores, aggregated over a tool's reviews.
/// A field is `None` when no review carried that score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub overall: Option<f64>,
    pub value: Option<f64>,
    pub usage: Option<f64>,
    pub integration: Option<f64>,
}

/// The entity being reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub scores: ScoreBreakdown,
    pub verdict: Option<Verdict>,
    pub verdict_confidence: Option<f64>,
    pub verdict_review_count: i64,
    pub verdict_calculated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Tool {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            scores: ScoreBreakdown::default(),
            verdict: None,
            verdict_confidence: None,
            verdict_review_count: 0,
            verdict_calculated_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn verdict_reading(&self) -> VerdictReading {
        match self.verdict_calculated_at {
            None => VerdictReading::NotCalculated { tool_id: self.id },
            Some(calculated_at) => VerdictReading::Calculated(ToolVerdict {
                tool_id: self.id,
                verdict: self.verdict,
                confidence: self.verdict_confidence.unwrap_or(0.0),
                review_count: self.verdict_review_count,
                scores: self.scores,
                calculated_at,
            }),
        }
    }

    pub fn summary(&self) -> ToolVerdictSummary {
        ToolVerdictSummary {
            tool_id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            verdict: self.verdict,
            confidence: self.verdict_confidence,
            review_count: self.verdict_review_count,
            scores: self.scores,
            calculated_at: self.verdict_calculated_at,
        }
    }
}

/// Result of a verdict recalculation. `verdict` is `None` when no review
/// carried an overall score (insufficient data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolVerdict {
    pub tool_id: Uuid,
    pub verdict: Option<Verdict>,
    pub confidence: f64,
    pub review_count: i64,
    pub scores: ScoreBreakdown,
    pub calculated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum VerdictReading {
    NotCalculated { tool_id: Uuid },
    Calculated(ToolVerdict),
}

/// Listing/compare row for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolVerdictSummary {
    pub tool_id: Uuid,
    pub name: String,
    pub slug: String,
    pub verdict: Option<Verdict>,
    pub confidence: Option<f64>,
    pub review_count: i64,
    pub scores: ScoreBreakdown,
    pub calculated_at: Option<DateTime<Utc>>,
}
