use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;
use crate::models::trust::TrustScoreReading;

/// Account role as issued by the identity provider / admin tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    VerifiedTester,
    Vendor,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::VerifiedTester => "verified_tester",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "verified_tester" => Ok(Role::VerifiedTester),
            "vendor" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(DomainError::invalid(format!("unknown role `{other}`"))),
        }
    }
}

/// Identity + reputation subject.
///
/// `id` is the opaque subject string handed to us by the identity provider.
/// The trust fields are written only by the trust score engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub role: Role,
    pub is_verified_tester: bool,
    /// Last persisted score, 0 until the first calculation.
    pub trust_score: i32,
    pub trust_score_calculated_at: Option<DateTime<Utc>>,
    pub helpful_votes_received: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A freshly authenticated user with no reputation history.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            is_verified_tester: false,
            trust_score: 0,
            trust_score_calculated_at: None,
            helpful_votes_received: 0,
            created_at: Utc::now(),
        }
    }

    pub fn trust_reading(&self) -> TrustScoreReading {
        match self.trust_score_calculated_at {
            None => TrustScoreReading::NotCalculated {
                user_id: self.id.clone(),
            },
            Some(calculated_at) => TrustScoreReading::Calculated {
                user_id: self.id.clone(),
                score: self.trust_score,
                helpful_votes_received: self.helpful_votes_received,
                calculated_at,
            },
        }
    }
}
