//! # Trust Score Engine
//!
//! Derives a bounded 0–100 reputation score from a user's review activity.
//!
//! The score is the clamped, rounded sum of five contributions:
//!
//! 1. a fixed baseline,
//! 2. review volume on a logarithmic curve that saturates,
//! 3. helpful-vote reception, signed around a neutral 50% ratio and damped
//!    until enough votes exist (no votes contributes nothing),
//! 4. a flat verified-tester bonus,
//! 5. a flat role bonus.
//!
//! `calculate_trust_score` recomputes and overwrites; `get_trust_score` only
//! reads what was last persisted.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    DomainError, DomainResult, ReviewActivity, ReviewRepository, ScoreEvent, ScoreEvents,
    TrustBreakdown, TrustRules, TrustScore, TrustScoreReading, User, UserRepository,
    TRUST_SCORE_MAX, TRUST_SCORE_MIN,
};
use tracing::{debug, info, instrument};

/// Contribution of each signal for `user` given their `activity`.
pub fn trust_breakdown(
    rules: &TrustRules,
    user: &User,
    activity: &ReviewActivity,
) -> TrustBreakdown {
    TrustBreakdown {
        baseline: rules.baseline,
        volume: volume_points(rules, activity.review_count),
        reception: reception_points(rules, activity.helpful_votes, activity.total_votes),
        verification: if user.is_verified_tester {
            rules.verified_tester_bonus
        } else {
            0.0
        },
        role: rules.role_bonus(user.role),
    }
}

/// Rounds the raw total and clamps it into the persisted range.
pub fn clamp_score(raw: f64) -> i32 {
    if raw.is_nan() {
        return TRUST_SCORE_MIN;
    }
    (raw.round() as i32).clamp(TRUST_SCORE_MIN, TRUST_SCORE_MAX)
}

fn volume_points(rules: &TrustRules, review_count: i64) -> f64 {
    if review_count <= 0 {
        return 0.0;
    }
    let saturation = f64::from(rules.volume_saturation_reviews);
    let curve = (1.0 + review_count as f64).ln() / (1.0 + saturation).ln();
    (rules.volume_max_points * curve).min(rules.volume_max_points)
}

fn reception_points(rules: &TrustRules, helpful: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let ratio = (helpful.max(0) as f64 / total as f64).clamp(0.0, 1.0);
    let strength = (total as f64 / f64::from(rules.reception_saturation_votes)).min(1.0);
    rules.reception_max_points * (2.0 * ratio - 1.0) * strength
}

pub struct TrustScoreService {
    users: Arc<dyn UserRepository>,
    reviews: Arc<dyn ReviewRepository>,
    events: Arc<dyn ScoreEvents>,
    rules: TrustRules,
}

impl TrustScoreService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        reviews: Arc<dyn ReviewRepository>,
        events: Arc<dyn ScoreEvents>,
        rules: TrustRules,
    ) -> Self {
        Self {
            users,
            reviews,
            events,
            rules,
        }
    }

    /// Recomputes the user's score from current review activity and
    /// overwrites the persisted value.
    #[instrument(skip(self))]
    pub async fn calculate_trust_score(&self, user_id: &str) -> DomainResult<TrustScore> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))?;

        let activity = self.reviews.review_activity(user_id).await?;
        let breakdown = trust_breakdown(&self.rules, &user, &activity);
        let score = clamp_score(breakdown.raw_total());
        debug!(?activity, ?breakdown, score, "trust score computed");

        let result = TrustScore {
            user_id: user.id.clone(),
            score,
            review_count: activity.review_count,
            helpful_votes_received: activity.helpful_votes,
            total_votes_received: activity.total_votes,
            breakdown,
            calculated_at: Utc::now(),
        };
        self.users.save_trust_score(&result).await?;

        let previous = user.trust_score_calculated_at.map(|_| user.trust_score);
        if previous != Some(score) {
            info!(previous = ?previous, current = score, "trust score changed");
            self.events.publish(ScoreEvent::TrustScoreChanged {
                user_id: user.id,
                previous,
                current: score,
            });
        }

        Ok(result)
    }

    /// Last persisted score. Never recomputes.
    #[instrument(skip(self))]
    pub async fn get_trust_score(&self, user_id: &str) -> DomainResult<TrustScoreReading> {
        self.users
            .find_user(user_id)
            .await?
            .map(|user| user.trust_reading())
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }
}
