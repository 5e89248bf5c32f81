//! # Ports
//!
//! Storage and notification contracts. Adapters in `storage-adapters`
//! implement these; services depend only on the traits.
//!
//! Each repository writes a disjoint set of columns: the review ledger owns
//! reviews and votes, the user repository's trust write owns the user trust
//! fields, the tool repository's verdict/score writes own the tool aggregates.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::DomainResult;
use crate::models::{
    BookmarkState, Review, ReviewActivity, ReviewVote, ScoreBreakdown, ScoreEvent, ScoredReview,
    Tool, ToolVerdict, TrustScore, User, VoteTally, VoteType,
};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: &str) -> DomainResult<Option<User>>;

    /// Inserts the user, or refreshes role/verification if it already exists.
    /// Trust fields of an existing row are left untouched.
    async fn upsert_user(&self, user: &User) -> DomainResult<()>;

    /// Overwrites `trust_score`, `trust_score_calculated_at` and
    /// `helpful_votes_received` in place.
    async fn save_trust_score(&self, score: &TrustScore) -> DomainResult<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create_review(&self, review: &Review) -> DomainResult<()>;
    async fn find_review(&self, id: Uuid) -> DomainResult<Option<Review>>;

    /// Newest first.
    async fn list_reviews_for_tool(&self, tool_id: Uuid) -> DomainResult<Vec<Review>>;

    /// All reviews of a tool joined with each author's persisted trust score
    /// and role, in one round-trip.
    async fn scored_reviews_for_tool(&self, tool_id: Uuid) -> DomainResult<Vec<ScoredReview>>;

    /// Review count and summed vote counters over everything `user_id` authored.
    async fn review_activity(&self, user_id: &str) -> DomainResult<ReviewActivity>;

    /// Atomically upserts the (review, user) vote, recounts the ledger for the
    /// review and overwrites its counters with the recount.
    ///
    /// Fails with `NotFound` for an unknown review and `InvalidInput` for an
    /// unknown voter; nothing is written in either case.
    async fn cast_vote(
        &self,
        review_id: Uuid,
        user_id: &str,
        vote_type: VoteType,
    ) -> DomainResult<VoteTally>;

    async fn find_vote(&self, review_id: Uuid, user_id: &str) -> DomainResult<Option<ReviewVote>>;

    /// Atomically adds or removes `user_id` from the review's bookmarks.
    async fn toggle_bookmark(&self, review_id: Uuid, user_id: &str) -> DomainResult<BookmarkState>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ToolRepository: Send + Sync {
    async fn create_tool(&self, tool: &Tool) -> DomainResult<()>;
    async fn find_tool(&self, id: Uuid) -> DomainResult<Option<Tool>>;

    /// Every tool with its persisted verdict fields, ordered by name.
    async fn list_tools(&self) -> DomainResult<Vec<Tool>>;

    /// Overwrites verdict, confidence, review count, aggregate scores and
    /// calculation timestamp.
    async fn save_verdict(&self, verdict: &ToolVerdict) -> DomainResult<()>;

    /// Overwrites only the four aggregate score columns.
    async fn save_scores(&self, tool_id: Uuid, scores: &ScoreBreakdown) -> DomainResult<()>;
}

/// Fire-and-forget sink for score change notifications.
/// Delivery failures are the sink's concern; publishing never fails.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ScoreEvents: Send + Sync {
    fn publish(&self, event: ScoreEvent);
}
