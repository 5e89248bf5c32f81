//! # Review Ledger
//!
//! Review submission and the one-vote-per-user helpful ledger. Input is
//! validated here, before the repository opens a transaction; the
//! upsert-recount-overwrite sequence itself belongs to the repository.

use std::sync::Arc;

use domains::{
    BookmarkState, DomainError, DomainResult, NewReview, Review, ReviewRepository, ToolRepository,
    UserRepository, VoteTally, VoteType,
};
use tracing::{info, instrument};
use uuid::Uuid;

pub struct ReviewLedgerService {
    reviews: Arc<dyn ReviewRepository>,
    users: Arc<dyn UserRepository>,
    tools: Arc<dyn ToolRepository>,
}

impl ReviewLedgerService {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        users: Arc<dyn UserRepository>,
        tools: Arc<dyn ToolRepository>,
    ) -> Self {
        Self {
            reviews,
            users,
            tools,
        }
    }

    /// Records `user_id`'s vote on a review, replacing any earlier vote, and
    /// returns the review's counters as recounted from the ledger.
    #[instrument(skip(self))]
    pub async fn cast_vote(
        &self,
        review_id: Uuid,
        user_id: &str,
        vote_type: &str,
    ) -> DomainResult<VoteTally> {
        let vote_type: VoteType = vote_type.parse()?;
        if user_id.trim().is_empty() {
            return Err(DomainError::invalid("userId is required"));
        }

        let review = self
            .reviews
            .find_review(review_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Review", review_id))?;
        if review.user_id == user_id {
            return Err(DomainError::invalid("users cannot vote on their own review"));
        }

        let tally = self.reviews.cast_vote(review_id, user_id, vote_type).await?;
        info!(
            helpful = tally.helpful_votes,
            total = tally.total_votes,
            "vote recorded"
        );
        Ok(tally)
    }

    #[instrument(
        skip(self, submission),
        fields(tool_id = %submission.tool_id, user_id = %submission.user_id)
    )]
    pub async fn submit_review(&self, submission: NewReview) -> DomainResult<Review> {
        submission.validate()?;

        if self.tools.find_tool(submission.tool_id).await?.is_none() {
            return Err(DomainError::not_found("Tool", submission.tool_id));
        }
        if self.users.find_user(&submission.user_id).await?.is_none() {
            return Err(DomainError::invalid(format!(
                "unknown author `{}`",
                submission.user_id
            )));
        }

        let review = submission.into_review();
        self.reviews.create_review(&review).await?;
        info!(review_id = %review.id, "review submitted");
        Ok(review)
    }

    #[instrument(skip(self))]
    pub async fn list_reviews(&self, tool_id: Uuid) -> DomainResult<Vec<Review>> {
        if self.tools.find_tool(tool_id).await?.is_none() {
            return Err(DomainError::not_found("Tool", tool_id));
        }
        self.reviews.list_reviews_for_tool(tool_id).await
    }

    #[instrument(skip(self))]
    pub async fn toggle_bookmark(
        &self,
        review_id: Uuid,
        user_id: &str,
    ) -> DomainResult<BookmarkState> {
        if user_id.trim().is_empty() {
            return Err(DomainError::invalid("userId is required"));
        }
        self.reviews.toggle_bookmark(review_id, user_id).await
    }
}
