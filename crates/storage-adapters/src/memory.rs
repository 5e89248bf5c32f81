//! # In-memory store
//!
//! Implements every repository port over a single lock-guarded state, so
//! each multi-step write (vote upsert + recount, bookmark toggle) is atomic
//! the same way a database transaction would make it. Used by the test
//! suites and for running the server without PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use domains::{
    BookmarkState, DomainError, DomainResult, Review, ReviewActivity, ReviewRepository,
    ReviewVote, Role, ScoreBreakdown, ScoredReview, Tool, ToolRepository, ToolVerdict, TrustScore,
    User, UserRepository, VoteTally, VoteType,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    tools: HashMap<Uuid, Tool>,
    reviews: HashMap<Uuid, Review>,
    votes: HashMap<(Uuid, String), ReviewVote>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger rows for a review, grouped as (helpful, total).
    pub async fn ledger_counts(&self, review_id: Uuid) -> (i64, i64) {
        let state = self.state.read().await;
        recount(&state.votes, review_id)
    }

    /// Ledger rows held for one (review, user) pair. At most one by construction.
    pub async fn vote_rows(&self, review_id: Uuid, user_id: &str) -> usize {
        let state = self.state.read().await;
        state
            .votes
            .values()
            .filter(|v| v.review_id == review_id && v.user_id == user_id)
            .count()
    }

    /// Test hook: overwrite a user's persisted trust score directly.
    pub async fn set_trust_score(&self, user_id: &str, score: i32) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| DomainError::not_found("User", user_id))?;
        user.trust_score = score;
        user.trust_score_calculated_at = Some(Utc::now());
        Ok(())
    }
}

fn recount(votes: &HashMap<(Uuid, String), ReviewVote>, review_id: Uuid) -> (i64, i64) {
    votes
        .values()
        .filter(|v| v.review_id == review_id)
        .fold((0, 0), |(helpful, total), v| {
            let h = i64::from(v.vote_type == VoteType::Helpful);
            (helpful + h, total + 1)
        })
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> DomainResult<()> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user.id) {
            Some(existing) => {
                existing.role = user.role;
                existing.is_verified_tester = user.is_verified_tester;
            }
            None => {
                state.users.insert(user.id.clone(), user.clone());
            }
        }
        Ok(())
    }

    async fn save_trust_score(&self, score: &TrustScore) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&score.user_id)
            .ok_or_else(|| DomainError::not_found("User", &score.user_id))?;
        user.trust_score = score.score;
        user.trust_score_calculated_at = Some(score.calculated_at);
        user.helpful_votes_received = score.helpful_votes_received;
        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create_review(&self, review: &Review) -> DomainResult<()> {
        let mut state = self.state.write().await;
        if !state.tools.contains_key(&review.tool_id) {
            return Err(DomainError::not_found("Tool", review.tool_id));
        }
        if !state.users.contains_key(&review.user_id) {
            return Err(DomainError::invalid(format!("unknown author `{}`", review.user_id)));
        }
        state.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn find_review(&self, id: Uuid) -> DomainResult<Option<Review>> {
        Ok(self.state.read().await.reviews.get(&id).cloned())
    }

    async fn list_reviews_for_tool(&self, tool_id: Uuid) -> DomainResult<Vec<Review>> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|r| r.tool_id == tool_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn scored_reviews_for_tool(&self, tool_id: Uuid) -> DomainResult<Vec<ScoredReview>> {
        let state = self.state.read().await;
        let mut scored: Vec<ScoredReview> = state
            .reviews
            .values()
            .filter(|r| r.tool_id == tool_id)
            .map(|r| {
                let (trust, role) = state
                    .users
                    .get(&r.user_id)
                    .map(|u| (u.trust_score, u.role))
                    .unwrap_or((0, Role::User));
                ScoredReview {
                    review_id: r.id,
                    kind: r.kind,
                    overall_score: r.overall_score,
                    value_score: r.value_score,
                    usage_score: r.usage_score,
                    integration_score: r.integration_score,
                    reviewer_trust_score: trust,
                    reviewer_role: role,
                }
            })
            .collect();
        // Same order as the postgres query so aggregation is reproducible.
        scored.sort_by_key(|r| r.review_id);
        Ok(scored)
    }

    async fn review_activity(&self, user_id: &str) -> DomainResult<ReviewActivity> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .fold(ReviewActivity::default(), |acc, r| ReviewActivity {
                review_count: acc.review_count + 1,
                helpful_votes: acc.helpful_votes + r.helpful_votes,
                total_votes: acc.total_votes + r.total_votes,
            }))
    }

    async fn cast_vote(
        &self,
        review_id: Uuid,
        user_id: &str,
        vote_type: VoteType,
    ) -> DomainResult<VoteTally> {
        let mut state = self.state.write().await;
        if !state.reviews.contains_key(&review_id) {
            return Err(DomainError::not_found("Review", review_id));
        }
        if !state.users.contains_key(user_id) {
            return Err(DomainError::invalid(format!("unknown voter `{user_id}`")));
        }

        let now = Utc::now();
        state
            .votes
            .entry((review_id, user_id.to_string()))
            .and_modify(|v| {
                v.vote_type = vote_type;
                v.updated_at = now;
            })
            .or_insert_with(|| ReviewVote {
                review_id,
                user_id: user_id.to_string(),
                vote_type,
                created_at: now,
                updated_at: now,
            });

        let (helpful_votes, total_votes) = recount(&state.votes, review_id);
        let review = state
            .reviews
            .get_mut(&review_id)
            .ok_or_else(|| DomainError::not_found("Review", review_id))?;
        review.helpful_votes = helpful_votes;
        review.total_votes = total_votes;

        Ok(VoteTally {
            review_id,
            vote_type,
            helpful_votes,
            total_votes,
        })
    }

    async fn find_vote(&self, review_id: Uuid, user_id: &str) -> DomainResult<Option<ReviewVote>> {
        let state = self.state.read().await;
        Ok(state.votes.get(&(review_id, user_id.to_string())).cloned())
    }

    async fn toggle_bookmark(&self, review_id: Uuid, user_id: &str) -> DomainResult<BookmarkState> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(user_id) {
            return Err(DomainError::invalid(format!("unknown user `{user_id}`")));
        }
        let review = state
            .reviews
            .get_mut(&review_id)
            .ok_or_else(|| DomainError::not_found("Review", review_id))?;

        let bookmarked = match review.bookmarked_by.iter().position(|u| u == user_id) {
            Some(idx) => {
                review.bookmarked_by.remove(idx);
                false
            }
            None => {
                review.bookmarked_by.push(user_id.to_string());
                true
            }
        };
        Ok(BookmarkState {
            review_id,
            bookmarked,
        })
    }
}

#[async_trait]
impl ToolRepository for MemoryStore {
    async fn create_tool(&self, tool: &Tool) -> DomainResult<()> {
        let mut state = self.state.write().await;
        if state.tools.values().any(|t| t.slug == tool.slug) {
            return Err(DomainError::invalid(format!("slug `{}` already taken", tool.slug)));
        }
        state.tools.insert(tool.id, tool.clone());
        Ok(())
    }

    async fn find_tool(&self, id: Uuid) -> DomainResult<Option<Tool>> {
        Ok(self.state.read().await.tools.get(&id).cloned())
    }

    async fn list_tools(&self) -> DomainResult<Vec<Tool>> {
        let state = self.state.read().await;
        let mut tools: Vec<Tool> = state.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tools)
    }

    async fn save_verdict(&self, verdict: &ToolVerdict) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let tool = state
            .tools
            .get_mut(&verdict.tool_id)
            .ok_or_else(|| DomainError::not_found("Tool", verdict.tool_id))?;
        tool.verdict = verdict.verdict;
        tool.verdict_confidence = Some(verdict.confidence);
        tool.verdict_review_count = verdict.review_count;
        tool.scores = verdict.scores;
        tool.verdict_calculated_at = Some(verdict.calculated_at);
        Ok(())
    }

    async fn save_scores(&self, tool_id: Uuid, scores: &ScoreBreakdown) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let tool = state
            .tools
            .get_mut(&tool_id)
            .ok_or_else(|| DomainError::not_found("Tool", tool_id))?;
        tool.scores = *scores;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{NewReview, ReviewKind};

    async fn seeded() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        store.upsert_user(&User::new("author", Role::User)).await.unwrap();
        store.upsert_user(&User::new("voter", Role::User)).await.unwrap();
        let tool = Tool::new("Slack", "slack");
        store.create_tool(&tool).await.unwrap();
        let review = NewReview {
            tool_id: tool.id,
            user_id: "author".into(),
            overall_score: Some(6.0),
            value_score: None,
            usage_score: None,
            integration_score: None,
            kind: ReviewKind::Community,
            content: None,
        }
        .into_review();
        store.create_review(&review).await.unwrap();
        (store, review.id)
    }

    #[tokio::test]
    async fn revote_overwrites_instead_of_adding() {
        let (store, review_id) = seeded().await;
        store.cast_vote(review_id, "voter", VoteType::Helpful).await.unwrap();
        let tally = store
            .cast_vote(review_id, "voter", VoteType::NotHelpful)
            .await
            .unwrap();

        assert_eq!(tally.helpful_votes, 0);
        assert_eq!(tally.total_votes, 1);
        assert_eq!(store.vote_rows(review_id, "voter").await, 1);
        let vote = store.find_vote(review_id, "voter").await.unwrap().unwrap();
        assert_eq!(vote.vote_type, VoteType::NotHelpful);
    }

    #[tokio::test]
    async fn unknown_voter_writes_nothing() {
        let (store, review_id) = seeded().await;
        let err = store
            .cast_vote(review_id, "nobody", VoteType::Helpful)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert_eq!(store.ledger_counts(review_id).await, (0, 0));
    }

    #[tokio::test]
    async fn upsert_keeps_trust_fields() {
        let store = MemoryStore::new();
        store.upsert_user(&User::new("u1", Role::User)).await.unwrap();
        store.set_trust_score("u1", 77).await.unwrap();

        let mut promoted = User::new("u1", Role::Admin);
        promoted.is_verified_tester = true;
        store.upsert_user(&promoted).await.unwrap();

        let user = store.find_user("u1").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(user.is_verified_tester);
        assert_eq!(user.trust_score, 77);
    }

    #[tokio::test]
    async fn scored_reviews_come_back_in_review_id_order() {
        let store = MemoryStore::new();
        let tool = Tool::new("Figma", "figma");
        store.create_tool(&tool).await.unwrap();
        for i in 0..24 {
            let user_id = format!("reviewer-{i}");
            store.upsert_user(&User::new(&user_id, Role::User)).await.unwrap();
            store.set_trust_score(&user_id, i * 4).await.unwrap();
            let review = NewReview {
                tool_id: tool.id,
                user_id,
                overall_score: Some(1.0 + f64::from(i) * 0.37),
                value_score: None,
                usage_score: None,
                integration_score: None,
                kind: ReviewKind::Community,
                content: None,
            }
            .into_review();
            store.create_review(&review).await.unwrap();
        }

        let first = store.scored_reviews_for_tool(tool.id).await.unwrap();
        assert_eq!(first.len(), 24);
        assert!(first.windows(2).all(|w| w[0].review_id < w[1].review_id));
        assert_eq!(store.scored_reviews_for_tool(tool.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn bookmark_toggles() {
        let (store, review_id) = seeded().await;
        assert!(store.toggle_bookmark(review_id, "voter").await.unwrap().bookmarked);
        assert!(!store.toggle_bookmark(review_id, "voter").await.unwrap().bookmarked);
        let review = store.find_review(review_id).await.unwrap().unwrap();
        assert!(review.bookmarked_by.is_empty());
    }
}
