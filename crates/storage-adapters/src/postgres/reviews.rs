use async_trait::async_trait;
use domains::{
    BookmarkState, DomainError, DomainResult, Review, ReviewActivity, ReviewKind,
    ReviewRepository, ReviewVote, Role, ScoredReview, VoteTally, VoteType,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{db_err, PgStore};

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.tool_id, r.user_id, r.overall_score, r.value_score, r.usage_score,
           r.integration_score, r.review_type, r.content, r.helpful_votes, r.total_votes,
           r.created_at,
           ARRAY(
               SELECT b.user_id FROM review_bookmarks b
               WHERE b.review_id = r.id
               ORDER BY b.created_at
           ) AS bookmarked_by
    FROM reviews r
"#;

fn map_review(row: &PgRow) -> DomainResult<Review> {
    Ok(Review {
        id: row.try_get("id").map_err(db_err)?,
        tool_id: row.try_get("tool_id").map_err(db_err)?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        overall_score: row.try_get("overall_score").map_err(db_err)?,
        value_score: row.try_get("value_score").map_err(db_err)?,
        usage_score: row.try_get("usage_score").map_err(db_err)?,
        integration_score: row.try_get("integration_score").map_err(db_err)?,
        kind: row
            .try_get::<String, _>("review_type")
            .map_err(db_err)?
            .parse::<ReviewKind>()?,
        content: row.try_get("content").map_err(db_err)?,
        helpful_votes: row.try_get("helpful_votes").map_err(db_err)?,
        total_votes: row.try_get("total_votes").map_err(db_err)?,
        bookmarked_by: row.try_get("bookmarked_by").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn map_scored(row: &PgRow) -> DomainResult<ScoredReview> {
    Ok(ScoredReview {
        review_id: row.try_get("id").map_err(db_err)?,
        kind: row
            .try_get::<String, _>("review_type")
            .map_err(db_err)?
            .parse::<ReviewKind>()?,
        overall_score: row.try_get("overall_score").map_err(db_err)?,
        value_score: row.try_get("value_score").map_err(db_err)?,
        usage_score: row.try_get("usage_score").map_err(db_err)?,
        integration_score: row.try_get("integration_score").map_err(db_err)?,
        reviewer_trust_score: row.try_get("trust_score").map_err(db_err)?,
        reviewer_role: row.try_get::<String, _>("role").map_err(db_err)?.parse::<Role>()?,
    })
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn create_review(&self, review: &Review) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (
                id, tool_id, user_id, overall_score, value_score, usage_score,
                integration_score, review_type, content, helpful_votes, total_votes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 0, $10)
            "#,
        )
        .bind(review.id)
        .bind(review.tool_id)
        .bind(&review.user_id)
        .bind(review.overall_score)
        .bind(review.value_score)
        .bind(review.usage_score)
        .bind(review.integration_score)
        .bind(review.kind.as_str())
        .bind(&review.content)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_review(&self, id: Uuid) -> DomainResult<Option<Review>> {
        let row = sqlx::query(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_review).transpose()
    }

    async fn list_reviews_for_tool(&self, tool_id: Uuid) -> DomainResult<Vec<Review>> {
        sqlx::query(&format!(
            "{REVIEW_SELECT} WHERE r.tool_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(tool_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(map_review)
        .collect()
    }

    async fn scored_reviews_for_tool(&self, tool_id: Uuid) -> DomainResult<Vec<ScoredReview>> {
        sqlx::query(
            r#"
            SELECT r.id, r.review_type, r.overall_score, r.value_score, r.usage_score,
                   r.integration_score, u.trust_score, u.role
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.tool_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(tool_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(map_scored)
        .collect()
    }

    async fn review_activity(&self, user_id: &str) -> DomainResult<ReviewActivity> {
        let (review_count, helpful_votes, total_votes): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(helpful_votes), 0)::BIGINT,
                   COALESCE(SUM(total_votes), 0)::BIGINT
            FROM reviews
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(ReviewActivity {
            review_count,
            helpful_votes,
            total_votes,
        })
    }

    /// Atomic vote cast.
    ///
    /// # Developer Note
    /// The review row is locked first so concurrent voters on the same review
    /// serialize on the recount; the counters are always overwritten with a
    /// fresh COUNT, never incremented. Any early return drops `tx`, which
    /// rolls back.
    async fn cast_vote(
        &self,
        review_id: Uuid,
        user_id: &str,
        vote_type: VoteType,
    ) -> DomainResult<VoteTally> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM reviews WHERE id = $1 FOR UPDATE")
                .bind(review_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        if locked.is_none() {
            return Err(DomainError::not_found("Review", review_id));
        }

        let voter_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err)?;
        if !voter_exists {
            return Err(DomainError::invalid(format!("unknown voter `{user_id}`")));
        }

        // 1. Upsert the ledger row
        sqlx::query(
            r#"
            INSERT INTO review_votes (review_id, user_id, vote_type, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (review_id, user_id) DO UPDATE
            SET vote_type = EXCLUDED.vote_type,
                updated_at = NOW()
            "#,
        )
        .bind(review_id)
        .bind(user_id)
        .bind(vote_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        // 2. Recount from the ledger
        let (helpful_votes, total_votes): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE vote_type = 'helpful'),
                   COUNT(*)
            FROM review_votes
            WHERE review_id = $1
            "#,
        )
        .bind(review_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        // 3. Overwrite the denormalized counters
        sqlx::query("UPDATE reviews SET helpful_votes = $2, total_votes = $3 WHERE id = $1")
            .bind(review_id)
            .bind(helpful_votes)
            .bind(total_votes)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(VoteTally {
            review_id,
            vote_type,
            helpful_votes,
            total_votes,
        })
    }

    async fn find_vote(&self, review_id: Uuid, user_id: &str) -> DomainResult<Option<ReviewVote>> {
        let row = sqlx::query(
            r#"
            SELECT review_id, user_id, vote_type, created_at, updated_at
            FROM review_votes
            WHERE review_id = $1 AND user_id = $2
            "#,
        )
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(r) => Ok(Some(ReviewVote {
                review_id: r.try_get("review_id").map_err(db_err)?,
                user_id: r.try_get("user_id").map_err(db_err)?,
                vote_type: r
                    .try_get::<String, _>("vote_type")
                    .map_err(db_err)?
                    .parse::<VoteType>()?,
                created_at: r.try_get("created_at").map_err(db_err)?,
                updated_at: r.try_get("updated_at").map_err(db_err)?,
            })),
            None => Ok(None),
        }
    }

    async fn toggle_bookmark(&self, review_id: Uuid, user_id: &str) -> DomainResult<BookmarkState> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM reviews WHERE id = $1 FOR UPDATE")
                .bind(review_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        if locked.is_none() {
            return Err(DomainError::not_found("Review", review_id));
        }

        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err)?;
        if !user_exists {
            return Err(DomainError::invalid(format!("unknown user `{user_id}`")));
        }

        let removed =
            sqlx::query("DELETE FROM review_bookmarks WHERE review_id = $1 AND user_id = $2")
                .bind(review_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?
                .rows_affected();

        if removed == 0 {
            sqlx::query(
                "INSERT INTO review_bookmarks (review_id, user_id, created_at) \
                 VALUES ($1, $2, NOW())",
            )
            .bind(review_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(BookmarkState {
            review_id,
            bookmarked: removed == 0,
        })
    }
}
