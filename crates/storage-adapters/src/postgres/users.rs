use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{DomainError, DomainResult, Role, TrustScore, User, UserRepository};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::{db_err, PgStore};

fn map_user(row: &PgRow) -> DomainResult<User> {
    Ok(User {
        id: row.try_get("id").map_err(db_err)?,
        role: row.try_get::<String, _>("role").map_err(db_err)?.parse::<Role>()?,
        is_verified_tester: row.try_get("is_verified_tester").map_err(db_err)?,
        trust_score: row.try_get("trust_score").map_err(db_err)?,
        trust_score_calculated_at: row
            .try_get::<Option<DateTime<Utc>>, _>("trust_score_calculated_at")
            .map_err(db_err)?,
        helpful_votes_received: row.try_get("helpful_votes_received").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, id: &str) -> DomainResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, role, is_verified_tester, trust_score, trust_score_calculated_at,
                   helpful_votes_received, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_user).transpose()
    }

    async fn upsert_user(&self, user: &User) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, role, is_verified_tester, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET role = EXCLUDED.role,
                is_verified_tester = EXCLUDED.is_verified_tester
            "#,
        )
        .bind(&user.id)
        .bind(user.role.as_str())
        .bind(user.is_verified_tester)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn save_trust_score(&self, score: &TrustScore) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET trust_score = $2,
                trust_score_calculated_at = $3,
                helpful_votes_received = $4
            WHERE id = $1
            "#,
        )
        .bind(&score.user_id)
        .bind(score.score)
        .bind(score.calculated_at)
        .bind(score.helpful_votes_received)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("User", &score.user_id));
        }
        Ok(())
    }
}
