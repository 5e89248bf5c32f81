use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    DomainError, DomainResult, ScoreBreakdown, Tool, ToolRepository, ToolVerdict, Verdict,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{db_err, PgStore};

const TOOL_COLUMNS: &str = "id, name, slug, overall_score, value_score, usage_score, \
     integration_score, verdict, verdict_confidence, verdict_review_count, \
     verdict_calculated_at, created_at";

fn map_tool(row: &PgRow) -> DomainResult<Tool> {
    let verdict = row
        .try_get::<Option<String>, _>("verdict")
        .map_err(db_err)?
        .map(|v| v.parse::<Verdict>())
        .transpose()?;

    Ok(Tool {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        slug: row.try_get("slug").map_err(db_err)?,
        scores: ScoreBreakdown {
            overall: row.try_get("overall_score").map_err(db_err)?,
            value: row.try_get("value_score").map_err(db_err)?,
            usage: row.try_get("usage_score").map_err(db_err)?,
            integration: row.try_get("integration_score").map_err(db_err)?,
        },
        verdict,
        verdict_confidence: row.try_get("verdict_confidence").map_err(db_err)?,
        verdict_review_count: row.try_get("verdict_review_count").map_err(db_err)?,
        verdict_calculated_at: row
            .try_get::<Option<DateTime<Utc>>, _>("verdict_calculated_at")
            .map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

#[async_trait]
impl ToolRepository for PgStore {
    async fn create_tool(&self, tool: &Tool) -> DomainResult<()> {
        sqlx::query("INSERT INTO tools (id, name, slug, created_at) VALUES ($1, $2, $3, $4)")
            .bind(tool.id)
            .bind(&tool.name)
            .bind(&tool.slug)
            .bind(tool.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_tool(&self, id: Uuid) -> DomainResult<Option<Tool>> {
        let row = sqlx::query(&format!("SELECT {TOOL_COLUMNS} FROM tools WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_tool).transpose()
    }

    async fn list_tools(&self) -> DomainResult<Vec<Tool>> {
        sqlx::query(&format!("SELECT {TOOL_COLUMNS} FROM tools ORDER BY name ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(map_tool)
            .collect()
    }

    async fn save_verdict(&self, verdict: &ToolVerdict) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tools
            SET verdict = $2,
                verdict_confidence = $3,
                verdict_review_count = $4,
                overall_score = $5,
                value_score = $6,
                usage_score = $7,
                integration_score = $8,
                verdict_calculated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(verdict.tool_id)
        .bind(verdict.verdict.map(|v| v.as_str()))
        .bind(verdict.confidence)
        .bind(verdict.review_count)
        .bind(verdict.scores.overall)
        .bind(verdict.scores.value)
        .bind(verdict.scores.usage)
        .bind(verdict.scores.integration)
        .bind(verdict.calculated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Tool", verdict.tool_id));
        }
        Ok(())
    }

    async fn save_scores(&self, tool_id: Uuid, scores: &ScoreBreakdown) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tools
            SET overall_score = $2,
                value_score = $3,
                usage_score = $4,
                integration_score = $5
            WHERE id = $1
            "#,
        )
        .bind(tool_id)
        .bind(scores.overall)
        .bind(scores.value)
        .bind(scores.usage)
        .bind(scores.integration)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Tool", tool_id));
        }
        Ok(())
    }
}
