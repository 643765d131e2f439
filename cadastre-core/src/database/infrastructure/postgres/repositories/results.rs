use async_trait::async_trait;
use cadastre_model::{CadastralNumber, ScoreId, ScoreLookup};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::database::ports::results::{ResultRepository, ScoreRecord};
use crate::error::{CadastreError, Result};

#[derive(Debug, Clone)]
pub struct PostgresResultRepository {
    pool: PgPool,
}

impl PostgresResultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<ScoreRecord> {
        let id: i32 = row.try_get("id").map_err(|e| {
            CadastreError::Internal(format!("Failed to read result id: {e}"))
        })?;
        let cadastral_number: String =
            row.try_get("cadastral_number").map_err(|e| {
                CadastreError::Internal(format!(
                    "Failed to read cadastral_number: {e}"
                ))
            })?;
        let score: Option<f64> = row.try_get("score").map_err(|e| {
            CadastreError::Internal(format!("Failed to read score: {e}"))
        })?;

        let cadastral_number = CadastralNumber::try_from(cadastral_number)
            .map_err(|e| {
                CadastreError::Internal(format!("Stored result is invalid: {e}"))
            })?;

        Ok(ScoreRecord {
            id: ScoreId(id),
            cadastral_number,
            score,
        })
    }
}

#[async_trait]
impl ResultRepository for PostgresResultRepository {
    async fn update_score(
        &self,
        cadastral_number: &CadastralNumber,
        score: f64,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE result SET score = $2 WHERE cadastral_number = $1",
        )
        .bind(cadastral_number.as_str())
        .bind(score)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_score(&self, id: ScoreId) -> Result<ScoreLookup> {
        let score: Option<Option<f64>> =
            sqlx::query_scalar("SELECT score FROM result WHERE id = $1")
                .bind(id.get())
                .fetch_optional(self.pool())
                .await?;

        Ok(ScoreLookup::from_row(score))
    }

    async fn find_by_cadastral_number(
        &self,
        cadastral_number: &CadastralNumber,
    ) -> Result<Option<ScoreRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, cadastral_number, score
            FROM result
            WHERE cadastral_number = $1
            "#,
        )
        .bind(cadastral_number.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }
}
