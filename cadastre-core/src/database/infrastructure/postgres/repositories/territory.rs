use async_trait::async_trait;
use cadastre_model::{CadastralNumber, Parcel, ScoreId};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::debug;

use crate::database::ports::territory::{ParcelRecord, TerritoryRepository};
use crate::error::{CadastreError, Result};

#[derive(Debug, Clone)]
pub struct PostgresTerritoryRepository {
    pool: PgPool,
}

impl PostgresTerritoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<ParcelRecord> {
        let cadastral_number: String =
            row.try_get("cadastral_number").map_err(|e| {
                CadastreError::Internal(format!(
                    "Failed to read cadastral_number: {e}"
                ))
            })?;
        let latitude: f64 = row.try_get("latitude").map_err(|e| {
            CadastreError::Internal(format!("Failed to read latitude: {e}"))
        })?;
        let longitude: f64 = row.try_get("longitude").map_err(|e| {
            CadastreError::Internal(format!("Failed to read longitude: {e}"))
        })?;

        let cadastral_number = CadastralNumber::try_from(cadastral_number)
            .map_err(|e| {
                CadastreError::Internal(format!("Stored parcel is invalid: {e}"))
            })?;

        Ok(ParcelRecord {
            cadastral_number,
            latitude,
            longitude,
        })
    }
}

#[async_trait]
impl TerritoryRepository for PostgresTerritoryRepository {
    async fn create(&self, parcel: &Parcel) -> Result<ScoreId> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO territory (cadastral_number, latitude, longitude)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(parcel.cadastral_number.as_str())
        .bind(parcel.latitude())
        .bind(parcel.longitude())
        .execute(&mut *tx)
        .await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO result (cadastral_number, score)
            VALUES ($1, NULL)
            RETURNING id
            "#,
        )
        .bind(parcel.cadastral_number.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            cadastral_number = %parcel.cadastral_number,
            score_id = id,
            "created territory with pending result"
        );
        Ok(ScoreId(id))
    }

    async fn get(
        &self,
        cadastral_number: &CadastralNumber,
    ) -> Result<Option<ParcelRecord>> {
        let row = sqlx::query(
            r#"
            SELECT cadastral_number, latitude, longitude
            FROM territory
            WHERE cadastral_number = $1
            "#,
        )
        .bind(cadastral_number.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn delete(&self, cadastral_number: &CadastralNumber) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM territory WHERE cadastral_number = $1")
                .bind(cadastral_number.as_str())
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::database::infrastructure::postgres::PostgresResultRepository;
    use crate::database::ports::results::ResultRepository;
    use cadastre_model::ScoreLookup;

    fn parcel(number: &str) -> Parcel {
        Parcel::new(number, -30.2155, 70.1558).unwrap()
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn create_inserts_parcel_and_pending_result(pool: PgPool) {
        let territories = PostgresTerritoryRepository::new(pool.clone());
        let results = PostgresResultRepository::new(pool);

        let parcel = parcel("66:66:666666:65");
        let id = territories.create(&parcel).await.unwrap();
        assert!(id.get() > 0);

        let stored = territories
            .get(&parcel.cadastral_number)
            .await
            .unwrap()
            .expect("territory row");
        assert_eq!(stored, ParcelRecord::from(&parcel));
        assert_eq!(results.get_score(id).await.unwrap(), ScoreLookup::Pending);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn duplicate_parcel_is_a_conflict_and_leaves_no_partial_rows(
        pool: PgPool,
    ) {
        let territories = PostgresTerritoryRepository::new(pool.clone());
        let parcel = parcel("11:11:111111:11");
        territories.create(&parcel).await.unwrap();

        let err = territories.create(&parcel).await.unwrap_err();
        assert!(matches!(err, CadastreError::Conflict(_)), "{err:?}");

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM result WHERE cadastral_number = $1",
        )
        .bind(parcel.cadastral_number.as_str())
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn delete_cascades_to_result(pool: PgPool) {
        let territories = PostgresTerritoryRepository::new(pool.clone());
        let results = PostgresResultRepository::new(pool);
        let parcel = parcel("22:22:222222:22");
        let id = territories.create(&parcel).await.unwrap();

        assert!(territories.delete(&parcel.cadastral_number).await.unwrap());
        assert!(!territories.delete(&parcel.cadastral_number).await.unwrap());
        assert_eq!(results.get_score(id).await.unwrap(), ScoreLookup::NotFound);
    }
}
