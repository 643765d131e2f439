use async_trait::async_trait;
use cadastre_model::{CadastralNumber, ScoreId, ScoreLookup};

use crate::error::Result;

/// Stored `result` row. `score` is `None` while the calculation is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub id: ScoreId,
    pub cadastral_number: CadastralNumber,
    pub score: Option<f64>,
}

#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Overwrite the score of the row owned by `cadastral_number`.
    /// Returns the number of rows touched (0 when the parcel is gone).
    async fn update_score(
        &self,
        cadastral_number: &CadastralNumber,
        score: f64,
    ) -> Result<u64>;

    async fn get_score(&self, id: ScoreId) -> Result<ScoreLookup>;

    async fn find_by_cadastral_number(
        &self,
        cadastral_number: &CadastralNumber,
    ) -> Result<Option<ScoreRecord>>;
}
