use async_trait::async_trait;
use cadastre_model::{CadastralNumber, Parcel, ScoreId};

use crate::error::Result;

/// Stored `territory` row.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelRecord {
    pub cadastral_number: CadastralNumber,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Parcel> for ParcelRecord {
    fn from(parcel: &Parcel) -> Self {
        Self {
            cadastral_number: parcel.cadastral_number.clone(),
            latitude: parcel.latitude(),
            longitude: parcel.longitude(),
        }
    }
}

#[async_trait]
pub trait TerritoryRepository: Send + Sync {
    /// Insert the parcel together with its pending result row, atomically.
    /// Returns the id of the new result row.
    async fn create(&self, parcel: &Parcel) -> Result<ScoreId>;

    async fn get(
        &self,
        cadastral_number: &CadastralNumber,
    ) -> Result<Option<ParcelRecord>>;

    /// Delete the parcel; its result row goes with it. Returns whether a row
    /// existed.
    async fn delete(&self, cadastral_number: &CadastralNumber) -> Result<bool>;
}
