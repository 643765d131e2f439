use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cadastre_model::{CadastralNumber, Parcel, ScoreId, ScoreLookup};
use tokio::sync::Mutex;

use crate::database::ports::health::StorageHealth;
use crate::database::ports::results::{ResultRepository, ScoreRecord};
use crate::database::ports::territory::{ParcelRecord, TerritoryRepository};
use crate::error::{CadastreError, Result};

#[derive(Debug, Default)]
struct Tables {
    territory: BTreeMap<CadastralNumber, ParcelRecord>,
    results: BTreeMap<i32, ScoreRecord>,
    next_id: i32,
}

/// Process-local stand-in for the Postgres tables.
///
/// Keeps the same contract as the SQL repositories: serial ids starting at 1,
/// unique cadastral numbers, cascade delete. Both tables sit behind one lock so
/// `create` is atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`CadastreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CadastreError::Unavailable(
                "in-memory store is offline".into(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TerritoryRepository for InMemoryStore {
    async fn create(&self, parcel: &Parcel) -> Result<ScoreId> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;

        if tables.territory.contains_key(&parcel.cadastral_number) {
            return Err(CadastreError::Conflict(format!(
                "territory {} already exists",
                parcel.cadastral_number
            )));
        }

        let id = tables.next_id.checked_add(1).ok_or_else(|| {
            CadastreError::Internal("result id sequence exhausted".into())
        })?;
        tables.next_id = id;
        tables
            .territory
            .insert(parcel.cadastral_number.clone(), ParcelRecord::from(parcel));
        tables.results.insert(
            id,
            ScoreRecord {
                id: ScoreId(id),
                cadastral_number: parcel.cadastral_number.clone(),
                score: None,
            },
        );

        Ok(ScoreId(id))
    }

    async fn get(
        &self,
        cadastral_number: &CadastralNumber,
    ) -> Result<Option<ParcelRecord>> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.territory.get(cadastral_number).cloned())
    }

    async fn delete(&self, cadastral_number: &CadastralNumber) -> Result<bool> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        let existed = tables.territory.remove(cadastral_number).is_some();
        if existed {
            tables
                .results
                .retain(|_, record| &record.cadastral_number != cadastral_number);
        }
        Ok(existed)
    }
}

#[async_trait]
impl ResultRepository for InMemoryStore {
    async fn update_score(
        &self,
        cadastral_number: &CadastralNumber,
        score: f64,
    ) -> Result<u64> {
        self.ensure_online()?;
        let mut tables = self.tables.lock().await;
        let mut touched = 0;
        for record in tables
            .results
            .values_mut()
            .filter(|record| &record.cadastral_number == cadastral_number)
        {
            record.score = Some(score);
            touched += 1;
        }
        Ok(touched)
    }

    async fn get_score(&self, id: ScoreId) -> Result<ScoreLookup> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(ScoreLookup::from_row(
            tables.results.get(&id.get()).map(|record| record.score),
        ))
    }

    async fn find_by_cadastral_number(
        &self,
        cadastral_number: &CadastralNumber,
    ) -> Result<Option<ScoreRecord>> {
        self.ensure_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .results
            .values()
            .find(|record| &record.cadastral_number == cadastral_number)
            .cloned())
    }
}

#[async_trait]
impl StorageHealth for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        self.ensure_online()
    }
}
