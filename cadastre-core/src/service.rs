use cadastre_model::{Parcel, ScoreId, ScoreLookup};
use tracing::{info, warn};

use crate::application::unit_of_work::AppUnitOfWork;
use crate::error::Result;
use crate::scoring::ScoringQueue;

/// Creates parcels, schedules their scoring and answers score lookups.
#[derive(Debug, Clone)]
pub struct CalculationService {
    unit_of_work: AppUnitOfWork,
    queue: ScoringQueue,
}

impl CalculationService {
    pub fn new(unit_of_work: AppUnitOfWork, queue: ScoringQueue) -> Self {
        Self {
            unit_of_work,
            queue,
        }
    }

    /// Persist the parcel with a pending result and schedule scoring.
    ///
    /// Returns as soon as the rows are committed and never waits on the
    /// scoring backlog. If the queue is full or already shut down the id is
    /// still returned and the result stays pending.
    pub async fn submit(&self, parcel: Parcel) -> Result<ScoreId> {
        let id = self.unit_of_work.territories.create(&parcel).await?;
        info!(
            cadastral_number = %parcel.cadastral_number,
            score_id = id.get(),
            "Territory created; scheduling calculation"
        );

        if let Err(err) = self.queue.enqueue(parcel) {
            warn!(score_id = id.get(), "Calculation not scheduled: {err}");
        }

        Ok(id)
    }

    pub async fn result(&self, id: ScoreId) -> Result<ScoreLookup> {
        self.unit_of_work.results.get_score(id).await
    }

    pub async fn check_storage(&self) -> Result<()> {
        self.unit_of_work.health.ping().await
    }
}
