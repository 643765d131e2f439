use std::sync::Arc;

use cadastre_core::{
    application::unit_of_work::AppUnitOfWork,
    scoring::{Scorer, ScoringWorkerPool},
    service::CalculationService,
};
use tracing::info;

use crate::infra::{app_state::AppState, config::Config};

/// Request state plus the background worker pool that must be drained on
/// shutdown.
#[derive(Debug)]
pub struct Services {
    pub state: AppState,
    pub workers: ScoringWorkerPool,
}

impl Services {
    /// Start the scoring pool and wire the calculation service on top of the
    /// given storage.
    pub fn start(
        config: Config,
        unit_of_work: AppUnitOfWork,
        scorer: Arc<dyn Scorer>,
    ) -> Self {
        let (workers, queue) = ScoringWorkerPool::start(
            config.scoring.clone(),
            scorer,
            unit_of_work.results.clone(),
        );
        let calculations = CalculationService::new(unit_of_work, queue);

        Self {
            state: AppState::new(calculations, config),
            workers,
        }
    }

    pub async fn shutdown(self) {
        info!("Draining scoring worker pool");
        drop(self.state);
        self.workers.shutdown().await;
    }
}
