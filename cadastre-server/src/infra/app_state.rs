use std::{fmt, sync::Arc};

use cadastre_core::service::CalculationService;

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub calculations: Arc<CalculationService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(calculations: CalculationService, config: Config) -> Self {
        Self {
            calculations: Arc::new(calculations),
            config: Arc::new(config),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("dev_mode", &self.config.dev_mode)
            .finish_non_exhaustive()
    }
}
