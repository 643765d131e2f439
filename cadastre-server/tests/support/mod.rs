#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum_test::TestServer;
use cadastre_core::{
    application::AppUnitOfWork,
    database::InMemoryStore,
    scoring::{FixedScorer, ScoringConfig, ScoringEvent},
};
use cadastre_server::{
    infra::{config::Config, startup::Services},
    routes::create_router,
};
use tokio::sync::broadcast;

pub struct TestApp {
    pub server: TestServer,
    pub services: Services,
}

impl TestApp {
    pub fn events(&self) -> broadcast::Receiver<ScoringEvent> {
        self.services.workers.subscribe()
    }

    pub async fn shutdown(self) {
        drop(self.server);
        self.services.shutdown().await;
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.dev_mode = true;
    config.scoring = ScoringConfig {
        max_concurrent_jobs: 4,
        queue_capacity: 16,
        ..ScoringConfig::default()
    };
    config
}

/// Wire the router against the given storage with a scorer that returns
/// `score` immediately.
pub fn build_test_app(unit_of_work: AppUnitOfWork, score: f64) -> Result<TestApp> {
    let services = Services::start(
        test_config(),
        unit_of_work,
        Arc::new(FixedScorer::new(score)),
    );

    let make_service = create_router(services.state.clone())
        .into_make_service_with_connect_info::<SocketAddr>();
    let server = TestServer::builder()
        .http_transport()
        .build(make_service)
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(TestApp { server, services })
}

pub fn build_in_memory_app(score: f64) -> Result<(TestApp, Arc<InMemoryStore>)> {
    let store = Arc::new(InMemoryStore::new());
    let app = build_test_app(AppUnitOfWork::in_memory(store.clone()), score)?;
    Ok((app, store))
}
