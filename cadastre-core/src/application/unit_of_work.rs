use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::{
    InMemoryStore, PostgresDatabase, PostgresResultRepository,
    PostgresTerritoryRepository,
    ports::{
        health::StorageHealth, results::ResultRepository,
        territory::TerritoryRepository,
    },
};

/// Aggregates the repository ports used by application services.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub territories: Arc<dyn TerritoryRepository>,
    pub results: Arc<dyn ResultRepository>,
    pub health: Arc<dyn StorageHealth>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("territories", &type_name_of_val(self.territories.as_ref()))
            .field("results", &type_name_of_val(self.results.as_ref()))
            .field("health", &type_name_of_val(self.health.as_ref()))
            .finish()
    }
}

#[derive(Default)]
pub struct AppUnitOfWorkBuilder {
    territories: Option<Arc<dyn TerritoryRepository>>,
    results: Option<Arc<dyn ResultRepository>>,
    health: Option<Arc<dyn StorageHealth>>,
}

impl fmt::Debug for AppUnitOfWorkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWorkBuilder")
            .field("territories", &self.territories.is_some())
            .field("results", &self.results.is_some())
            .field("health", &self.health.is_some())
            .finish()
    }
}

impl AppUnitOfWorkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_territories(
        mut self,
        repo: Arc<dyn TerritoryRepository>,
    ) -> Self {
        self.territories = Some(repo);
        self
    }

    pub fn with_results(mut self, repo: Arc<dyn ResultRepository>) -> Self {
        self.results = Some(repo);
        self
    }

    pub fn with_health(mut self, health: Arc<dyn StorageHealth>) -> Self {
        self.health = Some(health);
        self
    }

    /// Populate the builder with Postgres-backed repository adapters.
    pub fn with_postgres(mut self, db: Arc<PostgresDatabase>) -> Self {
        let pool = db.pool().clone();

        let territories: Arc<dyn TerritoryRepository> =
            Arc::new(PostgresTerritoryRepository::new(pool.clone()));
        self.territories = Some(territories);

        let results: Arc<dyn ResultRepository> =
            Arc::new(PostgresResultRepository::new(pool));
        self.results = Some(results);

        let health: Arc<dyn StorageHealth> = db;
        self.health = Some(health);

        self
    }

    /// Build a validated AppUnitOfWork. Returns a string error if any required
    /// repository is missing.
    pub fn build(self) -> Result<AppUnitOfWork, String> {
        Ok(AppUnitOfWork {
            territories: self
                .territories
                .ok_or_else(|| "missing TerritoryRepository".to_string())?,
            results: self
                .results
                .ok_or_else(|| "missing ResultRepository".to_string())?,
            health: self
                .health
                .ok_or_else(|| "missing StorageHealth".to_string())?,
        })
    }
}

impl AppUnitOfWork {
    /// Convenience helper to compose all Postgres-backed repositories into a unit of work.
    pub fn from_postgres(db: Arc<PostgresDatabase>) -> Result<Self, String> {
        AppUnitOfWorkBuilder::new().with_postgres(db).build()
    }

    /// Unit of work over a single in-memory store, for tests and database-less runs.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            territories: store.clone(),
            results: store.clone(),
            health: store,
        }
    }
}
