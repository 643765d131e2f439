pub mod infrastructure;
pub mod ports;
pub mod postgres;

pub use infrastructure::memory::InMemoryStore;
pub use infrastructure::postgres::{
    PostgresResultRepository, PostgresTerritoryRepository,
};
pub use ports::health::StorageHealth;
pub use ports::results::{ResultRepository, ScoreRecord};
pub use ports::territory::{ParcelRecord, TerritoryRepository};
pub use postgres::{PoolSettings, PoolStats, PostgresDatabase};
