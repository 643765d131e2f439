pub mod repositories;

pub use repositories::results::PostgresResultRepository;
pub use repositories::territory::PostgresTerritoryRepository;
