//! # Cadastre Core
//!
//! Storage, scoring and application services for the cadastre scoring
//! service.
//!
//! - [`database`]: repository ports with Postgres and in-memory adapters, the
//!   pool wrapper and health check
//! - [`application`]: the unit of work that bundles the ports
//! - [`scoring`]: the [`scoring::Scorer`] trait and the background worker pool
//! - [`service`]: [`service::CalculationService`], the create-then-score flow
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cadastre_core::{
//!     application::AppUnitOfWork,
//!     database::InMemoryStore,
//!     scoring::{FixedScorer, ScoringConfig, ScoringWorkerPool},
//!     service::CalculationService,
//! };
//! use cadastre_model::Parcel;
//!
//! # async fn demo() -> cadastre_core::Result<()> {
//! let unit_of_work = AppUnitOfWork::in_memory(Arc::new(InMemoryStore::new()));
//! let (pool, queue) = ScoringWorkerPool::start(
//!     ScoringConfig::default(),
//!     Arc::new(FixedScorer::new(1.5)),
//!     unit_of_work.results.clone(),
//! );
//! let service = CalculationService::new(unit_of_work, queue);
//!
//! let id = service
//!     .submit(Parcel::new("66:66:666666:65", -30.2155, 70.1558)?)
//!     .await?;
//! println!("poll {}", cadastre_core::api::routes::result_path(id.get()));
//! pool.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod api;
pub mod application;
pub mod database;
pub mod error;
pub mod scoring;
pub mod service;

pub use error::{CadastreError, HOST_UNRESOLVED_MESSAGE, Result};

/// Embedded schema migrations for the `territory` and `result` tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
