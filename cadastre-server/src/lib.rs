//! HTTP surface of the cadastre scoring service.
//!
//! `POST /calc/` registers a parcel and returns a result id immediately;
//! scoring runs on a background worker pool. `GET /result/?result_id=` reports
//! the score once it has been written.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
