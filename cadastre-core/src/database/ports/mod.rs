//! Repository traits consumed by application services.
//!
//! Each port has a Postgres implementation under
//! `database::infrastructure::postgres` and an in-memory one used by tests and
//! local runs without a database.

pub mod health;
pub mod results;
pub mod territory;
