//! HTTP request handlers

pub mod calc;
pub mod health;

pub use calc::{create_calculation, get_result};
pub use health::{health_handler, not_found_handler};
