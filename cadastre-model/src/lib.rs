//! Core data model definitions shared across cadastre crates.
//!
//! The model layer owns input validation: a [`Parcel`] can only be built from
//! a well-formed [`CadastralNumber`] and in-range [`Coordinates`], so the
//! storage layer never sees unchecked input.
#![allow(missing_docs)]

pub mod error;
pub mod error_response;
pub mod parcel;
pub mod score;

pub use error::{ModelError, Result as ModelResult};
pub use error_response::ErrorResponse;
pub use parcel::{CadastralNumber, CalcRequest, Coordinates, Parcel};
pub use score::{
    PENDING_MESSAGE, SCORE_PRECISION, ScoreId, ScoreLookup, ScoreResponse,
    ScoreValue, round_score,
};
