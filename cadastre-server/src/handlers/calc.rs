use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use cadastre_model::{CalcRequest, Parcel, ScoreId, ScoreResponse};
use serde::Deserialize;
use tracing::debug;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub result_id: i32,
}

/// Register a parcel and schedule its scoring.
///
/// # Request
///
/// ```json
/// {
///   "cadastral_number": "66:66:666666:65",
///   "latitude": -30.2155,
///   "longitude": 70.1558
/// }
/// ```
///
/// # Response
///
/// - `200 OK` with the bare result id, e.g. `1`. Scoring runs in the
///   background; poll `GET /result/?result_id=1`.
/// - `400 Bad Request` for a malformed body, cadastral number or coordinates
/// - `409 Conflict` when the parcel is already registered
/// - `503 Service Unavailable` when storage cannot be reached
pub async fn create_calculation(
    State(state): State<AppState>,
    payload: Result<Json<CalcRequest>, JsonRejection>,
) -> AppResult<Json<i32>> {
    let Json(request) = payload?;
    let parcel = Parcel::try_from(request)?;

    let id = state.calculations.submit(parcel).await?;
    Ok(Json(id.get()))
}

/// Look up the score for a result id.
///
/// Returns `{"score": 55.532757}` once computed, or
/// `{"score": "Calculation has not been performed yet"}` while pending.
/// Unknown ids produce `404` with the `NOT_FOUND` error body.
pub async fn get_result(
    State(state): State<AppState>,
    query: Result<Query<ResultQuery>, QueryRejection>,
) -> AppResult<Json<ScoreResponse>> {
    let Query(ResultQuery { result_id }) = query?;

    let lookup = state.calculations.result(ScoreId(result_id)).await?;
    debug!(result_id, pending = lookup.is_pending(), "result lookup");

    lookup
        .into_score_response()
        .map(Json)
        .ok_or_else(AppError::resource_not_found)
}
