//! Route definitions shared by the server and its clients.
//!
//! The trailing slashes on the scoring routes are part of the public contract
//! and must be kept.

pub const CALC: &str = "/calc/";
pub const RESULT: &str = "/result/";
pub const HEALTH: &str = "/health";

/// Query parameter carrying the id returned by [`CALC`].
pub const RESULT_ID_PARAM: &str = "result_id";

/// Build the lookup URL path for a result id.
pub fn result_path(result_id: i32) -> String {
    format!("{RESULT}?{RESULT_ID_PARAM}={result_id}")
}
