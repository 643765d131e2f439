use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Marker returned in place of a score while the calculation is pending.
pub const PENDING_MESSAGE: &str = "Calculation has not been performed yet";

/// Number of fractional digits kept on a computed score.
pub const SCORE_PRECISION: i32 = 6;

/// Surrogate id of a `result` row; the handle handed back to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ScoreId(pub i32);

impl ScoreId {
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ScoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ScoreId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Outcome of looking a score up by id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreLookup {
    Computed(f64),
    Pending,
    NotFound,
}

impl ScoreLookup {
    /// Build a lookup from a fetched row: the outer option is row presence,
    /// the inner one is the nullable `score` column.
    pub fn from_row(row: Option<Option<f64>>) -> Self {
        match row {
            Some(Some(score)) => ScoreLookup::Computed(score),
            Some(None) => ScoreLookup::Pending,
            None => ScoreLookup::NotFound,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ScoreLookup::Pending)
    }

    /// `None` for [`ScoreLookup::NotFound`].
    pub fn into_score_response(self) -> Option<ScoreResponse> {
        match self {
            ScoreLookup::Computed(score) => Some(ScoreResponse {
                score: ScoreValue::Computed(score),
            }),
            ScoreLookup::Pending => Some(ScoreResponse {
                score: ScoreValue::Pending(PENDING_MESSAGE.to_string()),
            }),
            ScoreLookup::NotFound => None,
        }
    }
}

/// Body of `GET /result/`: `{"score": 12.5}` or `{"score": "<pending>"}`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreResponse {
    pub score: ScoreValue,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ScoreValue {
    Computed(f64),
    Pending(String),
}

impl ScoreValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScoreValue::Computed(score) => Some(*score),
            ScoreValue::Pending(_) => None,
        }
    }
}

/// Round a raw score to [`SCORE_PRECISION`] fractional digits.
pub fn round_score(value: f64) -> f64 {
    let factor = 10f64.powi(SCORE_PRECISION);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_distinguishes_all_row_states() {
        assert_eq!(
            ScoreLookup::from_row(Some(Some(55.532757))),
            ScoreLookup::Computed(55.532757)
        );
        assert_eq!(ScoreLookup::from_row(Some(None)), ScoreLookup::Pending);
        assert_eq!(ScoreLookup::from_row(None), ScoreLookup::NotFound);
    }

    #[test]
    fn not_found_has_no_response_body() {
        assert!(ScoreLookup::NotFound.into_score_response().is_none());
    }

    #[test]
    fn rounding_keeps_six_fractional_digits() {
        assert_eq!(round_score(12.345_678_9), 12.345_679);
        assert_eq!(round_score(-99.999_999_4), -99.999_999);
        assert_eq!(round_score(100.0), 100.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn response_serializes_number_or_marker() {
        let computed = ScoreLookup::Computed(55.532757).into_score_response().unwrap();
        assert_eq!(
            serde_json::to_string(&computed).unwrap(),
            r#"{"score":55.532757}"#
        );

        let pending = ScoreLookup::Pending.into_score_response().unwrap();
        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["score"], PENDING_MESSAGE);

        let parsed: ScoreResponse =
            serde_json::from_str(r#"{"score":-4.5}"#).unwrap();
        assert_eq!(parsed.score.as_f64(), Some(-4.5));
    }
}
