#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Structured body returned for every explicit fault.
///
/// Serialized as `{"code": 400, "type": "ValidationError", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ErrorResponse {
    pub code: u16,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(
        code: u16,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            kind: kind.into(),
            message: message.into(),
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn kind_is_serialized_as_type() {
        let body = ErrorResponse::new(404, "NOT_FOUND", "Resource not found");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["code"], 404);
        assert_eq!(json["type"], "NOT_FOUND");
        assert_eq!(json["message"], "Resource not found");
        assert!(json.get("kind").is_none());
    }
}
