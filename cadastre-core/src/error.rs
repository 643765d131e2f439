use cadastre_model::ModelError;
use thiserror::Error;

/// Fixed message reported when the database host cannot be resolved.
pub const HOST_UNRESOLVED_MESSAGE: &str = "No connection to the database";

#[derive(Error, Debug)]
pub enum CadastreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Database host unresolved: {0}")]
    HostUnresolved(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CadastreError {
    /// Whether the caller may reasonably try the same operation again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CadastreError::Unavailable(_))
    }
}

impl From<ModelError> for CadastreError {
    fn from(err: ModelError) -> Self {
        CadastreError::Validation(err.to_string())
    }
}

impl From<sqlx::Error> for CadastreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(io) if is_name_resolution_failure(&io) => {
                CadastreError::HostUnresolved(io.to_string())
            }
            sqlx::Error::Io(io) => CadastreError::Unavailable(io.to_string()),
            sqlx::Error::Tls(tls) => CadastreError::Unavailable(tls.to_string()),
            sqlx::Error::PoolTimedOut => CadastreError::Unavailable(
                "timed out acquiring a pooled connection".into(),
            ),
            sqlx::Error::PoolClosed => {
                CadastreError::Unavailable("connection pool is closed".into())
            }
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CadastreError::Conflict(db.message().to_string())
            }
            sqlx::Error::RowNotFound => {
                CadastreError::NotFound("row not found".into())
            }
            other => CadastreError::Internal(other.to_string()),
        }
    }
}

// getaddrinfo failures surface as plain io errors; only the text tells them
// apart from refused or reset connections.
fn is_name_resolution_failure(err: &std::io::Error) -> bool {
    const MARKERS: [&str; 5] = [
        "failed to lookup address",
        "Name or service not known",
        "nodename nor servname",
        "No such host is known",
        "Temporary failure in name resolution",
    ];
    let message = err.to_string();
    MARKERS.iter().any(|marker| message.contains(marker))
}

pub type Result<T> = std::result::Result<T, CadastreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn refused_connection_is_retryable_unavailable() {
        let err = CadastreError::from(sqlx::Error::Io(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "Connection refused (os error 111)",
        )));
        assert!(matches!(err, CadastreError::Unavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn lookup_failure_maps_to_host_unresolved() {
        let err = CadastreError::from(sqlx::Error::Io(io::Error::other(
            "failed to lookup address information: Name or service not known",
        )));
        assert!(matches!(err, CadastreError::HostUnresolved(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn pool_exhaustion_maps_to_unavailable() {
        assert!(matches!(
            CadastreError::from(sqlx::Error::PoolTimedOut),
            CadastreError::Unavailable(_)
        ));
        assert!(matches!(
            CadastreError::from(sqlx::Error::PoolClosed),
            CadastreError::Unavailable(_)
        ));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            CadastreError::from(sqlx::Error::RowNotFound),
            CadastreError::NotFound(_)
        ));
    }

    #[test]
    fn model_errors_become_validation() {
        let err = CadastreError::from(ModelError::LatitudeOutOfRange(91.0));
        match err {
            CadastreError::Validation(message) => {
                assert!(message.contains("latitude"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
