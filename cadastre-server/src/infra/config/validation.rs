use axum::http::HeaderValue;
use thiserror::Error;

use super::models::{Config, CorsConfig, DatabaseConfig};
use cadastre_core::scoring::ScoringConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigGuardRailError {
    #[error("CORS wildcard origins are not allowed when DEV_MODE is false")]
    DangerousCorsWildcard,
    #[error("invalid CORS configuration: {reason}")]
    InvalidCorsConfig { reason: String },
    #[error("invalid scoring configuration: {reason}")]
    InvalidScoringConfig { reason: String },
    #[error("invalid database pool configuration: {reason}")]
    InvalidPoolConfig { reason: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if !config.dev_mode && config.cors.is_wildcard_included() {
        return Err(ConfigGuardRailError::DangerousCorsWildcard);
    }
    validate_cors(&config.cors)?;
    validate_scoring(&config.scoring)?;
    validate_pool(&config.database)?;

    if config.database.url.is_none() {
        warnings.push_with_hint(
            "No database configured; the server cannot start",
            "Set DATABASE_URL, or POSTGRES_HOST, POSTGRES_DB_NAME and POSTGRES_USER",
        );
    }

    if config.dev_mode {
        warnings.push("DEV_MODE is on; CORS accepts any origin");
    }

    if config.scoring.shutdown_grace.is_zero() {
        warnings.push(
            "SCORING_SHUTDOWN_GRACE_SECS is 0; in-flight calculations are aborted immediately on shutdown",
        );
    }

    Ok(warnings)
}

fn validate_cors(cors: &CorsConfig) -> Result<(), ConfigGuardRailError> {
    for origin in &cors.allowed_origins {
        if origin == "*" {
            continue;
        }
        HeaderValue::from_str(origin).map_err(|_| {
            ConfigGuardRailError::InvalidCorsConfig {
                reason: format!(
                    "invalid origin `{origin}` in CORS_ALLOWED_ORIGINS"
                ),
            }
        })?;
    }
    Ok(())
}

fn validate_scoring(
    scoring: &ScoringConfig,
) -> Result<(), ConfigGuardRailError> {
    if scoring.min_delay_secs > scoring.max_delay_secs {
        return Err(ConfigGuardRailError::InvalidScoringConfig {
            reason: format!(
                "SCORING_MIN_DELAY_SECS ({}) exceeds SCORING_MAX_DELAY_SECS ({})",
                scoring.min_delay_secs, scoring.max_delay_secs
            ),
        });
    }
    if !(scoring.max_score - scoring.min_score).is_finite() {
        return Err(ConfigGuardRailError::InvalidScoringConfig {
            reason: format!(
                "SCORING_MIN_SCORE ({}) and SCORING_MAX_SCORE ({}) must be finite",
                scoring.min_score, scoring.max_score
            ),
        });
    }
    if scoring.min_score > scoring.max_score {
        return Err(ConfigGuardRailError::InvalidScoringConfig {
            reason: format!(
                "SCORING_MIN_SCORE ({}) must not exceed SCORING_MAX_SCORE ({})",
                scoring.min_score, scoring.max_score
            ),
        });
    }
    if scoring.max_concurrent_jobs == 0 {
        return Err(ConfigGuardRailError::InvalidScoringConfig {
            reason: "SCORING_MAX_CONCURRENT_JOBS must be at least 1".into(),
        });
    }
    if scoring.queue_capacity == 0 {
        return Err(ConfigGuardRailError::InvalidScoringConfig {
            reason: "SCORING_QUEUE_CAPACITY must be at least 1".into(),
        });
    }
    Ok(())
}

fn validate_pool(database: &DatabaseConfig) -> Result<(), ConfigGuardRailError> {
    if database.max_connections == 0 {
        return Err(ConfigGuardRailError::InvalidPoolConfig {
            reason: "DB_MAX_CONNECTIONS must be at least 1".into(),
        });
    }
    if database.min_connections > database.max_connections {
        return Err(ConfigGuardRailError::InvalidPoolConfig {
            reason: format!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                database.min_connections, database.max_connections
            ),
        });
    }
    Ok(())
}
