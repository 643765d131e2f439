use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub scoring: FileScoringConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileScoringConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_delay_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_jobs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_grace_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub postgres_host: Option<String>,
    pub postgres_port: Option<u16>,
    pub postgres_db_name: Option<String>,
    pub postgres_user: Option<String>,
    pub postgres_password: Option<String>,
    pub postgres_password_file: Option<PathBuf>,
    pub db_max_connections: Option<u32>,
    pub db_min_connections: Option<u32>,
    pub db_acquire_timeout_secs: Option<u64>,
    pub scoring_min_delay_secs: Option<u64>,
    pub scoring_max_delay_secs: Option<u64>,
    pub scoring_min_score: Option<f64>,
    pub scoring_max_score: Option<f64>,
    pub scoring_max_concurrent_jobs: Option<usize>,
    pub scoring_queue_capacity: Option<usize>,
    pub scoring_shutdown_grace_secs: Option<u64>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; [`EnvConfig::gather`] uses
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            config_path: lookup("CADASTRE_CONFIG").map(PathBuf::from),
            server_host: lookup("SERVER_HOST"),
            server_port: parse_var(&lookup, "SERVER_PORT"),
            database_url: lookup("DATABASE_URL"),
            postgres_host: lookup("POSTGRES_HOST"),
            postgres_port: parse_var(&lookup, "POSTGRES_PORT"),
            postgres_db_name: lookup("POSTGRES_DB_NAME"),
            postgres_user: lookup("POSTGRES_USER"),
            postgres_password: lookup("POSTGRES_PASSWORD"),
            postgres_password_file: lookup("POSTGRES_PASSWORD_FILE")
                .map(PathBuf::from),
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS"),
            db_min_connections: parse_var(&lookup, "DB_MIN_CONNECTIONS"),
            db_acquire_timeout_secs: parse_var(&lookup, "DB_ACQUIRE_TIMEOUT_SECS"),
            scoring_min_delay_secs: parse_var(&lookup, "SCORING_MIN_DELAY_SECS"),
            scoring_max_delay_secs: parse_var(&lookup, "SCORING_MAX_DELAY_SECS"),
            scoring_min_score: parse_var(&lookup, "SCORING_MIN_SCORE"),
            scoring_max_score: parse_var(&lookup, "SCORING_MAX_SCORE"),
            scoring_max_concurrent_jobs: parse_var(&lookup, "SCORING_MAX_CONCURRENT_JOBS"),
            scoring_queue_capacity: parse_var(&lookup, "SCORING_QUEUE_CAPACITY"),
            scoring_shutdown_grace_secs: parse_var(&lookup, "SCORING_SHUTDOWN_GRACE_SECS"),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_csv(&raw)),
            dev_mode: lookup("DEV_MODE").and_then(|raw| parse_bool(&raw)),
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|raw| raw.trim().parse().ok())
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
