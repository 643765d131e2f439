use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;

use cadastre_core::scoring::ScoringConfig;

use super::{
    models::{Config, ConfigMetadata, CorsConfig, DatabaseConfig, ServerConfig},
    sources::{EnvConfig, FileConfig, FileDatabaseConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("cadastre.toml"),
        PathBuf::from("config/cadastre.toml"),
    ]
});

const DEFAULT_POSTGRES_PORT: u16 = 5432;

#[derive(Debug, Default, Clone)]
struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load the env file into the process environment, then compose the
    /// configuration from it.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        self.load_with_env(EnvConfig::gather(), env_file_loaded)
    }

    /// Compose from already gathered environment values. Does not touch the
    /// process environment.
    pub fn load_with_env(
        &self,
        env_config: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) = self.compose_config(
            file_config,
            env_config,
            config_path,
            env_file_loaded,
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env_config.config_path {
            source.env = Some(from_env.clone());
        }

        if source.is_empty() {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
    ) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
        let FileConfig {
            server: file_server,
            database: file_database,
            scoring: file_scoring,
            cors: file_cors,
            dev_mode: file_dev_mode,
        } = file_config.unwrap_or_default();

        let server = ServerConfig {
            host: env
                .server_host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| ServerConfig::default().host),
            port: env
                .server_port
                .or(file_server.port)
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let pool_defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url: self.resolve_database_url(&env, &file_database)?,
            max_connections: env
                .db_max_connections
                .or(file_database.max_connections)
                .unwrap_or(pool_defaults.max_connections),
            min_connections: env
                .db_min_connections
                .or(file_database.min_connections)
                .unwrap_or(pool_defaults.min_connections),
            acquire_timeout: env
                .db_acquire_timeout_secs
                .or(file_database.acquire_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(pool_defaults.acquire_timeout),
        };

        let scoring_defaults = ScoringConfig::default();
        let scoring = ScoringConfig {
            min_delay_secs: env
                .scoring_min_delay_secs
                .or(file_scoring.min_delay_secs)
                .unwrap_or(scoring_defaults.min_delay_secs),
            max_delay_secs: env
                .scoring_max_delay_secs
                .or(file_scoring.max_delay_secs)
                .unwrap_or(scoring_defaults.max_delay_secs),
            min_score: env
                .scoring_min_score
                .or(file_scoring.min_score)
                .unwrap_or(scoring_defaults.min_score),
            max_score: env
                .scoring_max_score
                .or(file_scoring.max_score)
                .unwrap_or(scoring_defaults.max_score),
            max_concurrent_jobs: env
                .scoring_max_concurrent_jobs
                .or(file_scoring.max_concurrent_jobs)
                .unwrap_or(scoring_defaults.max_concurrent_jobs),
            queue_capacity: env
                .scoring_queue_capacity
                .or(file_scoring.queue_capacity)
                .unwrap_or(scoring_defaults.queue_capacity),
            shutdown_grace: env
                .scoring_shutdown_grace_secs
                .or(file_scoring.shutdown_grace_secs)
                .map(Duration::from_secs)
                .unwrap_or(scoring_defaults.shutdown_grace),
        };

        let cors = CorsConfig {
            allowed_origins: env
                .cors_allowed_origins
                .clone()
                .or(file_cors.allowed_origins)
                .unwrap_or_default(),
        };

        let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

        let config = Config {
            server,
            database,
            scoring,
            cors,
            dev_mode,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        };

        let mut warnings = ConfigWarnings::default();
        if config.metadata.config_path.is_none() {
            warnings.push_with_hint(
                "No cadastre.toml detected; using environment variables and defaults",
                "Pass --config or set CADASTRE_CONFIG to use a configuration file",
            );
        }
        if !config.dev_mode && config.cors.allowed_origins.is_empty() {
            warnings.push_with_hint(
                "No CORS origins configured; cross-origin browser requests will be rejected",
                "Set CORS_ALLOWED_ORIGINS to a comma separated list of origins",
            );
        }
        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok((config, warnings))
    }

    fn resolve_database_url(
        &self,
        env: &EnvConfig,
        file_database: &FileDatabaseConfig,
    ) -> Result<Option<String>, ConfigLoadError> {
        if let Some(url) = non_blank(env.database_url.as_ref()) {
            return Ok(Some(url));
        }

        let host = non_blank(env.postgres_host.as_ref());
        let user = non_blank(env.postgres_user.as_ref());
        let name = non_blank(env.postgres_db_name.as_ref());

        if let (Some(host), Some(user), Some(name)) = (host, user, name) {
            let port = env.postgres_port.unwrap_or(DEFAULT_POSTGRES_PORT);
            let mut url =
                Url::parse(&format!("postgresql://{host}:{port}/{name}"))
                    .map_err(|source| ConfigLoadError::InvalidDatabaseUrl {
                        source,
                    })?;
            url.set_username(&user).map_err(|_| {
                ConfigLoadError::InvalidDatabaseUsername {
                    username: user.clone(),
                }
            })?;
            if let Some(password) =
                self.resolve_database_password(env, file_database)?
            {
                url.set_password(Some(&password))
                    .map_err(|_| ConfigLoadError::InvalidDatabasePassword)?;
            }
            return Ok(Some(url.to_string()));
        }

        if let Some(stored_url) = non_blank(file_database.url.as_ref()) {
            let mut parsed = Url::parse(&stored_url).map_err(|source| {
                ConfigLoadError::InvalidDatabaseUrl { source }
            })?;
            if parsed.password().is_none()
                && let Some(password) =
                    self.resolve_database_password(env, file_database)?
            {
                parsed
                    .set_password(Some(&password))
                    .map_err(|_| ConfigLoadError::InvalidDatabasePassword)?;
            }
            return Ok(Some(parsed.to_string()));
        }

        Ok(None)
    }

    fn resolve_database_password(
        &self,
        env: &EnvConfig,
        file_database: &FileDatabaseConfig,
    ) -> Result<Option<String>, ConfigLoadError> {
        if let Some(password) = non_blank(env.postgres_password.as_ref()) {
            return Ok(Some(password));
        }

        for path in [
            env.postgres_password_file.as_ref(),
            file_database.password_file.as_ref(),
        ]
        .into_iter()
        .flatten()
        {
            if let Some(secret) = Self::read_secret_file(path)? {
                return Ok(Some(secret));
            }
        }

        Ok(None)
    }

    fn read_secret_file(
        path: &Path,
    ) -> Result<Option<String>, ConfigLoadError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            ConfigLoadError::SecretFileIo {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid database URL")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("invalid database username '{username}'")]
    InvalidDatabaseUsername { username: String },
    #[error("failed to encode database password into URL")]
    InvalidDatabasePassword,
    #[error("failed to read secret file {path}")]
    SecretFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn is_empty(&self) -> bool {
        self.explicit.is_none() && self.env.is_none() && self.default.is_none()
    }

    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
