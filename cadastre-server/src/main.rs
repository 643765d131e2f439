//! # Cadastre Server
//!
//! Registers land parcels and scores them in the background.
//!
//! ## Commands
//!
//! - `cadastre-server` / `cadastre-server serve`: connect, migrate and serve
//! - `cadastre-server db migrate`: apply migrations and exit
//! - `cadastre-server db preflight`: connectivity and privilege check

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, anyhow};
use cadastre_core::{
    application::AppUnitOfWork, database::PostgresDatabase,
    scoring::RandomScorer,
};
use cadastre_server::{
    infra::{
        config::{Config, ConfigLoad, ConfigLoader},
        startup::Services,
    },
    routes::create_router,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "cadastre-server")]
#[command(about = "Cadastral parcel scoring service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Path to a cadastre.toml configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Env file to load instead of `.env`, e.g. `.prod.env`
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Do not apply migrations on startup
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Check connectivity and CREATE privilege on `public`, then exit
    Preflight,
    /// Apply database migrations and exit (runs preflight first)
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Db(DbCommand::Preflight)) => {
            run_db_preflight(&cli.serve).await
        }
        Some(Command::Db(DbCommand::Migrate)) => {
            run_db_migrate(&cli.serve).await
        }
        Some(Command::Serve) | None => run_server(cli.serve).await,
    }
}

async fn run_db_preflight(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let pg = connect(&config)
        .await
        .context("failed to connect to PostgreSQL for preflight")?;
    pg.preflight().await.context("database preflight failed")?;
    info!("Database preflight passed");
    pg.close().await;
    Ok(())
}

async fn run_db_migrate(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let pg = connect(&config)
        .await
        .context("failed to connect to PostgreSQL for migration")?;
    pg.initialize_schema()
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    pg.close().await;
    Ok(())
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &args.env_file {
        loader = loader.with_env_file(path);
    }

    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    info!(
        scoring.min_delay_secs = config.scoring.min_delay_secs,
        scoring.max_delay_secs = config.scoring.max_delay_secs,
        scoring.max_concurrent_jobs = config.scoring.max_concurrent_jobs,
        scoring.queue_capacity = config.scoring.queue_capacity,
        "scoring configuration in effect"
    );

    Ok(config)
}

async fn connect(config: &Config) -> anyhow::Result<PostgresDatabase> {
    let Some(url) = config.database.url.as_deref() else {
        error!(
            "DATABASE_URL, or POSTGRES_HOST, POSTGRES_DB_NAME and POSTGRES_USER, must be provided"
        );
        return Err(anyhow!("No PostgreSQL connection configuration found"));
    };

    if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
        return Err(anyhow!(
            "Invalid database URL: must start with postgres:// or postgresql://"
        ));
    }

    info!(
        url = config.database.redacted_url().as_deref().unwrap_or_default(),
        "Connecting to PostgreSQL"
    );
    let pg = PostgresDatabase::new(url, &config.database.pool_settings())
        .await
        .map_err(|err| anyhow!("Database connection failed: {err}"))?;
    info!("Successfully connected to PostgreSQL");
    Ok(pg)
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(&args)?;
    let addr: SocketAddr = config
        .resolve_bind_address()
        .await
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;

    let postgres = Arc::new(connect(&config).await?);
    if args.skip_migrations {
        warn!("Skipping migrations; schema must already be up to date");
    } else {
        postgres
            .initialize_schema()
            .await
            .context("database migration failed")?;
    }

    let unit_of_work = AppUnitOfWork::from_postgres(postgres.clone())
        .map_err(|err| anyhow!("failed to build unit of work: {err}"))?;
    let scorer = Arc::new(
        RandomScorer::from_config(&config.scoring)
            .context("invalid scoring configuration")?,
    );

    let services = Services::start(config, unit_of_work, scorer);
    let router = create_router(services.state.clone());

    info!("Starting cadastre server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let make_service =
        router.into_make_service_with_connect_info::<SocketAddr>();
    let served = axum::serve(listener, make_service)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    services.shutdown().await;
    postgres.close().await;
    info!("Server stopped");

    served.context("server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
