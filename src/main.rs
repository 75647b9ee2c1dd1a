//! Daily Ops server - entity connection graph over HTTP
//!
//! Serves the link, rollup and record API backed by SQLite or PostgreSQL.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dailyops_api::{ApiServer, ApiServerConfig};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::prelude::*;

use crate::config::{redacted_database_url, ConfigManager, ServerConfig};

/// Daily Ops - connection graph server
#[derive(Parser, Debug)]
#[command(name = "dailyops")]
#[command(about = "Daily Ops - entity connection graph server")]
#[command(version = env!("DAILYOPS_GIT_TAG"))]
#[command(long_version = concat!(env!("DAILYOPS_GIT_TAG"), "\nCommit: ", env!("DAILYOPS_GIT_HASH"), "\nBuilt: ", env!("DAILYOPS_BUILD_TIME")))]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind (e.g., 127.0.0.1:8080)
        #[arg(long, env = "DAILYOPS_BIND")]
        bind: Option<SocketAddr>,

        /// Database URL (sqlite://... or postgres://...)
        #[arg(long, env = "DAILYOPS_DATABASE_URL")]
        database_url: Option<String>,

        /// Detail rows per rollup category
        #[arg(long, env = "DAILYOPS_ROLLUP_LIMIT")]
        rollup_limit: Option<u64>,

        /// Disable CORS
        #[arg(long)]
        no_cors: bool,

        /// Allowed CORS origin (repeatable); defaults to any localhost port
        #[arg(long = "cors-origin", env = "DAILYOPS_CORS_ORIGINS", value_delimiter = ',')]
        cors_origins: Vec<String>,
    },

    /// Apply database migrations and exit
    Migrate {
        /// Database URL (sqlite://... or postgres://...)
        #[arg(long, env = "DAILYOPS_DATABASE_URL")]
        database_url: Option<String>,
    },

    /// Manage the stored configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the stored configuration
    Show,
    /// Set the database URL
    SetDatabaseUrl {
        /// Database URL
        url: String,
    },
    /// Set the bind address
    SetBind {
        /// Address to bind
        addr: SocketAddr,
    },
    /// Restore the defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Serve {
            bind,
            database_url,
            rollup_limit,
            no_cors,
            cors_origins,
        } => {
            let mut config = ConfigManager::load()?;
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(url) = database_url {
                config.database_url = url;
            }
            if let Some(limit) = rollup_limit {
                config.rollup_detail_limit = limit;
            }
            if no_cors {
                config.enable_cors = false;
            }
            if !cors_origins.is_empty() {
                config.cors_origins = Some(cors_origins);
            }

            serve(config).await
        }
        Commands::Migrate { database_url } => {
            let config = ConfigManager::load()?;
            let url = database_url.unwrap_or(config.database_url);

            let db = dailyops_db::connect(&url)
                .await
                .context("Failed to connect to database")?;
            dailyops_db::migrate(&db)
                .await
                .context("Failed to run migrations")?;

            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    info!(
        "Connecting to database: {}",
        redacted_database_url(&config.database_url)
    );

    let db = dailyops_db::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    dailyops_db::migrate(&db)
        .await
        .context("Failed to run migrations")?;

    let api_config = ApiServerConfig {
        bind_addr: config.bind_addr,
        enable_cors: config.enable_cors,
        cors_origins: config.cors_origins,
        rollup_detail_limit: config.rollup_detail_limit,
    };

    ApiServer::new(api_config, db).start().await
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = ConfigManager::load()?;
            println!("# {}", ConfigManager::config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::SetDatabaseUrl { url } => {
            let mut config = ConfigManager::load()?;
            config.database_url = url;
            ConfigManager::save(&config)?;
            println!("✅ Database URL saved");
        }
        ConfigCommands::SetBind { addr } => {
            let mut config = ConfigManager::load()?;
            config.bind_addr = addr;
            ConfigManager::save(&config)?;
            println!("✅ Bind address saved");
        }
        ConfigCommands::Reset => {
            ConfigManager::save(&ServerConfig::default())?;
            println!("✅ Configuration reset to defaults");
        }
    }

    Ok(())
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
