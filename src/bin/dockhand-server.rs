use anyhow::Result;
use dockhand_api::AppState;
use dockhand_control::{run_migrations, HostRegistry, UserStore};
use dockhand_engine::Engine;
use dockhand_models::Config;
use sqlx::SqlitePool;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let config_paths = ["configs/default.toml", "config/config.toml"];

    for path in &config_paths {
        if Path::new(path).exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            return Ok(config);
        }
    }

    Err("No config file found".into())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().init();

    info!("Starting Dockhand server");

    // Load configuration from file or use defaults
    let config = load_config().unwrap_or_else(|e| {
        warn!("Failed to load config file: {}, using defaults", e);
        Config::default()
    });
    let config = config.with_env_overrides();

    // Ensure data directory and DB file exist when using SQLite
    if !config.data.dir.is_empty() {
        let _ = fs::create_dir_all(&config.data.dir);
    }

    let db_path = config
        .data
        .db_url
        .strip_prefix("sqlite://")
        .or_else(|| config.data.db_url.strip_prefix("sqlite:"));

    if let Some(db_path) = db_path {
        if let Some(parent) = Path::new(db_path).parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create DB parent directory {:?}: {}", parent, e);
            }
        }
        if !Path::new(db_path).exists() {
            match fs::File::create(db_path) {
                Ok(_) => info!("Created database file: {}", db_path),
                Err(e) => warn!("Failed to create database file {:?}: {}", db_path, e),
            }
        }
    }

    // Initialize database pool and schema
    let pool = SqlitePool::connect(&config.data.db_url).await?;
    info!("Database connected");

    run_migrations(&pool).await?;

    // Bootstrap the admin user
    let users = UserStore::new(pool.clone());
    users
        .ensure_admin(&config.auth.admin_user, &config.auth.admin_pass)
        .await?;

    let registry = HostRegistry::new(pool);
    let engine = Arc::new(Engine::new(config.clone()));
    let state = AppState::new(config.clone(), registry, users, engine);

    let bind = config.server.bind.clone();
    let port = config.server.port;

    // The API server is the container's foreground process: a bind failure
    // must end the process with a non-zero exit.
    tokio::select! {
        result = dockhand_api::start_server(bind, port, state) => {
            if let Err(e) = result {
                anyhow::bail!("API server error: {}", e);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Dockhand server shutdown complete");
    Ok(())
}
