use anyhow::Result;
use dockhand_api::{create_router, AppState};
use dockhand_control::{run_migrations, HostRegistry, UserStore};
use dockhand_engine::Engine;
use dockhand_models::{Config, CreateHostRequest, HostKind};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Single-connection in-memory database with the schema applied.
pub async fn memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// App state over an in-memory database, with the default admin created.
pub async fn test_state() -> Result<AppState> {
    let pool = memory_pool().await?;
    let config = Config::default();

    let users = UserStore::new(pool.clone());
    users
        .ensure_admin(&config.auth.admin_user, &config.auth.admin_pass)
        .await?;

    Ok(AppState {
        config: config.clone(),
        registry: HostRegistry::new(pool),
        users,
        engine: Arc::new(Engine::new(config)),
    })
}

/// A running server on an ephemeral loopback port.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
}

/// Serve the full router on 127.0.0.1:0 and return its base URL. The server
/// task dies with the test runtime.
pub async fn spawn_app() -> Result<TestServer> {
    let state = test_state().await?;
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        state,
    })
}

pub fn sample_local_host(name: &str) -> CreateHostRequest {
    CreateHostRequest {
        name: name.to_string(),
        kind: HostKind::Local,
        addr: None,
        port: None,
        ssh_user: None,
        ssh_password: None,
        ssh_key_path: None,
    }
}

pub fn sample_ssh_host(name: &str, addr: &str, port: u16) -> CreateHostRequest {
    CreateHostRequest {
        name: name.to_string(),
        kind: HostKind::Ssh,
        addr: Some(addr.to_string()),
        port: Some(port),
        ssh_user: Some("deploy".to_string()),
        ssh_password: Some("s3cret".to_string()),
        ssh_key_path: None,
    }
}
