use sqlx::{Pool, Sqlite};
use tracing::info;

/// Embedded migration scripts
const MIGRATION_001_USERS: &str = include_str!("../migrations/001_users.sql");
const MIGRATION_002_DOCKER_HOSTS: &str = include_str!("../migrations/002_docker_hosts.sql");

/// Run all embedded migrations
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    info!("Running migration 001: Users");
    sqlx::query(MIGRATION_001_USERS).execute(pool).await?;

    info!("Running migration 002: Docker hosts");
    sqlx::query(MIGRATION_002_DOCKER_HOSTS).execute(pool).await?;

    info!("All migrations completed successfully");
    Ok(())
}
