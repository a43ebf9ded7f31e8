use dockhand_models::{CreateHostRequest, DockerHost, DockhandError, HostKind};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{info, instrument};

/// SQLite-backed registry of Docker hosts.
#[derive(Clone)]
pub struct HostRegistry {
    pool: SqlitePool,
}

fn host_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<DockerHost, DockhandError> {
    let kind: String = row.get("kind");
    Ok(DockerHost {
        host_id: row.get("host_id"),
        name: row.get("name"),
        kind: HostKind::from_str(&kind)?,
        addr: row.get("addr"),
        port: row.get::<Option<i64>, _>("port").map(|p| p as u16),
        ssh_user: row.get("ssh_user"),
        ssh_password: row.get("ssh_password"),
        ssh_key_path: row.get("ssh_key_path"),
    })
}

impl HostRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_host(
        &self,
        request: CreateHostRequest,
    ) -> Result<DockerHost, DockhandError> {
        request.validate()?;

        if self.host_exists(&request.name).await? {
            return Err(DockhandError::HostAlreadyExists {
                name: request.name,
            });
        }

        let result = sqlx::query(
            r#"
            INSERT INTO docker_hosts (name, kind, addr, port, ssh_user, ssh_password, ssh_key_path)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.name)
        .bind(request.kind.as_str())
        .bind(&request.addr)
        .bind(request.port.map(|p| p as i64))
        .bind(&request.ssh_user)
        .bind(&request.ssh_password)
        .bind(&request.ssh_key_path)
        .execute(&self.pool)
        .await?;

        info!("Registered host: {}", request.name);

        Ok(DockerHost {
            host_id: result.last_insert_rowid(),
            name: request.name,
            kind: request.kind,
            addr: request.addr,
            port: request.port,
            ssh_user: request.ssh_user,
            ssh_password: request.ssh_password,
            ssh_key_path: request.ssh_key_path,
        })
    }

    pub async fn get_host(&self, name: &str) -> Result<DockerHost, DockhandError> {
        let row = sqlx::query("SELECT * FROM docker_hosts WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => host_from_row(&row),
            None => Err(DockhandError::HostNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub async fn list_hosts(&self) -> Result<Vec<DockerHost>, DockhandError> {
        let rows = sqlx::query("SELECT * FROM docker_hosts ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(host_from_row).collect()
    }

    #[instrument(skip(self))]
    pub async fn delete_host(&self, host_id: i64) -> Result<(), DockhandError> {
        let result = sqlx::query("DELETE FROM docker_hosts WHERE host_id = ?")
            .bind(host_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DockhandError::HostNotFound {
                name: host_id.to_string(),
            });
        }

        info!("Deleted host: {}", host_id);
        Ok(())
    }

    async fn host_exists(&self, name: &str) -> Result<bool, DockhandError> {
        let row = sqlx::query("SELECT 1 FROM docker_hosts WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
