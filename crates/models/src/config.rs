use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub auth: AuthConfig,
    pub docker: DockerConfig,
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub dir: String,
    pub db_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub secret_key: String,
    pub token_ttl_minutes: i64,
    pub admin_user: String,
    pub admin_pass: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DockerConfig {
    /// Local engine endpoint. Empty means platform socket defaults.
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LogsConfig {
    pub default_tail: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 8000,
            },
            data: DataConfig {
                dir: "data".to_string(),
                db_url: "sqlite://data/dockhand.db".to_string(),
            },
            auth: AuthConfig {
                secret_key: "supersecretkeychangeinproduction".to_string(),
                token_ttl_minutes: 60 * 24,
                admin_user: "admin".to_string(),
                admin_pass: "admin".to_string(),
            },
            docker: DockerConfig {
                host: "".to_string(),
            },
            logs: LogsConfig { default_tail: 1000 },
        }
    }
}

impl Config {
    /// Apply environment overrides for secrets that should not live in the
    /// config file on shared machines.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var("SECRET_KEY") {
            self.auth.secret_key = secret;
        }
        if let Ok(user) = std::env::var("ADMIN_USER") {
            self.auth.admin_user = user;
        }
        if let Ok(pass) = std::env::var("ADMIN_PASS") {
            self.auth.admin_pass = pass;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.data.db_url = url;
        }
        self
    }
}
