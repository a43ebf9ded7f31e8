use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire shape for every error response the API emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub detail: String,
    pub error_type: String,
}

#[derive(Error, Debug)]
pub enum DockhandError {
    #[error("Host not found: {name}")]
    HostNotFound { name: String },

    #[error("Host already exists: {name}")]
    HostAlreadyExists { name: String },

    #[error("Invalid host name: {name}")]
    InvalidHostName { name: String },

    #[error("Invalid host configuration: {reason}")]
    InvalidHostConfig { reason: String },

    #[error("Unknown host kind: {kind}")]
    UnknownHostKind { kind: String },

    #[error("Docker error: {message}")]
    DockerError { message: String },

    #[error("SSH error: {message}")]
    SshError { message: String },

    #[error("Compose failed: {output}")]
    ComposeFailed { output: String },

    #[error("Invalid compose action: {action}")]
    InvalidComposeAction { action: String },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Database error: {reason}")]
    DatabaseError { reason: String },

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Internal server error: {reason}")]
    InternalError { reason: String },
}

impl DockhandError {
    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            detail: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            DockhandError::HostNotFound { .. } => "HostNotFound",
            DockhandError::HostAlreadyExists { .. } => "HostConflict",
            DockhandError::InvalidHostName { .. } => "InvalidParameterValue",
            DockhandError::InvalidHostConfig { .. } => "InvalidParameterValue",
            DockhandError::UnknownHostKind { .. } => "InvalidParameterValue",
            DockhandError::DockerError { .. } => "DockerError",
            DockhandError::SshError { .. } => "SshError",
            DockhandError::ComposeFailed { .. } => "ComposeFailed",
            DockhandError::InvalidComposeAction { .. } => "InvalidParameterValue",
            DockhandError::NotAuthenticated => "NotAuthenticated",
            DockhandError::InvalidCredentials => "InvalidCredentials",
            DockhandError::InvalidToken => "InvalidToken",
            DockhandError::InvalidRequest { .. } => "InvalidParameterValue",
            DockhandError::DatabaseError { .. } => "DatabaseError",
            DockhandError::SqlxError(_) => "DatabaseError",
            DockhandError::ConfigError { .. } => "ConfigError",
            DockhandError::InternalError { .. } => "InternalError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            DockhandError::HostNotFound { .. } => 404,
            DockhandError::HostAlreadyExists { .. } => 409,
            DockhandError::InvalidHostName { .. } => 400,
            DockhandError::InvalidHostConfig { .. } => 400,
            DockhandError::UnknownHostKind { .. } => 400,
            DockhandError::DockerError { .. } => 502,
            DockhandError::SshError { .. } => 502,
            DockhandError::ComposeFailed { .. } => 500,
            DockhandError::InvalidComposeAction { .. } => 400,
            DockhandError::NotAuthenticated => 401,
            DockhandError::InvalidCredentials => 401,
            DockhandError::InvalidToken => 401,
            DockhandError::InvalidRequest { .. } => 400,
            DockhandError::DatabaseError { .. } => 500,
            DockhandError::SqlxError(_) => 500,
            DockhandError::ConfigError { .. } => 500,
            DockhandError::InternalError { .. } => 500,
        }
    }
}
