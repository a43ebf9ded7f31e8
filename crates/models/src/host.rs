use crate::error::DockhandError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a registered host's engine is reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    Local,
    Ssh,
}

impl HostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostKind::Local => "local",
            HostKind::Ssh => "ssh",
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostKind {
    type Err = DockhandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(HostKind::Local),
            "ssh" => Ok(HostKind::Ssh),
            other => Err(DockhandError::UnknownHostKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// A registered Docker engine endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerHost {
    pub host_id: i64,
    pub name: String,
    pub kind: HostKind,
    pub addr: Option<String>,
    pub port: Option<u16>,
    pub ssh_user: Option<String>,
    #[serde(skip_serializing)]
    pub ssh_password: Option<String>,
    pub ssh_key_path: Option<String>,
}

impl DockerHost {
    /// Address:port pair for SSH hosts, defaulting the port to 22.
    pub fn ssh_endpoint(&self) -> Option<(String, u16)> {
        let addr = self.addr.clone()?;
        Some((addr, self.port.unwrap_or(22)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateHostRequest {
    pub name: String,
    pub kind: HostKind,
    pub addr: Option<String>,
    pub port: Option<u16>,
    pub ssh_user: Option<String>,
    pub ssh_password: Option<String>,
    pub ssh_key_path: Option<String>,
}

impl CreateHostRequest {
    /// SSH hosts need an address and a user before they can be dialed.
    pub fn validate(&self) -> Result<(), DockhandError> {
        if self.name.trim().is_empty() {
            return Err(DockhandError::InvalidHostName {
                name: self.name.clone(),
            });
        }
        if self.kind == HostKind::Ssh {
            if self.addr.as_deref().map_or(true, |a| a.trim().is_empty()) {
                return Err(DockhandError::InvalidHostConfig {
                    reason: "ssh hosts require an address".to_string(),
                });
            }
            if self.ssh_user.as_deref().map_or(true, |u| u.trim().is_empty()) {
                return Err(DockhandError::InvalidHostConfig {
                    reason: "ssh hosts require a user".to_string(),
                });
            }
        }
        Ok(())
    }
}
