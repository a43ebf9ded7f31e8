use crate::error::DockhandError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Uniform view of a container regardless of which backend reported it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerSummary {
    /// Short (12 character) container id.
    pub id: String,
    pub name: String,
    pub image: String,
    /// Lowercase engine state, e.g. "running" or "exited".
    pub state: String,
    /// Human status line, e.g. "Up 2 hours".
    pub status: String,
    pub ports: String,
    pub created: String,
    /// Name of the registered host this container lives on.
    pub host: String,
    /// Compose project working directory, when labeled.
    pub compose_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSummary {
    pub id: String,
    pub tag: String,
    pub created: String,
    pub size: String,
}

/// Container listing across every registered host. Per-host failures are
/// reported alongside the rows that could be fetched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FleetResponse {
    pub containers: Vec<ContainerSummary>,
    pub errors: Vec<String>,
}

/// Log fetch parameters. `tail` accepts "all" or a line count; anything
/// unparseable degrades to "all".
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogQuery {
    pub tail: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub download: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComposeAction {
    Up,
    Down,
}

impl fmt::Display for ComposeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeAction::Up => f.write_str("up"),
            ComposeAction::Down => f.write_str("down"),
        }
    }
}

impl FromStr for ComposeAction {
    type Err = DockhandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(ComposeAction::Up),
            "down" => Ok(ComposeAction::Down),
            other => Err(DockhandError::InvalidComposeAction {
                action: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposeRequest {
    pub host: String,
    pub path: String,
    pub action: ComposeAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeResponse {
    pub status: String,
    pub output: String,
}
