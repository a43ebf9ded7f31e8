pub mod local;
pub mod remote;
pub mod summary;

pub use local::LocalBackend;
pub use remote::SshBackend;

use async_trait::async_trait;
use dockhand_models::{
    ComposeAction, Config, ContainerSummary, DockerHost, DockhandError, HostKind, ImageSummary,
    LogQuery,
};
use tokio::sync::mpsc;
use tracing::instrument;

/// Resolved log fetch parameters: `tail` is "all" or a line count.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFetch {
    pub tail: String,
    pub since: Option<String>,
    pub until: Option<String>,
}

impl LogFetch {
    pub fn from_query(query: &LogQuery, default_tail: u32) -> Self {
        let tail = query
            .tail
            .clone()
            .unwrap_or_else(|| default_tail.to_string());
        let tail = if tail == "all" || tail.parse::<u32>().is_ok() {
            tail
        } else {
            "all".to_string()
        };
        Self {
            tail,
            since: query.since.clone(),
            until: query.until.clone(),
        }
    }
}

/// One registered host's engine, local socket or SSH.
#[async_trait]
pub trait HostBackend: Send + Sync {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DockhandError>;
    async fn list_images(&self) -> Result<Vec<ImageSummary>, DockhandError>;
    async fn start_container(&self, container_id: &str) -> Result<(), DockhandError>;
    async fn stop_container(&self, container_id: &str) -> Result<(), DockhandError>;
    async fn restart_container(&self, container_id: &str) -> Result<(), DockhandError>;
    async fn fetch_logs(&self, container_id: &str, fetch: &LogFetch)
        -> Result<String, DockhandError>;
    async fn follow_logs(
        &self,
        container_id: &str,
        tail: &str,
    ) -> Result<mpsc::Receiver<String>, DockhandError>;
    async fn remove_image(&self, image_id: &str) -> Result<(), DockhandError>;
    async fn compose(&self, path: &str, action: ComposeAction) -> Result<String, DockhandError>;
}

/// Facade dispatching every operation to the right backend for a host.
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn backend(&self, host: &DockerHost) -> Result<Box<dyn HostBackend>, DockhandError> {
        match host.kind {
            HostKind::Local => Ok(Box::new(LocalBackend::connect(
                &self.config.docker,
                &host.name,
            )?)),
            HostKind::Ssh => Ok(Box::new(SshBackend::new(host.clone()))),
        }
    }

    #[instrument(skip(self, host), fields(host = %host.name))]
    pub async fn list_containers(
        &self,
        host: &DockerHost,
    ) -> Result<Vec<ContainerSummary>, DockhandError> {
        self.backend(host)?.list_containers().await
    }

    #[instrument(skip(self, host), fields(host = %host.name))]
    pub async fn list_images(&self, host: &DockerHost) -> Result<Vec<ImageSummary>, DockhandError> {
        self.backend(host)?.list_images().await
    }

    #[instrument(skip(self, host), fields(host = %host.name))]
    pub async fn start_container(
        &self,
        host: &DockerHost,
        container_id: &str,
    ) -> Result<(), DockhandError> {
        self.backend(host)?.start_container(container_id).await
    }

    #[instrument(skip(self, host), fields(host = %host.name))]
    pub async fn stop_container(
        &self,
        host: &DockerHost,
        container_id: &str,
    ) -> Result<(), DockhandError> {
        self.backend(host)?.stop_container(container_id).await
    }

    #[instrument(skip(self, host), fields(host = %host.name))]
    pub async fn restart_container(
        &self,
        host: &DockerHost,
        container_id: &str,
    ) -> Result<(), DockhandError> {
        self.backend(host)?.restart_container(container_id).await
    }

    /// Fetch logs and apply the optional search filter.
    #[instrument(skip(self, host, query), fields(host = %host.name))]
    pub async fn fetch_logs(
        &self,
        host: &DockerHost,
        container_id: &str,
        query: &LogQuery,
    ) -> Result<String, DockhandError> {
        let fetch = LogFetch::from_query(query, self.config.logs.default_tail);
        let logs = self.backend(host)?.fetch_logs(container_id, &fetch).await?;
        match query.search.as_deref() {
            Some(needle) if !needle.is_empty() => Ok(summary::filter_lines(&logs, needle)),
            _ => Ok(logs),
        }
    }

    /// Follow-mode log stream, line chunks until the stream or the client ends.
    #[instrument(skip(self, host), fields(host = %host.name))]
    pub async fn follow_logs(
        &self,
        host: &DockerHost,
        container_id: &str,
        tail: &str,
    ) -> Result<mpsc::Receiver<String>, DockhandError> {
        let tail = if tail == "all" || tail.parse::<u32>().is_ok() {
            tail
        } else {
            "all"
        };
        self.backend(host)?.follow_logs(container_id, tail).await
    }

    #[instrument(skip(self, host), fields(host = %host.name))]
    pub async fn remove_image(
        &self,
        host: &DockerHost,
        image_id: &str,
    ) -> Result<(), DockhandError> {
        self.backend(host)?.remove_image(image_id).await
    }

    #[instrument(skip(self, host), fields(host = %host.name))]
    pub async fn compose(
        &self,
        host: &DockerHost,
        path: &str,
        action: ComposeAction,
    ) -> Result<String, DockhandError> {
        self.backend(host)?.compose(path, action).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_fetch_defaults_tail_from_config() {
        let fetch = LogFetch::from_query(&LogQuery::default(), 1000);
        assert_eq!(fetch.tail, "1000");
        assert_eq!(fetch.since, None);
    }

    #[test]
    fn log_fetch_keeps_all_and_counts() {
        let query = LogQuery {
            tail: Some("all".to_string()),
            ..Default::default()
        };
        assert_eq!(LogFetch::from_query(&query, 1000).tail, "all");

        let query = LogQuery {
            tail: Some("250".to_string()),
            ..Default::default()
        };
        assert_eq!(LogFetch::from_query(&query, 1000).tail, "250");
    }

    #[test]
    fn log_fetch_degrades_bad_tail_to_all() {
        let query = LogQuery {
            tail: Some("not-a-number".to_string()),
            ..Default::default()
        };
        assert_eq!(LogFetch::from_query(&query, 1000).tail, "all");
    }
}
