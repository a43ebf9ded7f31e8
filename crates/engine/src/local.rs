use crate::summary::{self, parse_time_bound};
use crate::{HostBackend, LogFetch};
use async_trait::async_trait;
use bollard::container::{
    ListContainersOptions, LogsOptions, RestartContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use bollard::image::{ListImagesOptions, RemoveImageOptions};
use bollard::Docker;
use chrono::Utc;
use dockhand_models::{
    ComposeAction, ContainerSummary, DockerConfig, DockhandError, ImageSummary,
};
use futures_util::StreamExt;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{error, info};

const STOP_GRACE_SECS: i64 = 10;

/// Engine reached over the local socket (or a configured HTTP endpoint).
pub struct LocalBackend {
    docker: Docker,
    host_name: String,
}

impl LocalBackend {
    pub fn connect(config: &DockerConfig, host_name: &str) -> Result<Self, DockhandError> {
        let docker = if config.host.is_empty() {
            Docker::connect_with_socket_defaults()
        } else {
            Docker::connect_with_http(&config.host, 120, bollard::API_DEFAULT_VERSION)
        }
        .map_err(|e| DockhandError::DockerError {
            message: e.to_string(),
        })?;

        Ok(Self {
            docker,
            host_name: host_name.to_string(),
        })
    }
}

#[async_trait]
impl HostBackend for LocalBackend {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DockhandError> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| DockhandError::DockerError {
                message: e.to_string(),
            })?;

        Ok(containers
            .into_iter()
            .map(|c| summary::summary_from_api(&self.host_name, c))
            .collect())
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>, DockhandError> {
        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String>::default()))
            .await
            .map_err(|e| DockhandError::DockerError {
                message: e.to_string(),
            })?;

        Ok(images.into_iter().flat_map(summary::images_from_api).collect())
    }

    async fn start_container(&self, container_id: &str) -> Result<(), DockhandError> {
        self.docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| DockhandError::DockerError {
                message: e.to_string(),
            })?;

        info!("Started container: {}", container_id);
        Ok(())
    }

    async fn stop_container(&self, container_id: &str) -> Result<(), DockhandError> {
        let options = StopContainerOptions { t: STOP_GRACE_SECS };

        self.docker
            .stop_container(container_id, Some(options))
            .await
            .map_err(|e| DockhandError::DockerError {
                message: e.to_string(),
            })?;

        info!("Stopped container: {}", container_id);
        Ok(())
    }

    async fn restart_container(&self, container_id: &str) -> Result<(), DockhandError> {
        let options = RestartContainerOptions {
            t: STOP_GRACE_SECS as isize,
        };

        self.docker
            .restart_container(container_id, Some(options))
            .await
            .map_err(|e| DockhandError::DockerError {
                message: e.to_string(),
            })?;

        info!("Restarted container: {}", container_id);
        Ok(())
    }

    async fn fetch_logs(
        &self,
        container_id: &str,
        fetch: &LogFetch,
    ) -> Result<String, DockhandError> {
        let mut options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: fetch.tail.clone(),
            ..Default::default()
        };
        let now = Utc::now();
        if let Some(since) = &fetch.since {
            options.since = parse_time_bound(since, now)?;
        }
        if let Some(until) = &fetch.until {
            options.until = parse_time_bound(until, now)?;
        }

        let mut stream = self.docker.logs(container_id, Some(options));
        let mut logs = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(output) => logs.push_str(&String::from_utf8_lossy(&output.into_bytes())),
                Err(e) => {
                    error!("Error reading container logs: {}", e);
                    return Err(DockhandError::DockerError {
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(logs)
    }

    async fn follow_logs(
        &self,
        container_id: &str,
        tail: &str,
    ) -> Result<mpsc::Receiver<String>, DockhandError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: true,
            tail: tail.to_string(),
            ..Default::default()
        };

        let docker = self.docker.clone();
        let container_id = container_id.to_string();
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut stream = docker.logs(&container_id, Some(options));
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(output) => {
                        let text = String::from_utf8_lossy(&output.into_bytes()).to_string();
                        if tx.send(text).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(format!("log stream error: {}\n", e)).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn remove_image(&self, image_id: &str) -> Result<(), DockhandError> {
        // Unforced so an image still backing a container is refused.
        let options = RemoveImageOptions {
            force: false,
            noprune: false,
        };

        self.docker
            .remove_image(image_id, Some(options), None)
            .await
            .map_err(|e| DockhandError::DockerError {
                message: e.to_string(),
            })?;

        info!("Removed image: {}", image_id);
        Ok(())
    }

    async fn compose(&self, path: &str, action: ComposeAction) -> Result<String, DockhandError> {
        let args: &[&str] = match action {
            ComposeAction::Up => &["compose", "up", "-d"],
            ComposeAction::Down => &["compose", "down"],
        };

        let output = Command::new("docker")
            .args(args)
            .current_dir(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DockhandError::ComposeFailed {
                output: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Compose {} failed in {}: {}", action, path, stderr);
            return Err(DockhandError::ComposeFailed {
                output: stderr.to_string(),
            });
        }

        info!("Compose {} succeeded in {}", action, path);
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
