use crate::summary::{self, CliContainerRow, CliImageRow};
use crate::{HostBackend, LogFetch};
use async_trait::async_trait;
use dockhand_models::{
    ComposeAction, ContainerSummary, DockerHost, DockhandError, ImageSummary,
};
use ssh2::Session;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine reached by running the Docker CLI over an SSH session.
///
/// libssh2 I/O is blocking, so every operation dials and runs inside
/// `spawn_blocking`, one session per operation.
pub struct SshBackend {
    host: DockerHost,
}

#[derive(Debug)]
struct ExecOutput {
    status: i32,
    stdout: String,
    stderr: String,
}

fn ssh_err(e: impl ToString) -> DockhandError {
    DockhandError::SshError {
        message: e.to_string(),
    }
}

/// Single-quote a value for the remote shell.
pub fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn connect(host: &DockerHost) -> Result<Session, DockhandError> {
    let (addr, port) = host
        .ssh_endpoint()
        .ok_or_else(|| DockhandError::InvalidHostConfig {
            reason: format!("host {} has no address", host.name),
        })?;
    let user = host
        .ssh_user
        .as_deref()
        .ok_or_else(|| DockhandError::InvalidHostConfig {
            reason: format!("host {} has no ssh user", host.name),
        })?;

    let sock_addr = (addr.as_str(), port)
        .to_socket_addrs()
        .map_err(ssh_err)?
        .next()
        .ok_or_else(|| DockhandError::SshError {
            message: format!("could not resolve {}", addr),
        })?;
    let tcp = TcpStream::connect_timeout(&sock_addr, CONNECT_TIMEOUT).map_err(ssh_err)?;
    let mut session = Session::new().map_err(ssh_err)?;
    session.set_tcp_stream(tcp);
    session.handshake().map_err(ssh_err)?;

    if let Some(password) = host.ssh_password.as_deref() {
        session.userauth_password(user, password).map_err(ssh_err)?;
    } else if let Some(key_path) = host.ssh_key_path.as_deref() {
        session
            .userauth_pubkey_file(user, None, std::path::Path::new(key_path), None)
            .map_err(ssh_err)?;
    } else {
        return Err(DockhandError::InvalidHostConfig {
            reason: format!("host {} has neither a password nor a key path", host.name),
        });
    }

    Ok(session)
}

fn exec(session: &Session, command: &str) -> Result<ExecOutput, DockhandError> {
    let mut channel = session.channel_session().map_err(ssh_err)?;
    channel.exec(command).map_err(ssh_err)?;

    let mut stdout = Vec::new();
    channel.read_to_end(&mut stdout).map_err(ssh_err)?;
    let mut stderr = Vec::new();
    channel
        .stderr()
        .read_to_end(&mut stderr)
        .map_err(ssh_err)?;

    channel.wait_close().map_err(ssh_err)?;
    let status = channel.exit_status().map_err(ssh_err)?;

    Ok(ExecOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).to_string(),
        stderr: String::from_utf8_lossy(&stderr).to_string(),
    })
}

pub fn logs_command(container_id: &str, fetch: &LogFetch) -> String {
    let mut command = format!("docker logs --tail {}", fetch.tail);
    if let Some(since) = &fetch.since {
        command.push_str(&format!(" --since {}", sh_quote(since)));
    }
    if let Some(until) = &fetch.until {
        command.push_str(&format!(" --until {}", sh_quote(until)));
    }
    command.push(' ');
    command.push_str(&sh_quote(container_id));
    command
}

pub fn compose_command(path: &str, action: ComposeAction) -> String {
    let action_args = match action {
        ComposeAction::Up => "up -d",
        ComposeAction::Down => "down",
    };
    format!("cd {} && docker compose {}", sh_quote(path), action_args)
}

impl SshBackend {
    pub fn new(host: DockerHost) -> Self {
        Self { host }
    }

    async fn run(&self, command: String) -> Result<ExecOutput, DockhandError> {
        let host = self.host.clone();
        tokio::task::spawn_blocking(move || {
            let session = connect(&host)?;
            exec(&session, &command)
        })
        .await
        .map_err(|e| DockhandError::InternalError {
            reason: e.to_string(),
        })?
    }

    /// Run a docker CLI command, mapping non-zero exit to an engine error.
    async fn run_docker(&self, command: String) -> Result<ExecOutput, DockhandError> {
        let output = self.run(command).await?;
        if output.status != 0 {
            return Err(DockhandError::DockerError {
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl HostBackend for SshBackend {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DockhandError> {
        let output = self
            .run_docker("docker ps -a --format '{{json .}}'".to_string())
            .await?;

        let mut containers = Vec::new();
        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<CliContainerRow>(line) {
                Ok(row) => containers.push(summary::summary_from_cli(&self.host.name, row)),
                Err(e) => warn!("Skipping unparseable ps row from {}: {}", self.host.name, e),
            }
        }
        Ok(containers)
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>, DockhandError> {
        let output = self
            .run_docker("docker images --format '{{json .}}'".to_string())
            .await?;

        let mut images = Vec::new();
        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<CliImageRow>(line) {
                Ok(row) => images.push(summary::image_from_cli(row)),
                Err(e) => warn!(
                    "Skipping unparseable image row from {}: {}",
                    self.host.name, e
                ),
            }
        }
        Ok(images)
    }

    async fn start_container(&self, container_id: &str) -> Result<(), DockhandError> {
        self.run_docker(format!("docker start {}", sh_quote(container_id)))
            .await?;
        info!("Started container {} on {}", container_id, self.host.name);
        Ok(())
    }

    async fn stop_container(&self, container_id: &str) -> Result<(), DockhandError> {
        self.run_docker(format!("docker stop {}", sh_quote(container_id)))
            .await?;
        info!("Stopped container {} on {}", container_id, self.host.name);
        Ok(())
    }

    async fn restart_container(&self, container_id: &str) -> Result<(), DockhandError> {
        self.run_docker(format!("docker restart {}", sh_quote(container_id)))
            .await?;
        info!("Restarted container {} on {}", container_id, self.host.name);
        Ok(())
    }

    async fn fetch_logs(
        &self,
        container_id: &str,
        fetch: &LogFetch,
    ) -> Result<String, DockhandError> {
        let output = self.run_docker(logs_command(container_id, fetch)).await?;
        // The engine writes application logs to both streams.
        Ok(output.stdout + &output.stderr)
    }

    async fn follow_logs(
        &self,
        container_id: &str,
        tail: &str,
    ) -> Result<mpsc::Receiver<String>, DockhandError> {
        let host = self.host.clone();
        let command = format!(
            "docker logs -f --tail {} {} 2>&1",
            tail,
            sh_quote(container_id)
        );
        let (tx, rx) = mpsc::channel(64);

        tokio::task::spawn_blocking(move || {
            let session = match connect(&host) {
                Ok(s) => s,
                Err(e) => {
                    let _ = tx.blocking_send(format!("{}\n", e));
                    return;
                }
            };
            let mut channel = match session
                .channel_session()
                .and_then(|mut ch| ch.exec(&command).map(|_| ch))
            {
                Ok(ch) => ch,
                Err(e) => {
                    let _ = tx.blocking_send(format!("ssh exec failed: {}\n", e));
                    return;
                }
            };

            let mut buf = [0u8; 4096];
            loop {
                match channel.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let text = String::from_utf8_lossy(&buf[..n]).to_string();
                        if tx.blocking_send(text).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = channel.close();
        });

        Ok(rx)
    }

    async fn remove_image(&self, image_id: &str) -> Result<(), DockhandError> {
        self.run_docker(format!("docker rmi {}", sh_quote(image_id)))
            .await?;
        info!("Removed image {} on {}", image_id, self.host.name);
        Ok(())
    }

    async fn compose(&self, path: &str, action: ComposeAction) -> Result<String, DockhandError> {
        let output = self.run(compose_command(path, action)).await?;
        if output.status != 0 {
            return Err(DockhandError::ComposeFailed {
                output: output.stderr.trim().to_string(),
            });
        }
        info!("Compose {} succeeded in {} on {}", action, path, self.host.name);
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_wraps_and_escapes() {
        assert_eq!(sh_quote("/srv/app"), "'/srv/app'");
        assert_eq!(sh_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn logs_command_includes_bounds() {
        let fetch = LogFetch {
            tail: "200".to_string(),
            since: Some("5m".to_string()),
            until: None,
        };
        assert_eq!(
            logs_command("abc123", &fetch),
            "docker logs --tail 200 --since '5m' 'abc123'"
        );
    }

    #[test]
    fn compose_command_quotes_path() {
        assert_eq!(
            compose_command("/srv/my stack", ComposeAction::Up),
            "cd '/srv/my stack' && docker compose up -d"
        );
        assert_eq!(
            compose_command("/srv/app", ComposeAction::Down),
            "cd '/srv/app' && docker compose down"
        );
    }
}
