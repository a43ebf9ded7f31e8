use bollard::models::{ContainerSummary as ApiContainer, ImageSummary as ApiImage, Port};
use chrono::{DateTime, Duration, Utc};
use dockhand_models::{ContainerSummary, DockhandError, ImageSummary};
use serde::Deserialize;
use std::collections::HashMap;

/// Compose sets this label to the project directory the stack was started
/// from; the dashboard uses it to offer compose actions on the right path.
pub const COMPOSE_WORKDIR_LABEL: &str = "com.docker.compose.project.working_dir";

/// One line of `docker ps --format '{{json .}}'` output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CliContainerRow {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default)]
    pub names: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ports: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub labels: String,
}

/// One line of `docker images --format '{{json .}}'` output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CliImageRow {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub size: String,
}

pub fn short_id(id: &str) -> String {
    id.chars().take(12).collect()
}

/// Normalize engine timestamps ("2023-01-01T10:00:00Z",
/// "2023-01-01 10:00:00 +0000 UTC") to "YYYY-MM-DD HH:MM:SS".
pub fn clean_created(raw: &str) -> String {
    if raw.is_empty() {
        return "Unknown".to_string();
    }
    raw.replace('T', " ").chars().take(19).collect()
}

pub fn format_unix_created(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Unknown".to_string(),
    }
}

/// "8080->80/tcp, 443/tcp" from the engine API port list.
pub fn format_api_ports(ports: &[Port]) -> String {
    let mut parts = Vec::new();
    for p in ports {
        let proto = p
            .typ
            .map(|t| t.to_string())
            .unwrap_or_else(|| "tcp".to_string());
        match p.public_port {
            Some(public) => parts.push(format!("{}->{}/{}", public, p.private_port, proto)),
            None => parts.push(format!("{}/{}", p.private_port, proto)),
        }
    }
    parts.join(", ")
}

/// `docker ps` renders labels as "key=value,key2=value2".
pub fn parse_label_string(raw: &str) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    for part in raw.split(',') {
        if let Some((k, v)) = part.split_once('=') {
            labels.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    labels
}

pub fn compose_path(labels: &HashMap<String, String>) -> String {
    labels.get(COMPOSE_WORKDIR_LABEL).cloned().unwrap_or_default()
}

pub fn summary_from_api(host_name: &str, c: ApiContainer) -> ContainerSummary {
    let name = c
        .names
        .as_deref()
        .and_then(|names| names.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let labels = c.labels.unwrap_or_default();

    ContainerSummary {
        id: short_id(c.id.as_deref().unwrap_or_default()),
        name,
        image: c.image.unwrap_or_else(|| "Unknown".to_string()),
        state: c
            .state
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| "unknown".to_string()),
        status: c.status.unwrap_or_else(|| "Unknown".to_string()),
        ports: c
            .ports
            .as_deref()
            .map(format_api_ports)
            .unwrap_or_default(),
        created: c
            .created
            .map(format_unix_created)
            .unwrap_or_else(|| "Unknown".to_string()),
        host: host_name.to_string(),
        compose_path: compose_path(&labels),
    }
}

pub fn summary_from_cli(host_name: &str, row: CliContainerRow) -> ContainerSummary {
    let labels = parse_label_string(&row.labels);
    let status = if row.status.is_empty() {
        "Unknown".to_string()
    } else {
        row.status
    };

    ContainerSummary {
        id: short_id(&row.id),
        name: if row.names.is_empty() {
            "Unknown".to_string()
        } else {
            row.names.trim_start_matches('/').to_string()
        },
        image: if row.image.is_empty() {
            "Unknown".to_string()
        } else {
            row.image
        },
        state: if row.state.is_empty() {
            "unknown".to_string()
        } else {
            row.state.to_lowercase()
        },
        status,
        ports: row.ports,
        created: clean_created(&row.created_at),
        host: host_name.to_string(),
        compose_path: compose_path(&labels),
    }
}

/// The engine API reports one image with many tags; the dashboard shows one
/// row per tag. Untagged images keep their short id as the tag.
pub fn images_from_api(image: ApiImage) -> Vec<ImageSummary> {
    let id = short_id(image.id.trim_start_matches("sha256:"));
    let created = format_unix_created(image.created);
    let size = format!("{} MB", image.size / (1024 * 1024));

    if image.repo_tags.is_empty() {
        return vec![ImageSummary {
            id: id.clone(),
            tag: id,
            created,
            size,
        }];
    }

    image
        .repo_tags
        .into_iter()
        .map(|tag| ImageSummary {
            id: id.clone(),
            tag,
            created: created.clone(),
            size: size.clone(),
        })
        .collect()
}

pub fn image_from_cli(row: CliImageRow) -> ImageSummary {
    let repo = if row.repository.is_empty() {
        "<none>".to_string()
    } else {
        row.repository
    };
    let tag = if row.tag.is_empty() {
        "<none>".to_string()
    } else {
        row.tag
    };

    ImageSummary {
        id: short_id(&row.id),
        tag: format!("{}:{}", repo, tag),
        created: clean_created(&row.created_at),
        size: row.size,
    }
}

/// Convert a log time bound to a Unix timestamp for the engine API.
/// Accepts raw seconds ("1700000000"), relative offsets ("30s", "5m",
/// "2h", "1d") and RFC 3339 timestamps.
pub fn parse_time_bound(raw: &str, now: DateTime<Utc>) -> Result<i64, DockhandError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DockhandError::InvalidRequest {
            reason: "empty time bound".to_string(),
        });
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse::<i64>().map_err(|e| DockhandError::InvalidRequest {
            reason: format!("bad timestamp {raw}: {e}"),
        });
    }

    if let Some(unit) = raw.chars().last() {
        if matches!(unit, 's' | 'm' | 'h' | 'd') {
            let amount = &raw[..raw.len() - 1];
            if let Ok(n) = amount.parse::<i64>() {
                let offset = match unit {
                    's' => Duration::seconds(n),
                    'm' => Duration::minutes(n),
                    'h' => Duration::hours(n),
                    _ => Duration::days(n),
                };
                return Ok((now - offset).timestamp());
            }
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp())
        .map_err(|_| DockhandError::InvalidRequest {
            reason: format!("unrecognized time bound: {raw}"),
        })
}

/// Case-insensitive substring filter over fetched log lines.
pub fn filter_lines(logs: &str, needle: &str) -> String {
    let needle = needle.to_lowercase();
    logs.lines()
        .filter(|line| line.to_lowercase().contains(&needle))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cli_row() -> CliContainerRow {
        serde_json::from_str(
            r#"{
                "ID": "0123456789abcdef",
                "Names": "web-1",
                "Image": "nginx:1.25",
                "State": "running",
                "Status": "Up 2 hours",
                "Ports": "0.0.0.0:8080->80/tcp",
                "CreatedAt": "2026-01-27 22:00:13 +0000 UTC",
                "Labels": "com.docker.compose.project.working_dir=/srv/web,com.docker.compose.project=web"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn cli_row_maps_to_summary() {
        let s = summary_from_cli("prod", cli_row());
        assert_eq!(s.id, "0123456789ab");
        assert_eq!(s.name, "web-1");
        assert_eq!(s.image, "nginx:1.25");
        assert_eq!(s.state, "running");
        assert_eq!(s.status, "Up 2 hours");
        assert_eq!(s.created, "2026-01-27 22:00:13");
        assert_eq!(s.host, "prod");
        assert_eq!(s.compose_path, "/srv/web");
    }

    #[test]
    fn cli_row_defaults_missing_fields() {
        let row: CliContainerRow = serde_json::from_str(r#"{"ID": "abc"}"#).unwrap();
        let s = summary_from_cli("h", row);
        assert_eq!(s.name, "Unknown");
        assert_eq!(s.state, "unknown");
        assert_eq!(s.status, "Unknown");
        assert_eq!(s.created, "Unknown");
    }

    #[test]
    fn label_string_parsing() {
        let labels = parse_label_string("a=1,com.docker.compose.project.working_dir=/opt/stack,b=x=y");
        assert_eq!(labels.get("a").unwrap(), "1");
        assert_eq!(compose_path(&labels), "/opt/stack");
        // Only the first '=' splits key from value.
        assert_eq!(labels.get("b").unwrap(), "x=y");
    }

    #[test]
    fn api_port_formatting() {
        use bollard::models::PortTypeEnum;
        let ports = vec![
            Port {
                ip: Some("0.0.0.0".to_string()),
                private_port: 80,
                public_port: Some(8080),
                typ: Some(PortTypeEnum::TCP),
            },
            Port {
                ip: None,
                private_port: 9000,
                public_port: None,
                typ: None,
            },
        ];
        assert_eq!(format_api_ports(&ports), "8080->80/tcp, 9000/tcp");
    }

    #[test]
    fn iso_created_is_cleaned() {
        assert_eq!(
            clean_created("2026-01-27T22:00:13.257652099Z"),
            "2026-01-27 22:00:13"
        );
        assert_eq!(clean_created(""), "Unknown");
    }

    fn api_image(repo_tags: &[&str]) -> ApiImage {
        serde_json::from_value(serde_json::json!({
            "Id": "sha256:0011223344556677889900",
            "ParentId": "",
            "RepoTags": repo_tags,
            "RepoDigests": [],
            "Created": 1_700_000_000i64,
            "Size": 44_040_192i64,
            "SharedSize": 0,
            "Labels": {},
            "Containers": 0
        }))
        .unwrap()
    }

    #[test]
    fn untagged_api_image_keeps_short_id() {
        let rows = images_from_api(api_image(&[]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "001122334455");
        assert_eq!(rows[0].tag, "001122334455");
        assert_eq!(rows[0].size, "42 MB");
    }

    #[test]
    fn tagged_api_image_expands_per_tag() {
        let image = api_image(&["nginx:1.25", "nginx:latest"]);
        let tags: Vec<String> = images_from_api(image).into_iter().map(|i| i.tag).collect();
        assert_eq!(tags, vec!["nginx:1.25", "nginx:latest"]);
    }

    #[test]
    fn cli_image_row_fills_none() {
        let row: CliImageRow =
            serde_json::from_str(r#"{"ID": "deadbeef", "Size": "120MB"}"#).unwrap();
        let image = image_from_cli(row);
        assert_eq!(image.tag, "<none>:<none>");
        assert_eq!(image.size, "120MB");
    }

    #[test]
    fn time_bounds() {
        let now = Utc.with_ymd_and_hms(2026, 8, 8, 12, 0, 0).unwrap();
        assert_eq!(parse_time_bound("1700000000", now).unwrap(), 1_700_000_000);
        assert_eq!(
            parse_time_bound("5m", now).unwrap(),
            now.timestamp() - 5 * 60
        );
        assert_eq!(
            parse_time_bound("2h", now).unwrap(),
            now.timestamp() - 2 * 3600
        );
        assert_eq!(
            parse_time_bound("1d", now).unwrap(),
            now.timestamp() - 86_400
        );
        assert_eq!(
            parse_time_bound("2026-08-08T11:00:00Z", now).unwrap(),
            now.timestamp() - 3600
        );
        assert!(parse_time_bound("next tuesday", now).is_err());
        assert!(parse_time_bound("", now).is_err());
    }

    #[test]
    fn log_search_is_case_insensitive() {
        let logs = "GET /healthz 200\nERROR: boom\nerror: again\n";
        let filtered = filter_lines(logs, "ERROR");
        assert_eq!(filtered, "ERROR: boom\nerror: again");
    }
}
