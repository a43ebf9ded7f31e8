use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use dockhand_models::{
    ComposeRequest, ComposeResponse, ContainerSummary, CreateHostRequest, DockerHost,
    DockhandError, ErrorShape, FleetResponse, ImageSummary, LogQuery,
};
use tracing::{error, info, instrument};

pub(crate) fn error_response(e: &DockhandError) -> (StatusCode, Json<ErrorShape>) {
    (
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(e.to_error_shape()),
    )
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[instrument(skip(state))]
pub async fn list_hosts(
    State(state): State<AppState>,
) -> Result<Json<Vec<DockerHost>>, (StatusCode, Json<ErrorShape>)> {
    match state.registry.list_hosts().await {
        Ok(hosts) => Ok(Json(hosts)),
        Err(e) => {
            error!("Failed to list hosts: {}", e);
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create_host(
    State(state): State<AppState>,
    Json(payload): Json<CreateHostRequest>,
) -> Result<(StatusCode, Json<DockerHost>), (StatusCode, Json<ErrorShape>)> {
    info!("Registering host: {}", payload.name);

    match state.registry.create_host(payload).await {
        Ok(host) => Ok((StatusCode::CREATED, Json(host))),
        Err(e) => {
            error!("Failed to register host: {}", e);
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_host(
    State(state): State<AppState>,
    Path(host_id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<ErrorShape>)> {
    info!("Deleting host: {}", host_id);

    match state.registry.delete_host(host_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete host {}: {}", host_id, e);
            Err(error_response(&e))
        }
    }
}

/// Containers across every registered host. A host that cannot be reached
/// contributes an error string instead of failing the whole listing.
#[instrument(skip(state))]
pub async fn list_fleet(
    State(state): State<AppState>,
) -> Result<Json<FleetResponse>, (StatusCode, Json<ErrorShape>)> {
    let hosts = match state.registry.list_hosts().await {
        Ok(hosts) => hosts,
        Err(e) => return Err(error_response(&e)),
    };

    let mut response = FleetResponse::default();
    for host in &hosts {
        match state.engine.list_containers(host).await {
            Ok(containers) => response.containers.extend(containers),
            Err(e) => {
                error!("Failed to reach host {}: {}", host.name, e);
                response
                    .errors
                    .push(format!("Failed to reach {}: {}", host.name, e));
            }
        }
    }
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn list_host_containers(
    State(state): State<AppState>,
    Path(host_name): Path<String>,
) -> Result<Json<Vec<ContainerSummary>>, (StatusCode, Json<ErrorShape>)> {
    let result = async {
        let host = state.registry.get_host(&host_name).await?;
        state.engine.list_containers(&host).await
    }
    .await;

    match result {
        Ok(containers) => Ok(Json(containers)),
        Err(e) => {
            error!("Failed to list containers on {}: {}", host_name, e);
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn start_container(
    State(state): State<AppState>,
    Path((host_name, container_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorShape>)> {
    container_action(&state, &host_name, &container_id, "started").await
}

#[instrument(skip(state))]
pub async fn stop_container(
    State(state): State<AppState>,
    Path((host_name, container_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorShape>)> {
    container_action(&state, &host_name, &container_id, "stopped").await
}

#[instrument(skip(state))]
pub async fn restart_container(
    State(state): State<AppState>,
    Path((host_name, container_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorShape>)> {
    container_action(&state, &host_name, &container_id, "restarted").await
}

async fn container_action(
    state: &AppState,
    host_name: &str,
    container_id: &str,
    verb: &str,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorShape>)> {
    let result = async {
        let host = state.registry.get_host(host_name).await?;
        match verb {
            "started" => state.engine.start_container(&host, container_id).await,
            "stopped" => state.engine.stop_container(&host, container_id).await,
            _ => state.engine.restart_container(&host, container_id).await,
        }
    }
    .await;

    match result {
        Ok(()) => Ok(Json(
            serde_json::json!({"status": verb, "id": container_id}),
        )),
        Err(e) => {
            error!(
                "Failed container action on {}/{}: {}",
                host_name, container_id, e
            );
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state, query))]
pub async fn get_logs(
    State(state): State<AppState>,
    Path((host_name, container_id)): Path<(String, String)>,
    Query(query): Query<LogQuery>,
) -> Result<Response, (StatusCode, Json<ErrorShape>)> {
    let result = async {
        let host = state.registry.get_host(&host_name).await?;
        state.engine.fetch_logs(&host, &container_id, &query).await
    }
    .await;

    match result {
        Ok(logs) => {
            if query.download {
                let filename = format!("logs_{}.txt", container_id);
                let headers = [
                    (
                        header::CONTENT_TYPE,
                        "text/plain; charset=utf-8".to_string(),
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename={}", filename),
                    ),
                ];
                Ok((headers, logs).into_response())
            } else {
                Ok(Json(serde_json::json!({
                    "host": host_name,
                    "container_id": container_id,
                    "logs": logs,
                }))
                .into_response())
            }
        }
        Err(e) => {
            error!(
                "Failed to fetch logs for {}/{}: {}",
                host_name, container_id, e
            );
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn list_images(
    State(state): State<AppState>,
    Path(host_name): Path<String>,
) -> Result<Json<Vec<ImageSummary>>, (StatusCode, Json<ErrorShape>)> {
    let result = async {
        let host = state.registry.get_host(&host_name).await?;
        state.engine.list_images(&host).await
    }
    .await;

    match result {
        Ok(images) => Ok(Json(images)),
        Err(e) => {
            error!("Failed to list images on {}: {}", host_name, e);
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_image(
    State(state): State<AppState>,
    Path((host_name, image_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorShape>)> {
    let result = async {
        let host = state.registry.get_host(&host_name).await?;
        state.engine.remove_image(&host, &image_id).await
    }
    .await;

    match result {
        Ok(()) => Ok(Json(
            serde_json::json!({"status": "deleted", "id": image_id}),
        )),
        Err(e) => {
            error!("Failed to delete image {} on {}: {}", image_id, host_name, e);
            Err(error_response(&e))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn compose_action(
    State(state): State<AppState>,
    Json(payload): Json<ComposeRequest>,
) -> Result<Json<ComposeResponse>, (StatusCode, Json<ErrorShape>)> {
    info!("Compose {} in {} on {}", payload.action, payload.path, payload.host);

    let result = async {
        let host = state.registry.get_host(&payload.host).await?;
        state
            .engine
            .compose(&host, &payload.path, payload.action)
            .await
    }
    .await;

    match result {
        Ok(output) => Ok(Json(ComposeResponse {
            status: "success".to_string(),
            output,
        })),
        Err(e) => {
            error!("Compose action failed: {}", e);
            Err(error_response(&e))
        }
    }
}
