use crate::{assets, auth, handlers::*, websocket::logs_ws_handler, AppState};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

pub fn create_router(state: AppState) -> Router {
    // Everything that requires a logged-in user.
    let protected = Router::new()
        .route("/", get(assets::dashboard_page))
        // Host registry
        .route("/api/hosts", get(list_hosts).post(create_host))
        .route("/api/hosts/:host_id", delete(delete_host))
        // Containers
        .route("/api/containers", get(list_fleet))
        .route("/api/containers/:host_name", get(list_host_containers))
        .route(
            "/api/containers/:host_name/:container_id/start",
            post(start_container),
        )
        .route(
            "/api/containers/:host_name/:container_id/stop",
            post(stop_container),
        )
        .route(
            "/api/containers/:host_name/:container_id/restart",
            post(restart_container),
        )
        .route(
            "/api/containers/:host_name/:container_id/logs",
            get(get_logs),
        )
        // Images
        .route("/api/images/:host_name", get(list_images))
        .route("/api/images/:host_name/:image_id", delete(delete_image))
        // Compose
        .route("/api/compose", post(compose_action))
        // Live log streaming
        .route("/ws/logs", get(logs_ws_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(protected)
        .route("/login", get(assets::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/api/auth/token", post(auth::issue_api_token))
        .route("/healthz", get(health_check))
        .route("/static/*path", get(assets::static_asset))
        .with_state(state)
}
