use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use dockhand_api::{create_router, AppState};
use dockhand_control::{run_migrations, HostRegistry, UserStore};
use dockhand_engine::Engine;
use dockhand_models::Config;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::util::ServiceExt;

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();

    let config = Config::default();
    let users = UserStore::new(pool.clone());
    users
        .ensure_admin(&config.auth.admin_user, &config.auth.admin_pass)
        .await
        .unwrap();

    let state = AppState {
        config: config.clone(),
        registry: HostRegistry::new(pool),
        users,
        engine: Arc::new(Engine::new(config)),
    };
    create_router(state)
}

async fn bearer_token(app: &Router) -> String {
    let res = app
        .clone()
        .oneshot(
            Request::post("/api/auth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=admin"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    json["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = test_app().await;

    let res = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_requests_without_token_get_401() {
    let app = test_app().await;

    let res = app
        .oneshot(Request::get("/api/hosts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error_type"], "NotAuthenticated");
}

#[tokio::test]
async fn browser_requests_without_token_get_redirected() {
    let app = test_app().await;

    let res = app
        .oneshot(
            Request::get("/")
                .header(header::ACCEPT, "text/html,application/xhtml+xml")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let app = test_app().await;

    let res = app
        .oneshot(
            Request::post("/api/auth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=nope"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_form_sets_cookie_and_redirects() {
    let app = test_app().await;

    let res = app
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=admin"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/");

    let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn cookie_from_login_authenticates_requests() {
    let app = test_app().await;

    let login = app
        .clone()
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=admin"))
                .unwrap(),
        )
        .await
        .unwrap();
    let cookie = login.headers()[header::SET_COOKIE].to_str().unwrap();
    let cookie_pair = cookie.split(';').next().unwrap().to_string();

    let res = app
        .oneshot(
            Request::get("/api/hosts")
                .header(header::COOKIE, cookie_pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn host_registry_crud_over_http() {
    let app = test_app().await;
    let token = bearer_token(&app).await;

    // Empty to start.
    let res = app
        .clone()
        .oneshot(
            Request::get("/api/hosts")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let hosts: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(hosts.as_array().unwrap().len(), 0);

    // Register an SSH host.
    let payload = serde_json::json!({
        "name": "build-box",
        "kind": "ssh",
        "addr": "10.0.0.9",
        "port": 2200,
        "ssh_user": "deploy",
        "ssh_password": "s3cret"
    });
    let res = app
        .clone()
        .oneshot(
            Request::post("/api/hosts")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let host_id = created["host_id"].as_i64().unwrap();
    // The password must never appear in a response.
    assert!(created.get("ssh_password").is_none());

    // Duplicates are refused.
    let res = app
        .clone()
        .oneshot(
            Request::post("/api/hosts")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Delete it again.
    let res = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/hosts/{}", host_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_host_yields_404() {
    let app = test_app().await;
    let token = bearer_token(&app).await;

    let res = app
        .oneshot(
            Request::get("/api/containers/ghost")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn fleet_listing_reports_unreachable_hosts_as_errors() {
    let app = test_app().await;
    let token = bearer_token(&app).await;

    // An SSH host that nothing listens on: listing must still return 200
    // with the failure captured per host.
    let payload = serde_json::json!({
        "name": "unreachable",
        "kind": "ssh",
        "addr": "127.0.0.1",
        "port": 1,
        "ssh_user": "deploy",
        "ssh_password": "x"
    });
    let res = app
        .clone()
        .oneshot(
            Request::post("/api/hosts")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app
        .oneshot(
            Request::get("/api/containers")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let fleet: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fleet["containers"].as_array().unwrap().len(), 0);
    assert_eq!(fleet["errors"].as_array().unwrap().len(), 1);
    assert!(fleet["errors"][0]
        .as_str()
        .unwrap()
        .contains("unreachable"));
}

#[tokio::test]
async fn invalid_compose_action_is_a_bad_request() {
    let app = test_app().await;
    let token = bearer_token(&app).await;

    let res = app
        .oneshot(
            Request::post("/api/compose")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"host": "h", "path": "/srv", "action": "restart"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    // Serde rejects the unknown enum variant before any handler runs.
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
