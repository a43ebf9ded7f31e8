//! Tests that need a reachable Docker daemon. Run with:
//! `cargo test --features docker_tests`
#![cfg(feature = "docker_tests")]

use dockhand_testsupport::{sample_local_host, spawn_app};

#[tokio::test]
async fn local_host_lists_containers_and_images() {
    let server = spawn_app().await.unwrap();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/token", server.base_url))
        .form(&[("username", "admin"), ("password", "admin")])
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["access_token"].as_str().unwrap().to_string();

    server
        .state
        .registry
        .create_host(sample_local_host("local"))
        .await
        .unwrap();

    let res = client
        .get(format!("{}/api/containers/local", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let containers: serde_json::Value = res.json().await.unwrap();
    assert!(containers.is_array());

    let res = client
        .get(format!("{}/api/images/local", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let images: serde_json::Value = res.json().await.unwrap();
    assert!(images.is_array());
}

#[tokio::test]
async fn fleet_listing_includes_local_host() {
    let server = spawn_app().await.unwrap();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/token", server.base_url))
        .form(&[("username", "admin"), ("password", "admin")])
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["access_token"].as_str().unwrap().to_string();

    server
        .state
        .registry
        .create_host(sample_local_host("local"))
        .await
        .unwrap();

    let res = client
        .get(format!("{}/api/containers", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let fleet: serde_json::Value = res.json().await.unwrap();
    assert!(fleet["errors"].as_array().unwrap().is_empty());
}
