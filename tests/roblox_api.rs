//! Roblox lookup tests against a mocked user-directory API.

use brotherhood_kos::config::RobloxConfig;
use brotherhood_kos::services::RobloxService;
use brotherhood_kos::utils::errors::KosError;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(users: &MockServer, thumbnails: &MockServer) -> RobloxService {
    RobloxService::new(RobloxConfig {
        users_api_url: users.uri(),
        thumbnails_api_url: thumbnails.uri(),
        timeout_seconds: 2,
    })
    .unwrap()
}

async fn mount_thumbnail(server: &MockServer, user_id: &str, image_url: Option<&str>) {
    Mock::given(method("GET"))
        .and(path("/v1/users/avatar-headshot"))
        .and(query_param("userIds", user_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "targetId": user_id.parse::<u64>().unwrap(),
                "state": "Completed",
                "imageUrl": image_url,
            }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn resolves_numeric_id() {
    let users = MockServer::start().await;
    let thumbnails = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/156"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 156,
            "name": "builderman",
            "displayName": "Builderman",
        })))
        .mount(&users)
        .await;
    mount_thumbnail(&thumbnails, "156", Some("https://cdn.example/156.png")).await;

    let profile = service_for(&users, &thumbnails)
        .resolve("156")
        .await
        .unwrap()
        .expect("profile should resolve");

    assert_eq!(profile.id, "156");
    assert_eq!(profile.name, "builderman");
    assert_eq!(profile.display_name, "Builderman");
    assert_eq!(
        profile.thumbnail_url.as_deref(),
        Some("https://cdn.example/156.png")
    );
}

#[tokio::test]
async fn unknown_id_resolves_to_none() {
    let users = MockServer::start().await;
    let thumbnails = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"code": 3, "message": "The user id is invalid."}]
        })))
        .mount(&users)
        .await;

    let result = service_for(&users, &thumbnails).resolve("999").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn resolves_by_username() {
    let users = MockServer::start().await;
    let thumbnails = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/usernames/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "requestedUsername": "builderman",
                "id": 156,
                "name": "builderman",
                "displayName": "Builderman",
            }]
        })))
        .mount(&users)
        .await;
    mount_thumbnail(&thumbnails, "156", None).await;

    let profile = service_for(&users, &thumbnails)
        .resolve("builderman")
        .await
        .unwrap()
        .expect("profile should resolve");

    assert_eq!(profile.id, "156");
    assert!(profile.thumbnail_url.is_none());
}

#[tokio::test]
async fn unmatched_username_resolves_to_none() {
    let users = MockServer::start().await;
    let thumbnails = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/usernames/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&users)
        .await;

    let result = service_for(&users, &thumbnails)
        .resolve("nobody_by_this_name")
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn thumbnail_failure_does_not_fail_resolve() {
    let users = MockServer::start().await;
    let thumbnails = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/156"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 156,
            "name": "builderman",
            "displayName": "Builderman",
        })))
        .mount(&users)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/users/avatar-headshot"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&thumbnails)
        .await;

    let profile = service_for(&users, &thumbnails)
        .resolve("156")
        .await
        .unwrap()
        .expect("profile should resolve");

    assert!(profile.thumbnail_url.is_none());
}

#[tokio::test]
async fn upstream_failure_is_an_error() {
    let users = MockServer::start().await;
    let thumbnails = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/156"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&users)
        .await;

    let result = service_for(&users, &thumbnails).resolve("156").await;
    assert!(matches!(result, Err(KosError::Roblox(_))));
}

#[tokio::test]
async fn blank_query_is_invalid() {
    let users = MockServer::start().await;
    let thumbnails = MockServer::start().await;

    let result = service_for(&users, &thumbnails).resolve("   ").await;
    assert!(matches!(result, Err(KosError::Validation(_))));
}
