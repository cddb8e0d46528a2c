//! 示例HTTP服务的接口测试

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use norma::client::{ClientConfig, NormaClient};
use norma::web::{create_router, prepare_tables, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> (Router, NormaClient) {
    let client = NormaClient::new(ClientConfig::sqlite_memory());
    client.connect().await.unwrap();
    prepare_tables(&client).await.unwrap();
    (create_router(AppState::new(client.clone())), client)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_user(app: &Router, name: &str, email: &str) -> Value {
    let payload = json!({ "name": name, "email": email, "age": 28 }).to_string();
    let (status, body) = send(app, post_json("/users", &payload)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body
}

#[tokio::test]
async fn test_create_and_fetch_user() {
    let (app, client) = app().await;

    let created = create_user(&app, "Jane", "jane@example.com").await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 32);
    assert_eq!(created["is_active"], json!(true));

    let (status, fetched) = send(&app, get(&format!("/users/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, body) = send(&app, get("/users/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "User not found" }));

    client.disconnect().await;
}

#[tokio::test]
async fn test_user_list_pagination() {
    let (app, client) = app().await;
    for i in 0..3 {
        create_user(&app, &format!("User{}", i), &format!("user{}@example.com", i)).await;
    }

    let (status, all) = send(&app, get("/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, page) = send(&app, get("/users?skip=1&limit=1")).await;
    assert_eq!(page.as_array().unwrap().len(), 1);

    let (_, rest) = send(&app, get("/users?skip=2")).await;
    assert_eq!(rest.as_array().unwrap().len(), 1);

    client.disconnect().await;
}

#[tokio::test]
async fn test_malformed_query_strings_are_json_bad_requests() {
    let (app, client) = app().await;
    create_user(&app, "Reader", "reader@example.com").await;

    for uri in ["/users?skip=-1", "/users?limit=abc", "/posts?published=maybe", "/posts?skip=-5"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["detail"].is_string(), "{}: {}", uri, body);
    }

    let (status, none) = send(&app, get("/users?limit=0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none, json!([]));

    client.disconnect().await;
}

#[tokio::test]
async fn test_invalid_user_payloads_are_bad_requests() {
    let (app, client) = app().await;

    let (status, body) = send(&app, post_json("/users", r#"{"name": "X", "email": "nope"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("email"));

    let (status, _) = send(&app, post_json("/users", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json("/users", r#"{"name": "X", "email": "x@example.com", "role": "admin"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    create_user(&app, "Dup", "dup@example.com").await;
    let (status, _) = send(&app, post_json("/users", r#"{"name": "Dup2", "email": "dup@example.com"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    client.disconnect().await;
}

#[tokio::test]
async fn test_posts_filter_by_published() {
    let (app, client) = app().await;
    let author = create_user(&app, "Writer", "writer@example.com").await;
    let author_id = author["id"].as_str().unwrap();

    for (title, published) in [("Draft", false), ("Live", true), ("Also live", true)] {
        let payload = json!({
            "title": title,
            "content": "body",
            "author_id": author_id,
            "published": published,
        })
        .to_string();
        let (status, body) = send(&app, post_json("/posts", &payload)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["published"], json!(published));
    }

    let (_, all) = send(&app, get("/posts")).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, live) = send(&app, get("/posts?published=true")).await;
    assert_eq!(live.as_array().unwrap().len(), 2);

    let (_, drafts) = send(&app, get("/posts?published=false&limit=10")).await;
    assert_eq!(drafts.as_array().unwrap()[0]["title"], json!("Draft"));

    let (status, _) = send(&app, post_json("/posts", r#"{"title": "", "content": "x", "author_id": "a"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    client.disconnect().await;
}

#[tokio::test]
async fn test_disconnected_store_returns_internal_error() {
    let client = NormaClient::new(ClientConfig::sqlite_memory());
    let app = create_router(AppState::new(client));

    let (status, body) = send(&app, get("/users")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "Database not initialized" }));

    let (status, _) = send(&app, post_json("/users", r#"{"name": "A", "email": "a@example.com"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&app, get("/posts")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, health) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["connected"], json!(false));
}
