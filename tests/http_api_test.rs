use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use inventory_api::server::create_server;
use inventory_api::storage::InMemoryItemRepository;
use inventory_api::ItemUseCase;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let use_case = ItemUseCase::new(Arc::new(InMemoryItemRepository::new()));
    create_server(Arc::new(use_case))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

#[tokio::test]
async fn test_item_lifecycle_over_http() -> Result<()> {
    let app = app();

    let (status, body) = send(&app, "GET", "/items", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, saved) = send(
        &app,
        "POST",
        "/items",
        Some(json!({ "id": 1, "code": "ABC", "title": "Widget", "price": 10.0 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["created_at"], saved["updated_at"]);

    let (status, body) = send(&app, "GET", "/items", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["1"]["price"], 10.0);

    let (status, _) = send(&app, "PUT", "/items/1", Some(json!({ "price": 12.0 }))).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/items", None).await?;
    assert_eq!(body["1"]["price"], 12.0);
    assert_eq!(body["1"]["created_at"], saved["created_at"]);

    let (status, body) = send(&app, "DELETE", "/items/1", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "item deleted");

    let (_, body) = send(&app, "GET", "/items", None).await?;
    assert_eq!(body, json!({}));
    Ok(())
}

#[tokio::test]
async fn test_error_kinds_map_to_status_codes() -> Result<()> {
    let app = app();
    let item = json!({ "id": 1, "code": "ABC", "price": 10.0 });

    let (status, body) = send(&app, "POST", "/items", Some(json!({ "id": 0 }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("must not be 0"));

    send(&app, "POST", "/items", Some(item.clone())).await?;
    let (status, _) = send(&app, "POST", "/items", Some(item)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "PUT", "/items", Some(json!({ "id": 42 }))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/items/42", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/items/abc", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() -> Result<()> {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PUT", "/items/2", Some(json!({ "id": 3 }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_health_reports_backend() -> Result<()> {
    let app = app();

    let (status, body) = send(&app, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");

    let (status, body) = send(&app, "GET", "/ping", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("pong"));
    Ok(())
}
