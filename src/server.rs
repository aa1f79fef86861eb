use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use hyper::Server;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::app::ItemUseCasePort;
use crate::domain::{Item, ItemMap};
use crate::error::{ErrorKind, InventoryError};

#[derive(Clone)]
pub struct AppState {
    items: Arc<dyn ItemUseCasePort>,
}

/// Transport-level error: a status code and a short message for the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        let status = match err.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::DuplicateKey => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Backend => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Backend details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", err);
            "internal server error".to_string()
        } else {
            err.to_string()
        };

        Self { status, message }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self::bad_request(format!("invalid item payload: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid item id '{raw}'")))
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "inventory-api",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.items.backend_name(),
    }))
}

async fn ping() -> impl IntoResponse {
    Json("pong")
}

async fn save_item(
    State(state): State<AppState>,
    payload: Result<Json<Item>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let Json(item) = payload?;
    let saved = state.items.save_item(item).await?;
    Ok(Json(saved))
}

async fn list_items(State(state): State<AppState>) -> Result<Json<ItemMap>, ApiError> {
    let items = state.items.list_items().await?;
    Ok(Json(items))
}

async fn update_item(
    State(state): State<AppState>,
    payload: Result<Json<Item>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(item) = payload?;
    state.items.update_item(item).await?;
    Ok(Json(json!({ "message": "item updated" })))
}

async fn update_item_by_id(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<Item>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    let Json(mut item) = payload?;

    if item.id != 0 && item.id != id {
        return Err(ApiError::bad_request(format!(
            "item id {} in body does not match id {} in path",
            item.id, id
        )));
    }
    item.id = id;

    state.items.update_item(item).await?;
    Ok(Json(json!({ "message": "item updated" })))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    state.items.delete_item(id).await?;
    Ok(Json(json!({ "message": "item deleted" })))
}

/// Create the HTTP router with all item routes
pub fn create_server(items: Arc<dyn ItemUseCasePort>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
        .route("/items", get(list_items).post(save_item).put(update_item))
        .route("/items/:id", put(update_item_by_id).delete(delete_item))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(AppState { items })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

/// Serve the router on `addr` until Ctrl-C.
pub async fn start_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!("HTTP server running on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
