use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::Redirect,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use flash::{FlashKey, FlashMap, FlashMessage};

use crate::errors::AppError;
use crate::middleware::{flash_middleware, redirect_with_flash, Flash, FlashLayerState};

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Messages visible to this request.
async fn show_flash(flash: Flash) -> Json<FlashMap> {
    Json(flash.lock().await.to_map())
}

#[derive(Debug, Deserialize)]
pub struct StageInput {
    pub key: String,
    pub message: String,
    /// Treat `message` as a translation identifier.
    #[serde(default)]
    pub localized: bool,
}

async fn stage_flash(flash: Flash, Json(input): Json<StageInput>) -> Result<Redirect, AppError> {
    if input.key.trim().is_empty() {
        return Err(AppError::Validation("key must not be empty".into()));
    }
    let message = if input.localized {
        FlashMessage::localized(input.message)
    } else {
        FlashMessage::Literal(input.message)
    };
    Ok(redirect_with_flash(&flash, "/flash", FlashKey::from(input.key), message).await?)
}

#[derive(Debug, Deserialize)]
pub struct KeepQuery {
    pub key: Option<String>,
}

async fn keep_flash(flash: Flash, Query(query): Query<KeepQuery>) -> StatusCode {
    let mut storage = flash.lock().await;
    match query.key.as_deref() {
        Some(key) => storage.keep(key),
        None => storage.keep_all(),
    }
    StatusCode::NO_CONTENT
}

/// Drop a message now and cancel it for the next request.
async fn drop_flash(flash: Flash, Path(key): Path<String>) -> StatusCode {
    let mut storage = flash.lock().await;
    let existed = storage.delete(&key).is_some();
    storage.discard(&key);
    if existed { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

/// Build the application router with the flash middleware on every route.
pub fn build_router(state: FlashLayerState, cors: CorsLayer) -> Router {
    let flash_routes = Router::new()
        .route("/flash", get(show_flash).post(stage_flash))
        .route("/flash/keep", post(keep_flash))
        .route("/flash/:key", delete(drop_flash))
        .route_layer(middleware::from_fn_with_state(state, flash_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(flash_routes)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
