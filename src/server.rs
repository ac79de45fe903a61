use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, OriginalUri, State},
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::error::RecipeError;
use crate::handlers::{AnalyzeHandler, BridgeReply};

pub const ANALYZE_PATH: &str = "/api/analyze-recipe";
/// Path used by the earlier static deployment of the upload page.
pub const LEGACY_ANALYZE_PATH: &str = "/.netlify/functions/analyze-recipe";

/// A 4MB image grows by a third once base64-encoded.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub struct AppState {
    pub analyze_handler: Arc<AnalyzeHandler>,
}

pub fn create_router(analyze_handler: Arc<AnalyzeHandler>, assets_dir: &str) -> Router {
    let state = Arc::new(AppState { analyze_handler });

    Router::new()
        .route("/", get(index_page))
        .route(ANALYZE_PATH, any(analyze_recipe))
        .route(LEGACY_ANALYZE_PATH, any(analyze_recipe))
        .route("/health", get(health_check))
        .nest_service("/assets", ServeDir::new(assets_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

// Every method lands here so that non-POST gets the JSON 405 body.
// Body rejections (over the limit, not UTF-8) are answered as JSON 500s too.
async fn analyze_recipe(
    method: Method,
    OriginalUri(uri): OriginalUri,
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let reply = match read_body(&method, body) {
        Ok(body) => {
            log::info!("🔔 {} {} ({} bytes)", method, uri.path(), body.len());
            state.analyze_handler.handle(method.as_str(), &body).await
        }
        Err(err) => {
            log::warn!("⚠️ {} {}: unreadable body: {}", method, uri.path(), err);
            BridgeReply::from_error(&err)
        }
    };
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    log::info!("📤 Analysis finished with status {}", status);
    (status, Json(reply.body)).into_response()
}

/// Body as UTF-8 text. Non-POST requests skip the body so they still get 405.
fn read_body(
    method: &Method,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<String, RecipeError> {
    if *method != Method::POST {
        return Ok(String::new());
    }
    let bytes = body.map_err(|e| RecipeError::InvalidBody(e.body_text()))?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| RecipeError::InvalidBody("request body is not valid UTF-8".to_string()))
}

async fn index_page() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health_check() -> &'static str {
    "OK"
}
