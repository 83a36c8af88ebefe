//! HTTP surface: `/api/generate-design`, `/api/generate-image`, `/health`, optional static front end.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use roboforge_core::{DesignRequest, ImageRequest, ImageResponse, ResultNormalizer, RobotDesign};
use tower_http::services::{ServeDir, ServeFile};

use crate::error::GatewayError;
use crate::gemini::GeminiClient;

pub struct AppState {
    pub gemini: Arc<GeminiClient>,
    pub normalizer: Arc<ResultNormalizer>,
}

pub fn router(state: Arc<AppState>, static_dir: Option<&str>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route(
            "/api/generate-design",
            post(generate_design).fallback(method_not_allowed),
        )
        .route(
            "/api/generate-image",
            post(generate_image).fallback(method_not_allowed),
        )
        .with_state(state);

    let app = match static_dir.map(Path::new).filter(|dir| dir.is_dir()) {
        Some(dir) => {
            tracing::info!("[Server] Serving front end from {}", dir.display());
            let spa = ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html")));
            api.fallback_service(spa)
        }
        None => api,
    };

    app.layer(axum::middleware::from_fn(log_request))
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    tracing::info!("[Server] {} {} -> {}", method, path, response.status().as_u16());
    response
}

async fn health() -> &'static str {
    "OK"
}

/// Non-POST on an API route: 405 with the usual `{ "error": ... }` body.
async fn method_not_allowed() -> impl IntoResponse {
    ([(header::ALLOW, "POST")], GatewayError::MethodNotAllowed)
}

/// Runs before the body is looked at, so a missing key is reported even for a bad request.
fn require_credential(state: &AppState) -> Result<(), GatewayError> {
    if state.gemini.has_credential() {
        Ok(())
    } else {
        tracing::error!("[Server] {}", GatewayError::MissingApiKey);
        Err(GatewayError::MissingApiKey)
    }
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::warn!("[Server] Rejected request body: {}", rejection.body_text());
            Err(GatewayError::BadRequest(rejection.body_text()))
        }
    }
}

async fn generate_design(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DesignRequest>, JsonRejection>,
) -> Result<Json<RobotDesign>, GatewayError> {
    require_credential(&state)?;
    let body = parse_body(body)?;
    let prompt = body.prompt.trim();
    if prompt.is_empty() {
        return Err(GatewayError::BadRequest("Prompt is required.".to_string()));
    }

    tracing::info!("[Server] Generating design for prompt: {}", prompt);
    let text = state.gemini.generate_design(prompt).await.map_err(log_failure)?;

    let obj = state.normalizer.extract_object(&text).ok_or_else(|| {
        tracing::error!(raw = %text, "[Server] Failed to parse Gemini response as JSON");
        GatewayError::InvalidJson
    })?;
    Ok(Json(RobotDesign::from_value(&obj)))
}

async fn generate_image(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, GatewayError> {
    require_credential(&state)?;
    let body = parse_body(body)?;
    let description = body.description.trim();
    if description.is_empty() {
        return Err(GatewayError::BadRequest("Description is required.".to_string()));
    }

    tracing::info!("[Server] Generating image");
    let image_url = state
        .gemini
        .generate_image(description)
        .await
        .map_err(log_failure)?;
    if image_url.is_none() {
        tracing::warn!("[Server] Gemini response carried no inline image data");
    }
    Ok(Json(ImageResponse { image_url }))
}

fn log_failure(err: GatewayError) -> GatewayError {
    tracing::error!("[Server] Gemini Error: {}", err);
    err
}
