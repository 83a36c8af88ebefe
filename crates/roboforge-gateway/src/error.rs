//! Gateway error type; every variant renders as `{ "error": "..." }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use roboforge_core::{ErrorBody, MISSING_API_KEY_MESSAGE};
use thiserror::Error;

const UPSTREAM_BODY_PREVIEW_CHARS: usize = 512;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,

    #[error("{0}")]
    BadRequest(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Gemini request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Gemini returned an empty response.")]
    EmptyResponse,

    #[error("Failed to parse AI response as JSON.")]
    InvalidJson,
}

impl GatewayError {
    pub fn upstream(status: u16, body: &str) -> Self {
        GatewayError::Upstream {
            status,
            body: body.chars().take(UPSTREAM_BODY_PREVIEW_CHARS).collect(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
