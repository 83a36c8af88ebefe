//! Service seams for the two generation backends, plus the JSON bodies they exchange.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ForgeResult;

/// `POST /api/generate-design` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignRequest {
    #[serde(default)]
    pub prompt: String,
}

/// `POST /api/generate-image` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub description: String,
}

/// `POST /api/generate-image` success body. `null` when the model produced no image part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Failure body shared by both endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Text-generating backend. Returns the raw payload; normalization happens downstream.
#[async_trait]
pub trait DesignService: Send + Sync {
    async fn generate_design(&self, prompt: &str) -> ForgeResult<String>;
}

/// Image-generating backend. `Ok(None)` means the call worked but produced no image.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate_image(&self, description: &str) -> ForgeResult<Option<String>>;
}
