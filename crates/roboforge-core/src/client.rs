//! HTTP client for the gateway's two generation endpoints.
//!
//! Any non-2xx or non-JSON response is a failure. The human-readable message comes from the
//! `error` field when the body is JSON, otherwise from a truncated copy of the raw body.

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{ForgeResult, GenerationError, MISSING_API_KEY_MESSAGE};
use crate::service::{DesignRequest, DesignService, ImageRequest, ImageResponse, ImageService};

const DESIGN_PATH: &str = "/api/generate-design";
const IMAGE_PATH: &str = "/api/generate-image";
const BODY_PREVIEW_CHARS: usize = 100;

/// One configured client, shared by every submission. Timeouts are reqwest's defaults.
#[derive(Clone)]
pub struct HttpGenerationClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpGenerationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.gateway_url.as_str())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` as JSON; returns the response text of a 2xx JSON response.
    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        fallback_message: &str,
    ) -> ForgeResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let res = self.http.post(&url).json(body).send().await?;

        let status = res.status();
        let is_json = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);
        let text = res.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), is_json, &text, fallback_message));
        }
        if !is_json {
            tracing::error!(
                url = %url,
                "Expected JSON response but received: {}",
                preview(&text)
            );
            return Err(GenerationError::ResponseFormat { raw: text });
        }
        Ok(text)
    }
}

/// Maps a non-2xx response onto the error taxonomy.
fn classify_failure(status: u16, is_json: bool, body: &str, fallback_message: &str) -> GenerationError {
    let message = if is_json {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback_message.to_string())
    } else {
        format!("Server Error ({}): {}", status, preview(body))
    };

    if status == 500 && message == MISSING_API_KEY_MESSAGE {
        GenerationError::Configuration(message)
    } else {
        GenerationError::transport(Some(status), message)
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[async_trait::async_trait]
impl DesignService for HttpGenerationClient {
    async fn generate_design(&self, prompt: &str) -> ForgeResult<String> {
        let body = DesignRequest {
            prompt: prompt.to_string(),
        };
        self.post_json(DESIGN_PATH, &body, "Failed to generate design")
            .await
    }
}

#[async_trait::async_trait]
impl ImageService for HttpGenerationClient {
    async fn generate_image(&self, description: &str) -> ForgeResult<Option<String>> {
        let body = ImageRequest {
            description: description.to_string(),
        };
        let text = self
            .post_json(IMAGE_PATH, &body, "Failed to generate image")
            .await?;
        let parsed: ImageResponse = serde_json::from_str(&text)
            .map_err(|_| GenerationError::ResponseFormat { raw: text.clone() })?;
        Ok(parsed.image_url.filter(|url| !url.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn design_success_returns_raw_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", DESIGN_PATH)
            .match_body(Matcher::Json(json!({ "prompt": "hexapod lunar rover" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"LunarHex"}"#)
            .create_async()
            .await;

        let client = HttpGenerationClient::new(server.url());
        let text = client.generate_design("hexapod lunar rover").await.unwrap();
        assert_eq!(text, r#"{"name":"LunarHex"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_key_maps_to_configuration_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DESIGN_PATH)
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"API_KEY not configured on server"}"#)
            .create_async()
            .await;

        let client = HttpGenerationClient::new(server.url());
        let err = client.generate_design("x").await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::Configuration(MISSING_API_KEY_MESSAGE.to_string())
        );
        assert_eq!(err.user_message(), MISSING_API_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn json_error_body_surfaces_error_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DESIGN_PATH)
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"quota exceeded"}"#)
            .create_async()
            .await;

        let client = HttpGenerationClient::new(server.url());
        let err = client.generate_design("x").await.unwrap_err();
        assert_eq!(err, GenerationError::transport(Some(429), "quota exceeded"));
    }

    #[tokio::test]
    async fn html_error_body_is_truncated() {
        let mut server = mockito::Server::new_async().await;
        let page = format!("<html>{}</html>", "x".repeat(300));
        server
            .mock("POST", DESIGN_PATH)
            .with_status(502)
            .with_header("content-type", "text/html")
            .with_body(&page)
            .create_async()
            .await;

        let client = HttpGenerationClient::new(server.url());
        match client.generate_design("x").await.unwrap_err() {
            GenerationError::Transport { status, message } => {
                assert_eq!(status, Some(502));
                let expected = format!("Server Error (502): {}", &page[..100]);
                assert_eq!(message, expected);
            }
            other => panic!("expected Transport, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_json_success_is_a_format_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DESIGN_PATH)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<!doctype html><p>spa fallback</p>")
            .create_async()
            .await;

        let client = HttpGenerationClient::new(server.url());
        let err = client.generate_design("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::ResponseFormat { .. }));
    }

    #[tokio::test]
    async fn image_null_url_is_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", IMAGE_PATH)
            .match_body(Matcher::Json(json!({ "description": "hexapod" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"imageUrl":null}"#)
            .create_async()
            .await;

        let client = HttpGenerationClient::new(server.url());
        assert_eq!(client.generate_image("hexapod").await.unwrap(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn image_data_uri_is_returned() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", IMAGE_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"imageUrl":"data:image/png;base64,iVBORw0KGgo="}"#)
            .create_async()
            .await;

        let client = HttpGenerationClient::new(format!("{}/", server.url()));
        assert_eq!(
            client.generate_image("hexapod").await.unwrap().as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
    }

    #[tokio::test]
    async fn lunar_rover_end_to_end_through_gateway() {
        use crate::orchestrator::tests::LUNAR_HEX;
        use crate::orchestrator::GenerationOrchestrator;
        use std::sync::Arc;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DESIGN_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LUNAR_HEX)
            .create_async()
            .await;
        server
            .mock("POST", IMAGE_PATH)
            .match_body(Matcher::Json(json!({ "description": "hexapod lunar rover" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"imageUrl":"data:image/png;base64,iVBORw0KGgo"}"#)
            .create_async()
            .await;

        let client = Arc::new(HttpGenerationClient::new(server.url()));
        let orchestrator = GenerationOrchestrator::new(client.clone(), client);
        let result = orchestrator.generate("hexapod lunar rover").await.unwrap();

        assert_eq!(result.design.name, "LunarHex");
        assert_eq!(result.design.purpose, "cave exploration");
        assert_eq!(result.design.specifications, "# Specs\n...");
        assert_eq!(result.design.components.len(), 1);
        assert_eq!(result.design.components[0].kind, "sensor");
        assert_eq!(result.design.control_logic, "move_forward()");
        assert_eq!(
            result.image_url.as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo")
        );
    }

    #[tokio::test]
    async fn unreachable_gateway_is_transport_error() {
        // Port 9 (discard) is closed on test hosts.
        let client = HttpGenerationClient::new("http://127.0.0.1:9");
        let err = client.generate_design("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport { status: None, .. }));
    }
}
