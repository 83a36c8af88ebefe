//! Gemini bridge: one configured client for the design and image models.
//! Built once at startup and shared by the handlers; reqwest only.

use serde_json::{json, Value};

use crate::config::GatewayConfig;
use crate::error::GatewayError;

const DEFAULT_IMAGE_MIME: &str = "image/png";

fn design_prompt(prompt: &str) -> String {
    format!(
        "Design a robot based on this description: {}. \
         Provide technical details, components, and basic control code.",
        prompt
    )
}

fn image_prompt(description: &str) -> String {
    format!(
        "A highly detailed, professional engineering concept render of a robot: {}. \
         Cinematic lighting, technical blueprint style background, 4k, photorealistic.",
        description
    )
}

/// Response schema pinned on the design model so it answers with a `RobotDesign` object.
fn design_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "purpose": { "type": "STRING" },
            "specifications": {
                "type": "STRING",
                "description": "Detailed markdown description of the robot's specs"
            },
            "components": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "type": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    },
                    "required": ["name", "type", "description"]
                }
            },
            "controlLogic": {
                "type": "STRING",
                "description": "Arduino or Python code snippet for basic movement"
            }
        },
        "required": ["name", "purpose", "specifications", "components", "controlLogic"]
    })
}

pub struct GeminiClient {
    api_key: Option<String>,
    api_base: String,
    design_model: String,
    image_model: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            api_key: config
                .api_key
                .as_ref()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            design_model: config.design_model.clone(),
            image_model: config.image_model.clone(),
            http: reqwest::Client::new(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, GatewayError> {
        self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    async fn generate_content(&self, model: &str, payload: &Value) -> Result<Value, GatewayError> {
        let api_key = self.api_key()?;
        let res = self
            .http
            .post(self.endpoint_for_model(model))
            .header("x-goog-api-key", api_key)
            .json(payload)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(GatewayError::upstream(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, body = %text, "Gemini returned a non-JSON envelope");
            GatewayError::InvalidJson
        })
    }

    /// Raw design text from the model. Never empty.
    pub async fn generate_design(&self, prompt: &str) -> Result<String, GatewayError> {
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": design_prompt(prompt) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": design_schema()
            }
        });
        let response = self.generate_content(&self.design_model, &payload).await?;
        tracing::info!("[Server] Received response from Gemini");
        response_text(&response).ok_or(GatewayError::EmptyResponse)
    }

    /// Concept render as a `data:` URI, or `None` when the model sent no image part.
    pub async fn generate_image(&self, description: &str) -> Result<Option<String>, GatewayError> {
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": image_prompt(description) }]
            }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"]
            }
        });
        let response = self.generate_content(&self.image_model, &payload).await?;
        tracing::info!("[Server] Received image response from Gemini");
        Ok(first_inline_image(&response))
    }
}

fn first_candidate_parts(response: &Value) -> Vec<Value> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Concatenated text parts of the first candidate; `None` when blank.
fn response_text(response: &Value) -> Option<String> {
    let text: String = first_candidate_parts(response)
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

fn first_inline_image(response: &Value) -> Option<String> {
    first_candidate_parts(response).iter().find_map(|part| {
        let inline = part.get("inlineData").or_else(|| part.get("inline_data"))?;
        let data = inline.get("data").and_then(Value::as_str)?;
        if data.is_empty() {
            return None;
        }
        let mime = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);
        Some(format!("data:{};base64,{}", mime, data))
    })
}
