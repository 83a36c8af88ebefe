//! Gateway configuration: defaults, optional TOML file, then `ROBOFORGE__*` env overrides.
//!
//! | Source | Example |
//! |--------|---------|
//! | `ROBOFORGE_CONFIG` | path to the TOML file (default `config/roboforge`, extension optional) |
//! | `ROBOFORGE__PORT` | `8080` |
//! | `ROBOFORGE__DESIGN_MODEL` | `gemini-3-flash-preview` |
//! | `API_KEY` / `GEMINI_API_KEY` | upstream credential (never read from the file) |

use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_DESIGN_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Gemini REST base, without trailing slash.
    pub api_base: String,
    pub design_model: String,
    pub image_model: String,
    /// Built front end to serve for non-API paths (SPA fallback to `index.html`).
    #[serde(default)]
    pub static_dir: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_base: DEFAULT_API_BASE.to_string(),
            design_model: DEFAULT_DESIGN_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            static_dir: None,
            api_key: None,
        }
    }
}

impl GatewayConfig {
    /// Load config from file and environment. Precedence: env > file > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("ROBOFORGE_CONFIG").unwrap_or_else(|_| "config/roboforge".to_string());
        let defaults = Self::default();

        let built = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("api_base", defaults.api_base)?
            .set_default("design_model", defaults.design_model)?
            .set_default("image_model", defaults.image_model)?
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(
                config::Environment::with_prefix("ROBOFORGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: Self = built.try_deserialize()?;
        cfg.api_base = cfg.api_base.trim().trim_end_matches('/').to_string();
        cfg.static_dir = cfg.static_dir.filter(|d| !d.trim().is_empty());
        cfg.api_key = api_key_from_env();
        Ok(cfg)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `API_KEY`, falling back to `GEMINI_API_KEY`. Blank counts as missing.
fn api_key_from_env() -> Option<String> {
    ["API_KEY", "GEMINI_API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_port_3000() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
        assert_eq!(cfg.design_model, "gemini-3-flash-preview");
        assert_eq!(cfg.image_model, "gemini-2.5-flash-image");
        assert!(cfg.api_key.is_none());
    }
}
