//! Client-side configuration loaded from environment.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | ROBOFORGE_GATEWAY_URL | http://localhost:3000 | Base URL of the gateway serving `/api/*`. |
//! | ROBOFORGE_TELEMETRY_INTERVAL_MS | 1000 | Telemetry tick period. |
//! | ROBOFORGE_TELEMETRY_WINDOW | 20 | Samples kept in the telemetry window. |

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::DEFAULT_WINDOW_LEN;

const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";
const DEFAULT_TELEMETRY_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Gateway base URL without trailing slash.
    pub gateway_url: String,
    pub telemetry_interval_ms: u64,
    pub telemetry_window: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            telemetry_interval_ms: DEFAULT_TELEMETRY_INTERVAL_MS,
            telemetry_window: DEFAULT_WINDOW_LEN,
        }
    }
}

impl ClientConfig {
    /// Load from environment. Unset or invalid => defaults.
    pub fn from_env() -> Self {
        let gateway_url = env_opt_string("ROBOFORGE_GATEWAY_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());
        Self {
            gateway_url,
            telemetry_interval_ms: env_parse("ROBOFORGE_TELEMETRY_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_TELEMETRY_INTERVAL_MS),
            telemetry_window: env_parse("ROBOFORGE_TELEMETRY_WINDOW")
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_WINDOW_LEN),
        }
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_opt_string(name).and_then(|v| v.parse().ok())
}
