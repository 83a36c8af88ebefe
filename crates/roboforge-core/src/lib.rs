//! RoboForge core library.
//! Design normalization, generation orchestration, view state and synthetic telemetry
//! shared by the gateway and the front ends.

pub mod client;
pub mod config;
pub mod design;
pub mod error;
pub mod normalizer;
pub mod orchestrator;
pub mod service;
pub mod telemetry;
pub mod view_state;

pub use client::HttpGenerationClient;
pub use config::ClientConfig;
pub use design::{Component, GenerationResult, RobotDesign};
pub use error::{ForgeResult, GenerationError, MISSING_API_KEY_MESSAGE};
pub use normalizer::{BalancedObject, Extractor, FencedBlock, RawText, ResultNormalizer};
pub use orchestrator::{best_effort, GenerationOrchestrator, PhaseObserver, SubmissionPhase};
pub use service::{DesignRequest, DesignService, ErrorBody, ImageRequest, ImageResponse, ImageService};
pub use telemetry::{TelemetrySample, TelemetryTicker, TelemetryWindow};
pub use view_state::{SubmissionToken, ViewState, Workbench};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
