//! Generation Orchestrator: mandatory design step, then a best-effort image step.
//!
//! Steps run sequentially so a failure is always attributable: anything that goes wrong before
//! `DesignReady` is a design failure and aborts the submission. Image failures are logged and
//! swallowed; the design is returned either way.

use std::future::Future;
use std::sync::Arc;

use crate::design::GenerationResult;
use crate::error::{ForgeResult, GenerationError};
use crate::normalizer::ResultNormalizer;
use crate::service::{DesignService, ImageService};

/// Per-submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    DesigningInFlight,
    /// Terminal; error is shown.
    DesignFailed,
    DesignReady,
    ImagingInFlight,
    ImageReady,
    ImageFailed,
    /// Terminal; design is rendered regardless of image outcome.
    Complete,
}

impl SubmissionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionPhase::DesignFailed | SubmissionPhase::Complete)
    }
}

/// Callback notified on every phase transition (UI spinners, progress lines).
pub type PhaseObserver = Arc<dyn Fn(SubmissionPhase) + Send + Sync>;

/// Await `step`; on error log it and yield `None` instead of propagating.
pub async fn best_effort<T, F>(step: &'static str, fut: F) -> Option<T>
where
    F: Future<Output = ForgeResult<T>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(step, error = %e, "best-effort step failed; continuing without it");
            None
        }
    }
}

pub struct GenerationOrchestrator {
    design: Arc<dyn DesignService>,
    image: Arc<dyn ImageService>,
    normalizer: ResultNormalizer,
    observer: Option<PhaseObserver>,
}

impl GenerationOrchestrator {
    pub fn new(design: Arc<dyn DesignService>, image: Arc<dyn ImageService>) -> Self {
        Self {
            design,
            image,
            normalizer: ResultNormalizer::default(),
            observer: None,
        }
    }

    pub fn with_normalizer(mut self, normalizer: ResultNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_observer(mut self, observer: PhaseObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    fn enter(&self, phase: SubmissionPhase) {
        tracing::debug!(?phase, "submission phase");
        if let Some(observer) = &self.observer {
            observer(phase);
        }
    }

    /// Produce one [`GenerationResult`] for `prompt`, or the design step's error.
    pub async fn generate(&self, prompt: &str) -> ForgeResult<GenerationResult> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        tracing::info!(prompt = %prompt, "generating design");
        self.enter(SubmissionPhase::DesigningInFlight);
        let design = match self.design.generate_design(prompt).await {
            Ok(raw) => self.normalizer.normalize(&raw),
            Err(e) => Err(e),
        };
        let design = match design {
            Ok(design) => design,
            Err(e) => {
                tracing::error!(error = %e, "design generation failed");
                self.enter(SubmissionPhase::DesignFailed);
                return Err(e);
            }
        };
        self.enter(SubmissionPhase::DesignReady);

        self.enter(SubmissionPhase::ImagingInFlight);
        let image_url = match best_effort("image", self.image.generate_image(prompt)).await {
            Some(url) => {
                if url.is_none() {
                    tracing::info!("image service returned no image");
                }
                self.enter(SubmissionPhase::ImageReady);
                url
            }
            None => {
                self.enter(SubmissionPhase::ImageFailed);
                None
            }
        };

        self.enter(SubmissionPhase::Complete);
        tracing::info!(name = %design.name, has_image = image_url.is_some(), "design ready");
        Ok(GenerationResult::new(design, image_url))
    }
}
