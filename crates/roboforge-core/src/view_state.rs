//! Prompt Intake / View State.
//!
//! Holds what the front end renders: prompt text, loading flag, last error, last successful
//! result, and the telemetry window. Every submission gets a monotonically increasing
//! [`SubmissionToken`]; a completion carrying anything but the latest token is stale and dropped,
//! so the most recent submission always determines what is displayed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::design::GenerationResult;
use crate::error::{ForgeResult, GenerationError};
use crate::orchestrator::GenerationOrchestrator;
use crate::telemetry::{TelemetryTicker, TelemetryWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmissionToken(u64);

impl SubmissionToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct ViewState {
    prompt: String,
    loading: bool,
    error: Option<String>,
    result: Option<GenerationResult>,
    telemetry: TelemetryWindow,
    latest_token: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(TelemetryWindow::default())
    }
}

impl ViewState {
    pub fn new(telemetry: TelemetryWindow) -> Self {
        Self {
            prompt: String::new(),
            loading: false,
            error: None,
            result: None,
            telemetry,
            latest_token: 0,
        }
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn telemetry(&self) -> &TelemetryWindow {
        &self.telemetry
    }

    /// Validate the prompt and mark a submission in flight.
    ///
    /// Blank prompts are rejected without touching the network; a second submission while
    /// loading is refused.
    pub fn begin_submission(&mut self) -> ForgeResult<SubmissionToken> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        if self.loading {
            return Err(GenerationError::Busy);
        }
        self.supersede_submission()
    }

    /// Start a submission even if one is in flight. The older one keeps running but its
    /// completion will be discarded.
    pub fn supersede_submission(&mut self) -> ForgeResult<SubmissionToken> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        self.latest_token += 1;
        self.loading = true;
        self.error = None;
        Ok(SubmissionToken(self.latest_token))
    }

    /// Apply a finished submission. Returns `false` (and changes nothing) for a stale token.
    ///
    /// A failure keeps the previous result on screen and sets the inline error message.
    pub fn complete_submission(
        &mut self,
        token: SubmissionToken,
        outcome: ForgeResult<GenerationResult>,
    ) -> bool {
        if token.0 != self.latest_token {
            tracing::debug!(
                token = token.0,
                latest = self.latest_token,
                "discarding stale generation result"
            );
            return false;
        }
        self.loading = false;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.user_message());
            }
        }
        true
    }

    pub fn tick_telemetry(&mut self) {
        self.telemetry.tick(&mut rand::thread_rng());
    }
}

/// Async glue between the view state and the orchestrator.
#[derive(Clone)]
pub struct Workbench {
    state: Arc<RwLock<ViewState>>,
    orchestrator: Arc<GenerationOrchestrator>,
}

impl Workbench {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, state: ViewState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            orchestrator,
        }
    }

    pub fn state(&self) -> Arc<RwLock<ViewState>> {
        Arc::clone(&self.state)
    }

    pub async fn set_prompt(&self, prompt: impl Into<String>) {
        self.state.write().await.set_prompt(prompt);
    }

    /// Run one submission end to end. The lock is not held across network calls.
    ///
    /// Returns the error surfaced to the user, if any. Validation failures (`EmptyPrompt`,
    /// `Busy`) are returned without being written into the view.
    pub async fn submit(&self) -> ForgeResult<()> {
        self.run(false).await
    }

    /// Like [`Workbench::submit`], but replaces any submission already in flight.
    pub async fn resubmit(&self) -> ForgeResult<()> {
        self.run(true).await
    }

    async fn run(&self, supersede: bool) -> ForgeResult<()> {
        let (token, prompt) = {
            let mut state = self.state.write().await;
            let token = if supersede {
                state.supersede_submission()?
            } else {
                state.begin_submission()?
            };
            (token, state.prompt().to_string())
        };

        let outcome = self.orchestrator.generate(&prompt).await;
        let surfaced = outcome.as_ref().err().cloned();

        let applied = self.state.write().await.complete_submission(token, outcome);
        match surfaced {
            Some(e) if applied => Err(e),
            _ => Ok(()),
        }
    }

    /// Start ticking the telemetry window every `period`; stops when the ticker is dropped.
    pub fn start_telemetry(&self, period: Duration) -> TelemetryTicker {
        let state = Arc::clone(&self.state);
        TelemetryTicker::spawn(period, move || {
            let state = Arc::clone(&state);
            async move {
                state.write().await.tick_telemetry();
            }
        })
    }
}
