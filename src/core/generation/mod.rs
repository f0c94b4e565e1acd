//! Streaming generation controller.
//!
//! A [`GenerationController`] owns one observable [`GenerationState`] and at
//! most one in-flight attempt. Every attempt runs under its own
//! [`CancellationScope`]; starting a new attempt (new input or retry) cancels
//! the previous scope before anything else happens, and the consumer loop
//! applies each fragment only while its scope is still active. A superseded or
//! disposed attempt therefore can never write into the state of a newer one.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::chat_stream::{ModelClient, StreamError};
use crate::core::error::GenerationError;
use crate::core::notify::{GenerationEvent, GenerationNotifier, TracingNotifier};
use crate::core::providers::SettingsSource;


/// The text one attempt runs against. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    input_text: String,
}

impl GenerationRequest {
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
        }
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn is_empty(&self) -> bool {
        self.input_text.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationState {
    pub accumulated_text: String,
    pub is_loading: bool,
    pub error: Option<GenerationError>,
}

impl GenerationState {
    fn loading() -> Self {
        Self {
            accumulated_text: String::new(),
            is_loading: true,
            error: None,
        }
    }

    fn failed(error: GenerationError) -> Self {
        Self {
            accumulated_text: String::new(),
            is_loading: false,
            error: Some(error),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_loading
    }
}

/// Lifetime boundary of one attempt's cancellation token. Once cancelled it
/// stays cancelled.
#[derive(Debug)]
pub struct CancellationScope {
    attempt: u64,
    token: CancellationToken,
}

impl CancellationScope {
    fn new(attempt: u64) -> Self {
        Self {
            attempt,
            token: CancellationToken::new(),
        }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// How one attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed(GenerationError),
    Cancelled,
}

pub struct GenerationController {
    client: Arc<dyn ModelClient>,
    settings: Arc<dyn SettingsSource>,
    notifier: Arc<dyn GenerationNotifier>,
    system_prompt: Arc<str>,
    state: Arc<watch::Sender<GenerationState>>,
    scope: Option<CancellationScope>,
    request: Option<GenerationRequest>,
    task: Option<JoinHandle<StreamOutcome>>,
    attempts: u64,
    disposed: bool,
}

impl GenerationController {
    pub fn new(
        client: Arc<dyn ModelClient>,
        settings: Arc<dyn SettingsSource>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            client,
            settings,
            notifier: Arc::new(TracingNotifier),
            system_prompt: Arc::from(system_prompt.into()),
            state: Arc::new(state),
            scope: None,
            request: None,
            task: None,
            attempts: 0,
            disposed: false,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn GenerationNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Attempt number of the active scope, if any attempt has been made.
    pub fn current_attempt(&self) -> Option<u64> {
        self.scope.as_ref().map(CancellationScope::attempt)
    }

    pub fn request(&self) -> Option<&GenerationRequest> {
        self.request.as_ref()
    }

    /// Begins a generation for `input`, superseding any attempt running for a
    /// different input. Must be called from within a Tokio runtime.
    pub fn start(&mut self, input: impl Into<String>) -> watch::Receiver<GenerationState> {
        let request = GenerationRequest::new(input);

        if self.is_running_for(&request) {
            debug!(
                attempt = self.current_attempt(),
                "Input unchanged while generating; keeping current attempt"
            );
        } else {
            self.launch(request);
        }

        self.subscribe()
    }

    /// Re-runs the last request from a clean state.
    pub fn retry(&mut self) {
        match self.request.clone() {
            Some(request) => self.launch(request),
            None => debug!("Retry requested before any generation; ignoring"),
        }
    }

    /// Cancels the in-flight attempt and tears the controller down. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(scope) = self.scope.take() {
            scope.cancel();
            debug!(attempt = scope.attempt(), "Generation controller disposed");
        }
        self.task = None;
        self.state.send_if_modified(|state| {
            let was_loading = state.is_loading;
            state.is_loading = false;
            was_loading
        });
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Waits for the current attempt to finish. Returns `None` when no
    /// attempt is running or the attempt task panicked.
    pub async fn join(&mut self) -> Option<StreamOutcome> {
        let task = self.task.take()?;
        match task.await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(error = %err, "Generation task did not complete");
                None
            }
        }
    }

    fn is_running_for(&self, request: &GenerationRequest) -> bool {
        self.scope.as_ref().is_some_and(CancellationScope::is_active)
            && self.request.as_ref() == Some(request)
            && self.state.borrow().is_loading
    }

    fn launch(&mut self, request: GenerationRequest) {
        if self.disposed {
            debug!("Generation requested after dispose; ignoring");
            return;
        }

        // Supersede first so nothing the old attempt does can land after the reset below.
        if let Some(previous) = self.scope.take() {
            if previous.is_active() {
                debug!(attempt = previous.attempt(), "Superseding in-flight generation");
            }
            previous.cancel();
        }
        self.task = None;

        self.attempts += 1;
        let scope = CancellationScope::new(self.attempts);
        let attempt = scope.attempt();
        let token = scope.token();
        self.scope = Some(scope);
        self.request = Some(request.clone());

        if request.is_empty() {
            let error = GenerationError::EmptyInput;
            self.state.send_replace(GenerationState::failed(error.clone()));
            self.notifier
                .notify(&GenerationEvent::Failed { attempt, error });
            return;
        }

        self.state.send_replace(GenerationState::loading());

        let attempt_ctx = Attempt {
            attempt,
            request,
            token,
            client: Arc::clone(&self.client),
            settings: Arc::clone(&self.settings),
            notifier: Arc::clone(&self.notifier),
            system_prompt: Arc::clone(&self.system_prompt),
            state: Arc::clone(&self.state),
        };
        self.task = Some(tokio::spawn(attempt_ctx.run()));
    }
}

impl Drop for GenerationController {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Everything one spawned attempt needs; owns clones, never the controller.
struct Attempt {
    attempt: u64,
    request: GenerationRequest,
    token: CancellationToken,
    client: Arc<dyn ModelClient>,
    settings: Arc<dyn SettingsSource>,
    notifier: Arc<dyn GenerationNotifier>,
    system_prompt: Arc<str>,
    state: Arc<watch::Sender<GenerationState>>,
}

impl Attempt {
    async fn run(self) -> StreamOutcome {
        let outcome = match self.consume().await {
            StreamOutcome::Completed => {
                let mut chars = 0;
                let applied = self.publish(|state| {
                    state.is_loading = false;
                    chars = state.accumulated_text.chars().count();
                });
                if applied {
                    self.notifier.notify(&GenerationEvent::Completed {
                        attempt: self.attempt,
                        chars,
                    });
                    StreamOutcome::Completed
                } else {
                    StreamOutcome::Cancelled
                }
            }
            StreamOutcome::Failed(error) => {
                let applied = self.publish(|state| {
                    state.is_loading = false;
                    state.error = Some(error.clone());
                });
                if applied {
                    self.notifier.notify(&GenerationEvent::Failed {
                        attempt: self.attempt,
                        error: error.clone(),
                    });
                    StreamOutcome::Failed(error)
                } else {
                    StreamOutcome::Cancelled
                }
            }
            StreamOutcome::Cancelled => StreamOutcome::Cancelled,
        };

        if outcome == StreamOutcome::Cancelled {
            self.notifier.notify(&GenerationEvent::Cancelled {
                attempt: self.attempt,
            });
        }
        outcome
    }

    async fn consume(&self) -> StreamOutcome {
        let settings = match self.settings.resolve() {
            Ok(settings) => settings,
            Err(err) => return self.failed(err.into()),
        };

        if self.token.is_cancelled() {
            return StreamOutcome::Cancelled;
        }

        let opened = self
            .client
            .stream_completion(
                &settings,
                &self.system_prompt,
                self.request.input_text(),
                self.token.clone(),
            )
            .await;
        let mut fragments = match opened {
            Ok(fragments) => fragments,
            Err(err) => return self.classify(err),
        };

        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    if !self.publish(|state| state.accumulated_text.push_str(&fragment)) {
                        return StreamOutcome::Cancelled;
                    }
                }
                Err(err) => return self.classify(err),
            }
        }

        if self.token.is_cancelled() {
            StreamOutcome::Cancelled
        } else {
            StreamOutcome::Completed
        }
    }

    fn classify(&self, err: StreamError) -> StreamOutcome {
        match err {
            StreamError::Cancelled => StreamOutcome::Cancelled,
            StreamError::Failed(failure) => self.failed(failure.into()),
        }
    }

    /// A transport error raised because we aborted is still a cancellation.
    fn failed(&self, error: GenerationError) -> StreamOutcome {
        if self.token.is_cancelled() {
            StreamOutcome::Cancelled
        } else {
            StreamOutcome::Failed(error)
        }
    }

    /// Applies `mutate` under the state lock only while this attempt's scope
    /// is active. Returns whether it was applied.
    fn publish(&self, mutate: impl FnOnce(&mut GenerationState)) -> bool {
        self.state.send_if_modified(|state| {
            if self.token.is_cancelled() {
                return false;
            }
            mutate(state);
            true
        })
    }
}
