use std::collections::VecDeque;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::chat_stream::{FragmentStream, ModelClient, StreamError};
use crate::core::config::defaults::{BASE_URL_ENV, MODEL_ENV};
use crate::core::error::ConfigurationError;
use crate::core::notify::{GenerationEvent, GenerationNotifier};
use crate::core::providers::{ProviderSettings, SettingsSource, StaticSettings};

pub type FragmentSender = mpsc::UnboundedSender<Result<String, StreamError>>;

/// What the scripted client does for one `stream_completion` call.
pub enum ScriptedResponse {
    /// Yields every item immediately, then ends.
    Fragments(Vec<Result<String, StreamError>>),
    /// Yields whatever the test pushes through the paired sender and ends
    /// when it is dropped. Ignores cancellation, like a transport that has
    /// already buffered data.
    Channel(mpsc::UnboundedReceiver<Result<String, StreamError>>),
    /// Fails to open the stream.
    OpenError(StreamError),
    /// Never answers until cancelled.
    Hang,
    /// Opens, then fails with a network error once cancelled.
    FailOnCancel,
}

impl ScriptedResponse {
    pub fn channel() -> (FragmentSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, ScriptedResponse::Channel(rx))
    }

    pub fn text(parts: &[&str]) -> Self {
        ScriptedResponse::Fragments(parts.iter().map(|part| Ok(part.to_string())).collect())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub user_input: String,
    pub model: String,
    pub token: CancellationToken,
    /// Whether every earlier call's token was already cancelled when this call was made.
    pub earlier_cancelled: bool,
}

#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<VecDeque<ScriptedResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new(scripts: Vec<ScriptedResponse>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        wait_until(|| self.calls.lock().expect("calls lock").len() >= count).await;
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn stream_completion(
        &self,
        settings: &ProviderSettings,
        system_prompt: &str,
        user_input: &str,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, StreamError> {
        {
            let mut calls = self.calls.lock().expect("calls lock");
            let earlier_cancelled = calls.iter().all(|call| call.token.is_cancelled());
            calls.push(RecordedCall {
                system_prompt: system_prompt.to_string(),
                user_input: user_input.to_string(),
                model: settings.model.clone(),
                token: cancel.clone(),
                earlier_cancelled,
            });
        }

        let script = self
            .scripts
            .lock()
            .expect("scripts lock")
            .pop_front()
            .expect("no scripted response left");

        match script {
            ScriptedResponse::Fragments(items) => Ok(stream::iter(items).boxed()),
            ScriptedResponse::Channel(rx) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            ScriptedResponse::OpenError(err) => Err(err),
            ScriptedResponse::Hang => {
                cancel.cancelled().await;
                Err(StreamError::Cancelled)
            }
            ScriptedResponse::FailOnCancel => Ok(stream::once(async move {
                cancel.cancelled().await;
                Err(StreamError::Failed(
                    crate::core::error::TransportFailure::Network("connection aborted".into()),
                ))
            })
            .boxed()),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<GenerationEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<GenerationEvent> {
        self.events.lock().expect("events lock").clone()
    }

    pub async fn wait_for(&self, expected: &GenerationEvent) {
        wait_until(|| self.events.lock().expect("events lock").contains(expected)).await;
    }
}

impl GenerationNotifier for RecordingNotifier {
    fn notify(&self, event: &GenerationEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}

pub struct FailingSettings(pub ConfigurationError);

impl SettingsSource for FailingSettings {
    fn resolve(&self) -> Result<ProviderSettings, ConfigurationError> {
        Err(self.0.clone())
    }
}

pub fn test_settings() -> Arc<StaticSettings> {
    Arc::new(StaticSettings(ProviderSettings {
        api_key: "test-key".to_string(),
        base_url: "https://api.test.com/v1".to_string(),
        model: "test-model".to_string(),
    }))
}

/// Yields to the scheduler until `condition` holds, panicking after a second.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::task::yield_now().await;
    }
}

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Sets or removes environment variables until dropped, then restores them.
/// Holds a process-wide lock so tests touching the environment run one at a time.
pub struct EnvVarGuard {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    pub fn new(vars: &[(&'static str, Option<&str>)]) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let saved = vars
            .iter()
            .map(|&(name, value)| {
                let previous = std::env::var_os(name);
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
                (name, previous)
            })
            .collect();
        Self { saved, _lock: lock }
    }

    /// Clears the base-URL and model overrides.
    pub fn without_overrides() -> Self {
        Self::new(&[(BASE_URL_ENV, None), (MODEL_ENV, None)])
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (name, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}
