use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use memchr::memchr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{ChatRequest, ChatResponse};
use crate::core::error::TransportFailure;
use crate::core::prompts::build_messages;
use crate::core::providers::ProviderSettings;

/// Why a fragment stream stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The cancellation token fired. Not a failure.
    Cancelled,
    Failed(TransportFailure),
}

impl From<TransportFailure> for StreamError {
    fn from(err: TransportFailure) -> Self {
        StreamError::Failed(err)
    }
}

/// Lazily delivered text increments of one completion. Finite and not restartable.
pub type FragmentStream = BoxStream<'static, Result<String, StreamError>>;

/// Opens streaming chat completions. Implementations hold no per-call state.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn stream_completion(
        &self,
        settings: &ProviderSettings,
        system_prompt: &str,
        user_input: &str,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, StreamError>;
}

/// `ModelClient` for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Clone, Default)]
pub struct HttpModelClient {
    client: reqwest::Client,
}

impl HttpModelClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn stream_completion(
        &self,
        settings: &ProviderSettings,
        system_prompt: &str,
        user_input: &str,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, StreamError> {
        let request = ChatRequest {
            model: settings.model.clone(),
            messages: build_messages(system_prompt, user_input),
            stream: true,
        };

        let http_request = self
            .client
            .post(settings.completions_url())
            .header("Content-Type", "application/json")
            .bearer_auth(&settings.api_key)
            .json(&request);

        debug!(model = %settings.model, "Opening completion stream");
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            result = http_request.send() => result
                .map_err(|err| TransportFailure::Network(err.to_string()))?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                text = response.text() => text.unwrap_or_else(|_| "<no body>".to_string()),
            };
            return Err(StreamError::Failed(TransportFailure::Status {
                status: status.as_u16(),
                message: format_api_error(&body),
            }));
        }

        Ok(sse_fragments(response.bytes_stream(), cancel))
    }
}

/// One decoded server-sent-event line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Fragment(String),
    Done,
    Error(String),
    Ignore,
}

pub fn parse_sse_line(line: &str) -> SseEvent {
    let Some(payload) = line.strip_prefix("data:").map(str::trim_start) else {
        return SseEvent::Ignore;
    };

    if payload == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .map(SseEvent::Fragment)
            .unwrap_or(SseEvent::Ignore),
        Err(_) if payload.trim().is_empty() => SseEvent::Ignore,
        Err(_) => SseEvent::Error(format_api_error(payload)),
    }
}

struct SseState {
    bytes: BoxStream<'static, Result<Vec<u8>, String>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, StreamError>>,
    finished: bool,
    cancel_reported: bool,
    cancel: CancellationToken,
}

impl SseState {
    /// Moves every complete line out of the buffer. Returns true once the
    /// stream has ended (`[DONE]` or a provider error).
    fn drain_lines(&mut self) -> bool {
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if self.apply_line(&line[..newline_pos]) {
                self.buffer.clear();
                return true;
            }
        }
        false
    }

    fn flush_remainder(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let rest = std::mem::take(&mut self.buffer);
        self.apply_line(&rest);
    }

    fn apply_line(&mut self, raw: &[u8]) -> bool {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(err) => {
                warn!(error = %err, "Invalid UTF-8 in completion stream");
                self.pending
                    .push_back(Err(StreamError::Failed(TransportFailure::Network(format!(
                        "Undecodable completion stream: {err}"
                    )))));
                return true;
            }
        };

        match parse_sse_line(line) {
            SseEvent::Fragment(text) => {
                self.pending.push_back(Ok(text));
                false
            }
            SseEvent::Done => true,
            SseEvent::Error(message) => {
                self.pending
                    .push_back(Err(StreamError::Failed(TransportFailure::Provider(message))));
                true
            }
            SseEvent::Ignore => false,
        }
    }
}

enum Step {
    Cancelled,
    Next(Option<Result<Vec<u8>, String>>),
}

/// Turns a raw SSE byte stream into text fragments.
///
/// Once `cancel` fires the stream yields a single `StreamError::Cancelled`
/// and ends, dropping anything already buffered.
pub fn sse_fragments<S, B, E>(bytes: S, cancel: CancellationToken) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + 'static,
    E: fmt::Display + 'static,
{
    let bytes = bytes
        .map(|chunk| {
            chunk
                .map(|data| data.as_ref().to_vec())
                .map_err(|err| err.to_string())
        })
        .boxed();

    let state = SseState {
        bytes,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
        cancel_reported: false,
        cancel,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.cancel.is_cancelled() {
                if state.cancel_reported {
                    return None;
                }
                state.cancel_reported = true;
                state.finished = true;
                state.pending.clear();
                return Some((Err(StreamError::Cancelled), state));
            }

            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            let step = tokio::select! {
                biased;
                _ = state.cancel.cancelled() => Step::Cancelled,
                next = state.bytes.next() => Step::Next(next),
            };

            match step {
                Step::Cancelled => continue,
                Step::Next(Some(Ok(chunk))) => {
                    state.buffer.extend_from_slice(&chunk);
                    if state.drain_lines() {
                        state.finished = true;
                    }
                }
                Step::Next(Some(Err(err))) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(StreamError::Failed(TransportFailure::Network(err))));
                }
                Step::Next(None) => {
                    state.finished = true;
                    state.flush_remainder();
                }
            }
        }
    })
    .boxed()
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .or_else(|| value.get("message").and_then(|v| v.as_str()))?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Renders a provider error body as a one-line summary followed by the
/// pretty-printed payload in a fenced block.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            return match extract_error_summary(&json_value) {
                Some(summary) => format!("API Error: {summary}\n```json\n{pretty_json}\n```"),
                None => format!("API Error:\n```json\n{pretty_json}\n```"),
            };
        }
    }

    let fence = if trimmed.starts_with('<') && trimmed.ends_with('>') {
        "xml"
    } else {
        ""
    };
    format!("API Error:\n```{fence}\n{trimmed}\n```")
}
