//! Observational hooks fired at the end of each generation attempt.
//!
//! Notifiers never feed back into controller state; they exist so a host can
//! show a toast or write a log line.

use crate::core::error::GenerationError;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    Completed { attempt: u64, chars: usize },
    Failed { attempt: u64, error: GenerationError },
    Cancelled { attempt: u64 },
}

pub trait GenerationNotifier: Send + Sync {
    fn notify(&self, event: &GenerationEvent);
}

/// Default notifier: routes events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl GenerationNotifier for TracingNotifier {
    fn notify(&self, event: &GenerationEvent) {
        match event {
            GenerationEvent::Completed { attempt, chars } => {
                info!(attempt, chars, "Generation completed");
            }
            GenerationEvent::Failed { attempt, error } => {
                info!(attempt, error = %error, "Generation failed");
            }
            GenerationEvent::Cancelled { attempt } => {
                debug!(attempt, "Generation cancelled");
            }
        }
    }
}
