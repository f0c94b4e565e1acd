use std::error::Error;
use std::fmt;

const HINT_WIDTH: usize = 45;

const CONFIG_QUICK_FIXES: &[&str] = &[
    "ai-translate config set api-key-env NAME     # Read the key from another variable",
    "ai-translate config show                     # Inspect effective settings",
];

/// Provider settings could not be resolved for a generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    MissingApiKey { env_var: String },
    InvalidBaseUrl { url: String, reason: String },
    Unreadable(String),
}

impl ConfigurationError {
    pub fn quick_fixes(&self) -> Vec<String> {
        let mut fixes = Vec::with_capacity(CONFIG_QUICK_FIXES.len() + 1);
        if let ConfigurationError::MissingApiKey { env_var } = self {
            let export = format!("export {env_var}=sk-...");
            fixes.push(format!("{export:<HINT_WIDTH$}# Provide an API key"));
        }
        fixes.extend(CONFIG_QUICK_FIXES.iter().map(|fix| fix.to_string()));
        fixes
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::MissingApiKey { env_var } => {
                write!(f, "No API key configured: ${env_var} is not set")
            }
            ConfigurationError::InvalidBaseUrl { url, reason } => {
                write!(f, "Invalid API base URL '{url}': {reason}")
            }
            ConfigurationError::Unreadable(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigurationError {}

/// The request or stream failed for a reason other than cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The connection could not be established or broke mid-stream.
    Network(String),
    /// The provider answered with a non-success status.
    Status { status: u16, message: String },
    /// The provider sent an error payload inside the event stream.
    Provider(String),
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Network(message) => write!(f, "Network error: {message}"),
            TransportFailure::Status { status, message } => {
                write!(f, "HTTP {status}: {message}")
            }
            TransportFailure::Provider(message) => write!(f, "{message}"),
        }
    }
}

impl Error for TransportFailure {}

/// A failure recorded in `GenerationState::error`.
///
/// Cancellation is deliberately absent: a superseded or disposed generation
/// is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    EmptyInput,
    Configuration(ConfigurationError),
    Transport(TransportFailure),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::EmptyInput => write!(f, "Input text is empty"),
            GenerationError::Configuration(err) => write!(f, "Configuration error: {err}"),
            GenerationError::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GenerationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GenerationError::EmptyInput => None,
            GenerationError::Configuration(err) => Some(err),
            GenerationError::Transport(err) => Some(err),
        }
    }
}

impl From<ConfigurationError> for GenerationError {
    fn from(err: ConfigurationError) -> Self {
        GenerationError::Configuration(err)
    }
}

impl From<TransportFailure> for GenerationError {
    fn from(err: TransportFailure) -> Self {
        GenerationError::Transport(err)
    }
}
