//! Command-line interface parsing and handling
//!
//! This module parses arguments, captures the input text, and runs one
//! generation session in the terminal.

pub mod config_cmd;
pub mod input;
pub mod session;

use std::error::Error;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::cli::config_cmd::{run_config, ConfigAction};
use crate::cli::input::{capture_input, InputError};
use crate::cli::session::{run_session, SessionOptions};
use crate::core::chat_stream::HttpModelClient;
use crate::core::config::Config;
use crate::core::error::GenerationError;
use crate::core::generation::GenerationController;
use crate::core::prompts::Task;
use crate::core::providers::{ConfigFileSettings, SettingsOverrides};
use crate::utils::logging::init_tracing;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "ai-translate", version, long_version = LONG_VERSION)]
#[command(about = "Translate or summarize text by streaming it through an LLM")]
#[command(
    long_about = "ai-translate sends text to an OpenAI-compatible chat-completion API and \
streams the answer to the terminal as it arrives.\n\n\
Text is taken from the command-line arguments, or from stdin when none are given.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY          API key (the variable name is configurable with api-key-env)\n\
  AI_TRANSLATE_BASE_URL   Override the API base URL\n\
  AI_TRANSLATE_MODEL      Override the model\n\
  RUST_LOG                Log filter for diagnostics on stderr"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this run
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// API base URL to use for this run
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Print a markdown result view instead of streaming raw text
    #[arg(long, global = true)]
    pub markdown: bool,

    /// Enable debug logging on stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Translate text (default)
    Translate {
        /// Target language (defaults to the configured target-language)
        #[arg(short = 't', long = "to", value_name = "LANGUAGE")]
        target_language: Option<String>,
        /// Text to translate; read from stdin when omitted
        text: Vec<String>,
    },
    /// Summarize text
    Summarize {
        /// Text to summarize; read from stdin when omitted
        text: Vec<String>,
    },
    /// Show or edit the configuration file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let command = args.command.unwrap_or(Commands::Translate {
        target_language: None,
        text: Vec::new(),
    });
    let overrides = SettingsOverrides {
        base_url: args.base_url,
        model: args.model,
    };

    match command {
        Commands::Config { action } => run_config(action),
        Commands::Translate {
            target_language,
            text,
        } => {
            let config = load_config_or_default();
            let language = target_language
                .unwrap_or_else(|| config.effective_target_language().to_string());
            let markdown = args.markdown || config.markdown_enabled();
            run_generation(Task::translate(language), &text, overrides, markdown).await
        }
        Commands::Summarize { text } => {
            let markdown = args.markdown || load_config_or_default().markdown_enabled();
            run_generation(Task::Summarize, &text, overrides, markdown).await
        }
    }
}

async fn run_generation(
    task: Task,
    text: &[String],
    overrides: SettingsOverrides,
    markdown: bool,
) -> Result<(), Box<dyn Error>> {
    let input = match capture_input(text, io::stdin().lock()) {
        Ok(input) => input,
        Err(err @ InputError::NoText) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    let mut controller = GenerationController::new(
        Arc::new(HttpModelClient::default()),
        Arc::new(ConfigFileSettings::new(overrides)),
        task.system_prompt(),
    );
    let options = SessionOptions { task, markdown };
    let interactive = io::stdin().is_terminal() && io::stderr().is_terminal();

    let mut stdout = io::stdout();
    let state = run_session(&mut controller, &input, &options, &mut stdout, |error| {
        report_error(error);
        interactive && confirm_retry()
    })
    .await?;
    controller.dispose();

    if state.error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}

/// Config problems only matter for the attempt itself, which reports them;
/// fall back to defaults for the task options.
fn load_config_or_default() -> Config {
    Config::load().unwrap_or_else(|err| {
        warn!(error = %err, "Could not load config; using defaults");
        Config::default()
    })
}

fn report_error(error: &GenerationError) {
    eprintln!("❌ {error}");
    if let GenerationError::Configuration(config_error) = error {
        eprintln!();
        eprintln!("💡 Quick fixes:");
        for fix in config_error.quick_fixes() {
            eprintln!("  • {fix}");
        }
    }
}

fn confirm_retry() -> bool {
    eprint!("Retry? [y/N] ");
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(_) => false,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
