//! ai-translate streams text through an OpenAI-compatible chat-completion API and
//! renders the translation (or summary) as it arrives.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the generation controller, the streaming model client, the
//!   configuration collaborator, and prompt construction.
//! - [`ui`] renders generation state as markdown and streams it to a terminal.
//! - [`api`] defines the chat-completion payloads exchanged with providers.
//! - [`cli`] captures input text and drives a session.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
