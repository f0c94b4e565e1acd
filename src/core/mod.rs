pub mod chat_stream;
pub mod config;
pub mod error;
pub mod generation;
pub mod notify;
pub mod prompts;
pub mod providers;
