//! Thin presentation binding over [`crate::core::generation::GenerationState`].

pub mod markdown;
pub mod stream_printer;
