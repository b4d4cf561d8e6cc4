//! Photo Describe Adapters - External adapters for photo-describe.
//!
//! This crate provides adapters for:
//! - JSON checkpoint persistence
//! - Append-only text output
//! - The Ollama chat API as a description service

pub mod checkpoint;
pub mod ollama;
pub mod output;

pub use checkpoint::JsonCheckpointStore;
pub use ollama::OllamaClient;
pub use output::TextFileSink;
