//! Embedding-backed retrieval of curated examples.
//!
//! - `embedding`: provider trait, local HTP embedder, cosine similarity
//! - `gemini`: Gemini `embedContent` client
//! - `store`: SQLite example store with nearest-neighbour query
//! - `engine`: retrieval service (add/search/stats/clear)

pub mod embedding;
pub mod engine;
pub mod gemini;
pub mod store;

use std::sync::Arc;

use crate::core::config::{Config, EmbedderKind};
use crate::core::error::Result;

pub use embedding::{cosine_similarity, Embedder, HtpEmbedder};
pub use engine::{ExampleMatch, RetrievalService, StoreStats, StoreStatus};
pub use gemini::GeminiEmbedder;
pub use store::ExampleStore;

/// Build the embedding provider selected by the configuration.
pub fn embedder_from_config(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embedder {
        EmbedderKind::Gemini => Ok(Arc::new(GeminiEmbedder::from_config(config)?)),
        EmbedderKind::Local => Ok(Arc::new(HtpEmbedder::new())),
    }
}
