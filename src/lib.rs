//! raon-rag library
//!
//! Retrieval of curated interview answers by question similarity.
//!
//! # Modules
//!
//! - `core`: configuration, errors, example records, logging
//! - `search`: embedding providers, example store, retrieval service
//! - `server`: HTTP API
//! - `mcp`: MCP server exposing the same operations as tools

pub mod core;
pub mod search;
pub mod server;

#[cfg(feature = "mcp")]
pub mod mcp;

// Re-exports for convenience
pub use crate::core::config::{Config, EmbedderKind};
pub use crate::core::error::{RagError, Result};
pub use crate::core::example::{Example, ExampleDraft, NewExample, DEFAULT_CATEGORY};
pub use crate::core::paths::DataPaths;
pub use crate::search::{
    Embedder, ExampleMatch, ExampleStore, RetrievalService, StoreStats, StoreStatus,
};
