//! CLI subcommands.

pub mod add;
pub mod clear;
pub mod import;
pub mod remove;
pub mod search;
pub mod serve;
pub mod stats;

use anyhow::{Context, Result};

use raon_rag::search::embedder_from_config;
use raon_rag::{Config, DataPaths, ExampleStore, RetrievalService};

/// Open the on-disk store and the configured embedder.
pub fn open_service(config: &Config) -> Result<RetrievalService> {
    let paths = DataPaths::from_root(config.data_dir.clone());
    paths
        .ensure_dirs()
        .with_context(|| format!("Failed to create data directory {}", paths.root.display()))?;

    let store = ExampleStore::open(&paths.db)
        .with_context(|| format!("Failed to open example store {}", paths.db.display()))?;
    let embedder = embedder_from_config(config).context("Failed to set up embedding provider")?;

    Ok(RetrievalService::new(store, embedder))
}

/// Open the store without an embedder, for commands that never embed.
pub fn open_store(config: &Config) -> Result<ExampleStore> {
    let paths = DataPaths::from_root(config.data_dir.clone());
    paths.ensure_dirs()?;
    ExampleStore::open(&paths.db)
        .with_context(|| format!("Failed to open example store {}", paths.db.display()))
}
