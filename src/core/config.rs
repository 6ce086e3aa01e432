//! Service configuration, read from the environment (and `.env`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::{RagError, Result};
use super::paths::DEFAULT_DATA_DIR;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 30;

/// Which embedding provider backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EmbedderKind {
    /// Gemini `embedContent` API (needs `GEMINI_API_KEY`).
    #[default]
    Gemini,
    /// Deterministic local Harmonic Token Projection; no network.
    Local,
}

impl FromStr for EmbedderKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "local" | "htp" => Ok(Self::Local),
            other => Err(RagError::config(format!(
                "unknown embedder '{}' (expected gemini or local)",
                other
            ))),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub embedder: EmbedderKind,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub embedding_model: String,
    pub embed_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            embedder: EmbedderKind::default(),
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embed_timeout: Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("RAG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(host) = get("RAG_HOST") {
            config.host = host;
        }
        if let Some(port) = get("RAG_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| RagError::config(format!("RAG_PORT is not a port: {}", port)))?;
        }
        if let Some(kind) = get("RAG_EMBEDDER") {
            config.embedder = kind.parse()?;
        }
        config.gemini_api_key = get("GEMINI_API_KEY");
        if let Some(url) = get("GEMINI_BASE_URL") {
            config.gemini_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("RAG_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Some(secs) = get("RAG_EMBED_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                RagError::config(format!("RAG_EMBED_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            if secs == 0 {
                return Err(RagError::config("RAG_EMBED_TIMEOUT_SECS must be at least 1"));
            }
            config.embed_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Listen address for the HTTP server.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| RagError::config(format!("invalid listen address: {}", e)))
    }

    /// API key shortened for log output.
    pub fn masked_api_key(&self) -> String {
        match &self.gemini_api_key {
            Some(key) => format!("{}...", key.chars().take(6).collect::<String>()),
            None => "<unset>".to_string(),
        }
    }
}
