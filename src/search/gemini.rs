//! Gemini `embedContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::embedding::Embedder;
use crate::core::config::Config;
use crate::core::error::{RagError, Result};

/// Task type sent with every request; stored and queried texts share it.
const TASK_TYPE: &str = "RETRIEVAL_DOCUMENT";

#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::config("Gemini API key cannot be empty"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build from service configuration; `GEMINI_API_KEY` must be set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| RagError::config("GEMINI_API_KEY is not set"))?;
        Self::new(
            api_key,
            config.embedding_model.clone(),
            config.gemini_base_url.clone(),
            config.embed_timeout,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:embedContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: [Part { text }],
            },
            task_type: TASK_TYPE,
        };

        debug!(model = %self.model, chars = text.chars().count(), "Requesting embedding");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Gemini embedding request failed");
            return Err(RagError::embedding(format!(
                "Gemini API returned {}: {}",
                status, detail
            )));
        }

        let parsed: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| RagError::embedding(format!("malformed Gemini response: {}", e)))?;

        let values = parsed.embedding.map(|e| e.values).unwrap_or_default();
        if values.is_empty() {
            return Err(RagError::embedding("Gemini response contained no embedding values"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RagError::embedding("Gemini embedding contains non-finite values"));
        }

        debug!(dimension = values.len(), "Embedding received");
        Ok(values)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
