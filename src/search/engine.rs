//! Retrieval service - combines an embedding provider and the example store

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::embedding::Embedder;
use super::store::ExampleStore;
use crate::core::error::{RagError, Result};
use crate::core::example::{Example, NewExample};

/// Number of examples returned by a search when the caller does not say.
pub const DEFAULT_TOP_K: i64 = 3;

/// Search hit in its public shape.
#[derive(Debug, Clone, Serialize)]
pub struct ExampleMatch {
    pub question: String,
    pub answer: String,
    pub score: i64,
    pub category: String,
    pub similarity: f32,
}

impl From<(Example, f32)> for ExampleMatch {
    fn from((example, similarity): (Example, f32)) -> Self {
        Self {
            question: example.question,
            answer: example.answer,
            score: example.score,
            category: example.category,
            similarity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOutcome {
    pub id: String,
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Ok,
    Empty,
}

impl StoreStatus {
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::Empty
        } else {
            Self::Ok
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_examples: usize,
    pub status: StoreStatus,
}

/// Bulk import statistics
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub added: usize,
    pub failed: usize,
    pub total_count: usize,
    pub duration_ms: u64,
}

/// Add/search/stats/clear over one example store.
///
/// The store sits behind a read/write lock: every operation takes the read
/// side except [`clear_all`](Self::clear_all), which takes the write side and
/// is therefore serialized against all of them. Embedding calls run before
/// any lock is taken, and the similarity scan runs on the blocking pool.
pub struct RetrievalService {
    embedder: Arc<dyn Embedder>,
    store: Arc<RwLock<ExampleStore>>,
}

impl RetrievalService {
    pub fn new(store: ExampleStore, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Examples whose questions are nearest to `question`.
    ///
    /// `top_k` values below 1 are raised to 1. An empty store yields an empty
    /// list.
    pub async fn search(&self, question: &str, top_k: i64) -> Result<Vec<ExampleMatch>> {
        if question.trim().is_empty() {
            return Err(RagError::validation("question is required"));
        }
        let k = usize::try_from(top_k.max(1)).unwrap_or(usize::MAX);

        info!(
            question = %preview(question),
            top_k = k,
            "Search request"
        );
        let query = self.embedder.embed(question).await?;

        // The linear scan is blocking SQLite work; the read guard moves with it.
        let store = self.store.clone().read_owned().await;
        let hits = tokio::task::spawn_blocking(move || store.query(&query, k))
            .await
            .map_err(|e| RagError::store(format!("search task failed: {}", e)))??;
        if hits.is_empty() {
            warn!("Search returned no examples");
        } else {
            info!(results = hits.len(), best = hits[0].1, "Search complete");
        }

        Ok(hits.into_iter().map(ExampleMatch::from).collect())
    }

    /// Validate, embed and store one example.
    ///
    /// Validation runs before the embedding call; an embedding failure leaves
    /// the store untouched.
    pub async fn add_example(&self, example: NewExample) -> Result<AddOutcome> {
        let draft = example.validate()?;

        info!(
            question = %preview(&draft.question),
            score = draft.score,
            category = %draft.category,
            "Adding example"
        );
        let embedding = self.embedder.embed(&draft.question).await?;

        let store = self.store.read().await;
        let id = store.add(&draft, &embedding)?;
        let total_count = store.count()?;

        info!(id = %id, total = total_count, "Example stored");
        Ok(AddOutcome { id, total_count })
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let total_examples = self.count().await?;
        Ok(StoreStats {
            total_examples,
            status: StoreStatus::from_count(total_examples),
        })
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.read().await.count()
    }

    /// Remove every example. Calling it on an empty store is a no-op.
    pub async fn clear_all(&self) -> Result<()> {
        let store = self.store.write().await;
        store.clear()?;
        info!("All examples cleared");
        Ok(())
    }

    pub async fn get_example(&self, id: &str) -> Result<Example> {
        self.store
            .read()
            .await
            .get(id)?
            .ok_or_else(|| RagError::NotFound { id: id.to_string() })
    }

    /// Delete a single example; returns the remaining count.
    pub async fn remove_example(&self, id: &str) -> Result<usize> {
        let store = self.store.read().await;
        if !store.remove(id)? {
            return Err(RagError::NotFound { id: id.to_string() });
        }
        info!(id = %id, "Example removed");
        store.count()
    }

    /// Add examples one by one; failures are logged and counted.
    pub async fn import(&self, examples: Vec<NewExample>) -> Result<ImportReport> {
        let start = Instant::now();
        let total = examples.len();
        let mut report = ImportReport::default();

        for (i, example) in examples.into_iter().enumerate() {
            match self.add_example(example).await {
                Ok(outcome) => {
                    report.added += 1;
                    info!(item = i + 1, total = total, id = %outcome.id, "Imported");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(item = i + 1, total = total, error = %e, "Import failed");
                }
            }
        }

        report.total_count = self.count().await?;
        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }
}

/// First 50 characters of a text, for log lines.
fn preview(text: &str) -> String {
    if text.chars().count() > 50 {
        format!("{}...", text.chars().take(50).collect::<String>())
    } else {
        text.to_string()
    }
}
