//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use crate::search::engine::{ExampleMatch, StoreStats};

/// Name the example collection is reported under.
pub const COLLECTION_NAME: &str = "interview_examples";

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub top_k: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub examples: Vec<ExampleMatch>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub collection_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub id: String,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StoreStats,
    pub collection_name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResponse {
    pub status: &'static str,
    pub id: String,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub embedder: String,
    pub endpoints: Vec<&'static str>,
}

// === Error Response ===

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                error_type: error_type.into(),
            },
        }
    }
}
