//! RAG MCP Server implementation

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::error::RagError;
use crate::core::example::NewExample;
use crate::search::engine::RetrievalService;

/// Upper bound on `top_k` for tool calls.
const MAX_TOOL_TOP_K: i64 = 20;

/// Parameters for rag_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Interview question to find exemplary answers for
    #[schemars(description = "Interview question to find exemplary answers for")]
    pub question: String,
    /// Maximum number of examples to return (default: 3)
    #[schemars(description = "Maximum number of examples (default: 3)")]
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

fn default_top_k() -> i64 {
    crate::search::engine::DEFAULT_TOP_K
}

/// Parameters for rag_add_example tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddExampleParams {
    #[schemars(description = "Interview question")]
    pub question: String,
    #[schemars(description = "Exemplary answer to the question")]
    pub answer: String,
    #[schemars(description = "Quality score, 0-100")]
    pub score: i64,
    #[schemars(description = "Category label (default: general)")]
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddResultJson {
    id: String,
    total_count: usize,
}

/// RAG MCP Service
#[derive(Clone)]
pub struct RagService {
    service: Arc<RetrievalService>,
    tool_router: ToolRouter<Self>,
}

impl RagService {
    pub fn new(service: Arc<RetrievalService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_mcp_error(err: RagError) -> McpError {
    match err {
        RagError::Validation { .. } | RagError::NotFound { .. } => {
            McpError::invalid_params(err.to_string(), None)
        }
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn json_content<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let output = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(output)]))
}

#[tool_router]
impl RagService {
    /// Search exemplary interview answers by question similarity
    #[tool(description = "Find curated exemplary interview answers whose questions are most similar to the given question.")]
    async fn rag_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let top_k = params.0.top_k.clamp(1, MAX_TOOL_TOP_K);
        let examples = self
            .service
            .search(&params.0.question, top_k)
            .await
            .map_err(to_mcp_error)?;
        json_content(&examples)
    }

    /// Store a new exemplary answer
    #[tool(description = "Store a curated exemplary interview answer with its quality score (0-100) and optional category.")]
    async fn rag_add_example(
        &self,
        params: Parameters<AddExampleParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let outcome = self
            .service
            .add_example(NewExample::new(p.question, p.answer, p.score, p.category))
            .await
            .map_err(to_mcp_error)?;
        json_content(&AddResultJson {
            id: outcome.id,
            total_count: outcome.total_count,
        })
    }

    /// Report how many examples are stored
    #[tool(description = "Get the number of stored examples and whether the store is empty.")]
    async fn rag_stats(&self) -> Result<CallToolResult, McpError> {
        let stats = self.service.stats().await.map_err(to_mcp_error)?;
        json_content(&stats)
    }
}

#[tool_handler]
impl ServerHandler for RagService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Raon RAG MCP Server. Retrieves and stores exemplary interview answers.".to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Run the MCP server over stdio
pub async fn run_mcp_server(service: Arc<RetrievalService>) -> Result<()> {
    use tokio::io::{stdin, stdout};

    let transport = (stdin(), stdout());
    let server = RagService::new(service).serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
