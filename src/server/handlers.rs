//! Route handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::api::{
    AddResponse, ErrorResponse, HealthResponse, InfoResponse, RemoveResponse, SearchRequest,
    SearchResponse, StatsResponse, StatusResponse, COLLECTION_NAME,
};
use super::http::AppState;
use crate::core::error::RagError;
use crate::core::example::{Example, NewExample};
use crate::search::engine::DEFAULT_TOP_K;

/// A [`RagError`] rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(RagError::validation(rejection.body_text()))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            RagError::Validation { .. } => StatusCode::BAD_REQUEST,
            RagError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }
        let body = Json(ErrorResponse::new(self.0.to_string(), self.0.kind()));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub async fn root(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        message: "Raon RAG Server",
        version: env!("CARGO_PKG_VERSION"),
        embedder: state.service.embedder().model_name().to_string(),
        endpoints: vec![
            "GET /health",
            "POST /search",
            "POST /add",
            "GET /stats",
            "DELETE /clear",
            "GET /examples/:id",
            "DELETE /examples/:id",
        ],
    })
}

pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let count = state.service.count().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        collection_count: count,
    }))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<SearchResponse> {
    let Json(req) = payload?;
    let question = req.question.unwrap_or_default();
    let top_k = req.top_k.unwrap_or(DEFAULT_TOP_K);

    let examples = state.service.search(&question, top_k).await?;
    Ok(Json(SearchResponse { examples }))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<NewExample>, JsonRejection>,
) -> ApiResult<AddResponse> {
    let Json(example) = payload?;
    let outcome = state.service.add_example(example).await?;
    Ok(Json(AddResponse {
        status: "ok",
        message: "Example added",
        id: outcome.id,
        total_count: outcome.total_count,
    }))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<StatsResponse> {
    Ok(Json(StatsResponse {
        stats: state.service.stats().await?,
        collection_name: COLLECTION_NAME,
    }))
}

pub async fn clear(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    state.service.clear_all().await?;
    Ok(Json(StatusResponse { status: "ok" }))
}

pub async fn get_example(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Example> {
    Ok(Json(state.service.get_example(&id).await?))
}

pub async fn remove_example(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<RemoveResponse> {
    let total_count = state.service.remove_example(&id).await?;
    Ok(Json(RemoveResponse {
        status: "ok",
        id,
        total_count,
    }))
}
