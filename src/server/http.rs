//! HTTP server exposing the retrieval service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::core::error::{RagError, Result};
use crate::search::engine::RetrievalService;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Enable permissive CORS.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], crate::core::config::DEFAULT_PORT)),
            cors: true,
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub service: Arc<RetrievalService>,
    pub start_time: Instant,
}

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    pub fn new(config: ServerConfig, service: Arc<RetrievalService>) -> Self {
        let state = Arc::new(AppState {
            service,
            start_time: Instant::now(),
        });
        Self { config, state }
    }

    /// Creates the router.
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.config.cors)
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| RagError::config(format!("cannot bind {}: {}", self.config.addr, e)))?;

        tracing::info!(addr = %self.config.addr, "RAG server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| RagError::store(format!("server error: {}", e)))?;

        tracing::info!(
            uptime_secs = self.state.start_time.elapsed().as_secs(),
            "Server shutdown complete"
        );
        Ok(())
    }
}

pub fn build_router(state: Arc<AppState>, cors: bool) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/search", post(handlers::search))
        .route("/add", post(handlers::add))
        .route("/stats", get(handlers::stats))
        .route("/clear", delete(handlers::clear))
        .route(
            "/examples/:id",
            get(handlers::get_example).delete(handlers::remove_example),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::embedding::{Embedder, HtpEmbedder};
    use crate::search::store::ExampleStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Always fails, like an unreachable provider.
    struct DownEmbedder;

    #[async_trait]
    impl Embedder for DownEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(RagError::embedding("down"))
        }

        fn model_name(&self) -> &str {
            "down"
        }
    }

    /// One dimension per byte of input, so differently sized texts clash.
    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0; text.len()])
        }

        fn model_name(&self) -> &str {
            "length"
        }
    }

    fn router_with(embedder: Arc<dyn Embedder>) -> Router {
        let store = ExampleStore::open_in_memory().unwrap();
        let service = Arc::new(RetrievalService::new(store, embedder));
        Server::new(ServerConfig::default(), service).router()
    }

    fn test_router() -> Router {
        router_with(Arc::new(HtpEmbedder::new()))
    }

    async fn call(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_and_stats_empty() {
        let router = test_router();

        let (status, body) = call(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "collectionCount": 0}));

        let (status, body) = call(&router, Method::GET, "/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "totalExamples": 0,
                "status": "empty",
                "collectionName": "interview_examples"
            })
        );
    }

    #[tokio::test]
    async fn test_add_search_clear_flow() {
        let router = test_router();

        let (status, body) = call(
            &router,
            Method::POST,
            "/add",
            Some(json!({
                "question": "팀 갈등 해결 경험?",
                "answer": "구체적 사례...",
                "score": 95,
                "category": "협업"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "Example added");
        assert_eq!(body["totalCount"], 1);
        let id = body["id"].as_str().unwrap().to_string();

        let (_, body) = call(&router, Method::GET, "/stats", None).await;
        assert_eq!(body["totalExamples"], 1);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["collectionName"], "interview_examples");

        let (status, body) = call(
            &router,
            Method::POST,
            "/search",
            Some(json!({"question": "팀 갈등 해결 경험?", "top_k": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let examples = body["examples"].as_array().unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0]["answer"], "구체적 사례...");
        assert_eq!(examples[0]["category"], "협업");
        assert_eq!(examples[0]["score"], 95);
        assert!(examples[0]["similarity"].as_f64().unwrap() > 0.99);

        let (status, body) = call(&router, Method::GET, &format!("/examples/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id.as_str());
        assert!(body.get("embedding").is_none());

        let (status, body) = call(&router, Method::DELETE, "/clear", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));

        let (_, body) = call(&router, Method::GET, "/stats", None).await;
        assert_eq!(
            body,
            json!({
                "totalExamples": 0,
                "status": "empty",
                "collectionName": "interview_examples"
            })
        );
    }

    #[tokio::test]
    async fn test_search_defaults_top_k() {
        let router = test_router();
        for i in 0..5 {
            let (status, _) = call(
                &router,
                Method::POST,
                "/add",
                Some(json!({
                    "question": format!("question number {}", i),
                    "answer": format!("answer {}", i),
                    "score": 80
                })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = call(
            &router,
            Method::POST,
            "/search",
            Some(json!({"question": "question number 2"})),
        )
        .await;
        let examples = body["examples"].as_array().unwrap();
        assert_eq!(examples.len(), 3);
        assert_eq!(examples[0]["category"], "general");
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let router = test_router();

        let (status, body) = call(
            &router,
            Method::POST,
            "/add",
            Some(json!({"question": "only a question", "score": 50})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");

        let (status, _) = call(
            &router,
            Method::POST,
            "/add",
            Some(json!({"question": "q", "answer": "a", "score": 101})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&router, Method::POST, "/search", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_example_is_404() {
        let router = test_router();
        let (status, body) = call(&router, Method::DELETE, "/examples/example_nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found");
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let router = test_router();
        let (status, body) = call(&router, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["embedder"], "htp-384");
        assert!(body["endpoints"].as_array().unwrap().len() >= 5);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_500() {
        let router = router_with(Arc::new(DownEmbedder));

        let (status, body) = call(
            &router,
            Method::POST,
            "/search",
            Some(json!({"question": "팀 갈등 해결 경험?"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "embedding_error");
        assert!(body["error"]["message"].as_str().unwrap().contains("down"));

        let (status, body) = call(
            &router,
            Method::POST,
            "/add",
            Some(json!({"question": "q", "answer": "a", "score": 90})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "embedding_error");

        let (status, body) = call(&router, Method::GET, "/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalExamples"], 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_store_error() {
        let router = router_with(Arc::new(LengthEmbedder));

        let (status, _) = call(
            &router,
            Method::POST,
            "/add",
            Some(json!({"question": "ab", "answer": "a", "score": 90})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            &router,
            Method::POST,
            "/add",
            Some(json!({"question": "abc", "answer": "a", "score": 90})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "store_error");
    }
}
