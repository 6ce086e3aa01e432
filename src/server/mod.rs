//! HTTP surface of the retrieval service.

pub mod api;
pub mod handlers;
pub mod http;

pub use http::{build_router, AppState, Server, ServerConfig};
