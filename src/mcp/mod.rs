//! MCP server for the example store
//!
//! Exposes search, add and stats as MCP tools over stdio.

mod server;

pub use server::{run_mcp_server, RagService};
