//! Serve command - run the HTTP API

use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

use raon_rag::server::{Server, ServerConfig};
use raon_rag::Config;

pub async fn run(config: &Config, cors: bool) -> Result<()> {
    let service = Arc::new(super::open_service(config)?);
    let addr = config.listen_addr()?;
    let count = service.count().await?;

    tracing::info!(
        examples = count,
        embedder = %service.embedder().model_name(),
        api_key = %config.masked_api_key(),
        data_dir = %config.data_dir.display(),
        "Starting Raon RAG server"
    );

    eprintln!(
        "\n{} Listening on http://{} ({} examples stored)",
        "✓".green().bold(),
        addr,
        count.to_string().cyan()
    );
    eprintln!("  {}\n", "Press Ctrl+C to stop".dimmed());

    Server::new(ServerConfig { addr, cors }, service).run().await?;

    eprintln!("{} Server stopped", "✓".green().bold());
    Ok(())
}
