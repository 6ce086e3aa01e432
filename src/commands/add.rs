//! Add command - store one exemplary answer

use anyhow::Result;
use colored::Colorize;

use raon_rag::{Config, NewExample};

pub async fn run(config: &Config, example: NewExample, json: bool) -> Result<()> {
    let service = super::open_service(config)?;
    let outcome = service.add_example(example).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "id": outcome.id,
                "totalCount": outcome.total_count,
            })
        );
    } else {
        println!(
            "{} Stored example {} ({} total)",
            "✓".green().bold(),
            outcome.id.cyan(),
            outcome.total_count
        );
    }

    Ok(())
}
