//! Import command - bulk-add examples from a JSON file

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use raon_rag::{Config, NewExample};

/// Read a JSON array of examples (same shape as the `/add` body).
pub fn read_examples(path: &Path) -> Result<Vec<NewExample>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let examples: Vec<NewExample> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of examples", path.display()))?;
    Ok(examples)
}

pub async fn run(config: &Config, file: &Path, json: bool) -> Result<()> {
    let examples = read_examples(file)?;
    let service = super::open_service(config)?;

    if !json {
        println!(
            "{} Importing {} examples from {}...",
            "→".dimmed(),
            examples.len(),
            file.display()
        );
    }

    let report = service.import(examples).await?;

    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "{} Imported {} examples in {:.2}s",
        "✓".green().bold(),
        report.added.to_string().cyan(),
        report.duration_ms as f64 / 1000.0
    );
    if report.failed > 0 {
        println!(
            "  {} {} examples failed (see log)",
            "✗".red(),
            report.failed
        );
    }
    println!(
        "  {} {} examples now stored",
        "→".dimmed(),
        report.total_count
    );

    Ok(())
}
