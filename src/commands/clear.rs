//! Clear command - delete every stored example

use anyhow::Result;
use colored::Colorize;

use raon_rag::Config;

pub fn run(config: &Config, yes: bool) -> Result<()> {
    let store = super::open_store(config)?;
    let count = store.count()?;

    if !yes {
        println!(
            "{} This deletes all {} examples. Re-run with {} to confirm.",
            "!".yellow().bold(),
            count,
            "--yes".cyan()
        );
        return Ok(());
    }

    store.clear()?;
    println!("{} Removed {} examples", "✓".green().bold(), count);
    Ok(())
}
