//! Remove command - delete a single example by id

use anyhow::{bail, Result};
use colored::Colorize;

use raon_rag::Config;

pub fn run(config: &Config, id: &str) -> Result<()> {
    let store = super::open_store(config)?;

    if !store.remove(id)? {
        bail!("Example not found: {}", id);
    }

    println!(
        "{} Removed {} ({} remaining)",
        "✓".green().bold(),
        id.cyan(),
        store.count()?
    );
    Ok(())
}
