//! Stats command - show store status

use anyhow::Result;
use colored::Colorize;

use raon_rag::{Config, DataPaths, StoreStatus};

pub fn run(config: &Config, json: bool) -> Result<()> {
    let store = super::open_store(config)?;
    let count = store.count()?;
    let dimension = store.dimension()?;
    let paths = DataPaths::from_root(config.data_dir.clone());
    let file_size = std::fs::metadata(&paths.db).map(|m| m.len()).unwrap_or(0);
    let status = StoreStatus::from_count(count);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "totalExamples": count,
                "status": status,
                "dimension": dimension,
                "fileSizeBytes": file_size,
            })
        );
        return Ok(());
    }

    println!("{}", "Store Status".bold());
    println!();
    println!(
        "  {} {} examples stored",
        "→".dimmed(),
        count.to_string().cyan()
    );
    match dimension {
        Some(d) => println!("  {} {} dimensions", "→".dimmed(), d),
        None => println!("  {} {}", "!".yellow().bold(), "Store is empty"),
    }
    println!(
        "  {} Size: {:.2} KB ({})",
        "→".dimmed(),
        file_size as f64 / 1024.0,
        paths.db.display()
    );

    Ok(())
}
