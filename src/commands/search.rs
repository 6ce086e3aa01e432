//! Search command - find exemplary answers for a question

use anyhow::Result;
use colored::Colorize;

use raon_rag::Config;

pub async fn run(config: &Config, question: &str, top_k: i64, json: bool) -> Result<()> {
    let service = super::open_service(config)?;
    let results = service.search(question, top_k).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "examples": results }))?
        );
        return Ok(());
    }

    if results.is_empty() {
        println!("{} No examples found for: {}", "→".dimmed(), question.cyan());
        return Ok(());
    }

    println!(
        "{} {} examples for: {}",
        "→".dimmed(),
        results.len(),
        question.cyan()
    );
    println!();

    for (i, result) in results.iter().enumerate() {
        let similarity = format!("{:.2}", result.similarity);
        let similarity = if result.similarity > 0.8 {
            similarity.green()
        } else if result.similarity > 0.6 {
            similarity.yellow()
        } else {
            similarity.dimmed()
        };

        println!(
            "{}. [{}] {}",
            (i + 1).to_string().bold(),
            similarity,
            result.question.cyan()
        );
        println!("   {}", truncate(&result.answer, 120).dimmed());
        println!("   {} | score {}", result.category, result.score);
        println!();
    }

    Ok(())
}

/// Char-aware truncation for terminal display.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
