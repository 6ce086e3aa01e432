mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use raon_rag::core::logging::init_logging;
use raon_rag::{Config, EmbedderKind, NewExample};

#[derive(Parser)]
#[command(name = "raon-rag")]
#[command(about = "Retrieval server for curated interview answers", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Data directory (overrides RAG_DATA_DIR)")]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "Embedding provider (overrides RAG_EMBEDDER)")]
    embedder: Option<EmbedderKind>,

    #[arg(long, global = true, help = "Log level (trace, debug, info, warn, error)")]
    log_level: Option<String>,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(short = 'H', long, help = "Host to bind to (overrides RAG_HOST)")]
        host: Option<String>,
        #[arg(short, long, help = "Port to listen on (overrides RAG_PORT)")]
        port: Option<u16>,
        #[arg(long, help = "Disable permissive CORS")]
        no_cors: bool,
    },
    /// Find exemplary answers for a question
    Search {
        question: String,
        #[arg(short = 'k', long, default_value_t = 3, help = "Number of examples")]
        top_k: i64,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Store one exemplary answer
    Add {
        question: String,
        answer: String,
        #[arg(long, help = "Quality score (0-100)")]
        score: i64,
        #[arg(long, help = "Category label (default: general)")]
        category: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Bulk-add examples from a JSON array file
    Import {
        file: PathBuf,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show store status
    Stats {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Delete every stored example
    Clear {
        #[arg(long, help = "Confirm deletion")]
        yes: bool,
    },
    /// Delete one example by id
    Remove { id: String },

    // ===== MCP Server =====
    /// Start MCP server over stdio
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show client configuration instructions")]
        install: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(kind) = cli.embedder {
        config.embedder = kind;
    }

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    init_logging(cli.log_level.as_deref().unwrap_or(default_level), cli.json_logs);

    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            no_cors,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            runtime.block_on(commands::serve::run(&config, !no_cors))
        }
        Commands::Search {
            question,
            top_k,
            json,
        } => runtime.block_on(commands::search::run(&config, &question, top_k, json)),
        Commands::Add {
            question,
            answer,
            score,
            category,
            json,
        } => {
            let example = NewExample::new(question, answer, score, category);
            runtime.block_on(commands::add::run(&config, example, json))
        }
        Commands::Import { file, json } => {
            runtime.block_on(commands::import::run(&config, &file, json))
        }
        Commands::Stats { json } => commands::stats::run(&config, json),
        Commands::Clear { yes } => commands::clear::run(&config, yes),
        Commands::Remove { id } => commands::remove::run(&config, &id),

        #[cfg(feature = "mcp")]
        Commands::Mcp { install } => {
            if install {
                print_mcp_install_instructions(&config);
                Ok(())
            } else {
                let service = std::sync::Arc::new(commands::open_service(&config)?);
                runtime.block_on(raon_rag::mcp::run_mcp_server(service))
            }
        }
    }
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions(config: &Config) {
    use colored::Colorize;

    let data_dir = std::fs::canonicalize(&config.data_dir)
        .unwrap_or_else(|_| config.data_dir.clone())
        .display()
        .to_string();

    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "raon-rag".to_string());

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your MCP client configuration:");
    println!();
    println!(
        r#"{{
  "mcpServers": {{
    "raon-rag": {{
      "command": "{}",
      "args": ["--data-dir", "{}", "mcp"],
      "env": {{ "GEMINI_API_KEY": "<your key>" }}
    }}
  }}
}}"#,
        binary_path, data_dir
    );
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Find exemplary answers by question", "rag_search".green());
    println!("  • {} - Store an exemplary answer", "rag_add_example".green());
    println!("  • {} - Stored example count", "rag_stats".green());
}
