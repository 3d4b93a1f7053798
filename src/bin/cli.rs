//! Marquee CLI
//!
//! Interactive shell for the film assistant. Free text goes to the agent;
//! a small command set handles session control, with edit-distance "did you
//! mean" hints for near-misses.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use marquee::agent::Agent;
use marquee::catalog::{seed, CatalogStore};
use marquee::config::AgentConfig;
use marquee::memory::ProfileStore;
use marquee::provider::create_backend;
use marquee::telemetry::{init_tracing, EventLog};

const COMMANDS: &[&str] = &["quit", "exit", "clear", "switch", "models", "help"];

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Conversational film assistant")]
#[command(version)]
struct Cli {
    /// LLM provider: gemini or ollama
    #[arg(long, env = "MARQUEE_PROVIDER")]
    provider: Option<String>,

    /// Model override for the selected provider
    #[arg(long)]
    model: Option<String>,

    /// Film catalog database path
    #[arg(long, env = "MARQUEE_FILMS_DB")]
    films_db: Option<String>,

    /// User memory database path
    #[arg(long, env = "MARQUEE_MEMORY_DB")]
    memory_db: Option<String>,

    /// Structured event log path (JSONL); omit to disable
    #[arg(long, env = "MARQUEE_EVENT_LOG")]
    event_log: Option<String>,

    /// Start the session under this user name
    #[arg(long)]
    name: Option<String>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AgentConfig::from_env();
    if let Some(provider) = &cli.provider {
        config.provider = provider.to_lowercase();
    }
    if let Some(path) = &cli.films_db {
        config.films_db_path = expand(path);
    }
    if let Some(path) = &cli.memory_db {
        config.memory_db_path = expand(path);
    }
    if let Some(path) = &cli.event_log {
        config.event_log_path = Some(expand(path));
    }

    // Configuration problems are the only fatal errors
    config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

    let catalog = Arc::new(CatalogStore::open(&config.films_db_path).context("open film catalog")?);
    let seeded = seed::seed_if_empty(&catalog).context("seed film catalog")?;
    if seeded > 0 {
        println!("Initialized film catalog with {seeded} films.");
    }
    let profile = ProfileStore::open(&config.memory_db_path).context("open profile store")?;
    let events = match &config.event_log_path {
        Some(path) => EventLog::open(path).context("open event log")?,
        None => EventLog::disabled(),
    };

    let backend = create_backend(&config.provider, cli.model.as_deref(), &config)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut agent = Agent::new(config, catalog, profile, backend, events)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let identity = agent.identity();
    println!("Provider: {} | Model: {}", identity.provider, identity.model);

    let greeting = agent
        .start_session(cli.name.as_deref())
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{greeting}");
    println!("Type 'help' for commands, or just ask about films.\n");

    run_shell(&mut agent)
}

fn run_shell(agent: &mut Agent) -> anyhow::Result<()> {
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            println!("\nGoodbye!");
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut words = line.split_whitespace();
        let first = words.next().unwrap_or_default();

        match first {
            "quit" | "exit" => {
                println!("Goodbye!");
                return Ok(());
            }
            "clear" => {
                agent.clear_conversation();
                println!("Conversation cleared.");
            }
            "models" => {
                let identity = agent.identity();
                println!("Provider: {} | Model: {}", identity.provider, identity.model);
            }
            "switch" => {
                let provider = words.next();
                let model = words.next();
                match provider {
                    Some(provider) => println!("{}", agent.switch_provider(provider, model)),
                    None => println!("Usage: switch <provider> [model]"),
                }
            }
            "help" => {
                println!("Commands:");
                println!("  switch <provider> [model]  - Change LLM backend (gemini, ollama)");
                println!("  models                     - Show active backend");
                println!("  clear                      - Clear conversation history");
                println!("  quit / exit                - Leave");
                println!("Anything else is sent to the assistant.");
            }
            _ => {
                if let Some(suggestion) = did_you_mean(first) {
                    // Single near-miss words are probably mistyped commands
                    if words.next().is_none() {
                        println!("Unknown command '{first}'. Did you mean '{suggestion}'?");
                        continue;
                    }
                }
                println!("{}", agent.process_query(line));
            }
        }
    }
}

/// Closest known command within edit distance 2, if any
fn did_you_mean(word: &str) -> Option<&'static str> {
    COMMANDS
        .iter()
        .map(|cmd| (levenshtein::levenshtein(word, cmd), *cmd))
        .filter(|(distance, cmd)| *distance <= 2 && *distance < word.len() && *distance < cmd.len())
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, cmd)| cmd)
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
