//! deskbot: terminal client for the support chat backend
//!
//! Usage:
//!   deskbot                  - Start the interactive chat REPL
//!   deskbot --execute "..."  - Send one message and print the reply
//!   deskbot --health         - Print the backend health badge
//!   deskbot --help           - Show help

mod repl;

use std::sync::Arc;

use deskbot_client::BackendClient;
use deskbot_core::{
    Config, ConversationController, Gateway, MemorySessionStore, SessionManager, SessionStore,
    SqliteSessionStore,
};
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// Interactive REPL
    Repl,
    /// One-shot message send
    Execute(String),
    /// Print the health badge and exit
    Health,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args()?;

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("deskbot {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::debug!("Backend: {}", config.backend.base_url);

    let client = BackendClient::new(&config.backend)
        .map_err(|e| anyhow::anyhow!("Failed to create backend client: {}", e))?;
    let gateway: Arc<dyn Gateway> = Arc::new(client);

    let store = open_session_store(&config.session.db_path);
    let sessions = SessionManager::new(store);
    let controller = ConversationController::new(sessions, Arc::clone(&gateway));

    match mode {
        RunMode::Repl => repl::run_repl(controller, gateway, &config).await,
        RunMode::Execute(text) => repl::run_execute(controller, &text).await,
        RunMode::Health => {
            println!("{}", repl::health_badge(gateway.as_ref()).await);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Open the durable session store, falling back to an ephemeral in-memory
/// one when the database cannot be opened.
fn open_session_store(db_path: &str) -> Box<dyn SessionStore> {
    match SqliteSessionStore::new(db_path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(
                "Session store unavailable ({}), using an ephemeral session id",
                e
            );
            Box::new(MemorySessionStore::default())
        }
    }
}

/// Parse command line arguments
fn parse_args() -> anyhow::Result<RunMode> {
    let args: Vec<String> = std::env::args().collect();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--execute" | "-e" => {
                let text = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--execute requires a message"))?;
                return Ok(RunMode::Execute(text.clone()));
            }
            "--health" => return Ok(RunMode::Health),
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            _ => {}
        }
    }

    Ok(RunMode::Repl)
}

/// Print help message
fn print_help() {
    println!("deskbot - terminal client for the support chat backend");
    println!();
    println!("Usage:");
    println!("  deskbot                  Start the interactive chat REPL");
    println!("  deskbot --execute \"..\"   Send one message and print the reply");
    println!("  deskbot --health         Print the backend health badge");
    println!("  deskbot --help           Show this help message");
    println!("  deskbot --version        Show version");
    println!();
    println!("Environment Variables:");
    println!("  DESKBOT_BACKEND_URL      Backend base URL (default: http://127.0.0.1:5000)");
    println!("  DESKBOT_DB_PATH          Session database path (default: data/deskbot.db)");
    println!("  DESKBOT_CHAT_TIMEOUT_SECS  Chat request timeout (default: 15)");
    println!("  DESKBOT_TITLE            Banner title");
    println!();
    println!("Settings can also be placed in ./deskbot.toml.");
}
