//! CLI entry point for chat-relay

mod terminal;

use anyhow::{Context, Result};
use chat_relay_agent::{ChatHandlers, RunConfig};
use chat_relay_core::config::validate::validate_config;
use chat_relay_core::config::{Config, ConfigLoader, LoggingConfig};
use chat_relay_core::logging::init_logging;
use chat_relay_providers::ProviderRegistry;
use chat_relay_server::AppState;
use clap::{Parser, Subcommand};
use console::{style, Term};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::terminal::TerminalTransport;

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(about = "Relay chat messages to an OpenAI-compatible model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web chat widget
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Chat in the terminal
    Chat {
        /// Session id for this conversation
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Show status information
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    }
    .with_credential_vars(ProviderRegistry::new().credential_vars());

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = load_config(&config_loader)?;
            let _guard = init_logging(&config.logging);
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            info!("Starting server");
            run_serve(config).await?;
        }
        Commands::Chat { session } => {
            let config = load_config(&config_loader)?;
            let _guard = init_logging(&chat_logging(&config.logging));
            run_chat(config, session).await?;
        }
        Commands::Status => {
            run_status(&config_loader)?;
        }
    }

    Ok(())
}

/// The terminal belongs to the conversation; `chat` logs to the file only.
fn chat_logging(logging: &LoggingConfig) -> LoggingConfig {
    LoggingConfig {
        console: false,
        ..logging.clone()
    }
}

/// Load and validate configuration, then check the provider can be bound
fn load_config(loader: &ConfigLoader) -> Result<Config> {
    let config = loader.load().with_context(|| {
        format!(
            "failed to load configuration from {}",
            loader.config_path().display()
        )
    })?;
    RunConfig::from_config(&config.provider).context("provider is not usable")?;
    Ok(config)
}

/// Run the web widget until Ctrl+C
async fn run_serve(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    println!("{}", style("Starting chat-relay...").bold().cyan());
    println!("Model: {}", config.provider.model);
    println!("Open http://{} in a browser. Press Ctrl+C to stop.", addr);

    let state = AppState::new(ChatHandlers::new(config.agent, config.provider));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    chat_relay_server::run_server(state, addr, shutdown).await?;

    println!("{}", style("Server stopped.").green());
    Ok(())
}

/// Interactive chat over stdin/stdout
async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
    let session_id = session.unwrap_or_else(|| "cli:direct".to_string());
    let handlers = ChatHandlers::new(config.agent, config.provider);
    let transport = TerminalTransport::new(Term::stdout());

    println!(
        "{}",
        style("Type a message, or /exit to quit.").dim()
    );
    handlers.on_chat_start(&session_id, &transport).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        transport.reset();
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "/exit" | "/quit") {
            break;
        }
        handlers.on_message(&session_id, text, &transport).await?;
    }

    handlers.on_chat_end(&session_id);
    Ok(())
}

/// Show configuration status without requiring a valid setup
fn run_status(loader: &ConfigLoader) -> Result<()> {
    let config = loader.load_unchecked()?;
    let registry = ProviderRegistry::new();
    let spec = registry.find_by_name(&config.provider.name);

    println!("{}", style("chat-relay Status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", loader.config_dir().display());
    println!("  Config file: {}", loader.config_path().display());
    let file_state = if loader.config_path().exists() {
        style("found").green()
    } else {
        style("not found, using defaults").dim()
    };
    println!("  Config file state: {}", file_state);
    println!("  Log directory: {}", config.logging.dir);
    println!();

    println!("{}", style("Agent:").bold());
    println!("  Name: {}", config.agent.name);
    println!();

    println!("{}", style("Provider:").bold());
    let label = spec
        .map(|s| s.label())
        .unwrap_or_else(|| config.provider.name.clone());
    println!("  Name: {}", label);
    let model = if config.provider.model.trim().is_empty() {
        spec.map(|s| format!("{} (default)", s.default_model))
            .unwrap_or_else(|| "-".to_string())
    } else {
        config.provider.model.clone()
    };
    println!("  Model: {}", model);
    let api_base = config
        .provider
        .api_base()
        .map(str::to_string)
        .or_else(|| spec.map(|s| s.default_api_base.clone()))
        .unwrap_or_else(|| "-".to_string());
    println!("  API base: {}", api_base);
    let key_state = if config.provider.api_key().is_some() {
        style("configured".to_string()).green()
    } else if spec.is_some_and(|s| !s.requires_api_key()) {
        style("not required".to_string()).dim()
    } else {
        let hint = spec
            .map(|s| s.env_key.clone())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| "CHAT_RELAY__PROVIDER__API_KEY".to_string());
        style(format!("not configured (set {})", hint)).red()
    };
    println!("  API key: {}", key_state);
    println!();

    println!("{}", style("Server:").bold());
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!();

    let problem = validate_config(&config)
        .err()
        .map(|e| e.to_string())
        .or_else(|| RunConfig::from_config(&config.provider).err().map(|e| e.to_string()));
    match problem {
        None => println!("{}", style("Configuration is valid.").green()),
        Some(e) => println!("{} {}", style("Configuration problem:").red().bold(), e),
    }

    Ok(())
}
