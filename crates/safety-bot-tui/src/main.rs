use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use safety_bot_core::{ChatSession, Config, SafetyBotClient};

mod app;
mod cli;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use logging::LogDestination;

#[derive(Parser)]
#[command(name = "safety-bot")]
#[command(version, about = "Terminal chat client for the Oil & Gas Safety Bot")]
struct Cli {
    /// Base URL of the Safety Bot API (e.g. http://localhost:5000/api)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Ask a single question and print the conversation
    Ask {
        /// Your question
        question: String,
        /// Print the conversation as an HTML fragment
        #[arg(long)]
        html: bool,
    },
    /// Check whether the backend is reachable
    Health,
    /// Show information about the bot
    Info,
    /// Show the saved configuration, updating any values given
    Config {
        /// Base URL to store
        #[arg(long)]
        base_url: Option<String>,
        /// Seconds between health checks
        #[arg(long)]
        health_interval: Option<u64>,
        /// Chat request timeout in seconds
        #[arg(long)]
        request_timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Chat));
    logging::initialize(if interactive {
        LogDestination::File
    } else {
        LogDestination::Terminal
    });

    // Load config; a broken file shouldn't keep the client from starting
    let config = Config::load().unwrap_or_else(|err| {
        log::warn!("could not load config, using defaults: {}", err);
        Config::new()
    });
    let url = cli.url.as_deref();

    match cli.command {
        None | Some(Commands::Chat) => run_tui(connect(&config, url)?, &config).await,
        Some(Commands::Ask { question, html }) => {
            cli::ask(connect(&config, url)?, &question, html).await
        }
        Some(Commands::Health) => cli::health(connect(&config, url)?).await,
        Some(Commands::Info) => cli::info(connect(&config, url)?).await,
        Some(Commands::Config {
            base_url,
            health_interval,
            request_timeout,
        }) => cli::config(Config {
            base_url,
            health_interval_secs: health_interval,
            request_timeout_secs: request_timeout,
        }),
    }
}

fn connect(config: &Config, url: Option<&str>) -> Result<SafetyBotClient> {
    let base_url = config.resolve_base_url(url);
    let client = SafetyBotClient::with_settings(&base_url, config.client_settings())?;
    log::info!("using Safety Bot API at {}", base_url);
    Ok(client)
}

async fn run_tui(client: SafetyBotClient, config: &Config) -> Result<()> {
    let backend = Arc::new(client);
    let session = ChatSession::new(backend.clone());
    let mut app = App::new(session);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = tui::EventHandler::new();
    events.watch_health(backend, config.health_interval());

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut tui::EventHandler,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
