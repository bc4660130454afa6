//! One-shot commands: `ask`, `health`, `info` and `config`.

use std::sync::Arc;

use anyhow::{Result, bail};
use colored::*;
use safety_bot_core::{
    BotBackend, ChatSession, Config, ConnectionState, FormattedLine, HtmlRenderer,
    SafetyBotClient, Sender, TranscriptEntry, TranscriptRenderer, DEFAULT_BASE_URL,
};

/// Plain terminal output with ANSI styling.
pub struct ColoredRenderer;

impl TranscriptRenderer for ColoredRenderer {
    type Output = String;

    fn render(&self, entries: &[TranscriptEntry<'_>]) -> String {
        let mut out = String::new();
        for entry in entries {
            match entry {
                TranscriptEntry::Welcome(welcome) => {
                    out.push_str(&format!("{}\n", welcome.title.bold().cyan()));
                    out.push_str(&format!("{}\n\n", welcome.description));
                }
                TranscriptEntry::Message(message) => {
                    let label = match message.sender() {
                        Sender::User => "You:".bold().cyan(),
                        Sender::Bot => "Safety Bot:".bold().yellow(),
                    };
                    out.push_str(&format!("{} {}\n", label, message.timestamp().dimmed()));
                    for line in &message.formatted().lines {
                        out.push_str(&colored_line(line));
                        out.push('\n');
                    }
                    out.push('\n');
                }
                TranscriptEntry::Typing => {
                    out.push_str(&format!("{}\n", "Thinking...".dimmed().italic()));
                }
            }
        }
        out
    }
}

fn colored_line(line: &FormattedLine) -> String {
    line.segments
        .iter()
        .map(|segment| {
            let mut text = segment.text.as_str().normal();
            if segment.strong {
                text = text.bold();
            }
            if segment.emphasis {
                text = text.italic();
            }
            text.to_string()
        })
        .collect()
}

pub async fn ask(client: SafetyBotClient, question: &str, html: bool) -> Result<()> {
    let mut session = ChatSession::new(Arc::new(client));

    session.check_health().await;
    if let Err(rejection) = session.submit(question).await {
        bail!("{}", rejection);
    }

    let entries = session.transcript().snapshot();
    if html {
        println!("{}", HtmlRenderer.render(&entries));
    } else {
        print!("{}", ColoredRenderer.render(&entries));
    }
    Ok(())
}

pub async fn health(client: SafetyBotClient) -> Result<()> {
    let state = ConnectionState::from_health(&client.health().await);
    match state {
        ConnectionState::Connected => {
            println!("{} {}", "●".green(), state.label());
            Ok(())
        }
        ConnectionState::Disconnected => {
            println!("{} {}", "●".red(), state.label());
            println!("Make sure the server is running at {}", client.base_url().bold());
            bail!("backend not available")
        }
    }
}

pub async fn info(client: SafetyBotClient) -> Result<()> {
    let info = client.info().await?;

    println!("\n{} {}", info.name.bold().blue(), format!("v{}", info.version).dimmed());
    println!("{}", info.description);

    if !info.capabilities.is_empty() {
        println!("\n{}", "Capabilities:".bold().green());
        for capability in &info.capabilities {
            println!("  • {}", capability);
        }
    }

    if !info.limitations.is_empty() {
        println!("\n{}", "Limitations:".bold().yellow());
        for limitation in &info.limitations {
            println!("  • {}", limitation);
        }
    }

    Ok(())
}

/// Apply `update` to the saved config, writing it back only when something
/// changed, then print the result.
pub fn config(update: Config) -> Result<()> {
    let path = Config::get_config_path()?;
    let mut config = Config::load()?;

    if config.merge(update) {
        config.save()?;
        println!("{} {}", "Saved".green().bold(), path.display());
    } else {
        println!("{}", path.display().to_string().dimmed());
    }

    print!("{}", describe_config(&config));
    Ok(())
}

fn describe_config(config: &Config) -> String {
    let or_default = |value: Option<String>, default: String| {
        value.unwrap_or_else(|| format!("{} (default)", default))
    };

    let settings = config.client_settings();
    format!(
        "base_url:          {}\nhealth_interval:   {}\nrequest_timeout:   {}\n",
        or_default(config.base_url.clone(), DEFAULT_BASE_URL.to_string()),
        or_default(
            config.health_interval_secs.map(|secs| format!("{secs}s")),
            format!("{}s", config.health_interval().as_secs())
        ),
        or_default(
            config.request_timeout_secs.map(|secs| format!("{secs}s")),
            format!("{}s", settings.request_timeout.as_secs())
        ),
    )
}
