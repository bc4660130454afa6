use std::io::{self, Stderr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEvent, KeyEventKind,
    MouseEvent,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use safety_bot_core::{BotBackend, ConnectionState, HealthMonitor};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Drives the typing animation and polling of the outstanding chat request.
const TICK_INTERVAL: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// The terminal size changed; the next draw picks up the new size.
    Resize,
    Tick,
    Connection(ConnectionState),
}

impl AppEvent {
    fn from_terminal(event: Event) -> Option<Self> {
        match event {
            // Key release and repeat events are ignored
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
            Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
            Event::Resize(..) => Some(AppEvent::Resize),
            _ => None,
        }
    }
}

/// Single queue the main loop reads from. Terminal input, the animation tick
/// and health results are all funnelled into it by background tasks.
pub struct EventHandler {
    events: UnboundedReceiver<AppEvent>,
    sender: UnboundedSender<AppEvent>,
    _monitor: Option<HealthMonitor>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        spawn_terminal_reader(sender.clone());
        spawn_ticker(sender.clone());

        Self {
            events,
            sender,
            _monitor: None,
        }
    }

    /// Start polling the health endpoint; results arrive as `AppEvent::Connection`.
    pub fn watch_health(&mut self, backend: Arc<dyn BotBackend>, interval: Duration) {
        let (state_tx, mut state_rx) = mpsc::unbounded_channel();
        self._monitor = Some(HealthMonitor::spawn(backend, interval, state_tx));

        let sender = self.sender.clone();
        tokio::spawn(async move {
            while let Some(state) = state_rx.recv().await {
                if sender.send(AppEvent::Connection(state)).is_err() {
                    break;
                }
            }
        });
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.events.recv().await
    }
}

fn spawn_terminal_reader(sender: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut stream = EventStream::new();
        while let Some(next) = stream.next().await {
            let Some(event) = next.ok().and_then(AppEvent::from_terminal) else {
                continue;
            };
            if sender.send(event).is_err() {
                break;
            }
        }
    });
}

fn spawn_ticker(sender: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        while sender.send(AppEvent::Tick).is_ok() {
            ticker.tick().await;
        }
    });
}

/// Switch to raw mode on the alternate screen, with mouse reporting for wheel scrolling.
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(io::stderr()))?)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Put the terminal back before the default hook prints the panic message.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        previous(info);
    }));
}
