use log::{error, info};
use safety_bot_core::{
    BotBackend, ChatReply, ChatSession, ClientError, ConnectionState, SubmitRejection, WELCOME,
};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: ChatSession,

    // Query input
    pub query_input: String,
    pub query_cursor: usize, // cursor position in query_input, in chars
    pub query_task: Option<JoinHandle<Result<ChatReply, ClientError>>>,

    // Chat view
    pub query_scroll: u16,
    pub query_chat_height: u16, // Height of chat area for scroll calculations
    pub follow_tail: bool,
    seen_revision: u64,

    // Blocking alert (empty query, bot offline)
    pub alert: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(session: ChatSession) -> Self {
        let seen_revision = session.transcript().revision();
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session,

            query_input: String::new(),
            query_cursor: 0,
            query_task: None,

            query_scroll: 0,
            query_chat_height: 0,
            follow_tail: true,
            seen_revision,

            alert: None,

            animation_frame: 0,
        }
    }

    /// Input is disabled while a request is outstanding.
    pub fn input_enabled(&self) -> bool {
        !self.session.is_loading()
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        self.session.set_connection(state);
    }

    pub fn submit_query(&mut self) {
        match self.session.begin_query(&self.query_input) {
            Ok(pending) => {
                self.query_input.clear();
                self.query_cursor = 0;
                self.animation_frame = 0;

                let backend = self.session.backend();
                self.query_task = Some(tokio::spawn(async move {
                    backend.chat(&pending.query).await
                }));
            }
            Err(SubmitRejection::Busy) => {}
            Err(rejection) => {
                info!("submission rejected: {}", rejection);
                self.alert = Some(rejection.to_string());
            }
        }
    }

    /// Apply the outstanding request's result once it has finished.
    pub async fn poll_query(&mut self) {
        let finished = self
            .query_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.query_task.take() {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!("chat task failed: {}", err);
                    Err(ClientError::Network(err.to_string()))
                }
            };
            self.session.finish_query(outcome);
            // Return focus to the input field
            self.input_mode = InputMode::Editing;
        }
    }

    /// Copy a suggested question into the input without sending it.
    pub fn ask_suggestion(&mut self, index: usize) {
        if !self.input_enabled() {
            return;
        }
        if let Some(question) = WELCOME.suggestions.get(index) {
            self.query_input = question.to_string();
            self.query_cursor = self.query_input.chars().count();
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn clear_chat(&mut self) {
        self.session.clear();
        self.query_scroll = 0;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn scroll_down(&mut self) {
        self.query_scroll = self.query_scroll.saturating_add(1);
        self.follow_tail = false;
    }

    pub fn scroll_up(&mut self) {
        self.query_scroll = self.query_scroll.saturating_sub(1);
        self.follow_tail = false;
    }

    /// Called from render once the chat area's size is known, so the jump to
    /// the newest message happens after layout.
    pub fn sync_scroll(&mut self, total_lines: u16) {
        let revision = self.session.transcript().revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.follow_tail = true;
        }

        let max_scroll = total_lines.saturating_sub(self.query_chat_height);
        if self.follow_tail {
            self.query_scroll = max_scroll;
        } else {
            self.query_scroll = self.query_scroll.min(max_scroll);
            if self.query_scroll == max_scroll {
                self.follow_tail = true;
            }
        }
    }
}
