//! The chat session: connection state, the in-flight guard and the transcript.
//!
//! Front ends drive the session through explicit transitions. The TUI uses
//! [`ChatSession::begin_query`] and [`ChatSession::finish_query`] around a
//! spawned request; one-shot callers can just await [`ChatSession::submit`].

use std::sync::Arc;

use log::{info, warn};

use crate::api::{BotBackend, ChatReply, HealthReport};
use crate::error::{ClientError, SubmitRejection};
use crate::transcript::{ChatMessage, Sender, Transcript};

pub const NO_ANSWER_MESSAGE: &str = "Sorry, I could not generate a response. Please try again.";

pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

/// Local wall-clock time as `HH:MM`.
pub fn local_clock() -> Clock {
    Arc::new(|| chrono::Local::now().format("%H:%M").to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionState {
    pub fn from_health(result: &Result<HealthReport, ClientError>) -> Self {
        match result {
            Ok(report) if report.is_connected() => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        *self == ConnectionState::Connected
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
        }
    }
}

/// An accepted submission waiting for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub query: String,
}

pub struct ChatSession {
    backend: Arc<dyn BotBackend>,
    clock: Clock,
    connection: ConnectionState,
    in_flight: bool,
    transcript: Transcript,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn BotBackend>) -> Self {
        Self::with_clock(backend, local_clock())
    }

    pub fn with_clock(backend: Arc<dyn BotBackend>, clock: Clock) -> Self {
        Self {
            backend,
            clock,
            connection: ConnectionState::default(),
            in_flight: false,
            transcript: Transcript::new(),
        }
    }

    pub fn backend(&self) -> Arc<dyn BotBackend> {
        self.backend.clone()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        if self.connection != state {
            info!("connection state: {}", state.label());
        }
        self.connection = state;
    }

    /// Run one health check now and apply its outcome.
    pub async fn check_health(&mut self) -> ConnectionState {
        let result = self.backend.health().await;
        if let Err(err) = &result {
            warn!("backend not available: {}", err);
        }
        let state = ConnectionState::from_health(&result);
        self.set_connection(state);
        state
    }

    /// Append a message with the current timestamp.
    pub fn append(&mut self, text: impl Into<String>, sender: Sender) {
        let message = ChatMessage::new(text, sender, (self.clock)());
        self.transcript.push(message);
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Validate `raw`, record the user's message and raise the loading
    /// indicator. No request is made here.
    pub fn begin_query(&mut self, raw: &str) -> Result<PendingQuery, SubmitRejection> {
        let query = raw.trim();
        if query.is_empty() {
            return Err(SubmitRejection::EmptyQuery);
        }
        if !self.connection.is_connected() {
            return Err(SubmitRejection::Offline);
        }
        if self.in_flight {
            return Err(SubmitRejection::Busy);
        }

        self.append(query, Sender::User);
        self.set_loading(true);
        info!("submitting query ({} chars)", query.chars().count());

        Ok(PendingQuery {
            query: query.to_string(),
        })
    }

    /// Apply the backend's outcome for the outstanding query and always
    /// clear the loading state.
    pub fn finish_query(&mut self, outcome: Result<ChatReply, ClientError>) {
        let text = match outcome {
            Ok(reply) => match reply.answer() {
                Some(answer) => answer.to_string(),
                None => {
                    warn!("backend returned no answer text");
                    NO_ANSWER_MESSAGE.to_string()
                }
            },
            Err(err) => {
                warn!("chat request failed: {}", err);
                self.server_error_message()
            }
        };
        self.append(text, Sender::Bot);
        self.set_loading(false);
    }

    /// Full submission: validate, send, and render the reply.
    pub async fn submit(&mut self, raw: &str) -> Result<(), SubmitRejection> {
        let pending = self.begin_query(raw)?;
        let outcome = self.backend.chat(&pending.query).await;
        self.finish_query(outcome);
        Ok(())
    }

    pub fn server_error_message(&self) -> String {
        format!(
            "Error communicating with the server. Please make sure the backend is running at {}.",
            self.backend.base_url()
        )
    }

    fn set_loading(&mut self, loading: bool) {
        self.in_flight = loading;
        self.transcript.set_typing(loading);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::transcript::TranscriptEntry;

    struct FakeBackend {
        health: Mutex<Result<HealthReport, ClientError>>,
        reply: Mutex<Result<ChatReply, ClientError>>,
        chat_calls: AtomicUsize,
    }

    impl FakeBackend {
        fn new(reply: Result<ChatReply, ClientError>) -> Arc<Self> {
            Arc::new(Self {
                health: Mutex::new(Ok(HealthReport {
                    status: Some("connected".to_string()),
                    ..HealthReport::default()
                })),
                reply: Mutex::new(reply),
                chat_calls: AtomicUsize::new(0),
            })
        }

        fn set_health(&self, result: Result<HealthReport, ClientError>) {
            *self.health.lock().unwrap() = result;
        }
    }

    #[async_trait]
    impl BotBackend for FakeBackend {
        async fn health(&self) -> Result<HealthReport, ClientError> {
            self.health.lock().unwrap().clone()
        }

        async fn chat(&self, _query: &str) -> Result<ChatReply, ClientError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            self.reply.lock().unwrap().clone()
        }

        fn base_url(&self) -> &str {
            "http://bot.test/api"
        }
    }

    fn answer(text: &str) -> Result<ChatReply, ClientError> {
        Ok(ChatReply {
            status: Some("success".to_string()),
            response: Some(text.to_string()),
            ..ChatReply::default()
        })
    }

    fn session(backend: Arc<FakeBackend>) -> ChatSession {
        ChatSession::with_clock(backend, Arc::new(|| "12:34".to_string()))
    }

    async fn connected_session(backend: Arc<FakeBackend>) -> ChatSession {
        let mut session = session(backend);
        assert_eq!(session.check_health().await, ConnectionState::Connected);
        session
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_request() {
        let backend = FakeBackend::new(answer("unused"));
        let mut session = connected_session(backend.clone()).await;

        assert_eq!(session.submit("   \n\t").await, Err(SubmitRejection::EmptyQuery));
        assert!(session.transcript().messages().is_empty());
        assert!(session.transcript().welcome_visible());
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offline_rejects_submission() {
        let backend = FakeBackend::new(answer("unused"));
        backend.set_health(Err(ClientError::Network("refused".to_string())));
        let mut session = session(backend.clone());

        assert_eq!(session.check_health().await, ConnectionState::Disconnected);
        assert_eq!(session.submit("What is PPE?").await, Err(SubmitRejection::Offline));
        assert!(session.transcript().messages().is_empty());
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_connected_status_counts_as_offline() {
        let backend = FakeBackend::new(answer("unused"));
        backend.set_health(Ok(HealthReport {
            status: Some("error".to_string()),
            ..HealthReport::default()
        }));
        let mut session = session(backend);

        session.set_connection(ConnectionState::Connected);
        assert_eq!(session.check_health().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn busy_submission_is_a_silent_noop() {
        let backend = FakeBackend::new(answer("reply"));
        let mut session = connected_session(backend.clone()).await;

        let pending = session.begin_query("first").unwrap();
        assert_eq!(pending.query, "first");
        assert!(session.is_loading());

        assert_eq!(session.begin_query("second"), Err(SubmitRejection::Busy));
        assert_eq!(session.submit("third").await, Err(SubmitRejection::Busy));
        assert_eq!(session.transcript().messages().len(), 1);
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);

        let outcome = backend.chat(&pending.query).await;
        session.finish_query(outcome);
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.transcript().messages().len(), 2);
    }

    #[tokio::test]
    async fn clear_during_request_keeps_the_reply() {
        let backend = FakeBackend::new(answer("late answer"));
        let mut session = connected_session(backend).await;

        session.begin_query("q").unwrap();
        session.clear();

        assert!(session.is_loading());
        assert!(!session.transcript().is_typing());
        assert!(session.transcript().welcome_visible());
        assert_eq!(session.begin_query("again"), Err(SubmitRejection::Busy));

        session.finish_query(answer("late answer"));
        assert!(!session.is_loading());
        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), "late answer");
    }

    #[tokio::test]
    async fn successful_reply_appends_one_bot_message() {
        let backend = FakeBackend::new(answer("**PPE** protects workers"));
        let mut session = connected_session(backend.clone()).await;

        session.submit("  What is PPE?  ").await.unwrap();

        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender(), Sender::User);
        assert_eq!(messages[0].text(), "What is PPE?");
        assert_eq!(messages[1].sender(), Sender::Bot);
        assert_eq!(messages[1].text(), "**PPE** protects workers");
        assert_eq!(messages[1].timestamp(), "12:34");
        assert!(!session.is_loading());
        assert!(!session.transcript().is_typing());
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_answer_uses_fallback() {
        let backend = FakeBackend::new(answer(""));
        let mut session = connected_session(backend).await;

        session.submit("anything").await.unwrap();

        let last = session.transcript().last().unwrap();
        assert_eq!(last.sender(), Sender::Bot);
        assert_eq!(last.text(), NO_ANSWER_MESSAGE);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn failed_request_uses_server_fallback() {
        let backend = FakeBackend::new(Err(ClientError::HttpStatus(500)));
        let mut session = connected_session(backend).await;

        session.submit("anything").await.unwrap();

        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].text().starts_with("Error communicating with the server"));
        assert!(messages[1].text().contains("http://bot.test/api"));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn failure_does_not_touch_connection_state() {
        let backend = FakeBackend::new(Err(ClientError::Timeout));
        let mut session = connected_session(backend).await;

        session.submit("anything").await.unwrap();
        assert_eq!(session.connection(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn typing_entry_shown_while_in_flight() {
        let backend = FakeBackend::new(answer("ok"));
        let mut session = connected_session(backend).await;

        session.begin_query("q").unwrap();
        assert_eq!(session.transcript().snapshot().last(), Some(&TranscriptEntry::Typing));

        session.finish_query(answer("ok"));
        assert!(!session
            .transcript()
            .snapshot()
            .iter()
            .any(|entry| matches!(entry, TranscriptEntry::Typing)));
    }
}
