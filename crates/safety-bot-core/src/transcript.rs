//! UI-agnostic conversation state.
//!
//! The transcript is what every front end draws: an optional welcome
//! placeholder, the ordered messages, and at most one "typing" entry.

use log::debug;

use crate::format::FormattedText;

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// A single message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    text: String,
    sender: Sender,
    timestamp: String,
    formatted: FormattedText,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, sender: Sender, timestamp: impl Into<String>) -> Self {
        let text = text.into();
        let formatted = match sender {
            Sender::User => FormattedText::plain(&text),
            Sender::Bot => FormattedText::bot(&text),
        };
        Self {
            text,
            sender,
            timestamp: timestamp.into(),
            formatted,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn formatted(&self) -> &FormattedText {
        &self.formatted
    }
}

/// Initial content shown before the first message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Welcome {
    pub title: &'static str,
    pub description: &'static str,
    pub disclaimer: &'static str,
    pub suggestions: &'static [&'static str],
}

pub const WELCOME: Welcome = Welcome {
    title: "Welcome to Safety Bot",
    description: "Ask any safety-related questions about oil & gas operations.",
    disclaimer: "Educational Information Only: Always consult certified professionals for operational decisions.",
    suggestions: &[
        "What is confined space safety?",
        "What PPE is required in a refinery?",
        "Explain safety zone classifications",
        "What are the key emergency procedures?",
    ],
};

/// One drawable item, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptEntry<'a> {
    Welcome(&'a Welcome),
    Message(&'a ChatMessage),
    Typing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    welcome_visible: bool,
    messages: Vec<ChatMessage>,
    typing: bool,
    revision: u64,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            welcome_visible: true,
            messages: Vec::new(),
            typing: false,
            revision: 0,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        if self.welcome_visible {
            debug!("removing welcome placeholder");
            self.welcome_visible = false;
        }
        self.messages.push(message);
        self.revision += 1;
    }

    /// Reset to the welcome placeholder. The typing entry goes too; a
    /// request still in flight appends its reply to the empty transcript.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.welcome_visible = true;
        self.typing = false;
        self.revision += 1;
    }

    pub fn set_typing(&mut self, typing: bool) {
        if self.typing != typing {
            self.typing = typing;
            self.revision += 1;
        }
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn welcome_visible(&self) -> bool {
        self.welcome_visible
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Bumped on every visible change; front ends use it to know when to
    /// scroll to the newest entry.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> Vec<TranscriptEntry<'_>> {
        let mut entries = Vec::with_capacity(self.messages.len() + 2);
        if self.welcome_visible {
            entries.push(TranscriptEntry::Welcome(&WELCOME));
        }
        entries.extend(self.messages.iter().map(TranscriptEntry::Message));
        if self.typing {
            entries.push(TranscriptEntry::Typing);
        }
        entries
    }
}
