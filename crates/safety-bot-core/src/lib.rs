pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod monitor;
pub mod render;
pub mod session;
pub mod transcript;

// Re-export main types for convenience
pub use api::{BotBackend, BotInfo, ChatReply, ClientSettings, HealthReport, SafetyBotClient, DEFAULT_BASE_URL};
pub use config::Config;
pub use error::{ClientError, SubmitRejection};
pub use format::{FormattedLine, FormattedText, Segment};
pub use monitor::HealthMonitor;
pub use render::{HtmlRenderer, TranscriptRenderer};
pub use session::{ChatSession, ConnectionState, PendingQuery};
pub use transcript::{ChatMessage, Sender, Transcript, TranscriptEntry, Welcome, WELCOME};
