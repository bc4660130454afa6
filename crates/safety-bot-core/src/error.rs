use thiserror::Error;

/// Transport-level failure talking to the Safety Bot API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ClientError::Timeout;
        }
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return ClientError::HttpStatus(status.as_u16());
        }
        ClientError::Network(err.to_string())
    }
}

/// Why a submission was refused before any request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("Please enter a question")]
    EmptyQuery,
    #[error("Bot is not connected. Make sure the server is running.")]
    Offline,
    /// A request is already outstanding. Not shown to the user.
    #[error("a request is already in flight")]
    Busy,
}

impl SubmitRejection {
    /// Whether the rejection should be surfaced as an alert.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, SubmitRejection::Busy)
    }
}
