use thiserror::Error;

pub type Result<T> = std::result::Result<T, WaybackError>;

#[derive(Debug, Clone, Error)]
pub enum WaybackError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Host unreachable: {0}")]
    Unreachable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WaybackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WaybackError::Timeout(err.to_string())
        } else if err.is_connect() {
            WaybackError::Unreachable(err.to_string())
        } else {
            WaybackError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WaybackError {
    fn from(err: serde_json::Error) -> Self {
        WaybackError::Parse(err.to_string())
    }
}
