use std::fmt;

use wayback_client::WaybackError;

/// Result type alias for archive setup and admission operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Admission limiter closed")]
    LimiterClosed,

    #[error("Invalid archive configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Transport(#[from] WaybackError),
}

/// Why the capture index could not be read. Reflects the last failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFailure {
    Timeout,
    Unreachable,
    Network,
    Rejected,
    Malformed,
    Empty,
}

impl IndexFailure {
    pub fn from_transport(err: &WaybackError) -> Self {
        match err {
            WaybackError::Timeout(_) => IndexFailure::Timeout,
            WaybackError::Unreachable(_) => IndexFailure::Unreachable,
            WaybackError::Network(_) => IndexFailure::Network,
            WaybackError::Api { .. } => IndexFailure::Rejected,
            WaybackError::Parse(_) => IndexFailure::Malformed,
        }
    }
}

impl fmt::Display for IndexFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndexFailure::Timeout => "timeout",
            IndexFailure::Unreachable => "unreachable",
            IndexFailure::Network => "network",
            IndexFailure::Rejected => "rejected",
            IndexFailure::Malformed => "malformed",
            IndexFailure::Empty => "empty",
        };
        f.write_str(s)
    }
}

/// Failure of a whole subject pipeline. Cloned to every coalesced waiter, so
/// it carries strings rather than source errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("Archive index unavailable ({reason}): {detail}")]
    IndexUnavailable { reason: IndexFailure, detail: String },

    #[error("Pipeline task aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    pub fn index(reason: IndexFailure, detail: impl Into<String>) -> Self {
        PipelineError::IndexUnavailable {
            reason,
            detail: detail.into(),
        }
    }

    pub fn index_reason(&self) -> Option<IndexFailure> {
        match self {
            PipelineError::IndexUnavailable { reason, .. } => Some(*reason),
            PipelineError::Aborted(_) => None,
        }
    }
}
