use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized archive handle. Leading `@` markers and surrounding whitespace are
/// stripped; an empty handle is not a subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subject(String);

impl Subject {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let handle = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
        if handle.is_empty() {
            return None;
        }
        Some(Self(handle.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One index row: the captured URL and its 14-digit capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub source_url: String,
    pub capture_timestamp: String,
}

/// A reconstructed post. Both fields are non-empty; construct through
/// [`ContentRecord::new`] to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub text: String,
    pub timestamp: String,
}

impl ContentRecord {
    pub fn new(text: impl Into<String>, timestamp: impl Into<String>) -> Option<Self> {
        let text = text.into().trim().to_string();
        let timestamp = timestamp.into().trim().to_string();
        if text.is_empty() || timestamp.is_empty() {
            return None;
        }
        Some(Self { text, timestamp })
    }
}

/// Records sorted newest first.
pub type PipelineResult = Vec<ContentRecord>;
