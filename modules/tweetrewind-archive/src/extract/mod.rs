// Snapshot → post reconstruction.
//
// Archive coverage is partial by nature, so nothing in here returns an error:
// a snapshot that cannot be fetched or mined is simply absent.

pub mod strategies;

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use scraper::Html;
use tracing::{debug, warn};
use tweetrewind_common::{CaptureRecord, ContentRecord};
use wayback_client::Snapshot;

use crate::transport::ArchiveTransport;
use strategies::{first_match, TEXT_STRATEGIES, TIMESTAMP_STRATEGIES};

/// Title formats used by older post layouts, e.g. `3:45 PM - 15 Jun 2021`.
const LEGACY_TIMESTAMP_FORMATS: &[&str] = &["%I:%M %p - %d %b %Y", "%H:%M - %d %b %Y"];

pub struct ContentExtractor {
    transport: Arc<dyn ArchiveTransport>,
    base_url: String,
}

impl ContentExtractor {
    pub fn new(transport: Arc<dyn ArchiveTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Fetch one capture's original payload and reconstruct the post it holds.
    pub async fn extract(&self, capture: &CaptureRecord) -> Option<ContentRecord> {
        let url = wayback_client::snapshot_url(
            &self.base_url,
            &capture.capture_timestamp,
            &capture.source_url,
        );

        let snapshot = match self.transport.fetch_snapshot(&url).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(url = url.as_str(), error = %e, "extract: snapshot fetch failed, skipping");
                return None;
            }
        };

        let record = extract_record(&snapshot, &capture.capture_timestamp);
        if record.is_none() {
            debug!(url = url.as_str(), "extract: no post content in snapshot");
        }
        record
    }
}

/// Reconstruct a post from a fetched snapshot. Structured payloads are read
/// directly; anything else is mined as markup.
pub fn extract_record(snapshot: &Snapshot, capture_timestamp: &str) -> Option<ContentRecord> {
    if snapshot.is_json() {
        let value: serde_json::Value = match serde_json::from_str(&snapshot.body) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "extract: snapshot typed as JSON does not parse");
                return None;
            }
        };
        if let Some(record) = record_from_json(&value) {
            return Some(record);
        }
    }

    record_from_markup(&snapshot.body, capture_timestamp)
}

/// Read `data.text` / `data.created_at`; both must be present.
pub fn record_from_json(value: &serde_json::Value) -> Option<ContentRecord> {
    let data = value.get("data")?;
    let text = data.get("text")?.as_str()?;
    let created_at = data.get("created_at")?.as_str()?;
    ContentRecord::new(text, created_at)
}

pub fn record_from_markup(body: &str, capture_timestamp: &str) -> Option<ContentRecord> {
    let document = Html::parse_document(body);

    let (text_source, text) = first_match(&document, TEXT_STRATEGIES)?;
    let timestamp = match first_match(&document, TIMESTAMP_STRATEGIES) {
        Some((source, raw)) => {
            debug!(text_source, timestamp_source = source, "extract: markup matched");
            normalize_timestamp(&raw)
        }
        None => {
            debug!(text_source, "extract: falling back to capture time");
            archival_timestamp_to_iso(capture_timestamp)?
        }
    };

    ContentRecord::new(text, timestamp)
}

/// Convert a 14-digit capture time (`YYYYMMDDHHMMSS`, UTC) to ISO-8601.
pub fn archival_timestamp_to_iso(ts: &str) -> Option<String> {
    if ts.len() != 14 || !ts.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!(
        "{}-{}-{}T{}:{}:{}Z",
        &ts[0..4],
        &ts[4..6],
        &ts[6..8],
        &ts[8..10],
        &ts[10..12],
        &ts[12..14]
    ))
}

/// Keep RFC 3339 values as given; rewrite legacy title timestamps to ISO-8601
/// UTC. Anything unrecognized passes through unchanged.
pub fn normalize_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return raw.to_string();
    }
    LEGACY_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| raw.to_string())
}
