// Capture index lookup: which snapshots of a subject's posts exist.
//
// Two loop dimensions, kept separate: `query_endpoints` walks the endpoint
// variants once, `fetch_table` repeats that walk up to `attempts` times with a
// fixed backoff in between.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tweetrewind_common::{CaptureRecord, Subject};

use crate::error::{IndexFailure, PipelineError};
use crate::transport::ArchiveTransport;

const URL_COLUMN: &str = "original";
const TIMESTAMP_COLUMN: &str = "timestamp";

/// Path fragment that marks a URL as an individual post.
const POST_PATH_MARKER: &str = "/status/";

/// One index query shape. Variants differ only by result-size limit; a
/// smaller limit sometimes succeeds when the full query times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEndpoint {
    pub limit: Option<u32>,
}

impl IndexEndpoint {
    pub const DEFAULTS: [IndexEndpoint; 3] = [
        IndexEndpoint { limit: None },
        IndexEndpoint { limit: Some(1000) },
        IndexEndpoint { limit: Some(500) },
    ];

    pub fn url(&self, base_url: &str, subject: &Subject) -> wayback_client::Result<String> {
        let pattern = format!("twitter.com/{}/status/*", subject.as_str());
        wayback_client::cdx_url(base_url, &pattern, self.limit)
    }
}

/// A result table whose header has both required columns and at least one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTable {
    url_column: usize,
    timestamp_column: usize,
    rows: Vec<Vec<String>>,
}

impl IndexTable {
    /// Validate a raw table. Columns are located by name because their
    /// position differs between endpoint variants.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Result<Self, IndexFailure> {
        if rows.len() < 2 {
            return Err(IndexFailure::Empty);
        }
        let header = rows.remove(0);
        let position = |name: &str| header.iter().position(|col| col == name);
        let (Some(url_column), Some(timestamp_column)) =
            (position(URL_COLUMN), position(TIMESTAMP_COLUMN))
        else {
            return Err(IndexFailure::Malformed);
        };

        Ok(Self {
            url_column,
            timestamp_column,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Project rows into captures of individual posts, keeping the last
    /// `max_captures` in table order. The cut follows table order, not parsed
    /// capture time, so an unordered index can lose genuinely recent posts.
    pub fn captures(&self, max_captures: usize) -> Vec<CaptureRecord> {
        let mut captures: Vec<CaptureRecord> = self
            .rows
            .iter()
            .filter_map(|row| {
                let url = row.get(self.url_column)?;
                let timestamp = row.get(self.timestamp_column)?;
                if !url.contains(POST_PATH_MARKER) {
                    return None;
                }
                Some(CaptureRecord {
                    source_url: url.clone(),
                    capture_timestamp: timestamp.clone(),
                })
            })
            .collect();

        let skip = captures.len().saturating_sub(max_captures);
        captures.split_off(skip)
    }
}

/// The last thing that went wrong while reading the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexAttemptError {
    pub reason: IndexFailure,
    pub detail: String,
}

pub struct SnapshotIndexFetcher {
    transport: Arc<dyn ArchiveTransport>,
    base_url: String,
    endpoints: Vec<IndexEndpoint>,
    attempts: u32,
    backoff: Duration,
    max_captures: usize,
}

impl SnapshotIndexFetcher {
    pub fn new(
        transport: Arc<dyn ArchiveTransport>,
        base_url: impl Into<String>,
        attempts: u32,
        backoff: Duration,
        max_captures: usize,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            endpoints: IndexEndpoint::DEFAULTS.to_vec(),
            attempts: attempts.max(1),
            backoff,
            max_captures,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Vec<IndexEndpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// List the captures to fan out over, oldest first as the index returns them.
    pub async fn fetch(&self, subject: &Subject) -> Result<Vec<CaptureRecord>, PipelineError> {
        let table = self.fetch_table(subject).await?;
        let captures = table.captures(self.max_captures);
        info!(
            subject = %subject,
            rows = table.len(),
            captures = captures.len(),
            "index: captures selected"
        );
        Ok(captures)
    }

    /// Repeat the endpoint walk until one variant yields a usable table.
    pub async fn fetch_table(&self, subject: &Subject) -> Result<IndexTable, PipelineError> {
        let mut last = IndexAttemptError {
            reason: IndexFailure::Empty,
            detail: "no index endpoints configured".to_string(),
        };

        for attempt in 1..=self.attempts {
            match self.query_endpoints(subject, attempt).await {
                Ok(table) => return Ok(table),
                Err(e) => last = e,
            }

            if attempt < self.attempts {
                tokio::time::sleep(self.backoff).await;
            }
        }

        warn!(
            subject = %subject,
            attempts = self.attempts,
            reason = %last.reason,
            "index: all attempts exhausted"
        );
        Err(PipelineError::index(
            last.reason,
            format!(
                "all {} index attempts failed, last error: {}",
                self.attempts, last.detail
            ),
        ))
    }

    /// Try each endpoint variant once, in order. First usable table wins.
    pub async fn query_endpoints(
        &self,
        subject: &Subject,
        attempt: u32,
    ) -> Result<IndexTable, IndexAttemptError> {
        let mut last = IndexAttemptError {
            reason: IndexFailure::Empty,
            detail: "no index endpoints configured".to_string(),
        };

        for endpoint in &self.endpoints {
            let url = match endpoint.url(&self.base_url, subject) {
                Ok(url) => url,
                Err(e) => {
                    last = IndexAttemptError {
                        reason: IndexFailure::Malformed,
                        detail: e.to_string(),
                    };
                    continue;
                }
            };

            info!(attempt, url = url.as_str(), "index: querying");

            let outcome = match self.transport.fetch_index(&url).await {
                Ok(rows) => IndexTable::from_rows(rows).map_err(|reason| IndexAttemptError {
                    reason,
                    detail: format!("unusable result table from {url}"),
                }),
                Err(e) => Err(IndexAttemptError {
                    reason: IndexFailure::from_transport(&e),
                    detail: e.to_string(),
                }),
            };

            match outcome {
                Ok(table) => {
                    info!(attempt, rows = table.len(), "index: fetched captures");
                    return Ok(table);
                }
                Err(e) => {
                    warn!(attempt, url = url.as_str(), reason = %e.reason, error = e.detail.as_str(), "index: query failed");
                    last = e;
                }
            }
        }

        Err(last)
    }
}
