// Archive: the public entry point for post retrieval.
// Callers hand it a subject; it wires the index fetcher, extractor, limiter
// and coalescer together over one transport.

use std::sync::Arc;
use std::time::Duration;

use tweetrewind_common::{Config, PipelineResult, Subject};
use wayback_client::WaybackClient;

use crate::coalescer::RequestCoalescer;
use crate::error::{ArchiveError, PipelineError, Result};
use crate::extract::ContentExtractor;
use crate::fanout::FanoutCoordinator;
use crate::index::SnapshotIndexFetcher;
use crate::limiter::{AdmissionLimiter, DEFAULT_CAPACITY};
use crate::transport::ArchiveTransport;

/// Tuning for the retrieval pipeline.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub base_url: String,
    pub concurrency: usize,
    pub index_attempts: u32,
    pub index_backoff: Duration,
    pub index_timeout: Duration,
    pub snapshot_timeout: Duration,
    pub max_captures: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: wayback_client::DEFAULT_BASE_URL.to_string(),
            concurrency: DEFAULT_CAPACITY,
            index_attempts: 3,
            index_backoff: Duration::from_secs(2),
            index_timeout: Duration::from_secs(15),
            snapshot_timeout: Duration::from_secs(7),
            max_captures: 100,
        }
    }
}

impl From<&Config> for ArchiveConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.wayback_base_url.clone(),
            concurrency: config.fetch_concurrency,
            index_attempts: config.index_attempts,
            index_backoff: config.index_backoff,
            index_timeout: config.index_timeout,
            snapshot_timeout: config.snapshot_timeout,
            max_captures: config.max_captures,
        }
    }
}

pub struct Archive {
    coalescer: RequestCoalescer,
}

impl Archive {
    /// Build over any transport. Tests pass a `MockTransport` here.
    pub fn new(config: ArchiveConfig, transport: Arc<dyn ArchiveTransport>) -> Self {
        let limiter = Arc::new(AdmissionLimiter::new(config.concurrency));
        let index = SnapshotIndexFetcher::new(
            transport.clone(),
            config.base_url.clone(),
            config.index_attempts,
            config.index_backoff,
            config.max_captures,
        );
        let extractor = ContentExtractor::new(transport, config.base_url);
        let coordinator = FanoutCoordinator::new(index, extractor, limiter);

        Self {
            coalescer: RequestCoalescer::new(Arc::new(coordinator)),
        }
    }

    /// Build over the live Wayback Machine.
    pub fn connect(config: ArchiveConfig) -> Result<Self> {
        url::Url::parse(&config.base_url)
            .map_err(|e| ArchiveError::Config(format!("base URL {:?}: {e}", config.base_url)))?;

        let client = WaybackClient::new(config.index_timeout, config.snapshot_timeout)?;
        tracing::info!(base_url = config.base_url.as_str(), "Archive connected");
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Archived posts for `subject`, newest first. Concurrent calls for the
    /// same subject share one run.
    pub async fn posts(&self, subject: Subject) -> std::result::Result<PipelineResult, PipelineError> {
        self.coalescer.request(subject).await
    }
}
