use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};
use tweetrewind_common::{ContentRecord, PipelineResult, Subject};

use crate::error::PipelineError;
use crate::extract::ContentExtractor;
use crate::index::SnapshotIndexFetcher;
use crate::limiter::AdmissionLimiter;

/// One subject's pipeline: index lookup, gated snapshot extraction, sort.
pub struct FanoutCoordinator {
    index: SnapshotIndexFetcher,
    extractor: ContentExtractor,
    limiter: Arc<AdmissionLimiter>,
}

impl FanoutCoordinator {
    pub fn new(
        index: SnapshotIndexFetcher,
        extractor: ContentExtractor,
        limiter: Arc<AdmissionLimiter>,
    ) -> Self {
        Self {
            index,
            extractor,
            limiter,
        }
    }

    /// Fails only when the index is unavailable. An empty result means the
    /// archive had captures but none of them yielded a post.
    pub async fn run(&self, subject: &Subject) -> Result<PipelineResult, PipelineError> {
        info!(subject = %subject, "fanout: pipeline started");

        let captures = self.index.fetch(subject).await?;
        info!(
            subject = %subject,
            captures = captures.len(),
            capacity = self.limiter.capacity(),
            "fanout: extracting snapshots"
        );

        let outcomes = join_all(captures.iter().map(|capture| async move {
            match self.limiter.run(|| self.extractor.extract(capture)).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(url = capture.source_url.as_str(), error = %e, "fanout: snapshot not admitted");
                    None
                }
            }
        }))
        .await;

        let records: Vec<ContentRecord> = outcomes.into_iter().flatten().collect();
        let skipped = captures.len() - records.len();
        let sorted = sort_newest_first(records);

        info!(
            subject = %subject,
            posts = sorted.len(),
            skipped,
            "fanout: pipeline finished"
        );
        Ok(sorted)
    }
}

/// Sort by timestamp, newest first. Equal timestamps keep their input order;
/// timestamps that do not parse go last, also in input order.
pub fn sort_newest_first(mut records: Vec<ContentRecord>) -> Vec<ContentRecord> {
    records.sort_by_cached_key(|record| Reverse(parse_timestamp(&record.timestamp)));
    records
}

/// Offset-less ISO-8601 forms.
const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Classic post API `created_at`, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parse a record timestamp. Values without an offset are read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, NAIVE_DATETIME_FORMAT) {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_str(raw, CREATED_AT_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
