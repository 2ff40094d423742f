// Test double for the archive transport.
//
// MockTransport is URL-keyed: register index tables and snapshots up front,
// then assert on per-URL call counts. Unregistered index URLs fail as
// unreachable; unregistered snapshots fail with a 404.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use wayback_client::{Snapshot, WaybackError};

use crate::transport::ArchiveTransport;

type IndexResponse = Result<Vec<Vec<String>>, WaybackError>;
type SnapshotResponse = Result<Snapshot, WaybackError>;

/// Build an index table from string slices.
pub fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

pub fn html_snapshot(body: &str) -> Snapshot {
    Snapshot {
        content_type: Some("text/html; charset=utf-8".to_string()),
        body: body.to_string(),
    }
}

pub fn json_snapshot(body: &serde_json::Value) -> Snapshot {
    Snapshot {
        content_type: Some("application/json".to_string()),
        body: body.to_string(),
    }
}

#[derive(Default)]
pub struct MockTransport {
    // A queue replays one response per call; the last entry repeats.
    indexes: HashMap<String, Mutex<VecDeque<IndexResponse>>>,
    snapshots: HashMap<String, SnapshotResponse>,
    index_latency: Duration,
    snapshot_latency: Duration,
    calls: Mutex<HashMap<String, usize>>,
    index_total: AtomicUsize,
    snapshots_in_flight: AtomicUsize,
    snapshots_peak: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_index(self, url: &str, rows: Vec<Vec<String>>) -> Self {
        self.on_index_sequence(url, vec![Ok(rows)])
    }

    pub fn on_index_error(self, url: &str, err: WaybackError) -> Self {
        self.on_index_sequence(url, vec![Err(err)])
    }

    pub fn on_index_sequence(mut self, url: &str, responses: Vec<IndexResponse>) -> Self {
        self.indexes
            .insert(url.to_string(), Mutex::new(responses.into_iter().collect()));
        self
    }

    pub fn on_snapshot(mut self, url: &str, snapshot: Snapshot) -> Self {
        self.snapshots.insert(url.to_string(), Ok(snapshot));
        self
    }

    pub fn on_snapshot_error(mut self, url: &str, err: WaybackError) -> Self {
        self.snapshots.insert(url.to_string(), Err(err));
        self
    }

    pub fn with_index_latency(mut self, latency: Duration) -> Self {
        self.index_latency = latency;
        self
    }

    pub fn with_snapshot_latency(mut self, latency: Duration) -> Self {
        self.snapshot_latency = latency;
        self
    }

    /// Calls made for `url`, index or snapshot.
    pub fn index_calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn snapshot_calls(&self, url: &str) -> usize {
        self.index_calls(url)
    }

    /// Index requests across every URL.
    pub fn total_index_calls(&self) -> usize {
        self.index_total.load(Ordering::SeqCst)
    }

    /// Most snapshot fetches observed running at the same time.
    pub fn peak_concurrent_snapshots(&self) -> usize {
        self.snapshots_peak.load(Ordering::SeqCst)
    }

    fn record(&self, url: &str) {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
    }

    fn next_index(&self, url: &str) -> IndexResponse {
        let unregistered = || {
            Err(WaybackError::Unreachable(format!(
                "MockTransport: no index registered for {url}"
            )))
        };
        let Some(queue) = self.indexes.get(url) else {
            return unregistered();
        };
        let mut queue = queue.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(unregistered)
        } else {
            queue.front().cloned().unwrap_or_else(unregistered)
        }
    }
}

#[async_trait]
impl ArchiveTransport for MockTransport {
    async fn fetch_index(&self, url: &str) -> wayback_client::Result<Vec<Vec<String>>> {
        self.record(url);
        self.index_total.fetch_add(1, Ordering::SeqCst);
        if !self.index_latency.is_zero() {
            tokio::time::sleep(self.index_latency).await;
        }
        self.next_index(url)
    }

    async fn fetch_snapshot(&self, url: &str) -> wayback_client::Result<Snapshot> {
        self.record(url);
        let now = self.snapshots_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshots_peak.fetch_max(now, Ordering::SeqCst);
        if !self.snapshot_latency.is_zero() {
            tokio::time::sleep(self.snapshot_latency).await;
        }
        self.snapshots_in_flight.fetch_sub(1, Ordering::SeqCst);

        self.snapshots.get(url).cloned().unwrap_or_else(|| {
            Err(WaybackError::Api {
                status: 404,
                message: format!("MockTransport: no snapshot registered for {url}"),
            })
        })
    }
}
