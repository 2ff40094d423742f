// Transport boundary for the archive pipeline.
//
// The pipeline never talks to reqwest directly. Production wires in
// WaybackClient; tests use MockTransport from `testing`.

use async_trait::async_trait;
use wayback_client::{Snapshot, WaybackClient};

#[async_trait]
pub trait ArchiveTransport: Send + Sync {
    /// Fetch a CDX result table. Row 0 holds the column names.
    async fn fetch_index(&self, url: &str) -> wayback_client::Result<Vec<Vec<String>>>;

    /// Fetch one archived snapshot.
    async fn fetch_snapshot(&self, url: &str) -> wayback_client::Result<Snapshot>;
}

#[async_trait]
impl ArchiveTransport for WaybackClient {
    async fn fetch_index(&self, url: &str) -> wayback_client::Result<Vec<Vec<String>>> {
        self.index(url).await
    }

    async fn fetch_snapshot(&self, url: &str) -> wayback_client::Result<Snapshot> {
        self.snapshot(url).await
    }
}
