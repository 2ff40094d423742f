pub mod archive;
pub mod coalescer;
pub mod error;
pub mod extract;
pub mod fanout;
pub mod index;
pub mod limiter;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod transport;

pub use archive::{Archive, ArchiveConfig};
pub use coalescer::RequestCoalescer;
pub use error::{ArchiveError, IndexFailure, PipelineError, Result};
pub use extract::ContentExtractor;
pub use fanout::FanoutCoordinator;
pub use index::{IndexEndpoint, SnapshotIndexFetcher};
pub use limiter::AdmissionLimiter;
pub use transport::ArchiveTransport;
pub use tweetrewind_common::types::{CaptureRecord, ContentRecord, PipelineResult, Subject};
