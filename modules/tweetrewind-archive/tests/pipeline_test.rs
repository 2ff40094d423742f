//! End-to-end pipeline tests over MockTransport: no network.

use std::sync::Arc;
use std::time::Duration;

use tweetrewind_archive::testing::{html_snapshot, json_snapshot, table, MockTransport};
use tweetrewind_archive::{Archive, ArchiveConfig, IndexEndpoint, IndexFailure, PipelineError, Subject};
use wayback_client::WaybackError;

const BASE: &str = "https://archive.test";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config() -> ArchiveConfig {
    ArchiveConfig {
        base_url: BASE.to_string(),
        concurrency: 3,
        index_attempts: 2,
        index_backoff: Duration::ZERO,
        ..ArchiveConfig::default()
    }
}

fn jack() -> Subject {
    Subject::parse("@jack").unwrap()
}

fn index_urls(subject: &Subject) -> Vec<String> {
    IndexEndpoint::DEFAULTS
        .iter()
        .map(|e| e.url(BASE, subject).unwrap())
        .collect()
}

fn post_url(id: u32) -> String {
    format!("https://twitter.com/jack/status/{id}")
}

fn snapshot_url(ts: &str, id: u32) -> String {
    format!("{BASE}/web/{ts}id_/{}", post_url(id))
}

fn post_html(text: &str, published: &str) -> String {
    format!(
        r#"<html><head>
        <meta property="og:description" content="{text}">
        <meta property="article:published_time" content="{published}">
        </head><body></body></html>"#
    )
}

// ---------------------------------------------------------------------------
// Ordering and extraction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn posts_come_back_newest_first() {
    let urls = index_urls(&jack());
    let transport = MockTransport::new()
        .on_index(
            &urls[0],
            table(&[
                &["urlkey", "timestamp", "original"],
                &["k1", "20210301000000", post_url(1).as_str()],
                &["k3", "20230301000000", post_url(3).as_str()],
                &["k2", "20220301000000", post_url(2).as_str()],
            ]),
        )
        .on_snapshot(
            &snapshot_url("20210301000000", 1),
            html_snapshot(&post_html("T1", "2021-03-01T00:00:00Z")),
        )
        .on_snapshot(
            &snapshot_url("20230301000000", 3),
            html_snapshot(&post_html("T3", "2023-03-01T00:00:00Z")),
        )
        .on_snapshot(
            &snapshot_url("20220301000000", 2),
            json_snapshot(&serde_json::json!({
                "data": { "text": "T2", "created_at": "2022-03-01T00:00:00Z" }
            })),
        );

    let archive = Archive::new(config(), Arc::new(transport));
    let posts = archive.posts(jack()).await.unwrap();

    let texts: Vec<_> = posts.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["T3", "T2", "T1"]);
    assert_eq!(posts[0].timestamp, "2023-03-01T00:00:00Z");
}

#[tokio::test]
async fn bad_snapshots_are_skipped_not_fatal() {
    let urls = index_urls(&jack());
    let transport = MockTransport::new()
        .on_index(
            &urls[0],
            table(&[
                &["original", "timestamp"],
                &[post_url(1).as_str(), "20210101000000"],
                &[post_url(2).as_str(), "20210102000000"],
                &[post_url(3).as_str(), "20210103000000"],
                &["https://twitter.com/jack", "20210104000000"],
            ]),
        )
        .on_snapshot(
            &snapshot_url("20210101000000", 1),
            html_snapshot(r#"<meta property="og:description" content="survivor">"#),
        )
        .on_snapshot_error(
            &snapshot_url("20210102000000", 2),
            WaybackError::Timeout("7s".into()),
        )
        .on_snapshot(
            &snapshot_url("20210103000000", 3),
            html_snapshot("<html><body>suspended account</body></html>"),
        );
    let transport = Arc::new(transport);

    let archive = Archive::new(config(), transport.clone());
    let posts = archive.posts(jack()).await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "survivor");
    assert_eq!(posts[0].timestamp, "2021-01-01T00:00:00Z");
    // The profile URL is not a post and is never fetched.
    assert_eq!(
        transport.snapshot_calls(&format!("{BASE}/web/20210104000000id_/https://twitter.com/jack")),
        0
    );
}

#[tokio::test]
async fn no_extractable_posts_is_an_empty_success() {
    let urls = index_urls(&jack());
    let transport = MockTransport::new().on_index(
        &urls[0],
        table(&[&["original", "timestamp"], &[post_url(1).as_str(), "20210101000000"]]),
    );

    let archive = Archive::new(config(), Arc::new(transport));
    assert_eq!(archive.posts(jack()).await, Ok(Vec::new()));
}

// ---------------------------------------------------------------------------
// Index failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exhausted_index_is_a_failure_not_an_empty_list() {
    let urls = index_urls(&jack());
    let transport = Arc::new(
        MockTransport::new()
            .on_index_error(&urls[0], WaybackError::Timeout("15s".into()))
            .on_index_error(&urls[1], WaybackError::Timeout("15s".into()))
            .on_index_error(&urls[2], WaybackError::Timeout("15s".into())),
    );

    let archive = Archive::new(config(), transport.clone());
    let err = archive.posts(jack()).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::IndexUnavailable {
            reason: IndexFailure::Timeout,
            ..
        }
    ));
    // Two attempts across three endpoint variants.
    assert_eq!(transport.total_index_calls(), 6);
}

#[tokio::test]
async fn header_only_index_everywhere_fails() {
    let urls = index_urls(&jack());
    let header = table(&[&["original", "timestamp"]]);
    let transport = MockTransport::new()
        .on_index(&urls[0], header.clone())
        .on_index(&urls[1], header.clone())
        .on_index(&urls[2], header);

    let archive = Archive::new(config(), Arc::new(transport));
    let err = archive.posts(jack()).await.unwrap_err();
    assert_eq!(err.index_reason(), Some(IndexFailure::Empty));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn snapshot_fetches_respect_concurrency_ceiling() {
    let urls = index_urls(&jack());
    let mut rows: Vec<Vec<String>> = vec![vec!["original".into(), "timestamp".into()]];
    let mut transport = MockTransport::new().with_snapshot_latency(Duration::from_millis(10));
    for id in 0..12u32 {
        let ts = format!("202101010000{id:02}");
        rows.push(vec![post_url(id), ts.clone()]);
        transport = transport.on_snapshot(
            &snapshot_url(&ts, id),
            html_snapshot(&format!(r#"<meta property="og:description" content="post {id}">"#)),
        );
    }
    let transport = Arc::new(transport.on_index(&urls[0], rows));

    let archive = Archive::new(config(), transport.clone());
    let posts = archive.posts(jack()).await.unwrap();

    assert_eq!(posts.len(), 12);
    assert_eq!(posts[0].text, "post 11");
    assert_eq!(transport.peak_concurrent_snapshots(), 3);
}

#[tokio::test]
async fn concurrent_requests_share_one_pipeline() {
    let urls = index_urls(&jack());
    let transport = Arc::new(
        MockTransport::new()
            .on_index(
                &urls[0],
                table(&[&["original", "timestamp"], &[post_url(1).as_str(), "20210101000000"]]),
            )
            .on_snapshot(
                &snapshot_url("20210101000000", 1),
                html_snapshot(r#"<meta property="og:description" content="only">"#),
            )
            .with_index_latency(Duration::from_millis(20)),
    );

    let archive = Archive::new(config(), transport.clone());
    let (a, b) = tokio::join!(archive.posts(jack()), archive.posts(Subject::parse("jack").unwrap()));

    assert_eq!(a, b);
    assert_eq!(transport.total_index_calls(), 1);
    assert_eq!(transport.snapshot_calls(&snapshot_url("20210101000000", 1)), 1);

    // Settled: the next request runs again.
    archive.posts(jack()).await.unwrap();
    assert_eq!(transport.total_index_calls(), 2);
}
