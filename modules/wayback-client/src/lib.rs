pub mod error;

pub use error::{Result, WaybackError};

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://web.archive.org";

/// User agent sent to the CDX index. The index rejects some anonymous clients.
const INDEX_USER_AGENT: &str = "Mozilla/5.0 (compatible; WaybackBot/1.0)";

/// Browser-like user agent for snapshot playback.
const SNAPSHOT_USER_AGENT: &str = "Mozilla/5.0";

/// One archived payload as served by the playback endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub content_type: Option<String>,
    pub body: String,
}

impl Snapshot {
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Build a CDX query URL for captures matching `pattern`, restricted to 200 responses.
pub fn cdx_url(base_url: &str, pattern: &str, limit: Option<u32>) -> Result<String> {
    let endpoint = format!("{}/cdx/search/cdx", base_url.trim_end_matches('/'));
    let mut url = url::Url::parse(&endpoint).map_err(|e| WaybackError::Parse(e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("url", pattern)
            .append_pair("output", "json")
            .append_pair("filter", "statuscode:200");
        if let Some(limit) = limit {
            query.append_pair("limit", &limit.to_string());
        }
    }
    Ok(url.into())
}

/// Build the playback URL for one capture. The `id_` flag asks the archive for the
/// original payload without its toolbar or link rewriting.
pub fn snapshot_url(base_url: &str, timestamp: &str, original: &str) -> String {
    format!(
        "{}/web/{timestamp}id_/{original}",
        base_url.trim_end_matches('/')
    )
}

pub struct WaybackClient {
    client: reqwest::Client,
    index_timeout: Duration,
    snapshot_timeout: Duration,
}

impl WaybackClient {
    pub fn new(index_timeout: Duration, snapshot_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| WaybackError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            index_timeout,
            snapshot_timeout,
        })
    }

    /// Fetch a CDX result table. The first row holds column names.
    pub async fn index(&self, url: &str) -> Result<Vec<Vec<String>>> {
        debug!(url, "wayback: querying index");

        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, INDEX_USER_AGENT)
            .timeout(self.index_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(WaybackError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        parse_table(&body)
    }

    /// Fetch one archived snapshot, keeping the response content type.
    pub async fn snapshot(&self, url: &str) -> Result<Snapshot> {
        debug!(url, "wayback: fetching snapshot");

        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, SNAPSHOT_USER_AGENT)
            .timeout(self.snapshot_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(WaybackError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.text().await?;

        Ok(Snapshot { content_type, body })
    }
}

/// Parse a CDX `output=json` body. An empty body is an empty table, which the
/// index returns when nothing matched.
pub fn parse_table(body: &str) -> Result<Vec<Vec<String>>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdx_url_without_limit() {
        let url = cdx_url(DEFAULT_BASE_URL, "twitter.com/jack/status/*", None).unwrap();
        assert!(url.starts_with("https://web.archive.org/cdx/search/cdx?"));
        assert!(url.contains("output=json"));
        assert!(url.contains("filter=statuscode%3A200"));
        assert!(url.contains("url=twitter.com%2Fjack%2Fstatus%2F*"));
        assert!(!url.contains("limit="));
    }

    #[test]
    fn cdx_url_with_limit() {
        let url = cdx_url("https://archive.test/", "twitter.com/jack/status/*", Some(500)).unwrap();
        assert!(url.starts_with("https://archive.test/cdx/search/cdx?"));
        assert!(url.ends_with("limit=500"));
    }

    #[test]
    fn cdx_url_rejects_bad_base() {
        assert!(matches!(
            cdx_url("not a url", "x", None),
            Err(WaybackError::Parse(_))
        ));
    }

    #[test]
    fn snapshot_url_embeds_identity_flag() {
        assert_eq!(
            snapshot_url(
                "https://web.archive.org/",
                "20210615143022",
                "https://twitter.com/jack/status/20"
            ),
            "https://web.archive.org/web/20210615143022id_/https://twitter.com/jack/status/20"
        );
    }

    #[test]
    fn parses_table_rows() {
        let table = parse_table(r#"[["original","timestamp"],["https://x/status/1","20210101000000"]]"#)
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], vec!["original", "timestamp"]);
    }

    #[test]
    fn empty_body_is_empty_table() {
        assert!(parse_table("  \n").unwrap().is_empty());
    }

    #[test]
    fn non_table_body_is_parse_error() {
        assert!(matches!(
            parse_table("<html>busy</html>"),
            Err(WaybackError::Parse(_))
        ));
        assert!(matches!(
            parse_table(r#"{"error":"x"}"#),
            Err(WaybackError::Parse(_))
        ));
    }

    #[test]
    fn json_content_type_detection() {
        let snap = Snapshot {
            content_type: Some("application/json; charset=utf-8".into()),
            body: "{}".into(),
        };
        assert!(snap.is_json());
        let html = Snapshot {
            content_type: Some("text/html".into()),
            body: String::new(),
        };
        assert!(!html.is_json());
        let none = Snapshot {
            content_type: None,
            body: String::new(),
        };
        assert!(!none.is_json());
    }
}
