//! Blocking finviz.com client.
//!
//! Blocking on purpose: the sandbox's native callouts are synchronous and
//! run on the execution worker thread, so re-entering the async runtime
//! from inside the VM is avoided entirely.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://finviz.com";

// finviz rejects the default reqwest user agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) mcp-finviz/0.1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("finviz returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("no quote data found for ticker '{0}'")]
    UnknownTicker(String),
}

/// Client for the finviz.com endpoints the capability exposes.
pub struct FinvizClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl FinvizClient {
    pub fn new() -> Result<Self, SdkError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against a different base URL; used by tests to point at a
    /// mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, SdkError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fundamentals from the quote page's snapshot table, as ordered
    /// label/value pairs.
    pub fn quote_snapshot(&self, ticker: &str) -> Result<Vec<(String, String)>, SdkError> {
        let ticker = ticker.trim().to_uppercase();
        let url = format!("{}/quote.ashx?t={}", self.base_url, ticker);
        let body = self.get_text(&url)?;
        let pairs = parse_snapshot_table(&body);
        if pairs.is_empty() {
            return Err(SdkError::UnknownTicker(ticker));
        }
        tracing::debug!(ticker = %ticker, fields = pairs.len(), "fetched quote snapshot");
        Ok(pairs)
    }

    /// Forex performance, as returned by the JSON endpoint.
    pub fn forex_performance(&self) -> Result<Value, SdkError> {
        self.get_json(&format!("{}/api/forex_perf.ashx", self.base_url))
    }

    /// Crypto performance, as returned by the JSON endpoint.
    pub fn crypto_performance(&self) -> Result<Value, SdkError> {
        self.get_json(&format!("{}/api/crypto_perf.ashx", self.base_url))
    }

    fn get_text(&self, url: &str) -> Result<String, SdkError> {
        let response = self.http.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SdkError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text()?)
    }

    fn get_json(&self, url: &str) -> Result<Value, SdkError> {
        let response = self.http.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SdkError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json()?)
    }
}

/// Extract the snapshot table's cells into label/value pairs.
///
/// The quote page renders fundamentals as alternating `snapshot-td2`
/// cells; cell text may be wrapped in `<b>` and/or an anchor.
fn parse_snapshot_table(html: &str) -> Vec<(String, String)> {
    static CELL: OnceLock<Regex> = OnceLock::new();
    let cell = CELL.get_or_init(|| {
        Regex::new(r#"class="snapshot-td2[^"]*"[^>]*>(?:<b>)?(?:<a[^>]*>)?([^<]+)"#)
            .expect("snapshot cell pattern is valid")
    });

    let cells: Vec<String> = cell
        .captures_iter(html)
        .map(|cap| cap[1].trim().to_string())
        .collect();

    cells
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}
