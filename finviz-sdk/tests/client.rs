//! Client tests against a mock finviz server.
//!
//! The client is blocking, so calls are moved onto a blocking task while
//! the mock server runs on the test runtime.

use finviz_sdk::{FinvizClient, SdkError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUOTE_PAGE: &str = r#"
<html><body>
<table class="snapshot-table2">
<tr>
<td class="snapshot-td2-cp">Index</td>
<td class="snapshot-td2"><b>DJIA, S&P 500</b></td>
<td class="snapshot-td2-cp">Price</td>
<td class="snapshot-td2"><b>189.95</b></td>
</tr>
</table>
</body></html>
"#;

#[tokio::test]
async fn test_quote_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote.ashx"))
        .and(query_param("t", "AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_string(QUOTE_PAGE))
        .mount(&server)
        .await;

    let base = server.uri();
    let pairs = tokio::task::spawn_blocking(move || {
        let client = FinvizClient::with_base_url(base)?;
        client.quote_snapshot("aapl")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(pairs[0], ("Index".to_string(), "DJIA, S&P 500".to_string()));
    assert_eq!(pairs[1], ("Price".to_string(), "189.95".to_string()));
}

#[tokio::test]
async fn test_quote_snapshot_unknown_ticker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote.ashx"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>no data</html>"))
        .mount(&server)
        .await;

    let base = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        let client = FinvizClient::with_base_url(base)?;
        client.quote_snapshot("ZZZZZZ")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, SdkError::UnknownTicker(ref t) if t == "ZZZZZZ"));
}

#[tokio::test]
async fn test_forex_performance_passthrough() {
    let server = MockServer::start().await;
    let payload = json!({
        "EURUSD": {"perf_day": 0.12, "perf_week": -0.4},
        "USDJPY": {"perf_day": -0.05, "perf_week": 1.1},
    });
    Mock::given(method("GET"))
        .and(path("/api/forex_perf.ashx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .mount(&server)
        .await;

    let base = server.uri();
    let table = tokio::task::spawn_blocking(move || {
        let client = FinvizClient::with_base_url(base)?;
        client.forex_performance()
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(table, payload);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/crypto_perf.ashx"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let base = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        let client = FinvizClient::with_base_url(base)?;
        client.crypto_performance()
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, SdkError::Status { status: 429, .. }));
}
