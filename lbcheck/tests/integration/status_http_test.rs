//! HTTPステータス取得の統合テスト（wiremock）

use crate::support::fakes::status_body;
use lbcheck::verifier::{count_marker, HttpStatusFetcher, LoadVerifier, StatusFetcher};
use lbcheck_common::config::HarnessConfig;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> HarnessConfig {
    HarnessConfig {
        status_port: server.address().port(),
        ..HarnessConfig::default()
    }
}

#[tokio::test]
async fn test_http_fetcher_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpcz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(status_body(7)))
        .mount(&server)
        .await;

    let fetcher = HttpStatusFetcher::new(&config_for(&server)).unwrap();
    let body = fetcher.fetch("127.0.0.1").await.unwrap();
    assert_eq!(count_marker(&body, "client backend"), 7);
}

#[tokio::test]
async fn test_http_fetcher_error_status_is_command_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpcz"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = HttpStatusFetcher::new(&config_for(&server)).unwrap();
    let err = fetcher.fetch("127.0.0.1").await.unwrap_err();
    assert!(err.is_command_error());
    assert!(err.to_string().contains("HTTP 500"));
}

#[tokio::test]
async fn test_verifier_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpcz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(status_body(150)))
        .mount(&server)
        .await;

    let fetcher = HttpStatusFetcher::new(&config_for(&server)).unwrap();
    let verifier = LoadVerifier::new(Arc::new(fetcher), None);

    assert!(verifier.verify("127.0.0.1", 150, "127.0.0.1").await.is_ok());
    let err = verifier.verify("127.0.0.1", 0, "127.0.0.1").await.unwrap_err();
    assert!(err.is_mismatch());
}
