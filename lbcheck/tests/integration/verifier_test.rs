//! 検証器の統合テスト

use crate::support::fakes::{FakeBackend, FakeConnector, FakeStatusFetcher};
use crate::support::{nodes, CONTROL_HOST};
use lbcheck::cluster::CommandRunner;
use lbcheck::driver::{Connector, LoadReader};
use lbcheck::verifier::{CurlStatusFetcher, LoadVerifier};
use lbcheck_common::config::HarnessConfig;
use lbcheck_common::types::{ExpectedDistribution, SplitPolicy};
use lbcheck_common::HarnessError;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

#[tokio::test]
async fn test_control_node_client_count_is_one_less() {
    let backend = FakeBackend::default();
    let connector = FakeConnector::balanced(nodes(), CONTROL_HOST, backend.clone());
    let loads: Arc<dyn LoadReader> = Arc::new(connector.loads());
    let verifier = LoadVerifier::new(Arc::new(FakeStatusFetcher::new(backend)), Some(loads));

    let mut opened = Vec::new();
    for _ in 0..150 {
        opened.push(connector.connect().await.unwrap());
    }

    let verification = verifier.verify("127.0.0.1", 51, CONTROL_HOST).await.unwrap();
    assert_eq!(verification.observed_server, 51);
    assert_eq!(verification.expected_client, Some(50));
    assert_eq!(verification.observed_client, Some(50));

    let verification = verifier.verify("127.0.0.2", 50, CONTROL_HOST).await.unwrap();
    assert_eq!(verification.expected_client, Some(50));

    for connection in opened {
        connector.close(connection).await;
    }
}

#[tokio::test]
async fn test_fetch_failure_is_reported_before_comparison() {
    let backend = FakeBackend::default();
    let fetcher = FakeStatusFetcher::new(backend).unreachable("127.0.0.2");
    let verifier = LoadVerifier::new(Arc::new(fetcher), None);

    let err = verifier.verify("127.0.0.2", 0, CONTROL_HOST).await.unwrap_err();
    assert!(err.is_command_error());
    assert!(!err.is_mismatch());
}

#[tokio::test]
async fn test_client_mismatch_detected_when_server_matches() {
    let backend = FakeBackend::default();
    backend.open("127.0.0.2");
    backend.open("127.0.0.2");
    let connector = FakeConnector::balanced(nodes(), CONTROL_HOST, backend.clone());
    let loads = connector.loads();
    loads.acquire("127.0.0.2");
    let reader: Arc<dyn LoadReader> = Arc::new(loads);
    let verifier = LoadVerifier::new(Arc::new(FakeStatusFetcher::new(backend)), Some(reader));

    let err = verifier.verify("127.0.0.2", 2, CONTROL_HOST).await.unwrap_err();
    match err {
        HarnessError::ClientCountMismatch {
            node,
            expected,
            actual,
        } => {
            assert_eq!(node, "127.0.0.2");
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_idle_cluster_after_reset_verifies_clean() {
    let backend = FakeBackend::default();
    let connector = FakeConnector::balanced(nodes(), CONTROL_HOST, backend.clone());
    let loads = connector.loads();

    let first = connector.connect().await.unwrap();
    connector.close(first).await;
    loads.reset();

    let reader: Arc<dyn LoadReader> = Arc::new(loads);
    let verifier = LoadVerifier::new(Arc::new(FakeStatusFetcher::new(backend)), Some(reader));
    let expected = ExpectedDistribution::build(0, SplitPolicy::Even, &nodes(), CONTROL_HOST);

    let report = verifier.verify_all(&expected, CONTROL_HOST).await;
    assert!(report.is_clean());
    assert_eq!(report.summary(), "127.0.0.1 = 1, 127.0.0.2 = 0, 127.0.0.3 = 0");
}

#[tokio::test]
async fn test_custom_marker() {
    let backend = FakeBackend::default();
    backend.open("127.0.0.1");
    let verifier = LoadVerifier::new(Arc::new(FakeStatusFetcher::new(backend)), None)
        .with_marker("checkpointer");

    let verification = verifier.verify("127.0.0.1", 1, CONTROL_HOST).await.unwrap();
    assert_eq!(verification.observed_server, 1);
}

#[tokio::test]
async fn test_curl_non_zero_exit_fails_before_comparison() {
    let dir = tempfile::tempdir().unwrap();
    let shell = dir.path().join("curl-shell");
    std::fs::write(&shell, "#!/bin/sh\necho \"curl: (22) The requested URL returned error: 503\" 1>&2\nexit 22\n").unwrap();
    std::fs::set_permissions(&shell, std::fs::Permissions::from_mode(0o755)).unwrap();

    let runner = CommandRunner::new().with_shell(shell.to_string_lossy());
    let fetcher = CurlStatusFetcher::new(runner, &HarnessConfig::default());
    let verifier = LoadVerifier::new(Arc::new(fetcher), None);

    let err = verifier.verify("127.0.0.2", 50, CONTROL_HOST).await.unwrap_err();
    assert!(err.is_command_error());
    assert!(!err.is_mismatch());
    assert!(err.to_string().contains("Could not access /rpcz on 127.0.0.2"));
    assert!(err.to_string().contains("(22)"));
}
