//! 負荷分散の検証
//!
//! ノードごとに、サーバー側のバックエンド数（ステータスページ上のマーカー出現数）と
//! クライアント側の負荷マップを期待値と突き合わせる。
//!
//! 制御接続はサーバー側では1本のバックエンドとして見えるが、
//! クライアント側の負荷マップには計上されないため、
//! 制御ノードのクライアント側期待値は1つ少なくなる。

pub mod fetcher;
pub mod report;

pub use fetcher::{status_url, CurlStatusFetcher, HttpStatusFetcher, StatusFetcher};
pub use report::{NodeOutcome, NodeVerification, VerificationReport};

use crate::driver::LoadReader;
use lbcheck_common::types::ExpectedDistribution;
use lbcheck_common::{HarnessError, HarnessResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// 既定のマーカー文字列
pub const DEFAULT_MARKER: &str = "client backend";

/// `body` 中の `marker` の出現数（重複なし）
///
/// 空のマーカーは0を返す。
pub fn count_marker(body: &str, marker: &str) -> usize {
    if marker.is_empty() {
        return 0;
    }
    body.matches(marker).count()
}

/// クライアント側で比較に使う期待値
///
/// `node` が制御接続の接続先と一致する場合は1を引く。
pub fn client_expected_count(node: &str, expected: usize, control: &str) -> usize {
    if node.eq_ignore_ascii_case(control) {
        expected.saturating_sub(1)
    } else {
        expected
    }
}

/// ロード検証器
pub struct LoadVerifier {
    fetcher: Arc<dyn StatusFetcher>,
    load_reader: Option<Arc<dyn LoadReader>>,
    marker: String,
}

impl LoadVerifier {
    /// 新しい検証器を作成
    ///
    /// `load_reader` が `None` の場合はクライアント側の検証を省略する（ベースライン）。
    pub fn new(fetcher: Arc<dyn StatusFetcher>, load_reader: Option<Arc<dyn LoadReader>>) -> Self {
        Self {
            fetcher,
            load_reader,
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    /// マーカー文字列を設定
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// 1ノードを検証する
    pub async fn verify(
        &self,
        node: &str,
        expected: usize,
        control: &str,
    ) -> HarnessResult<NodeVerification> {
        self.verify_node(node, expected, control).await.result
    }

    /// 期待分布のすべてのノードをアドレス順に検証し、結果を蓄積する
    pub async fn verify_all(
        &self,
        distribution: &ExpectedDistribution,
        control: &str,
    ) -> VerificationReport {
        let mut report = VerificationReport::default();
        for (node, expected) in distribution.iter() {
            report.push(self.verify_node(node, expected, control).await);
        }
        report
    }

    async fn verify_node(&self, node: &str, expected: usize, control: &str) -> NodeOutcome {
        let body = match self.fetcher.fetch(node).await {
            Ok(body) => body,
            Err(e) => {
                warn!(node = %node, error = %e, "Verification failed");
                return NodeOutcome::new(node, None, Err(e));
            }
        };

        let observed = count_marker(&body, &self.marker);
        debug!(node = %node, observed, "Counted backends on status page");

        let result = self.compare(node, expected, observed, control);
        if let Err(e) = &result {
            warn!(node = %node, error = %e, "Verification mismatch");
        }
        NodeOutcome::new(node, Some(observed), result)
    }

    fn compare(
        &self,
        node: &str,
        expected: usize,
        observed: usize,
        control: &str,
    ) -> HarnessResult<NodeVerification> {
        if observed != expected {
            return Err(HarnessError::ServerCountMismatch {
                node: node.to_string(),
                expected,
                actual: observed,
            });
        }

        let mut verification = NodeVerification {
            node: node.to_string(),
            expected_server: expected,
            observed_server: observed,
            expected_client: None,
            observed_client: None,
        };

        let Some(reader) = &self.load_reader else {
            return Ok(verification);
        };

        let adjusted = client_expected_count(node, expected, control);
        let recorded = reader.load(node);
        if recorded != adjusted {
            return Err(HarnessError::ClientCountMismatch {
                node: node.to_string(),
                expected: adjusted,
                actual: recorded,
            });
        }

        verification.expected_client = Some(adjusted);
        verification.observed_client = Some(recorded);
        Ok(verification)
    }
}
