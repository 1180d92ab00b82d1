//! 検証結果レポート

use lbcheck_common::{HarnessError, HarnessResult};
use serde::Serialize;

/// 1ノード分の検証成功結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeVerification {
    /// ノードアドレス
    pub node: String,
    /// サーバー側の期待数
    pub expected_server: usize,
    /// ステータスページで観測した数
    pub observed_server: usize,
    /// クライアント側の期待数（制御接続分を除く）
    pub expected_client: Option<usize>,
    /// 負荷マップに記録されていた数
    pub observed_client: Option<usize>,
}

/// 1ノード分の検証結果（成功・失敗どちらも）
#[derive(Debug)]
pub struct NodeOutcome {
    /// ノードアドレス
    pub node: String,
    /// ステータスページで観測した数（取得できた場合）
    pub observed_server: Option<usize>,
    /// 検証結果
    pub result: HarnessResult<NodeVerification>,
}

impl NodeOutcome {
    pub(crate) fn new(
        node: &str,
        observed_server: Option<usize>,
        result: HarnessResult<NodeVerification>,
    ) -> Self {
        Self {
            node: node.to_string(),
            observed_server,
            result,
        }
    }
}

/// 1反復分の検証レポート（アドレス順）
#[derive(Debug, Default)]
pub struct VerificationReport {
    outcomes: Vec<NodeOutcome>,
}

impl VerificationReport {
    pub(crate) fn push(&mut self, outcome: NodeOutcome) {
        self.outcomes.push(outcome);
    }

    /// すべて成功したか
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// 失敗したノード数（不一致・取得失敗を含む）
    pub fn failures(&self) -> usize {
        self.errors().count()
    }

    /// 件数の不一致のみの数
    pub fn mismatches(&self) -> usize {
        self.errors().filter(|e| e.is_mismatch()).count()
    }

    /// 失敗の一覧
    pub fn errors(&self) -> impl Iterator<Item = &HarnessError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// `127.0.0.1 = 51, 127.0.0.2 = 50, ...` 形式の要約
    pub fn summary(&self) -> String {
        self.outcomes
            .iter()
            .map(|o| match o.observed_server {
                Some(count) => format!("{} = {}", o.node, count),
                None => format!("{} = ?", o.node),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
