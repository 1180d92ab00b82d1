//! 共通型定義
//!
//! シナリオ・ドライバ種別・期待分布などのコアデータ型

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 実行シナリオ
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// 単一クエリのスモークテスト
    Smoke,
    /// 逐次接続の性能・分散検証
    Serial,
    /// 並列接続の性能・分散検証
    Concurrent,
}

impl Scenario {
    /// クラスタの起動が必要なシナリオか
    pub fn requires_cluster(&self) -> bool {
        !matches!(self, Self::Smoke)
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "smoke" => Ok(Self::Smoke),
            "2" | "serial" => Ok(Self::Serial),
            "3" | "concurrent" => Ok(Self::Concurrent),
            other => Err(format!(
                "unknown scenario '{other}' (expected 1|smoke, 2|serial, 3|concurrent)"
            )),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Smoke => "smoke",
            Self::Serial => "serial",
            Self::Concurrent => "concurrent",
        };
        f.write_str(name)
    }
}

/// 接続に使うドライバ種別
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverVariant {
    /// クライアントサイド負荷分散を行うドライバ
    #[default]
    Smart,
    /// 負荷分散を行わない素のドライバ（比較用ベースライン）
    Baseline,
}

impl DriverVariant {
    /// 期待分布の分割ルール
    pub fn split_policy(&self) -> SplitPolicy {
        match self {
            Self::Smart => SplitPolicy::Even,
            Self::Baseline => SplitPolicy::AllOnFirst,
        }
    }
}

impl FromStr for DriverVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smart" => Ok(Self::Smart),
            "pgjdbc" | "baseline" => Ok(Self::Baseline),
            other => Err(format!(
                "unknown driver '{other}' (expected smart, pgjdbc or baseline)"
            )),
        }
    }
}

impl fmt::Display for DriverVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smart => f.write_str("Smart"),
            Self::Baseline => f.write_str("PGJDBC"),
        }
    }
}

/// 期待分布の分割ルール
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    /// 全ノードに均等（余りは先頭ノードから1つずつ）、制御接続は制御ノードに加算
    Even,
    /// 全接続を先頭ノードに割り当てる
    AllOnFirst,
}

impl SplitPolicy {
    /// このルールで制御接続が発生する数
    pub fn control_connections(&self) -> usize {
        match self {
            Self::Even => 1,
            Self::AllOnFirst => 0,
        }
    }
}

/// `total` を `nodes` 個に均等分割する
///
/// 余りは先頭から1つずつ割り当てるため、合計は常に `total` になる。
/// `nodes == 0` の場合は空を返す。
pub fn split_evenly(total: usize, nodes: usize) -> Vec<usize> {
    if nodes == 0 {
        return Vec::new();
    }
    let base = total / nodes;
    let remainder = total % nodes;
    (0..nodes)
        .map(|i| base + usize::from(i < remainder))
        .collect()
}

/// ノードアドレス → サーバー側で観測されるべき接続数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedDistribution {
    counts: BTreeMap<String, usize>,
    workload: usize,
    control_connections: usize,
}

impl ExpectedDistribution {
    /// 期待分布を構築する
    ///
    /// * `workload` - 負荷分散対象として開く接続数
    /// * `policy` - 分割ルール
    /// * `nodes` - ノードアドレス（与えた順序によらず、アドレス順で余り・先頭ノードを決める）
    /// * `control` - 制御接続の接続先アドレス
    pub fn build(workload: usize, policy: SplitPolicy, nodes: &[String], control: &str) -> Self {
        let mut ordered = nodes.to_vec();
        ordered.sort();
        ordered.dedup();

        let shares = match policy {
            SplitPolicy::Even => split_evenly(workload, ordered.len()),
            SplitPolicy::AllOnFirst => (0..ordered.len())
                .map(|i| if i == 0 { workload } else { 0 })
                .collect(),
        };

        let mut counts: BTreeMap<String, usize> = ordered.into_iter().zip(shares).collect();

        let mut control_connections = 0;
        if policy.control_connections() > 0 {
            if let Some(count) = counts
                .iter_mut()
                .find(|(node, _)| node.eq_ignore_ascii_case(control))
                .map(|(_, count)| count)
            {
                *count += policy.control_connections();
                control_connections = policy.control_connections();
            }
        }

        Self {
            counts,
            workload,
            control_connections,
        }
    }

    /// 指定ノードの期待数
    pub fn get(&self, node: &str) -> Option<usize> {
        self.counts.get(node).copied()
    }

    /// アドレス順にノードと期待数を列挙する
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(node, count)| (node.as_str(), *count))
    }

    /// ノード数
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// ノードが空か
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 負荷分散対象の接続数
    pub fn workload(&self) -> usize {
        self.workload
    }

    /// サーバー側で開かれるバックエンドの総数（制御接続を含む）
    pub fn planned_total(&self) -> usize {
        self.workload + self.control_connections
    }
}
