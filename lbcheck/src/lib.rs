//! lbcheck - Client-side load balancing verification harness
//!
//! ローカルの3ノードクラスタを起動し、スマートドライバ（負荷分散あり）と
//! 通常ドライバで接続を張って、ノードごとの接続分布を検証する

#![warn(missing_docs)]

/// CLIインターフェース
pub mod cli;

/// クラスタのライフサイクル管理（外部コマンド実行）
pub mod cluster;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// DBドライバ境界（接続確立・クライアント側負荷マップ）
pub mod driver;

/// ロギング初期化ユーティリティ
pub mod logging;

/// シナリオのオーケストレーション
pub mod orchestrator;

/// ノードごとの接続数検証
pub mod verifier;

/// 接続ワークロード（逐次・並列）
pub mod workload;
