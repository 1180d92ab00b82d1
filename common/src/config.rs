//! 設定管理
//!
//! HarnessConfig 設定構造体
//!
//! 読み込み優先順位（後勝ち）:
//! 1. 既定値
//! 2. 設定ファイル（TOML、任意）
//! 3. 環境変数 `LBCHECK_*`

use crate::error::HarnessResult;
use crate::types::DriverVariant;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 環境変数のプレフィックス
pub const ENV_PREFIX: &str = "LBCHECK";

/// ハーネス設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessConfig {
    /// クラスタ管理バイナリのディレクトリ（`bin/yb-ctl` を含む）
    #[serde(default)]
    pub ybdb_path: Option<String>,

    /// 並列シナリオのワーカー数 (デフォルト: 25)
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// ワーカーあたりの接続数 (デフォルト: 6)
    #[serde(default = "default_connections_per_thread")]
    pub connections_per_thread: usize,

    /// 逐次シナリオの接続数 (デフォルト: 150)
    #[serde(default = "default_serial_connections")]
    pub serial_connections: usize,

    /// 反復回数 (デフォルト: 10)
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// クラスタ起動後の待機（秒）(デフォルト: 10)
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,

    /// 計測開始前の追加待機（秒）(デフォルト: 5)
    #[serde(default = "default_post_start_pause")]
    pub post_start_pause_secs: u64,

    /// ステータスページのポート (デフォルト: 13000)
    #[serde(default = "default_status_port")]
    pub status_port: u16,

    /// ステータスページのパス (デフォルト: "/rpcz")
    #[serde(default = "default_status_path")]
    pub status_path: String,

    /// バックエンド数を数えるマーカー文字列 (デフォルト: "client backend")
    #[serde(default = "default_marker")]
    pub marker: String,

    /// ステータスページ取得のタイムアウト（秒）(デフォルト: 10)
    #[serde(default = "default_status_timeout")]
    pub status_timeout_secs: u64,

    /// 制御接続の接続先 (デフォルト: "127.0.0.1")
    #[serde(default = "default_control_host")]
    pub control_host: String,

    /// 検証対象ノード (デフォルト: 127.0.0.1〜127.0.0.3)
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,

    /// DBホスト (デフォルト: "localhost")
    #[serde(default = "default_db_host")]
    pub db_host: String,

    /// DBポート (デフォルト: 5433)
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// データベース名 (デフォルト: "yugabyte")
    #[serde(default = "default_database")]
    pub database: String,

    /// DBユーザー (デフォルト: "yugabyte")
    #[serde(default = "default_user")]
    pub user: String,

    /// DBパスワード (デフォルト: "yugabyte")
    #[serde(default = "default_password")]
    pub password: String,

    /// トポロジ再取得間隔（秒）(デフォルト: 300)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// レプリケーションファクタ (デフォルト: 3)
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,

    /// ゾーン配置文字列
    #[serde(default = "default_placement_info")]
    pub placement_info: String,
}

fn default_threads() -> usize {
    25
}

fn default_connections_per_thread() -> usize {
    6
}

fn default_serial_connections() -> usize {
    150
}

fn default_iterations() -> usize {
    10
}

fn default_settle_delay() -> u64 {
    10
}

fn default_post_start_pause() -> u64 {
    5
}

fn default_status_port() -> u16 {
    13000
}

fn default_status_path() -> String {
    "/rpcz".to_string()
}

fn default_marker() -> String {
    "client backend".to_string()
}

fn default_status_timeout() -> u64 {
    10
}

fn default_control_host() -> String {
    "127.0.0.1".to_string()
}

fn default_nodes() -> Vec<String> {
    (1..=3).map(|i| format!("127.0.0.{i}")).collect()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5433
}

fn default_database() -> String {
    "yugabyte".to_string()
}

fn default_user() -> String {
    "yugabyte".to_string()
}

fn default_password() -> String {
    "yugabyte".to_string()
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_replication_factor() -> u32 {
    3
}

fn default_placement_info() -> String {
    "aws.us-west.us-west-2a,aws.us-west.us-west-2b,aws.us-west.us-west-2c".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            ybdb_path: None,
            threads: default_threads(),
            connections_per_thread: default_connections_per_thread(),
            serial_connections: default_serial_connections(),
            iterations: default_iterations(),
            settle_delay_secs: default_settle_delay(),
            post_start_pause_secs: default_post_start_pause(),
            status_port: default_status_port(),
            status_path: default_status_path(),
            marker: default_marker(),
            status_timeout_secs: default_status_timeout(),
            control_host: default_control_host(),
            nodes: default_nodes(),
            db_host: default_db_host(),
            db_port: default_db_port(),
            database: default_database(),
            user: default_user(),
            password: default_password(),
            refresh_interval_secs: default_refresh_interval(),
            replication_factor: default_replication_factor(),
            placement_info: default_placement_info(),
        }
    }
}

impl HarnessConfig {
    /// 既定値 → 設定ファイル → `LBCHECK_*` 環境変数の順に読み込む
    pub fn load(path: Option<&Path>) -> HarnessResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .ignore_empty(true)
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// クラスタ起動後の待機時間
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// 計測開始前の追加待機時間
    pub fn post_start_pause(&self) -> Duration {
        Duration::from_secs(self.post_start_pause_secs)
    }

    /// ステータスページ取得のタイムアウト
    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    /// 性能シナリオの接続URL
    pub fn connection_url(&self, variant: DriverVariant) -> String {
        let scheme = match variant {
            DriverVariant::Smart => "yugabytedb",
            DriverVariant::Baseline => "postgresql",
        };
        format!(
            "jdbc:{}://{}:{}/{}?load-balance=true&yb-servers-refresh-interval={}",
            scheme, self.db_host, self.db_port, self.database, self.refresh_interval_secs
        )
    }

    /// スモークテストの接続URL
    pub fn smoke_url(&self) -> String {
        format!(
            "jdbc:yugabytedb://{}/{}?load_balance=true",
            self.db_host, self.database
        )
    }
}
