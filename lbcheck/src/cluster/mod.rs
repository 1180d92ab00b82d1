//! クラスタ制御
//!
//! `yb-ctl` を呼び出してローカルクラスタを作成・破棄する。

pub mod command;

pub use command::CommandRunner;

use async_trait::async_trait;
use lbcheck_common::config::HarnessConfig;
use lbcheck_common::HarnessResult;
use std::time::Duration;
use tracing::info;

/// クラスタ破棄のタイムアウト（秒）
const DESTROY_TIMEOUT_SECS: u64 = 15;

/// クラスタ起動のタイムアウト（秒）
const START_TIMEOUT_SECS: u64 = 60;

/// クラスタのライフサイクル操作
#[async_trait]
pub trait ClusterControl: Send + Sync {
    /// 既存クラスタを破棄してから起動し、ノード登録を待つ
    async fn start_cluster(&self) -> HarnessResult<()>;

    /// クラスタを破棄する
    async fn destroy_cluster(&self) -> HarnessResult<()>;
}

/// `yb-ctl` ベースのクラスタコントローラ
#[derive(Debug, Clone)]
pub struct ClusterController {
    runner: CommandRunner,
    ctl: String,
    replication_factor: u32,
    placement_info: String,
    settle_delay: Duration,
}

impl ClusterController {
    /// 新しいコントローラを作成
    ///
    /// `ybdb_path` は `bin/yb-ctl` を含むディレクトリ。
    pub fn new(runner: CommandRunner, ybdb_path: &str, config: &HarnessConfig) -> Self {
        Self {
            runner,
            ctl: format!("{}/bin/yb-ctl", ybdb_path.trim_end_matches('/')),
            replication_factor: config.replication_factor,
            placement_info: config.placement_info.clone(),
            settle_delay: config.settle_delay(),
        }
    }

    /// 起動後の待機時間を設定
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// 破棄コマンド
    pub fn destroy_command(&self) -> String {
        format!("{} destroy", self.ctl)
    }

    /// 起動コマンド
    pub fn start_command(&self) -> String {
        format!(
            "{} start --rf {} --placement_info \"{}\"",
            self.ctl, self.replication_factor, self.placement_info
        )
    }
}

#[async_trait]
impl ClusterControl for ClusterController {
    async fn start_cluster(&self) -> HarnessResult<()> {
        self.destroy_cluster().await?;
        self.runner
            .run(
                &self.start_command(),
                &format!("Start YugabyteDB rf={} cluster", self.replication_factor),
                Duration::from_secs(START_TIMEOUT_SECS),
            )
            .await?;

        info!(
            settle_secs = self.settle_delay.as_secs(),
            "Waiting for nodes to register"
        );
        tokio::time::sleep(self.settle_delay).await;
        Ok(())
    }

    async fn destroy_cluster(&self) -> HarnessResult<()> {
        self.runner
            .run(
                &self.destroy_command(),
                "Stop YugabyteDB cluster",
                Duration::from_secs(DESTROY_TIMEOUT_SECS),
            )
            .await
    }
}
