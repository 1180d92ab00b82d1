//! テストオーケストレーション
//!
//! クラスタ起動 → 反復（負荷マップのリセット、ワークロード、全ノード検証、接続解放）
//! → 平均時間の報告 → クラスタ破棄 の流れを組み立てる。
//!
//! 失敗の扱い:
//! - クラスタ起動の失敗は致命的（ただし破棄は必ず試みる）
//! - 検証の失敗は反復ごとのレポートとサマリに蓄積し、全反復を完走する
//! - クラスタ破棄の失敗はログのみ

pub mod smoke;
pub mod summary;

pub use smoke::run_smoke_queries;
pub use summary::RunSummary;

use crate::cluster::ClusterControl;
use crate::driver::{Connector, LoadReader};
use crate::verifier::LoadVerifier;
use crate::workload::{self, Batch, IterationTimings};
use chrono::Utc;
use lbcheck_common::config::HarnessConfig;
use lbcheck_common::types::{DriverVariant, ExpectedDistribution, Scenario};
use lbcheck_common::{HarnessError, HarnessResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 性能シナリオの実行計画
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfPlan {
    /// シナリオ（Serial / Concurrent）
    pub scenario: Scenario,
    /// ドライバ種別
    pub driver: DriverVariant,
    /// 接続URL
    pub url: String,
    /// 反復回数
    pub iterations: usize,
    /// 逐次シナリオの接続数
    pub serial_connections: usize,
    /// 並列シナリオのワーカー数
    pub threads: usize,
    /// ワーカーあたりの接続数
    pub connections_per_thread: usize,
    /// 制御接続の接続先
    pub control_host: String,
    /// 検証対象ノード
    pub nodes: Vec<String>,
    /// クラスタ起動後、計測開始までの待機
    pub post_start_pause: Duration,
}

impl PerfPlan {
    /// 設定から計画を作成
    pub fn from_config(config: &HarnessConfig, scenario: Scenario, driver: DriverVariant) -> Self {
        Self {
            scenario,
            driver,
            url: config.connection_url(driver),
            iterations: config.iterations,
            serial_connections: config.serial_connections,
            threads: config.threads,
            connections_per_thread: config.connections_per_thread,
            control_host: config.control_host.clone(),
            nodes: config.nodes.clone(),
            post_start_pause: config.post_start_pause(),
        }
    }

    /// 1反復で開く接続数
    pub fn workload(&self) -> usize {
        match self.scenario {
            Scenario::Concurrent => self.threads * self.connections_per_thread,
            _ => self.serial_connections,
        }
    }

    /// 期待分布
    pub fn expected_distribution(&self) -> ExpectedDistribution {
        ExpectedDistribution::build(
            self.workload(),
            self.driver.split_policy(),
            &self.nodes,
            &self.control_host,
        )
    }
}

/// 性能シナリオのオーケストレータ
pub struct Orchestrator<C: Connector> {
    cluster: Arc<dyn ClusterControl>,
    connector: Arc<C>,
    verifier: LoadVerifier,
    load_reader: Option<Arc<dyn LoadReader>>,
}

impl<C: Connector> Orchestrator<C> {
    /// 新しいオーケストレータを作成
    pub fn new(
        cluster: Arc<dyn ClusterControl>,
        connector: Arc<C>,
        verifier: LoadVerifier,
        load_reader: Option<Arc<dyn LoadReader>>,
    ) -> Self {
        Self {
            cluster,
            connector,
            verifier,
            load_reader,
        }
    }

    /// 計画を実行する
    ///
    /// 成否にかかわらず最後にクラスタを破棄する。
    /// 検証失敗はエラーにせずサマリに集計して返す。
    pub async fn run(&self, plan: &PerfPlan) -> HarnessResult<RunSummary> {
        if !plan.scenario.requires_cluster() {
            return Err(HarnessError::Config(format!(
                "scenario '{}' is not a perf scenario",
                plan.scenario
            )));
        }

        info!(
            "Running perf tests for {} connections with {} driver, with url: {}",
            plan.scenario, plan.driver, plan.url
        );

        let result = self.start_and_run(plan).await;

        self.connector.shutdown().await;
        if let Err(e) = self.cluster.destroy_cluster().await {
            warn!(error = %e, "Cluster teardown failed");
        }
        if let Some(reader) = &self.load_reader {
            reader.reset();
        }

        result
    }

    async fn start_and_run(&self, plan: &PerfPlan) -> HarnessResult<RunSummary> {
        let expected = plan.expected_distribution();
        let started_at = Utc::now();

        self.cluster.start_cluster().await?;
        info!("Cluster started!");
        tokio::time::sleep(plan.post_start_pause).await;

        let mut timings = IterationTimings::new();
        let mut connection_failures = 0;
        let mut verification_failures = 0;

        for iteration in 0..plan.iterations {
            if let Some(reader) = &self.load_reader {
                reader.reset();
            }

            let batch = self.run_batch(plan).await;
            debug!(
                opened = batch.opened(),
                failures = batch.failures,
                "Connection batch finished"
            );
            let elapsed_ms = batch.elapsed.as_millis();
            match plan.scenario {
                Scenario::Concurrent => info!(
                    "[Iteration {}] All {} threads completed their tasks in {} ms",
                    iteration, plan.threads, elapsed_ms
                ),
                _ => info!(
                    "[Iteration {}] All {} connections created in {} ms",
                    iteration,
                    plan.workload(),
                    elapsed_ms
                ),
            }
            timings.record(batch.elapsed);
            connection_failures += batch.failures;

            let report = self.verifier.verify_all(&expected, &plan.control_host).await;
            info!("{}", report.summary());
            verification_failures += report.failures();

            workload::close_all(self.connector.as_ref(), batch.connections).await;
        }

        let average = timings.average_excluding_warmup();
        if let Some(avg) = average {
            info!("Average time {} ms", avg.as_millis());
        }

        Ok(RunSummary {
            scenario: plan.scenario,
            driver: plan.driver,
            url: plan.url.clone(),
            iterations: plan.iterations,
            elapsed_ms: timings.as_millis(),
            average_ms: average.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            connection_failures,
            verification_failures,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn run_batch(&self, plan: &PerfPlan) -> Batch<C::Connection> {
        match plan.scenario {
            Scenario::Concurrent => {
                workload::run_concurrent(
                    Arc::clone(&self.connector),
                    plan.threads,
                    plan.connections_per_thread,
                )
                .await
            }
            _ => workload::run_serial(self.connector.as_ref(), plan.serial_connections).await,
        }
    }
}
