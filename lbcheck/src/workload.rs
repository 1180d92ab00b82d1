//! 接続ワークロード
//!
//! 指定数の接続を逐次または並列に確立し、所要時間を計測する。
//! 個々の接続失敗はログに残して集計するだけで、バッチは中断しない。

use crate::driver::Connector;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::warn;

/// 1回分のワークロード結果
pub struct Batch<T> {
    /// 確立できた接続（呼び出し側が所有し、検証後に解放する）
    pub connections: Vec<T>,
    /// 失敗した接続試行の数
    pub failures: usize,
    /// バッチ全体の所要時間
    pub elapsed: Duration,
}

impl<T> Batch<T> {
    /// 確立できた接続数
    pub fn opened(&self) -> usize {
        self.connections.len()
    }
}

/// `total` 本の接続を1本ずつ確立する
pub async fn run_serial<C: Connector>(connector: &C, total: usize) -> Batch<C::Connection> {
    let mut connections = Vec::with_capacity(total);
    let mut failures = 0;

    let start = Instant::now();
    for i in 0..total {
        match connector.connect().await {
            Ok(connection) => connections.push(connection),
            Err(e) => {
                warn!("[{}] connect failed: {}", i, e);
                failures += 1;
            }
        }
    }
    let elapsed = start.elapsed();

    Batch {
        connections,
        failures,
        elapsed,
    }
}

/// `workers` 個のタスクがそれぞれ `per_worker` 本の接続を確立する
///
/// すべてのワーカーの完了を待ってから所要時間を確定する（タイムアウトなし）。
/// ワーカー内で接続に失敗した場合、そのワーカーは残りの接続を諦める。
pub async fn run_concurrent<C: Connector>(
    connector: Arc<C>,
    workers: usize,
    per_worker: usize,
) -> Batch<C::Connection> {
    let mut set = JoinSet::new();

    let start = Instant::now();
    for worker in 0..workers {
        let connector = Arc::clone(&connector);
        set.spawn(async move {
            let mut opened = Vec::with_capacity(per_worker);
            for _ in 0..per_worker {
                match connector.connect().await {
                    Ok(connection) => opened.push(connection),
                    Err(e) => {
                        warn!(worker, "connect failed: {}", e);
                        return (opened, 1);
                    }
                }
            }
            (opened, 0)
        });
    }

    let mut connections = Vec::with_capacity(workers * per_worker);
    let mut failures = 0;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((opened, failed)) => {
                connections.extend(opened);
                failures += failed;
            }
            Err(e) => {
                warn!(error = %e, "Connection worker terminated abnormally");
                failures += 1;
            }
        }
    }
    let elapsed = start.elapsed();

    Batch {
        connections,
        failures,
        elapsed,
    }
}

/// 接続をすべて解放する
pub async fn close_all<C: Connector>(connector: &C, connections: Vec<C::Connection>) {
    for connection in connections {
        connector.close(connection).await;
    }
}

/// 反復ごとの所要時間
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationTimings {
    elapsed: Vec<Duration>,
}

impl IterationTimings {
    /// 空の記録を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 1反復分を記録
    pub fn record(&mut self, elapsed: Duration) {
        self.elapsed.push(elapsed);
    }

    /// 反復ごとの所要時間（ミリ秒）
    pub fn as_millis(&self) -> Vec<u64> {
        self.elapsed
            .iter()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .collect()
    }

    /// 初回（ウォームアップ）を除いた平均
    ///
    /// 反復が2回未満の場合は `None`。
    pub fn average_excluding_warmup(&self) -> Option<Duration> {
        let measured = self.elapsed.get(1..)?;
        if measured.is_empty() {
            return None;
        }
        let total: Duration = measured.iter().sum();
        let count = u32::try_from(measured.len()).ok()?;
        Some(total / count)
    }
}
