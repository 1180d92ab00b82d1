//! クライアントサイド負荷分散コネクタ
//!
//! 制御接続でクラスタのトポロジ（`yb_servers()`）を取得し、
//! 新しい接続ごとにクライアント側の接続数が最も少ないノードへ振り分ける。
//! 制御接続そのものは負荷マップに計上しない。

use super::{ClientLoadMap, ConnectionUrl, Connector};
use async_trait::async_trait;
use lbcheck_common::{HarnessError, HarnessResult};
use sqlx::postgres::PgConnection;
use sqlx::{ConnectOptions, Connection, Row};
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// トポロジ取得クエリ
const TOPOLOGY_QUERY: &str = "SELECT host FROM yb_servers()";

#[derive(Default)]
struct Topology {
    control: Option<PgConnection>,
    hosts: Vec<String>,
    refreshed_at: Option<Instant>,
}

impl Topology {
    fn is_stale(&self, refresh_interval: Duration) -> bool {
        match self.refreshed_at {
            Some(at) => self.hosts.is_empty() || at.elapsed() >= refresh_interval,
            None => true,
        }
    }
}

/// 負荷分散コネクタ
pub struct BalancedPgConnector {
    url: ConnectionUrl,
    user: String,
    password: String,
    loads: ClientLoadMap,
    topology: Mutex<Topology>,
}

impl BalancedPgConnector {
    /// 新しいコネクタを作成
    pub fn new(url: ConnectionUrl, user: &str, password: &str) -> Self {
        Self {
            url,
            user: user.to_string(),
            password: password.to_string(),
            loads: ClientLoadMap::new(),
            topology: Mutex::new(Topology::default()),
        }
    }

    /// このコネクタが更新する負荷マップ
    pub fn loads(&self) -> ClientLoadMap {
        self.loads.clone()
    }

    async fn open(&self, host: &str) -> HarnessResult<PgConnection> {
        self.url
            .connect_options(host, &self.user, &self.password)
            .connect()
            .await
            .map_err(|e| HarnessError::ConnectionFailed(format!("{host}: {e}")))
    }

    /// 振り分け候補のホスト一覧を返す（必要なら再取得する）
    async fn hosts(&self) -> HarnessResult<Vec<String>> {
        if !self.url.load_balance() {
            return Ok(vec![self.url.host.clone()]);
        }

        let mut topology = self.topology.lock().await;
        if !topology.is_stale(self.url.refresh_interval()) {
            return Ok(topology.hosts.clone());
        }

        if topology.control.is_none() {
            topology.control = Some(self.open(&self.url.host).await?);
        }
        let Some(control) = topology.control.as_mut() else {
            return Err(HarnessError::ConnectionFailed(
                "control connection unavailable".to_string(),
            ));
        };

        let rows = match sqlx::query(TOPOLOGY_QUERY).fetch_all(&mut *control).await {
            Ok(rows) => rows,
            Err(e) => {
                // 次回は制御接続から張り直す
                topology.control = None;
                return Err(HarnessError::Database(format!(
                    "failed to fetch cluster topology: {e}"
                )));
            }
        };

        let mut hosts = rows
            .iter()
            .map(|row| row.try_get::<String, _>("host"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HarnessError::Database(e.to_string()))?;
        hosts.sort();
        hosts.dedup();

        info!(hosts = ?hosts, "Refreshed cluster topology");
        topology.hosts = hosts.clone();
        topology.refreshed_at = Some(Instant::now());
        Ok(hosts)
    }
}

#[async_trait]
impl Connector for BalancedPgConnector {
    type Connection = BalancedConnection;

    async fn connect(&self) -> HarnessResult<BalancedConnection> {
        let hosts = self.hosts().await?;
        let host = self
            .loads
            .acquire_least_loaded(&hosts)
            .ok_or_else(|| HarnessError::ConnectionFailed("cluster topology is empty".to_string()))?;

        match self.open(&host).await {
            Ok(connection) => Ok(BalancedConnection {
                connection: Some(connection),
                host,
                loads: self.loads.clone(),
            }),
            Err(e) => {
                self.loads.release(&host);
                Err(e)
            }
        }
    }

    async fn close(&self, mut connection: BalancedConnection) {
        if let Some(inner) = connection.connection.take() {
            if let Err(e) = inner.close().await {
                debug!(host = %connection.host, error = %e, "Failed to close connection cleanly");
            }
            self.loads.release(&connection.host);
        }
    }

    async fn shutdown(&self) {
        let mut topology = self.topology.lock().await;
        if let Some(control) = topology.control.take() {
            if let Err(e) = control.close().await {
                warn!(error = %e, "Failed to close control connection");
            }
        }
        topology.hosts.clear();
        topology.refreshed_at = None;
    }
}

/// 負荷マップに計上された接続
///
/// `close` されずに破棄された場合も、Drop時に負荷マップの計上を取り消す。
pub struct BalancedConnection {
    connection: Option<PgConnection>,
    host: String,
    loads: ClientLoadMap,
}

impl BalancedConnection {
    /// 接続先ホスト
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl Deref for BalancedConnection {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        self.connection
            .as_ref()
            .expect("connection is present until close")
    }
}

impl DerefMut for BalancedConnection {
    fn deref_mut(&mut self) -> &mut PgConnection {
        self.connection
            .as_mut()
            .expect("connection is present until close")
    }
}

impl Drop for BalancedConnection {
    fn drop(&mut self) {
        if self.connection.take().is_some() {
            self.loads.release(&self.host);
        }
    }
}
