//! クラスタ・ドライバ・ステータスページの偽実装
//!
//! `FakeBackend` がサーバー側のバックエンド数を保持し、
//! `FakeConnector` が接続の確立・解放に合わせてそれを増減させる。
//! `FakeStatusFetcher` は同じ状態から `/rpcz` 相当の本文を組み立てる。

#![allow(dead_code)]

use async_trait::async_trait;
use lbcheck::cluster::ClusterControl;
use lbcheck::driver::{ClientLoadMap, Connector};
use lbcheck::verifier::StatusFetcher;
use lbcheck_common::{HarnessError, HarnessResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// サーバー側で開いているバックエンド数
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    backends: Arc<Mutex<BTreeMap<String, usize>>>,
}

impl FakeBackend {
    pub fn open(&self, host: &str) {
        *self
            .backends
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_insert(0) += 1;
    }

    pub fn close(&self, host: &str) {
        if let Some(count) = self.backends.lock().unwrap().get_mut(host) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn count(&self, host: &str) -> usize {
        self.backends.lock().unwrap().get(host).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.backends.lock().unwrap().values().sum()
    }
}

/// 偽の接続
#[derive(Debug)]
pub struct FakeConnection {
    pub host: String,
}

/// 偽のコネクタ
///
/// `balanced` の場合は負荷マップで最小負荷のノードを選び、
/// 制御接続を1本 `control` に張る。そうでなければ常に先頭ノードへ接続する。
pub struct FakeConnector {
    hosts: Vec<String>,
    balanced: bool,
    control: String,
    backend: FakeBackend,
    loads: ClientLoadMap,
    attempts: AtomicUsize,
    fail_every: Option<usize>,
    control_open: Mutex<bool>,
    pub shutdowns: AtomicUsize,
}

impl FakeConnector {
    pub fn balanced(hosts: Vec<String>, control: &str, backend: FakeBackend) -> Self {
        Self::build(hosts, true, control, backend)
    }

    pub fn baseline(hosts: Vec<String>, backend: FakeBackend) -> Self {
        Self::build(hosts, false, "", backend)
    }

    fn build(hosts: Vec<String>, balanced: bool, control: &str, backend: FakeBackend) -> Self {
        Self {
            hosts,
            balanced,
            control: control.to_string(),
            backend,
            loads: ClientLoadMap::new(),
            attempts: AtomicUsize::new(0),
            fail_every: None,
            control_open: Mutex::new(false),
            shutdowns: AtomicUsize::new(0),
        }
    }

    /// `n` 回に1回接続に失敗させる
    pub fn failing_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub fn loads(&self) -> ClientLoadMap {
        self.loads.clone()
    }

    fn ensure_control(&self) {
        let mut open = self.control_open.lock().unwrap();
        if !*open {
            self.backend.open(&self.control);
            *open = true;
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self) -> HarnessResult<FakeConnection> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(n) = self.fail_every {
            if attempt % n == 0 {
                return Err(HarnessError::ConnectionFailed(format!(
                    "attempt {attempt} refused"
                )));
            }
        }

        let host = if self.balanced {
            self.ensure_control();
            self.loads
                .acquire_least_loaded(&self.hosts)
                .ok_or_else(|| HarnessError::ConnectionFailed("no hosts".to_string()))?
        } else {
            self.hosts[0].clone()
        };
        self.backend.open(&host);
        Ok(FakeConnection { host })
    }

    async fn close(&self, connection: FakeConnection) {
        self.backend.close(&connection.host);
        if self.balanced {
            self.loads.release(&connection.host);
        }
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        let mut open = self.control_open.lock().unwrap();
        if *open {
            self.backend.close(&self.control);
            *open = false;
        }
    }
}

/// `FakeBackend` の状態から本文を返すフェッチャ
pub struct FakeStatusFetcher {
    backend: FakeBackend,
    unreachable: BTreeSet<String>,
    extra: BTreeMap<String, usize>,
}

impl FakeStatusFetcher {
    pub fn new(backend: FakeBackend) -> Self {
        Self {
            backend,
            unreachable: BTreeSet::new(),
            extra: BTreeMap::new(),
        }
    }

    /// 取得に失敗するノードを追加
    pub fn unreachable(mut self, node: &str) -> Self {
        self.unreachable.insert(node.to_string());
        self
    }

    /// ハーネス外のバックエンドが存在するように見せる
    pub fn with_extra(mut self, node: &str, count: usize) -> Self {
        self.extra.insert(node.to_string(), count);
        self
    }
}

/// `count` 個のマーカーを含む本文
pub fn status_body(count: usize) -> String {
    let mut body = String::from("<html><body><table>\n");
    for i in 0..count {
        body.push_str(&format!("<tr><td>{i}</td><td>client backend</td></tr>\n"));
    }
    body.push_str("<tr><td>checkpointer</td></tr>\n</table></body></html>\n");
    body
}

#[async_trait]
impl StatusFetcher for FakeStatusFetcher {
    async fn fetch(&self, node: &str) -> HarnessResult<String> {
        if self.unreachable.contains(node) {
            return Err(HarnessError::CommandFailed {
                description: format!("Could not access /rpcz on {node}"),
                output: "connection refused".to_string(),
            });
        }
        let extra = self.extra.get(node).copied().unwrap_or(0);
        Ok(status_body(self.backend.count(node) + extra))
    }
}

/// 呼び出しを記録する偽クラスタ
#[derive(Default)]
pub struct FakeCluster {
    calls: Mutex<Vec<&'static str>>,
    fail_start: bool,
}

impl FakeCluster {
    pub fn failing_start() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_start: true,
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterControl for FakeCluster {
    async fn start_cluster(&self) -> HarnessResult<()> {
        self.calls.lock().unwrap().push("start");
        if self.fail_start {
            return Err(HarnessError::CommandFailed {
                description: "Start YugabyteDB rf=3 cluster".to_string(),
                output: "yb-ctl: exit status 1".to_string(),
            });
        }
        Ok(())
    }

    async fn destroy_cluster(&self) -> HarnessResult<()> {
        self.calls.lock().unwrap().push("destroy");
        Ok(())
    }
}
