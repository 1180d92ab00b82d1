//! クライアント側負荷マップ

use super::LoadReader;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// ノードアドレス → クライアントが開いている接続数
///
/// クローンは同じマップを共有する。
#[derive(Debug, Clone, Default)]
pub struct ClientLoadMap {
    inner: Arc<Mutex<BTreeMap<String, usize>>>,
}

impl ClientLoadMap {
    /// 空のマップを作成
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, usize>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 最も負荷の低いノードを選び、その接続数を1つ増やす
    ///
    /// 同数の場合は `hosts` の並び順で先のノードを選ぶ。
    /// 選択と加算は1回のロック内で行う。
    pub fn acquire_least_loaded(&self, hosts: &[String]) -> Option<String> {
        let mut loads = self.lock();
        let host = hosts
            .iter()
            .enumerate()
            .min_by_key(|(index, host)| (loads.get(host.as_str()).copied().unwrap_or(0), *index))
            .map(|(_, host)| host.clone())?;
        *loads.entry(host.clone()).or_insert(0) += 1;
        Some(host)
    }

    /// 指定ノードの接続数を1つ増やす
    pub fn acquire(&self, host: &str) {
        *self.lock().entry(host.to_string()).or_insert(0) += 1;
    }

    /// 指定ノードの接続数を1つ減らす（0未満にはならない）
    pub fn release(&self, host: &str) {
        if let Some(count) = self.lock().get_mut(host) {
            *count = count.saturating_sub(1);
        }
    }

    /// 現在の内容のスナップショット
    pub fn snapshot(&self) -> BTreeMap<String, usize> {
        self.lock().clone()
    }
}

impl LoadReader for ClientLoadMap {
    fn load(&self, node: &str) -> usize {
        self.lock()
            .iter()
            .find(|(host, _)| host.eq_ignore_ascii_case(node))
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    fn reset(&self) {
        self.lock().clear();
    }
}
