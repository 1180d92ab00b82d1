//! 実行サマリ

use chrono::{DateTime, Utc};
use lbcheck_common::types::{DriverVariant, Scenario};
use lbcheck_common::{HarnessError, HarnessResult};
use serde::Serialize;
use std::path::Path;

/// 性能シナリオ1回分の実行結果
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// シナリオ
    pub scenario: Scenario,
    /// ドライバ種別
    pub driver: DriverVariant,
    /// 接続URL
    pub url: String,
    /// 反復回数
    pub iterations: usize,
    /// 反復ごとの所要時間（ミリ秒）
    pub elapsed_ms: Vec<u64>,
    /// 初回を除いた平均（ミリ秒）
    pub average_ms: Option<u64>,
    /// 接続失敗の累計
    pub connection_failures: usize,
    /// 検証に失敗したノードの累計（不一致・取得失敗）
    pub verification_failures: usize,
    /// 開始時刻
    pub started_at: DateTime<Utc>,
    /// 終了時刻
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// すべての検証が成功したか
    pub fn passed(&self) -> bool {
        self.verification_failures == 0
    }

    /// JSONとしてファイルに書き出す
    pub fn write_json(&self, path: &Path) -> HarnessResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// 検証失敗があれば `VerificationFailed` に変換する
    pub fn into_result(self) -> HarnessResult<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(HarnessError::VerificationFailed {
                failures: self.verification_failures,
            })
        }
    }
}
