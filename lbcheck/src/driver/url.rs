//! 接続URLの解析
//!
//! `jdbc:yugabytedb://host:port/db?load-balance=true&yb-servers-refresh-interval=300`
//! 形式（`jdbc:` 接頭辞は任意）を解析する。

use lbcheck_common::{HarnessError, HarnessResult};
use reqwest::Url;
use sqlx::postgres::PgConnectOptions;
use std::collections::BTreeMap;
use std::time::Duration;

/// 既定のYSQLポート
pub const DEFAULT_PORT: u16 = 5433;

/// 既定のトポロジ再取得間隔（秒）
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

const SUPPORTED_SCHEMES: [&str; 3] = ["yugabytedb", "postgresql", "postgres"];

/// 解析済みの接続URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUrl {
    /// スキーム（`jdbc:` 除去後）
    pub scheme: String,
    /// 接続先ホスト
    pub host: String,
    /// 接続先ポート
    pub port: u16,
    /// データベース名
    pub database: String,
    /// クエリパラメータ
    pub options: BTreeMap<String, String>,
}

impl ConnectionUrl {
    /// URLを解析する
    pub fn parse(raw: &str) -> HarnessResult<Self> {
        let trimmed = raw.trim();
        let without_jdbc = trimmed.strip_prefix("jdbc:").unwrap_or(trimmed);
        let url = Url::parse(without_jdbc)
            .map_err(|e| HarnessError::InvalidUrl(format!("{raw}: {e}")))?;

        let scheme = url.scheme().to_string();
        if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
            return Err(HarnessError::InvalidUrl(format!(
                "{raw}: unsupported scheme '{scheme}'"
            )));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| HarnessError::InvalidUrl(format!("{raw}: missing host")))?
            .to_string();

        let database = url.path().trim_start_matches('/').to_string();
        let options = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self {
            scheme,
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            database,
            options,
        })
    }

    /// 負荷分散が有効か（`load-balance` / `load_balance`）
    pub fn load_balance(&self) -> bool {
        ["load-balance", "load_balance"]
            .iter()
            .filter_map(|key| self.options.get(*key))
            .any(|value| value.eq_ignore_ascii_case("true"))
    }

    /// トポロジ再取得間隔
    pub fn refresh_interval(&self) -> Duration {
        let secs = self
            .options
            .get("yb-servers-refresh-interval")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// 指定ホスト向けの接続オプションを組み立てる
    pub fn connect_options(&self, host: &str, user: &str, password: &str) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(host)
            .port(self.port)
            .username(user)
            .password(password);
        if !self.database.is_empty() {
            options = options.database(&self.database);
        }
        options
    }
}
