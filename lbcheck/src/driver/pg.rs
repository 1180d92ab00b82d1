//! 素のPostgreSQL接続（負荷分散なし）

use super::{ConnectionUrl, Connector};
use async_trait::async_trait;
use lbcheck_common::{HarnessError, HarnessResult};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::debug;

/// URLのホストにそのまま接続するコネクタ
///
/// ベースライン計測用。すべての接続がURLのホストに集中する。
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
}

impl PgConnector {
    /// 新しいコネクタを作成
    pub fn new(url: &ConnectionUrl, user: &str, password: &str) -> Self {
        Self {
            options: url.connect_options(&url.host, user, password),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgConnection;

    async fn connect(&self) -> HarnessResult<PgConnection> {
        self.options
            .connect()
            .await
            .map_err(|e| HarnessError::ConnectionFailed(e.to_string()))
    }

    async fn close(&self, connection: PgConnection) {
        if let Err(e) = connection.close().await {
            debug!(error = %e, "Failed to close connection cleanly");
        }
    }
}
