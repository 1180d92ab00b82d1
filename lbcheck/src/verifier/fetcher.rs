//! ステータスページ取得
//!
//! 各ノードの管理ポートから `/rpcz` を取得する。
//! 既定ではCLI（curl）経由、オプションでHTTPクライアント直接。

use crate::cluster::CommandRunner;
use async_trait::async_trait;
use lbcheck_common::config::HarnessConfig;
use lbcheck_common::{HarnessError, HarnessResult};
use reqwest::Client;
use std::time::Duration;

/// ステータスページ取得の抽象
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// ノードのステータスページ本文を返す
    async fn fetch(&self, node: &str) -> HarnessResult<String>;
}

/// ステータスページのURL
pub fn status_url(node: &str, port: u16, path: &str) -> String {
    format!("http://{}:{}/{}", node, port, path.trim_start_matches('/'))
}

fn fetch_description(node: &str, path: &str) -> String {
    format!("Could not access {} on {}", path, node)
}

/// `curl` で取得するフェッチャ
#[derive(Debug, Clone)]
pub struct CurlStatusFetcher {
    runner: CommandRunner,
    port: u16,
    path: String,
    timeout: Duration,
}

impl CurlStatusFetcher {
    /// 設定からフェッチャを作成
    pub fn new(runner: CommandRunner, config: &HarnessConfig) -> Self {
        Self {
            runner,
            port: config.status_port,
            path: config.status_path.clone(),
            timeout: config.status_timeout(),
        }
    }

    /// 実行するコマンド
    pub fn command(&self, node: &str) -> String {
        format!("curl -sf {}", status_url(node, self.port, &self.path))
    }
}

#[async_trait]
impl StatusFetcher for CurlStatusFetcher {
    async fn fetch(&self, node: &str) -> HarnessResult<String> {
        self.runner
            .capture(
                &self.command(node),
                &fetch_description(node, &self.path),
                self.timeout,
            )
            .await
    }
}

/// HTTPクライアントで直接取得するフェッチャ
#[derive(Debug, Clone)]
pub struct HttpStatusFetcher {
    client: Client,
    port: u16,
    path: String,
}

impl HttpStatusFetcher {
    /// 設定からフェッチャを作成
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        let client = Client::builder()
            .timeout(config.status_timeout())
            .build()
            .map_err(|e| HarnessError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            port: config.status_port,
            path: config.status_path.clone(),
        })
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher {
    async fn fetch(&self, node: &str) -> HarnessResult<String> {
        let url = status_url(node, self.port, &self.path);
        let description = fetch_description(node, &self.path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HarnessError::CommandFailed {
                description: description.clone(),
                output: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarnessError::CommandFailed {
                description,
                output: format!("HTTP {}", status),
            });
        }

        response
            .text()
            .await
            .map_err(|e| HarnessError::CommandFailed {
                description,
                output: e.to_string(),
            })
    }
}
