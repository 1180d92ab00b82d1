//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! # 伝播ポリシー
//!
//! - `CommandFailed` / `CommandTimeout`: セットアップ時は致命的、後片付け時はログのみ
//! - `ServerCountMismatch` / `ClientCountMismatch`: レポートに蓄積し、実行終了時に
//!   `VerificationFailed` としてまとめて返す
//! - `ConnectionFailed`: 接続試行ごとにログ出力して集計、バッチは継続する

use thiserror::Error;

/// Harness error type
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A shell command exited with a non-zero status
    #[error("{description}: FAILED\n{output}")]
    CommandFailed {
        /// Human readable description of the command
        description: String,
        /// Combined stdout/stderr of the command
        output: String,
    },

    /// A shell command did not finish within its timeout
    #[error("{description}: timed out after {timeout_secs}s")]
    CommandTimeout {
        /// Human readable description of the command
        description: String,
        /// Timeout that elapsed
        timeout_secs: u64,
    },

    /// Backend count on the status page disagrees with the expectation
    #[error(
        "Client backend processes did not match for {node}, (expected, actual): {expected}, {actual}"
    )]
    ServerCountMismatch {
        /// Node address
        node: String,
        /// Expected server-side count
        expected: usize,
        /// Count observed on the status page
        actual: usize,
    },

    /// Client load map disagrees with the adjusted expectation
    #[error(
        "Client side connection count did not match for {node}, (expected, actual): {expected}, {actual}"
    )]
    ClientCountMismatch {
        /// Node address
        node: String,
        /// Expected client-side count (control connection excluded)
        expected: usize,
        /// Count reported by the load reader
        actual: usize,
    },

    /// A single connection attempt failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Cluster binaries path is not configured
    #[error("YBDB_PATH not defined.")]
    MissingClusterPath,

    /// Connection URL could not be parsed
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error outside of connection establishment
    #[error("Database error: {0}")]
    Database(String),

    /// One or more node verifications failed during the run
    #[error("Verification failed on {failures} node check(s) (count mismatch or unreachable status page)")]
    VerificationFailed {
        /// Failed node checks across all iterations, mismatches and fetch failures alike
        failures: usize,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Returns true for verification mismatches (server or client side).
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Self::ServerCountMismatch { .. } | Self::ClientCountMismatch { .. }
        )
    }

    /// Returns true for errors raised by external command execution.
    pub fn is_command_error(&self) -> bool {
        matches!(self, Self::CommandFailed { .. } | Self::CommandTimeout { .. })
    }
}

impl From<config::ConfigError> for HarnessError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Harness result alias
pub type HarnessResult<T> = Result<T, HarnessError>;
