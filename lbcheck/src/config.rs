//! Configuration helpers via environment variables
//!
//! Provides helper functions for reading environment variables that are
//! known under more than one name, plus resolution of the cluster binaries
//! path.

use lbcheck_common::config::HarnessConfig;
use lbcheck_common::{HarnessError, HarnessResult};
use std::path::Path;

/// Preferred environment variable for the cluster binaries path
pub const YBDB_PATH_ENV: &str = "LBCHECK_YBDB_PATH";

/// Environment variable used by existing cluster tooling
pub const YBDB_PATH_ALIAS_ENV: &str = "YBDB_PATH";

/// Get an environment variable, falling back to an alias name
///
/// If the primary variable is set, returns its value.
/// If only the alias is set, returns its value and logs which name was used.
///
/// # Arguments
/// * `name` - The preferred environment variable name
/// * `alias` - The alternative environment variable name (fallback)
///
/// # Returns
/// * `Some(value)` - The environment variable value
/// * `None` - Neither variable is set
pub fn get_env_with_fallback(name: &str, alias: &str) -> Option<String> {
    if let Ok(val) = std::env::var(name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(alias) {
        tracing::debug!("Environment variable '{}' read via alias '{}'", name, alias);
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(name: &str, alias: &str, default: &str) -> String {
    get_env_with_fallback(name, alias).unwrap_or_else(|| default.to_string())
}

/// クラスタ管理バイナリのパスを解決する
///
/// 設定値 → `LBCHECK_YBDB_PATH` → `YBDB_PATH` の順に参照し、
/// 空白のみの値は未設定とみなす。
pub fn resolve_ybdb_path(config: &HarnessConfig) -> HarnessResult<String> {
    config
        .ybdb_path
        .clone()
        .or_else(|| get_env_with_fallback(YBDB_PATH_ENV, YBDB_PATH_ALIAS_ENV))
        .filter(|path| !path.trim().is_empty())
        .ok_or(HarnessError::MissingClusterPath)
}

/// 設定ファイルと環境変数から設定を読み込む
pub fn load_config(path: Option<&Path>) -> HarnessResult<HarnessConfig> {
    HarnessConfig::load(path)
}
