//! ロギング初期化ユーティリティ

use crate::config::get_env_with_fallback_or;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ログレベル指定の環境変数
pub const LOG_LEVEL_ENV: &str = "LBCHECK_LOG_LEVEL";

/// フィルタ文字列を決定する
///
/// `LBCHECK_LOG_LEVEL` → `RUST_LOG` → `info` の順。
pub fn filter_directive() -> String {
    get_env_with_fallback_or(LOG_LEVEL_ENV, "RUST_LOG", "info")
}

/// tracing subscriber を初期化する
///
/// ログは標準エラー出力に書き出す。
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_new(filter_directive()).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
}
