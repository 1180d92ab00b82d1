//! lbcheck 共通クレート
//!
//! 設定・エラー型・期待分布など、I/Oを伴わない共通定義

#![warn(missing_docs)]

/// 設定管理
pub mod config;

/// エラー型定義
pub mod error;

/// 期待分布などのコアデータ型
pub mod types;

pub use error::{HarnessError, HarnessResult};
