//! CLI module for lbcheck
//!
//! Provides the command-line interface for running load-balancing scenarios.

pub mod run;

use clap::{Parser, ValueEnum};
use lbcheck_common::config::HarnessConfig;
use lbcheck_common::types::{DriverVariant, Scenario};
use std::path::PathBuf;

/// lbcheck - Client-side load-balancing verification harness
#[derive(Parser, Debug)]
#[command(name = "lbcheck")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"SCENARIOS:
    1 | smoke         Single connection, create/insert/select
    2 | serial        Serial connection creation, timing and distribution check
    3 | concurrent    Concurrent connection creation, timing and distribution check

ENVIRONMENT VARIABLES:
    YBDB_PATH               Cluster binaries directory (required for scenarios 2 and 3)
    LBCHECK_YBDB_PATH       Same as YBDB_PATH, takes precedence
    LBCHECK_LOG_LEVEL       Log level (default: info)
    LBCHECK_CONFIG          Path to a TOML config file
    LBCHECK_<FIELD>         Override any config field (e.g. LBCHECK_ITERATIONS=3)
"#)]
pub struct Cli {
    /// Scenario to run (1|smoke, 2|serial, 3|concurrent)
    pub scenario: Scenario,

    /// Driver variant (smart, pgjdbc|baseline)
    #[arg(default_value = "smart")]
    pub driver: DriverVariant,

    /// TOML config file
    #[arg(long, env = "LBCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of iterations
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Worker count for the concurrent scenario
    #[arg(long)]
    pub threads: Option<usize>,

    /// Connections opened by each worker in the concurrent scenario
    #[arg(long)]
    pub connections_per_thread: Option<usize>,

    /// Connections opened by the serial scenario
    #[arg(long)]
    pub total: Option<usize>,

    /// How to fetch node status pages
    #[arg(long, value_enum, default_value_t = FetcherKind::Curl)]
    pub fetcher: FetcherKind,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Status page fetch method
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetcherKind {
    /// Shell out to curl
    Curl,
    /// Use the built-in HTTP client
    Http,
}

impl Cli {
    /// コマンドライン指定で設定を上書きする
    pub fn apply_overrides(&self, config: &mut HarnessConfig) {
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(per_thread) = self.connections_per_thread {
            config.connections_per_thread = per_thread;
        }
        if let Some(total) = self.total {
            config.serial_connections = total;
        }
    }
}
