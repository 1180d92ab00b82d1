//! シナリオ実行
//!
//! CLI引数と設定から各コンポーネントを組み立て、シナリオを1回実行する。

use super::{Cli, FetcherKind};
use crate::cluster::{ClusterController, CommandRunner};
use crate::config::{load_config, resolve_ybdb_path};
use crate::driver::{BalancedPgConnector, ConnectionUrl, Connector, LoadReader, PgConnector};
use crate::orchestrator::{run_smoke_queries, Orchestrator, PerfPlan, RunSummary};
use crate::verifier::{CurlStatusFetcher, HttpStatusFetcher, LoadVerifier, StatusFetcher};
use lbcheck_common::config::HarnessConfig;
use lbcheck_common::types::{DriverVariant, Scenario};
use lbcheck_common::HarnessResult;
use std::sync::Arc;
use tracing::info;

/// CLIで指定されたシナリオを実行する
pub async fn execute(cli: Cli) -> HarnessResult<()> {
    let mut config = load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    match cli.scenario {
        Scenario::Smoke => run_smoke(&config).await,
        Scenario::Serial | Scenario::Concurrent => {
            let summary = run_perf(&cli, &config).await?;
            if let Some(path) = &cli.report {
                summary.write_json(path)?;
                info!("Report written to {}", path.display());
            }
            summary.into_result().map(|_| ())
        }
    }
}

async fn run_smoke(config: &HarnessConfig) -> HarnessResult<()> {
    let url = ConnectionUrl::parse(&config.smoke_url())?;
    let connector = BalancedPgConnector::new(url, &config.user, &config.password);

    let result = async {
        let mut connection = connector.connect().await?;
        info!(host = %connection.host(), "Smoke connection established");
        let names = run_smoke_queries(&mut connection).await;
        connector.close(connection).await;
        names
    }
    .await;

    connector.shutdown().await;
    result.map(|_| ())
}

async fn run_perf(cli: &Cli, config: &HarnessConfig) -> HarnessResult<RunSummary> {
    let ybdb_path = resolve_ybdb_path(config)?;
    let runner = CommandRunner::new();
    let cluster = Arc::new(ClusterController::new(runner.clone(), &ybdb_path, config));
    let plan = PerfPlan::from_config(config, cli.scenario, cli.driver);

    let fetcher: Arc<dyn StatusFetcher> = match cli.fetcher {
        FetcherKind::Curl => Arc::new(CurlStatusFetcher::new(runner, config)),
        FetcherKind::Http => Arc::new(HttpStatusFetcher::new(config)?),
    };

    let url = ConnectionUrl::parse(&plan.url)?;
    match cli.driver {
        DriverVariant::Smart => {
            let connector = Arc::new(BalancedPgConnector::new(url, &config.user, &config.password));
            let loads: Arc<dyn LoadReader> = Arc::new(connector.loads());
            let verifier = LoadVerifier::new(fetcher, Some(Arc::clone(&loads)))
                .with_marker(config.marker.clone());
            Orchestrator::new(cluster, connector, verifier, Some(loads))
                .run(&plan)
                .await
        }
        DriverVariant::Baseline => {
            let connector = Arc::new(PgConnector::new(&url, &config.user, &config.password));
            let verifier = LoadVerifier::new(fetcher, None).with_marker(config.marker.clone());
            Orchestrator::new(cluster, connector, verifier, None)
                .run(&plan)
                .await
        }
    }
}
