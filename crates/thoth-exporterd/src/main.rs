mod config;
mod signal;

use std::sync::Arc;

use anyhow::Context;
use thoth_clients::{
    HttpGraphClient, HttpGraphConfig, HttpPrescriptionClient, OpenShiftClient, OpenShiftConfig,
    PrescriptionConfig, PrometheusConfig, PrometheusHistory,
};
use thoth_core::{CancellationToken, Executor, ExecutorConfig, JobRegistry, Subscribe};
use thoth_jobs::{JobContext, catalog::describe_all, register_all};
use thoth_observe::{Journal, LoggerConfig, logger_init};
use thoth_prometheus::{GaugeStore, ScrapeApi};
use tracing::{info, warn};

use crate::{config::ExporterConfig, signal::Shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Configuration + logger
    let cfg = ExporterConfig::from_env().context("reading configuration")?;
    logger_init(
        &LoggerConfig::new(cfg.log_format, cfg.log_level.clone()).with_targets(cfg.log_targets),
    )?;
    info!(deployment = %cfg.deployment, listen = %cfg.listen, "metrics exporter starting");

    // 2) Gauges
    let gauges = GaugeStore::new(Some(cfg.namespace.as_str()));
    describe_all(&gauges)?;

    // 3) Clients
    let graph = HttpGraphClient::new(HttpGraphConfig {
        base_url: cfg.graph_url.clone(),
        timeout: cfg.graph_timeout,
    })?;
    if cfg.kubernetes_token.is_none() {
        warn!("no cluster API token configured; solver listing is unauthenticated");
    }
    let cluster = OpenShiftClient::new(OpenShiftConfig {
        api_url: cfg.kubernetes_api_url.clone(),
        namespace: cfg.infra_namespace.clone(),
        token: cfg.kubernetes_token.clone(),
        timeout: cfg.kubernetes_timeout,
    })?;
    let prescriptions = HttpPrescriptionClient::new(PrescriptionConfig {
        quay_security_url: cfg.quay_security_url.clone(),
        timeout: cfg.graph_timeout,
    })?;

    // 4) Jobs
    let mut ctx = JobContext::new(
        gauges.clone(),
        Arc::new(graph),
        Arc::new(cluster),
        Arc::new(prescriptions),
        cfg.deployment.clone(),
    );
    match &cfg.prometheus_url {
        Some(url) => {
            let history = PrometheusHistory::new(PrometheusConfig {
                url: url.clone(),
                token: cfg.prometheus_token.clone(),
                instance: cfg.prometheus_instance.clone(),
                timeout: cfg.graph_timeout,
            })?;
            ctx = ctx.with_history(Arc::new(history));
        }
        None => info!("no prometheus configured; backlog changes use the last local value"),
    }
    let mut registry = JobRegistry::new();
    register_all(&mut registry, &ctx)?;

    // 5) Executor
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Journal::new())];
    let executor = Executor::new(
        registry,
        ExecutorConfig {
            interval: cfg.interval,
            job_timeout: cfg.job_timeout,
            grace: cfg.grace,
            concurrency: cfg.concurrency,
        },
    )?
    .with_subscribers(subscribers);

    // 6) Shutdown on SIGINT / SIGTERM
    let token = CancellationToken::new();
    let shutdown = Shutdown::register();
    tokio::spawn({
        let token = token.clone();
        async move {
            let signal = shutdown.recv().await;
            info!(signal, "shutting down...");
            token.cancel();
        }
    });

    // 7) Scrape endpoint + collection loop
    let listener = tokio::net::TcpListener::bind(cfg.listen)
        .await
        .with_context(|| format!("binding {}", cfg.listen))?;
    info!(addr = %cfg.listen, "scrape endpoint listening");

    let server = async {
        let served = axum::serve(listener, ScrapeApi::new(gauges).router())
            .with_graceful_shutdown(token.clone().cancelled_owned())
            .await;
        token.cancel();
        served
    };
    let (served, cycles) = tokio::join!(server, executor.run(token.clone()));
    served.context("scrape endpoint failed")?;

    info!(cycles, "metrics exporter stopped");
    Ok(())
}
