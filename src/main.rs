//! testrun-metrics - push test run outcomes to a Prometheus Pushgateway
//!
//! Reads outcome events as JSON lines, accumulates them, and pushes the
//! per-test and aggregate gauges once the input ends.
//!
//! # Usage
//! ```sh
//! cargo test -- -Z unstable-options --format json \
//!     | testrun-metrics \
//!         --prometheus-pushgateway-url localhost:9091 \
//!         --prometheus-metric-prefix ci_ \
//!         --prometheus-extra-label branch=main
//! ```
//!
//! A `cargo test` stream covers one suite per test binary, and the same test
//! name can appear in several of them. A name already reported by an earlier
//! suite is pushed as `<prefix>suite<N>::<name>`, `N` being the suite's
//! position in the stream.
//!
//! # Environment Variables
//! - `PROMETHEUS_PUSHGATEWAY_URL` - Push Gateway URL
//! - `PROMETHEUS_METRIC_PREFIX` - Prefix for all metrics
//! - `PROMETHEUS_JOB_NAME` - Job name (default: testrun)
//! - `PROMETHEUS_PUSH_TIMEOUT` - Push timeout in seconds (default: 10)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use testrun_metrics::PrometheusReporter;
use testrun_metrics::config::{ReporterArgs, RunConfiguration};
use testrun_metrics::infrastructure::PushgatewayClient;
use testrun_metrics::infrastructure::event_source::{self, InputFormat};
use tokio::io::{AsyncRead, BufReader};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(
    name = "testrun-metrics",
    version,
    about = "Push test run outcomes to a Prometheus Pushgateway"
)]
struct Cli {
    #[command(flatten)]
    reporter: ReporterArgs,

    /// Format of the incoming event lines
    #[arg(long, value_enum, default_value_t = InputFormat::Libtest)]
    input_format: InputFormat,

    /// Read events from a file instead of stdin
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays usable in a pipeline
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &cli.input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let mut reader = BufReader::new(reader);

    let config = match RunConfiguration::from_args(&cli.reporter) {
        Ok(config) => config,
        Err(e) => {
            event_source::drain(&mut reader).await?;
            return Err(e).context("Invalid Prometheus reporter configuration");
        }
    };

    let Some(config) = config else {
        info!("Prometheus reporting disabled (pushgateway URL or metric prefix not set)");
        let lines = event_source::drain(&mut reader).await?;
        info!("Consumed {} input lines without reporting", lines);
        return Ok(());
    };

    let pusher = match PushgatewayClient::from_config(&config) {
        Ok(pusher) => pusher,
        Err(e) => {
            event_source::drain(&mut reader).await?;
            return Err(e).context("Failed to set up the pushgateway client");
        }
    };
    let reporter = PrometheusReporter::configure(Some(config), pusher);

    let report = event_source::run(&mut reader, cli.input_format, reporter)
        .await
        .context("Test run metrics were not pushed")?;

    if let Some(summary) = report.summary {
        info!("Flush summary: {}", serde_json::to_string(&summary)?);
    }
    Ok(())
}
