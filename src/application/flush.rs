//! End-of-run flush
//!
//! Adds the three aggregate gauges to the run registry and pushes the whole
//! registry once. There is no partial flush and no retry.

use crate::config::RunConfiguration;
use crate::domain::errors::FlushError;
use crate::domain::naming::metric_name;
use crate::domain::ports::MetricsPusher;
use crate::domain::registry::MetricSeries;
use crate::domain::run::{RunCounters, RunState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Outcome of a successful flush
#[derive(Debug, Clone, Serialize)]
pub struct FlushSummary {
    pub job: String,
    pub endpoint: String,
    pub counters: RunCounters,
    pub series_pushed: usize,
    pub pushed_at: DateTime<Utc>,
}

pub struct FlushCoordinator<'a, P: MetricsPusher + ?Sized> {
    config: &'a RunConfiguration,
    pusher: &'a P,
}

impl<'a, P: MetricsPusher + ?Sized> FlushCoordinator<'a, P> {
    pub fn new(config: &'a RunConfiguration, pusher: &'a P) -> Self {
        Self { config, pusher }
    }

    /// Finalize the run. Consumes the state; the registry is gone after
    /// this call whether the push succeeded or not.
    pub async fn finish(&self, mut state: RunState) -> Result<FlushSummary, FlushError> {
        let counters = state.counters;
        let aggregates = [
            ("passed", "Number of passed tests", counters.passed),
            ("failed", "Number of failed tests", counters.failed),
            ("skipped", "Number of skipped tests", counters.skipped),
        ];

        for (suffix, help, count) in aggregates {
            state.registry.register(MetricSeries::gauge(
                metric_name(&self.config.metric_prefix, suffix),
                help,
                &self.config.extra_labels,
                count as f64,
            ))?;
        }

        let series_pushed = state.registry.len();
        self.pusher
            .push(&self.config.job_name, &state.registry)
            .await?;

        info!(
            "Pushed {} metrics to {} (job: {}, passed: {}, failed: {}, skipped: {})",
            series_pushed,
            self.config.endpoint_url,
            self.config.job_name,
            counters.passed,
            counters.failed,
            counters.skipped
        );

        Ok(FlushSummary {
            job: self.config.job_name.clone(),
            endpoint: self.config.endpoint_url.to_string(),
            counters,
            series_pushed,
            pushed_at: Utc::now(),
        })
    }
}
