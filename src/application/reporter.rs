//! Reporter lifecycle for one test run
//!
//! `Inactive` when no configuration is given, otherwise
//! `Armed -> Accumulating -> Flushing -> Flushed | FlushFailed`.
//! Both flush outcomes are terminal.

use crate::application::accumulator::{OutcomeAccumulator, Recorded};
use crate::application::flush::{FlushCoordinator, FlushSummary};
use crate::config::RunConfiguration;
use crate::domain::errors::ReporterError;
use crate::domain::outcome::OutcomeEvent;
use crate::domain::ports::MetricsPusher;
use crate::domain::run::{RunCounters, RunState};
use crate::domain::registry::RunRegistry;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Reporting disabled; every hook is a no-op
    Inactive,
    Armed,
    Accumulating,
    Flushing,
    Flushed,
    FlushFailed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Flushed | RunStatus::FlushFailed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Inactive => "inactive",
            RunStatus::Armed => "armed",
            RunStatus::Accumulating => "accumulating",
            RunStatus::Flushing => "flushing",
            RunStatus::Flushed => "flushed",
            RunStatus::FlushFailed => "flush failed",
        };
        write!(f, "{s}")
    }
}

/// Consumes outcome events for one run and pushes the result at session end
pub struct PrometheusReporter<P: MetricsPusher> {
    config: Option<RunConfiguration>,
    state: Option<RunState>,
    pusher: P,
    status: RunStatus,
}

impl<P: MetricsPusher> PrometheusReporter<P> {
    /// Arm a run when `config` is present; otherwise stay inactive
    pub fn configure(config: Option<RunConfiguration>, pusher: P) -> Self {
        let (state, status) = match &config {
            Some(config) => {
                info!(
                    "Prometheus reporting armed: prefix={}, endpoint={}, job={}",
                    config.metric_prefix, config.endpoint_url, config.job_name
                );
                (Some(RunState::new()), RunStatus::Armed)
            }
            None => (None, RunStatus::Inactive),
        };

        Self {
            config,
            state,
            pusher,
            status,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status != RunStatus::Inactive
    }

    pub fn config(&self) -> Option<&RunConfiguration> {
        self.config.as_ref()
    }

    /// Counters of the run in progress; `None` when inactive or closed
    pub fn counters(&self) -> Option<&RunCounters> {
        self.state.as_ref().map(|state| &state.counters)
    }

    pub fn registry(&self) -> Option<&RunRegistry> {
        self.state.as_ref().map(|state| &state.registry)
    }

    pub fn pusher(&self) -> &P {
        &self.pusher
    }

    /// Hook for every completed test phase
    pub fn on_test_report(&mut self, event: &OutcomeEvent) -> Result<Recorded, ReporterError> {
        if self.status == RunStatus::Inactive {
            return Ok(Recorded::Ignored);
        }

        let (Some(config), Some(state)) = (self.config.as_ref(), self.state.as_mut()) else {
            return Err(ReporterError::RunClosed);
        };

        let recorded = OutcomeAccumulator::new(config).record(state, event)?;
        self.status = RunStatus::Accumulating;
        Ok(recorded)
    }

    /// Hook for normal session end. Returns `Ok(None)` when inactive.
    pub async fn on_session_finish(&mut self) -> Result<Option<FlushSummary>, ReporterError> {
        if self.status == RunStatus::Inactive {
            return Ok(None);
        }

        let (Some(config), Some(state)) = (self.config.as_ref(), self.state.take()) else {
            return Err(ReporterError::RunClosed);
        };

        self.status = RunStatus::Flushing;
        match FlushCoordinator::new(config, &self.pusher).finish(state).await {
            Ok(summary) => {
                self.status = RunStatus::Flushed;
                Ok(Some(summary))
            }
            Err(e) => {
                error!("Failed to push metrics to {}: {}", config.endpoint_url, e);
                self.status = RunStatus::FlushFailed;
                Err(e.into())
            }
        }
    }

    /// Tear down without a completed session. Any accumulated state is
    /// discarded without pushing.
    pub fn unconfigure(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        if let Some(state) = self.state.take()
            && !state.registry.is_empty()
        {
            warn!(
                "Discarding {} unflushed metrics (status: {})",
                state.registry.len(),
                self.status
            );
        }
    }
}

impl<P: MetricsPusher> Drop for PrometheusReporter<P> {
    fn drop(&mut self) {
        self.discard();
    }
}
