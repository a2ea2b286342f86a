//! Per-test outcome accumulation
//!
//! Every call-phase event bumps one run counter and adds one per-test gauge
//! to the run registry. Setup and teardown events are ignored so a test is
//! never counted twice.

use crate::config::RunConfiguration;
use crate::domain::errors::RegistryError;
use crate::domain::naming::metric_name;
use crate::domain::outcome::OutcomeEvent;
use crate::domain::registry::MetricSeries;
use crate::domain::run::RunState;
use tracing::{debug, trace};

/// What happened to a recorded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    /// Not a call-phase event; state unchanged
    Ignored,
    /// Counted and registered under this metric name
    Counted { metric: String },
}

pub struct OutcomeAccumulator<'a> {
    config: &'a RunConfiguration,
}

impl<'a> OutcomeAccumulator<'a> {
    pub fn new(config: &'a RunConfiguration) -> Self {
        Self { config }
    }

    /// Record one completed test phase.
    ///
    /// The series is registered before the counter moves, so a rejected
    /// event (duplicate or invalid name) leaves the counters untouched.
    pub fn record(
        &self,
        state: &mut RunState,
        event: &OutcomeEvent,
    ) -> Result<Recorded, RegistryError> {
        if !event.is_call_phase() {
            trace!(
                "Ignoring {} phase of {} ({})",
                event.phase, event.node_id, event.outcome
            );
            return Ok(Recorded::Ignored);
        }

        let name = metric_name(&self.config.metric_prefix, &event.test_identifier);
        debug!("Pushing metric {}", name);

        state.registry.register(MetricSeries::gauge(
            name.as_str(),
            event.node_id.as_str(),
            &self.config.extra_labels,
            event.outcome.gauge_value(),
        ))?;
        state.counters.increment(event.outcome);

        Ok(Recorded::Counted { metric: name })
    }
}
