//! Pass/fail/skip metrics for test runs, pushed to a Prometheus Pushgateway.
//!
//! Outcome events are accumulated into a run-scoped registry and pushed once
//! when the session ends.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{FlushSummary, PrometheusReporter, Recorded, RunStatus};
pub use config::{LabelSet, ReporterArgs, RunConfiguration};
pub use domain::errors::{ConfigurationError, FlushError, RegistryError, ReporterError};
pub use domain::outcome::{Outcome, OutcomeEvent, Phase};
