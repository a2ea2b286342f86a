//! Run-scoped metric registry
//!
//! Append-only: every series is registered exactly once and never updated
//! in place. The whole collection is encoded for the single push at run end.

use crate::config::LabelSet;
use crate::domain::errors::{FlushError, RegistryError};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use std::collections::BTreeMap;

/// A named gauge with its help text, labels and value
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub name: String,
    pub help: String,
    pub labels: LabelSet,
    pub value: f64,
}

impl MetricSeries {
    pub fn gauge(
        name: impl Into<String>,
        help: impl Into<String>,
        labels: &LabelSet,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            labels: labels.clone(),
            value,
        }
    }
}

/// Collection of all series produced by one run
pub struct RunRegistry {
    registry: Registry,
    gauges: BTreeMap<String, Gauge>,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RunRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            gauges: BTreeMap::new(),
        }
    }

    /// Add a series. Fails if the name is taken or the registry rejects the
    /// name, help text or labels.
    pub fn register(&mut self, series: MetricSeries) -> Result<(), RegistryError> {
        if self.gauges.contains_key(&series.name) {
            return Err(RegistryError::DuplicateMetric { name: series.name });
        }

        let opts = Opts::new(series.name.as_str(), series.help)
            .const_labels(series.labels.to_const_labels());
        let gauge = Gauge::with_opts(opts).map_err(|e| RegistryError::InvalidMetric {
            name: series.name.clone(),
            reason: e.to_string(),
        })?;
        gauge.set(series.value);

        self.registry
            .register(Box::new(gauge.clone()))
            .map_err(|e| match e {
                prometheus::Error::AlreadyReg => RegistryError::DuplicateMetric {
                    name: series.name.clone(),
                },
                other => RegistryError::InvalidMetric {
                    name: series.name.clone(),
                    reason: other.to_string(),
                },
            })?;

        self.gauges.insert(series.name, gauge);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.gauges.contains_key(name)
    }

    /// Current value of a registered series
    pub fn value(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).map(Gauge::get)
    }

    /// Registered series names in lexical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gauges.keys().map(String::as_str)
    }

    /// Read-only view of the full collection
    pub fn snapshot(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render the collection in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String, FlushError> {
        TextEncoder::new()
            .encode_to_string(&self.snapshot())
            .map_err(|e| FlushError::Encode {
                reason: e.to_string(),
            })
    }

    /// Content type matching [`RunRegistry::encode`]
    pub fn content_type() -> String {
        TextEncoder::new().format_type().to_string()
    }
}
