use crate::domain::errors::FlushError;
use crate::domain::ports::MetricsPusher;
use crate::domain::registry::RunRegistry;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// One captured push
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPush {
    pub job: String,
    pub series: BTreeMap<String, f64>,
    pub body: String,
}

/// In-memory pusher that records every push instead of sending it.
/// Clones share the same record, so a test can keep a handle after handing
/// one to the reporter.
#[derive(Clone, Default)]
pub struct MockPusher {
    pushes: Arc<Mutex<Vec<RecordedPush>>>,
    failure: Option<FlushError>,
}

impl MockPusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pusher that records the attempt and then fails with `error`
    pub fn failing(error: FlushError) -> Self {
        Self {
            pushes: Arc::new(Mutex::new(Vec::new())),
            failure: Some(error),
        }
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes
            .lock()
            .map(|pushes| pushes.clone())
            .unwrap_or_default()
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().map(|pushes| pushes.len()).unwrap_or(0)
    }
}

#[async_trait]
impl MetricsPusher for MockPusher {
    async fn push(&self, job: &str, registry: &RunRegistry) -> Result<(), FlushError> {
        let series = registry
            .names()
            .filter_map(|name| registry.value(name).map(|v| (name.to_string(), v)))
            .collect();
        let body = registry.encode()?;

        if let Ok(mut pushes) = self.pushes.lock() {
            pushes.push(RecordedPush {
                job: job.to_string(),
                series,
                body,
            });
        }
        info!("MockPusher: recorded push for job {}", job);

        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
