use crate::domain::errors::FlushError;
use crate::domain::registry::RunRegistry;
use async_trait::async_trait;

/// Outbound transport for the end-of-run push
#[async_trait]
pub trait MetricsPusher: Send + Sync {
    /// Push every series in `registry` as one request, grouped under `job`.
    /// A single attempt; callers never retry.
    async fn push(&self, job: &str, registry: &RunRegistry) -> Result<(), FlushError>;
}
