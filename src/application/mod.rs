// Per-test outcome accumulation
pub mod accumulator;

// End-of-run aggregate registration and push
pub mod flush;

// Run lifecycle (configure, report, finish, unconfigure)
pub mod reporter;

pub use accumulator::{OutcomeAccumulator, Recorded};
pub use flush::{FlushCoordinator, FlushSummary};
pub use reporter::{PrometheusReporter, RunStatus};
