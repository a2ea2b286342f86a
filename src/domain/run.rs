use crate::domain::outcome::Outcome;
use crate::domain::registry::RunRegistry;
use serde::Serialize;

/// Pass/fail/skip tallies for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl RunCounters {
    pub fn increment(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.passed + self.failed + self.skipped
    }
}

/// Mutable state of an active run: counters plus the series registry.
/// Created together at run start and torn down together at run end.
#[derive(Default)]
pub struct RunState {
    pub counters: RunCounters,
    pub registry: RunRegistry,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }
}
