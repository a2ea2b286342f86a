//! Test outcome events as delivered by the test-execution framework.

use std::fmt;

/// Final result of one test phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Outcome {
    /// Value of the per-test gauge: 1 for a pass, 0 otherwise
    pub fn gauge_value(self) -> f64 {
        match self {
            Outcome::Passed => 1.0,
            Outcome::Failed | Outcome::Skipped => 0.0,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Which part of a test's execution an event reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    Setup,
    /// The test body itself; the only phase that is counted
    #[default]
    Call,
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Call => write!(f, "call"),
            Phase::Teardown => write!(f, "teardown"),
        }
    }
}

/// One completed test phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeEvent {
    /// Name used to derive the per-test metric name
    pub test_identifier: String,
    /// Full node identifier, used as the metric's help text
    pub node_id: String,
    pub outcome: Outcome,
    pub phase: Phase,
}

impl OutcomeEvent {
    pub fn new(
        test_identifier: impl Into<String>,
        node_id: impl Into<String>,
        outcome: Outcome,
        phase: Phase,
    ) -> Self {
        Self {
            test_identifier: test_identifier.into(),
            node_id: node_id.into(),
            outcome,
            phase,
        }
    }

    /// Call-phase event whose node id equals its identifier
    pub fn call(test_identifier: impl Into<String>, outcome: Outcome) -> Self {
        let test_identifier = test_identifier.into();
        Self {
            node_id: test_identifier.clone(),
            test_identifier,
            outcome,
            phase: Phase::Call,
        }
    }

    pub fn is_call_phase(&self) -> bool {
        self.phase == Phase::Call
    }
}
