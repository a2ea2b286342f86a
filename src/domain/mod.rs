// Test outcome events
pub mod outcome;

// Metric naming
pub mod naming;

// Run-scoped counters and state
pub mod run;

// Run-scoped metric registry
pub mod registry;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
