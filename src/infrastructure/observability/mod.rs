//! Push-based delivery of run metrics
//!
//! The reporter never serves metrics; it only sends the finished registry
//! to a Prometheus Pushgateway once per run.

pub mod pushgateway;

pub use pushgateway::PushgatewayClient;
