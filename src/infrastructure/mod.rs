pub mod event_source;
pub mod mock;
pub mod observability;

pub use event_source::{InputFormat, parse_line};
pub use mock::MockPusher;
pub use observability::PushgatewayClient;
