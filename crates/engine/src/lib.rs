pub mod context;
pub mod dispatcher;
pub mod gateway;
pub mod ingest;
pub mod stream;

pub use context::{Pipeline, RuntimeContext};
pub use dispatcher::OrderDispatcher;
pub use gateway::HttpGateway;
pub use ingest::{IngestStats, IngestionLoop};
pub use stream::{parse_tick, TickFeed};
