pub mod config;
pub mod error;
pub mod gateway;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::OrderGateway;
pub use types::*;
