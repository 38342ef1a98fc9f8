use async_trait::async_trait;

use crate::{OrderRequest, Result};

/// Abstraction over the order-management service.
///
/// `HttpGateway` implements this for live trading.
/// `PaperGateway` implements this for simulation.
///
/// Only `OrderDispatcher` in `crates/engine` should call `submit`; the
/// evaluator never talks to a gateway directly.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit a market order. `Ok(())` means the gateway accepted it.
    async fn submit(&self, order: &OrderRequest) -> Result<()>;
}
