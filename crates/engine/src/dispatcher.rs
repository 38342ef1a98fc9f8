use std::sync::Arc;

use tracing::{error, info};

use common::{DispatchOutcome, OrderGateway, OrderRequest};

/// Hands orders to the gateway and classifies the result.
///
/// This is the ONLY component that calls `OrderGateway::submit`. It holds no
/// mutable state, so every call is independent. Failures are logged and
/// returned as `DispatchOutcome::Failed`; they are never retried here and
/// never undo the position change that produced the order.
#[derive(Clone)]
pub struct OrderDispatcher {
    gateway: Arc<dyn OrderGateway>,
}

impl OrderDispatcher {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }

    pub async fn send(&self, order: &OrderRequest) -> DispatchOutcome {
        match self.gateway.submit(order).await {
            Ok(()) => {
                info!(
                    symbol = %order.symbol,
                    side = %order.side,
                    qty = order.quantity,
                    price = order.price,
                    "Order placed"
                );
                DispatchOutcome::Accepted
            }
            Err(e) => {
                error!(
                    symbol = %order.symbol,
                    side = %order.side,
                    error = %e,
                    "Order dispatch failed"
                );
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use common::{Error, OrderSide, Result};

    use super::*;

    struct Reject;

    #[async_trait]
    impl OrderGateway for Reject {
        async fn submit(&self, _order: &OrderRequest) -> Result<()> {
            Err(Error::Gateway {
                status: 400,
                body: "bad symbol".into(),
            })
        }
    }

    struct Accept;

    #[async_trait]
    impl OrderGateway for Accept {
        async fn submit(&self, _order: &OrderRequest) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn success_is_accepted() {
        let dispatcher = OrderDispatcher::new(Arc::new(Accept));
        let outcome = dispatcher
            .send(&OrderRequest::market("TCS", OrderSide::Buy, 1, 10.0))
            .await;
        assert_eq!(outcome, DispatchOutcome::Accepted);
    }

    #[tokio::test]
    async fn gateway_error_becomes_failed_with_reason() {
        let dispatcher = OrderDispatcher::new(Arc::new(Reject));
        let outcome = dispatcher
            .send(&OrderRequest::market("TCS", OrderSide::Sell, 1, 10.0))
            .await;
        match outcome {
            DispatchOutcome::Failed(reason) => assert!(reason.contains("bad symbol")),
            DispatchOutcome::Accepted => panic!("Expected a failed dispatch"),
        }
    }
}
