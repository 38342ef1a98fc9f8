use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{OrderGateway, OrderRequest, Result};

/// Lifecycle of a simulated order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaperOrderStatus {
    Pending,
    Filled,
}

/// An order accepted by the paper gateway.
#[derive(Debug, Clone, Serialize)]
pub struct PaperOrder {
    pub id: String,
    #[serde(flatten)]
    pub request: OrderRequest,
    pub status: PaperOrderStatus,
    pub created_at: DateTime<Utc>,
    pub filled_at: Option<DateTime<Utc>>,
}

/// Simulated order-management service for paper trading.
///
/// Every order is accepted and recorded as PENDING, then marked FILLED at
/// the order's price after `fill_latency`. Nothing leaves the process.
#[derive(Clone)]
pub struct PaperGateway {
    orders: Arc<RwLock<Vec<PaperOrder>>>,
    fill_latency: Duration,
}

impl PaperGateway {
    pub fn new(fill_latency: Duration) -> Self {
        info!(latency = ?fill_latency, "PaperGateway initialized");
        Self {
            orders: Arc::new(RwLock::new(Vec::new())),
            fill_latency,
        }
    }

    /// All orders received so far, oldest first.
    pub async fn orders(&self) -> Vec<PaperOrder> {
        self.orders.read().await.clone()
    }

    async fn mark_filled(&self, id: &str) {
        let mut orders = self.orders.write().await;
        if let Some(order) = orders.iter_mut().find(|o| o.id == id) {
            order.status = PaperOrderStatus::Filled;
            order.filled_at = Some(Utc::now());
            debug!(id = %id, symbol = %order.request.symbol, "Paper order filled");
        }
    }
}

impl Default for PaperGateway {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn submit(&self, order: &OrderRequest) -> Result<()> {
        let id = uuid::Uuid::new_v4().to_string();
        self.orders.write().await.push(PaperOrder {
            id: id.clone(),
            request: order.clone(),
            status: PaperOrderStatus::Pending,
            created_at: Utc::now(),
            filled_at: None,
        });

        info!(
            id = %id,
            symbol = %order.symbol,
            side = %order.side,
            qty = order.quantity,
            price = order.price,
            "Paper order accepted"
        );

        // Fill simulation runs detached, like a real exchange round-trip
        let gateway = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(gateway.fill_latency).await;
            gateway.mark_filled(&id).await;
        });

        Ok(())
    }
}
