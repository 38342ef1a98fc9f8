use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use common::OrderGateway;
use strategy::{PriceWindowStore, SignalEvaluator, StrategyRegistry};

use crate::dispatcher::OrderDispatcher;
use crate::ingest::{IngestStats, IngestionLoop};
use crate::stream::{TickFeed, WsStream};

/// State that outlives every tick: the price windows, the strategies and
/// the dispatcher. Cloning shares the same state.
#[derive(Clone)]
pub struct RuntimeContext {
    pub windows: Arc<PriceWindowStore>,
    pub registry: Arc<StrategyRegistry>,
    pub dispatcher: OrderDispatcher,
}

impl RuntimeContext {
    pub fn new<I, S>(symbols: I, gateway: Arc<dyn OrderGateway>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            windows: Arc::new(PriceWindowStore::new(symbols)),
            registry: Arc::new(StrategyRegistry::new()),
            dispatcher: OrderDispatcher::new(gateway),
        }
    }

    pub fn evaluator(&self) -> SignalEvaluator {
        SignalEvaluator::new(self.windows.clone(), self.registry.clone())
    }

    pub fn ingestion_loop(&self) -> IngestionLoop {
        IngestionLoop::new(self.evaluator(), self.dispatcher.clone())
    }

    /// Spawn the feed and the ingestion loop connected by a bounded channel.
    pub fn spawn_pipeline(&self, feed: TickFeed, initial: WsStream, buffer: usize) -> Pipeline {
        let (tick_tx, tick_rx) = mpsc::channel::<String>(buffer);
        let (stop_tx, stop_rx) = watch::channel(false);

        let feed_task = tokio::spawn(feed.run(initial, tick_tx, stop_rx.clone()));
        let ingest_task = tokio::spawn(self.ingestion_loop().run(tick_rx, stop_rx));

        Pipeline {
            stop_tx,
            feed_task,
            ingest_task,
        }
    }
}

/// Handle to a running feed + ingestion loop.
pub struct Pipeline {
    stop_tx: watch::Sender<bool>,
    feed_task: JoinHandle<()>,
    ingest_task: JoinHandle<IngestStats>,
}

impl Pipeline {
    /// Signal both tasks to stop and wait for in-flight orders to finish.
    pub async fn shutdown(self) -> IngestStats {
        let _ = self.stop_tx.send(true);

        let stats = match self.ingest_task.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "Ingestion task ended abnormally");
                IngestStats::default()
            }
        };
        if let Err(e) = self.feed_task.await {
            warn!(error = %e, "Tick feed task ended abnormally");
        }
        info!("Pipeline stopped");
        stats
    }
}
