use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use common::Error;
use strategy::{Signal, SignalEvaluator};

use crate::dispatcher::OrderDispatcher;
use crate::stream::parse_tick;

/// Orders queued behind a slow gateway before tick processing waits.
const ORDER_QUEUE: usize = 256;

/// Counters reported when the loop stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub ticks: u64,
    pub malformed: u64,
    pub skipped: u64,
    pub unknown_symbol: u64,
    pub orders_dispatched: u64,
    pub orders_accepted: u64,
    pub orders_failed: u64,
}

/// Single consumer of the tick hand-off.
///
/// Each message is parsed and fully evaluated (window update, every
/// matching strategy, position transitions) before the next one is read.
/// Resulting orders are queued, in production order, to one dispatch
/// worker that submits them one at a time. A slow gateway delays later
/// orders but not later ticks.
pub struct IngestionLoop {
    evaluator: SignalEvaluator,
    dispatcher: OrderDispatcher,
    stats: IngestStats,
}

impl IngestionLoop {
    pub fn new(evaluator: SignalEvaluator, dispatcher: OrderDispatcher) -> Self {
        Self {
            evaluator,
            dispatcher,
            stats: IngestStats::default(),
        }
    }

    /// Run until the stop signal fires or the feed closes the channel.
    ///
    /// On exit the receiver is dropped, which releases the subscription,
    /// and queued orders are still submitted before this returns.
    pub async fn run(
        mut self,
        mut tick_rx: mpsc::Receiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) -> IngestStats {
        info!("Tick ingestion loop running");

        let (order_tx, order_rx) = mpsc::channel::<Signal>(ORDER_QUEUE);
        let worker = tokio::spawn(dispatch_orders(self.dispatcher.clone(), order_rx));

        if !*shutdown.borrow_and_update() {
            loop {
                tokio::select! {
                    biased;

                    // A dropped sender counts as a stop request
                    _ = shutdown.changed() => {
                        info!("Stop signal received");
                        break;
                    }

                    msg = tick_rx.recv() => match msg {
                        Some(raw) => self.handle_message(&raw, &order_tx).await,
                        None => {
                            warn!("Tick channel closed");
                            break;
                        }
                    },
                }
            }
        }

        drop(tick_rx);
        drop(order_tx);
        match worker.await {
            Ok(tally) => {
                self.stats.orders_accepted = tally.accepted;
                self.stats.orders_failed = tally.failed;
            }
            Err(e) => error!(error = %e, "Dispatch worker panicked"),
        }

        info!(stats = ?self.stats, "Tick ingestion loop stopped");
        self.stats
    }

    /// Parse and evaluate one raw message, queueing any orders it produces.
    async fn handle_message(&mut self, raw: &str, orders: &mpsc::Sender<Signal>) {
        let tick = match parse_tick(raw) {
            Ok(Some(tick)) => tick,
            Ok(None) => {
                self.stats.skipped += 1;
                debug!("Skipping non-tick message");
                return;
            }
            Err(e) => {
                self.stats.malformed += 1;
                warn!(error = %e, "Skipping malformed tick message");
                return;
            }
        };
        self.stats.ticks += 1;

        match self.evaluator.on_tick(&tick) {
            Ok(signals) => {
                for signal in signals {
                    self.stats.orders_dispatched += 1;
                    debug!(strategy = %signal.strategy_id, "Queueing order");
                    if orders.send(signal).await.is_err() {
                        error!("Dispatch worker gone, order dropped");
                    }
                }
            }
            Err(Error::UnknownSymbol(symbol)) => {
                self.stats.unknown_symbol += 1;
                warn!(symbol = %symbol, "Discarding tick for symbol outside the universe");
            }
            Err(e) => warn!(symbol = %tick.symbol, error = %e, "Tick evaluation failed"),
        }
    }
}

#[derive(Debug, Default)]
struct DispatchTally {
    accepted: u64,
    failed: u64,
}

/// Submit queued orders strictly in the order they were produced.
async fn dispatch_orders(
    dispatcher: OrderDispatcher,
    mut orders: mpsc::Receiver<Signal>,
) -> DispatchTally {
    let mut tally = DispatchTally::default();
    while let Some(signal) = orders.recv().await {
        if dispatcher.send(&signal.order).await.is_accepted() {
            tally.accepted += 1;
        } else {
            tally.failed += 1;
        }
    }
    if tally.accepted + tally.failed > 0 {
        debug!(?tally, "Order queue drained");
    }
    tally
}
