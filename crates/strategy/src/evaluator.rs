use std::sync::Arc;

use tracing::{debug, info};

use common::{OrderRequest, Result, Tick};

use crate::registry::StrategyRegistry;
use crate::window::PriceWindowStore;

/// An order produced by one strategy on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub strategy_id: String,
    pub order: OrderRequest,
}

/// Turns ticks into orders: updates the price window, then runs every active
/// strategy on the tick's symbol through the crossover state machine.
///
/// Evaluation is synchronous. Nothing here awaits, so one tick is fully
/// evaluated before the caller can look at the next.
#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    windows: Arc<PriceWindowStore>,
    registry: Arc<StrategyRegistry>,
}

impl SignalEvaluator {
    pub fn new(windows: Arc<PriceWindowStore>, registry: Arc<StrategyRegistry>) -> Self {
        Self { windows, registry }
    }

    pub fn windows(&self) -> &Arc<PriceWindowStore> {
        &self.windows
    }

    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    /// Process one tick. Fails only if the symbol is outside the universe,
    /// in which case nothing is recorded.
    ///
    /// Positions are already updated when this returns; what happens to the
    /// returned orders afterwards does not affect them.
    pub fn on_tick(&self, tick: &Tick) -> Result<Vec<Signal>> {
        self.windows.append(&tick.symbol, tick.price)?;

        let mut signals = Vec::new();
        for strategy in self
            .registry
            .snapshot()
            .into_iter()
            .filter(|s| s.active && s.config.symbol == tick.symbol)
        {
            let cfg = &strategy.config;
            let (Some(fast), Some(slow)) = (
                self.windows.moving_average(&tick.symbol, cfg.fast_period),
                self.windows.moving_average(&tick.symbol, cfg.slow_period),
            ) else {
                debug!(strategy = %strategy.id, symbol = %tick.symbol, "Warming up");
                continue;
            };

            let Some(side) = self.registry.transition(&strategy.id, fast, slow) else {
                continue;
            };

            info!(
                strategy = %strategy.id,
                symbol = %tick.symbol,
                side = %side,
                fast,
                slow,
                price = tick.price,
                "Crossover signal"
            );
            signals.push(Signal {
                strategy_id: strategy.id,
                order: OrderRequest::market(&tick.symbol, side, cfg.quantity, tick.price),
            });
        }
        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use common::{Error, OrderSide, Position, StrategyConfig};

    use super::*;

    fn setup(symbols: &[&str]) -> SignalEvaluator {
        SignalEvaluator::new(
            Arc::new(PriceWindowStore::new(symbols.iter().copied())),
            Arc::new(StrategyRegistry::new()),
        )
    }

    fn add(eval: &SignalEvaluator, symbol: &str, fast: usize, slow: usize, qty: u32) -> String {
        eval.registry()
            .add(StrategyConfig {
                symbol: symbol.into(),
                fast_period: fast,
                slow_period: slow,
                quantity: qty,
            })
            .unwrap()
            .id
    }

    fn feed(eval: &SignalEvaluator, symbol: &str, prices: &[f64]) -> Vec<(usize, Signal)> {
        prices
            .iter()
            .enumerate()
            .flat_map(|(i, &p)| {
                eval.on_tick(&Tick::new(symbol, p))
                    .unwrap()
                    .into_iter()
                    .map(move |s| (i, s))
            })
            .collect()
    }

    #[test]
    fn rising_series_emits_exactly_one_buy() {
        let eval = setup(&["X"]);
        add(&eval, "X", 3, 5, 10);

        let prices = [10.0, 10.0, 10.0, 10.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let signals = feed(&eval, "X", &prices);

        assert_eq!(signals.len(), 1, "Expected a single order, got {signals:?}");
        let (index, signal) = &signals[0];
        // fast(3) = 10.33 > slow(5) = 10.2 on the first 11.0
        assert_eq!(*index, 5);
        assert_eq!(signal.order.side, OrderSide::Buy);
        assert_eq!(signal.order.quantity, 10);
        assert_eq!(signal.order.price, 11.0);
    }

    #[test]
    fn flat_series_holds() {
        let eval = setup(&["X"]);
        let id = add(&eval, "X", 2, 4, 1);
        assert!(feed(&eval, "X", &[5.0; 20]).is_empty());
        assert_eq!(eval.registry().get(&id).unwrap().position, Position::Flat);
    }

    #[test]
    fn reversal_sells_after_buy() {
        let eval = setup(&["X"]);
        let id = add(&eval, "X", 2, 4, 5);
        let prices = [10.0, 10.0, 10.0, 10.0, 12.0, 14.0, 16.0, 12.0, 8.0, 4.0, 2.0];
        let sides: Vec<OrderSide> = feed(&eval, "X", &prices)
            .into_iter()
            .map(|(_, s)| s.order.side)
            .collect();
        assert_eq!(sides, vec![OrderSide::Buy, OrderSide::Sell]);
        assert_eq!(eval.registry().get(&id).unwrap().position, Position::Short);
    }

    #[test]
    fn unknown_symbol_is_reported_and_not_evaluated() {
        let eval = setup(&["X"]);
        add(&eval, "X", 1, 2, 1);
        let err = eval.on_tick(&Tick::new("Y", 1.0)).unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol(_)));
        assert_eq!(eval.windows().len("X"), 0);
    }

    #[test]
    fn strategies_on_same_symbol_evaluate_independently() {
        let eval = setup(&["X"]);
        let quick = add(&eval, "X", 1, 2, 1);
        let slow = add(&eval, "X", 3, 6, 1);

        let signals = feed(&eval, "X", &[10.0, 11.0]);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].1.strategy_id, quick);
        assert_eq!(eval.registry().get(&quick).unwrap().position, Position::Long);
        assert_eq!(eval.registry().get(&slow).unwrap().position, Position::Flat);
    }

    #[test]
    fn other_symbols_and_paused_strategies_are_ignored() {
        let eval = setup(&["X", "Y"]);
        let other = add(&eval, "Y", 1, 2, 1);
        let paused = add(&eval, "X", 1, 2, 1);
        eval.registry().set_active(&paused, false);

        assert!(feed(&eval, "X", &[10.0, 11.0, 12.0]).is_empty());
        assert_eq!(eval.registry().get(&other).unwrap().position, Position::Flat);
        assert_eq!(eval.registry().get(&paused).unwrap().position, Position::Flat);
    }
}
