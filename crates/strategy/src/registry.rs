use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use common::{OrderSide, Position, Result, Strategy, StrategyConfig};

use crate::crossover::{self, Crossover};

/// Holds every configured strategy and its live position.
///
/// One coarse lock guards the whole collection. The management surface
/// mutates it between ticks; the evaluator takes a snapshot once per tick
/// and applies transitions through `transition`, which decides and updates
/// under the write lock.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: RwLock<Vec<Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a new strategy. It starts active and flat.
    pub fn add(&self, config: StrategyConfig) -> Result<Strategy> {
        config.validate()?;
        let strategy = Strategy::new(config);
        info!(
            strategy = %strategy.id,
            symbol = %strategy.config.symbol,
            fast = strategy.config.fast_period,
            slow = strategy.config.slow_period,
            qty = strategy.config.quantity,
            "Registered strategy"
        );
        self.write().push(strategy.clone());
        Ok(strategy)
    }

    /// Point-in-time copy of all strategies, in registration order.
    pub fn snapshot(&self) -> Vec<Strategy> {
        self.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<Strategy> {
        self.read().iter().find(|s| s.id == id).cloned()
    }

    /// Remove a strategy. Unknown ids are a no-op; returns whether one was removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut strategies = self.write();
        let before = strategies.len();
        strategies.retain(|s| s.id != id);
        let removed = strategies.len() != before;
        if removed {
            info!(strategy = %id, "Removed strategy");
        }
        removed
    }

    /// Overwrite a strategy's position. Returns `false` if the id is gone.
    pub fn set_position(&self, id: &str, position: Position) -> bool {
        match self.write().iter_mut().find(|s| s.id == id) {
            Some(strategy) => {
                strategy.position = position;
                true
            }
            None => false,
        }
    }

    /// Pause or resume a strategy. Paused strategies keep their position.
    pub fn set_active(&self, id: &str, active: bool) -> Option<Strategy> {
        let mut strategies = self.write();
        let strategy = strategies.iter_mut().find(|s| s.id == id)?;
        strategy.active = active;
        info!(strategy = %id, active, "Strategy activity changed");
        Some(strategy.clone())
    }

    /// Decide on a crossover and move the position in one step.
    ///
    /// Returns the side of the order to emit, or `None` when the strategy
    /// holds, was removed, or was paused since the snapshot was taken.
    pub fn transition(&self, id: &str, fast: f64, slow: f64) -> Option<OrderSide> {
        let mut strategies = self.write();
        let strategy = strategies.iter_mut().find(|s| s.id == id && s.active)?;
        let (side, next) = crossover::decide(strategy.position, Crossover::classify(fast, slow))?;
        strategy.position = next;
        Some(side)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Strategy>> {
        self.strategies.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Strategy>> {
        self.strategies.write().unwrap_or_else(|e| e.into_inner())
    }
}
