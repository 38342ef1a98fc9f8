use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use common::{Error, Result, WINDOW_CAPACITY};

use crate::indicators::SmaIndicator;

/// Per-symbol rolling window of recent prices.
///
/// Only symbols from the configured universe have a window; the set is
/// fixed at construction. Each window holds at most `capacity` prices and
/// drops the oldest first.
#[derive(Debug)]
pub struct PriceWindowStore {
    windows: Mutex<HashMap<String, VecDeque<f64>>>,
    capacity: usize,
}

impl PriceWindowStore {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_capacity(symbols, WINDOW_CAPACITY)
    }

    pub fn with_capacity<I, S>(symbols: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let windows = symbols
            .into_iter()
            .map(|s| (s.into(), VecDeque::with_capacity(capacity)))
            .collect();
        Self {
            windows: Mutex::new(windows),
            capacity,
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.lock().contains_key(symbol)
    }

    /// Symbols of the configured universe, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.lock().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Append a price to the symbol's window, evicting the oldest on overflow.
    pub fn append(&self, symbol: &str, price: f64) -> Result<()> {
        let mut windows = self.lock();
        let window = windows
            .get_mut(symbol)
            .ok_or_else(|| Error::UnknownSymbol(symbol.to_string()))?;
        window.push_back(price);
        while window.len() > self.capacity {
            window.pop_front();
        }
        Ok(())
    }

    /// Mean of the `period` most recent prices, or `None` during warm-up
    /// and for symbols outside the universe.
    pub fn moving_average(&self, symbol: &str, period: usize) -> Option<f64> {
        let mut windows = self.lock();
        let window = windows.get_mut(symbol)?;
        SmaIndicator::new(period).compute(window.make_contiguous())
    }

    /// Number of prices currently held for `symbol`.
    pub fn len(&self, symbol: &str) -> usize {
        self.lock().get(symbol).map_or(0, VecDeque::len)
    }

    /// Copy of the symbol's window, oldest first.
    pub fn prices(&self, symbol: &str) -> Vec<f64> {
        self.lock()
            .get(symbol)
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<f64>>> {
        // A panic while holding the lock cannot leave a window half-updated
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }
}
