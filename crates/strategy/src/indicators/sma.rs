/// Simple moving average over the most recent `period` prices.
///
/// Returns `None` until at least `period` values are available; a short
/// history is a normal warm-up state, not an error.
#[derive(Debug, Clone, Copy)]
pub struct SmaIndicator {
    pub period: usize,
}

impl SmaIndicator {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Compute the SMA from a slice of prices (oldest first).
    pub fn compute(&self, prices: &[f64]) -> Option<f64> {
        if self.period == 0 || prices.len() < self.period {
            return None;
        }
        let recent = &prices[prices.len() - self.period..];
        Some(recent.iter().sum::<f64>() / self.period as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_returns_none_when_insufficient_data() {
        let sma = SmaIndicator::new(5);
        assert!(sma.compute(&[1.0, 2.0, 3.0, 4.0]).is_none());
        assert!(sma.compute(&[]).is_none());
    }

    #[test]
    fn sma_uses_only_the_most_recent_values() {
        let sma = SmaIndicator::new(3);
        // Oldest values must not leak into the mean
        let value = sma.compute(&[100.0, 100.0, 1.0, 2.0, 3.0]).unwrap();
        assert!((value - 2.0).abs() < 1e-9, "Expected 2.0, got {value}");
    }

    #[test]
    fn sma_with_exact_period_is_plain_mean() {
        let sma = SmaIndicator::new(4);
        let value = sma.compute(&[10.0, 20.0, 30.0, 40.0]).unwrap();
        assert!((value - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zero_period_is_undefined() {
        assert!(SmaIndicator::new(0).compute(&[1.0, 2.0]).is_none());
    }
}
