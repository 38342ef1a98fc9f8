use common::{OrderSide, Position};

/// Relationship between the fast and slow moving averages on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    /// Fast above slow.
    Golden,
    /// Fast below slow.
    Death,
    /// Equal averages; never acted on.
    Neutral,
}

impl Crossover {
    pub fn classify(fast: f64, slow: f64) -> Self {
        if fast > slow {
            Crossover::Golden
        } else if fast < slow {
            Crossover::Death
        } else {
            Crossover::Neutral
        }
    }
}

/// Position state machine: returns the order side to emit and the new
/// position, or `None` to hold.
///
/// A strategy already long ignores further golden crosses and one already
/// short ignores further death crosses, so a persisting crossover produces
/// exactly one order.
pub fn decide(position: Position, crossover: Crossover) -> Option<(OrderSide, Position)> {
    match (crossover, position) {
        (Crossover::Golden, Position::Flat | Position::Short) => {
            Some((OrderSide::Buy, Position::Long))
        }
        (Crossover::Death, Position::Flat | Position::Long) => {
            Some((OrderSide::Sell, Position::Short))
        }
        _ => None,
    }
}
