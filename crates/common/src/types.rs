use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of recent prices kept per symbol. Also the longest usable period.
pub const WINDOW_CAPACITY: usize = 200;

/// One price update from the market data stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    /// Publisher timestamp, when the message carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp: None,
        }
    }
}

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Only market orders are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    #[default]
    Market,
}

/// Order as posted to the order-management gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: u32,
    /// Price of the tick that triggered the signal.
    pub price: f64,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: u32, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price,
        }
    }
}

/// Directional exposure a strategy believes it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Flat,
    Long,
    Short,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Flat => write!(f, "flat"),
            Position::Long => write!(f, "long"),
            Position::Short => write!(f, "short"),
        }
    }
}

/// User-supplied parameters of a moving-average crossover strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Instrument symbol, e.g. "TCS".
    pub symbol: String,
    pub fast_period: usize,
    pub slow_period: usize,
    /// Order quantity in units of the instrument.
    pub quantity: u32,
}

impl StrategyConfig {
    /// Reject configurations that could never trade sensibly.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::InvalidStrategy("symbol must not be empty".into()));
        }
        if self.fast_period == 0 || self.slow_period == 0 {
            return Err(Error::InvalidStrategy("periods must be greater than 0".into()));
        }
        if self.quantity == 0 {
            return Err(Error::InvalidStrategy("quantity must be greater than 0".into()));
        }
        if self.fast_period >= self.slow_period {
            return Err(Error::InvalidStrategy(format!(
                "fast_period ({}) must be less than slow_period ({})",
                self.fast_period, self.slow_period
            )));
        }
        if self.slow_period > WINDOW_CAPACITY {
            return Err(Error::InvalidStrategy(format!(
                "slow_period ({}) exceeds the price window capacity ({WINDOW_CAPACITY})",
                self.slow_period
            )));
        }
        Ok(())
    }
}

/// A registered strategy together with its live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    #[serde(flatten)]
    pub config: StrategyConfig,
    pub active: bool,
    pub position: Position,
    pub created_at: DateTime<Utc>,
}

impl Strategy {
    /// New strategies start active and flat with a fresh id.
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            active: true,
            position: Position::Flat,
            created_at: Utc::now(),
        }
    }
}

/// Whether orders go to the real gateway or are simulated in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Live,
    Paper,
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Live => write!(f, "live"),
            TradingMode::Paper => write!(f, "paper"),
        }
    }
}

/// Result of handing one order to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Accepted,
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DispatchOutcome::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(fast: usize, slow: usize, quantity: u32) -> StrategyConfig {
        StrategyConfig {
            symbol: "TCS".into(),
            fast_period: fast,
            slow_period: slow,
            quantity,
        }
    }

    #[test]
    fn validate_accepts_sane_config() {
        assert!(cfg(3, 5, 10).validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_values() {
        assert!(cfg(0, 5, 10).validate().is_err());
        assert!(cfg(3, 0, 10).validate().is_err());
        assert!(cfg(3, 5, 0).validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_or_oversized_periods() {
        assert!(cfg(5, 5, 1).validate().is_err());
        assert!(cfg(10, 5, 1).validate().is_err());
        assert!(cfg(5, WINDOW_CAPACITY + 1, 1).validate().is_err());
        assert!(cfg(5, WINDOW_CAPACITY, 1).validate().is_ok());
    }

    #[test]
    fn order_request_serializes_to_gateway_shape() {
        let order = OrderRequest::market("INFY", OrderSide::Buy, 10, 1500.5);
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "symbol": "INFY",
                "side": "BUY",
                "type": "MARKET",
                "quantity": 10,
                "price": 1500.5,
            })
        );
    }

    #[test]
    fn strategy_serializes_flat() {
        let strategy = Strategy::new(cfg(3, 5, 10));
        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["symbol"], "TCS");
        assert_eq!(json["fast_period"], 3);
        assert_eq!(json["active"], true);
        assert_eq!(json["position"], "flat");
    }
}
