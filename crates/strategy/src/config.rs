use serde::{Deserialize, Serialize};

use common::{Error, Result, StrategyConfig};

/// Strategies registered at startup (TOML).
///
/// Example `config/strategies.toml`:
/// ```toml
/// [[strategy]]
/// symbol = "TCS"
/// fast_period = 5
/// slow_period = 20
/// quantity = 10
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy", default)]
    pub strategies: Vec<StrategyConfig>,
}

impl StrategyFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("strategy config at '{path}': {e}")))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strategy_tables() {
        let cfg = StrategyFileConfig::parse(
            r#"
            [[strategy]]
            symbol = "TCS"
            fast_period = 5
            slow_period = 20
            quantity = 10

            [[strategy]]
            symbol = "INFY"
            fast_period = 3
            slow_period = 8
            quantity = 1
            "#,
        )
        .unwrap();
        assert_eq!(cfg.strategies.len(), 2);
        assert_eq!(cfg.strategies[1].symbol, "INFY");
        assert_eq!(cfg.strategies[0].slow_period, 20);
    }

    #[test]
    fn empty_file_has_no_strategies() {
        assert!(StrategyFileConfig::parse("").unwrap().strategies.is_empty());
    }

    #[test]
    fn missing_field_is_a_config_error() {
        let err = StrategyFileConfig::parse("[[strategy]]\nsymbol = \"TCS\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
