use std::time::Duration;

use crate::{Error, Result, TradingMode};

/// All configuration loaded from environment variables at startup.
/// Every variable has a default; malformed values are configuration errors.
#[derive(Debug, Clone)]
pub struct Config {
    // Trading
    pub trading_mode: TradingMode,
    pub oms_url: String,
    pub http_timeout: Duration,

    // Market data
    pub tick_stream_url: String,
    pub symbols: Vec<String>,
    pub tick_buffer: usize,

    // Management API
    pub api_port: u16,
    pub api_token: Option<String>,

    // Optional strategies registered at startup
    pub strategy_config_path: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let trading_mode = match lookup("TRADING_MODE")
            .unwrap_or_else(|| "paper".to_string())
            .to_lowercase()
            .as_str()
        {
            "paper" => TradingMode::Paper,
            "live" => TradingMode::Live,
            other => {
                return Err(Error::Config(format!(
                    "TRADING_MODE must be 'paper' or 'live', got: '{other}'"
                )))
            }
        };

        let symbols: Vec<String> = lookup("SYMBOLS")
            .unwrap_or_else(|| "RELIANCE,TCS,INFY,HDFCBANK,ICICIBANK".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            return Err(Error::Config("SYMBOLS must name at least one symbol".into()));
        }

        let tick_buffer: usize = parsed(&lookup, "TICK_BUFFER", 1024)?;
        if tick_buffer == 0 {
            return Err(Error::Config("TICK_BUFFER must be greater than 0".into()));
        }

        Ok(Config {
            trading_mode,
            oms_url: lookup("OMS_URL")
                .unwrap_or_else(|| "http://localhost:8082/orders".to_string()),
            http_timeout: Duration::from_millis(parsed(&lookup, "HTTP_TIMEOUT_MS", 5000)?),
            tick_stream_url: lookup("TICK_STREAM_URL")
                .unwrap_or_else(|| "ws://localhost:8080/stream".to_string()),
            symbols,
            tick_buffer,
            api_port: parsed(&lookup, "API_PORT", 8000)?,
            api_token: lookup("API_TOKEN").filter(|t| !t.is_empty()),
            strategy_config_path: lookup("STRATEGY_CONFIG_PATH").filter(|p| !p.is_empty()),
        })
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{key}='{raw}' is invalid: {e}"))),
        None => Ok(default),
    }
}
