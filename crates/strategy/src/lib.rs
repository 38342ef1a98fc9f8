pub mod config;
pub mod crossover;
pub mod evaluator;
pub mod indicators;
pub mod registry;
pub mod window;

pub use config::StrategyFileConfig;
pub use crossover::Crossover;
pub use evaluator::{Signal, SignalEvaluator};
pub use registry::StrategyRegistry;
pub use window::PriceWindowStore;
