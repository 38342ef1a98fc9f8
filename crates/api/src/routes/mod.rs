mod health;
mod strategies;

pub use health::health_router;
pub use strategies::strategies_router;
