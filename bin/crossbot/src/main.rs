use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{Config, OrderGateway, TradingMode};
use engine::{HttpGateway, RuntimeContext, TickFeed};
use paper::PaperGateway;
use strategy::StrategyFileConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid configuration")?;
    info!(mode = %cfg.trading_mode, symbols = ?cfg.symbols, "Crossbot starting");

    // ── Order gateway (injected based on TRADING_MODE) ────────────────────────
    let gateway: Arc<dyn OrderGateway> = match cfg.trading_mode {
        TradingMode::Live => {
            info!(url = %cfg.oms_url, "Live trading mode — using HttpGateway");
            Arc::new(HttpGateway::new(&cfg.oms_url, cfg.http_timeout)?)
        }
        TradingMode::Paper => {
            info!("Paper trading mode — using PaperGateway");
            Arc::new(PaperGateway::new(Duration::from_secs(2)))
        }
    };

    // ── Shared state ──────────────────────────────────────────────────────────
    let ctx = RuntimeContext::new(cfg.symbols.clone(), gateway);

    if let Some(path) = &cfg.strategy_config_path {
        let file = StrategyFileConfig::load(path)
            .with_context(|| format!("failed to load strategies from '{path}'"))?;
        for strategy in file.strategies {
            anyhow::ensure!(
                ctx.windows.contains(&strategy.symbol),
                "strategy in '{path}' uses unknown symbol '{}'",
                strategy.symbol
            );
            ctx.registry
                .add(strategy)
                .with_context(|| format!("invalid strategy in '{path}'"))?;
        }
        info!(count = ctx.registry.len(), "Loaded strategies from file");
    }

    // ── Tick subscription (fatal if it cannot be established) ───────────────
    let feed = TickFeed::new(&cfg.tick_stream_url)?;
    let ws = feed
        .connect()
        .await
        .with_context(|| format!("cannot subscribe to tick stream at {}", cfg.tick_stream_url))?;

    // ── Management API ────────────────────────────────────────────────────────
    let api_state = api::AppState {
        registry: ctx.registry.clone(),
        windows: ctx.windows.clone(),
        trading_mode: cfg.trading_mode,
        api_token: cfg.api_token.clone(),
    };
    let listener = api::bind(cfg.api_port)
        .await
        .with_context(|| format!("cannot bind strategy API on port {}", cfg.api_port))?;
    let api_task = tokio::spawn(async move {
        if let Err(e) = api::serve(listener, api_state).await {
            error!(error = %e, "Strategy API stopped");
        }
    });

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let pipeline = ctx.spawn_pipeline(feed, ws, cfg.tick_buffer);

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    let stats = pipeline.shutdown().await;
    api_task.abort();
    info!(
        ticks = stats.ticks,
        orders = stats.orders_dispatched,
        failed = stats.orders_failed,
        "Exiting"
    );
    Ok(())
}
