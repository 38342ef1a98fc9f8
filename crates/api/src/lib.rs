mod auth;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::{Result, TradingMode};
use strategy::{PriceWindowStore, StrategyRegistry};

use crate::auth::require_auth;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StrategyRegistry>,
    /// Used to reject strategies on symbols outside the universe.
    pub windows: Arc<PriceWindowStore>,
    pub trading_mode: TradingMode,
    /// Bearer token required on `/strategies` routes when set.
    pub api_token: Option<String>,
}

/// Build the management router. `/healthz` is never behind auth.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    let protected = routes::strategies_router().route_layer(
        middleware::from_fn_with_state(state.clone(), require_auth),
    );

    Router::new()
        .merge(protected)
        .merge(routes::health_router())
        .with_state(state)
        .layer(cors)
}

/// Bind the API listener on all interfaces.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    Ok(TcpListener::bind(addr).await?)
}

/// Run the API server on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    info!(addr = %listener.local_addr()?, "Strategy API listening");
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
