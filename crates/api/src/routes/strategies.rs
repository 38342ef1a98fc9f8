use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use common::{Strategy, StrategyConfig};

use crate::AppState;

pub fn strategies_router() -> Router<AppState> {
    Router::new()
        .route("/strategies", get(list_strategies).post(create_strategy))
        .route(
            "/strategies/:id",
            get(get_strategy)
                .patch(update_strategy)
                .delete(delete_strategy),
        )
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Body that axum could not turn into the expected type, as JSON.
fn rejected(rejection: JsonRejection) -> Response {
    warn!(error = %rejection.body_text(), "Rejected request body");
    error(rejection.status(), rejection.body_text())
}

// ─── Create ───────────────────────────────────────────────────────────────────

async fn create_strategy(
    State(state): State<AppState>,
    body: Result<Json<StrategyConfig>, JsonRejection>,
) -> Response {
    let Json(config) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };

    if !state.windows.contains(&config.symbol) {
        warn!(symbol = %config.symbol, "Rejected strategy for unknown symbol");
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("unknown symbol '{}'", config.symbol),
        );
    }

    match state.registry.add(config) {
        Ok(strategy) => (StatusCode::CREATED, Json(strategy)).into_response(),
        Err(e) => error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

// ─── Read ─────────────────────────────────────────────────────────────────────

async fn list_strategies(State(state): State<AppState>) -> Json<Vec<Strategy>> {
    Json(state.registry.snapshot())
}

async fn get_strategy(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.registry.get(&id) {
        Some(strategy) => Json(strategy).into_response(),
        None => error(StatusCode::NOT_FOUND, "strategy not found"),
    }
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ActivityUpdate {
    active: bool,
}

async fn update_strategy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ActivityUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    match state.registry.set_active(&id, update.active) {
        Some(strategy) => Json(strategy).into_response(),
        None => error(StatusCode::NOT_FOUND, "strategy not found"),
    }
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// Idempotent: deleting an unknown id still reports success.
async fn delete_strategy(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    state.registry.remove(&id);
    Json(json!({ "status": "deleted" })).into_response()
}
