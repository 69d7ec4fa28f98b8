// HTTP API routes (accounts, garden, inventory, game actions, bot webhook).

pub mod webhook;

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::services::ServeDir;

use crate::auth;
use crate::bot::BotClient;
use crate::db::StoreBackend;
use crate::engine::action::GameActionRequest;
use crate::engine::service::GameService;
use crate::error::GameError;
use crate::metrics;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub game: Arc<GameService<StoreBackend>>,
    /// Present only when a bot token is configured.
    pub bot: Option<BotClient>,
}

pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        // Accounts
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/user/{id}", get(auth::get_user).put(auth::update_user))
        // Garden and inventory snapshots
        .route("/api/user/{id}/garden", get(get_garden))
        .route("/api/user/{id}/inventory", get(get_inventory))
        // Catalog and actions
        .route("/api/plants", get(list_plants))
        .route("/api/game/action", post(game_action))
        // Bot platform
        .route("/api/telegram/webhook", post(webhook::telegram_webhook))
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    app.layer(axum::middleware::from_fn(metrics::track_requests))
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "luthenia-backend" }))
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

async fn list_plants(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.game.list_plants())
}

/// The user's beds with progress recomputed against the current time.
async fn get_garden(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let garden = state.game.get_garden(&user_id).await?;
    Ok(Json(garden.beds))
}

async fn get_inventory(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let inventory = state.game.get_inventory(&user_id).await?;
    Ok(Json(inventory))
}

async fn game_action(
    State(state): State<AppState>,
    payload: Result<Json<GameActionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GameError> {
    let Json(req) = payload?;
    let response = state.game.dispatch(req).await?;
    Ok(Json(response))
}
