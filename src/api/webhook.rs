// Bot platform webhook: acknowledge at once, answer in the background.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use super::AppState;
use crate::bot::Update;
use crate::error::GameError;
use crate::metrics;

pub async fn telegram_webhook(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, GameError> {
    let Json(payload) = payload?;
    metrics::BOT_UPDATES_TOTAL.inc();
    tracing::info!("Telegram webhook data: {payload}");

    if let Some(bot) = state.bot.clone() {
        match serde_json::from_value::<Update>(payload) {
            Ok(update) => {
                tokio::spawn(async move { bot.handle_update(update).await });
            }
            Err(e) => tracing::warn!("Unrecognised webhook payload: {e}"),
        }
    }

    Ok(Json(json!({ "status": "ok" })))
}
