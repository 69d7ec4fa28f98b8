// Domain errors for the game core and their HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Every failure the game can surface to a caller.
///
/// Operations that return one of these have applied none of their side effects.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("User not found")]
    UserNotFound,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Telegram account already linked")]
    DuplicateExternalAccount,
    #[error("Wallet address must be at least 12 alphanumeric characters")]
    InvalidWallet,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Plant not found. Available IDs: {available:?}")]
    PlantNotFound { available: Vec<u32> },
    #[error("Plant not found in inventory")]
    ItemNotInInventory,
    #[error("Garden bed not found")]
    BedNotFound,
    #[error("Garden bed is locked")]
    BedLocked,
    #[error("Garden bed is already occupied")]
    BedOccupied,
    #[error("Garden bed is already unlocked")]
    AlreadyUnlocked,
    #[error("Nothing to harvest")]
    NothingToHarvest,
    #[error("Plant is not ready for harvest")]
    NotReady,
    #[error("Not enough coins")]
    InsufficientFunds,
    #[error("Invalid action type")]
    InvalidAction,
    #[error("{0} is required")]
    MissingField(&'static str),
    /// The request body was not acceptable JSON for the endpoint.
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },
    #[error("storage error: {0}")]
    Store(#[from] crate::db::StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GameError::UserNotFound => StatusCode::NOT_FOUND,
            GameError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            GameError::InvalidBody { status, .. } => *status,
            GameError::Store(_) | GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::UserNotFound => "user_not_found",
            GameError::DuplicateEmail => "duplicate_email",
            GameError::DuplicateExternalAccount => "duplicate_external_account",
            GameError::InvalidWallet => "invalid_wallet",
            GameError::InvalidCredentials => "invalid_credentials",
            GameError::PlantNotFound { .. } => "plant_not_found",
            GameError::ItemNotInInventory => "item_not_in_inventory",
            GameError::BedNotFound => "bed_not_found",
            GameError::BedLocked => "bed_locked",
            GameError::BedOccupied => "bed_occupied",
            GameError::AlreadyUnlocked => "already_unlocked",
            GameError::NothingToHarvest => "nothing_to_harvest",
            GameError::NotReady => "not_ready",
            GameError::InsufficientFunds => "insufficient_funds",
            GameError::InvalidAction => "invalid_action",
            GameError::MissingField(_) => "missing_field",
            GameError::InvalidBody { .. } => "invalid_body",
            GameError::Store(_) => "store",
            GameError::Internal(_) => "internal",
        }
    }
}

impl From<JsonRejection> for GameError {
    fn from(rejection: JsonRejection) -> Self {
        GameError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal failure: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
