// Accounts: password storage plus the register, login and profile handlers.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::engine::ledger::{NewUser, ProfileChanges, User};
use crate::error::GameError;

// ── Password storage ─────────────────────────────────────────────────

/// How passwords are kept in player records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordMode {
    /// Salted Argon2 hash in PHC string format.
    #[default]
    Argon2,
    /// Raw password, compared verbatim. Insecure; only for clients that depend on it.
    Plaintext,
}

impl PasswordMode {
    /// Turn a raw password into the form stored on the user.
    pub fn store(self, password: &str) -> Result<String, String> {
        match self {
            PasswordMode::Argon2 => hash_password(password),
            PasswordMode::Plaintext => Ok(password.to_string()),
        }
    }

    pub fn verify(self, password: &str, stored: &str) -> Result<bool, String> {
        match self {
            PasswordMode::Argon2 => verify_password(password, stored),
            PasswordMode::Plaintext => Ok(password == stored),
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Failed to hash password: {e}"))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| format!("Invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// ── Request / response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub birth_date: String,
    pub wallet_address: String,
    pub telegram_id: Option<i64>,
    pub avatar: Option<String>,
}

impl From<RegisterRequest> for NewUser {
    fn from(req: RegisterRequest) -> Self {
        NewUser {
            username: req.username,
            email: req.email,
            password: req.password,
            birth_date: req.birth_date,
            wallet_address: req.wallet_address,
            telegram_id: req.telegram_id,
            avatar: req.avatar.filter(|a| !a.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial profile update. Missing or empty fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub birth_date: Option<String>,
    pub wallet_address: Option<String>,
    pub avatar: Option<String>,
}

impl From<UpdateUserRequest> for ProfileChanges {
    fn from(req: UpdateUserRequest) -> Self {
        let provided = |v: Option<String>| v.filter(|s| !s.is_empty());
        ProfileChanges {
            username: provided(req.username),
            password: provided(req.password),
            birth_date: provided(req.birth_date),
            wallet_address: provided(req.wallet_address),
            avatar: provided(req.avatar),
        }
    }
}

/// What callers see of a user. Never includes the password.
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub email: String,
    pub birth_date: String,
    pub wallet_address: String,
    pub telegram_id: Option<i64>,
    pub avatar: Option<String>,
    pub level: u32,
    pub coins: i64,
    pub experience: i64,
    pub exp_to_next_level: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        let exp_to_next_level = user.exp_to_next_level();
        UserPublic {
            id: user.id,
            username: user.username,
            email: user.email,
            birth_date: user.birth_date,
            wallet_address: user.wallet_address,
            telegram_id: user.telegram_id,
            avatar: user.avatar,
            level: user.level,
            coins: user.coins,
            experience: user.experience,
            exp_to_next_level,
            created_at: user.created_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GameError> {
    let Json(req) = payload?;
    let user = state.game.register(req.into()).await?;
    Ok((StatusCode::OK, Json(UserPublic::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GameError> {
    let Json(req) = payload?;
    let user = state.game.login(&req.email, &req.password).await?;
    Ok(Json(UserPublic::from(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let user = state.game.get_user(&user_id).await?;
    Ok(Json(UserPublic::from(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GameError> {
    let Json(req) = payload?;
    let user = state.game.update_user(&user_id, req.into()).await?;
    Ok(Json(UserPublic::from(user)))
}
