use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use luthenia_backend::api::{self, AppState};
use luthenia_backend::auth::PasswordMode;
use luthenia_backend::bot::BotClient;
use luthenia_backend::config::Config;
use luthenia_backend::db::StoreBackend;
use luthenia_backend::engine::service::GameService;
use luthenia_backend::metrics;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();
    metrics::register_metrics();

    let store = StoreBackend::connect(config.database_url.as_deref())
        .await
        .expect("Failed to initialize player store");
    tracing::info!("Using {} player store", store.name());

    let bot = match &config.bot_token {
        Some(token) => Some(BotClient::new(token.clone(), config.webapp_url.clone())),
        None => {
            tracing::info!("BOT_TOKEN not set; webhook updates will only be logged");
            None
        }
    };

    let game = Arc::new(GameService::new(store, config.settings()));
    if game.settings().password_mode == PasswordMode::Plaintext {
        tracing::warn!("Plaintext password mode is enabled; passwords are stored unhashed");
    }

    let state = AppState { game, bot };

    let static_dir = if config.static_dir.is_dir() {
        Some(config.static_dir.clone())
    } else {
        tracing::warn!(
            "Static directory {} not found; /static is disabled",
            config.static_dir.display()
        );
        None
    };

    let app = api::router(state, static_dir)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Luthenia backend listening on {addr}");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
