// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;

use crate::auth::PasswordMode;
use crate::engine::catalog::DEFAULT_UNLOCK_COST;
use crate::engine::service::{GameSettings, GrowTimePolicy};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// SQLite connection string. `None` keeps all state in memory.
    pub database_url: Option<String>,
    /// Directory served under `/static`. Skipped if it does not exist.
    pub static_dir: PathBuf,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Bot platform token. The relay is disabled without one.
    pub bot_token: Option<String>,
    /// URL the bot's keyboard button opens.
    pub webapp_url: String,
    pub bed_unlock_cost: i64,
    pub plaintext_passwords: bool,
    pub trust_client_grow_time: bool,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    /// A `.env` file in the working directory is read first if present.
    ///
    /// Environment variables:
    /// - `HOST` - bind address (default: `0.0.0.0`)
    /// - `PORT` - HTTP server port (default: 8000)
    /// - `DATABASE_URL` - SQLite connection string (default: unset, in-memory store)
    /// - `STATIC_DIR` - static asset directory (default: `static`)
    /// - `CORS_ORIGINS` - comma-separated origins (default: `http://localhost:3000`)
    /// - `BOT_TOKEN` - bot platform token
    /// - `WEBAPP_URL` - web app URL for the bot button
    /// - `BED_UNLOCK_COST` - coins charged when an unlock omits `cost` (default: 200)
    /// - `LUTHENIA_PLAINTEXT_PASSWORDS` - store raw passwords instead of Argon2 hashes
    /// - `LUTHENIA_TRUST_CLIENT_GROW_TIME` - accept `growTime` from clients
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {e}");
            }
        }
        let args: Vec<String> = std::env::args().collect();
        Self::from_lookup(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from CLI args and an environment lookup.
    pub fn from_lookup(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let host = env("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(8000);

        let database_url = env("DATABASE_URL");

        let static_dir = env("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("static"));

        let cors_origins = env("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let bed_unlock_cost = env("BED_UNLOCK_COST")
            .and_then(|v| v.parse().ok())
            .filter(|cost: &i64| *cost >= 0)
            .unwrap_or(DEFAULT_UNLOCK_COST);

        Config {
            host,
            port,
            database_url,
            static_dir,
            cors_origins,
            bot_token: env("BOT_TOKEN"),
            webapp_url: env("WEBAPP_URL").unwrap_or_default(),
            bed_unlock_cost,
            plaintext_passwords: env("LUTHENIA_PLAINTEXT_PASSWORDS").is_some_and(|v| is_truthy(&v)),
            trust_client_grow_time: env("LUTHENIA_TRUST_CLIENT_GROW_TIME")
                .is_some_and(|v| is_truthy(&v)),
        }
    }

    /// Game rules derived from this configuration.
    pub fn settings(&self) -> GameSettings {
        GameSettings {
            password_mode: if self.plaintext_passwords {
                PasswordMode::Plaintext
            } else {
                PasswordMode::Argon2
            },
            grow_time_policy: if self.trust_client_grow_time {
                GrowTimePolicy::Client
            } else {
                GrowTimePolicy::Catalog
            },
            default_unlock_cost: self.bed_unlock_cost,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}

fn is_truthy(v: &str) -> bool {
    v.eq_ignore_ascii_case("true") || v == "1" || v.eq_ignore_ascii_case("yes")
}
