// Prometheus metrics definitions for the garden backend.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Game actions, by action type and outcome ("ok" or an error kind).
    pub static ref GAME_ACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("luthenia_game_actions_total", "Game actions processed"),
        &["action", "outcome"],
    )
    .unwrap();

    /// Registration attempts, by outcome.
    pub static ref REGISTRATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("luthenia_registrations_total", "Registration attempts"),
        &["outcome"],
    )
    .unwrap();

    /// Login attempts, by outcome.
    pub static ref LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("luthenia_logins_total", "Login attempts"),
        &["outcome"],
    )
    .unwrap();

    pub static ref HARVESTS_TOTAL: IntCounter =
        IntCounter::new("luthenia_harvests_total", "Plants harvested").unwrap();

    /// Coins paid for plants and bed unlocks.
    pub static ref COINS_SPENT_TOTAL: IntCounter =
        IntCounter::new("luthenia_coins_spent_total", "Coins spent on plants and beds").unwrap();

    /// Coins credited by harvests.
    pub static ref COINS_EARNED_TOTAL: IntCounter =
        IntCounter::new("luthenia_coins_earned_total", "Coins earned from harvests").unwrap();

    /// Bot platform updates received on the webhook.
    pub static ref BOT_UPDATES_TOTAL: IntCounter =
        IntCounter::new("luthenia_bot_updates_total", "Bot webhook updates received").unwrap();

    /// Total API requests, by method/route template/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("luthenia_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "luthenia_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["endpoint"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(GAME_ACTIONS_TOTAL.clone()),
        Box::new(REGISTRATIONS_TOTAL.clone()),
        Box::new(LOGINS_TOTAL.clone()),
        Box::new(HARVESTS_TOTAL.clone()),
        Box::new(COINS_SPENT_TOTAL.clone()),
        Box::new(COINS_EARNED_TOTAL.clone()),
        Box::new(BOT_UPDATES_TOTAL.clone()),
        Box::new(API_REQUESTS_TOTAL.clone()),
        Box::new(API_REQUEST_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("Metric registration skipped: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Label for a request: the route template it matched (so `/api/user/{id}`
/// rather than one label per user), or `"unmatched"` for fallthrough 404s.
pub fn endpoint_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Axum middleware recording request counts and latency.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = endpoint_label(&req);
    let started = Instant::now();

    let response = next.run(req).await;

    API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint.as_str()])
        .observe(started.elapsed().as_secs_f64());
    API_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), endpoint.as_str(), response.status().as_str()])
        .inc();
    response
}
