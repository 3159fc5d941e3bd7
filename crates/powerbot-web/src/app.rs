use std::sync::{Arc, Mutex};

use axum::{routing::get, Router};
use rusqlite::Connection;
use tower_http::services::ServeDir;

use powerbot_core::config::WebConfig;

use crate::http::{health, leaderboard};

/// Shared state handed to every Axum handler. The embedded connection is
/// guarded by a plain `std::sync::Mutex` and only ever touched from inside
/// `spawn_blocking` — HTTP handlers must not block the async scheduler (§5).
pub struct AppState {
    pub config: WebConfig,
    pub db: Mutex<Connection>,
}

impl AppState {
    pub fn new(config: WebConfig, db: Connection) -> Self {
        Self {
            config,
            db: Mutex::new(db),
        }
    }
}

/// Builds the router: `/health`, `/api/economy/top10`, then one static
/// mount per `WEB_STATIC_MOUNTS` entry.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/economy/top10", get(leaderboard::top10_handler));

    for (url_prefix, dir) in state.config.parsed_static_mounts() {
        let serve_dir = ServeDir::new(&dir).index_file(state.config.index_file.clone());
        router = router.nest_service(&url_prefix, serve_dir);
    }

    router
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
