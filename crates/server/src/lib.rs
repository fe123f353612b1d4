pub mod clients;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

/// The HTTP surface of the trainer.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Form choices
        .route("/api/options", get(routes::options::get_options))
        // Session
        .route("/api/session", get(routes::session::get_session))
        .route("/api/session/setup", put(routes::session::load_setup))
        .route("/api/session/setup/move", post(routes::session::move_piece))
        .route("/api/session/setup/put", post(routes::session::put_piece))
        .route("/api/session/setup/remove", post(routes::session::remove_piece))
        .route("/api/session/start", post(routes::session::start))
        .route("/api/session/move", post(routes::session::submit_move))
        .route("/api/session/reset", post(routes::session::reset))
        .route("/api/session/new", post(routes::session::new_game))
        // Shared state
        .layer(Extension(state))
        .layer(cors)
}

/// Serve the trainer on an already bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, app(state)).await
}
