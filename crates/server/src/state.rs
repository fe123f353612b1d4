use std::sync::Arc;

use tokio::sync::Mutex;
use trainer_core::{OpponentResolver, Session};

/// Shared by every handler. There is exactly one training session.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub resolver: Arc<OpponentResolver>,
    pub default_games_threshold: u64,
}

impl AppState {
    pub fn new(resolver: OpponentResolver, default_games_threshold: u64) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            resolver: Arc::new(resolver),
            default_games_threshold,
        }
    }
}
