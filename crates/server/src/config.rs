use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cloud_eval_url: String,
    pub explorer_url: String,
    /// Bearer token for the opening explorer, which throttles anonymous use.
    pub lichess_token: Option<String>,
    pub http_timeout_secs: u64,
    /// Fixed seed for the opponent's draws; entropy when unset.
    pub rng_seed: Option<u64>,
    pub default_games_threshold: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            cloud_eval_url: env::var("LICHESS_CLOUD_EVAL_URL")
                .unwrap_or_else(|_| "https://lichess.org/api/cloud-eval".to_string()),
            explorer_url: env::var("LICHESS_EXPLORER_URL")
                .unwrap_or_else(|_| "https://explorer.lichess.ovh/lichess".to_string()),
            lichess_token: env::var("LICHESS_TOKEN").ok().filter(|t| !t.is_empty()),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            rng_seed: env::var("TRAINER_RNG_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
            default_games_threshold: env::var("DEFAULT_GAMES_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(trainer_core::model::DEFAULT_GAMES_THRESHOLD),
        }
    }
}
