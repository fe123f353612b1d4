use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use trainer_core::{EvalLookup, Evaluation, Filters, LookupError, StatsLookup, StatsRow};

use crate::config::Config;

/// Cloud evaluation and opening explorer, both served by Lichess.
pub struct LichessClient {
    client: Client,
    cloud_eval_url: String,
    explorer_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct CloudEvalResponse {
    pvs: Vec<CloudEvalPv>,
}

#[derive(Deserialize)]
struct CloudEvalPv {
    cp: Option<i32>,
    mate: Option<i32>,
}

#[derive(Deserialize)]
struct ExplorerResponse {
    moves: Vec<ExplorerMove>,
}

#[derive(Deserialize)]
struct ExplorerMove {
    san: String,
    white: u64,
    draws: u64,
    black: u64,
}

impl LichessClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("OpeningTrainer/1.0")
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            cloud_eval_url: config.cloud_eval_url.clone(),
            explorer_url: config.explorer_url.clone(),
            token: config.lichess_token.clone(),
        })
    }

    async fn fetch(&self, request: RequestBuilder) -> Result<String, LookupError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let resp = request
            .send()
            .await
            .map_err(|e| LookupError::Transport(format!("Request error: {e}")))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound);
        }

        if !resp.status().is_success() {
            return Err(LookupError::Transport(format!("HTTP {}", resp.status())));
        }

        resp.text()
            .await
            .map_err(|e| LookupError::Transport(format!("Body read error: {e}")))
    }
}

#[async_trait]
impl EvalLookup for LichessClient {
    async fn evaluate(&self, fen: &str) -> Result<Evaluation, LookupError> {
        tracing::debug!(fen, "Cloud eval lookup");
        let body = self
            .fetch(self.client.get(&self.cloud_eval_url).query(&[("fen", fen)]))
            .await?;
        parse_cloud_eval(&body)
    }
}

#[async_trait]
impl StatsLookup for LichessClient {
    async fn move_stats(&self, fen: &str, filters: &Filters) -> Result<Vec<StatsRow>, LookupError> {
        tracing::debug!(fen, speeds = %filters.speeds_param(), "Explorer lookup");
        let params = [
            ("variant", "standard".to_string()),
            ("fen", fen.to_string()),
            ("speeds", filters.speeds_param()),
            ("ratings", filters.ratings_param()),
            ("topGames", "0".to_string()),
            ("recentGames", "0".to_string()),
        ];
        let body = self
            .fetch(self.client.get(&self.explorer_url).query(&params))
            .await?;
        parse_explorer(&body)
    }
}

/// Score of the principal variation. Responses without one are malformed.
pub fn parse_cloud_eval(body: &str) -> Result<Evaluation, LookupError> {
    let parsed: CloudEvalResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::Malformed(format!("cloud eval: {e}")))?;
    let pv = parsed
        .pvs
        .first()
        .ok_or_else(|| LookupError::Malformed("cloud eval has no pvs".to_string()))?;

    match (pv.mate, pv.cp) {
        (Some(mate), _) => Ok(Evaluation::Mate(mate)),
        (None, Some(cp)) => Ok(Evaluation::Centipawns(cp)),
        (None, None) => Err(LookupError::Malformed(
            "cloud eval pv has neither cp nor mate".to_string(),
        )),
    }
}

pub fn parse_explorer(body: &str) -> Result<Vec<StatsRow>, LookupError> {
    let parsed: ExplorerResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::Malformed(format!("explorer: {e}")))?;
    Ok(parsed
        .moves
        .into_iter()
        .map(|m| StatsRow {
            san: m.san,
            white: m.white,
            draws: m.draws,
            black: m.black,
        })
        .collect())
}
