//! Picks the opponent's reply from explorer statistics.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use shakmaty::san::SanPlus;
use tracing::{debug, info, warn};

use crate::error::{LookupError, ResolveError};
use crate::lookup::{EvalLookup, StatsLookup};
use crate::model::{Evaluation, Filters, OpeningStatEntry, PlayedMove};
use crate::position::{normalize_for_eval_lookup, parse_position, play_move};
use crate::sampler;

/// Outcome of one opponent turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    Move {
        evaluation: Evaluation,
        mv: PlayedMove,
        /// Games in which `mv` was played.
        total_games: u64,
        probability: f64,
    },
    /// Nobody in the filtered games reached this position.
    Novelty { evaluation: Evaluation },
}

impl Resolution {
    pub fn evaluation(&self) -> Evaluation {
        match self {
            Resolution::Move { evaluation, .. } | Resolution::Novelty { evaluation } => *evaluation,
        }
    }
}

pub struct OpponentResolver {
    eval: Arc<dyn EvalLookup>,
    stats: Arc<dyn StatsLookup>,
    rng: Mutex<StdRng>,
}

impl OpponentResolver {
    pub fn new(eval: Arc<dyn EvalLookup>, stats: Arc<dyn StatsLookup>) -> Self {
        Self::with_rng(eval, stats, StdRng::from_entropy())
    }

    /// Resolver whose draws repeat for the same seed.
    pub fn seeded(eval: Arc<dyn EvalLookup>, stats: Arc<dyn StatsLookup>, seed: u64) -> Self {
        Self::with_rng(eval, stats, StdRng::seed_from_u64(seed))
    }

    fn with_rng(eval: Arc<dyn EvalLookup>, stats: Arc<dyn StatsLookup>, rng: StdRng) -> Self {
        Self {
            eval,
            stats,
            rng: Mutex::new(rng),
        }
    }

    /// Look up the position in both services and draw a reply.
    ///
    /// Both lookups run concurrently; nothing is sampled until both settle.
    pub async fn resolve(&self, fen: &str, filters: &Filters) -> Result<Resolution, ResolveError> {
        let position = parse_position(fen)?;

        let (evaluation, rows) = futures::try_join!(self.evaluate(fen), async {
            self.stats
                .move_stats(fen, filters)
                .await
                .map_err(ResolveError::Statistics)
        })?;

        let entries: Vec<OpeningStatEntry> = rows.into_iter().map(OpeningStatEntry::from).collect();
        debug!(fen, moves = entries.len(), %evaluation, "Lookups settled");

        if entries.iter().all(|e| e.games == 0) {
            info!(fen, %evaluation, "Novelty: no games in the filtered database");
            return Ok(Resolution::Novelty { evaluation });
        }

        let drawn = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            sampler::sample(&entries, &mut *rng)
        };
        let Some(drawn) = drawn else {
            return Ok(Resolution::Novelty { evaluation });
        };

        let unplayable = || ResolveError::UnplayableMove {
            san: drawn.san.clone(),
        };
        let san: SanPlus = drawn.san.parse().map_err(|_| unplayable())?;
        let mv = san.san.to_move(&position).map_err(|_| unplayable())?;
        let mut after = position;
        let played = play_move(&mut after, mv);

        info!(
            fen,
            san = %played.san,
            games = drawn.total_games,
            probability = drawn.probability,
            "Opponent move drawn"
        );

        Ok(Resolution::Move {
            evaluation,
            mv: played,
            total_games: drawn.total_games,
            probability: drawn.probability,
        })
    }

    /// Cloud evaluation with the single en-passant normalization retry.
    async fn evaluate(&self, fen: &str) -> Result<Evaluation, ResolveError> {
        match self.eval.evaluate(fen).await {
            Err(LookupError::NotFound) => {
                let Some(retry) = normalize_for_eval_lookup(fen) else {
                    return Err(ResolveError::EvaluationNotFound {
                        fen: fen.to_string(),
                    });
                };
                warn!(fen, retry = %retry, "Cloud eval not found, retrying normalized FEN");
                match self.eval.evaluate(&retry).await {
                    Err(LookupError::NotFound) => {
                        Err(ResolveError::EvaluationNotFound { fen: retry })
                    }
                    other => other.map_err(ResolveError::Evaluation),
                }
            }
            other => other.map_err(ResolveError::Evaluation),
        }
    }
}
