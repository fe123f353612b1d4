#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use trainer_core::{
    EvalLookup, Evaluation, Filters, LookupError, OpponentResolver, StatsLookup, StatsRow,
};

/// Board placement field of a FEN; the fakes key positions by it.
pub fn placement(fen: &str) -> String {
    fen.split(' ').next().unwrap_or_default().to_string()
}

pub fn row(san: &str, white: u64, draws: u64, black: u64) -> StatsRow {
    StatsRow {
        san: san.to_string(),
        white,
        draws,
        black,
    }
}

/// Answers every evaluation with the same score, or the same error.
pub struct FakeEval {
    answer: Mutex<Result<Evaluation, LookupError>>,
    pub calls: AtomicUsize,
}

impl FakeEval {
    pub fn scoring(evaluation: Evaluation) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Ok(evaluation)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_answer(&self, answer: Result<Evaluation, LookupError>) {
        *self.answer.lock().unwrap() = answer;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvalLookup for FakeEval {
    async fn evaluate(&self, _fen: &str) -> Result<Evaluation, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.lock().unwrap().clone()
    }
}

/// A tiny opening book. Positions it does not know have no games.
#[derive(Default)]
pub struct FakeStats {
    book: Mutex<HashMap<String, Vec<StatsRow>>>,
    pub last_filters: Mutex<Option<Filters>>,
}

impl FakeStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register the replies known after `fen`.
    pub fn with(self: Arc<Self>, fen: &str, rows: Vec<StatsRow>) -> Arc<Self> {
        self.book.lock().unwrap().insert(placement(fen), rows);
        self
    }
}

#[async_trait]
impl StatsLookup for FakeStats {
    async fn move_stats(&self, fen: &str, filters: &Filters) -> Result<Vec<StatsRow>, LookupError> {
        *self.last_filters.lock().unwrap() = Some(filters.clone());
        Ok(self
            .book
            .lock()
            .unwrap()
            .get(&placement(fen))
            .cloned()
            .unwrap_or_default())
    }
}

pub fn resolver(eval: Arc<FakeEval>, stats: Arc<FakeStats>) -> OpponentResolver {
    OpponentResolver::seeded(eval, stats, 42)
}

pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
pub const AFTER_E4_C5_NF3: &str =
    "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";
