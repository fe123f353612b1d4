//! Frequency-weighted move selection.

use rand::Rng;
use serde::Serialize;

use crate::model::OpeningStatEntry;

/// The move drawn by [`sample`] and how likely it was.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub san: String,
    /// Games in which the chosen move was played.
    pub total_games: u64,
    pub probability: f64,
}

/// Draw one entry with probability proportional to its game count.
///
/// Returns `None` when there is nothing to draw from: no entries, or entries
/// that add up to zero games.
pub fn sample<R: Rng + ?Sized>(entries: &[OpeningStatEntry], rng: &mut R) -> Option<Sample> {
    let total = total_games(entries);
    if total == 0 {
        return None;
    }
    let r = rng.gen_range(0.0..total as f64);
    pick(entries, r)
}

/// Walk `entries` subtracting counts from `r` until the remainder reaches zero.
///
/// `r` is expected in `[0, total)`.
pub fn pick(entries: &[OpeningStatEntry], r: f64) -> Option<Sample> {
    let total = total_games(entries);
    if total == 0 {
        return None;
    }

    let mut remainder = r;
    let mut chosen = None;
    for entry in entries.iter().filter(|e| e.games > 0) {
        remainder -= entry.games as f64;
        chosen = Some(entry);
        if remainder <= 0.0 {
            break;
        }
    }

    chosen.map(|entry| Sample {
        san: entry.san.clone(),
        total_games: entry.games,
        probability: entry.games as f64 / total as f64,
    })
}

fn total_games(entries: &[OpeningStatEntry]) -> u64 {
    entries
        .iter()
        .fold(0u64, |total, e| total.saturating_add(e.games))
}
