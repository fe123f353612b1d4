//! What the board widget needs to draw the session.

use std::collections::BTreeMap;

use serde::Serialize;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Color, Position};

use crate::model::color_serde;
use crate::session::{Phase, Session};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub fen: String,
    /// Legal destinations keyed by origin square; empty unless the user is to move.
    pub dests: BTreeMap<String, Vec<String>>,
    pub last_move: Option<[String; 2]>,
    #[serde(with = "color_serde")]
    pub orientation: Color,
    /// False while the opponent thinks and once the session is over.
    pub interactive: bool,
    /// Pieces may be dropped anywhere (setup).
    pub free: bool,
    pub check: bool,
}

impl BoardView {
    pub fn of(session: &Session) -> Self {
        let phase = session.phase();
        let state = session.state();

        let mut dests: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if phase == Phase::AwaitingUserMove {
            if let Some(state) = state {
                for mv in state.position.legal_moves() {
                    if let UciMove::Normal { from, to, .. } = mv.to_uci(CastlingMode::Standard) {
                        let targets = dests.entry(from.to_string()).or_default();
                        let to = to.to_string();
                        // Promotions list the same square four times.
                        if !targets.contains(&to) {
                            targets.push(to);
                        }
                    }
                }
            }
            for targets in dests.values_mut() {
                targets.sort();
            }
        }

        Self {
            fen: session.fen(),
            dests,
            last_move: state
                .and_then(|s| s.last_move.as_ref())
                .map(|m| [m.from.to_string(), m.to.to_string()]),
            orientation: session
                .config()
                .map_or(Color::White, |config| config.user_color),
            interactive: matches!(phase, Phase::Setup | Phase::AwaitingUserMove),
            free: phase == Phase::Setup,
            check: state.is_some_and(|s| s.position.is_check()),
        }
    }
}
