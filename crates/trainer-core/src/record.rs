//! PGN move record for a finished (or ongoing) training line.

use shakmaty::{Chess, Color, Position};

use crate::model::PlayedMove;
use crate::position::{position_fen, STANDARD_START_FEN};

/// Render the moves played from `initial` as PGN movetext.
///
/// A line that does not start from the standard position carries `SetUp` and
/// `FEN` headers so the record can be replayed.
pub fn move_record(initial: &Chess, moves: &[PlayedMove]) -> String {
    let start_fen = position_fen(initial);
    let movetext = movetext(initial, moves);

    if start_fen == STANDARD_START_FEN {
        return movetext;
    }

    let headers = format!("[SetUp \"1\"]\n[FEN \"{start_fen}\"]");
    if movetext.is_empty() {
        headers
    } else {
        format!("{headers}\n\n{movetext}")
    }
}

fn movetext(initial: &Chess, moves: &[PlayedMove]) -> String {
    let mut number = initial.fullmoves().get();
    let mut turn = initial.turn();
    let mut tokens = Vec::with_capacity(moves.len() * 3 / 2);

    for (i, mv) in moves.iter().enumerate() {
        match turn {
            Color::White => tokens.push(format!("{number}. {}", mv.san)),
            Color::Black => {
                if i == 0 {
                    tokens.push(format!("{number}... {}", mv.san));
                } else {
                    tokens.push(mv.san.clone());
                }
                number += 1;
            }
        }
        turn = !turn;
    }

    tokens.join(" ")
}
