//! FEN handling at the edges of the rules engine.
//!
//! Positions travel between the session and the remote services as FEN
//! strings. The two rewrites here work on the string itself so that every
//! field they do not touch survives byte for byte.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position, Setup};

use crate::error::PositionError;
use crate::model::PlayedMove;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const SIDE_FIELD: usize = 1;
const EP_FIELD: usize = 3;

/// Read the side-to-move field.
pub fn side_to_move(fen: &str) -> Result<Color, PositionError> {
    match fen.split(' ').nth(SIDE_FIELD) {
        Some("w") => Ok(Color::White),
        Some("b") => Ok(Color::Black),
        _ => Err(PositionError::Malformed(format!("no side to move in '{fen}'"))),
    }
}

/// Swap `w` and `b` in the side-to-move field and leave everything else alone.
pub fn flip_side_to_move(fen: &str) -> Result<String, PositionError> {
    let mut fields: Vec<&str> = fen.split(' ').collect();
    let flipped = match fields.get(SIDE_FIELD) {
        Some(&"w") => "b",
        Some(&"b") => "w",
        _ => return Err(PositionError::Malformed(format!("no side to move in '{fen}'"))),
    };
    fields[SIDE_FIELD] = flipped;
    Ok(fields.join(" "))
}

/// Rewrite a FEN the cloud evaluation did not recognise into the form its
/// index uses: an explicit `-` in the en-passant slot.
///
/// Returns `None` when the string already has that form, in which case there
/// is nothing different to retry with.
pub fn normalize_for_eval_lookup(fen: &str) -> Option<String> {
    let mut fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < EP_FIELD {
        return None;
    }
    match fields.get(EP_FIELD) {
        Some(&"-") => return None,
        Some(field) if is_square(field) => fields[EP_FIELD] = "-",
        // Missing entirely, or the slot holds the halfmove clock.
        _ => fields.insert(EP_FIELD, "-"),
    }
    Some(fields.join(" "))
}

fn is_square(field: &str) -> bool {
    let bytes = field.as_bytes();
    bytes.len() == 2 && (b'a'..=b'h').contains(&bytes[0]) && (b'1'..=b'8').contains(&bytes[1])
}

/// Parse a FEN into a playable position.
///
/// Castling rights and en-passant squares that no longer match the board
/// (typical after free placement) are dropped instead of rejected.
pub fn parse_position(fen: &str) -> Result<Chess, PositionError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|e| PositionError::Malformed(format!("{e}: '{fen}'")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .or_else(|e| e.ignore_invalid_castling_rights())
        .or_else(|e| e.ignore_invalid_ep_square())
        .map_err(|e| PositionError::Illegal(e.to_string()))
}

/// FEN of a position, with an en-passant square only when the capture is legal.
pub fn position_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// FEN of a free-form setup. Fields that contradict the board (castling
/// rights without their rook, say) are dropped rather than refused.
pub fn setup_fen(setup: &Setup) -> String {
    Fen::try_from_setup(setup.clone())
        .unwrap_or_else(|e| e.ignore())
        .to_string()
}

/// Play a legal move and describe it the way the board and the move record
/// want it: king-to-destination squares for castling, SAN with check marks.
pub fn play_move(pos: &mut Chess, mv: Move) -> PlayedMove {
    let uci = mv.to_uci(CastlingMode::Standard);
    let (from, to) = match &uci {
        UciMove::Normal { from, to, .. } => (*from, *to),
        _ => (mv.from().unwrap_or_else(|| mv.to()), mv.to()),
    };
    let san = SanPlus::from_move_and_play_unchecked(pos, mv).to_string();
    PlayedMove { from, to, san, uci }
}
