//! Training-session state machine.
//!
//! ```text
//! Setup ──start──▶ AwaitingUserMove ◀──────────────┐
//!   │                   │ submit_user_move          │ reply, enough games
//!   └──start──▶ AwaitingOpponentMove ───────────────┘
//!                       │ novelty, rare reply, game over
//!                       ▼
//!                      Done
//! ```
//!
//! Transitions never await. Whenever the opponent has to reply the session
//! hands out an [`OpponentRequest`]; the caller runs the resolver with it
//! and reports back through [`Session::opponent_resolution_completes`] or
//! [`Session::opponent_resolution_failed`]. Only one request is outstanding
//! at a time and answers to superseded requests are refused.

use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Move, Piece, Position, Role, Setup, Square};
use tracing::{debug, info, warn};

use crate::board::BoardView;
use crate::error::{PositionError, SessionError};
use crate::model::{Filters, PlayedMove, SessionConfig};
use crate::position::{
    flip_side_to_move, parse_position, play_move, position_fen, setup_fen, side_to_move,
};
use crate::record::move_record;
use crate::resolver::Resolution;

pub const SETUP_MESSAGE: &str = "Make moves on the chessboard to set starting position.";
pub const YOUR_TURN_MESSAGE: &str = "It is your turn!";
pub const LOADING_MESSAGE: &str = "Loading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Pieces can be dragged anywhere; nothing is checked.
    Setup,
    AwaitingUserMove,
    AwaitingOpponentMove,
    Done,
}

/// Everything the resolver needs for one opponent turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpponentRequest {
    id: u64,
    pub fen: String,
    pub filters: Filters,
}

/// What the caller has to do after a transition.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    UserToMove,
    /// Run the resolver for this request and report the result back.
    OpponentToMove(OpponentRequest),
    /// The user's move was illegal; nothing changed.
    Rejected,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpponentSlot {
    Idle,
    Pending(u64),
    /// A lookup failed; only `reset` gets the session going again.
    Stalled,
}

/// Position and history of a started session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub position: Chess,
    pub initial_position: Chess,
    pub move_history: Vec<PlayedMove>,
    pub last_move: Option<PlayedMove>,
}

impl SessionState {
    fn new(initial_position: Chess) -> Self {
        Self {
            position: initial_position.clone(),
            initial_position,
            move_history: Vec::new(),
            last_move: None,
        }
    }

    fn push(&mut self, played: PlayedMove) {
        self.last_move = Some(played.clone());
        self.move_history.push(played);
    }
}

#[derive(Debug, Clone)]
struct Active {
    config: SessionConfig,
    state: SessionState,
}

#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    setup: Setup,
    active: Option<Active>,
    message: String,
    opponent: OpponentSlot,
    next_request_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session in `Setup` with the standard starting position.
    pub fn new() -> Self {
        Self {
            phase: Phase::Setup,
            setup: Setup::initial(),
            active: None,
            message: SETUP_MESSAGE.to_string(),
            opponent: OpponentSlot::Idle,
            next_request_id: 1,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `None` until the session is started.
    pub fn config(&self) -> Option<&SessionConfig> {
        self.active.as_ref().map(|a| &a.config)
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.active.as_ref().map(|a| &a.state)
    }

    /// Current position: the free-form setup before start, the game afterwards.
    pub fn fen(&self) -> String {
        match &self.active {
            Some(active) => position_fen(&active.state.position),
            None => setup_fen(&self.setup),
        }
    }

    pub fn initial_fen(&self) -> Option<String> {
        self.state().map(|s| position_fen(&s.initial_position))
    }

    pub fn move_record(&self) -> Option<String> {
        self.state()
            .map(|s| move_record(&s.initial_position, &s.move_history))
    }

    /// True when the last opponent lookup failed and only `reset` helps.
    pub fn is_stalled(&self) -> bool {
        self.opponent == OpponentSlot::Stalled
    }

    pub fn board_view(&self) -> BoardView {
        BoardView::of(self)
    }

    // ---------------------------------------------------------------------
    // Setup editing
    // ---------------------------------------------------------------------

    /// Drag a piece during setup. Whatever stood on `to` is replaced.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Result<(), SessionError> {
        self.expect_phase(Phase::Setup)?;
        let piece = self
            .setup
            .board
            .remove_piece_at(from)
            .ok_or(SessionError::EmptySquare(from))?;
        self.setup.board.set_piece_at(to, piece);
        debug!(%from, %to, "Setup piece moved");
        Ok(())
    }

    pub fn put_piece(&mut self, square: Square, piece: Piece) -> Result<(), SessionError> {
        self.expect_phase(Phase::Setup)?;
        self.setup.board.set_piece_at(square, piece);
        Ok(())
    }

    pub fn remove_piece(&mut self, square: Square) -> Result<Option<Piece>, SessionError> {
        self.expect_phase(Phase::Setup)?;
        Ok(self.setup.board.remove_piece_at(square))
    }

    /// Replace the setup with an arbitrary FEN.
    pub fn load_setup(&mut self, fen: &str) -> Result<(), SessionError> {
        self.expect_phase(Phase::Setup)?;
        let parsed: Fen = fen
            .parse()
            .map_err(|e| PositionError::Malformed(format!("{e}: '{fen}'")))?;
        self.setup = parsed.into_setup();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------------

    /// Freeze `config` and begin play from the setup position.
    pub fn start(&mut self, config: SessionConfig) -> Result<Step, SessionError> {
        self.expect_phase(Phase::Setup)?;
        if !config.filters.is_complete() {
            return Err(SessionError::EmptyFilters);
        }

        let mut fen = setup_fen(&self.setup);
        if side_to_move(&fen)? != config.starting_color {
            fen = flip_side_to_move(&fen)?;
        }
        let initial = parse_position(&fen)?;

        info!(
            fen = %position_fen(&initial),
            user = ?config.user_color,
            threshold = config.total_games_threshold,
            "Session started"
        );
        self.active = Some(Active {
            config,
            state: SessionState::new(initial),
        });
        self.opponent = OpponentSlot::Idle;
        self.enter_turn()
    }

    /// Play the user's move. Promotions default to a queen.
    pub fn submit_user_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Result<Step, SessionError> {
        self.expect_phase(Phase::AwaitingUserMove)?;
        let phase = self.phase;
        let active = self
            .active
            .as_mut()
            .ok_or(SessionError::WrongPhase { actual: phase })?;

        let Some(mv) = find_user_move(&active.state.position, from, to, promotion) else {
            debug!(%from, %to, "Illegal user move rejected");
            return Ok(Step::Rejected);
        };

        let played = play_move(&mut active.state.position, mv);
        info!(san = %played.san, "User move");
        active.state.push(played);
        self.enter_turn()
    }

    /// Hand out the request for the pending opponent turn.
    ///
    /// Fails while another request is outstanding or after a failed lookup.
    pub fn opponent_request(&mut self) -> Result<OpponentRequest, SessionError> {
        self.expect_phase(Phase::AwaitingOpponentMove)?;
        match self.opponent {
            OpponentSlot::Pending(_) => return Err(SessionError::OpponentPending),
            OpponentSlot::Stalled => return Err(SessionError::Stalled),
            OpponentSlot::Idle => {}
        }

        let request = {
            let active = self.active_ref()?;
            OpponentRequest {
                id: self.next_request_id,
                fen: position_fen(&active.state.position),
                filters: active.config.filters.clone(),
            }
        };
        self.next_request_id += 1;
        self.opponent = OpponentSlot::Pending(request.id);
        debug!(id = request.id, fen = %request.fen, "Opponent request issued");
        Ok(request)
    }

    /// Apply the resolver's answer to `request`.
    pub fn opponent_resolution_completes(
        &mut self,
        request: &OpponentRequest,
        resolution: Resolution,
    ) -> Result<Step, SessionError> {
        self.expect_outstanding(request)?;
        self.opponent = OpponentSlot::Idle;

        let (evaluation, reply, total_games, probability) = match resolution {
            Resolution::Novelty { evaluation } => {
                info!(%evaluation, "Novelty reached");
                self.finish(format!("Eval: {evaluation}; this is a novelty"));
                return Ok(Step::Finished);
            }
            Resolution::Move {
                evaluation,
                mv,
                total_games,
                probability,
            } => (evaluation, mv, total_games, probability),
        };

        let phase = self.phase;
        let active = self
            .active
            .as_mut()
            .ok_or(SessionError::WrongPhase { actual: phase })?;
        let Ok(mv) = reply.uci.to_move(&active.state.position) else {
            warn!(san = %reply.san, "Opponent reply is not legal in the session position");
            self.opponent = OpponentSlot::Stalled;
            self.message = format!("Opponent reply {} is not legal here", reply.san);
            return Err(SessionError::IllegalOpponentMove { san: reply.san });
        };
        let played = play_move(&mut active.state.position, mv);
        let summary = format!(
            "Eval: {evaluation}; made move {} ({total_games} positions, probability {:.2}%).",
            played.san,
            probability * 100.0
        );
        info!(san = %played.san, games = total_games, "Opponent move");
        active.state.push(played);

        let threshold = active.config.total_games_threshold;
        let record = move_record(&active.state.initial_position, &active.state.move_history);
        let game_over = game_over_note(&active.state.position);

        if total_games < threshold {
            info!(games = total_games, threshold, "Reply below games threshold");
            self.finish(format!("{summary} Training is over. PGN: {record}"));
            return Ok(Step::Finished);
        }
        if let Some(note) = game_over {
            self.finish(format!("{summary} {note}. PGN: {record}"));
            return Ok(Step::Finished);
        }

        self.phase = Phase::AwaitingUserMove;
        self.message = summary;
        Ok(Step::UserToMove)
    }

    /// Record a failed lookup. The session stays waiting for the opponent
    /// until it is reset.
    pub fn opponent_resolution_failed(
        &mut self,
        request: &OpponentRequest,
        error: &dyn std::error::Error,
    ) -> Result<(), SessionError> {
        self.expect_outstanding(request)?;
        warn!(id = request.id, %error, "Opponent lookup failed");
        self.opponent = OpponentSlot::Stalled;
        self.message = format!("Error: {error}");
        Ok(())
    }

    /// Back to the initial position of this session.
    pub fn reset(&mut self) -> Result<Step, SessionError> {
        let phase = self.phase;
        let active = self
            .active
            .as_mut()
            .ok_or(SessionError::WrongPhase { actual: phase })?;
        active.state = SessionState::new(active.state.initial_position.clone());
        self.opponent = OpponentSlot::Idle;
        info!("Session reset");
        self.enter_turn()
    }

    /// Throw the session away and go back to editing the standard position.
    pub fn new_game(&mut self) {
        let next_request_id = self.next_request_id;
        *self = Self::new();
        self.next_request_id = next_request_id;
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn expect_phase(&self, expected: Phase) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::WrongPhase { actual: self.phase })
        }
    }

    /// Any answer but the one to the pending request is stale, whatever the
    /// phase the session has moved on to.
    fn expect_outstanding(&self, request: &OpponentRequest) -> Result<(), SessionError> {
        if self.phase == Phase::AwaitingOpponentMove
            && self.opponent == OpponentSlot::Pending(request.id)
        {
            Ok(())
        } else {
            Err(SessionError::StaleRequest)
        }
    }

    fn active_ref(&self) -> Result<&Active, SessionError> {
        self.active
            .as_ref()
            .ok_or(SessionError::WrongPhase { actual: self.phase })
    }

    /// Decide who moves next from the current position.
    fn enter_turn(&mut self) -> Result<Step, SessionError> {
        let (turn, opponent, game_over, record) = {
            let active = self.active_ref()?;
            let pos = &active.state.position;
            (
                pos.turn(),
                active.config.opponent_color(),
                game_over_note(pos),
                move_record(&active.state.initial_position, &active.state.move_history),
            )
        };

        if let Some(note) = game_over {
            self.finish(format!("{note}. Training is over. PGN: {record}"));
            return Ok(Step::Finished);
        }

        if turn == opponent {
            self.phase = Phase::AwaitingOpponentMove;
            self.message = LOADING_MESSAGE.to_string();
            Ok(Step::OpponentToMove(self.opponent_request()?))
        } else {
            self.phase = Phase::AwaitingUserMove;
            self.message = YOUR_TURN_MESSAGE.to_string();
            Ok(Step::UserToMove)
        }
    }

    fn finish(&mut self, message: String) {
        self.phase = Phase::Done;
        self.message = message;
        info!(message = %self.message, "Session done");
    }
}

fn find_user_move(pos: &Chess, from: Square, to: Square, promotion: Option<Role>) -> Option<Move> {
    let wanted = promotion.unwrap_or(Role::Queen);
    pos.legal_moves().into_iter().find(|m| {
        let by_king_destination = match m.to_uci(CastlingMode::Standard) {
            UciMove::Normal {
                from: f,
                to: t,
                promotion: p,
            } => f == from && t == to && p.map_or(true, |r| r == wanted),
            _ => false,
        };
        // Castling may also be dragged king-onto-rook.
        by_king_destination || (m.is_castle() && m.from() == Some(from) && m.to() == to)
    })
}

fn game_over_note(pos: &Chess) -> Option<&'static str> {
    if pos.is_checkmate() {
        Some("Checkmate")
    } else if pos.is_stalemate() {
        Some("Stalemate")
    } else if pos.is_insufficient_material() {
        Some("Insufficient material")
    } else {
        None
    }
}
