use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shakmaty::{Color, Piece, Role, Square};
use trainer_core::model::color_serde;
use trainer_core::session::Phase;
use trainer_core::{
    BoardView, Filters, RatingBand, Session, SessionConfig, SessionError, Speed, Step,
};

use crate::error::AppError;
use crate::state::AppState;

/// Everything the page needs to render the session.
#[derive(Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub message: String,
    pub stalled: bool,
    pub board: BoardView,
    pub config: Option<SessionConfig>,
    pub initial_fen: Option<String>,
    pub moves: Vec<String>,
    pub pgn: Option<String>,
}

impl SessionView {
    fn of(session: &Session) -> Self {
        Self {
            phase: session.phase(),
            message: session.message().to_string(),
            stalled: session.is_stalled(),
            board: session.board_view(),
            config: session.config().cloned(),
            initial_fen: session.initial_fen(),
            moves: session
                .state()
                .map(|s| s.move_history.iter().map(|m| m.san.clone()).collect())
                .unwrap_or_default(),
            pgn: session.move_record(),
        }
    }
}

#[derive(Deserialize)]
pub struct MoveBody {
    pub from: String,
    pub to: String,
    /// Piece letter for promotions; queen when omitted.
    pub promotion: Option<String>,
}

#[derive(Deserialize)]
pub struct PutBody {
    pub square: String,
    /// FEN letter: uppercase for White, lowercase for Black.
    pub piece: String,
}

#[derive(Deserialize)]
pub struct RemoveBody {
    pub square: String,
}

#[derive(Deserialize)]
pub struct SetupBody {
    pub fen: String,
}

#[derive(Deserialize)]
pub struct StartBody {
    #[serde(with = "color_serde")]
    pub user_color: Color,
    #[serde(with = "color_serde")]
    pub starting_color: Color,
    pub speeds: Vec<Speed>,
    pub ratings: Vec<RatingBand>,
    pub total_games_threshold: Option<u64>,
}

/// GET /api/session
pub async fn get_session(Extension(state): Extension<AppState>) -> Json<SessionView> {
    Json(current_view(&state).await)
}

/// PUT /api/session/setup
/// Replace the setup position with a FEN.
pub async fn load_setup(
    Extension(state): Extension<AppState>,
    Json(body): Json<SetupBody>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.load_setup(&body.fen)?;
    Ok(Json(SessionView::of(&session)))
}

/// POST /api/session/setup/move
/// Drag a piece anywhere while setting up.
pub async fn move_piece(
    Extension(state): Extension<AppState>,
    Json(body): Json<MoveBody>,
) -> Result<Json<SessionView>, AppError> {
    let from = parse_square(&body.from)?;
    let to = parse_square(&body.to)?;
    let mut session = state.session.lock().await;
    session.move_piece(from, to)?;
    Ok(Json(SessionView::of(&session)))
}

/// POST /api/session/setup/put
pub async fn put_piece(
    Extension(state): Extension<AppState>,
    Json(body): Json<PutBody>,
) -> Result<Json<SessionView>, AppError> {
    let square = parse_square(&body.square)?;
    let piece = parse_piece(&body.piece)?;
    let mut session = state.session.lock().await;
    session.put_piece(square, piece)?;
    Ok(Json(SessionView::of(&session)))
}

/// POST /api/session/setup/remove
pub async fn remove_piece(
    Extension(state): Extension<AppState>,
    Json(body): Json<RemoveBody>,
) -> Result<Json<SessionView>, AppError> {
    let square = parse_square(&body.square)?;
    let mut session = state.session.lock().await;
    session.remove_piece(square)?;
    Ok(Json(SessionView::of(&session)))
}

/// POST /api/session/start
/// Freeze the configuration and begin. Answers the opponent's first move
/// before returning when the opponent starts.
pub async fn start(
    Extension(state): Extension<AppState>,
    Json(body): Json<StartBody>,
) -> Result<Json<SessionView>, AppError> {
    let config = SessionConfig {
        user_color: body.user_color,
        starting_color: body.starting_color,
        filters: Filters::new(body.speeds, body.ratings),
        total_games_threshold: body
            .total_games_threshold
            .unwrap_or(state.default_games_threshold),
    };

    let step = state.session.lock().await.start(config)?;
    answer_opponent(&state, step).await?;
    Ok(Json(current_view(&state).await))
}

/// POST /api/session/move
/// Play the user's move and the opponent's reply. Illegal moves are ignored.
pub async fn submit_move(
    Extension(state): Extension<AppState>,
    Json(body): Json<MoveBody>,
) -> Result<Json<SessionView>, AppError> {
    let from = parse_square(&body.from)?;
    let to = parse_square(&body.to)?;
    let promotion = body.promotion.as_deref().map(parse_role).transpose()?;

    let step = state
        .session
        .lock()
        .await
        .submit_user_move(from, to, promotion)?;
    answer_opponent(&state, step).await?;
    Ok(Json(current_view(&state).await))
}

/// POST /api/session/reset
pub async fn reset(Extension(state): Extension<AppState>) -> Result<Json<SessionView>, AppError> {
    let step = state.session.lock().await.reset()?;
    answer_opponent(&state, step).await?;
    Ok(Json(current_view(&state).await))
}

/// POST /api/session/new
/// Discard the session and go back to setup.
pub async fn new_game(Extension(state): Extension<AppState>) -> Json<SessionView> {
    let mut session = state.session.lock().await;
    session.new_game();
    Json(SessionView::of(&session))
}

/// Run the resolver for a pending opponent turn and feed the result back.
///
/// The session lock is released while the lookups are in flight.
async fn answer_opponent(state: &AppState, step: Step) -> Result<(), AppError> {
    let Step::OpponentToMove(request) = step else {
        return Ok(());
    };

    let outcome = state.resolver.resolve(&request.fen, &request.filters).await;

    let mut session = state.session.lock().await;
    match outcome {
        Ok(resolution) => {
            let applied = session.opponent_resolution_completes(&request, resolution);
            ignore_stale(applied.map(|_| ()))
        }
        Err(e) => match session.opponent_resolution_failed(&request, &e) {
            // Recorded: the session is stalled and the caller hears why.
            Ok(()) => Err(e.into()),
            other => ignore_stale(other),
        },
    }
}

fn ignore_stale(result: Result<(), SessionError>) -> Result<(), AppError> {
    match result {
        Err(SessionError::StaleRequest) => {
            tracing::info!("Opponent reply arrived after a reset; dropped");
            Ok(())
        }
        other => other.map_err(AppError::from),
    }
}

async fn current_view(state: &AppState) -> SessionView {
    SessionView::of(&*state.session.lock().await)
}

fn parse_square(name: &str) -> Result<Square, AppError> {
    name.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid square: {name}")))
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_piece(text: &str) -> Result<Piece, AppError> {
    single_char(text)
        .and_then(Piece::from_char)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid piece: {text}")))
}

fn parse_role(text: &str) -> Result<Role, AppError> {
    single_char(text)
        .and_then(|c| Role::from_char(c.to_ascii_lowercase()))
        .filter(|role| !matches!(role, Role::Pawn | Role::King))
        .ok_or_else(|| AppError::BadRequest(format!("Invalid promotion: {text}")))
}
