//! End-to-end training lines: session, resolver and sampler together,
//! with the remote lookups replaced by an in-memory book.

mod common;

use common::{placement, row, FakeEval, FakeStats, AFTER_E4, AFTER_E4_C5_NF3};
use shakmaty::{Color, Square};
use trainer_core::position::STANDARD_START_FEN;
use trainer_core::{
    Evaluation, Filters, LookupError, OpponentResolver, Phase, RatingBand, ResolveError, Session,
    SessionConfig, SessionError, Speed, Step,
};

fn config(user_color: Color, starting_color: Color) -> SessionConfig {
    SessionConfig {
        user_color,
        starting_color,
        ..SessionConfig::default()
    }
}

/// Resolve the opponent turn, if there is one, and feed the answer back.
async fn answer(session: &mut Session, resolver: &OpponentResolver, step: Step) -> Step {
    match step {
        Step::OpponentToMove(request) => {
            let resolution = resolver
                .resolve(&request.fen, &request.filters)
                .await
                .expect("resolve");
            session
                .opponent_resolution_completes(&request, resolution)
                .expect("completes")
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Full lines
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_line_runs_until_reply_is_too_rare() {
    let eval = FakeEval::scoring(Evaluation::Centipawns(30));
    let stats = FakeStats::new()
        .with(AFTER_E4, vec![row("c5", 500, 100, 400)])
        .with(AFTER_E4_C5_NF3, vec![row("d6", 30, 5, 5), row("Nc6", 0, 0, 0)]);
    let resolver = common::resolver(eval, stats);
    let mut session = Session::new();

    let step = session.start(SessionConfig::default()).unwrap();
    assert_eq!(step, Step::UserToMove);
    assert_eq!(session.message(), "It is your turn!");

    let step = session.submit_user_move(Square::E2, Square::E4, None).unwrap();
    let Step::OpponentToMove(request) = &step else {
        panic!("expected an opponent turn, got {step:?}");
    };
    assert_eq!(request.fen, AFTER_E4);
    assert_eq!(session.phase(), Phase::AwaitingOpponentMove);
    assert_eq!(session.message(), "Loading...");

    let step = answer(&mut session, &resolver, step).await;
    assert_eq!(step, Step::UserToMove);
    assert_eq!(
        session.message(),
        "Eval: 0.30; made move c5 (1000 positions, probability 100.00%)."
    );

    let step = session.submit_user_move(Square::G1, Square::F3, None).unwrap();
    let Step::OpponentToMove(request) = &step else {
        panic!("expected an opponent turn, got {step:?}");
    };
    assert_eq!(request.fen, AFTER_E4_C5_NF3);

    let step = answer(&mut session, &resolver, step).await;
    assert_eq!(step, Step::Finished);
    assert_eq!(session.phase(), Phase::Done);
    assert_eq!(
        session.message(),
        "Eval: 0.30; made move d6 (40 positions, probability 100.00%). \
         Training is over. PGN: 1. e4 c5 2. Nf3 d6"
    );
    assert_eq!(session.move_record().unwrap(), "1. e4 c5 2. Nf3 d6");
}

#[tokio::test]
async fn test_opponent_opens_when_user_plays_black() {
    let eval = FakeEval::scoring(Evaluation::Centipawns(20));
    let stats = FakeStats::new().with(
        STANDARD_START_FEN,
        vec![row("e4", 600, 100, 300), row("d4", 0, 0, 0)],
    );
    let resolver = common::resolver(eval, stats);
    let mut session = Session::new();

    let step = session.start(config(Color::Black, Color::White)).unwrap();
    let Step::OpponentToMove(request) = &step else {
        panic!("expected an opponent turn, got {step:?}");
    };
    assert_eq!(request.fen, STANDARD_START_FEN);

    let step = answer(&mut session, &resolver, step).await;
    assert_eq!(step, Step::UserToMove);

    let board = session.board_view();
    assert_eq!(board.orientation, Color::Black);
    assert_eq!(board.last_move, Some(["e2".to_string(), "e4".to_string()]));
    assert!(board.interactive);
    assert!(board.dests.contains_key("e7"));
}

#[tokio::test]
async fn test_flipped_start_gives_black_the_first_move() {
    let eval = FakeEval::scoring(Evaluation::Centipawns(-10));
    let stats = FakeStats::new().with(STANDARD_START_FEN, vec![row("e5", 50, 100, 50)]);
    let resolver = common::resolver(eval, stats);
    let mut session = Session::new();

    let step = session.start(config(Color::White, Color::Black)).unwrap();
    let Step::OpponentToMove(request) = &step else {
        panic!("expected an opponent turn, got {step:?}");
    };
    let flipped = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1";
    assert_eq!(request.fen, flipped);
    assert_eq!(session.initial_fen().unwrap(), flipped);

    let step = answer(&mut session, &resolver, step).await;
    assert_eq!(step, Step::UserToMove);
    assert_eq!(
        session.move_record().unwrap(),
        format!("[SetUp \"1\"]\n[FEN \"{flipped}\"]\n\n1... e5")
    );
}

#[tokio::test]
async fn test_unknown_position_is_a_novelty() {
    let eval = FakeEval::scoring(Evaluation::Centipawns(30));
    let resolver = common::resolver(eval, FakeStats::new());
    let mut session = Session::new();

    let _ = session.start(SessionConfig::default()).unwrap();
    let step = session.submit_user_move(Square::E2, Square::E4, None).unwrap();
    let step = answer(&mut session, &resolver, step).await;

    assert_eq!(step, Step::Finished);
    assert_eq!(session.phase(), Phase::Done);
    assert_eq!(session.message(), "Eval: 0.30; this is a novelty");
    assert_eq!(session.move_record().unwrap(), "1. e4");
}

#[tokio::test]
async fn test_mating_reply_ends_the_line() {
    let after_f3 = "rnbqkbnr/pppppppp/8/8/8/5P2/PPPPP1PP/RNBQKBNR b KQkq - 0 1";
    let after_g4 = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";
    let eval = FakeEval::scoring(Evaluation::Mate(-1));
    let stats = FakeStats::new()
        .with(after_f3, vec![row("e5", 300, 100, 600)])
        .with(after_g4, vec![row("Qh4#", 0, 0, 500)]);
    let resolver = common::resolver(eval, stats);
    let mut session = Session::new();

    let _ = session.start(SessionConfig::default()).unwrap();
    let step = session.submit_user_move(Square::F2, Square::F3, None).unwrap();
    assert_eq!(answer(&mut session, &resolver, step).await, Step::UserToMove);
    let step = session.submit_user_move(Square::G2, Square::G4, None).unwrap();
    assert_eq!(answer(&mut session, &resolver, step).await, Step::Finished);

    assert_eq!(session.phase(), Phase::Done);
    assert!(session.message().starts_with("Eval: #-1; made move Qh4#"));
    assert!(session
        .message()
        .ends_with("Checkmate. PGN: 1. f3 e5 2. g4 Qh4#"));
    assert!(session.board_view().check);
}

#[tokio::test]
async fn test_filters_reach_the_statistics_lookup() {
    let eval = FakeEval::scoring(Evaluation::Centipawns(0));
    let stats = FakeStats::new();
    let resolver = common::resolver(eval, stats.clone());
    let mut session = Session::new();

    let filters = Filters::new([Speed::Blitz], [RatingBand::R2000, RatingBand::R2200]);
    let step = session
        .start(SessionConfig {
            filters: filters.clone(),
            ..SessionConfig::default()
        })
        .unwrap();
    assert_eq!(step, Step::UserToMove);

    let step = session.submit_user_move(Square::D2, Square::D4, None).unwrap();
    let _ = answer(&mut session, &resolver, step).await;

    assert_eq!(*stats.last_filters.lock().unwrap(), Some(filters));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_failed_lookup_stalls_until_reset() {
    let eval = FakeEval::scoring(Evaluation::Centipawns(30));
    eval.set_answer(Err(LookupError::Transport("connection refused".into())));
    let stats = FakeStats::new().with(AFTER_E4, vec![row("c5", 500, 100, 400)]);
    let resolver = common::resolver(eval.clone(), stats);
    let mut session = Session::new();

    let _ = session.start(SessionConfig::default()).unwrap();
    let Step::OpponentToMove(request) =
        session.submit_user_move(Square::E2, Square::E4, None).unwrap()
    else {
        panic!("expected an opponent turn");
    };

    let err = resolver
        .resolve(&request.fen, &request.filters)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Evaluation(LookupError::Transport(_))));
    session.opponent_resolution_failed(&request, &err).unwrap();

    assert!(session.is_stalled());
    assert!(session.message().starts_with("Error: "));
    assert_eq!(session.opponent_request(), Err(SessionError::Stalled));
    assert!(matches!(
        session.submit_user_move(Square::D2, Square::D4, None),
        Err(SessionError::WrongPhase { .. })
    ));

    eval.set_answer(Ok(Evaluation::Centipawns(30)));
    assert_eq!(session.reset().unwrap(), Step::UserToMove);
    assert!(!session.is_stalled());
    assert_eq!(session.fen(), STANDARD_START_FEN);

    let step = session.submit_user_move(Square::E2, Square::E4, None).unwrap();
    assert_eq!(answer(&mut session, &resolver, step).await, Step::UserToMove);
}

#[tokio::test]
async fn test_missing_evaluation_is_not_retried_without_en_passant() {
    let eval = FakeEval::scoring(Evaluation::Centipawns(0));
    eval.set_answer(Err(LookupError::NotFound));
    let stats = FakeStats::new().with(AFTER_E4, vec![row("c5", 5, 0, 5)]);
    let resolver = common::resolver(eval.clone(), stats);

    let err = resolver
        .resolve(AFTER_E4, &Filters::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ResolveError::EvaluationNotFound {
            fen: AFTER_E4.to_string()
        }
    );
    assert_eq!(eval.calls(), 1);
}

#[tokio::test]
async fn test_reply_to_a_superseded_request_is_refused() {
    let eval = FakeEval::scoring(Evaluation::Centipawns(30));
    let stats = FakeStats::new().with(AFTER_E4, vec![row("c5", 500, 100, 400)]);
    let resolver = common::resolver(eval, stats);
    let mut session = Session::new();

    let _ = session.start(SessionConfig::default()).unwrap();
    let Step::OpponentToMove(request) =
        session.submit_user_move(Square::E2, Square::E4, None).unwrap()
    else {
        panic!("expected an opponent turn");
    };
    let resolution = resolver
        .resolve(&request.fen, &request.filters)
        .await
        .unwrap();

    // The user resets while the lookups are in flight.
    assert_eq!(session.reset().unwrap(), Step::UserToMove);

    assert_eq!(
        session.opponent_resolution_completes(&request, resolution),
        Err(SessionError::StaleRequest)
    );
    assert_eq!(session.phase(), Phase::AwaitingUserMove);
    assert_eq!(placement(&session.fen()), placement(STANDARD_START_FEN));
}
