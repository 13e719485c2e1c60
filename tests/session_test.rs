//! Tests for the session state machine.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{click, FakeService, MemoryStore, Reply};
use shakmaty::{Color, Square};
use strictly_chess::{
    AgentTurnRunner, BoardProjection, ChessMove, FsRecordStore, GameConfig, GameSession, GameStatus,
    InteractionController, InteractionEvent, MoveDisposition, MoveNegotiator, NegotiationOutcome,
    OutcomeKind, PendingSuggestion, Position, PromotionPiece, RecordHeaders, RejectReason, ScreenPos,
    SessionOutcome, SessionRecorder, SessionState, Side, MAX_SQUARE_SIZE,
};

const FOOLS_MATE_BLACK_TO_MOVE: &str =
    "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";
const FOOLS_MATE_FINAL: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";

fn session_with(position: Position, human: Color, store: &MemoryStore) -> GameSession {
    let projection = BoardProjection::new(ScreenPos::new(0, 0), 6, 3, human);
    let controller = InteractionController::new(projection, PromotionPiece::Queen);
    let recorder = SessionRecorder::new(
        RecordHeaders::new("2026.10.16", "Player", "AI"),
        None,
        Box::new(store.clone()),
    );
    GameSession::new(position, human, controller, recorder)
}

fn negotiator(service: &FakeService) -> MoveNegotiator {
    MoveNegotiator::new(Arc::new(service.clone()), Duration::from_secs(1))
}

fn mv(uci: &str) -> ChessMove {
    uci.parse().expect("valid uci")
}

#[test]
fn test_human_press_press_move_is_applied_and_persisted() {
    let store = MemoryStore::new();
    let mut session = session_with(Position::new(), Color::White, &store);
    let projection = *session.projection();

    assert_eq!(session.state(), &SessionState::AwaitingHumanMove);
    assert_eq!(
        session.pointer_down(click(&projection, Square::E2)),
        InteractionEvent::SelectionChanged
    );
    let event = session.pointer_down(click(&projection, Square::E4));

    assert_eq!(event, InteractionEvent::MoveAttempted(mv("e2e4")));
    assert_eq!(session.record().len(), 1);
    assert_eq!(session.record().moves()[0].san(), "e4");
    assert_eq!(session.state(), &SessionState::AwaitingAgentMove);
    assert_eq!(session.side_to_move(), Side::Agent);
    assert_eq!(store.write_count(), 1);
    assert_eq!(session.recorder().persisted(), 1);
}

#[test]
fn test_human_drag_move_is_applied() {
    let store = MemoryStore::new();
    let mut session = session_with(Position::new(), Color::White, &store);
    let projection = *session.projection();

    session.pointer_down(click(&projection, Square::G1));
    session.pointer_move(ScreenPos::new(40, 16));
    let event = session.pointer_up(click(&projection, Square::F3));

    assert_eq!(event, InteractionEvent::MoveAttempted(mv("g1f3")));
    assert_eq!(session.record().moves()[0].san(), "Nf3");
}

#[test]
fn test_illegal_human_move_changes_nothing() {
    let store = MemoryStore::new();
    let mut session = session_with(Position::new(), Color::White, &store);
    let before = session.position().fen();

    assert_eq!(session.attempt_move(mv("e2e5")), MoveDisposition::Ignored);

    assert_eq!(session.position().fen(), before);
    assert!(session.record().is_empty());
    assert_eq!(store.write_count(), 0);
    assert_eq!(session.state(), &SessionState::AwaitingHumanMove);
}

#[test]
fn test_pointer_input_ignored_during_agent_turn() {
    let store = MemoryStore::new();
    let mut session = session_with(Position::new(), Color::Black, &store);
    let projection = *session.projection();

    assert_eq!(session.state(), &SessionState::AwaitingAgentMove);
    assert_eq!(
        session.pointer_down(click(&projection, Square::E7)),
        InteractionEvent::NoOp
    );
    assert_eq!(session.attempt_move(mv("e2e4")), MoveDisposition::Ignored);
    assert!(session.record().is_empty());
}

#[tokio::test]
async fn test_agent_accepted_move_is_applied() {
    let store = MemoryStore::new();
    let service = FakeService::text("e7e5");
    let mut session = session_with(Position::new(), Color::White, &store);
    session.attempt_move(mv("e2e4"));

    let disposition = session.play_agent_turn(&negotiator(&service)).await;

    assert_eq!(disposition, MoveDisposition::Applied);
    assert_eq!(service.calls(), 1);
    assert_eq!(session.record().len(), 2);
    assert_eq!(session.state(), &SessionState::AwaitingHumanMove);
    assert_eq!(store.write_count(), 2);
    assert!(store.last_contents().expect("written").contains("1. e4 e5 *"));
}

#[tokio::test]
async fn test_agent_illegal_move_aborts_session() {
    let store = MemoryStore::new();
    let service = FakeService::text("e2e4");
    let mut session = session_with(Position::new(), Color::White, &store);
    session.attempt_move(mv("d2d4"));
    let fen = session.position().fen();

    let disposition = session.play_agent_turn(&negotiator(&service)).await;

    assert_eq!(disposition, MoveDisposition::SessionAborted);
    assert_eq!(session.position().fen(), fen);
    assert_eq!(session.record().len(), 1);
    let outcome = session.outcome().expect("terminated");
    assert_eq!(outcome, &SessionOutcome::Aborted(RejectReason::Illegal(mv("e2e4"))));
    assert_eq!(outcome.kind(), OutcomeKind::Aborted);
    assert_eq!(outcome.result_tag(), "*");
    // One write for the human move, one final write on termination.
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn test_agent_checkmate_ends_game() {
    let store = MemoryStore::new();
    let service = FakeService::text("d8h4");
    let position = Position::from_fen(FOOLS_MATE_BLACK_TO_MOVE).expect("valid fen");
    let mut session = session_with(position, Color::White, &store);
    assert_eq!(session.state(), &SessionState::AwaitingAgentMove);

    let disposition = session.play_agent_turn(&negotiator(&service)).await;

    assert_eq!(disposition, MoveDisposition::Applied);
    let outcome = session.outcome().expect("terminated");
    assert_eq!(
        outcome,
        &SessionOutcome::Finished(GameStatus::Checkmate {
            winner: Color::Black
        })
    );
    assert_eq!(outcome.winner(Color::White), Some(Side::Agent));
    assert_eq!(session.record().headers().result(), "0-1");
    assert_eq!(session.record().moves()[0].san(), "Qh4#");
    // Per-move write followed by the final write.
    assert_eq!(store.write_count(), 2);
    assert!(store.last_contents().expect("written").contains("0-1"));
}

#[test]
fn test_terminal_start_position_terminates_immediately() {
    let store = MemoryStore::new();
    let position = Position::from_fen(FOOLS_MATE_FINAL).expect("valid fen");
    let mut session = session_with(position, Color::White, &store);

    assert!(session.is_terminated());
    assert_eq!(session.outcome().map(SessionOutcome::kind), Some(OutcomeKind::Checkmate));
    assert!(session.begin_agent_turn().is_none());
    assert_eq!(session.attempt_move(mv("e2e4")), MoveDisposition::Ignored);
    assert_eq!(store.write_count(), 1);
}

#[test]
fn test_only_one_suggestion_pending() {
    let store = MemoryStore::new();
    let mut session = session_with(Position::new(), Color::Black, &store);

    let request = session.begin_agent_turn().expect("agent to move");
    assert_eq!(request.turn(), &Color::White);
    assert_eq!(request.legal_moves().len(), 20);
    assert!(session.has_pending_suggestion());
    assert!(session.begin_agent_turn().is_none());

    session.complete_agent_turn(NegotiationOutcome::Accepted(mv("e2e4")));
    assert!(!session.has_pending_suggestion());
    assert_eq!(session.state(), &SessionState::AwaitingHumanMove);
}

#[test]
fn test_completion_without_request_is_ignored() {
    let store = MemoryStore::new();
    let mut session = session_with(Position::new(), Color::Black, &store);

    let disposition = session.complete_agent_turn(NegotiationOutcome::Accepted(mv("e2e4")));

    assert_eq!(disposition, MoveDisposition::Ignored);
    assert!(session.record().is_empty());
    assert_eq!(session.state(), &SessionState::AwaitingAgentMove);
}

#[test]
fn test_cancelled_turn_can_be_restarted() {
    let store = MemoryStore::new();
    let mut session = session_with(Position::new(), Color::Black, &store);

    assert!(session.begin_agent_turn().is_some());
    session.cancel_agent_turn();
    assert!(!session.has_pending_suggestion());
    assert!(session.begin_agent_turn().is_some());
}

#[test]
fn test_rejection_is_idempotent_after_termination() {
    let store = MemoryStore::new();
    let mut session = session_with(Position::new(), Color::Black, &store);

    session.begin_agent_turn();
    let reason = RejectReason::Timeout(Duration::from_secs(10));
    session.complete_agent_turn(NegotiationOutcome::Rejected(reason.clone()));
    let writes = store.write_count();

    session.complete_agent_turn(NegotiationOutcome::Rejected(reason.clone()));
    assert!(session.begin_agent_turn().is_none());

    assert_eq!(session.outcome(), Some(&SessionOutcome::Aborted(reason)));
    assert_eq!(store.write_count(), writes);
}

#[test]
fn test_persist_failure_does_not_stop_play() {
    let store = MemoryStore::failing();
    let mut session = session_with(Position::new(), Color::White, &store);

    assert_eq!(session.attempt_move(mv("e2e4")), MoveDisposition::Applied);

    assert_eq!(session.record().len(), 1);
    assert_eq!(session.recorder().persisted(), 0);
    assert_eq!(session.state(), &SessionState::AwaitingAgentMove);
}

#[test]
fn test_every_write_holds_the_full_history() {
    let store = MemoryStore::new();
    let mut session = session_with(Position::new(), Color::White, &store);

    for (human, agent) in [("e2e4", "e7e5"), ("g1f3", "b8c6"), ("f1b5", "a7a6")] {
        session.attempt_move(mv(human));
        session.begin_agent_turn().expect("agent to move");
        session.complete_agent_turn(NegotiationOutcome::Accepted(mv(agent)));
    }

    let writes = store.writes();
    assert_eq!(writes.len(), 6);
    for pair in writes.windows(2) {
        let (earlier, later) = (&pair[0].1, &pair[1].1);
        let earlier_moves = earlier.trim_end().trim_end_matches('*').trim_end();
        let movetext = earlier_moves.rsplit("\n\n").next().expect("movetext");
        assert!(later.contains(movetext), "{later} does not extend {movetext}");
    }
    assert!(store
        .last_contents()
        .expect("written")
        .contains("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 *"));
}

#[test]
fn test_from_config_orients_board_and_labels_colours() {
    let store = MemoryStore::new();
    let config = GameConfig::default()
        .with_human_color(strictly_chess::PlayerColor::Black)
        .with_reset_on_start(true);

    let session =
        GameSession::from_config(&config, Position::new(), Box::new(store.clone()));

    assert_eq!(store.clears(), 1);
    assert_eq!(session.human_color(), Color::Black);
    assert_eq!(session.projection().orientation(), Color::Black);
    assert_eq!(session.record().headers().white(), "AI");
    assert_eq!(session.record().headers().black(), "Player");
    assert!(session.record().start().is_none());
    assert_eq!(session.state(), &SessionState::AwaitingAgentMove);
}

#[test]
fn test_from_config_keeps_records_and_notes_custom_start() {
    let store = MemoryStore::new();
    let config = GameConfig::default().with_reset_on_start(false);
    let position = Position::from_fen(FOOLS_MATE_BLACK_TO_MOVE).expect("valid fen");

    let session = GameSession::from_config(&config, position, Box::new(store.clone()));

    assert_eq!(store.clears(), 0);
    let start = session.record().start().expect("custom start");
    assert_eq!(start.fen(), FOOLS_MATE_BLACK_TO_MOVE);
    assert_eq!(start.turn(), &Color::Black);
}

#[test]
fn test_from_config_starts_even_when_records_cannot_be_cleared() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let not_a_dir = dir.path().join("games");
    std::fs::write(&not_a_dir, "occupied").expect("Write failed");
    let config = GameConfig::default().with_reset_on_start(true);

    let mut session = GameSession::from_config(
        &config,
        Position::new(),
        Box::new(FsRecordStore::new(&not_a_dir)),
    );

    assert_eq!(session.state(), &SessionState::AwaitingHumanMove);
    assert_eq!(session.attempt_move(mv("e2e4")), MoveDisposition::Applied);
    assert_eq!(session.record().len(), 1);
    assert_eq!(std::fs::read_to_string(&not_a_dir).expect("read"), "occupied");
}

#[test]
fn test_from_config_clamps_oversized_board_squares() {
    let store = MemoryStore::new();
    let config = GameConfig::from_toml("[board]\nsquare_width = 4000000000\nsquare_height = 2")
        .expect("valid config");

    let mut session = GameSession::from_config(&config, Position::new(), Box::new(store.clone()));
    let projection = *session.projection();

    assert_eq!(projection.square_width(), MAX_SQUARE_SIZE);
    assert_eq!(projection.square_height(), 2);
    assert_eq!(projection.extent(), (MAX_SQUARE_SIZE * 8, 16));
    session.pointer_down(click(&projection, Square::E2));
    assert_eq!(
        session.pointer_up(click(&projection, Square::E4)),
        InteractionEvent::MoveAttempted(mv("e2e4"))
    );
}

#[tokio::test]
async fn test_runner_delivers_outcome_through_polling() {
    let store = MemoryStore::new();
    let service = FakeService::new(Reply::Delayed(Duration::from_millis(10), "e7e5".to_string()));
    let mut session = session_with(Position::new(), Color::White, &store);
    let mut runner = AgentTurnRunner::new(negotiator(&service));
    session.attempt_move(mv("e2e4"));

    let mut delivered = None;
    for _ in 0..200 {
        delivered = runner.tick(&mut session);
        if delivered.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(delivered, Some(MoveDisposition::Applied));
    assert!(!runner.is_thinking());
    assert_eq!(service.calls(), 1);
    assert_eq!(session.record().len(), 2);
}

#[tokio::test]
async fn test_runner_cancel_abandons_turn() {
    let store = MemoryStore::new();
    let service = FakeService::new(Reply::Delayed(Duration::from_secs(30), "e7e5".to_string()));
    let mut session = session_with(Position::new(), Color::Black, &store);
    let mut runner = AgentTurnRunner::new(negotiator(&service));

    assert_eq!(runner.tick(&mut session), None);
    assert!(runner.is_thinking());
    assert!(session.has_pending_suggestion());

    runner.cancel(&mut session);

    assert!(!runner.is_thinking());
    assert!(!session.has_pending_suggestion());
    assert!(session.record().is_empty());
    assert_eq!(session.state(), &SessionState::AwaitingAgentMove);
}

async fn wait_for_call(service: &FakeService) {
    for _ in 0..100 {
        if service.calls() > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("suggestion task never reached the service");
}

#[tokio::test]
async fn test_cancelled_suggestion_never_completes() {
    let store = MemoryStore::new();
    let service = FakeService::new(Reply::Delayed(Duration::from_millis(50), "e7e5".to_string()));
    let mut session = session_with(Position::new(), Color::White, &store);
    session.attempt_move(mv("e2e4"));
    let request = session.begin_agent_turn().expect("agent to move");

    let pending = PendingSuggestion::spawn(negotiator(&service), request);
    wait_for_call(&service).await;
    pending.cancel();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(service.calls(), 1);
    assert_eq!(service.answered(), 0);
}

#[tokio::test]
async fn test_dropped_suggestion_never_completes() {
    let store = MemoryStore::new();
    let service = FakeService::new(Reply::Delayed(Duration::from_millis(50), "e7e5".to_string()));
    let mut session = session_with(Position::new(), Color::White, &store);
    session.attempt_move(mv("e2e4"));
    let request = session.begin_agent_turn().expect("agent to move");

    let pending = PendingSuggestion::spawn(negotiator(&service), request);
    wait_for_call(&service).await;
    drop(pending);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(service.answered(), 0);
}

#[tokio::test]
async fn test_uncancelled_suggestion_completes() {
    let store = MemoryStore::new();
    let service = FakeService::new(Reply::Delayed(Duration::from_millis(20), "e7e5".to_string()));
    let mut session = session_with(Position::new(), Color::White, &store);
    session.attempt_move(mv("e2e4"));
    let request = session.begin_agent_turn().expect("agent to move");

    let mut pending = PendingSuggestion::spawn(negotiator(&service), request);
    let mut outcome = None;
    for _ in 0..200 {
        outcome = pending.poll();
        if outcome.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(service.answered(), 1);
    assert_eq!(outcome, Some(NegotiationOutcome::Accepted(mv("e7e5"))));
}
