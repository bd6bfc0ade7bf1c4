//! Integration test: autonomous cut batches.

use wire_motion::batch::CutBatch;
use wire_motion::cutter::CutterState;
use wire_motion::{MotionConfig, RunOutcome};

use super::{host, seconds};

#[test]
fn batch_feeds_and_cuts_each_length() {
    let mut host = host();
    let config = MotionConfig::default();
    host.start_batch(CutBatch::from_mm(&config, 3, 10));
    assert_eq!(host.controller().batch_remaining(), 3);

    assert_eq!(host.run_until_idle(seconds(&host, 20)), RunOutcome::Idle);

    // 10 mm at 99 steps/mm, three times.
    assert_eq!(host.controller().generator().position(), 2_970);
    assert_eq!(host.stats().cuts_issued, 3);
    assert_eq!(host.controller().batch_remaining(), 0);
    assert_eq!(host.controller().cutter().state(), CutterState::Up);
    // Initial write plus down and up per cut.
    assert_eq!(host.board().servo.writes(), 7);
    assert_eq!(host.board().delay.total_ms(), 3 * (1_500 + 800));
}

#[test]
fn cut_is_queued_behind_pending_move() {
    let mut host = host();
    host.controller_mut().queue_move(20, 500).unwrap();
    host.start_batch(CutBatch::new(1, 10, 100, 0, 0));

    // The pending move is dispatched first; the cut is queued behind it
    // once the queue has drained.
    host.step();
    assert_eq!(host.controller().generator().target(), 500);
    assert_eq!(host.stats().cuts_issued, 1);
    assert_eq!(host.controller().queue().len(), 3);

    assert_eq!(host.run_until_idle(seconds(&host, 2)), RunOutcome::Idle);
    assert_eq!(host.stats().cuts_issued, 1);
    assert_eq!(host.controller().generator().position(), 600);
}

#[test]
fn stop_all_cancels_remaining_cuts() {
    let mut host = host();
    host.start_batch(CutBatch::from_mm(&MotionConfig::default(), 5, 50));

    // Part-way through the first feed (1 s for 50 mm).
    let budget = host.ms_to_ticks(300);
    assert_eq!(host.run_until_idle(budget), RunOutcome::TimedOut);
    host.controller_mut().stop_all();
    assert_eq!(host.controller().batch_remaining(), 0);

    assert_eq!(host.run_until_idle(seconds(&host, 2)), RunOutcome::Idle);
    assert_eq!(host.stats().cuts_issued, 1);
    assert!(host.controller().generator().position() < 4_950);
    // The cut itself never ran.
    assert_eq!(host.board().servo.writes(), 1);
}

#[test]
fn queue_cut_is_all_or_nothing() {
    let mut host = host();
    for _ in 0..62 {
        host.controller_mut().queue_cutter_up(0).unwrap();
    }
    let batch = CutBatch::new(1, 10, 100, 0, 0);
    assert!(host.controller_mut().queue_cut(&batch).is_err());
    assert_eq!(host.controller().queue().len(), 62);

    host.step();
    host.controller_mut().queue_cut(&batch).unwrap();
    assert_eq!(host.controller().queue().len(), 64);
    assert_eq!(host.controller().commanded_position(), 100);
}
