//! Integration test: queued moves through the poll loop and step interrupt.

use wire_motion::RunOutcome;
use wire_motion::controller::ControllerState;

use super::{host, seconds};

#[test]
fn moves_accumulate_exactly() {
    let mut host = host();
    let moves = [(100, 1_000), (50, -300), (20, 7), (0, -1_200)];
    for (duration_ms, steps) in moves {
        host.controller_mut().queue_move(duration_ms, steps).unwrap();
    }

    let budget = seconds(&host, 5);
    assert_eq!(host.run_until_idle(budget), RunOutcome::Idle);

    let expected: i32 = moves.iter().map(|(_, s)| s).sum();
    let edges: u32 = moves.iter().map(|(_, s)| s.unsigned_abs()).sum();
    let controller = host.controller();
    assert_eq!(controller.generator().position(), expected);
    assert_eq!(controller.commanded_position(), expected);
    assert_eq!(host.board().step.rising_edges(), edges);
    assert_eq!(host.board().step.falling_edges(), edges);
    assert!(!host.board().step.level());
    assert_eq!(controller.status().moves_completed, moves.len() as u32);
}

#[test]
fn half_period_never_below_driver_minimum() {
    let mut host = host();
    // Requested 1 ms for 1000 steps: far faster than the driver allows.
    host.controller_mut().queue_move(1, 1_000).unwrap();
    host.step();
    let mut guard = 0;
    while !host.controller().is_idle() {
        host.step();
        let half_period = host.controller().generator().half_period();
        assert!(half_period == 0 || half_period >= 2_000);
        guard += 1;
        assert!(guard < 100_000);
    }
    assert_eq!(host.controller().generator().position(), 1_000);
}

#[test]
fn direction_line_follows_sign() {
    let mut host = host();
    host.controller_mut().queue_move(10, 20).unwrap();
    host.run_until_idle(seconds(&host, 1));
    assert!(host.board().dir.level());

    host.controller_mut().queue_move(10, -20).unwrap();
    host.run_until_idle(seconds(&host, 1));
    assert!(!host.board().dir.level());
    assert_eq!(host.controller().generator().position(), 0);
}

#[test]
fn stop_all_halts_after_inflight_pulse() {
    let mut host = host();
    host.controller_mut().queue_move(1_000, 1_000).unwrap();
    host.controller_mut().queue_move(1_000, 1_000).unwrap();

    // Run roughly 100 ms of the first move.
    let budget = host.ms_to_ticks(100);
    assert_eq!(host.run_until_idle(budget), RunOutcome::TimedOut);
    assert_eq!(host.controller().state(), ControllerState::Moving);

    host.controller_mut().stop_all();
    let stopped_at = host.controller().generator().position();
    assert!(stopped_at > 0 && stopped_at < 1_000);

    assert_eq!(host.run_until_idle(seconds(&host, 1)), RunOutcome::Idle);
    assert_eq!(host.controller().generator().position(), stopped_at);
    assert_eq!(host.controller().generator().target(), stopped_at);
    assert_eq!(host.board().step.rising_edges(), stopped_at as u32);
    assert!(host.controller().queue().is_empty());
}

#[test]
fn zero_step_move_emits_nothing() {
    let mut host = host();
    host.controller_mut().queue_move(100, 0).unwrap();
    assert_eq!(host.run_until_idle(seconds(&host, 1)), RunOutcome::Idle);
    assert_eq!(host.board().step.rising_edges(), 0);
    // The driver is still enabled by the dispatched move.
    assert!(host.controller().motors_enabled());
}

#[test]
fn zero_duration_runs_as_100ms() {
    let mut host = host();
    host.controller_mut().queue_move(0, 500).unwrap();
    assert_eq!(host.run_until_idle(seconds(&host, 1)), RunOutcome::Idle);
    let elapsed_ms = host.stats().elapsed_ticks / 80_000;
    assert!((100..=102).contains(&elapsed_ms), "elapsed {elapsed_ms} ms");
}

#[test]
fn set_zero_rebases_absolute_moves() {
    let mut host = host();
    host.controller_mut().queue_move(10, 250).unwrap();
    host.run_until_idle(seconds(&host, 1));

    host.controller_mut().set_zero().unwrap();
    assert_eq!(host.controller().generator().position(), 0);

    host.controller_mut().queue_move_to(10, -40).unwrap();
    host.run_until_idle(seconds(&host, 1));
    assert_eq!(host.controller().generator().position(), -40);
    assert_eq!(host.board().step.rising_edges(), 290);
}

#[test]
fn set_zero_is_rejected_while_moving() {
    let mut host = host();
    host.controller_mut().queue_move(100, 100).unwrap();
    host.step();
    assert!(host.controller_mut().set_zero().is_err());
}

#[test]
fn status_report_reflects_completed_move() {
    let mut host = host();
    host.controller_mut().queue_move(50, 400).unwrap();
    host.run_until_idle(seconds(&host, 1));

    let status = host.controller().status();
    assert_eq!(status.position, 400);
    assert_eq!(status.target, 400);
    assert!(!status.active);
    assert_eq!(status.half_period, 0);
    assert!(status.motors_enabled);
    assert_eq!(status.profile, "constant");
    assert!(status.events >= 800);

    let text = status.to_string();
    assert!(text.contains("position=400"));
    assert!(text.ends_with("OK"));
}

#[test]
fn revolution_move_then_home_returns_to_zero() {
    let mut host = host();
    host.controller_mut().queue_move_revs(200, 1).unwrap();
    assert_eq!(host.run_until_idle(seconds(&host, 2)), RunOutcome::Idle);
    // 200 full steps at 16 microsteps.
    assert_eq!(host.controller().generator().position(), 3_200);

    host.controller_mut().queue_home().unwrap();
    let start = host.stats().elapsed_ticks;
    assert_eq!(host.run_until_idle(seconds(&host, 5)), RunOutcome::Idle);
    let elapsed_ms = (host.stats().elapsed_ticks - start) / 80_000;
    assert_eq!(host.controller().generator().position(), 0);
    // 3200 steps at 3000 steps/s.
    assert!((1_000..=1_100).contains(&elapsed_ms));
}
