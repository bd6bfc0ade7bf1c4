//! Integration test: command queue ordering and back-pressure.

use wire_motion::cutter::CutterState;
use wire_motion::{MotionConfig, MotionError, RunOutcome};

use super::{host, host_with, seconds};

#[test]
fn mixed_commands_dispatch_in_fifo_order() {
    let mut host = host();
    {
        let c = host.controller_mut();
        c.queue_move(10, 100).unwrap();
        c.queue_cutter_down(5).unwrap();
        c.queue_move(10, -50).unwrap();
        c.queue_toggle_cutter(7).unwrap();
        c.queue_cutter_up(0).unwrap();
    }

    let mut transitions = Vec::new();
    let mut last = host.controller().cutter().state();
    let mut guard = 0;
    host.step();
    while !host.controller().is_idle() {
        host.step();
        let state = host.controller().cutter().state();
        if state != last {
            transitions.push((state, host.controller().generator().position()));
            last = state;
        }
        guard += 1;
        assert!(guard < 100_000);
    }

    assert_eq!(
        transitions,
        vec![(CutterState::Down, 100), (CutterState::Up, 50)]
    );
    assert_eq!(host.board().delay.total_ms(), 12);
    // Initial up, down, toggle to up, explicit up.
    assert_eq!(host.board().servo.writes(), 4);
    assert_eq!(host.board().servo.position(), Some(0));
}

#[test]
fn poll_reports_back_pressure_with_two_free_slots() {
    let mut host = host();
    for _ in 0..63 {
        host.controller_mut().queue_cutter_up(0).unwrap();
    }
    // The first poll dispatches one command, leaving 62 queued.
    host.step();
    assert_eq!(host.controller().queue().len(), 62);
    assert!(host.controller().queue().is_full());
    assert_eq!(host.stats().back_pressure_polls, 1);

    // Back-pressure is advisory: the reserved slots still admit a burst.
    host.controller_mut().queue_cutter_down(0).unwrap();
    host.controller_mut().queue_cutter_up(0).unwrap();
    assert_eq!(
        host.controller_mut().queue_toggle_cutter(0),
        Err(MotionError::QueueFull { capacity: 64 })
    );

    assert_eq!(host.run_until_idle(seconds(&host, 1)), RunOutcome::Idle);
    assert!(host.controller().queue().is_empty());
}

#[test]
fn headroom_comes_from_config() {
    let mut config = MotionConfig::default();
    config.queue.headroom = 10;
    let mut host = host_with(config);
    for _ in 0..55 {
        host.controller_mut().queue_cutter_up(0).unwrap();
    }
    assert!(host.controller().queue().is_full());
    assert!(host.controller().status().queue_full);
}

#[test]
fn every_command_runs_exactly_once() {
    let mut host = host();
    for i in 0..40 {
        let steps = if i % 2 == 0 { 10 } else { -3 };
        host.controller_mut().queue_move(5, steps).unwrap();
    }
    assert_eq!(host.run_until_idle(seconds(&host, 5)), RunOutcome::Idle);
    assert_eq!(host.controller().generator().position(), 20 * 10 - 20 * 3);
    assert_eq!(host.controller().status().moves_completed, 40);
    assert_eq!(host.board().step.rising_edges(), 20 * 13);
}
