//! Integration test: ramp-shaped moves on the simulated board.

use wire_motion::pulse::profile::RampPhase;
use wire_motion::{MotionConfig, RunOutcome, SimHost};

use super::{host_with, seconds};

fn ramp_host() -> SimHost {
    let mut config = MotionConfig::default();
    config.ramp.enabled = true;
    host_with(config)
}

/// Step until idle, returning (min, max) half period and the phases seen.
fn run_observed(host: &mut SimHost) -> (u32, u32, Vec<RampPhase>) {
    let mut min = u32::MAX;
    let mut max = 0;
    let mut phases = Vec::new();
    let mut guard = 0u64;
    host.step();
    while !host.controller().is_idle() {
        host.step();
        let generator = host.controller().generator();
        let half_period = generator.half_period();
        if half_period > 0 {
            min = min.min(half_period);
            max = max.max(half_period);
        }
        let phase = generator.ramp().phase();
        if phases.last() != Some(&phase) {
            phases.push(phase);
        }
        guard += 1;
        assert!(guard < 2_000_000, "ramped move did not finish");
    }
    (min, max, phases)
}

#[test]
fn long_move_accelerates_cruises_and_decelerates() {
    let mut host = ramp_host();
    host.controller_mut().queue_move(1_000, 40_000).unwrap();
    let (min, max, phases) = run_observed(&mut host);

    assert_eq!(host.controller().generator().position(), 40_000);
    assert_eq!(host.board().step.rising_edges(), 40_000);
    assert_eq!(min, 2_000);
    assert_eq!(max, 6_000);
    assert!(phases.contains(&RampPhase::Accel));
    assert!(phases.contains(&RampPhase::Decel));
    assert_eq!(phases.last(), Some(&RampPhase::None));
}

#[test]
fn short_moves_never_stall_in_accel() {
    let mut host = ramp_host();
    let mut expected = 0;
    for steps in [1, -1, 2, -2, 3, 50, -75, 100] {
        host.controller_mut().queue_move(1, steps).unwrap();
        expected += steps;
        let (min, _, _) = run_observed(&mut host);
        assert!(min >= 2_000);
        assert_eq!(host.controller().generator().position(), expected);
    }
}

#[test]
fn slow_moves_skip_shaping() {
    let mut host = ramp_host();
    // 8000 half period: slower than the ramp start rate.
    host.controller_mut().queue_move(100, 500).unwrap();
    let (min, max, phases) = run_observed(&mut host);
    assert_eq!(min, 7_999);
    assert_eq!(max, 7_999);
    assert!(!phases.contains(&RampPhase::Accel));
}

#[test]
fn ramped_move_takes_longer_than_constant() {
    let mut ramped = ramp_host();
    ramped.controller_mut().queue_move(100, 2_000).unwrap();
    assert_eq!(ramped.run_until_idle(seconds(&ramped, 5)), RunOutcome::Idle);

    let mut constant = host_with(MotionConfig::default());
    constant.controller_mut().queue_move(100, 2_000).unwrap();
    assert_eq!(constant.run_until_idle(seconds(&constant, 5)), RunOutcome::Idle);

    assert_eq!(ramped.controller().generator().position(), 2_000);
    assert!(ramped.stats().elapsed_ticks > constant.stats().elapsed_ticks);
    assert_eq!(ramped.controller().status().profile, "ramp");
}
