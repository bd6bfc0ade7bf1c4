mod cut_batch;
mod motion;
mod queue_flow;
mod ramp;

use wire_motion::{MotionConfig, SimHost};

/// Host on the default configuration.
pub fn host() -> SimHost {
    host_with(MotionConfig::default())
}

pub fn host_with(config: MotionConfig) -> SimHost {
    SimHost::new(&config).expect("simulation host")
}

/// Virtual time budget for a test run.
pub fn seconds(host: &SimHost, s: u64) -> u64 {
    host.ms_to_ticks(s * 1_000)
}
