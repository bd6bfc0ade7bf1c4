//! # Wire Cutter Motion Host
//!
//! Runs a motion job on the simulated board and prints the final status
//! report. The job is a list of feed moves, a cut batch, or both; moves
//! run first.
//!
//! ```text
//! wire_motion --config config/wire.toml --move 100:1000 --move 50:-200
//! wire_motion --move 100:1000 --home
//! wire_motion --cut 5:120 --ramp --json
//! ```

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;
use wire_common::consts::QUEUE_CAPACITY;
use wire_motion::batch::CutBatch;
use wire_motion::host::LoopStats;
use wire_motion::{MotionConfig, MotionStatus, RunOutcome, SimHost};

/// Virtual time budget per job [ms].
const JOB_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Wire cutter motion engine on a simulated board
#[derive(Parser, Debug)]
#[command(name = "wire_motion")]
#[command(version)]
#[command(about = "Interrupt-timed stepper feed and servo cutter, simulated")]
struct Args {
    /// Path to the motion configuration TOML.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Relative feed move `<duration_ms>:<steps>`; repeatable, at most 64
    /// per job (one queue load, counting `--home`).
    #[arg(long = "move", value_name = "MS:STEPS", value_parser = parse_move)]
    moves: Vec<(u16, i32)>,

    /// Return to position 0 after the moves.
    #[arg(long)]
    home: bool,

    /// Cut batch `<count>:<length_mm>`.
    #[arg(long, value_name = "COUNT:MM", value_parser = parse_cut)]
    cut: Option<(u32, u32)>,

    /// Force ramp shaping on regardless of the configuration.
    #[arg(long)]
    ramp: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs and the report in JSON format.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    outcome: RunOutcome,
    loop_stats: LoopStats,
    status: &'a MotionStatus,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Wire motion v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match args.config {
        Some(ref path) => {
            info!("Loading config from {}", path.display());
            MotionConfig::load_validated(path)?
        }
        None => MotionConfig::default(),
    };
    if args.ramp && !config.ramp.enabled {
        config.ramp.enabled = true;
        config.validate()?;
    }
    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }
    info!(
        "Config OK: service={}, ramp={}, headroom={}",
        config.shared.service_name, config.ramp.enabled, config.queue.headroom
    );

    check_job_size(args)?;
    let mut host = SimHost::new(&config)?;

    let shutdown = host.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        shutdown.store(true, Ordering::SeqCst);
    })?;

    let controller = host.controller_mut();
    for &(duration_ms, steps) in &args.moves {
        controller.queue_move(duration_ms, steps)?;
    }
    if args.home {
        controller.queue_home()?;
    }
    if let Some((count, length_mm)) = args.cut {
        host.start_batch(CutBatch::from_mm(&config, count, length_mm));
    }

    let budget = host.ms_to_ticks(JOB_TIMEOUT_MS);
    let outcome = host.run_until_idle(budget);
    let status = host.controller().status();

    if args.json {
        let report = Report {
            outcome,
            loop_stats: host.stats(),
            status: &status,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{status}");
    }

    match outcome {
        RunOutcome::Idle => Ok(()),
        RunOutcome::Interrupted => {
            info!("Job interrupted");
            Ok(())
        }
        RunOutcome::TimedOut => Err(format!("job did not finish within {JOB_TIMEOUT_MS} ms").into()),
    }
}

/// The job's moves are queued up front, so they must fit one queue load.
fn check_job_size(args: &Args) -> Result<(), String> {
    let queued = args.moves.len() + usize::from(args.home);
    if queued > QUEUE_CAPACITY {
        return Err(format!("at most {QUEUE_CAPACITY} moves per job, got {queued}"));
    }
    Ok(())
}

fn parse_pair<A, B>(s: &str) -> Result<(A, B), String>
where
    A: std::str::FromStr,
    B: std::str::FromStr,
    A::Err: std::fmt::Display,
    B::Err: std::fmt::Display,
{
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| format!("expected `<a>:<b>`, got `{s}`"))?;
    let a = a.trim().parse::<A>().map_err(|e| format!("`{a}`: {e}"))?;
    let b = b.trim().parse::<B>().map_err(|e| format!("`{b}`: {e}"))?;
    Ok((a, b))
}

fn parse_move(s: &str) -> Result<(u16, i32), String> {
    parse_pair(s)
}

fn parse_cut(s: &str) -> Result<(u32, u32), String> {
    parse_pair(s)
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
