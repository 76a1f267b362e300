//! meltdown-sim - Headless server simulation for the meltdown episode.
//!
//! Spins up an in-memory server with a handful of sessions, lets one of them
//! consume the item, and drives the scheduler from a simulated server tick
//! until the episode has terminated its session.
//!
//! Usage: meltdown-sim [--sessions N] [--activate-at TICK] [--disconnect-at TICK]
//!                     [--config PATH] [--realtime] [--log-file PATH] [-v]

mod driver;
mod world;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use meltdown_types::MeltdownConfig;
use meltdown_types::formatting::{format_clock, ticks_to_secs};
use tracing_subscriber::filter::EnvFilter;

use driver::{Driver, Plan, Progress};

#[derive(Parser, Debug)]
#[command(version, about = "Simulate a meltdown episode on an in-memory server")]
struct Cli {
    /// Number of connected sessions
    #[arg(short, long, default_value_t = 4)]
    sessions: usize,

    /// Index of the session that consumes the item
    #[arg(long, default_value_t = 0)]
    activator: usize,

    /// World tick at which the item is consumed (the first world tick is 1)
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    activate_at: u64,

    /// Scheduler tick at which the activator disconnects on its own
    #[arg(long)]
    disconnect_at: Option<u64>,

    /// Make the activator's host context unresolvable
    #[arg(long)]
    detached: bool,

    /// Stop after this many world ticks
    #[arg(long, default_value_t = 2_000)]
    max_ticks: u64,

    /// TOML config file (defaults to the per-user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tick at the configured rate instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log to `log_file` when given (and openable), otherwise to stderr.
///
/// `-v` raises the default level to DEBUG, `-vv` to TRACE (per-pulse effects).
/// `RUST_LOG` still wins over both.
fn init_logging(log_file: Option<&Path>, verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let Some(path) = log_file else {
        builder.with_writer(std::io::stderr).init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Err(e) => {
            builder.with_writer(std::io::stderr).init();
            tracing::warn!(path = %path.display(), error = %e, "Cannot open log file, logging to stderr");
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<MeltdownConfig, String> {
    match path {
        Some(path) => meltdown_core::config::load_file(path).map_err(|e| e.to_string()),
        None => {
            let config: MeltdownConfig = confy::load("meltdown", Some("config")).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Could not load user config, using defaults");
                MeltdownConfig::default()
            });
            meltdown_core::config::validate(&config).map_err(|e| e.to_string())?;
            Ok(config)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref(), cli.verbose);

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let plan = Plan {
        sessions: cli.sessions,
        activator: cli.activator,
        activate_at: cli.activate_at,
        disconnect_at: cli.disconnect_at,
        detached: cli.detached,
        max_ticks: cli.max_ticks,
    };
    tracing::info!(?plan, "Starting simulation");

    let mut driver = Driver::new(config, plan);
    let outcome = if cli.realtime {
        driver.run_realtime().await
    } else {
        driver.run_to_end()
    };

    match outcome {
        Ok(progress) => {
            print_summary(&driver, progress);
            if progress == Progress::Exhausted {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Simulation aborted");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(driver: &Driver, progress: Progress) {
    let rate = driver.tick_rate();
    println!("=== Simulation Summary ===");
    println!("  Outcome: {:?}", progress);
    println!(
        "  World ticks: {} ({})",
        driver.world_tick(),
        format_clock(ticks_to_secs(driver.world_tick(), rate))
    );
    println!("  Scheduler ticks: {}", driver.scheduler_tick());
    let policies = driver.scheduler_config();
    println!(
        "  Policies: same_tick={:?} on_failure={:?}",
        policies.same_tick, policies.on_failure
    );
    println!("  Dropped tasks: {}", driver.dropped_tasks());
    if let Some(ticket) = driver.ticket() {
        println!(
            "  Episode: session {} pulses {:?}..={:?} terminates at {}",
            ticket.session, ticket.first_pulse, ticket.last_pulse, ticket.terminates_at
        );
    } else {
        println!("  Episode: not started");
    }
    println!();

    let world = driver.world();
    for id in world.session_ids() {
        let Some(session) = world.session(id) else {
            continue;
        };
        let s = &session.stats;
        println!("  [{}: {}] connected={}", session.name, id, session.connected);
        println!(
            "    messages={} modifiers={} bursts={} units={} cues={} orientation={}",
            s.messages, s.modifiers, s.bursts, s.burst_units, s.audio_cues, s.orientation_updates
        );
        if let Some(reason) = &s.terminated {
            println!("    terminated: {}", reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_at_zero_is_rejected() {
        assert!(Cli::try_parse_from(["meltdown-sim", "--activate-at", "0"]).is_err());
        let cli = Cli::try_parse_from(["meltdown-sim", "--activate-at", "1"]).unwrap();
        assert_eq!(cli.activate_at, 1);
    }

    #[test]
    fn test_verbosity_counts_flags() {
        let cli = Cli::try_parse_from(["meltdown-sim", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_file.is_none());
    }
}
