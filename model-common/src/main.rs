/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use model_common::config::ModelConfig;
use model_common::sim::{fire_next, run_for, SimClock, SimHwTimer};
use model_common::tid::{RxMeta, TidTracker};
use model_common::timer::{CallbackControl, ModelTimer, TimerCallback, TimerMode};
use model_common::transition::{
    delay_decode, delay_encode, tier_factor_ms, transition_time_decode, transition_time_encode,
};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Host-side simulator for the mesh model timer, dedup and codec helpers.
///
/// Example:
///   model-sim --config platform.yaml timer --timeout-ms 900000 --repeat 3
#[derive(Debug, Parser)]
#[command(
    name = "model-sim",
    about = "Mesh model common layer – host simulator",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML platform configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Transition time field codec.
    Transition {
        #[command(subcommand)]
        op: CodecOp,
    },
    /// Delay field codec.
    Delay {
        #[command(subcommand)]
        op: CodecOp,
    },
    /// Run a chunked model timer against the simulated hardware.
    Timer {
        /// Requested timeout in milliseconds.
        #[arg(long = "timeout-ms")]
        timeout_ms: u32,

        /// Fire this many times in repeated mode instead of once.
        #[arg(long = "repeat")]
        repeat: Option<u32>,
    },
    /// Validate one transaction twice, separated by a simulated gap.
    Dedup {
        /// Gap between the two receptions in milliseconds.
        #[arg(long = "gap-ms")]
        gap_ms: u32,
    },
}

#[derive(Debug, Subcommand)]
enum CodecOp {
    /// Milliseconds to wire byte.
    Encode { ms: u32 },
    /// Wire byte (decimal or 0x-prefixed hex) to milliseconds.
    Decode {
        #[arg(value_parser = parse_byte)]
        byte: u8,
    },
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid byte '{s}': {e}"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=trace).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match ModelConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load model configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No configuration file provided, using default platform settings");
            ModelConfig::default()
        }
    };

    info!(
        tick_hz = config.limits.tick_hz,
        min_timeout_ticks = config.limits.min_timeout_ticks,
        max_timeout_ticks = config.limits.max_timeout_ticks,
        counter_bits = config.counter_bits,
        "Platform"
    );

    if let Err(e) = run(&config, cli.command) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(config: &ModelConfig, command: Command) -> Result<()> {
    match command {
        Command::Transition { op } => {
            match op {
                CodecOp::Encode { ms } => {
                    let byte = transition_time_encode(ms);
                    println!(
                        "{ms} ms -> {byte:#04x} ({})",
                        describe_transition(byte)
                    );
                }
                CodecOp::Decode { byte } => {
                    println!("{byte:#04x} -> {}", describe_transition(byte));
                }
            }
            Ok(())
        }
        Command::Delay { op } => {
            match op {
                CodecOp::Encode { ms } => println!("{ms} ms -> {:#04x}", delay_encode(ms)),
                CodecOp::Decode { byte } => println!("{byte:#04x} -> {} ms", delay_decode(byte)),
            }
            Ok(())
        }
        Command::Timer { timeout_ms, repeat } => run_timer(config, timeout_ms, repeat),
        Command::Dedup { gap_ms } => run_dedup(config, gap_ms),
    }
}

fn describe_transition(byte: u8) -> String {
    match transition_time_decode(byte) {
        Some(ms) => format!("{ms} ms, step {} ms", tier_factor_ms(byte)),
        None => "unknown".to_string(),
    }
}

// ── timer ─────────────────────────────────────────────────────────────────────

/// Elapsed ticks seen at each firing, plus the firing budget.
#[derive(Debug, Default)]
struct FireLog {
    budget: u32,
    elapsed: Vec<u64>,
}

fn record_firing(log: &mut FireLog, timer: &mut ModelTimer<SimHwTimer, SimClock, FireLog>) -> CallbackControl {
    log.elapsed.push(timer.elapsed_ticks());
    if log.elapsed.len() as u32 >= log.budget {
        timer.abort();
    }
    CallbackControl::Keep
}

fn run_timer(config: &ModelConfig, timeout_ms: u32, repeat: Option<u32>) -> Result<()> {
    let clock = SimClock::with_counter_bits(config.counter_bits);
    let hw = SimHwTimer::new(clock.clone(), config.limits);

    let (mode, budget) = match repeat {
        Some(n) if n > 1 => (TimerMode::Repeated, n),
        _ => (TimerMode::SingleShot, 1),
    };

    let mut timer = ModelTimer::new(hw.clone(), clock.clone(), config.limits);
    timer.set_callback(TimerCallback::new(
        record_firing,
        FireLog {
            budget,
            elapsed: Vec::new(),
        },
    ));
    timer.create().context("Failed to create model timer")?;
    timer.set_mode(mode);
    timer.set_timeout_ms(timeout_ms);
    timer.schedule().context("Failed to schedule model timer")?;

    while fire_next(&clock, &hw, || timer.on_expiry()) {}

    let arms = hw.arm_history();
    println!(
        "timeout {timeout_ms} ms = {} ticks, {} hardware arm(s): {:?}",
        config.limits.ms_to_ticks(timeout_ms),
        arms.len(),
        arms
    );
    if let Some(log) = timer.context() {
        for (i, ticks) in log.elapsed.iter().enumerate() {
            println!(
                "  firing {}: {ticks} ticks elapsed ({} ms)",
                i + 1,
                config.limits.ticks_to_ms(*ticks)
            );
        }
    }
    Ok(())
}

// ── dedup ─────────────────────────────────────────────────────────────────────

fn run_dedup(config: &ModelConfig, gap_ms: u32) -> Result<()> {
    let clock = SimClock::with_counter_bits(config.counter_bits);
    let hw = SimHwTimer::new(clock.clone(), config.limits);
    let mut tracker = TidTracker::new(hw.clone(), clock.clone(), config.limits)
        .context("Failed to build transaction tracker")?;

    let meta = RxMeta::new(0x0001, 0x0002);
    let (message_id, tid) = (0x8202, 7);

    let first = tracker.validate(&meta, message_id, tid);
    run_for(
        &clock,
        &hw,
        u64::from(config.limits.ms_to_ticks(gap_ms)),
        || tracker.on_expiry(),
    );
    let second = tracker.validate(&meta, message_id, tid);

    println!("first reception:  {}", verdict(first));
    println!("second reception after {gap_ms} ms: {}", verdict(second));
    Ok(())
}

fn verdict(new_transaction: bool) -> &'static str {
    if new_transaction {
        "new transaction"
    } else {
        "duplicate"
    }
}
