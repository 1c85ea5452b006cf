//! Headless squad battle runner.
//!
//! # Usage
//!
//! ```bash
//! # Play one battle and print the log
//! cargo run -p dungeon_headless -- battle --scenario scenarios/dungeon_party.ron
//!
//! # Run a batch, overriding the scenario's battle count
//! cargo run -p dungeon_headless -- batch --scenario scenarios/dungeon_party.ron --count 1000000
//!
//! # Use custom balance tables
//! cargo run -p dungeon_headless -- --balance data/balance.ron batch
//!
//! # Check that a seeded batch is reproducible
//! cargo run -p dungeon_headless -- verify --seed 42 --runs 3
//! ```
//!
//! Battle logs and reports go to stdout, logs to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dungeon_core::balance::BalanceConfig;
use dungeon_core::batch::CancelToken;
use dungeon_core::battle::run_battle;
use dungeon_core::events::Verbosity;
use dungeon_core::squad::Squad;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dungeon_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    expedition::run_expedition,
    render::render_events,
    scenario::{load_balance, Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "dungeon_headless")]
#[command(about = "Headless squad battle runner for balance testing")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Balance tables (RON); built-in defaults when omitted
    #[arg(long, global = true)]
    balance: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single battle and print its log
    Battle {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Include board snapshots and raw rolls
        #[arg(long)]
        detailed: bool,

        /// Print events as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a batch of battles
    Batch {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of battles (defaults to the scenario's)
        #[arg(short, long)]
        count: Option<u32>,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Save results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep a record of every battle in the saved results
        #[arg(long)]
        records: bool,
    },

    /// Send one squad through consecutive encounters without healing
    Expedition {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of encounters (defaults to the scenario's battle count)
        #[arg(short, long)]
        encounters: Option<u32>,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify that seeded batches are reproducible
    Verify {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed to test
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Battles per run
        #[arg(short, long, default_value = "1000")]
        battles: u32,

        /// Number of runs to compare
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let rules = load_rules(cli.balance);

    match cli.command {
        Commands::Battle {
            scenario,
            seed,
            detailed,
            json,
        } => cmd_battle(&load_scenario(scenario), &rules, seed, detailed, json),
        Commands::Batch {
            scenario,
            count,
            parallel,
            seed,
            output,
            records,
        } => {
            let scenario = load_scenario(scenario);
            let mut config = BatchConfig::for_scenario(&scenario)
                .with_parallel(parallel)
                .with_seed(seed)
                .with_records(records)
                .with_progress(true);
            if let Some(count) = count {
                config.battles = count;
            }
            cmd_batch(&scenario, &rules, config, output);
        }
        Commands::Expedition {
            scenario,
            encounters,
            seed,
        } => {
            let scenario = load_scenario(scenario);
            let encounters = encounters.unwrap_or(scenario.battles);
            cmd_expedition(&scenario, &rules, encounters, seed);
        }
        Commands::Verify {
            scenario,
            seed,
            battles,
            runs,
        } => cmd_verify(&load_scenario(scenario), &rules, seed, battles, runs),
    }
}

fn load_rules(path: Option<PathBuf>) -> BalanceConfig {
    let Some(path) = path else {
        return BalanceConfig::default();
    };
    match load_balance(&path) {
        Ok(config) => {
            tracing::info!("Loaded balance tables from {}", path.display());
            config
        }
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_scenario(path: Option<PathBuf>) -> Scenario {
    let Some(path) = path else {
        tracing::info!("No scenario given, using the default");
        return Scenario::default();
    };
    match Scenario::load(&path) {
        Ok(scenario) => {
            tracing::info!("Loaded scenario '{}' from {}", scenario.name, path.display());
            scenario
        }
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    }
}

/// Play and print one battle
fn cmd_battle(scenario: &Scenario, rules: &BalanceConfig, seed: u64, detailed: bool, json: bool) {
    let built = scenario
        .template()
        .and_then(|t| t.build(rules).map_err(ScenarioError::from));
    let fighters = match built {
        Ok(squad) => squad,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };
    let mobs = Squad::mobs_for_level(scenario.effective_mob_level(), rules);
    let verbosity = if detailed {
        Verbosity::Detailed
    } else {
        Verbosity::Summary
    };

    let rng = ChaCha8Rng::seed_from_u64(seed);
    let (outcome, events) = run_battle(fighters, mobs, rules, verbosity, rng);

    if json {
        for event in &events {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    eprintln!("FATAL: Failed to encode event: {}", e);
                    std::process::exit(1);
                }
            }
        }
    } else {
        print!("{}", render_events(&events));
    }

    eprintln!(
        "Winner: {} after {} rounds ({}), mobs' remaining health {}",
        outcome.winner, outcome.rounds, outcome.message, outcome.mobs_remaining_health
    );
}

/// Run a batch and print the summary
fn cmd_batch(
    scenario: &Scenario,
    rules: &BalanceConfig,
    config: BatchConfig,
    output: Option<PathBuf>,
) {
    let cancel = CancelToken::new();
    let results = match run_batch(config, scenario, rules, &cancel) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", "=".repeat(50));
    println!("BATCH COMPLETE: {}", scenario.name);
    println!("{}", "=".repeat(50));
    println!("Mob level: {}", results.mob_level);
    for line in results.summary.report() {
        println!("{line}");
    }
    println!("Duration: {:.1}s", results.duration_seconds);

    if !results.errors.is_empty() {
        eprintln!("\nSquad construction failures:");
        for error in results.errors.iter().take(5) {
            eprintln!("  Battle {} (seed {}): {}", error.battle_index, error.seed, error.message);
        }
    }

    if let Some(path) = output {
        if let Err(e) = results.save(&path) {
            eprintln!("FATAL: Failed to save results: {}", e);
            std::process::exit(1);
        }
        eprintln!("\nResults saved to: {}", path.display());
    }
}

/// Run an expedition and print the survivors
fn cmd_expedition(scenario: &Scenario, rules: &BalanceConfig, encounters: u32, seed: u64) {
    let template = match scenario.template() {
        Ok(template) => template,
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    match run_expedition(
        &template,
        scenario.effective_mob_level(),
        encounters,
        rules,
        &mut rng,
    ) {
        Ok(report) => {
            for line in report.report() {
                println!("{line}");
            }
        }
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    }
}

/// Verify determinism
fn cmd_verify(scenario: &Scenario, rules: &BalanceConfig, seed: u64, battles: u32, runs: u32) {
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs of {} battles)",
        scenario.name,
        seed,
        runs,
        battles
    );

    match verify_determinism(scenario, rules, seed, battles, runs) {
        Ok(true) => eprintln!("PASS: All {} runs produced identical results", runs),
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    }
}
