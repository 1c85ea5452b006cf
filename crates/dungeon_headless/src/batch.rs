//! Parallel batch runner.
//!
//! Runs many independent battles of one scenario with rayon. Every battle
//! gets its own [`ChaCha8Rng`] seeded with `seed_start + index`, so results
//! do not depend on how rayon splits the work.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use dungeon_core::balance::StatRules;
use dungeon_core::batch::{clamp_battles, play_one, BatchStats, CancelToken};
use dungeon_core::battle::BattleStatus;
use dungeon_core::squad::SquadTemplate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, BattleRecord};
use crate::scenario::{Scenario, ScenarioError};

/// Errors kept in [`BatchResults::errors`]; later ones are only counted.
pub const MAX_RECORDED_ERRORS: usize = 100;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name
    pub scenario: String,
    /// Battles to run, clamped to `1..=MAX_BATTLES`
    pub battles: u32,
    /// Worker threads (0 = rayon default)
    pub parallel: u32,
    /// Seed of the first battle
    pub seed_start: u64,
    /// Keep a [`BattleRecord`] per battle
    pub keep_records: bool,
    /// Print progress to stderr
    pub show_progress: bool,
    /// Output directory for results
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "Lone Adventurer".to_string(),
            battles: 1000,
            parallel: 0,
            seed_start: 0,
            keep_records: false,
            show_progress: false,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Config for a named scenario
    pub fn new(scenario: &str, battles: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            battles,
            ..Default::default()
        }
    }

    /// Config taking name and battle count from a scenario
    pub fn for_scenario(scenario: &Scenario) -> Self {
        Self::new(&scenario.name, scenario.battles)
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set worker threads
    pub fn with_parallel(mut self, threads: u32) -> Self {
        self.parallel = threads;
        self
    }

    /// Keep per-battle records
    pub fn with_records(mut self, keep: bool) -> Self {
        self.keep_records = keep;
        self
    }

    /// Print progress while running
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Mob level fought
    pub mob_level: i32,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Per-battle records, empty unless requested
    pub battles: Vec<BattleRecord>,
    /// Whether the run was cancelled before finishing
    pub cancelled: bool,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered (at most [`MAX_RECORDED_ERRORS`])
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// A battle that could not be played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    /// Battle index
    pub battle_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total battles
    pub total: u32,
    completed: AtomicU32,
    fighter_wins: AtomicU32,
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            fighter_wins: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed battle
    pub fn record_completion(&self, fighters_won: bool) -> u32 {
        if fighters_won {
            self.fighter_wins.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Fighters' win rate so far
    pub fn current_win_rate(&self) -> f64 {
        let completed = self.current();
        if completed == 0 {
            return 0.0;
        }
        f64::from(self.fighter_wins.load(Ordering::Relaxed)) / f64::from(completed)
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_battle = elapsed.as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_battle * f64::from(remaining))
    }

    /// Display progress to stderr
    pub fn display(&self) {
        let eta = self.eta();
        eprintln!("╔══════════════════════════════════════════╗");
        eprintln!(
            "║ Batch Progress: {:>8}/{:<8} ({:>5.1}%) ║",
            self.current(),
            self.total,
            self.percentage()
        );
        eprintln!(
            "║ ETA: {:>35} ║",
            format!("{}m {}s", eta.as_secs() / 60, eta.as_secs() % 60)
        );
        eprintln!(
            "║ Fighters' win rate so far: {:>12.1}% ║",
            self.current_win_rate() * 100.0
        );
        eprintln!("╚══════════════════════════════════════════╝");
    }
}

/// Per-thread accumulator reduced into the final result.
#[derive(Debug, Default)]
struct Partial {
    stats: BatchStats,
    records: Vec<BattleRecord>,
    errors: Vec<BatchError>,
}

impl Partial {
    fn merge(mut self, other: Partial) -> Partial {
        self.stats = self.stats.merge(other.stats);
        self.records.extend(other.records);
        if self.errors.len() < MAX_RECORDED_ERRORS {
            let room = MAX_RECORDED_ERRORS - self.errors.len();
            self.errors.extend(other.errors.into_iter().take(room));
        }
        self
    }
}

fn run_indices(
    config: &BatchConfig,
    template: &SquadTemplate,
    mob_level: i32,
    rules: &dyn StatRules,
    cancel: &CancelToken,
    progress: &BatchProgress,
) -> Partial {
    let battles = clamp_battles(config.battles);
    let display_every = (battles / 10).max(1);

    (0..battles)
        .into_par_iter()
        .fold(Partial::default, |mut partial, index| {
            if cancel.is_cancelled() {
                return partial;
            }
            let seed = config.seed_start.wrapping_add(u64::from(index));
            let rng = ChaCha8Rng::seed_from_u64(seed);
            match play_one(template, mob_level, rules, rng) {
                Ok(outcome) => {
                    partial.stats.record(&outcome);
                    if config.keep_records {
                        partial.records.push(BattleRecord::new(index, seed, &outcome));
                    }
                    let completed =
                        progress.record_completion(outcome.status == BattleStatus::FightersWin);
                    if completed % 1000 == 0 {
                        debug!("Progress: {}/{}", completed, battles);
                    }
                    if config.show_progress && completed % display_every == 0 {
                        progress.display();
                    }
                }
                Err(err) => {
                    partial.stats.failed_constructions += 1;
                    if partial.errors.len() < MAX_RECORDED_ERRORS {
                        warn!("Battle {} skipped: {}", index, err);
                        partial.errors.push(BatchError {
                            battle_index: index,
                            seed,
                            message: err.to_string(),
                        });
                    }
                }
            }
            partial
        })
        .reduce(Partial::default, Partial::merge)
}

/// Run a batch of battles for `scenario`.
///
/// Fails only when the scenario's placements are malformed; battles whose
/// squad cannot be built are counted in `failed_constructions` instead.
pub fn run_batch(
    config: BatchConfig,
    scenario: &Scenario,
    rules: &dyn StatRules,
    cancel: &CancelToken,
) -> Result<BatchResults, ScenarioError> {
    let template = scenario.template()?;
    let mob_level = scenario.effective_mob_level();
    let battles = clamp_battles(config.battles);
    let start = Instant::now();
    let progress = BatchProgress::new(battles);

    info!(
        "Starting batch run: {} battles of '{}' against level {}",
        battles, config.scenario, mob_level
    );
    if battles != config.battles {
        warn!(requested = config.battles, battles, "Battle count clamped");
    }

    let pool = if config.parallel > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Failed to build thread pool: {}, using the global pool", e);
                None
            }
        }
    } else {
        None
    };

    let run = || run_indices(&config, &template, mob_level, rules, cancel, &progress);
    let mut partial = match &pool {
        Some(pool) => pool.install(run),
        None => run(),
    };
    partial.records.sort_by_key(|record| record.index);

    let cancelled = cancel.is_cancelled();
    if cancelled {
        info!(
            completed = partial.stats.battles,
            requested = battles,
            "Batch cancelled"
        );
    }

    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        "Batch complete: {} battles in {:.1}s ({:.1} battles/sec)",
        partial.stats.battles,
        duration_seconds,
        f64::from(partial.stats.battles) / duration_seconds.max(f64::EPSILON)
    );

    Ok(BatchResults {
        summary: BatchSummary::from_stats(partial.stats, scenario.dungeons_per_minute),
        config,
        mob_level,
        battles: partial.records,
        cancelled,
        duration_seconds,
        errors: partial.errors,
    })
}

/// Verify determinism by running the same batch several times.
pub fn verify_determinism(
    scenario: &Scenario,
    rules: &dyn StatRules,
    seed: u64,
    battles: u32,
    runs: u32,
) -> Result<bool, ScenarioError> {
    let config = BatchConfig::new(&scenario.name, battles)
        .with_seed(seed)
        .with_records(true);
    let cancel = CancelToken::new();

    let first = run_batch(config.clone(), scenario, rules, &cancel)?;
    for _ in 1..runs {
        let next = run_batch(config.clone(), scenario, rules, &cancel)?;
        if next.summary != first.summary || next.battles != first.battles {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_core::balance::BalanceConfig;
    use dungeon_core::combatant::FighterSpec;

    use crate::scenario::Placement;

    fn scenario() -> Scenario {
        Scenario {
            name: "test".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.battles, 1000);
        assert!(!config.keep_records);
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("custom", 500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345)
            .with_parallel(2);

        assert_eq!(config.scenario, "custom");
        assert_eq!(config.battles, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.parallel, 2);
    }

    #[test]
    fn test_progress_tracking() {
        let progress = BatchProgress::new(100);
        assert_eq!(progress.current(), 0);
        assert_eq!(progress.percentage(), 0.0);

        progress.record_completion(true);
        progress.record_completion(false);
        progress.record_completion(true);

        assert_eq!(progress.current(), 3);
        assert!((progress.current_win_rate() - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_run_batch_small() {
        let rules = BalanceConfig::default();
        let config = BatchConfig::new("test", 20).with_records(true);
        let results = run_batch(config, &scenario(), &rules, &CancelToken::new()).unwrap();

        assert_eq!(results.summary.stats.battles, 20);
        assert_eq!(results.battles.len(), 20);
        assert!(results.errors.is_empty());
        assert!(!results.cancelled);
        let indices: Vec<u32> = results.battles.iter().map(|r| r.index).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_parallel_matches_single_thread() {
        let rules = BalanceConfig::default();
        let cancel = CancelToken::new();
        let one = run_batch(
            BatchConfig::new("test", 50).with_seed(9).with_parallel(1),
            &scenario(),
            &rules,
            &cancel,
        )
        .unwrap();
        let four = run_batch(
            BatchConfig::new("test", 50).with_seed(9).with_parallel(4),
            &scenario(),
            &rules,
            &cancel,
        )
        .unwrap();
        assert_eq!(one.summary, four.summary);
    }

    #[test]
    fn test_cancelled_batch_plays_nothing() {
        let rules = BalanceConfig::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let results = run_batch(BatchConfig::new("test", 100), &scenario(), &rules, &cancel).unwrap();
        assert!(results.cancelled);
        assert_eq!(results.summary.stats.battles, 0);
    }

    #[test]
    fn test_invalid_class_is_counted() {
        let rules = BalanceConfig::default();
        let bad = Scenario {
            fighters: vec![Placement {
                row: 0,
                col: 0,
                fighter: FighterSpec::new("Necromancer"),
            }],
            ..scenario()
        };
        let results = run_batch(BatchConfig::new("bad", 150), &bad, &rules, &CancelToken::new()).unwrap();
        assert_eq!(results.summary.stats.battles, 0);
        assert_eq!(results.summary.stats.failed_constructions, 150);
        assert_eq!(results.errors.len(), MAX_RECORDED_ERRORS);
        assert!(results
            .errors
            .iter()
            .all(|e| e.message == "Necromancer is not a valid class"));
    }

    #[test]
    fn test_malformed_scenario_is_an_error() {
        let rules = BalanceConfig::default();
        let empty = Scenario {
            fighters: Vec::new(),
            ..scenario()
        };
        assert!(run_batch(BatchConfig::default(), &empty, &rules, &CancelToken::new()).is_err());
    }

    #[test]
    fn test_verify_determinism() {
        let rules = BalanceConfig::default();
        assert!(verify_determinism(&scenario(), &rules, 12345, 30, 3).unwrap());
    }

    #[test]
    fn test_batch_results_save_load() {
        let rules = BalanceConfig::default();
        let results = run_batch(
            BatchConfig::new("test", 5).with_records(true),
            &scenario(),
            &rules,
            &CancelToken::new(),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.battles.len(), 5);
        assert_eq!(loaded.config.scenario, "test");
        assert_eq!(loaded.summary.stats, results.summary.stats);
    }
}
