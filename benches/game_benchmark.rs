//! Performance benchmarks for the game engine
//!
//! Measures heuristic-vs-heuristic games with Criterion.rs in two modes:
//!
//! 1. **Fresh** - build and play a new game each iteration
//! 2. **Batch** - a small seeded batch, parallel against sequential
//!
//! Games use the Red Aggro and Green Stompy sample decks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mtg_sim::{
    decks::{sample_deck, DeckList},
    game::{GameConfig, VerbosityLevel},
    simulation::{run_game, run_games, SimulationConfig},
    Result,
};
use stats_alloc::{Region, StatsAlloc, INSTRUMENTED_SYSTEM};
use std::alloc::System;
use std::time::Duration;

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

/// Metrics collected during game execution
#[derive(Debug, Clone)]
struct GameMetrics {
    turns: u32,
    duration: Duration,
    bytes_allocated: usize,
    bytes_deallocated: usize,
}

impl GameMetrics {
    fn games_per_sec(&self) -> f64 {
        1.0 / self.duration.as_secs_f64()
    }

    fn turns_per_sec(&self) -> f64 {
        self.turns as f64 / self.duration.as_secs_f64()
    }

    fn net_bytes_allocated(&self) -> i64 {
        self.bytes_allocated as i64 - self.bytes_deallocated as i64
    }

    fn bytes_per_turn(&self) -> f64 {
        if self.turns == 0 {
            0.0
        } else {
            self.bytes_allocated as f64 / self.turns as f64
        }
    }
}

/// Decks parsed once, reused across iterations
struct BenchmarkSetup {
    deck1: DeckList,
    deck2: DeckList,
}

impl BenchmarkSetup {
    fn load() -> Result<Self> {
        Ok(BenchmarkSetup {
            deck1: sample_deck("red")?,
            deck2: sample_deck("green")?,
        })
    }
}

fn quiet_config(seed: u64) -> GameConfig {
    GameConfig::default()
        .with_seed(seed)
        .with_verbosity(VerbosityLevel::Silent)
}

fn run_game_with_metrics(setup: &BenchmarkSetup, seed: u64) -> Result<GameMetrics> {
    let reg = Region::new(GLOBAL);
    let report = run_game(&quiet_config(seed), &setup.deck1, &setup.deck2)?;
    let stats = reg.change();
    Ok(GameMetrics {
        turns: report.turns,
        duration: report.duration,
        bytes_allocated: stats.bytes_allocated,
        bytes_deallocated: stats.bytes_deallocated,
    })
}

/// Benchmark: Fresh mode - a new game each iteration
fn bench_game_fresh(c: &mut Criterion) {
    let setup = match BenchmarkSetup::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Skipping benchmark - failed to load decks: {}", e);
            return;
        }
    };

    let mut group = c.benchmark_group("game_execution");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(15));

    let seed = 42u64;
    println!("\nWarmup game (seed {}):", seed);
    if let Ok(metrics) = run_game_with_metrics(&setup, seed) {
        println!("  Turns: {}", metrics.turns);
        println!("  Duration: {:?}", metrics.duration);
        println!("  Games/sec: {:.2}", metrics.games_per_sec());
        println!("  Turns/sec: {:.2}", metrics.turns_per_sec());
        println!("  Bytes allocated: {}", metrics.bytes_allocated);
        println!("  Net bytes: {}", metrics.net_bytes_allocated());
        println!("  Bytes/turn: {:.2}", metrics.bytes_per_turn());
    }

    group.bench_with_input(BenchmarkId::new("fresh", seed), &seed, |b, &seed| {
        b.iter(|| run_game(&quiet_config(black_box(seed)), &setup.deck1, &setup.deck2).expect("game completes"));
    });

    group.finish();
}

/// Benchmark: Batch mode - the same 16 games with and without rayon
fn bench_batch(c: &mut Criterion) {
    let setup = match BenchmarkSetup::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Skipping benchmark - failed to load decks: {}", e);
            return;
        }
    };

    let mut group = c.benchmark_group("batch");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    for parallel in [false, true] {
        let mut config = SimulationConfig::new(setup.deck1.clone(), setup.deck2.clone());
        config.games = 16;
        config.seed = 7;
        config.parallel = parallel;
        config.game = GameConfig::default().with_verbosity(VerbosityLevel::Silent);

        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(BenchmarkId::new(label, config.games), |b| {
            b.iter(|| run_games(black_box(&config)).expect("batch completes"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_game_fresh, bench_batch);
criterion_main!(benches);
