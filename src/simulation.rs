//! Bot-vs-bot simulation: single games and parallel batches
//!
//! Each game owns its own engine, state and current-thread tokio runtime;
//! nothing is shared between games, so a batch fans out over rayon with
//! one worker per game. Per-game seeds are drawn from a xoshiro stream
//! seeded by the batch seed, which makes a batch reproducible whether it
//! runs in parallel or not.

use crate::decks::DeckList;
use crate::game::{create_game, GameConfig, GameEndReason, HeuristicController, PlayerSetup};
use crate::Result;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Outcome of one simulated game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReport {
    pub seed: u64,
    /// Winner's name, `None` for a draw
    pub winner: Option<String>,
    /// Seat index of the winner (0 or 1)
    pub winner_seat: Option<usize>,
    pub turns: u32,
    pub end_reason: Option<GameEndReason>,
    /// The game's event log, oldest first
    pub log: Vec<String>,
    pub duration: Duration,
}

impl GameReport {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Settings for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub games: usize,
    /// Seed from which every game's seed is derived
    pub seed: u64,
    /// Template for each game; its seed is replaced per game
    pub game: GameConfig,
    pub deck1: DeckList,
    pub deck2: DeckList,
    pub parallel: bool,
    /// Keep each game's event log in its report
    pub keep_logs: bool,
}

impl SimulationConfig {
    pub fn new(deck1: DeckList, deck2: DeckList) -> Self {
        SimulationConfig {
            games: 100,
            seed: 0,
            game: GameConfig::default(),
            deck1,
            deck2,
            parallel: true,
            keep_logs: false,
        }
    }
}

/// Aggregate statistics for a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub player1: String,
    pub player2: String,
    pub games: usize,
    pub player1_wins: usize,
    pub player2_wins: usize,
    pub draws: usize,
    pub average_turns: f64,
    pub average_duration_ms: f64,
}

impl BatchSummary {
    pub fn from_reports(player1: &str, player2: &str, reports: &[GameReport]) -> Self {
        let games = reports.len();
        let wins = |seat| reports.iter().filter(|r| r.winner_seat == Some(seat)).count();
        let (average_turns, average_duration_ms) = if games == 0 {
            (0.0, 0.0)
        } else {
            let turns: u64 = reports.iter().map(|r| r.turns as u64).sum();
            let millis: f64 = reports.iter().map(|r| r.duration.as_secs_f64() * 1000.0).sum();
            (turns as f64 / games as f64, millis / games as f64)
        };
        BatchSummary {
            player1: player1.to_string(),
            player2: player2.to_string(),
            games,
            player1_wins: wins(0),
            player2_wins: wins(1),
            draws: reports.iter().filter(|r| r.is_draw()).count(),
            average_turns,
            average_duration_ms,
        }
    }

    fn percent(&self, count: usize) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.games as f64
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Games played: {}", self.games)?;
        writeln!(
            f,
            "  {}: {} wins ({:.1}%)",
            self.player1,
            self.player1_wins,
            self.percent(self.player1_wins)
        )?;
        writeln!(
            f,
            "  {}: {} wins ({:.1}%)",
            self.player2,
            self.player2_wins,
            self.percent(self.player2_wins)
        )?;
        writeln!(f, "  Draws: {} ({:.1}%)", self.draws, self.percent(self.draws))?;
        writeln!(f, "Average game length: {:.1} turns", self.average_turns)?;
        write!(f, "Average game duration: {:.2}ms", self.average_duration_ms)
    }
}

/// Seat names; both sides get a seat prefix so mirror matches stay
/// distinguishable
fn seat_names(deck1: &DeckList, deck2: &DeckList) -> (String, String) {
    (
        format!("P1 {}", deck1.display_name()),
        format!("P2 {}", deck2.display_name()),
    )
}

/// Play one heuristic-vs-heuristic game on the current async context
pub async fn play_game(config: &GameConfig, deck1: &DeckList, deck2: &DeckList) -> Result<GameReport> {
    let start = Instant::now();
    let (name1, name2) = seat_names(deck1, deck2);
    let players = vec![
        PlayerSetup::new(name1, deck1.to_definitions()?, Box::new(HeuristicController::new())),
        PlayerSetup::new(name2, deck2.to_definitions()?, Box::new(HeuristicController::new())),
    ];
    let mut engine = create_game(config.clone(), players)?;
    let result = engine.run_game().await?;

    let winner_seat = result.winner.and_then(|id| engine.state.get_player_idx(id));
    Ok(GameReport {
        seed: config.seed,
        winner: result.winner.map(|id| engine.state.player_name(id)),
        winner_seat,
        turns: result.turns_played,
        end_reason: result.end_reason,
        log: engine.state.logger.visible_messages(),
        duration: start.elapsed(),
    })
}

/// Play one game to completion on a fresh current-thread runtime
pub fn run_game(config: &GameConfig, deck1: &DeckList, deck2: &DeckList) -> Result<GameReport> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    runtime.block_on(play_game(config, deck1, deck2))
}

/// The seeds a batch with this base seed gives its games, in game order
pub fn game_seeds(base: u64, games: usize) -> Vec<u64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(base);
    (0..games).map(|_| rng.next_u64()).collect()
}

/// Run every game of a batch and return the reports in game order
pub fn run_games(config: &SimulationConfig) -> Result<Vec<GameReport>> {
    // Fail fast on a bad deck instead of once per game
    config.deck1.to_definitions()?;
    config.deck2.to_definitions()?;

    let one = |seed: u64| -> Result<GameReport> {
        let game = config.game.clone().with_seed(seed);
        let mut report = run_game(&game, &config.deck1, &config.deck2)?;
        if !config.keep_logs {
            report.log = Vec::new();
        }
        Ok(report)
    };

    let seeds = game_seeds(config.seed, config.games);
    if config.parallel {
        seeds.into_par_iter().map(one).collect()
    } else {
        seeds.into_iter().map(one).collect()
    }
}

/// Run a batch and aggregate it
pub fn run_batch(config: &SimulationConfig) -> Result<BatchSummary> {
    let reports = run_games(config)?;
    let (name1, name2) = seat_names(&config.deck1, &config.deck2);
    Ok(BatchSummary::from_reports(&name1, &name2, &reports))
}
