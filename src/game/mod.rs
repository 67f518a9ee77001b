//! Game state, the engine that mutates it, and the players that drive it

/// Log a formatted message at Verbose level
///
/// Compiles to nothing without the `verbose-logging` feature, so hot
/// paths pay no `format!` cost in benchmarks.
macro_rules! log_if_verbose {
    ($owner:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $owner.logger.verbose(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$owner;
        }
    };
}

/// Await a decision from `player`'s controller, then honor cancellation
macro_rules! ask {
    ($engine:expr, $player:expr, $method:ident ( $($arg:expr),* )) => {{
        let player = $player;
        let idx = $engine
            .state
            .get_player_idx(player)
            .ok_or($crate::MtgError::EntityNotFound(player.as_u32()))?;
        let view = $crate::game::GameStateView::new(&$engine.state, player);
        let answer = $engine.controllers[idx].$method(&view, $($arg),*).await;
        $engine.check_cancelled()?;
        answer
    }};
}

pub mod actions;
pub mod combat;
pub mod config;
pub mod continuous;
pub mod controller;
pub mod dispatch;
pub mod engine;
pub mod game_loop;
pub mod heuristic_controller;
pub mod legal;
pub mod logger;
pub mod mana_sources;
pub mod pass_controller;
pub mod phase;
pub mod resolve;
pub mod scripted_controller;
pub mod stack;
pub mod state;
pub mod triggers;

pub use actions::{ActionOutcome, CastMethod, GameAction, PendingCast};
pub use combat::CombatState;
pub use config::GameConfig;
pub use continuous::{Affected, ContinuousEffect, ContinuousEffects, ContinuousKind, Duration};
pub use controller::{decided, CardPrompt, Decision, GameStateView, PaymentReason, Pile, PlayerController};
pub use engine::{create_game, CancelToken, GameEngine, PlayerSetup};
pub use game_loop::GameResult;
pub use heuristic_controller::HeuristicController;
pub use legal::{CastCost, Legality};
pub use logger::{GameLogger, LogEntry, OutputMode, VerbosityLevel};
pub use mana_sources::{ManaPlanner, ManaSource, TapPlan};
pub use pass_controller::PassController;
pub use phase::{Step, TurnStructure};
pub use scripted_controller::ScriptedController;
pub use stack::{ChosenTargets, Stack, StackEntry, StackItem};
pub use state::{GameEndReason, GameOutcome, GameState};
pub use triggers::{DelayedTrigger, GameEvent, PendingTrigger};
