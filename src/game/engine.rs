//! The game engine: one game, its controllers, and the single path by
//! which the state changes
//!
//! `GameEngine` owns its `GameState` outright. Every mutation goes
//! through `dispatch` (player actions), the resolution pipeline, or the
//! turn loop, all of which live in `impl GameEngine` blocks spread over
//! `dispatch.rs`, `resolve.rs` and `game_loop.rs`.

use crate::cards::DefinitionId;
use crate::core::{CardId, PlayerId, TargetRef, TargetSpec};
use crate::game::{
    ChosenTargets, GameAction, GameConfig, GameOutcome, GameState, PendingTrigger, PlayerController, StackEntry,
    StackItem,
};
use crate::{MtgError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag for cooperative cancellation
///
/// The engine checks it after every decision it awaits; once set, the
/// action in flight unwinds with `MtgError::Cancelled` and leaves no
/// partial mutation behind.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One seat at the table
pub struct PlayerSetup {
    pub name: String,
    /// Library contents, top first before shuffling
    pub deck: Vec<DefinitionId>,
    pub controller: Box<dyn PlayerController>,
}

impl PlayerSetup {
    pub fn new(name: impl Into<String>, deck: Vec<DefinitionId>, controller: Box<dyn PlayerController>) -> Self {
        PlayerSetup {
            name: name.into(),
            deck,
            controller,
        }
    }
}

pub struct GameEngine {
    pub state: GameState,
    /// Indexed like `state.players`
    pub(crate) controllers: Vec<Box<dyn PlayerController>>,
    pub(crate) config: GameConfig,
    pub(crate) cancel: Option<CancelToken>,
}

/// Build a two-player game: libraries loaded, RNG seeded, nobody has
/// drawn yet
pub fn create_game(config: GameConfig, players: Vec<PlayerSetup>) -> Result<GameEngine> {
    let [first, second]: [PlayerSetup; 2] = players
        .try_into()
        .map_err(|p: Vec<PlayerSetup>| MtgError::InvalidAction(format!("a game needs 2 players, got {}", p.len())))?;

    let mut state = GameState::new_two_player(first.name, second.name, config.starting_life);
    state.seed_rng(config.seed);
    state.logger.set_verbosity(config.verbosity);
    state.logger.set_output_mode(config.output_mode);

    let ids: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
    for (player_id, deck) in ids.iter().zip([&first.deck, &second.deck]) {
        state.get_player_mut(*player_id)?.max_hand_size = config.max_hand_size;
        for &definition in deck {
            state.add_to_library(definition, *player_id)?;
        }
    }

    Ok(GameEngine {
        state,
        controllers: vec![first.controller, second.controller],
        config,
        cancel: None,
    })
}

impl GameEngine {
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Hand a seat to a different controller mid-game
    pub fn set_controller(&mut self, player_id: PlayerId, controller: Box<dyn PlayerController>) -> Result<()> {
        let idx = self
            .state
            .get_player_idx(player_id)
            .ok_or(MtgError::EntityNotFound(player_id.as_u32()))?;
        self.controllers[idx] = controller;
        Ok(())
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.state.players.iter().map(|p| p.id).collect()
    }

    /// Actions `player_id` could take right now that `dispatch` would
    /// accept
    pub fn legal_actions(&self, player_id: PlayerId) -> Vec<GameAction> {
        self.state.legal_actions(player_id)
    }

    /// Winner, draw, or still in progress
    pub fn is_game_over(&self) -> GameOutcome {
        self.state.outcome
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(MtgError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Undo everything since `checkpoint` after a cancellation, keeping
    /// the log; an open cast is refunded either way
    pub(crate) fn roll_back(&mut self, checkpoint: Option<GameState>) -> Result<()> {
        if let Some(mut saved) = checkpoint {
            saved.logger = std::mem::take(&mut self.state.logger);
            self.state = saved;
        }
        self.state.refund_pending_cast()?;
        self.state.logger.normal("game cancelled");
        Ok(())
    }

    /// Bring the state to rest after a mutation: state-based actions,
    /// then any triggers they or the mutation fired go on the stack
    pub(crate) async fn settle(&mut self) -> Result<()> {
        loop {
            self.state.check_state_based_actions()?;
            if self.state.is_game_over()
                || self.state.pending_cast.is_some()
                || self.state.pending_triggers.is_empty()
            {
                return Ok(());
            }
            self.flush_triggers().await?;
        }
    }

    /// Put waiting triggers on the stack in APNAP order, choosing targets
    /// as each goes on
    async fn flush_triggers(&mut self) -> Result<()> {
        for trigger in self.state.take_pending_triggers() {
            let PendingTrigger {
                source,
                source_name,
                controller,
                ability,
                event_player,
            } = trigger;
            let Some(targets) = self.choose_targets(controller, source, &ability.targets, true).await? else {
                self.state
                    .logger
                    .verbose(&format!("{source_name} trigger has no legal target and is removed"));
                continue;
            };
            self.state.logger.normal(&format!(
                "{}'s {} trigger goes on the stack",
                self.state.player_name(controller),
                source_name
            ));
            self.state.stack.push(StackEntry {
                item: StackItem::Ability {
                    source,
                    source_name,
                    ability,
                    event_player,
                },
                controller,
                targets,
            });
        }
        Ok(())
    }

    /// Ask the controller for a target per slot
    ///
    /// Returns `None` when a required slot ends up without a target. A
    /// `forced` choice (triggers) replaces an illegal answer with the
    /// first candidate instead of giving up.
    pub(crate) async fn choose_targets(
        &mut self,
        controller: PlayerId,
        source: CardId,
        specs: &[TargetSpec],
        forced: bool,
    ) -> Result<Option<ChosenTargets>> {
        let mut chosen = ChosenTargets::new();
        let mut taken: Vec<TargetRef> = Vec::new();
        for spec in specs {
            let candidates = self.state.target_candidates(controller, source, spec, &taken);
            if candidates.is_empty() {
                if spec.optional {
                    chosen.push(None);
                    continue;
                }
                return Ok(None);
            }
            let answer = ask!(self, controller, choose_target(source, *spec, &candidates));
            let target = match answer {
                Some(t) if candidates.contains(&t) => Some(t),
                None if spec.optional => None,
                _ if forced => candidates.first().copied(),
                _ => return Ok(None),
            };
            if let Some(t) = target {
                taken.push(t);
            }
            chosen.push(target);
        }
        Ok(Some(chosen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::lookup_id;
    use crate::game::PassController;

    fn setup(deck_size: usize) -> GameEngine {
        let forest = lookup_id("Forest").unwrap();
        let players = vec![
            PlayerSetup::new("Alice", vec![forest; deck_size], Box::new(PassController::new())),
            PlayerSetup::new("Bob", vec![forest; deck_size], Box::new(PassController::new())),
        ];
        create_game(GameConfig::default(), players).unwrap()
    }

    #[test]
    fn test_create_game_loads_libraries() {
        let engine = setup(10);
        let ids = engine.player_ids();
        assert_eq!(engine.state.library_size(ids[0]), 10);
        assert_eq!(engine.state.library_size(ids[1]), 10);
        assert!(engine.state.hand(ids[0]).is_empty());
        assert_eq!(engine.is_game_over(), GameOutcome::InProgress);
    }

    #[test]
    fn test_create_game_needs_two_players() {
        let players = vec![PlayerSetup::new("Solo", Vec::new(), Box::new(PassController::new()))];
        assert!(create_game(GameConfig::default(), players).is_err());
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let engine = setup(1);
        let token = CancelToken::new();
        let engine = engine.with_cancel_token(token.clone());
        assert!(engine.check_cancelled().is_ok());
        token.cancel();
        assert!(matches!(engine.check_cancelled(), Err(MtgError::Cancelled)));
    }

    #[tokio::test]
    async fn test_optional_trigger_target_left_empty() {
        let mut engine = setup(0);
        let p1 = engine.player_ids()[0];
        engine.state.turn.current_step = crate::game::Step::Main1;
        let digger = engine.state.create_card(lookup_id("Gravedigger").unwrap(), p1);
        engine.state.put_onto_battlefield(digger, p1, false).unwrap();
        engine.settle().await.unwrap();
        assert_eq!(engine.state.stack.len(), 1);
        assert_eq!(engine.state.stack.top().unwrap().targets.as_slice(), &[None]);
    }
}
