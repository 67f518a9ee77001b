//! Game loop implementation
//!
//! Drives a game from the opening hands to a result: mulligans, then
//! turn after turn of steps, each with its turn-based actions and a
//! priority round in which the stack resolves one entry at a time.

use crate::core::{CardId, Keyword, PlayerId};
use crate::game::{ActionOutcome, GameAction, GameEndReason, GameEngine, GameEvent, GameStateView, Step};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Rejected answers in one priority window before the player is made to pass
const MAX_REJECTIONS: u32 = 3;

/// Result of running a game to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Winner of the game (None for a draw)
    pub winner: Option<PlayerId>,
    /// Total number of turns played
    pub turns_played: u32,
    pub end_reason: Option<GameEndReason>,
}

impl GameEngine {
    /// Play the game out: opening hands, then turns until someone wins or
    /// the turn limit calls it a draw
    pub async fn run_game(&mut self) -> Result<GameResult> {
        if let Err(e) = self.play_out().await {
            if matches!(e, MtgError::Cancelled) {
                self.state.refund_pending_cast()?;
            }
            return Err(e);
        }
        self.notify_game_end();
        Ok(self.result())
    }

    /// The result so far; `winner` is `None` while in progress or drawn
    pub fn result(&self) -> GameResult {
        GameResult {
            winner: self.state.winner(),
            turns_played: self.state.turn.turn_number.min(self.config.max_turns),
            end_reason: self.state.end_reason,
        }
    }

    async fn play_out(&mut self) -> Result<()> {
        self.start_game().await?;
        while !self.state.is_game_over() {
            if self.state.turn.turn_number > self.config.max_turns {
                self.state.declare_draw(GameEndReason::TurnLimit);
                break;
            }
            self.run_turn().await?;
            if !self.state.is_game_over() {
                let next = self.state.opponent(self.state.turn.active_player)?;
                self.state.turn.next_turn(next);
            }
        }
        self.log_game_over();
        Ok(())
    }

    fn log_game_over(&self) {
        let message = match (self.state.winner(), self.state.end_reason) {
            (Some(winner), reason) => format!("{} wins ({:?})", self.state.player_name(winner), reason),
            (None, reason) => format!("game drawn ({reason:?})"),
        };
        self.state.logger.minimal(&message);
    }

    fn notify_game_end(&mut self) {
        let winner = self.state.winner();
        for (idx, player) in self.state.players.iter().enumerate() {
            let view = GameStateView::new(&self.state, player.id);
            if let Some(controller) = self.controllers.get_mut(idx) {
                controller.on_game_end(&view, winner == Some(player.id));
            }
        }
    }

    /// Shuffle, draw opening hands and take mulligans
    pub(crate) async fn start_game(&mut self) -> Result<()> {
        let ids = self.player_ids();
        self.state.logger.normal(&format!(
            "Game start: {} vs {}",
            self.state.player_name(ids[0]),
            self.state.player_name(ids[1])
        ));
        for &player in &ids {
            self.state.shuffle_library(player);
        }
        for &player in &ids {
            self.take_mulligans(player).await?;
        }
        Ok(())
    }

    /// London mulligan: redraw a full hand each time, then bottom one card
    /// per mulligan taken
    async fn take_mulligans(&mut self, player: PlayerId) -> Result<()> {
        let hand_size = self.config.opening_hand_size;
        loop {
            self.state.draw_cards(player, hand_size as u32)?;
            let taken = self.state.get_player(player)?.mulligans_taken as usize;
            if taken >= hand_size {
                break;
            }
            let hand = self.state.hand(player).to_vec();
            if ask!(self, player, keep_hand(&hand)) {
                break;
            }
            for card in hand {
                self.state.move_card(card, crate::zones::Zone::Library)?;
            }
            self.state.shuffle_library(player);
            self.state.get_player_mut(player)?.mulligans_taken += 1;
            self.state
                .logger
                .normal(&format!("{} mulligans", self.state.player_name(player)));
        }

        let hand = self.state.hand(player).to_vec();
        let count = (self.state.get_player(player)?.mulligans_taken as usize).min(hand.len());
        if count > 0 {
            let answer = ask!(self, player, choose_cards_to_bottom(&hand, count));
            let mut bottom: SmallVec<[CardId; 7]> = SmallVec::new();
            for card in answer {
                if hand.contains(&card) && !bottom.contains(&card) {
                    bottom.push(card);
                }
            }
            if bottom.len() != count {
                bottom = hand.iter().rev().take(count).copied().collect();
            }
            let zones = self
                .state
                .get_player_zones_mut(player)
                .ok_or(MtgError::EntityNotFound(player.as_u32()))?;
            for &card in &bottom {
                zones.hand.remove(card);
                zones.library.add_to_bottom(card);
            }
        }
        self.state.logger.normal(&format!(
            "{} keeps {} cards",
            self.state.player_name(player),
            self.state.hand(player).len()
        ));
        Ok(())
    }

    /// Run the active player's turn through every step
    pub(crate) async fn run_turn(&mut self) -> Result<()> {
        let active = self.state.turn.active_player;
        self.state.logger.normal(&format!(
            "=== Turn {} ({}) ===",
            self.state.turn.turn_number,
            self.state.player_name(active)
        ));
        self.log_board();
        loop {
            self.execute_step().await?;
            self.state.empty_mana_pools();
            if self.state.is_game_over() || !self.state.turn.advance_step() {
                break;
            }
        }
        Ok(())
    }

    fn log_board(&self) {
        for player in &self.state.players {
            let permanents: Vec<String> = self
                .state
                .permanents_of(player.id)
                .into_iter()
                .map(|c| self.state.card_name(c))
                .collect();
            log_if_verbose!(
                self.state,
                "{}: {} life, {} in hand, {} in library; {}",
                self.state.player_name(player.id),
                player.life,
                self.state.hand(player.id).len(),
                self.state.library_size(player.id),
                permanents.join(", ")
            );
        }
    }

    async fn execute_step(&mut self) -> Result<()> {
        let step = self.state.turn.current_step;
        let active = self.state.turn.active_player;
        log_if_verbose!(self.state, "-- {} step --", step);

        match step {
            Step::Untap => {
                self.state.get_player_mut(active)?.reset_lands_played();
                self.state.untap_all(active);
            }
            Step::Upkeep => {
                self.state.fire_event(GameEvent::UpkeepBegan { player: active });
                self.priority_round().await?;
            }
            Step::Draw => {
                if self.state.turn.turn_number == 1 {
                    log_if_verbose!(self.state, "the starting player skips the first draw");
                } else {
                    self.state.draw_card(active)?;
                    self.priority_round().await?;
                }
            }
            Step::Main1 | Step::BeginCombat | Step::Main2 => self.priority_round().await?,
            Step::DeclareAttackers => {
                self.declare_attackers().await?;
                if !self.state.combat.attackers.is_empty() {
                    self.priority_round().await?;
                }
            }
            Step::DeclareBlockers => {
                if !self.state.combat.attackers.is_empty() {
                    self.declare_blockers().await?;
                    self.priority_round().await?;
                }
            }
            Step::FirstStrikeDamage => {
                if !self.state.combat.attackers.is_empty() && self.state.any_first_strike_in_combat() {
                    self.state.assign_combat_damage(true)?;
                    self.priority_round().await?;
                }
            }
            Step::CombatDamage => {
                if !self.state.combat.attackers.is_empty() {
                    self.state.assign_combat_damage(false)?;
                    self.priority_round().await?;
                }
            }
            Step::EndCombat => self.state.combat.clear(),
            Step::End => {
                self.state.fire_event(GameEvent::EndStepBegan { player: active });
                self.priority_round().await?;
            }
            Step::Cleanup => {
                let excess = self
                    .state
                    .hand(active)
                    .len()
                    .saturating_sub(self.state.get_player(active)?.max_hand_size);
                if excess > 0 {
                    self.discard(active, active, excess).await?;
                }
                self.state.cleanup_end_of_turn();
            }
        }
        Ok(())
    }

    async fn declare_attackers(&mut self) -> Result<()> {
        let active = self.state.turn.active_player;
        let defender = self.state.opponent(active)?;
        let candidates = self.state.attack_candidates(active);
        if candidates.is_empty() {
            return Ok(());
        }

        let chosen = ask!(self, active, choose_attackers(&candidates));
        let mut declared: Vec<CardId> = Vec::new();
        for attacker in chosen {
            if !candidates.contains(&attacker) || declared.contains(&attacker) {
                self.state.logger.rejected(&format!(
                    "{} cannot attack with {}",
                    self.state.player_name(active),
                    self.state.card_name(attacker)
                ));
                continue;
            }
            if !self.state.has_keyword(attacker, Keyword::Vigilance) {
                self.state.cards.get_mut(attacker)?.tap();
            }
            self.state.combat.declare_attacker(attacker, defender);
            declared.push(attacker);
        }

        if !declared.is_empty() {
            let names: Vec<String> = declared.iter().map(|&c| self.state.card_name(c)).collect();
            self.state.logger.normal(&format!(
                "{} attacks with {}",
                self.state.player_name(active),
                names.join(", ")
            ));
        }
        Ok(())
    }

    async fn declare_blockers(&mut self) -> Result<()> {
        let active = self.state.turn.active_player;
        let defender = self.state.opponent(active)?;
        let attackers = self.state.combat.get_attackers();
        let candidates: Vec<CardId> = self
            .state
            .creatures_of(defender)
            .into_iter()
            .filter(|&c| self.state.cards.get(c).is_ok_and(|card| !card.tapped))
            .collect();

        if !candidates.is_empty() {
            let chosen = ask!(self, defender, choose_blockers(&candidates, &attackers));
            for (blocker, attacker) in chosen {
                let legal = candidates.contains(&blocker)
                    && attackers.contains(&attacker)
                    && !self.state.combat.is_blocking(blocker)
                    && self.state.can_block(blocker, attacker);
                if !legal {
                    self.state.logger.rejected(&format!(
                        "{} cannot block {} with {}",
                        self.state.player_name(defender),
                        self.state.card_name(attacker),
                        self.state.card_name(blocker)
                    ));
                    continue;
                }
                self.state.combat.declare_blocker(blocker, attacker);
                self.state.logger.normal(&format!(
                    "{} blocks {}",
                    self.state.card_name(blocker),
                    self.state.card_name(attacker)
                ));
            }
        }

        for attacker in attackers {
            let blockers = self.state.combat.get_blockers(attacker);
            if blockers.len() < 2 {
                continue;
            }
            let order = ask!(self, active, order_blockers(attacker, &blockers));
            let is_permutation =
                order.len() == blockers.len() && blockers.iter().all(|b| order.contains(b));
            if is_permutation {
                self.state.combat.set_blocker_order(attacker, order);
            }
        }
        self.state.combat.blockers_declared = true;
        Ok(())
    }

    /// Players take actions until both pass in succession with an empty
    /// stack; two passes over a non-empty stack resolve its top entry
    pub(crate) async fn priority_round(&mut self) -> Result<()> {
        let active = self.state.turn.active_player;
        let mut current = active;
        let mut passes = 0;
        let mut actions_taken = 0u32;
        let mut rejections = 0u32;

        self.settle().await?;
        while !self.state.is_game_over() {
            self.state.turn.priority_player = Some(current);
            let legal = self.state.legal_actions(current);
            let mid_cast = self
                .state
                .pending_cast
                .as_ref()
                .is_some_and(|p| p.controller == current);
            let forced = actions_taken >= self.config.max_actions_per_window || rejections >= MAX_REJECTIONS;

            let action = if forced {
                if mid_cast {
                    GameAction::CancelCast
                } else {
                    GameAction::PassPriority
                }
            } else if legal.len() == 1 && legal[0] == GameAction::PassPriority {
                GameAction::PassPriority
            } else {
                let choice = ask!(self, current, choose_action(&legal));
                if !legal.contains(&choice) {
                    self.state.logger.rejected(&format!(
                        "{}: {} is not available now",
                        self.state.player_name(current),
                        choice.describe(&self.state)
                    ));
                    rejections += 1;
                    continue;
                }
                choice
            };

            match self.dispatch(current, action).await? {
                ActionOutcome::Passed => {
                    passes += 1;
                    actions_taken = 0;
                    rejections = 0;
                    if passes < 2 {
                        current = self.state.opponent(current)?;
                        continue;
                    }
                    if self.state.stack.is_empty() {
                        break;
                    }
                    self.resolve_top().await?;
                    passes = 0;
                    current = active;
                }
                ActionOutcome::Rejected(_) => rejections += 1,
                ActionOutcome::Done | ActionOutcome::AwaitingPayment => {
                    passes = 0;
                    actions_taken += 1;
                }
            }
        }
        self.state.turn.priority_player = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::lookup_id;
    use crate::game::{create_game, GameConfig, PassController, PlayerSetup, ScriptedController};
    use crate::zones::Zone;

    fn engine_with(deck: &[&str], first: ScriptedController, max_turns: u32) -> GameEngine {
        let ids: Vec<_> = deck.iter().map(|n| lookup_id(n).unwrap()).collect();
        let players = vec![
            PlayerSetup::new("Alice", ids.clone(), Box::new(first)),
            PlayerSetup::new("Bob", ids, Box::new(PassController::new())),
        ];
        create_game(GameConfig::default().with_max_turns(max_turns), players).unwrap()
    }

    #[tokio::test]
    async fn test_pass_game_ends_in_turn_limit_draw() {
        let deck = vec!["Forest"; 40];
        let mut engine = engine_with(&deck, ScriptedController::new(), 6);
        let result = engine.run_game().await.unwrap();
        assert_eq!(result.winner, None);
        assert_eq!(result.end_reason, Some(GameEndReason::TurnLimit));
        assert_eq!(result.turns_played, 6);
    }

    #[tokio::test]
    async fn test_small_library_decks_out() {
        let deck = vec!["Forest"; 8];
        let mut engine = engine_with(&deck, ScriptedController::new(), 60);
        let result = engine.run_game().await.unwrap();
        assert_eq!(result.end_reason, Some(GameEndReason::EmptyLibrary));
        // Alice starts and skips her first draw, so Bob runs out first
        assert_eq!(result.winner, Some(engine.player_ids()[0]));
    }

    #[tokio::test]
    async fn test_mulligan_bottoms_one_card() {
        let deck = vec!["Forest"; 20];
        let mut script = ScriptedController::new();
        script.push_keep(false);
        script.push_keep(true);
        let mut engine = engine_with(&deck, script, 5);
        let p1 = engine.player_ids()[0];
        engine.start_game().await.unwrap();
        assert_eq!(engine.state.hand(p1).len(), 6);
        assert_eq!(engine.state.library_size(p1), 14);
        assert_eq!(engine.state.get_player(p1).unwrap().mulligans_taken, 1);
    }

    #[tokio::test]
    async fn test_cleanup_discards_to_hand_size() {
        let deck = vec!["Forest"; 20];
        let mut engine = engine_with(&deck, ScriptedController::new(), 5);
        let p1 = engine.player_ids()[0];
        for _ in 0..9 {
            engine.state.add_to_hand(lookup_id("Grizzly Bears").unwrap(), p1).unwrap();
        }
        engine.state.turn.current_step = Step::Cleanup;
        engine.execute_step().await.unwrap();
        assert_eq!(engine.state.hand(p1).len(), 7);
        assert_eq!(engine.state.graveyard(p1).len(), 2);
    }

    #[tokio::test]
    async fn test_attack_taps_and_deals_damage() {
        let deck = vec!["Forest"; 20];
        let mut script = ScriptedController::new();
        let mut engine = engine_with(&deck, ScriptedController::new(), 5);
        let (p1, p2) = (engine.player_ids()[0], engine.player_ids()[1]);
        let bears = engine.state.create_card(lookup_id("Grizzly Bears").unwrap(), p1);
        engine.state.put_onto_battlefield(bears, p1, false).unwrap();
        engine.state.turn.turn_number = 3;
        script.push_attackers(&[bears]);
        engine.controllers[0] = Box::new(script);

        engine.state.turn.current_step = Step::DeclareAttackers;
        engine.execute_step().await.unwrap();
        assert!(engine.state.card(bears).unwrap().tapped);
        assert!(engine.state.combat.is_attacking(bears));

        engine.state.turn.current_step = Step::CombatDamage;
        engine.execute_step().await.unwrap();
        assert_eq!(engine.state.get_player(p2).unwrap().life, 18);
        assert_eq!(engine.state.zone_of(bears), Some(Zone::Battlefield));
    }

    #[tokio::test]
    async fn test_illegal_attacker_is_ignored() {
        let deck = vec!["Forest"; 20];
        let mut script = ScriptedController::new();
        let mut engine = engine_with(&deck, ScriptedController::new(), 5);
        let p1 = engine.player_ids()[0];
        let bears = engine.state.create_card(lookup_id("Grizzly Bears").unwrap(), p1);
        // Entered this turn: summoning sick
        engine.state.put_onto_battlefield(bears, p1, false).unwrap();
        script.push_attackers(&[bears]);
        engine.controllers[0] = Box::new(script);

        engine.state.turn.current_step = Step::DeclareAttackers;
        engine.execute_step().await.unwrap();
        assert!(!engine.state.combat.is_attacking(bears));
    }

    #[tokio::test]
    async fn test_stack_resolves_after_both_pass() {
        let deck = vec!["Forest"; 20];
        let mut script = ScriptedController::new();
        let mut engine = engine_with(&deck, ScriptedController::new(), 5);
        let p1 = engine.player_ids()[0];
        let mountain = engine.state.create_card(lookup_id("Mountain").unwrap(), p1);
        engine.state.put_onto_battlefield(mountain, p1, false).unwrap();
        let swiftspear = engine.state.add_to_hand(lookup_id("Monastery Swiftspear").unwrap(), p1).unwrap();
        script.push_action(GameAction::TapForMana { card: mountain });
        script.push_action(GameAction::CastSpell {
            card: swiftspear,
            method: crate::game::CastMethod::Normal,
        });
        engine.controllers[0] = Box::new(script);

        engine.state.turn.current_step = Step::Main1;
        engine.priority_round().await.unwrap();
        assert_eq!(engine.state.zone_of(swiftspear), Some(Zone::Battlefield));
        assert!(engine.state.stack.is_empty());
        assert_eq!(engine.state.get_player(p1).unwrap().mana_pool.total(), 0);
        assert_eq!(engine.state.turn.priority_player, None);
    }
}
