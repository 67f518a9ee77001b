//! Main game state structure

use crate::cards::{DefinitionId, StaticAbility};
use crate::core::{
    CardId, CardType, CounterType, EntityId, EntityStore, GameCard, Keyword, LandType, Player, PlayerId,
    TokenSpec,
};
use crate::game::{
    Affected, CastMethod, ChosenTargets, CombatState, ContinuousEffect, ContinuousEffects, ContinuousKind, DelayedTrigger, Duration,
    GameEvent, GameLogger, PendingCast, PendingTrigger, Stack, StackEntry, TurnStructure,
};
use crate::zones::{CardZone, PlayerZones, Zone};
use crate::{MtgError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// How a finished game was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEndReason {
    /// A player's life total reached zero
    LifeTotal,
    /// A player drew from an empty library
    EmptyLibrary,
    /// A player failed to pay a "pay or lose the game" cost
    UnpaidCost,
    /// The turn limit was reached
    TurnLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    InProgress,
    Winner(PlayerId),
    Draw,
}

/// Complete game state
///
/// Everything a controller can observe, plus the RNG. Clone is cheap
/// enough to checkpoint a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// All cards in the game
    pub cards: EntityStore<GameCard>,

    /// All players in turn order
    pub players: Vec<Player>,

    /// Zones for each player
    pub player_zones: Vec<(PlayerId, PlayerZones)>,

    /// Shared battlefield (all players)
    pub battlefield: CardZone,

    pub stack: Stack,

    pub turn: TurnStructure,

    /// Combat state (active during combat phase)
    pub combat: CombatState,

    pub continuous: ContinuousEffects,

    /// Triggers that fired but are not on the stack yet
    pub pending_triggers: Vec<PendingTrigger>,

    pub delayed_triggers: Vec<DelayedTrigger>,

    /// A spell whose Phyrexian mana is still being paid
    pub pending_cast: Option<PendingCast>,

    pub outcome: GameOutcome,
    pub end_reason: Option<GameEndReason>,

    /// Gameplay RNG (shuffles); RefCell so read-only views can still draw
    pub rng: RefCell<ChaCha12Rng>,

    /// Unified entity ID generator (shared across all entity types)
    next_entity_id: u32,

    pub logger: GameLogger,
}

impl GameState {
    /// Create a new game with two players; the first player starts
    pub fn new_two_player(player1_name: String, player2_name: String, starting_life: i32) -> Self {
        let p1_id = PlayerId::new(0);
        let p2_id = PlayerId::new(1);
        // Shared zones need an owner id that is not a player
        let shared_id = PlayerId::new(2);

        GameState {
            cards: EntityStore::new(),
            players: vec![
                Player::new(p1_id, player1_name, starting_life),
                Player::new(p2_id, player2_name, starting_life),
            ],
            player_zones: vec![(p1_id, PlayerZones::new(p1_id)), (p2_id, PlayerZones::new(p2_id))],
            battlefield: CardZone::new(Zone::Battlefield, shared_id),
            stack: Stack::new(),
            turn: TurnStructure::new(p1_id),
            combat: CombatState::new(),
            continuous: ContinuousEffects::new(),
            pending_triggers: Vec::new(),
            delayed_triggers: Vec::new(),
            pending_cast: None,
            outcome: GameOutcome::InProgress,
            end_reason: None,
            rng: RefCell::new(ChaCha12Rng::seed_from_u64(0)),
            next_entity_id: 3,
            logger: GameLogger::new(),
        }
    }

    /// Reseed the gameplay RNG
    pub fn seed_rng(&mut self, seed: u64) {
        *self.rng.borrow_mut() = ChaCha12Rng::seed_from_u64(seed);
    }

    pub fn shuffle_library(&mut self, player_id: PlayerId) {
        if let Some(zones) = self
            .player_zones
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, z)| z)
        {
            zones.library.shuffle(&mut *self.rng.borrow_mut());
        }
    }

    pub fn next_id<T>(&mut self) -> EntityId<T> {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    pub fn next_card_id(&mut self) -> CardId {
        self.next_id()
    }

    /// Create a card instance outside of every zone
    pub fn create_card(&mut self, definition: DefinitionId, owner: PlayerId) -> CardId {
        let id = self.next_card_id();
        self.cards.insert(id, GameCard::new(id, definition, owner));
        id
    }

    /// Create a card on top of its owner's library
    pub fn add_to_library(&mut self, definition: DefinitionId, owner: PlayerId) -> Result<CardId> {
        let id = self.create_card(definition, owner);
        self.zones_mut(owner)?.library.add_to_top(id);
        Ok(id)
    }

    /// Create a card directly in its owner's hand
    pub fn add_to_hand(&mut self, definition: DefinitionId, owner: PlayerId) -> Result<CardId> {
        let id = self.create_card(definition, owner);
        self.zones_mut(owner)?.hand.add(id);
        Ok(id)
    }

    pub fn get_player_zones(&self, player_id: PlayerId) -> Option<&PlayerZones> {
        self.player_zones
            .iter()
            .find(|(id, _)| *id == player_id)
            .map(|(_, zones)| zones)
    }

    pub fn get_player_zones_mut(&mut self, player_id: PlayerId) -> Option<&mut PlayerZones> {
        self.player_zones
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, zones)| zones)
    }

    fn zones_mut(&mut self, player_id: PlayerId) -> Result<&mut PlayerZones> {
        self.get_player_zones_mut(player_id)
            .ok_or(MtgError::EntityNotFound(player_id.as_u32()))
    }

    pub fn get_player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn get_player_idx(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// The other player of a two-player game
    pub fn opponent(&self, player_id: PlayerId) -> Result<PlayerId> {
        self.players
            .iter()
            .find(|p| p.id != player_id)
            .map(|p| p.id)
            .ok_or(MtgError::EntityNotFound(player_id.as_u32()))
    }

    pub fn card(&self, id: CardId) -> Result<&GameCard> {
        self.cards.get(id)
    }

    pub fn card_name(&self, id: CardId) -> String {
        self.cards
            .get(id)
            .map(|c| c.name.to_string())
            .unwrap_or_else(|_| format!("card {id}"))
    }

    pub fn player_name(&self, id: PlayerId) -> String {
        self.get_player(id)
            .map(|p| p.name.to_string())
            .unwrap_or_else(|_| format!("player {id}"))
    }

    pub fn hand(&self, player_id: PlayerId) -> &[CardId] {
        self.get_player_zones(player_id)
            .map(|z| z.hand.cards.as_slice())
            .unwrap_or(&[])
    }

    pub fn graveyard(&self, player_id: PlayerId) -> &[CardId] {
        self.get_player_zones(player_id)
            .map(|z| z.graveyard.cards.as_slice())
            .unwrap_or(&[])
    }

    pub fn library_size(&self, player_id: PlayerId) -> usize {
        self.get_player_zones(player_id).map(|z| z.library.len()).unwrap_or(0)
    }

    /// Where a card currently is
    pub fn zone_of(&self, card_id: CardId) -> Option<Zone> {
        if self.battlefield.contains(card_id) {
            return Some(Zone::Battlefield);
        }
        if self.stack.contains_spell(card_id) {
            return Some(Zone::Stack);
        }
        let owner = self.cards.get(card_id).ok()?.owner;
        let zones = self.get_player_zones(owner)?;
        [Zone::Hand, Zone::Library, Zone::Graveyard, Zone::Exile]
            .into_iter()
            .find(|&z| zones.get_zone(z).is_some_and(|zone| zone.contains(card_id)))
    }

    fn remove_from_current_zone(&mut self, card_id: CardId) -> Option<Zone> {
        let from = self.zone_of(card_id)?;
        match from {
            Zone::Battlefield => {
                self.battlefield.remove(card_id);
            }
            Zone::Stack => {
                self.stack.remove_spell(card_id);
            }
            zone => {
                let owner = self.cards.get(card_id).ok()?.owner;
                if let Some(z) = self.get_player_zones_mut(owner).and_then(|z| z.get_zone_mut(zone)) {
                    z.remove(card_id);
                }
            }
        }
        Some(from)
    }

    /// Move a card to one of its owner's zones (not the battlefield)
    ///
    /// Leaving the battlefield clears per-permanent state and static
    /// effects; a creature going to the graveyard fires `Died`; a token
    /// that leaves the battlefield ceases to exist.
    pub fn move_card(&mut self, card_id: CardId, to: Zone) -> Result<()> {
        if to == Zone::Battlefield {
            let owner = self.cards.get(card_id)?.owner;
            return self.put_onto_battlefield(card_id, owner, false);
        }
        if to == Zone::Stack {
            return Err(MtgError::InvalidAction(
                "cards reach the stack only by being cast".to_string(),
            ));
        }

        let from = self.remove_from_current_zone(card_id);
        let (owner, controller, was_creature, is_token) = {
            let card = self.cards.get(card_id)?;
            (card.owner, card.controller, card.is_creature(), card.is_token())
        };

        if from == Some(Zone::Battlefield) {
            self.continuous.remove_from_source(card_id);
            self.continuous.remove_affecting(card_id);
            self.combat.remove(card_id);
            self.cards.get_mut(card_id)?.reset_for_zone_change();
            if to == Zone::Graveyard && was_creature {
                self.fire_event(GameEvent::Died {
                    card: card_id,
                    controller,
                });
            }
        }

        if is_token {
            if from == Some(Zone::Battlefield) || from.is_none() {
                self.cards.remove(card_id);
            }
            return Ok(());
        }

        let zones = self.zones_mut(owner)?;
        match to {
            Zone::Library => zones.library.add_to_top(card_id),
            Zone::Hand => zones.hand.add(card_id),
            Zone::Graveyard => zones.graveyard.add(card_id),
            Zone::Exile => zones.exile.add(card_id),
            Zone::Battlefield | Zone::Stack => {}
        }
        Ok(())
    }

    /// Put a card onto the battlefield under `controller`'s control
    pub fn put_onto_battlefield(&mut self, card_id: CardId, controller: PlayerId, tapped: bool) -> Result<()> {
        self.remove_from_current_zone(card_id);
        let turn = self.turn.turn_number;
        let card = self.cards.get_mut(card_id)?;
        card.reset_for_zone_change();
        card.controller = controller;
        card.entered_turn = Some(turn);
        let def = card.def();
        card.tapped = tapped || def.is_some_and(|d| d.enters_tapped);
        if let Some(loyalty) = def.and_then(|d| d.loyalty) {
            card.add_counters(CounterType::Loyalty, loyalty);
        }
        self.battlefield.add(card_id);

        if let Some(def) = def {
            for ability in &def.statics {
                let kind = match *ability {
                    StaticAbility::CreaturesYouControlGet { power, toughness } => ContinuousKind::ModifyPowerToughness {
                        affected: Affected::CreaturesControlledBy(controller),
                        power,
                        toughness,
                    },
                    StaticAbility::CreaturesYouControlHave(keyword) => ContinuousKind::GrantKeyword {
                        affected: Affected::CreaturesControlledBy(controller),
                        keyword,
                    },
                    StaticAbility::SpellsCostLess { amount, scope } => ContinuousKind::CostReduction { amount, scope },
                };
                self.continuous.add(ContinuousEffect {
                    source: card_id,
                    controller,
                    kind,
                    duration: Duration::WhileSourceOnBattlefield,
                });
            }
        }

        self.fire_event(GameEvent::EnteredBattlefield {
            card: card_id,
            controller,
        });
        Ok(())
    }

    /// Move a card from wherever it is onto the stack as a spell
    pub fn put_spell_on_stack(
        &mut self,
        card_id: CardId,
        method: CastMethod,
        controller: PlayerId,
        targets: ChosenTargets,
    ) -> Result<()> {
        if self.remove_from_current_zone(card_id).is_none() {
            return Err(MtgError::InvalidAction(format!(
                "{} is not in any zone",
                self.card_name(card_id)
            )));
        }
        self.stack.push(StackEntry::spell(card_id, method, controller, targets));
        Ok(())
    }

    pub fn create_token(&mut self, spec: TokenSpec, controller: PlayerId) -> Result<CardId> {
        let id = self.next_card_id();
        self.cards.insert(id, GameCard::new_token(id, spec, controller));
        self.put_onto_battlefield(id, controller, false)?;
        Ok(id)
    }

    /// Draw a card; drawing from an empty library is recorded for the
    /// state-based check rather than failing
    pub fn draw_card(&mut self, player_id: PlayerId) -> Result<Option<CardId>> {
        let zones = self.zones_mut(player_id)?;
        match zones.library.draw_top() {
            Some(card_id) => {
                zones.hand.add(card_id);
                self.logger.verbose(&format!(
                    "{} draws {}",
                    self.player_name(player_id),
                    self.card_name(card_id)
                ));
                Ok(Some(card_id))
            }
            None => {
                self.get_player_mut(player_id)?.drew_from_empty_library = true;
                self.logger
                    .normal(&format!("{} tries to draw from an empty library", self.player_name(player_id)));
                Ok(None)
            }
        }
    }

    pub fn draw_cards(&mut self, player_id: PlayerId, count: u32) -> Result<()> {
        for _ in 0..count {
            self.draw_card(player_id)?;
        }
        Ok(())
    }

    /// Put the top `count` cards of a library into its graveyard
    pub fn mill(&mut self, player_id: PlayerId, count: u32) -> Result<Vec<CardId>> {
        let mut milled = Vec::new();
        for _ in 0..count {
            let Some(card_id) = self.zones_mut(player_id)?.library.draw_top() else {
                break;
            };
            self.zones_mut(player_id)?.graveyard.add(card_id);
            milled.push(card_id);
        }
        Ok(milled)
    }

    /// Current power, counters and continuous effects included
    pub fn power(&self, card_id: CardId) -> i32 {
        let Ok(card) = self.cards.get(card_id) else {
            return 0;
        };
        let (bonus, _) = self.continuous.power_toughness_bonus(card_id, card.controller);
        card.base_power() + card.counter(CounterType::PlusOnePlusOne) - card.counter(CounterType::MinusOneMinusOne)
            + bonus
    }

    pub fn toughness(&self, card_id: CardId) -> i32 {
        let Ok(card) = self.cards.get(card_id) else {
            return 0;
        };
        let (_, bonus) = self.continuous.power_toughness_bonus(card_id, card.controller);
        card.base_toughness() + card.counter(CounterType::PlusOnePlusOne)
            - card.counter(CounterType::MinusOneMinusOne)
            + bonus
    }

    /// Printed keywords plus anything granted by continuous effects
    pub fn has_keyword(&self, card_id: CardId, keyword: Keyword) -> bool {
        self.cards.get(card_id).is_ok_and(|c| {
            c.has_printed_keyword(keyword)
                || (c.is_creature() && self.continuous.grants_keyword(card_id, c.controller, keyword))
        })
    }

    /// A creature that came under its controller's control this turn
    /// and lacks haste
    pub fn is_summoning_sick(&self, card_id: CardId) -> bool {
        let Ok(card) = self.cards.get(card_id) else {
            return false;
        };
        card.is_creature()
            && card.entered_turn == Some(self.turn.turn_number)
            && !self.has_keyword(card_id, Keyword::Haste)
    }

    /// Permanents controlled by a player, in battlefield order
    pub fn permanents_of(&self, player_id: PlayerId) -> Vec<CardId> {
        self.battlefield
            .iter()
            .filter(|&id| self.cards.get(id).is_ok_and(|c| c.controller == player_id))
            .collect()
    }

    pub fn creatures_of(&self, player_id: PlayerId) -> Vec<CardId> {
        self.battlefield
            .iter()
            .filter(|&id| {
                self.cards
                    .get(id)
                    .is_ok_and(|c| c.controller == player_id && c.is_creature())
            })
            .collect()
    }

    pub fn lands_of_type(&self, player_id: PlayerId, land_type: LandType) -> Vec<CardId> {
        self.battlefield
            .iter()
            .filter(|&id| {
                self.cards.get(id).is_ok_and(|c| {
                    c.controller == player_id && c.def().is_some_and(|d| d.is_land() && d.land_types().contains(&land_type))
                })
            })
            .collect()
    }

    pub fn untap_all(&mut self, player_id: PlayerId) {
        for card_id in self.battlefield.cards.iter() {
            if let Ok(card) = self.cards.get_mut(*card_id) {
                if card.controller == player_id {
                    card.untap();
                    card.loyalty_activated = false;
                }
            }
        }
    }

    pub fn empty_mana_pools(&mut self) {
        for player in &mut self.players {
            player.empty_mana_pool();
        }
    }

    /// Cleanup step: damage wears off and "until end of turn" ends
    pub fn cleanup_end_of_turn(&mut self) {
        for card_id in self.battlefield.cards.iter() {
            if let Ok(card) = self.cards.get_mut(*card_id) {
                card.damage = 0;
                card.deathtouch_damage = false;
            }
        }
        self.continuous.expire_end_of_turn();
    }

    /// Record that a player lost; the first recorded reason ends the game
    pub fn mark_lost(&mut self, player_id: PlayerId, reason: GameEndReason) -> Result<()> {
        let name = self.player_name(player_id);
        let player = self.get_player_mut(player_id)?;
        if player.has_lost {
            return Ok(());
        }
        player.has_lost = true;
        self.logger.minimal(&format!("{name} loses the game ({reason:?})"));
        if self.end_reason.is_none() {
            self.end_reason = Some(reason);
        }
        Ok(())
    }

    /// Perform state-based actions until none apply
    ///
    /// Returns whether anything happened.
    pub fn check_state_based_actions(&mut self) -> Result<bool> {
        let mut any = false;
        loop {
            let mut changed = false;

            let losers: Vec<(PlayerId, GameEndReason)> = self
                .players
                .iter()
                .filter(|p| !p.has_lost)
                .filter_map(|p| {
                    if p.life <= 0 {
                        Some((p.id, GameEndReason::LifeTotal))
                    } else if p.drew_from_empty_library {
                        Some((p.id, GameEndReason::EmptyLibrary))
                    } else {
                        None
                    }
                })
                .collect();
            for (player, reason) in losers {
                self.mark_lost(player, reason)?;
                changed = true;
            }
            for player in &mut self.players {
                player.drew_from_empty_library = false;
            }

            let mut doomed = Vec::new();
            for card_id in self.battlefield.iter() {
                let card = self.cards.get(card_id)?;
                if card.is_creature() {
                    let toughness = self.toughness(card_id);
                    if toughness <= 0 || card.damage >= toughness || (card.deathtouch_damage && card.damage > 0) {
                        doomed.push(card_id);
                        continue;
                    }
                }
                if card.is_planeswalker() && card.loyalty() <= 0 {
                    doomed.push(card_id);
                    continue;
                }
                if card.def().is_some_and(|d| d.is_aura())
                    && !card.attached_to.is_some_and(|host| self.battlefield.contains(host))
                {
                    doomed.push(card_id);
                    continue;
                }
                // Two planeswalkers of the same kind: the newer one stays
                if card.is_planeswalker() {
                    let duplicate = self.battlefield.iter().skip_while(|&id| id != card_id).skip(1).any(|other| {
                        self.cards.get(other).is_ok_and(|o| {
                            o.is_planeswalker() && o.controller == card.controller && o.name == card.name
                        })
                    });
                    if duplicate {
                        doomed.push(card_id);
                    }
                }
            }
            for card_id in doomed {
                self.logger
                    .normal(&format!("{} is put into the graveyard", self.card_name(card_id)));
                self.move_card(card_id, Zone::Graveyard)?;
                changed = true;
            }

            if !changed {
                break;
            }
            any = true;
        }
        self.update_outcome();
        Ok(any)
    }

    fn update_outcome(&mut self) {
        if self.outcome != GameOutcome::InProgress {
            return;
        }
        let alive: Vec<PlayerId> = self.players.iter().filter(|p| !p.has_lost).map(|p| p.id).collect();
        self.outcome = match alive.as_slice() {
            [] => GameOutcome::Draw,
            [winner] => GameOutcome::Winner(*winner),
            _ => GameOutcome::InProgress,
        };
    }

    /// End the game as a draw (turn limit)
    pub fn declare_draw(&mut self, reason: GameEndReason) {
        if self.outcome == GameOutcome::InProgress {
            self.outcome = GameOutcome::Draw;
            self.end_reason = Some(reason);
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome != GameOutcome::InProgress
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome {
            GameOutcome::Winner(p) => Some(p),
            GameOutcome::InProgress | GameOutcome::Draw => None,
        }
    }

    /// Card type check that tolerates missing cards
    pub fn is_type(&self, card_id: CardId, card_type: CardType) -> bool {
        self.cards.get(card_id).is_ok_and(|c| c.is_type(card_type))
    }
}
