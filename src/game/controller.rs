//! Player controller trait and game state view
//!
//! This module defines the interface between the game engine and player
//! controllers (AI, scripted tests, or a human front end). The engine
//! calls the controller whenever a decision is needed and awaits the
//! answer; the controller inspects a read-only view of the game state.
//!
//! Every decision returns a boxed local future, so an implementation can
//! answer immediately (`decided(..)`) or suspend for as long as it needs
//! (waiting on a UI channel, running a search). The engine does nothing
//! between asking and receiving the answer, and every answer is validated
//! before use.

use crate::core::{CardId, Color, ManaCost, ManaPool, Player, PlayerId, TargetRef, TargetSpec};
use crate::game::{GameAction, GameLogger, GameState, PendingCast, Step};
use crate::zones::Zone;
use futures::future::{FutureExt, LocalBoxFuture};
use smallvec::SmallVec;

/// A pending answer from a controller
pub type Decision<'a, T> = LocalBoxFuture<'a, T>;

/// Wrap an answer that needs no waiting
pub fn decided<'a, T: 'a>(value: T) -> Decision<'a, T> {
    futures::future::ready(value).boxed_local()
}

/// Why the engine is asking the controller to pick a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPrompt {
    /// Library search; `None` means fail to find
    Search,
    /// Put a card from hand on top of the library
    PutBack,
    /// Sacrifice one of these creatures
    Sacrifice,
    /// Exile a card from hand to pay an alternate cost
    ExileForCost,
    /// Return a land to hand to pay an alternate cost
    ReturnLand,
}

/// Why the engine is offering an optional payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentReason {
    /// Pay or the spell is countered
    KeepSpell { spell: CardId },
    /// Pay or lose the game
    AvoidLosing,
}

/// Which of two piles a player takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pile {
    First,
    Second,
}

/// Read-only view of game state for controllers
///
/// This provides access to game information without allowing mutation.
/// Controllers should only inspect this view to make decisions.
pub struct GameStateView<'a> {
    game: &'a GameState,
    player_id: PlayerId,
}

impl<'a> GameStateView<'a> {
    /// Create a new view of the game state from a player's perspective
    pub fn new(game: &'a GameState, player_id: PlayerId) -> Self {
        GameStateView { game, player_id }
    }

    /// The player this view belongs to
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// The whole state, for helpers that take a `&GameState`
    pub fn game(&self) -> &'a GameState {
        self.game
    }

    pub fn logger(&self) -> &'a GameLogger {
        &self.game.logger
    }

    pub fn player(&self) -> Option<&'a Player> {
        self.game.get_player(self.player_id).ok()
    }

    pub fn opponent_id(&self) -> Option<PlayerId> {
        self.game.opponent(self.player_id).ok()
    }

    pub fn opponent(&self) -> Option<&'a Player> {
        self.opponent_id().and_then(|id| self.game.get_player(id).ok())
    }

    /// Cards in this player's hand
    pub fn hand(&self) -> &'a [CardId] {
        self.game.hand(self.player_id)
    }

    pub fn graveyard(&self) -> &'a [CardId] {
        self.game.graveyard(self.player_id)
    }

    pub fn battlefield(&self) -> &'a [CardId] {
        &self.game.battlefield.cards
    }

    pub fn my_permanents(&self) -> Vec<CardId> {
        self.game.permanents_of(self.player_id)
    }

    pub fn my_creatures(&self) -> Vec<CardId> {
        self.game.creatures_of(self.player_id)
    }

    pub fn opponent_creatures(&self) -> Vec<CardId> {
        self.opponent_id()
            .map(|opp| self.game.creatures_of(opp))
            .unwrap_or_default()
    }

    pub fn is_card_in_zone(&self, card_id: CardId, zone: Zone) -> bool {
        self.game.zone_of(card_id) == Some(zone)
    }

    pub fn card_name(&self, card_id: CardId) -> String {
        self.game.card_name(card_id)
    }

    pub fn controller_of(&self, card_id: CardId) -> Option<PlayerId> {
        self.game.cards.get(card_id).ok().map(|c| c.controller)
    }

    pub fn is_land(&self, card_id: CardId) -> bool {
        self.game.cards.get(card_id).is_ok_and(|c| c.is_land())
    }

    pub fn is_tapped(&self, card_id: CardId) -> bool {
        self.game.cards.get(card_id).is_ok_and(|c| c.tapped)
    }

    pub fn power(&self, card_id: CardId) -> i32 {
        self.game.power(card_id)
    }

    pub fn toughness(&self, card_id: CardId) -> i32 {
        self.game.toughness(card_id)
    }

    pub fn life(&self) -> i32 {
        self.player().map(|p| p.life).unwrap_or(0)
    }

    pub fn opponent_life(&self) -> i32 {
        self.opponent().map(|p| p.life).unwrap_or(0)
    }

    pub fn mana_pool(&self) -> ManaPool {
        self.player().map(|p| p.mana_pool).unwrap_or_default()
    }

    pub fn can_play_land(&self) -> bool {
        self.player().is_some_and(|p| p.can_play_land())
    }

    pub fn mulligans_taken(&self) -> u8 {
        self.player().map(|p| p.mulligans_taken).unwrap_or(0)
    }

    pub fn turn_number(&self) -> u32 {
        self.game.turn.turn_number
    }

    pub fn step(&self) -> Step {
        self.game.turn.current_step
    }

    pub fn is_my_turn(&self) -> bool {
        self.game.turn.active_player == self.player_id
    }

    pub fn stack_is_empty(&self) -> bool {
        self.game.stack.is_empty()
    }

    /// The spell a player is part-way through casting
    pub fn pending_cast(&self) -> Option<&'a PendingCast> {
        self.game.pending_cast.as_ref()
    }
}

/// Player controller trait
///
/// Implement this trait to create AI players or connect a UI. The game
/// engine calls these methods whenever a decision is needed. Answers that
/// are illegal are treated as the safest legal answer (usually "none").
pub trait PlayerController {
    /// Display name used in logs
    fn name(&self) -> &str;

    /// Pick one of the currently legal actions
    fn choose_action<'a>(&'a mut self, view: &'a GameStateView<'a>, legal: &'a [GameAction])
        -> Decision<'a, GameAction>;

    /// Keep this opening hand (true) or mulligan (false)
    fn keep_hand<'a>(&'a mut self, view: &'a GameStateView<'a>, hand: &'a [CardId]) -> Decision<'a, bool>;

    /// London mulligan: choose `count` cards to put on the bottom
    fn choose_cards_to_bottom<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        hand: &'a [CardId],
        count: usize,
    ) -> Decision<'a, SmallVec<[CardId; 7]>>;

    /// Which color a multi-color source should make
    fn choose_mana_color<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        source: CardId,
        options: &'a [Color],
    ) -> Decision<'a, Color>;

    /// Which pool mana pays the generic part of `cost`
    ///
    /// `None` lets the engine use its default (largest pool first).
    fn split_generic_payment<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _cost: ManaCost,
        _pool: ManaPool,
    ) -> Decision<'a, Option<ManaPool>> {
        decided(None)
    }

    /// Creatures to attack with
    fn choose_attackers<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        candidates: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 8]>>;

    /// (blocker, attacker) pairs
    fn choose_blockers<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        blockers: &'a [CardId],
        attackers: &'a [CardId],
    ) -> Decision<'a, SmallVec<[(CardId, CardId); 8]>>;

    /// Damage assignment order for an attacker blocked by several creatures
    fn order_blockers<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _attacker: CardId,
        blockers: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 4]>> {
        decided(blockers.iter().copied().collect())
    }

    /// Choose a target for one slot; `None` leaves an optional slot empty
    fn choose_target<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        source: CardId,
        spec: TargetSpec,
        candidates: &'a [TargetRef],
    ) -> Decision<'a, Option<TargetRef>>;

    /// Choose one card; `None` declines when `optional`
    fn choose_card<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        prompt: CardPrompt,
        options: &'a [CardId],
        optional: bool,
    ) -> Decision<'a, Option<CardId>>;

    /// Cards were revealed to this player
    fn reveal_cards<'a>(&'a mut self, _view: &'a GameStateView<'a>, _cards: &'a [CardId]) -> Decision<'a, ()> {
        decided(())
    }

    /// Split revealed cards: return the first pile, the rest is the second
    fn split_into_piles<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        cards: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 5]>>;

    fn choose_pile<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        first: &'a [CardId],
        second: &'a [CardId],
    ) -> Decision<'a, Pile>;

    /// Divide `amount` damage among the targets, at least 1 each
    fn divide_damage<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        amount: i32,
        targets: &'a [TargetRef],
    ) -> Decision<'a, SmallVec<[i32; 3]>>;

    /// Pay an optional cost (only asked when it is affordable)
    fn choose_to_pay<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        cost: ManaCost,
        reason: PaymentReason,
    ) -> Decision<'a, bool>;

    /// Choose exactly `count` cards from `hand` to discard
    fn choose_cards_to_discard<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        hand: &'a [CardId],
        count: usize,
    ) -> Decision<'a, SmallVec<[CardId; 7]>>;

    /// Called when the game ends
    fn on_game_end(&mut self, _view: &GameStateView<'_>, _won: bool) {}
}
