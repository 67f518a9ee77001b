//! Scripted player controller for testing
//!
//! Each kind of decision has its own queue of answers. A decision whose
//! queue is empty gets a neutral default (pass, keep, no attackers, the
//! first required option), so a test only scripts the choices it cares
//! about.

use crate::core::{CardId, Color, ManaCost, ManaPool, TargetRef, TargetSpec};
use crate::game::controller::{decided, CardPrompt, Decision, GameStateView, PaymentReason, Pile, PlayerController};
use crate::game::GameAction;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// A controller that answers from predetermined queues
#[derive(Debug, Clone, Default)]
pub struct ScriptedController {
    actions: VecDeque<GameAction>,
    keeps: VecDeque<bool>,
    colors: VecDeque<Color>,
    generic_splits: VecDeque<ManaPool>,
    attackers: VecDeque<SmallVec<[CardId; 8]>>,
    blocks: VecDeque<SmallVec<[(CardId, CardId); 8]>>,
    targets: VecDeque<Option<TargetRef>>,
    cards: VecDeque<Option<CardId>>,
    piles: VecDeque<SmallVec<[CardId; 5]>>,
    pile_choices: VecDeque<Pile>,
    divisions: VecDeque<SmallVec<[i32; 3]>>,
    payments: VecDeque<bool>,
    discards: VecDeque<SmallVec<[CardId; 7]>>,
    /// Every card revealed to this player, in order
    revealed: Vec<CardId>,
}

impl ScriptedController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_action(&mut self, action: GameAction) {
        self.actions.push_back(action);
    }

    pub fn push_keep(&mut self, keep: bool) {
        self.keeps.push_back(keep);
    }

    pub fn push_color(&mut self, color: Color) {
        self.colors.push_back(color);
    }

    pub fn push_generic_split(&mut self, split: ManaPool) {
        self.generic_splits.push_back(split);
    }

    pub fn push_attackers(&mut self, attackers: &[CardId]) {
        self.attackers.push_back(attackers.iter().copied().collect());
    }

    /// (blocker, attacker) pairs for one declare-blockers step
    pub fn push_blocks(&mut self, blocks: &[(CardId, CardId)]) {
        self.blocks.push_back(blocks.iter().copied().collect());
    }

    pub fn push_target(&mut self, target: Option<TargetRef>) {
        self.targets.push_back(target);
    }

    pub fn push_card(&mut self, card: Option<CardId>) {
        self.cards.push_back(card);
    }

    /// The first pile when splitting revealed cards
    pub fn push_pile_split(&mut self, first: &[CardId]) {
        self.piles.push_back(first.iter().copied().collect());
    }

    pub fn push_pile_choice(&mut self, pile: Pile) {
        self.pile_choices.push_back(pile);
    }

    pub fn push_division(&mut self, division: &[i32]) {
        self.divisions.push_back(division.iter().copied().collect());
    }

    pub fn push_payment(&mut self, pay: bool) {
        self.payments.push_back(pay);
    }

    pub fn push_discard(&mut self, cards: &[CardId]) {
        self.discards.push_back(cards.iter().copied().collect());
    }

    pub fn revealed(&self) -> &[CardId] {
        &self.revealed
    }

    /// Queued actions not yet used
    pub fn remaining_actions(&self) -> usize {
        self.actions.len()
    }
}

impl PlayerController for ScriptedController {
    fn name(&self) -> &str {
        "scripted"
    }

    fn choose_action<'a>(&'a mut self, _view: &'a GameStateView<'a>, _legal: &'a [GameAction]) -> Decision<'a, GameAction> {
        decided(self.actions.pop_front().unwrap_or(GameAction::PassPriority))
    }

    fn keep_hand<'a>(&'a mut self, _view: &'a GameStateView<'a>, _hand: &'a [CardId]) -> Decision<'a, bool> {
        decided(self.keeps.pop_front().unwrap_or(true))
    }

    fn choose_cards_to_bottom<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        hand: &'a [CardId],
        count: usize,
    ) -> Decision<'a, SmallVec<[CardId; 7]>> {
        decided(hand.iter().take(count).copied().collect())
    }

    fn choose_mana_color<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _source: CardId,
        options: &'a [Color],
    ) -> Decision<'a, Color> {
        let color = self
            .colors
            .pop_front()
            .or_else(|| options.first().copied())
            .unwrap_or(Color::Colorless);
        decided(color)
    }

    fn split_generic_payment<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _cost: ManaCost,
        _pool: ManaPool,
    ) -> Decision<'a, Option<ManaPool>> {
        decided(self.generic_splits.pop_front())
    }

    fn choose_attackers<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _candidates: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 8]>> {
        decided(self.attackers.pop_front().unwrap_or_default())
    }

    fn choose_blockers<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _blockers: &'a [CardId],
        _attackers: &'a [CardId],
    ) -> Decision<'a, SmallVec<[(CardId, CardId); 8]>> {
        decided(self.blocks.pop_front().unwrap_or_default())
    }

    fn choose_target<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _source: CardId,
        spec: TargetSpec,
        candidates: &'a [TargetRef],
    ) -> Decision<'a, Option<TargetRef>> {
        let target = match self.targets.pop_front() {
            Some(scripted) => scripted,
            None if spec.optional => None,
            None => candidates.first().copied(),
        };
        decided(target)
    }

    fn choose_card<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _prompt: CardPrompt,
        options: &'a [CardId],
        optional: bool,
    ) -> Decision<'a, Option<CardId>> {
        let card = match self.cards.pop_front() {
            Some(scripted) => scripted,
            None if optional => None,
            None => options.first().copied(),
        };
        decided(card)
    }

    fn reveal_cards<'a>(&'a mut self, _view: &'a GameStateView<'a>, cards: &'a [CardId]) -> Decision<'a, ()> {
        self.revealed.extend_from_slice(cards);
        decided(())
    }

    fn split_into_piles<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _cards: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 5]>> {
        decided(self.piles.pop_front().unwrap_or_default())
    }

    fn choose_pile<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _first: &'a [CardId],
        _second: &'a [CardId],
    ) -> Decision<'a, Pile> {
        decided(self.pile_choices.pop_front().unwrap_or(Pile::First))
    }

    fn divide_damage<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _amount: i32,
        _targets: &'a [TargetRef],
    ) -> Decision<'a, SmallVec<[i32; 3]>> {
        decided(self.divisions.pop_front().unwrap_or_default())
    }

    fn choose_to_pay<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _cost: ManaCost,
        _reason: PaymentReason,
    ) -> Decision<'a, bool> {
        decided(self.payments.pop_front().unwrap_or(false))
    }

    fn choose_cards_to_discard<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        hand: &'a [CardId],
        count: usize,
    ) -> Decision<'a, SmallVec<[CardId; 7]>> {
        let cards = self
            .discards
            .pop_front()
            .unwrap_or_else(|| hand.iter().take(count).copied().collect());
        decided(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardId;
    use crate::game::GameState;
    use futures::executor::block_on;

    #[test]
    fn test_scripted_actions_then_pass() {
        let game = GameState::new_two_player("Alice".to_string(), "Bob".to_string(), 20);
        let player_id = game.players[0].id;
        let view = GameStateView::new(&game, player_id);

        let card_id = CardId::new(10);
        let mut controller = ScriptedController::new();
        controller.push_action(GameAction::PlayLand { card: card_id });
        controller.push_action(GameAction::TapForMana { card: card_id });

        assert_eq!(
            block_on(controller.choose_action(&view, &[])),
            GameAction::PlayLand { card: card_id }
        );
        assert_eq!(
            block_on(controller.choose_action(&view, &[])),
            GameAction::TapForMana { card: card_id }
        );
        assert_eq!(block_on(controller.choose_action(&view, &[])), GameAction::PassPriority);
        assert_eq!(controller.remaining_actions(), 0);
    }

    #[test]
    fn test_defaults_when_queues_are_empty() {
        let game = GameState::new_two_player("Alice".to_string(), "Bob".to_string(), 20);
        let p1 = game.players[0].id;
        let p2 = game.players[1].id;
        let view = GameStateView::new(&game, p1);
        let mut controller = ScriptedController::new();

        assert!(block_on(controller.keep_hand(&view, &[])));
        let candidates = [TargetRef::Player(p2)];
        let spec = TargetSpec::harmful(crate::core::TargetFilter::Player);
        let target = block_on(controller.choose_target(&view, CardId::new(1), spec, &candidates));
        assert_eq!(target, Some(TargetRef::Player(p2)));
        let optional = block_on(controller.choose_target(&view, CardId::new(1), spec.optional(), &candidates));
        assert_eq!(optional, None);
        assert!(!block_on(controller.choose_to_pay(&view, ManaCost::default(), PaymentReason::AvoidLosing)));
    }
}
