//! A controller that never does anything
//!
//! Always passes priority, keeps every hand, declares no attackers or
//! blockers, declines optional payments and takes the first option
//! whenever an answer is required. Useful as a punching bag in tests and
//! for measuring engine overhead.

use crate::core::{CardId, Color, ManaCost, TargetRef, TargetSpec};
use crate::game::controller::{decided, CardPrompt, Decision, GameStateView, PaymentReason, Pile, PlayerController};
use crate::game::GameAction;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, Default)]
pub struct PassController;

impl PassController {
    pub fn new() -> Self {
        PassController
    }
}

impl PlayerController for PassController {
    fn name(&self) -> &str {
        "pass"
    }

    fn choose_action<'a>(&'a mut self, _view: &'a GameStateView<'a>, _legal: &'a [GameAction]) -> Decision<'a, GameAction> {
        decided(GameAction::PassPriority)
    }

    fn keep_hand<'a>(&'a mut self, _view: &'a GameStateView<'a>, _hand: &'a [CardId]) -> Decision<'a, bool> {
        decided(true)
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
        decided(options.first().copied().unwrap_or(Color::Colorless))
    }

    fn choose_attackers<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _candidates: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 8]>> {
        decided(SmallVec::new())
    }

    fn choose_blockers<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _blockers: &'a [CardId],
        _attackers: &'a [CardId],
    ) -> Decision<'a, SmallVec<[(CardId, CardId); 8]>> {
        decided(SmallVec::new())
    }

    fn choose_target<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _source: CardId,
        spec: TargetSpec,
        candidates: &'a [TargetRef],
    ) -> Decision<'a, Option<TargetRef>> {
        if spec.optional {
            decided(None)
        } else {
            decided(candidates.first().copied())
        }
    }

    fn choose_card<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _prompt: CardPrompt,
        options: &'a [CardId],
        optional: bool,
    ) -> Decision<'a, Option<CardId>> {
        if optional {
            decided(None)
        } else {
            decided(options.first().copied())
        }
    }

    fn split_into_piles<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _cards: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 5]>> {
        decided(SmallVec::new())
    }

    fn choose_pile<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _first: &'a [CardId],
        _second: &'a [CardId],
    ) -> Decision<'a, Pile> {
        decided(Pile::First)
    }

    fn divide_damage<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _amount: i32,
        _targets: &'a [TargetRef],
    ) -> Decision<'a, SmallVec<[i32; 3]>> {
        decided(SmallVec::new())
    }

    fn choose_to_pay<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        _cost: ManaCost,
        _reason: PaymentReason,
    ) -> Decision<'a, bool> {
        decided(false)
    }

    fn choose_cards_to_discard<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        hand: &'a [CardId],
        count: usize,
    ) -> Decision<'a, SmallVec<[CardId; 7]>> {
        decided(hand.iter().take(count).copied().collect())
    }
}
