//! Action dispatch: the one entry point for player intent
//!
//! Every `GameAction` has a handler here. A handler re-checks legality
//! against the current state, and an illegal request is logged and
//! answered with `ActionOutcome::Rejected` without touching anything.
//! Requests that could only come from a caller breaking the protocol
//! (paying into a cast that is not open, acting after the game ended)
//! are hard errors instead.
//!
//! Casting is two-phase when the cost has Phyrexian symbols: the mana
//! part is taken from the pool at once, then the cast waits in
//! `GameState::pending_cast` until each symbol is paid with mana or life
//! and the player completes or cancels it.

use crate::cards::AlternateCost;
use crate::core::{
    AbilityDef, CardFilter, CardId, Color, CounterType, Effect, PlayerId, PlayerRef, SearchDestination, TargetRef,
    PHYREXIAN_LIFE,
};
use crate::game::{
    ActionOutcome, CardPrompt, CastMethod, ChosenTargets, GameAction, GameEngine, GameEvent, GameState, PendingCast,
    StackEntry, StackItem,
};
use crate::zones::Zone;
use crate::{MtgError, Result};

impl GameState {
    /// Name of whatever a target points at
    pub fn target_name(&self, target: TargetRef) -> String {
        match target {
            TargetRef::Player(p) => self.player_name(p),
            TargetRef::Permanent(c) | TargetRef::Spell(c) | TargetRef::GraveyardCard(c) => self.card_name(c),
        }
    }

    fn describe_targets(&self, targets: &ChosenTargets) -> String {
        let names: Vec<String> = targets.iter().flatten().map(|&t| self.target_name(t)).collect();
        if names.is_empty() {
            String::new()
        } else {
            format!(" targeting {}", names.join(", "))
        }
    }
}

impl GameEngine {
    /// Perform `action` for `player_id`
    ///
    /// With a cancel token attached, a cancellation that lands while the
    /// action is waiting on a decision restores the state from before the
    /// action (the log is kept) and refunds any open cast.
    pub async fn dispatch(&mut self, player_id: PlayerId, action: GameAction) -> Result<ActionOutcome> {
        if self.state.is_game_over() {
            return Err(MtgError::InvalidAction("the game is over".to_string()));
        }
        let checkpoint = self.cancel.as_ref().map(|_| self.state.clone());
        match self.dispatch_action(player_id, action).await {
            Err(MtgError::Cancelled) => {
                self.roll_back(checkpoint)?;
                Err(MtgError::Cancelled)
            }
            other => other,
        }
    }

    async fn dispatch_action(&mut self, player_id: PlayerId, action: GameAction) -> Result<ActionOutcome> {
        log_if_verbose!(
            self.state,
            "{} wants to {}",
            self.state.player_name(player_id),
            action.describe(&self.state)
        );
        match action {
            GameAction::PassPriority => Ok(self.pass_priority(player_id)),
            GameAction::PlayLand { card } => self.play_land(player_id, card).await,
            GameAction::CastSpell { card, method } => self.cast_spell(player_id, card, method).await,
            GameAction::PayPhyrexian { color, with_life } => self.pay_phyrexian(player_id, color, with_life),
            GameAction::CompleteCast => self.complete_cast(player_id).await,
            GameAction::CancelCast => self.cancel_cast(player_id),
            GameAction::TapForMana { card } => self.tap_for_mana(player_id, card).await,
            GameAction::ActivateAbility { card, index } => self.activate_ability(player_id, card, index).await,
            GameAction::ActivateLoyalty { card, index } => self.activate_loyalty(player_id, card, index).await,
            GameAction::Fetch { card } => self.fetch(player_id, card).await,
            GameAction::Cycle { card } => self.cycle(player_id, card).await,
            GameAction::Ninjutsu { ninja, attacker } => self.ninjutsu(player_id, ninja, attacker).await,
        }
    }

    fn reject(&self, player_id: PlayerId, reason: String) -> ActionOutcome {
        self.state
            .logger
            .rejected(&format!("{}: {}", self.state.player_name(player_id), reason));
        ActionOutcome::Rejected(reason)
    }

    fn pass_priority(&mut self, player_id: PlayerId) -> ActionOutcome {
        if !self.state.holds_priority(player_id) {
            return self.reject(player_id, "you do not have priority".to_string());
        }
        if self.state.pending_cast.as_ref().is_some_and(|p| p.controller == player_id) {
            return self.reject(player_id, "finish or cancel the spell being cast first".to_string());
        }
        ActionOutcome::Passed
    }

    async fn play_land(&mut self, player_id: PlayerId, card: CardId) -> Result<ActionOutcome> {
        if let Err(reason) = self.state.can_play_land_card(player_id, card) {
            return Ok(self.reject(player_id, reason));
        }
        self.state.play_land(player_id, card)?;
        self.settle().await?;
        Ok(ActionOutcome::Done)
    }

    async fn cast_spell(&mut self, player_id: PlayerId, card: CardId, method: CastMethod) -> Result<ActionOutcome> {
        if !self.state.holds_priority(player_id) {
            return Ok(self.reject(player_id, "you do not have priority".to_string()));
        }
        let cost = match self.state.check_cast(player_id, card, method) {
            Ok(cost) => cost,
            Err(reason) => return Ok(self.reject(player_id, reason)),
        };
        if !self.state.can_afford_from_pool(player_id, &cost) {
            let reason = format!("cannot pay {} for {}", cost.mana, self.state.card_name(card));
            return Ok(self.reject(player_id, reason));
        }
        let def = self
            .state
            .card(card)?
            .def()
            .ok_or_else(|| MtgError::InvalidAction(format!("{card} has no definition")))?;

        let Some(targets) = self.choose_targets(player_id, card, &def.spell.targets, false).await? else {
            let reason = format!("{} needs a legal target", def.name);
            return Ok(self.reject(player_id, reason));
        };

        // Alternate costs: make every choice before paying anything
        match cost.alternate {
            Some(AlternateCost::ExileCardFromHand { color, .. }) => {
                let options: Vec<CardId> = self
                    .state
                    .hand(player_id)
                    .iter()
                    .copied()
                    .filter(|&c| c != card && self.state.cards.get(c).is_ok_and(|gc| gc.has_color(color)))
                    .collect();
                let answer = ask!(self, player_id, choose_card(CardPrompt::ExileForCost, &options, false));
                let Some(pitched) = answer.filter(|c| options.contains(c)) else {
                    let reason = format!("no {color} card chosen to exile");
                    return Ok(self.reject(player_id, reason));
                };
                self.state.logger.normal(&format!(
                    "{} exiles {} to pay for {}",
                    self.state.player_name(player_id),
                    self.state.card_name(pitched),
                    def.name
                ));
                self.state.move_card(pitched, Zone::Exile)?;
            }
            Some(AlternateCost::ReturnLand { land_type }) => {
                let options = self.state.lands_of_type(player_id, land_type);
                let answer = ask!(self, player_id, choose_card(CardPrompt::ReturnLand, &options, false));
                let Some(land) = answer.filter(|c| options.contains(c)) else {
                    let reason = format!("no {land_type} chosen to return");
                    return Ok(self.reject(player_id, reason));
                };
                self.state.logger.normal(&format!(
                    "{} returns {} to pay for {}",
                    self.state.player_name(player_id),
                    self.state.card_name(land),
                    def.name
                ));
                self.state.move_card(land, Zone::Hand)?;
            }
            Some(AlternateCost::PayLife { .. }) | None => {}
        }

        let mana = cost.mana.without_phyrexian();
        let pool = self.state.get_player(player_id)?.mana_pool;
        let colors_in_pool = Color::ALL.iter().filter(|&&c| pool.amount(c) > 0).count();
        let split = if mana.generic > 0 && colors_in_pool > 1 {
            ask!(self, player_id, split_generic_payment(mana, pool))
        } else {
            None
        };
        let player = self.state.get_player_mut(player_id)?;
        let paid = match split {
            Some(split) => {
                let mut trial = player.mana_pool;
                match trial.pay_with_split(&mana, &split) {
                    Ok(paid) => {
                        player.mana_pool = trial;
                        paid
                    }
                    Err(_) => player.mana_pool.pay(&mana)?,
                }
            }
            None => player.mana_pool.pay(&mana)?,
        };
        player.lose_life(cost.life);

        if cost.mana.has_phyrexian() {
            let pending = PendingCast {
                card,
                controller: player_id,
                method,
                targets,
                paid,
                life_paid: cost.life,
                remaining_phyrexian: cost.mana.phyrexian,
            };
            self.state.logger.normal(&format!(
                "{} begins {}",
                self.state.player_name(player_id),
                pending
            ));
            self.state.pending_cast = Some(pending);
            return Ok(ActionOutcome::AwaitingPayment);
        }
        self.finish_cast(player_id, card, method, targets).await
    }

    async fn finish_cast(
        &mut self,
        player_id: PlayerId,
        card: CardId,
        method: CastMethod,
        targets: ChosenTargets,
    ) -> Result<ActionOutcome> {
        let described = self.state.describe_targets(&targets);
        self.state.put_spell_on_stack(card, method, player_id, targets)?;
        self.state.logger.normal(&format!(
            "{} casts {}{}",
            self.state.player_name(player_id),
            self.state.card_name(card),
            described
        ));
        self.state.fire_event(GameEvent::SpellCast {
            card,
            controller: player_id,
        });
        self.settle().await?;
        Ok(ActionOutcome::Done)
    }

    fn open_cast(&self, player_id: PlayerId) -> Result<&PendingCast> {
        let pending = self
            .state
            .pending_cast
            .as_ref()
            .ok_or_else(|| MtgError::InvalidAction("no spell is being cast".to_string()))?;
        if pending.controller != player_id {
            return Err(MtgError::InvalidAction(format!(
                "{} is not casting {}",
                self.state.player_name(player_id),
                self.state.card_name(pending.card)
            )));
        }
        Ok(pending)
    }

    fn pay_phyrexian(&mut self, player_id: PlayerId, color: Color, with_life: bool) -> Result<ActionOutcome> {
        if self.open_cast(player_id)?.remaining(color) == 0 {
            return Err(MtgError::InvalidAction(format!("no {{{color}/P}} left to pay")));
        }
        if !self.state.holds_priority(player_id) {
            return Ok(self.reject(player_id, "you do not have priority".to_string()));
        }

        let player = self.state.get_player_mut(player_id)?;
        if with_life {
            if player.life < PHYREXIAN_LIFE {
                let reason = format!("not enough life to pay {{{color}/P}}");
                return Ok(self.reject(player_id, reason));
            }
            player.lose_life(PHYREXIAN_LIFE);
        } else if !player.mana_pool.take_one(color) {
            let reason = format!("no {color} mana in pool for {{{color}/P}}");
            return Ok(self.reject(player_id, reason));
        }

        if let Some(pending) = self.state.pending_cast.as_mut() {
            if with_life {
                pending.life_paid += PHYREXIAN_LIFE;
            } else {
                pending.paid.add_color(color);
            }
            pending.remaining_phyrexian[color.index()] -= 1;
        }
        log_if_verbose!(
            self.state,
            "{} pays {{{}/P}} with {}",
            self.state.player_name(player_id),
            color,
            if with_life { "life" } else { "mana" }
        );
        Ok(ActionOutcome::AwaitingPayment)
    }

    async fn complete_cast(&mut self, player_id: PlayerId) -> Result<ActionOutcome> {
        if !self.open_cast(player_id)?.is_fully_paid() {
            return Ok(self.reject(player_id, "Phyrexian mana is still owed".to_string()));
        }
        let Some(pending) = self.state.pending_cast.take() else {
            return Err(MtgError::InvalidAction("no spell is being cast".to_string()));
        };
        self.finish_cast(player_id, pending.card, pending.method, pending.targets)
            .await
    }

    fn cancel_cast(&mut self, player_id: PlayerId) -> Result<ActionOutcome> {
        self.open_cast(player_id)?;
        self.state.refund_pending_cast()?;
        Ok(ActionOutcome::Done)
    }

    async fn tap_for_mana(&mut self, player_id: PlayerId, card: CardId) -> Result<ActionOutcome> {
        if let Err(reason) = self.state.can_tap_for_mana(player_id, card) {
            return Ok(self.reject(player_id, reason));
        }
        let options = self.state.mana_options(player_id, card);
        let color = match options.as_slice() {
            [only] => *only,
            _ => {
                let answer = ask!(self, player_id, choose_mana_color(card, &options));
                if options.contains(&answer) {
                    answer
                } else {
                    options[0]
                }
            }
        };
        self.tap_mana_source(player_id, card, color).await?;
        Ok(ActionOutcome::Done)
    }

    fn push_ability(
        &mut self,
        player_id: PlayerId,
        source: CardId,
        ability: AbilityDef,
        targets: ChosenTargets,
    ) -> Result<()> {
        let source_name = self.state.cards.get(source).map(|c| c.name.clone())?;
        self.state.logger.normal(&format!(
            "{} activates {}{}",
            self.state.player_name(player_id),
            source_name,
            self.state.describe_targets(&targets)
        ));
        self.state.stack.push(StackEntry {
            item: StackItem::Ability {
                source,
                source_name,
                ability,
                event_player: None,
            },
            controller: player_id,
            targets,
        });
        Ok(())
    }

    async fn activate_ability(&mut self, player_id: PlayerId, card: CardId, index: usize) -> Result<ActionOutcome> {
        if let Err(reason) = self.state.can_activate(player_id, card, index) {
            return Ok(self.reject(player_id, reason));
        }
        let activated = self
            .state
            .card(card)?
            .def()
            .and_then(|d| d.activated.get(index))
            .ok_or_else(|| MtgError::InvalidAction(format!("no ability #{index}")))?;
        let Some(targets) = self
            .choose_targets(player_id, card, &activated.ability.targets, false)
            .await?
        else {
            let reason = format!("{} needs a legal target", self.state.card_name(card));
            return Ok(self.reject(player_id, reason));
        };

        let cost = activated.cost;
        let player = self.state.get_player_mut(player_id)?;
        player.mana_pool.pay(&cost.mana)?;
        player.lose_life(cost.life);
        if cost.tap {
            self.state.cards.get_mut(card)?.tap();
        }
        // The ability is on the stack before its source leaves
        self.push_ability(player_id, card, activated.ability.clone(), targets)?;
        if cost.sacrifice_self {
            self.state.move_card(card, Zone::Graveyard)?;
        }
        self.settle().await?;
        Ok(ActionOutcome::Done)
    }

    async fn activate_loyalty(&mut self, player_id: PlayerId, card: CardId, index: usize) -> Result<ActionOutcome> {
        if let Err(reason) = self.state.can_activate_loyalty(player_id, card, index) {
            return Ok(self.reject(player_id, reason));
        }
        let loyalty = self
            .state
            .card(card)?
            .def()
            .and_then(|d| d.loyalty_abilities.get(index))
            .ok_or_else(|| MtgError::InvalidAction(format!("no loyalty ability #{index}")))?;
        let Some(targets) = self
            .choose_targets(player_id, card, &loyalty.ability.targets, false)
            .await?
        else {
            let reason = format!("{} needs a legal target", self.state.card_name(card));
            return Ok(self.reject(player_id, reason));
        };

        let walker = self.state.cards.get_mut(card)?;
        walker.add_counters(CounterType::Loyalty, loyalty.change);
        walker.loyalty_activated = true;
        self.push_ability(player_id, card, loyalty.ability.clone(), targets)?;
        self.settle().await?;
        Ok(ActionOutcome::Done)
    }

    async fn fetch(&mut self, player_id: PlayerId, card: CardId) -> Result<ActionOutcome> {
        if let Err(reason) = self.state.can_fetch(player_id, card) {
            return Ok(self.reject(player_id, reason));
        }
        let land_types = self
            .state
            .card(card)?
            .def()
            .map(|d| d.fetches.clone())
            .unwrap_or_default();
        self.state.get_player_mut(player_id)?.lose_life(1);
        self.state.cards.get_mut(card)?.tap();
        let search = AbilityDef::new(vec![Effect::Search {
            filter: CardFilter::LandOfType(land_types),
            destination: SearchDestination::Battlefield { tapped: false },
        }]);
        self.push_ability(player_id, card, search, ChosenTargets::new())?;
        self.state.move_card(card, Zone::Graveyard)?;
        self.settle().await?;
        Ok(ActionOutcome::Done)
    }

    async fn cycle(&mut self, player_id: PlayerId, card: CardId) -> Result<ActionOutcome> {
        if let Err(reason) = self.state.can_cycle(player_id, card) {
            return Ok(self.reject(player_id, reason));
        }
        let cost = self
            .state
            .card(card)?
            .def()
            .and_then(|d| d.cycling)
            .ok_or_else(|| MtgError::InvalidAction(format!("{card} has no cycling")))?;
        let player = self.state.get_player_mut(player_id)?;
        player.mana_pool.pay(&cost.mana)?;
        player.lose_life(cost.life);
        self.state.logger.normal(&format!(
            "{} cycles {}",
            self.state.player_name(player_id),
            self.state.card_name(card)
        ));
        self.state.move_card(card, Zone::Graveyard)?;
        let draw = AbilityDef::new(vec![Effect::DrawCards {
            player: PlayerRef::You,
            count: 1,
        }]);
        self.push_ability(player_id, card, draw, ChosenTargets::new())?;
        self.settle().await?;
        Ok(ActionOutcome::Done)
    }

    async fn ninjutsu(&mut self, player_id: PlayerId, ninja: CardId, attacker: CardId) -> Result<ActionOutcome> {
        if let Err(reason) = self.state.can_ninjutsu(player_id, ninja, attacker) {
            return Ok(self.reject(player_id, reason));
        }
        let cost = self
            .state
            .card(ninja)?
            .def()
            .and_then(|d| d.ninjutsu)
            .ok_or_else(|| MtgError::InvalidAction(format!("{ninja} has no ninjutsu")))?;
        self.state.get_player_mut(player_id)?.mana_pool.pay(&cost)?;

        self.state.logger.normal(&format!(
            "{} returns {} and ninjutsus in {}",
            self.state.player_name(player_id),
            self.state.card_name(attacker),
            self.state.card_name(ninja)
        ));
        // Swap in combat first so the attacker leaving does not end the attack
        self.state.combat.replace_attacker(attacker, ninja);
        self.state.move_card(attacker, Zone::Hand)?;
        self.state.put_onto_battlefield(ninja, player_id, true)?;
        self.settle().await?;
        Ok(ActionOutcome::Done)
    }
}
