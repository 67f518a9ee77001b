//! Resolving the top of the stack
//!
//! Targets are checked again on resolution. A spell or ability whose
//! every chosen target has become illegal does nothing ("fizzles");
//! otherwise each effect runs in printed order and simply skips slots
//! whose target went away.

use crate::core::{
    AbilityDef, CardFilter, CardId, Chooser, Color, Effect, ManaCost, PlayerId, PlayerRef, SearchDestination,
    Subject, TargetRef,
};
use crate::game::{
    Affected, CardPrompt, CastMethod, ContinuousEffect, ContinuousKind, DelayedTrigger, Duration, GameEndReason,
    GameEngine, ManaPlanner, PaymentReason, Pile, StackItem,
};
use crate::zones::Zone;
use crate::{MtgError, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use smallvec::SmallVec;

/// Everything an effect needs to know about what is resolving
#[derive(Debug, Clone)]
pub(crate) struct EffectContext {
    source: CardId,
    controller: PlayerId,
    targets: SmallVec<[Option<TargetRef>; 3]>,
    /// Per slot: still legal when resolution began
    legal: SmallVec<[bool; 3]>,
    event_player: Option<PlayerId>,
}

impl EffectContext {
    /// A context with no targets, for abilities that skip the stack
    pub(crate) fn immediate(source: CardId, controller: PlayerId) -> Self {
        EffectContext {
            source,
            controller,
            targets: SmallVec::new(),
            legal: SmallVec::new(),
            event_player: Some(controller),
        }
    }

    /// The target in slot `i`, if one was chosen and it is still legal
    fn target(&self, i: usize) -> Option<TargetRef> {
        match (self.targets.get(i), self.legal.get(i)) {
            (Some(Some(t)), Some(true)) => Some(*t),
            _ => None,
        }
    }

    /// Legal targets in slot order
    fn legal_targets(&self) -> SmallVec<[TargetRef; 3]> {
        (0..self.targets.len()).filter_map(|i| self.target(i)).collect()
    }

    fn fizzles(&self) -> bool {
        let chosen = self.targets.iter().filter(|t| t.is_some()).count();
        chosen > 0 && self.legal_targets().is_empty()
    }
}

fn card_of(target: TargetRef) -> Option<CardId> {
    match target {
        TargetRef::Permanent(c) | TargetRef::Spell(c) | TargetRef::GraveyardCard(c) => Some(c),
        TargetRef::Player(_) => None,
    }
}

impl GameEngine {
    /// Resolve the top entry of the stack
    ///
    /// Returns false if the stack was empty. A cancellation part-way
    /// through leaves the state as it was before.
    pub async fn resolve_top(&mut self) -> Result<bool> {
        let checkpoint = self.cancel.as_ref().map(|_| self.state.clone());
        match self.resolve_top_entry().await {
            Err(MtgError::Cancelled) => {
                self.roll_back(checkpoint)?;
                Err(MtgError::Cancelled)
            }
            other => other,
        }
    }

    async fn resolve_top_entry(&mut self) -> Result<bool> {
        let Some(entry) = self.state.stack.pop() else {
            return Ok(false);
        };
        let controller = entry.controller;

        let (source, ability, method, event_player) = match entry.item {
            StackItem::Spell { card, method } => {
                let def = self.state.card(card)?.def();
                let ability = def.map(|d| d.spell.clone()).unwrap_or_default();
                (card, ability, Some(method), None)
            }
            StackItem::Ability {
                source,
                ability,
                event_player,
                ..
            } => (source, ability, None, event_player),
        };

        let legal = entry
            .targets
            .iter()
            .zip(ability.targets.iter())
            .map(|(target, spec)| {
                target.is_some_and(|t| self.state.is_target_legal(controller, source, spec, t))
            })
            .collect();
        let ctx = EffectContext {
            source,
            controller,
            targets: entry.targets,
            legal,
            event_player,
        };

        let name = self.state.card_name(source);
        if ctx.fizzles() {
            self.state
                .logger
                .normal(&format!("{name} has no legal targets left and does nothing"));
            if let Some(method) = method {
                self.state.move_card(source, Self::spell_destination(method))?;
            }
            self.settle().await?;
            return Ok(true);
        }

        match method {
            Some(method) => self.resolve_spell(&ctx, &ability, method).await?,
            None => {
                self.state.logger.normal(&format!("{name}'s ability resolves"));
                self.apply_effects(&ctx, &ability).await?;
            }
        }
        self.settle().await?;
        Ok(true)
    }

    fn spell_destination(method: CastMethod) -> Zone {
        match method {
            CastMethod::Flashback => Zone::Exile,
            CastMethod::Normal | CastMethod::Alternate(_) => Zone::Graveyard,
        }
    }

    async fn resolve_spell(&mut self, ctx: &EffectContext, ability: &AbilityDef, method: CastMethod) -> Result<()> {
        let card = ctx.source;
        let def = self.state.card(card)?.def();
        let name = self.state.card_name(card);

        if def.is_some_and(|d| d.is_permanent()) {
            self.state
                .logger
                .normal(&format!("{name} resolves and enters the battlefield"));
            self.state.put_onto_battlefield(card, ctx.controller, false)?;
            if def.is_some_and(|d| d.is_aura()) {
                let host = ctx.target(0).and_then(card_of);
                self.state.cards.get_mut(card)?.attached_to = host;
            }
            return Ok(());
        }

        self.state.logger.normal(&format!("{name} resolves"));
        self.apply_effects(ctx, ability).await?;
        self.state.move_card(card, Self::spell_destination(method))
    }

    async fn apply_effects(&mut self, ctx: &EffectContext, ability: &AbilityDef) -> Result<()> {
        for effect in &ability.effects {
            if self.state.is_game_over() {
                break;
            }
            self.apply_effect(ctx, effect).await?;
        }
        Ok(())
    }

    /// Tap a mana source for `color`, then run the mana triggers of
    /// auras attached to it
    ///
    /// Those triggers resolve at once, each with its own context.
    pub(crate) async fn tap_mana_source(&mut self, player: PlayerId, card: CardId, color: Color) -> Result<()> {
        self.state.tap_for_mana(player, card, color)?;
        for (aura, ability) in self.state.mana_triggers(card) {
            log_if_verbose!(self.state, "{} triggers", self.state.card_name(aura));
            self.run_immediate(EffectContext::immediate(aura, player), ability).await?;
        }
        Ok(())
    }

    /// Boxed: mana payment inside the executor can lead back here
    fn run_immediate<'a>(&'a mut self, ctx: EffectContext, ability: &'a AbilityDef) -> LocalBoxFuture<'a, Result<()>> {
        async move { self.apply_effects(&ctx, ability).await }.boxed_local()
    }

    /// The players a `PlayerRef` names, active player first for "each"
    fn resolve_players(&self, ctx: &EffectContext, player: PlayerRef) -> SmallVec<[PlayerId; 2]> {
        let mut players = SmallVec::new();
        match player {
            PlayerRef::You => players.push(ctx.controller),
            PlayerRef::Opponent => players.extend(self.state.opponent(ctx.controller).ok()),
            PlayerRef::EachPlayer => {
                let active = self.state.turn.active_player;
                players.push(active);
                players.extend(self.state.opponent(active).ok());
            }
            PlayerRef::Target(i) => {
                if let Some(TargetRef::Player(p)) = ctx.target(i) {
                    players.push(p);
                }
            }
            PlayerRef::ControllerOfTarget(i) => {
                let owner = match ctx.target(i) {
                    Some(TargetRef::Player(p)) => Some(p),
                    Some(TargetRef::GraveyardCard(c)) => self.state.cards.get(c).ok().map(|c| c.owner),
                    Some(TargetRef::Permanent(c)) | Some(TargetRef::Spell(c)) => {
                        self.state.cards.get(c).ok().map(|c| c.controller)
                    }
                    None => None,
                };
                players.extend(owner);
            }
            PlayerRef::EventPlayer => players.extend(ctx.event_player),
        }
        players
    }

    /// The permanent a `Subject` names, if it is still on the battlefield
    fn resolve_subject(&self, ctx: &EffectContext, subject: Subject) -> Option<CardId> {
        let card = match subject {
            Subject::Source => ctx.source,
            Subject::Target(i) => match ctx.target(i)? {
                TargetRef::Permanent(c) => c,
                _ => return None,
            },
        };
        self.state.battlefield.contains(card).then_some(card)
    }

    async fn apply_effect(&mut self, ctx: &EffectContext, effect: &Effect) -> Result<()> {
        log_if_verbose!(self.state, "applying {:?} from {}", effect, self.state.card_name(ctx.source));
        match effect {
            Effect::DealDamage { target, amount } => {
                if let Some(t) = ctx.target(*target) {
                    self.state.deal_damage(ctx.source, t, *amount, false)?;
                }
            }
            Effect::DivideDamage { amount } => self.divide_damage(ctx, *amount).await?,
            Effect::DrawCards { player, count } => {
                for p in self.resolve_players(ctx, *player) {
                    self.state.draw_cards(p, *count)?;
                }
            }
            Effect::GainLife { player, amount } => {
                for p in self.resolve_players(ctx, *player) {
                    self.state.get_player_mut(p)?.gain_life(*amount);
                    self.state
                        .logger
                        .normal(&format!("{} gains {} life", self.state.player_name(p), amount));
                }
            }
            Effect::LoseLife { player, amount } => {
                for p in self.resolve_players(ctx, *player) {
                    self.state.get_player_mut(p)?.lose_life(*amount);
                    self.state
                        .logger
                        .normal(&format!("{} loses {} life", self.state.player_name(p), amount));
                }
            }
            Effect::GainLifeEqualToPower { player, target } => {
                let Some(creature) = self.resolve_subject(ctx, Subject::Target(*target)) else {
                    return Ok(());
                };
                let amount = self.state.power(creature).max(0);
                for p in self.resolve_players(ctx, *player) {
                    self.state.get_player_mut(p)?.gain_life(amount);
                    self.state
                        .logger
                        .normal(&format!("{} gains {} life", self.state.player_name(p), amount));
                }
            }
            Effect::Destroy { target } => {
                if let Some(card) = self.resolve_subject(ctx, Subject::Target(*target)) {
                    self.state
                        .logger
                        .normal(&format!("{} is destroyed", self.state.card_name(card)));
                    self.state.move_card(card, Zone::Graveyard)?;
                }
            }
            Effect::Exile { target } => {
                if let Some(card) = self.resolve_subject(ctx, Subject::Target(*target)) {
                    self.state
                        .logger
                        .normal(&format!("{} is exiled", self.state.card_name(card)));
                    self.state.move_card(card, Zone::Exile)?;
                }
            }
            Effect::ReturnToHand { target } => {
                let card = match ctx.target(*target) {
                    Some(TargetRef::Permanent(c)) if self.state.battlefield.contains(c) => Some(c),
                    Some(TargetRef::GraveyardCard(c)) if self.state.zone_of(c) == Some(Zone::Graveyard) => Some(c),
                    _ => None,
                };
                if let Some(card) = card {
                    self.state
                        .logger
                        .normal(&format!("{} returns to its owner's hand", self.state.card_name(card)));
                    self.state.move_card(card, Zone::Hand)?;
                }
            }
            Effect::Pump {
                subject,
                power,
                toughness,
            } => {
                if let Some(card) = self.resolve_subject(ctx, *subject) {
                    self.state.continuous.add(ContinuousEffect {
                        source: ctx.source,
                        controller: ctx.controller,
                        kind: ContinuousKind::ModifyPowerToughness {
                            affected: Affected::Card(card),
                            power: *power,
                            toughness: *toughness,
                        },
                        duration: Duration::UntilEndOfTurn,
                    });
                    self.state.logger.normal(&format!(
                        "{} gets {:+}/{:+} until end of turn",
                        self.state.card_name(card),
                        power,
                        toughness
                    ));
                }
            }
            Effect::GrantKeyword { subject, keyword } => {
                if let Some(card) = self.resolve_subject(ctx, *subject) {
                    self.state.continuous.add(ContinuousEffect {
                        source: ctx.source,
                        controller: ctx.controller,
                        kind: ContinuousKind::GrantKeyword {
                            affected: Affected::Card(card),
                            keyword: *keyword,
                        },
                        duration: Duration::UntilEndOfTurn,
                    });
                    self.state.logger.normal(&format!(
                        "{} gains {} until end of turn",
                        self.state.card_name(card),
                        keyword
                    ));
                }
            }
            Effect::AddCounters {
                subject,
                counter,
                amount,
            } => {
                if let Some(card) = self.resolve_subject(ctx, *subject) {
                    self.state.cards.get_mut(card)?.add_counters(*counter, *amount as i32);
                }
            }
            Effect::Counter { target } => {
                if let Some(TargetRef::Spell(spell)) = ctx.target(*target) {
                    if self.state.stack.contains_spell(spell) {
                        self.state.counter_spell(spell)?;
                    }
                }
            }
            Effect::CounterUnlessPays { target, amount } => {
                if let Some(TargetRef::Spell(spell)) = ctx.target(*target) {
                    self.counter_unless_pays(spell, *amount).await?;
                }
            }
            Effect::AddMana { color, amount } => {
                self.state.get_player_mut(ctx.controller)?.mana_pool.add(*color, *amount);
            }
            Effect::AddManaOfAnyColor { amount } => {
                let options = Color::COLORED;
                let answer = ask!(self, ctx.controller, choose_mana_color(ctx.source, &options));
                let color = if options.contains(&answer) { answer } else { options[0] };
                self.state.get_player_mut(ctx.controller)?.mana_pool.add(color, *amount);
            }
            Effect::Search { filter, destination } => self.search_library(ctx, filter, *destination).await?,
            Effect::CreateTokens { token, count } => {
                for _ in 0..*count {
                    self.state.create_token(token.clone(), ctx.controller)?;
                }
                self.state.logger.normal(&format!(
                    "{} creates {} {} token(s)",
                    self.state.player_name(ctx.controller),
                    count,
                    token.name
                ));
            }
            Effect::Mill { player, count } => {
                for p in self.resolve_players(ctx, *player) {
                    let milled = self.state.mill(p, *count)?;
                    self.state.logger.normal(&format!(
                        "{} mills {} card(s)",
                        self.state.player_name(p),
                        milled.len()
                    ));
                }
            }
            Effect::Discard {
                player,
                count,
                chosen_by,
            } => {
                for p in self.resolve_players(ctx, *player) {
                    let chooser = match chosen_by {
                        Chooser::Affected => p,
                        Chooser::Controller => ctx.controller,
                    };
                    self.discard(p, chooser, *count as usize).await?;
                }
            }
            Effect::DrawThenPutBack { draw, put_back } => {
                self.state.draw_cards(ctx.controller, *draw)?;
                for _ in 0..*put_back {
                    let hand = self.state.hand(ctx.controller).to_vec();
                    let Some(&fallback) = hand.last() else {
                        break;
                    };
                    let answer = ask!(self, ctx.controller, choose_card(CardPrompt::PutBack, &hand, false));
                    let card = answer.filter(|c| hand.contains(c)).unwrap_or(fallback);
                    self.state.move_card(card, Zone::Library)?;
                }
                self.state.logger.normal(&format!(
                    "{} puts {} card(s) back on top",
                    self.state.player_name(ctx.controller),
                    put_back
                ));
            }
            Effect::RevealAndSplit { count } => self.reveal_and_split(ctx, *count as usize).await?,
            Effect::RevealHand { player } => {
                for p in self.resolve_players(ctx, *player) {
                    let hand = self.state.hand(p).to_vec();
                    let names: Vec<String> = hand.iter().map(|&c| self.state.card_name(c)).collect();
                    self.state.logger.normal(&format!(
                        "{} reveals their hand: {}",
                        self.state.player_name(p),
                        names.join(", ")
                    ));
                    ask!(self, ctx.controller, reveal_cards(&hand));
                }
            }
            Effect::RevealTopToHand => {
                let top = self
                    .state
                    .get_player_zones(ctx.controller)
                    .and_then(|z| z.library.peek_top());
                if let Some(card) = top {
                    let cmc = self.state.card(card)?.cmc() as i32;
                    self.state.logger.normal(&format!(
                        "{} reveals {} and loses {} life",
                        self.state.player_name(ctx.controller),
                        self.state.card_name(card),
                        cmc
                    ));
                    self.state.move_card(card, Zone::Hand)?;
                    self.state.get_player_mut(ctx.controller)?.lose_life(cmc);
                }
            }
            Effect::SacrificeCreature { player } => {
                for p in self.resolve_players(ctx, *player) {
                    self.sacrifice_creature(p).await?;
                }
            }
            Effect::SacrificeSource => {
                let controls_it = self
                    .state
                    .cards
                    .get(ctx.source)
                    .is_ok_and(|c| c.controller == ctx.controller);
                if controls_it && self.state.battlefield.contains(ctx.source) {
                    self.state
                        .logger
                        .normal(&format!("{} is sacrificed", self.state.card_name(ctx.source)));
                    self.state.move_card(ctx.source, Zone::Graveyard)?;
                }
            }
            Effect::PayOrLose { cost } => {
                if !self.pay_optional(ctx.controller, *cost, PaymentReason::AvoidLosing).await? {
                    self.state.mark_lost(ctx.controller, GameEndReason::UnpaidCost)?;
                }
            }
            Effect::Delayed { when, effects } => {
                let source_name = self.state.card(ctx.source)?.name.clone();
                self.state.delayed_triggers.push(DelayedTrigger {
                    source: ctx.source,
                    source_name,
                    controller: ctx.controller,
                    when: *when,
                    effects: effects.clone(),
                });
            }
        }
        Ok(())
    }

    async fn divide_damage(&mut self, ctx: &EffectContext, amount: i32) -> Result<()> {
        let targets = ctx.legal_targets();
        let split: SmallVec<[i32; 3]> = match targets.len() {
            0 => return Ok(()),
            1 => SmallVec::from_elem(amount, 1),
            n => {
                let answer = ask!(self, ctx.controller, divide_damage(amount, &targets));
                let valid = answer.len() == n && answer.iter().all(|&d| d >= 1) && answer.iter().sum::<i32>() == amount;
                if valid {
                    answer
                } else {
                    let share = amount / n as i32;
                    let mut even: SmallVec<[i32; 3]> = SmallVec::from_elem(share, n);
                    even[0] += amount - share * n as i32;
                    even
                }
            }
        };
        for (target, damage) in targets.into_iter().zip(split) {
            self.state.deal_damage(ctx.source, target, damage, false)?;
        }
        Ok(())
    }

    /// Offer a mana payment to `player` if they can make it; true if paid
    async fn pay_optional(&mut self, player: PlayerId, cost: ManaCost, reason: PaymentReason) -> Result<bool> {
        let pool = self.state.get_player(player)?.mana_pool;
        let Some(plan) = ManaPlanner::from_state(&self.state, player).plan(&cost, &pool) else {
            self.state.logger.normal(&format!(
                "{} cannot pay {}",
                self.state.player_name(player),
                cost
            ));
            return Ok(false);
        };
        if !ask!(self, player, choose_to_pay(cost, reason)) {
            self.state
                .logger
                .normal(&format!("{} declines to pay {}", self.state.player_name(player), cost));
            return Ok(false);
        }
        for (source, color) in plan {
            self.tap_mana_source(player, source, color).await?;
        }
        self.state.get_player_mut(player)?.mana_pool.pay(&cost)?;
        self.state
            .logger
            .normal(&format!("{} pays {}", self.state.player_name(player), cost));
        Ok(true)
    }

    async fn counter_unless_pays(&mut self, spell: CardId, amount: u8) -> Result<()> {
        let Some(entry) = self.state.stack.find_spell(spell) else {
            return Ok(());
        };
        let payer = entry.controller;
        let cost = ManaCost {
            generic: amount,
            ..ManaCost::default()
        };
        if !self.pay_optional(payer, cost, PaymentReason::KeepSpell { spell }).await? {
            self.state.counter_spell(spell)?;
        }
        Ok(())
    }

    async fn search_library(
        &mut self,
        ctx: &EffectContext,
        filter: &CardFilter,
        destination: SearchDestination,
    ) -> Result<()> {
        let player = ctx.controller;
        let library: Vec<CardId> = self
            .state
            .get_player_zones(player)
            .map(|z| z.library.cards.clone())
            .unwrap_or_default();
        let options: Vec<CardId> = library
            .into_iter()
            .filter(|&c| {
                let Some(def) = self.state.cards.get(c).ok().and_then(|card| card.def()) else {
                    return false;
                };
                match filter {
                    CardFilter::Any => true,
                    CardFilter::BasicLand => def.is_basic_land(),
                    CardFilter::Creature => def.is_creature(),
                    CardFilter::LandOfType(types) => def.land_types().iter().any(|t| types.contains(t)),
                }
            })
            .collect();

        let found = if options.is_empty() {
            None
        } else {
            ask!(self, player, choose_card(CardPrompt::Search, &options, true)).filter(|c| options.contains(c))
        };
        match found {
            Some(card) => {
                self.state.logger.normal(&format!(
                    "{} searches for {}",
                    self.state.player_name(player),
                    self.state.card_name(card)
                ));
                match destination {
                    SearchDestination::Hand => self.state.move_card(card, Zone::Hand)?,
                    SearchDestination::Battlefield { tapped } => {
                        self.state.put_onto_battlefield(card, player, tapped)?
                    }
                }
            }
            None => self
                .state
                .logger
                .normal(&format!("{} finds nothing", self.state.player_name(player))),
        }
        self.state.shuffle_library(player);
        Ok(())
    }

    /// `player` discards `count` cards picked by `chooser`
    pub(crate) async fn discard(&mut self, player: PlayerId, chooser: PlayerId, count: usize) -> Result<()> {
        let hand = self.state.hand(player).to_vec();
        let count = count.min(hand.len());
        if count == 0 {
            return Ok(());
        }
        let chosen: SmallVec<[CardId; 7]> = if count == hand.len() {
            hand.iter().copied().collect()
        } else {
            let answer = ask!(self, chooser, choose_cards_to_discard(&hand, count));
            let mut distinct = answer.clone();
            distinct.sort();
            distinct.dedup();
            if answer.len() == count && distinct.len() == count && answer.iter().all(|c| hand.contains(c)) {
                answer
            } else {
                hand.iter().take(count).copied().collect()
            }
        };
        for card in chosen {
            self.state.logger.normal(&format!(
                "{} discards {}",
                self.state.player_name(player),
                self.state.card_name(card)
            ));
            self.state.move_card(card, Zone::Graveyard)?;
        }
        Ok(())
    }

    async fn reveal_and_split(&mut self, ctx: &EffectContext, count: usize) -> Result<()> {
        let revealed = self
            .state
            .get_player_zones(ctx.controller)
            .map(|z| z.library.top(count))
            .unwrap_or_default();
        if revealed.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = revealed.iter().map(|&c| self.state.card_name(c)).collect();
        self.state.logger.normal(&format!(
            "{} reveals {}",
            self.state.player_name(ctx.controller),
            names.join(", ")
        ));

        let splitter = self.state.opponent(ctx.controller)?;
        let answer = ask!(self, splitter, split_into_piles(&revealed));
        let mut first: Vec<CardId> = Vec::new();
        for card in answer {
            if revealed.contains(&card) && !first.contains(&card) {
                first.push(card);
            }
        }
        let second: Vec<CardId> = revealed.iter().copied().filter(|c| !first.contains(c)).collect();

        let pile = ask!(self, ctx.controller, choose_pile(&first, &second));
        let (taken, rest) = match pile {
            Pile::First => (first, second),
            Pile::Second => (second, first),
        };
        self.state.logger.normal(&format!(
            "{} takes a pile of {} card(s)",
            self.state.player_name(ctx.controller),
            taken.len()
        ));
        for card in taken {
            self.state.move_card(card, Zone::Hand)?;
        }
        for card in rest {
            self.state.move_card(card, Zone::Graveyard)?;
        }
        Ok(())
    }

    async fn sacrifice_creature(&mut self, player: PlayerId) -> Result<()> {
        let creatures = self.state.creatures_of(player);
        let victim = match creatures.as_slice() {
            [] => return Ok(()),
            [only] => *only,
            _ => ask!(self, player, choose_card(CardPrompt::Sacrifice, &creatures, false))
                .filter(|c| creatures.contains(c))
                .unwrap_or(creatures[0]),
        };
        self.state.logger.normal(&format!(
            "{} sacrifices {}",
            self.state.player_name(player),
            self.state.card_name(victim)
        ));
        self.state.move_card(victim, Zone::Graveyard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::lookup_id;
    use crate::game::{create_game, GameAction, GameConfig, PassController, PlayerSetup, ScriptedController, Step};

    fn engine() -> (GameEngine, PlayerId, PlayerId) {
        let players = vec![
            PlayerSetup::new("Alice", Vec::new(), Box::new(PassController::new())),
            PlayerSetup::new("Bob", Vec::new(), Box::new(PassController::new())),
        ];
        let mut engine = create_game(GameConfig::default(), players).unwrap();
        engine.state.turn.current_step = Step::Main1;
        let ids = engine.player_ids();
        (engine, ids[0], ids[1])
    }

    fn battlefield(engine: &mut GameEngine, name: &str, player: PlayerId) -> CardId {
        let card = engine.state.create_card(lookup_id(name).unwrap(), player);
        engine.state.put_onto_battlefield(card, player, false).unwrap();
        engine.state.pending_triggers.clear();
        card
    }

    fn hand(engine: &mut GameEngine, name: &str, player: PlayerId) -> CardId {
        engine.state.add_to_hand(lookup_id(name).unwrap(), player).unwrap()
    }

    #[tokio::test]
    async fn test_each_wild_growth_on_a_land_adds_green() {
        let (mut engine, alice, bob) = engine();
        let forest = battlefield(&mut engine, "Forest", alice);
        let mountain = battlefield(&mut engine, "Mountain", alice);
        for host in [forest, forest, mountain] {
            let growth = battlefield(&mut engine, "Wild Growth", alice);
            engine.state.cards.get_mut(growth).unwrap().attached_to = Some(host);
        }

        engine.tap_mana_source(alice, forest, Color::Green).await.unwrap();
        let pool = engine.state.get_player(alice).unwrap().mana_pool;
        assert_eq!(pool.amount(Color::Green), 3);
        assert_eq!(pool.total(), 3);
        assert!(engine.state.stack.is_empty());
        assert!(engine.state.get_player(bob).unwrap().mana_pool.is_empty());
    }

    #[tokio::test]
    async fn test_bolt_resolves_against_player() {
        let (mut engine, p1, p2) = engine();
        battlefield(&mut engine, "Mountain", p1);
        let bolt = hand(&mut engine, "Lightning Bolt", p1);
        let mut script = ScriptedController::new();
        script.push_target(Some(TargetRef::Player(p2)));
        engine.controllers[0] = Box::new(script);

        let mountain = engine.state.lands_of_type(p1, crate::core::LandType::Mountain)[0];
        engine.dispatch(p1, GameAction::TapForMana { card: mountain }).await.unwrap();
        engine
            .dispatch(p1, GameAction::CastSpell { card: bolt, method: CastMethod::Normal })
            .await
            .unwrap();
        assert!(engine.resolve_top().await.unwrap());
        assert_eq!(engine.state.get_player(p2).unwrap().life, 17);
        assert_eq!(engine.state.zone_of(bolt), Some(Zone::Graveyard));
        assert!(!engine.resolve_top().await.unwrap());
    }

    #[tokio::test]
    async fn test_jump_lets_a_ground_creature_fly_until_cleanup() {
        let (mut engine, p1, p2) = engine();
        let bears = battlefield(&mut engine, "Grizzly Bears", p1);
        let giant = battlefield(&mut engine, "Hill Giant", p2);
        let jump = engine.state.create_card(lookup_id("Jump").unwrap(), p1);
        let mut targets = crate::game::ChosenTargets::new();
        targets.push(Some(TargetRef::Permanent(bears)));
        engine.state.stack.push(crate::game::StackEntry::spell(jump, CastMethod::Normal, p1, targets));

        engine.resolve_top().await.unwrap();
        assert!(engine.state.has_keyword(bears, crate::core::Keyword::Flying));
        assert!(!engine.state.can_block(giant, bears));
        assert!(engine.state.can_block(bears, giant));

        engine.state.continuous.expire_end_of_turn();
        assert!(!engine.state.has_keyword(bears, crate::core::Keyword::Flying));
        assert!(engine.state.can_block(giant, bears));
    }

    #[tokio::test]
    async fn test_spell_fizzles_when_target_leaves() {
        let (mut engine, p1, p2) = engine();
        let bears = battlefield(&mut engine, "Grizzly Bears", p2);
        let bolt = engine.state.create_card(lookup_id("Lightning Bolt").unwrap(), p1);
        let mut targets = crate::game::ChosenTargets::new();
        targets.push(Some(TargetRef::Permanent(bears)));
        engine.state.stack.push(crate::game::StackEntry::spell(bolt, CastMethod::Normal, p1, targets));
        engine.state.move_card(bears, Zone::Hand).unwrap();

        engine.resolve_top().await.unwrap();
        assert_eq!(engine.state.zone_of(bolt), Some(Zone::Graveyard));
        assert!(engine.state.logger.messages().iter().any(|m| m.contains("does nothing")));
    }

    #[tokio::test]
    async fn test_counter_unless_pays_counters_when_unaffordable() {
        let (mut engine, p1, p2) = engine();
        let bears = engine.state.create_card(lookup_id("Grizzly Bears").unwrap(), p1);
        engine
            .state
            .stack
            .push(crate::game::StackEntry::spell(bears, CastMethod::Normal, p1, Default::default()));
        let daze = engine.state.create_card(lookup_id("Daze").unwrap(), p2);
        let mut targets = crate::game::ChosenTargets::new();
        targets.push(Some(TargetRef::Spell(bears)));
        engine.state.stack.push(crate::game::StackEntry::spell(daze, CastMethod::Normal, p2, targets));

        engine.resolve_top().await.unwrap();
        assert_eq!(engine.state.zone_of(bears), Some(Zone::Graveyard));
        assert!(engine.state.stack.is_empty());
    }

    #[tokio::test]
    async fn test_counter_unless_pays_taps_lands_when_paid() {
        let (mut engine, p1, p2) = engine();
        let forest = battlefield(&mut engine, "Forest", p1);
        let bears = engine.state.create_card(lookup_id("Grizzly Bears").unwrap(), p1);
        engine
            .state
            .stack
            .push(crate::game::StackEntry::spell(bears, CastMethod::Normal, p1, Default::default()));
        let daze = engine.state.create_card(lookup_id("Daze").unwrap(), p2);
        let mut targets = crate::game::ChosenTargets::new();
        targets.push(Some(TargetRef::Spell(bears)));
        engine.state.stack.push(crate::game::StackEntry::spell(daze, CastMethod::Normal, p2, targets));
        let mut script = ScriptedController::new();
        script.push_payment(true);
        engine.controllers[0] = Box::new(script);

        engine.resolve_top().await.unwrap();
        assert!(engine.state.stack.contains_spell(bears));
        assert!(engine.state.card(forest).unwrap().tapped);
        assert_eq!(engine.state.get_player(p1).unwrap().mana_pool.total(), 0);
    }

    #[tokio::test]
    async fn test_pact_upkeep_trigger_loses_game_when_unpaid() {
        let (mut engine, p1, p2) = engine();
        let pact = engine.state.create_card(lookup_id("Pact of Negation").unwrap(), p1);
        let ctx = EffectContext {
            source: pact,
            controller: p1,
            targets: SmallVec::new(),
            legal: SmallVec::new(),
            event_player: None,
        };
        let cost = ManaCost::parse("{3}{U}{U}").unwrap();
        engine.apply_effect(&ctx, &Effect::PayOrLose { cost }).await.unwrap();
        assert!(engine.state.is_game_over());
        assert_eq!(engine.state.winner(), Some(p2));
        assert_eq!(engine.state.end_reason, Some(GameEndReason::UnpaidCost));
    }

    #[tokio::test]
    async fn test_divide_damage_falls_back_to_even_split() {
        let (mut engine, p1, p2) = engine();
        let a = battlefield(&mut engine, "Grizzly Bears", p2);
        let bolt = engine.state.create_card(lookup_id("Forked Bolt").unwrap(), p1);
        let ctx = EffectContext {
            source: bolt,
            controller: p1,
            targets: SmallVec::from_vec(vec![Some(TargetRef::Permanent(a)), Some(TargetRef::Player(p2))]),
            legal: SmallVec::from_vec(vec![true, true]),
            event_player: None,
        };
        // PassController answers with an empty split, which is invalid
        engine.apply_effect(&ctx, &Effect::DivideDamage { amount: 3 }).await.unwrap();
        assert_eq!(engine.state.card(a).unwrap().damage, 2);
        assert_eq!(engine.state.get_player(p2).unwrap().life, 19);
    }

    #[tokio::test]
    async fn test_edict_with_single_creature_needs_no_choice() {
        let (mut engine, p1, p2) = engine();
        let bears = battlefield(&mut engine, "Grizzly Bears", p2);
        let edict = engine.state.create_card(lookup_id("Diabolic Edict").unwrap(), p1);
        let ctx = EffectContext {
            source: edict,
            controller: p1,
            targets: SmallVec::from_vec(vec![Some(TargetRef::Player(p2))]),
            legal: SmallVec::from_vec(vec![true]),
            event_player: None,
        };
        engine
            .apply_effect(&ctx, &Effect::SacrificeCreature { player: PlayerRef::Target(0) })
            .await
            .unwrap();
        assert_eq!(engine.state.zone_of(bears), Some(Zone::Graveyard));
    }

    #[tokio::test]
    async fn test_brainstorm_puts_two_back() {
        let (mut engine, p1, _) = engine();
        for _ in 0..5 {
            engine.state.add_to_library(lookup_id("Island").unwrap(), p1).unwrap();
        }
        let brainstorm = engine.state.create_card(lookup_id("Brainstorm").unwrap(), p1);
        let ctx = EffectContext {
            source: brainstorm,
            controller: p1,
            targets: SmallVec::new(),
            legal: SmallVec::new(),
            event_player: None,
        };
        engine
            .apply_effect(&ctx, &Effect::DrawThenPutBack { draw: 3, put_back: 2 })
            .await
            .unwrap();
        assert_eq!(engine.state.hand(p1).len(), 1);
        assert_eq!(engine.state.library_size(p1), 4);
    }

    #[tokio::test]
    async fn test_fact_or_fiction_split_by_opponent() {
        let (mut engine, p1, _) = engine();
        for _ in 0..6 {
            engine.state.add_to_library(lookup_id("Island").unwrap(), p1).unwrap();
        }
        let fof = engine.state.create_card(lookup_id("Fact or Fiction").unwrap(), p1);
        let ctx = EffectContext {
            source: fof,
            controller: p1,
            targets: SmallVec::new(),
            legal: SmallVec::new(),
            event_player: None,
        };
        engine
            .apply_effect(&ctx, &Effect::RevealAndSplit { count: 5 })
            .await
            .unwrap();
        assert_eq!(engine.state.library_size(p1), 1);
        assert_eq!(engine.state.hand(p1).len() + engine.state.graveyard(p1).len(), 5);
    }
}
