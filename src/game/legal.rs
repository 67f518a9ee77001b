//! Legality checks and legal-action enumeration
//!
//! These are plain reads of `GameState`, shared by dispatch (which
//! re-validates every action it receives) and by controllers (which plan
//! around them). A failed check carries the reason the engine logs when
//! it rejects the action.

use crate::cards::AlternateCost;
use crate::core::{CardId, Color, ManaCost, PlayerId, TargetFilter, TargetRef, TargetSpec, PHYREXIAN_LIFE};
use crate::game::{CastMethod, GameAction, GameState, Step};
use crate::zones::Zone;

/// Why an action is not allowed right now
pub type Legality = std::result::Result<(), String>;

/// What casting a spell one particular way costs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastCost {
    /// Mana after cost reduction; may include Phyrexian symbols
    pub mana: ManaCost,
    /// Life paid on top of the mana (flashback extras, alternate costs)
    pub life: i32,
    pub alternate: Option<AlternateCost>,
}

impl GameState {
    pub fn holds_priority(&self, player_id: PlayerId) -> bool {
        !self.is_game_over() && self.turn.priority_player == Some(player_id)
    }

    /// Own main phase, empty stack, nothing mid-cast
    pub fn sorcery_timing(&self, player_id: PlayerId) -> bool {
        self.turn.active_player == player_id
            && self.turn.current_step.is_main()
            && self.stack.is_empty()
            && self.pending_cast.is_none()
    }

    /// The cost of casting `card_id` by `method`, cost reduction applied
    pub fn effective_cast_cost(&self, player_id: PlayerId, card_id: CardId, method: CastMethod) -> Option<CastCost> {
        let def = self.cards.get(card_id).ok()?.def()?;
        let reduction = self.continuous.cost_reduction(player_id, def);
        match method {
            CastMethod::Normal => Some(CastCost {
                mana: def.cost.with_generic_reduction(reduction),
                life: 0,
                alternate: None,
            }),
            CastMethod::Flashback => def.flashback.map(|cost| CastCost {
                mana: cost.mana.with_generic_reduction(reduction),
                life: cost.life,
                alternate: None,
            }),
            CastMethod::Alternate(i) => def.alternate_costs.get(i).map(|&alt| CastCost {
                mana: ManaCost::new(),
                life: match alt {
                    AlternateCost::ExileCardFromHand { life, .. } | AlternateCost::PayLife { life, .. } => life,
                    AlternateCost::ReturnLand { .. } => 0,
                },
                alternate: Some(alt),
            }),
        }
    }

    /// Every casting requirement except paying the mana
    ///
    /// Returns the cost that would be charged.
    pub fn check_cast(&self, player_id: PlayerId, card_id: CardId, method: CastMethod) -> Result<CastCost, String> {
        if self.pending_cast.is_some() {
            return Err("another spell is being cast".to_string());
        }
        let card = self
            .cards
            .get(card_id)
            .map_err(|_| format!("no such card {card_id}"))?;
        let def = card.def().ok_or_else(|| format!("{} cannot be cast", card.name))?;
        if def.is_land() {
            return Err(format!("{} is a land", card.name));
        }
        if card.owner != player_id {
            return Err(format!("{} is not yours", card.name));
        }

        let (expected_zone, zone_name) = match method {
            CastMethod::Flashback => (Zone::Graveyard, "graveyard"),
            CastMethod::Normal | CastMethod::Alternate(_) => (Zone::Hand, "hand"),
        };
        if self.zone_of(card_id) != Some(expected_zone) {
            return Err(format!("{} is not in your {zone_name}", card.name));
        }
        if !def.has_flash() && !self.sorcery_timing(player_id) {
            return Err(format!("{} can only be cast at sorcery speed", card.name));
        }
        if !self.has_required_targets(player_id, card_id, &def.spell.targets) {
            return Err(format!("{} has no legal target", card.name));
        }

        let cost = self
            .effective_cast_cost(player_id, card_id, method)
            .ok_or_else(|| format!("{} has no such cost", card.name))?;
        let life = self.get_player(player_id).map(|p| p.life).unwrap_or(0);

        match cost.alternate {
            Some(AlternateCost::ExileCardFromHand { color, .. }) => {
                let has_pitch = self
                    .hand(player_id)
                    .iter()
                    .any(|&other| other != card_id && self.cards.get(other).is_ok_and(|c| c.has_color(color)));
                if !has_pitch {
                    return Err(format!("no other {color} card to exile"));
                }
            }
            Some(AlternateCost::ReturnLand { land_type }) => {
                if self.lands_of_type(player_id, land_type).is_empty() {
                    return Err(format!("no {land_type} to return"));
                }
            }
            Some(AlternateCost::PayLife { requires, .. }) => {
                if self.lands_of_type(player_id, requires).is_empty() {
                    return Err(format!("requires controlling a {requires}"));
                }
            }
            None => {}
        }
        if cost.life > 0 && life < cost.life {
            return Err(format!("not enough life to pay {}", cost.life));
        }
        Ok(cost)
    }

    /// Whether the pool covers the mana part of a cast, Phyrexian symbols
    /// counted as mana where the pool has it and life otherwise
    pub fn can_afford_from_pool(&self, player_id: PlayerId, cost: &CastCost) -> bool {
        let Ok(player) = self.get_player(player_id) else {
            return false;
        };
        let mut pool = player.mana_pool;
        if pool.pay(&cost.mana.without_phyrexian()).is_err() {
            return false;
        }
        let mut life_needed = cost.life;
        for color in Color::COLORED {
            let owed = cost.mana.phyrexian_amount(color);
            let from_pool = pool.amount(color).min(owed);
            life_needed += (owed - from_pool) as i32 * PHYREXIAN_LIFE;
        }
        life_needed == 0 || player.life >= life_needed
    }

    pub fn can_cast(&self, player_id: PlayerId, card_id: CardId, method: CastMethod) -> Legality {
        if !self.holds_priority(player_id) {
            return Err("you do not have priority".to_string());
        }
        let cost = self.check_cast(player_id, card_id, method)?;
        if !self.can_afford_from_pool(player_id, &cost) {
            return Err(format!("cannot pay {} for {}", cost.mana, self.card_name(card_id)));
        }
        Ok(())
    }

    pub fn can_play_land_card(&self, player_id: PlayerId, card_id: CardId) -> Legality {
        if !self.holds_priority(player_id) {
            return Err("you do not have priority".to_string());
        }
        if !self.hand(player_id).contains(&card_id) {
            return Err(format!("{} is not in your hand", self.card_name(card_id)));
        }
        if !self.is_type(card_id, crate::core::CardType::Land) {
            return Err(format!("{} is not a land", self.card_name(card_id)));
        }
        if !self.sorcery_timing(player_id) {
            return Err("lands can only be played in your main phase with an empty stack".to_string());
        }
        if !self.get_player(player_id).is_ok_and(|p| p.can_play_land()) {
            return Err("already played a land this turn".to_string());
        }
        Ok(())
    }

    pub fn can_tap_for_mana(&self, player_id: PlayerId, card_id: CardId) -> Legality {
        if !self.holds_priority(player_id) {
            return Err("you do not have priority".to_string());
        }
        if self.mana_options(player_id, card_id).is_empty() {
            return Err(format!("{} cannot be tapped for mana", self.card_name(card_id)));
        }
        Ok(())
    }

    fn check_permanent_ability(&self, player_id: PlayerId, card_id: CardId) -> Legality {
        if !self.holds_priority(player_id) {
            return Err("you do not have priority".to_string());
        }
        if self.pending_cast.is_some() {
            return Err("a spell is being cast".to_string());
        }
        if !self.battlefield.contains(card_id) {
            return Err(format!("{} is not on the battlefield", self.card_name(card_id)));
        }
        if !self.cards.get(card_id).is_ok_and(|c| c.controller == player_id) {
            return Err(format!("you do not control {}", self.card_name(card_id)));
        }
        Ok(())
    }

    pub fn can_activate(&self, player_id: PlayerId, card_id: CardId, index: usize) -> Legality {
        self.check_permanent_ability(player_id, card_id)?;
        let card = self
            .cards
            .get(card_id)
            .map_err(|_| format!("no such card {card_id}"))?;
        let ability = card
            .def()
            .and_then(|d| d.activated.get(index))
            .ok_or_else(|| format!("{} has no ability #{}", card.name, index + 1))?;
        let player = self.get_player(player_id).map_err(|e| e.to_string())?;

        if ability.cost.tap && (card.tapped || self.is_summoning_sick(card_id)) {
            return Err(format!("{} cannot be tapped", card.name));
        }
        if !player.mana_pool.can_pay(&ability.cost.mana) {
            return Err(format!("cannot pay {}", ability.cost.mana));
        }
        if ability.cost.life > 0 && player.life < ability.cost.life {
            return Err(format!("not enough life to pay {}", ability.cost.life));
        }
        if !self.has_required_targets(player_id, card_id, &ability.ability.targets) {
            return Err(format!("{} has no legal target", card.name));
        }
        Ok(())
    }

    pub fn can_activate_loyalty(&self, player_id: PlayerId, card_id: CardId, index: usize) -> Legality {
        self.check_permanent_ability(player_id, card_id)?;
        if !self.sorcery_timing(player_id) {
            return Err("loyalty abilities are sorcery speed".to_string());
        }
        let card = self
            .cards
            .get(card_id)
            .map_err(|_| format!("no such card {card_id}"))?;
        if card.loyalty_activated {
            return Err(format!("{} already activated a loyalty ability this turn", card.name));
        }
        let ability = card
            .def()
            .and_then(|d| d.loyalty_abilities.get(index))
            .ok_or_else(|| format!("{} has no loyalty ability #{}", card.name, index + 1))?;
        if card.loyalty() + ability.change < 0 {
            return Err(format!("{} does not have enough loyalty", card.name));
        }
        if !self.has_required_targets(player_id, card_id, &ability.ability.targets) {
            return Err(format!("{} has no legal target", card.name));
        }
        Ok(())
    }

    pub fn can_fetch(&self, player_id: PlayerId, card_id: CardId) -> Legality {
        self.check_permanent_ability(player_id, card_id)?;
        let card = self
            .cards
            .get(card_id)
            .map_err(|_| format!("no such card {card_id}"))?;
        if !card.def().is_some_and(|d| !d.fetches.is_empty()) {
            return Err(format!("{} is not a fetch land", card.name));
        }
        if card.tapped {
            return Err(format!("{} is tapped", card.name));
        }
        if !self.get_player(player_id).is_ok_and(|p| p.life >= 1) {
            return Err("not enough life".to_string());
        }
        Ok(())
    }

    pub fn can_cycle(&self, player_id: PlayerId, card_id: CardId) -> Legality {
        if !self.holds_priority(player_id) {
            return Err("you do not have priority".to_string());
        }
        if self.pending_cast.is_some() {
            return Err("a spell is being cast".to_string());
        }
        if !self.hand(player_id).contains(&card_id) {
            return Err(format!("{} is not in your hand", self.card_name(card_id)));
        }
        let cost = self
            .cards
            .get(card_id)
            .ok()
            .and_then(|c| c.def())
            .and_then(|d| d.cycling)
            .ok_or_else(|| format!("{} has no cycling", self.card_name(card_id)))?;
        let player = self.get_player(player_id).map_err(|e| e.to_string())?;
        if !player.mana_pool.can_pay(&cost.mana) {
            return Err(format!("cannot pay {}", cost.mana));
        }
        if cost.life > 0 && player.life < cost.life {
            return Err(format!("not enough life to pay {}", cost.life));
        }
        Ok(())
    }

    pub fn can_ninjutsu(&self, player_id: PlayerId, ninja: CardId, attacker: CardId) -> Legality {
        if !self.holds_priority(player_id) {
            return Err("you do not have priority".to_string());
        }
        if self.pending_cast.is_some() {
            return Err("a spell is being cast".to_string());
        }
        if self.turn.current_step != Step::DeclareBlockers || !self.combat.blockers_declared {
            return Err("ninjutsu only after blockers are declared".to_string());
        }
        if self.turn.active_player != player_id {
            return Err("only the attacking player can use ninjutsu".to_string());
        }
        if !self.hand(player_id).contains(&ninja) {
            return Err(format!("{} is not in your hand", self.card_name(ninja)));
        }
        let cost = self
            .cards
            .get(ninja)
            .ok()
            .and_then(|c| c.def())
            .and_then(|d| d.ninjutsu)
            .ok_or_else(|| format!("{} has no ninjutsu", self.card_name(ninja)))?;
        if !self.combat.is_attacking(attacker) || self.combat.is_blocked(attacker) {
            return Err(format!("{} is not an unblocked attacker", self.card_name(attacker)));
        }
        if !self.cards.get(attacker).is_ok_and(|c| c.controller == player_id) {
            return Err(format!("you do not control {}", self.card_name(attacker)));
        }
        if !self.get_player(player_id).is_ok_and(|p| p.mana_pool.can_pay(&cost)) {
            return Err(format!("cannot pay {cost}"));
        }
        Ok(())
    }

    fn is_live_player(&self, player_id: PlayerId) -> bool {
        self.get_player(player_id).is_ok_and(|p| !p.has_lost)
    }

    fn matches_filter(&self, controller: PlayerId, source: CardId, filter: TargetFilter, target: TargetRef) -> bool {
        let on_battlefield = |c: CardId| self.battlefield.contains(c);
        match (filter, target) {
            (TargetFilter::AnyTarget | TargetFilter::Player, TargetRef::Player(p)) => self.is_live_player(p),
            (TargetFilter::Opponent, TargetRef::Player(p)) => p != controller && self.is_live_player(p),
            (TargetFilter::AnyTarget, TargetRef::Permanent(c)) => {
                on_battlefield(c) && self.cards.get(c).is_ok_and(|card| card.is_creature() || card.is_planeswalker())
            }
            (TargetFilter::Creature, TargetRef::Permanent(c)) => {
                on_battlefield(c) && self.cards.get(c).is_ok_and(|card| card.is_creature())
            }
            (TargetFilter::NonblackCreature, TargetRef::Permanent(c)) => {
                on_battlefield(c)
                    && self
                        .cards
                        .get(c)
                        .is_ok_and(|card| card.is_creature() && !card.has_color(Color::Black))
            }
            (TargetFilter::Land, TargetRef::Permanent(c)) => {
                on_battlefield(c) && self.cards.get(c).is_ok_and(|card| card.is_land())
            }
            (TargetFilter::Spell, TargetRef::Spell(c)) => c != source && self.stack.contains_spell(c),
            (TargetFilter::NoncreatureSpell, TargetRef::Spell(c)) => {
                c != source && self.stack.contains_spell(c) && !self.cards.get(c).is_ok_and(|card| card.is_creature())
            }
            (TargetFilter::CreatureCardInYourGraveyard, TargetRef::GraveyardCard(c)) => {
                self.graveyard(controller).contains(&c) && self.cards.get(c).is_ok_and(|card| card.is_creature())
            }
            _ => false,
        }
    }

    /// Whether `target` satisfies `spec` for a spell or ability
    pub fn is_target_legal(&self, controller: PlayerId, source: CardId, spec: &TargetSpec, target: TargetRef) -> bool {
        self.matches_filter(controller, source, spec.filter, target)
    }

    /// Every legal choice for one target slot, minus those already chosen
    pub fn target_candidates(
        &self,
        controller: PlayerId,
        source: CardId,
        spec: &TargetSpec,
        exclude: &[TargetRef],
    ) -> Vec<TargetRef> {
        let players = self.players.iter().map(|p| TargetRef::Player(p.id));
        let permanents = self.battlefield.iter().map(TargetRef::Permanent);
        let universe: Vec<TargetRef> = match spec.filter {
            TargetFilter::AnyTarget => permanents.chain(players).collect(),
            TargetFilter::Creature | TargetFilter::NonblackCreature | TargetFilter::Land => permanents.collect(),
            TargetFilter::Player | TargetFilter::Opponent => players.collect(),
            // Top of the stack first
            TargetFilter::Spell | TargetFilter::NoncreatureSpell => self
                .stack
                .iter()
                .rev()
                .filter_map(|e| e.spell_card())
                .map(TargetRef::Spell)
                .collect(),
            TargetFilter::CreatureCardInYourGraveyard => self
                .graveyard(controller)
                .iter()
                .map(|&c| TargetRef::GraveyardCard(c))
                .collect(),
        };
        universe
            .into_iter()
            .filter(|t| !exclude.contains(t))
            .filter(|&t| self.matches_filter(controller, source, spec.filter, t))
            .collect()
    }

    /// Whether every non-optional slot can get a distinct target
    pub fn has_required_targets(&self, controller: PlayerId, source: CardId, specs: &[TargetSpec]) -> bool {
        let mut chosen = Vec::new();
        for spec in specs.iter().filter(|s| !s.optional) {
            match self.target_candidates(controller, source, spec, &chosen).first() {
                Some(&target) => chosen.push(target),
                None => return false,
            }
        }
        true
    }

    /// Every action `player_id` could take right now that dispatch would
    /// accept
    pub fn legal_actions(&self, player_id: PlayerId) -> Vec<GameAction> {
        if !self.holds_priority(player_id) {
            return Vec::new();
        }
        let mut actions = Vec::new();
        let mana_sources: Vec<CardId> = self
            .battlefield
            .iter()
            .filter(|&c| !self.mana_options(player_id, c).is_empty())
            .collect();

        if let Some(pending) = &self.pending_cast {
            if pending.controller != player_id {
                return actions;
            }
            let (life, pool) = match self.get_player(player_id) {
                Ok(p) => (p.life, p.mana_pool),
                Err(_) => return actions,
            };
            actions.extend(mana_sources.into_iter().map(|card| GameAction::TapForMana { card }));
            for color in Color::COLORED {
                if pending.remaining(color) == 0 {
                    continue;
                }
                if pool.amount(color) > 0 {
                    actions.push(GameAction::PayPhyrexian { color, with_life: false });
                }
                if life >= PHYREXIAN_LIFE {
                    actions.push(GameAction::PayPhyrexian { color, with_life: true });
                }
            }
            if pending.is_fully_paid() {
                actions.push(GameAction::CompleteCast);
            }
            actions.push(GameAction::CancelCast);
            return actions;
        }

        actions.push(GameAction::PassPriority);

        for &card in self.hand(player_id) {
            let Some(def) = self.cards.get(card).ok().and_then(|c| c.def()) else {
                continue;
            };
            if def.is_land() {
                if self.can_play_land_card(player_id, card).is_ok() {
                    actions.push(GameAction::PlayLand { card });
                }
            } else {
                let methods = std::iter::once(CastMethod::Normal)
                    .chain((0..def.alternate_costs.len()).map(CastMethod::Alternate));
                for method in methods {
                    if self.can_cast(player_id, card, method).is_ok() {
                        actions.push(GameAction::CastSpell { card, method });
                    }
                }
            }
            if def.cycling.is_some() && self.can_cycle(player_id, card).is_ok() {
                actions.push(GameAction::Cycle { card });
            }
            if def.ninjutsu.is_some() {
                for attacker in self.combat.unblocked_attackers() {
                    if self.can_ninjutsu(player_id, card, attacker).is_ok() {
                        actions.push(GameAction::Ninjutsu { ninja: card, attacker });
                    }
                }
            }
        }

        for &card in self.graveyard(player_id) {
            if self.can_cast(player_id, card, CastMethod::Flashback).is_ok() {
                actions.push(GameAction::CastSpell {
                    card,
                    method: CastMethod::Flashback,
                });
            }
        }

        actions.extend(mana_sources.into_iter().map(|card| GameAction::TapForMana { card }));

        for card in self.permanents_of(player_id) {
            let Some(def) = self.cards.get(card).ok().and_then(|c| c.def()) else {
                continue;
            };
            for index in 0..def.activated.len() {
                if self.can_activate(player_id, card, index).is_ok() {
                    actions.push(GameAction::ActivateAbility { card, index });
                }
            }
            for index in 0..def.loyalty_abilities.len() {
                if self.can_activate_loyalty(player_id, card, index).is_ok() {
                    actions.push(GameAction::ActivateLoyalty { card, index });
                }
            }
            if !def.fetches.is_empty() && self.can_fetch(player_id, card).is_ok() {
                actions.push(GameAction::Fetch { card });
            }
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::lookup_id;
    use crate::game::StackEntry;
    use smallvec::SmallVec;

    fn setup() -> (GameState, PlayerId, PlayerId) {
        let mut game = GameState::new_two_player("Alice".to_string(), "Bob".to_string(), 20);
        let p1 = game.players[0].id;
        let p2 = game.players[1].id;
        game.turn.current_step = Step::Main1;
        game.turn.priority_player = Some(p1);
        (game, p1, p2)
    }

    fn battlefield(game: &mut GameState, name: &str, owner: PlayerId) -> CardId {
        let card = game.create_card(lookup_id(name).unwrap(), owner);
        game.put_onto_battlefield(card, owner, false).unwrap();
        card
    }

    #[test]
    fn test_cast_needs_mana_in_pool() {
        let (mut game, p1, _) = setup();
        let lions = game.add_to_hand(lookup_id("Savannah Lions").unwrap(), p1).unwrap();
        assert!(game.can_cast(p1, lions, CastMethod::Normal).is_err());

        game.get_player_mut(p1).unwrap().mana_pool.add(Color::White, 1);
        assert!(game.can_cast(p1, lions, CastMethod::Normal).is_ok());
        assert!(game
            .legal_actions(p1)
            .contains(&GameAction::CastSpell { card: lions, method: CastMethod::Normal }));
    }

    #[test]
    fn test_sorcery_speed_needs_empty_stack_and_own_turn() {
        let (mut game, _, p2) = setup();
        let divination = game.add_to_hand(lookup_id("Divination").unwrap(), p2).unwrap();
        game.get_player_mut(p2).unwrap().mana_pool.add(Color::Blue, 3);
        game.turn.priority_player = Some(p2);
        assert!(game.can_cast(p2, divination, CastMethod::Normal).is_err());

        let bolt = game.add_to_hand(lookup_id("Lightning Bolt").unwrap(), p2).unwrap();
        game.get_player_mut(p2).unwrap().mana_pool.add(Color::Red, 1);
        assert!(game.can_cast(p2, bolt, CastMethod::Normal).is_ok());
    }

    #[test]
    fn test_phyrexian_payable_with_life() {
        let (mut game, p1, _) = setup();
        let probe = game.add_to_hand(lookup_id("Gitaxian Probe").unwrap(), p1).unwrap();
        assert!(game.can_cast(p1, probe, CastMethod::Normal).is_ok());
        game.get_player_mut(p1).unwrap().life = 1;
        assert!(game.can_cast(p1, probe, CastMethod::Normal).is_err());
    }

    #[test]
    fn test_cost_reduction_applies() {
        let (mut game, p1, _) = setup();
        battlefield(&mut game, "Helm of Awakening", p1);
        let bears = game.add_to_hand(lookup_id("Grizzly Bears").unwrap(), p1).unwrap();
        let cost = game.effective_cast_cost(p1, bears, CastMethod::Normal).unwrap();
        assert_eq!(cost.mana.to_string(), "{G}");
    }

    #[test]
    fn test_counterspell_needs_a_spell_target() {
        let (mut game, p1, p2) = setup();
        let counter = game.add_to_hand(lookup_id("Counterspell").unwrap(), p1).unwrap();
        game.get_player_mut(p1).unwrap().mana_pool.add(Color::Blue, 2);
        assert!(game.can_cast(p1, counter, CastMethod::Normal).is_err());

        let bears = game.create_card(lookup_id("Grizzly Bears").unwrap(), p2);
        game.stack
            .push(StackEntry::spell(bears, CastMethod::Normal, p2, SmallVec::new()));
        assert!(game.can_cast(p1, counter, CastMethod::Normal).is_ok());
        let spec = TargetSpec::harmful(TargetFilter::Spell);
        assert_eq!(
            game.target_candidates(p1, counter, &spec, &[]),
            vec![TargetRef::Spell(bears)]
        );
    }

    #[test]
    fn test_spell_candidates_list_the_top_of_the_stack_first() {
        let (mut game, p1, p2) = setup();
        let counter = game.add_to_hand(lookup_id("Counterspell").unwrap(), p1).unwrap();
        let bears = game.create_card(lookup_id("Grizzly Bears").unwrap(), p2);
        let bolt = game.create_card(lookup_id("Lightning Bolt").unwrap(), p2);
        game.stack
            .push(StackEntry::spell(bears, CastMethod::Normal, p2, SmallVec::new()));
        game.stack
            .push(StackEntry::spell(bolt, CastMethod::Normal, p2, SmallVec::new()));

        let spec = TargetSpec::harmful(TargetFilter::Spell);
        assert_eq!(
            game.target_candidates(p1, counter, &spec, &[]),
            vec![TargetRef::Spell(bolt), TargetRef::Spell(bears)]
        );
    }

    #[test]
    fn test_any_target_candidates_exclude_chosen() {
        let (mut game, p1, p2) = setup();
        let bears = battlefield(&mut game, "Grizzly Bears", p2);
        let source = game.create_card(lookup_id("Forked Bolt").unwrap(), p1);
        let spec = TargetSpec::harmful(TargetFilter::AnyTarget);
        let all = game.target_candidates(p1, source, &spec, &[]);
        assert_eq!(all, vec![TargetRef::Permanent(bears), TargetRef::Player(p1), TargetRef::Player(p2)]);
        let rest = game.target_candidates(p1, source, &spec, &[TargetRef::Permanent(bears)]);
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn test_alternate_cost_requirements() {
        let (mut game, p1, _) = setup();
        let fow = game.add_to_hand(lookup_id("Force of Will").unwrap(), p1).unwrap();
        let daze = game.add_to_hand(lookup_id("Daze").unwrap(), p1).unwrap();
        let bears = game.create_card(lookup_id("Grizzly Bears").unwrap(), p1);
        game.stack
            .push(StackEntry::spell(bears, CastMethod::Normal, p1, SmallVec::new()));

        // Daze pitches FoW, FoW pitches Daze
        assert!(game.can_cast(p1, fow, CastMethod::Alternate(0)).is_ok());
        // No Island to return
        assert!(game.can_cast(p1, daze, CastMethod::Alternate(0)).is_err());
        battlefield(&mut game, "Island", p1);
        assert!(game.can_cast(p1, daze, CastMethod::Alternate(0)).is_ok());
    }

    #[test]
    fn test_mid_cast_only_offers_payment() {
        let (mut game, p1, _) = setup();
        battlefield(&mut game, "Swamp", p1);
        let dismember = game.add_to_hand(lookup_id("Dismember").unwrap(), p1).unwrap();
        game.pending_cast = Some(crate::game::PendingCast {
            card: dismember,
            controller: p1,
            method: CastMethod::Normal,
            targets: SmallVec::new(),
            paid: crate::core::ManaPayment::new(),
            life_paid: 0,
            remaining_phyrexian: [0, 0, 2, 0, 0],
        });
        let actions = game.legal_actions(p1);
        assert!(actions.iter().all(|a| a.is_payment_step()));
        assert!(actions.contains(&GameAction::PayPhyrexian { color: Color::Black, with_life: true }));
        assert!(!actions.contains(&GameAction::CompleteCast));
        assert!(actions.contains(&GameAction::CancelCast));
    }

    #[test]
    fn test_no_actions_without_priority() {
        let (game, _, p2) = setup();
        assert!(game.legal_actions(p2).is_empty());
    }
}
