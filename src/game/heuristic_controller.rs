//! Heuristic AI controller
//!
//! A rule-based player that makes reasonable decisions from the visible
//! board: it scores creatures, does the combat math for attacks and
//! blocks, sequences land drops and spells, and plans which sources to
//! tap before each cast.
//!
//! Main-phase sequencing: land first, crack a fetch land if there are
//! spells to cast, then tap for and cast the most expensive affordable
//! spell, then cycle a card that cannot be cast. Outside its own main
//! phase the bot only reacts: counterspells against opposing spells,
//! pump spells during combat, removal and leftover instants at the
//! opponent's end step.

use crate::cards::CardDefinition;
use crate::core::{
    CardId, Color, Effect, Keyword, ManaCost, ManaPool, Polarity, TargetFilter, TargetRef, TargetSpec, PHYREXIAN_LIFE,
};
use crate::game::controller::{decided, CardPrompt, Decision, GameStateView, PaymentReason, Pile, PlayerController};
use crate::game::legal::CastCost;
use crate::game::mana_sources::{ManaPlanner, TapPlan};
use crate::game::{CastMethod, GameAction, GameState, Step};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Life kept in reserve when paying Phyrexian symbols with life
const PHYREXIAN_LIFE_FLOOR: i32 = 10;

/// Mana sources needed before Pact of Negation's upkeep bill is safe
const PACT_MIN_SOURCES: usize = 5;

/// Smallest mana value worth an alternate-cost counterspell
const PITCH_COUNTER_MIN_CMC: u8 = 3;

/// Value below which a creature is fine to throw in front of an attacker
const LOW_VALUE_BLOCKER: i32 = 100;

/// Factors for evaluating an attack
///
/// Modeled on the attack-controller bookkeeping of a classic rules AI:
/// how the attacker fares against each creature that could block it.
#[derive(Debug, Clone, Copy)]
struct CombatFactors {
    can_be_killed: bool,
    can_be_killed_by_one: bool,
    can_kill_all: bool,
    can_kill_all_dangerous: bool,
    is_worth_less_than_all_killers: bool,
    has_combat_effect: bool,
    dangerous_blockers_present: bool,
    can_be_blocked: bool,
    number_of_blockers: usize,
}

/// What a spell is for, as far as timing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpellRole {
    Counter,
    Removal,
    Pump,
    Ritual,
    Other,
}

/// An action waiting on mana: tap these sources, then take it
#[derive(Debug, Clone)]
struct Intent {
    action: GameAction,
    taps: VecDeque<(CardId, Color)>,
    /// Phyrexian symbols of the spell to pay with mana rather than life
    reserved: ManaPool,
}

/// Heuristic AI controller
#[derive(Debug, Clone)]
pub struct HeuristicController {
    /// 0 (never attacks) to 6 (all in); 3 is balanced
    aggression_level: i32,
    intent: Option<Intent>,
    /// Colors promised to multi-color sources by the current intent
    planned_colors: FxHashMap<CardId, Color>,
    /// Pool mana set aside for the Phyrexian symbols of the spell being cast
    reserved: ManaPool,
    /// Targets already picked for one source, so "up to" slots spread out
    chosen: SmallVec<[(CardId, TargetRef); 3]>,
}

impl Default for HeuristicController {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicController {
    pub fn new() -> Self {
        HeuristicController {
            aggression_level: 3,
            intent: None,
            planned_colors: FxHashMap::default(),
            reserved: ManaPool::new(),
            chosen: SmallVec::new(),
        }
    }

    /// Set the aggression level, clamped to 0..=6
    pub fn set_aggression(&mut self, level: i32) {
        self.aggression_level = level.clamp(0, 6);
    }

    pub fn aggression(&self) -> i32 {
        self.aggression_level
    }

    /// Score a creature on the battlefield
    ///
    /// Base 80 (100 for non-tokens), plus weighted power, toughness and
    /// mana value, plus keyword bonuses scaled by power. Defenders are
    /// heavily discounted; mana creatures get a small bonus.
    pub fn evaluate_creature(&self, game: &GameState, card_id: CardId) -> i32 {
        let Ok(card) = game.card(card_id) else {
            return 0;
        };
        let power = game.power(card_id);
        let toughness = game.toughness(card_id);
        let has = |keyword| game.has_keyword(card_id, keyword);

        let mut value = 80;
        if !card.is_token() {
            value += 20;
        }
        value += power * 15;
        value += toughness * 10;
        value += card.cmc() as i32 * 5;

        if has(Keyword::Flying) {
            value += power * 10;
        }
        if power > 0 {
            if has(Keyword::FirstStrike) {
                value += 10 + power * 5;
            }
            if has(Keyword::Deathtouch) {
                value += 25;
            }
            if has(Keyword::Lifelink) {
                value += power * 10;
            }
            if power > 1 && has(Keyword::Trample) {
                value += (power - 1) * 5;
            }
            if has(Keyword::Vigilance) {
                value += power * 5 + toughness * 5;
            }
        }
        if has(Keyword::Reach) && !has(Keyword::Flying) {
            value += 5;
        }
        if has(Keyword::Defender) {
            value -= power * 9 + 40;
        }
        if card.def().is_some_and(|d| !d.produces.is_empty()) {
            value += 10;
        }
        value
    }

    /// Rough worth of a card in hand or a library
    fn card_value(&self, game: &GameState, card_id: CardId) -> i32 {
        match game.card(card_id).ok().and_then(|c| c.def()) {
            Some(def) if def.is_land() => 10,
            Some(def) => 20 + def.cost.cmc() as i32 * 10,
            None => 0,
        }
    }

    // ---- combat math ----

    /// Whether `source` deals lethal damage to `victim` in a fight
    fn can_destroy(&self, game: &GameState, source: CardId, victim: CardId) -> bool {
        let toughness = game.toughness(victim);
        let already = game.card(victim).map(|c| c.damage).unwrap_or(0);
        if game.has_keyword(source, Keyword::Deathtouch) && toughness > 0 && game.power(source) > 0 {
            return true;
        }
        game.power(source) >= toughness - already
    }

    /// Whether `striker` kills `victim` before `victim` deals damage back
    fn strikes_first(&self, game: &GameState, striker: CardId, victim: CardId) -> bool {
        game.has_keyword(striker, Keyword::FirstStrike)
            && !game.has_keyword(victim, Keyword::FirstStrike)
            && self.can_destroy(game, striker, victim)
    }

    fn is_dangerous(&self, game: &GameState, card: CardId) -> bool {
        game.has_keyword(card, Keyword::Lifelink) || game.has_keyword(card, Keyword::Deathtouch)
    }

    fn calculate_combat_factors(&self, view: &GameStateView, attacker: CardId) -> CombatFactors {
        let game = view.game();
        let attacker_value = self.evaluate_creature(game, attacker);
        let potential_blockers: Vec<CardId> = view
            .opponent_creatures()
            .into_iter()
            .filter(|&b| game.can_block(b, attacker))
            .collect();

        let mut factors = CombatFactors {
            can_be_killed: false,
            can_be_killed_by_one: false,
            can_kill_all: true,
            can_kill_all_dangerous: true,
            is_worth_less_than_all_killers: true,
            has_combat_effect: game.has_keyword(attacker, Keyword::Lifelink),
            dangerous_blockers_present: potential_blockers.iter().any(|&b| self.is_dangerous(game, b)),
            can_be_blocked: !potential_blockers.is_empty(),
            number_of_blockers: potential_blockers.len(),
        };

        for &blocker in &potential_blockers {
            if self.can_destroy(game, blocker, attacker) && !self.strikes_first(game, attacker, blocker) {
                factors.can_be_killed = true;
                factors.can_be_killed_by_one = true;
                if self.evaluate_creature(game, blocker) <= attacker_value {
                    factors.is_worth_less_than_all_killers = false;
                }
            }
            if !self.can_destroy(game, attacker, blocker) || self.strikes_first(game, blocker, attacker) {
                factors.can_kill_all = false;
                if self.is_dangerous(game, blocker) {
                    factors.can_kill_all_dangerous = false;
                }
            }
        }
        factors
    }

    /// Attack decision by aggression level
    fn should_attack(&self, view: &GameStateView, attacker: CardId) -> bool {
        let power = view.power(attacker);
        if power <= 0 {
            return false;
        }
        let f = self.calculate_combat_factors(view, attacker);
        if !f.can_be_blocked {
            return true;
        }

        match self.aggression_level {
            6 => f.can_kill_all && f.is_worth_less_than_all_killers,
            5 => true,
            4 => {
                f.can_kill_all
                    || (f.dangerous_blockers_present && f.can_kill_all_dangerous && !f.can_be_killed_by_one)
                    || f.number_of_blockers == 0
            }
            3 => {
                (f.can_kill_all && f.is_worth_less_than_all_killers)
                    || (((f.dangerous_blockers_present && f.can_kill_all_dangerous) || f.has_combat_effect)
                        && !f.can_be_killed_by_one)
            }
            2 => {
                (f.can_kill_all || f.has_combat_effect)
                    && !f.can_be_killed_by_one
                    && ((f.dangerous_blockers_present && f.can_kill_all_dangerous) || !f.can_be_killed)
            }
            1 => f.number_of_blockers == 1 && f.can_kill_all && !f.can_be_killed_by_one,
            _ => false,
        }
    }

    /// Whether blocking `attacker` with `blocker` is a good trade
    fn should_block(&self, game: &GameState, blocker: CardId, attacker: CardId) -> bool {
        let kills = self.can_destroy(game, blocker, attacker) && !self.strikes_first(game, attacker, blocker);
        let survives = !self.can_destroy(game, attacker, blocker) || self.strikes_first(game, blocker, attacker);
        let blocker_value = self.evaluate_creature(game, blocker);
        let attacker_value = self.evaluate_creature(game, attacker);

        match (kills, survives) {
            (true, true) => true,
            (true, false) => attacker_value >= blocker_value,
            (false, true) => blocker_value < LOW_VALUE_BLOCKER,
            (false, false) => false,
        }
    }

    fn plan_blocks(&self, view: &GameStateView, blockers: &[CardId], attackers: &[CardId]) -> Vec<(CardId, CardId)> {
        let game = view.game();
        let mut attackers: Vec<CardId> = attackers.to_vec();
        attackers.sort_by_key(|&a| std::cmp::Reverse(self.evaluate_creature(game, a)));

        let mut blocks: Vec<(CardId, CardId)> = Vec::new();
        let used = |blocks: &Vec<(CardId, CardId)>, b: CardId| blocks.iter().any(|&(x, _)| x == b);

        // Smallest lethal blocker onto the largest attacker first
        for &attacker in &attackers {
            let lethal = blockers
                .iter()
                .copied()
                .filter(|&b| !used(&blocks, b) && game.can_block(b, attacker))
                .filter(|&b| self.can_destroy(game, b, attacker) && self.should_block(game, b, attacker))
                .min_by_key(|&b| self.evaluate_creature(game, b));
            if let Some(blocker) = lethal {
                blocks.push((blocker, attacker));
                continue;
            }
            let wall = blockers
                .iter()
                .copied()
                .filter(|&b| !used(&blocks, b) && game.can_block(b, attacker))
                .filter(|&b| self.should_block(game, b, attacker))
                .min_by_key(|&b| self.evaluate_creature(game, b));
            if let Some(blocker) = wall {
                blocks.push((blocker, attacker));
            }
        }

        // Chump until the unblocked damage is survivable
        let life = view.life();
        let incoming = |blocks: &Vec<(CardId, CardId)>| -> i32 {
            attackers
                .iter()
                .filter(|&&a| !blocks.iter().any(|&(_, x)| x == a))
                .map(|&a| game.power(a).max(0))
                .sum()
        };
        let mut unblocked: Vec<CardId> = attackers
            .iter()
            .copied()
            .filter(|&a| !blocks.iter().any(|&(_, x)| x == a))
            .collect();
        unblocked.sort_by_key(|&a| std::cmp::Reverse(game.power(a)));
        for attacker in unblocked {
            if incoming(&blocks) < life {
                break;
            }
            let chump = blockers
                .iter()
                .copied()
                .filter(|&b| !used(&blocks, b) && game.can_block(b, attacker))
                .min_by_key(|&b| self.evaluate_creature(game, b));
            if let Some(blocker) = chump {
                blocks.push((blocker, attacker));
            }
        }
        blocks
    }

    // ---- spell planning ----

    fn role_of(def: &CardDefinition) -> SpellRole {
        if def.is_mana_spell() {
            return SpellRole::Ritual;
        }
        let effects = &def.spell.effects;
        if effects
            .iter()
            .any(|e| matches!(e, Effect::Counter { .. } | Effect::CounterUnlessPays { .. }))
        {
            return SpellRole::Counter;
        }
        let first = def.spell.targets.first();
        if first.is_some_and(|t| t.polarity == Polarity::Beneficial)
            && effects
                .iter()
                .any(|e| matches!(e, Effect::Pump { .. } | Effect::GrantKeyword { .. }))
        {
            return SpellRole::Pump;
        }
        if def.is_instant_or_sorcery()
            && first.is_some_and(|t| {
                t.polarity == Polarity::Harmful
                    && matches!(
                        t.filter,
                        TargetFilter::AnyTarget | TargetFilter::Creature | TargetFilter::NonblackCreature
                    )
            })
        {
            return SpellRole::Removal;
        }
        SpellRole::Other
    }

    /// Most damage any of the card's abilities deals in one go
    fn damage_from(def: &CardDefinition) -> i32 {
        let abilities = std::iter::once(&def.spell)
            .chain(def.activated.iter().map(|a| &a.ability))
            .chain(def.triggers.iter().map(|t| &t.ability));
        abilities
            .flat_map(|a| a.effects.iter())
            .map(|e| match e {
                Effect::DealDamage { amount, .. } | Effect::DivideDamage { amount } => *amount,
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// Whether the card's harmful effect would remove `target`
    fn removal_kills(&self, game: &GameState, def: &CardDefinition, target: CardId) -> bool {
        let toughness = game.toughness(target);
        let damage = game.card(target).map(|c| c.damage).unwrap_or(0);
        def.spell.effects.iter().any(|e| match e {
            Effect::Destroy { .. } | Effect::Exile { .. } | Effect::ReturnToHand { .. } => true,
            Effect::Pump { toughness: t, .. } => toughness + t <= 0,
            _ => false,
        }) || {
            let dmg = Self::damage_from(def);
            dmg > 0 && dmg >= toughness - damage
        }
    }

    /// An opposing creature worth spending this removal on
    fn removal_target(&self, view: &GameStateView, source: CardId, def: &CardDefinition) -> Option<CardId> {
        let game = view.game();
        let spec = def.spell.targets.first()?;
        view.opponent_creatures()
            .into_iter()
            .filter(|&c| game.is_target_legal(view.player_id(), source, spec, TargetRef::Permanent(c)))
            .filter(|&c| self.removal_kills(game, def, c))
            .max_by_key(|&c| self.evaluate_creature(game, c))
    }

    /// Burn that would finish the opponent
    fn is_lethal_burn(&self, view: &GameStateView, def: &CardDefinition) -> bool {
        let face = def
            .spell
            .targets
            .first()
            .is_some_and(|t| matches!(t.filter, TargetFilter::AnyTarget | TargetFilter::Player | TargetFilter::Opponent));
        face && Self::damage_from(def) >= view.opponent_life()
    }

    /// Taps needed for `cost`, and whether Phyrexian symbols go on mana
    fn plan_cost(
        &self,
        view: &GameStateView,
        planner: &ManaPlanner,
        pool: &ManaPool,
        cost: &CastCost,
    ) -> Option<(TapPlan, bool)> {
        let life = view.life();
        if cost.life > 0 && life <= cost.life {
            return None;
        }
        if let Some(plan) = planner.plan(&cost.mana, pool) {
            return Some((plan, cost.mana.has_phyrexian()));
        }
        if cost.mana.has_phyrexian() {
            let life_cost = cost.mana.phyrexian_total() as i32 * PHYREXIAN_LIFE + cost.life;
            if life - life_cost >= PHYREXIAN_LIFE_FLOOR {
                return planner.plan(&cost.mana.without_phyrexian(), pool).map(|p| (p, false));
            }
        }
        None
    }

    fn intent_for(
        &self,
        view: &GameStateView,
        planner: &ManaPlanner,
        card: CardId,
        method: CastMethod,
    ) -> Option<Intent> {
        let game = view.game();
        let cost = game.check_cast(view.player_id(), card, method).ok()?;
        let (taps, phyrexian_by_mana) = self.plan_cost(view, planner, &view.mana_pool(), &cost)?;
        let mut reserved = ManaPool::new();
        if phyrexian_by_mana {
            for color in Color::COLORED {
                reserved.add(color, cost.mana.phyrexian_amount(color));
            }
        }
        Some(Intent {
            action: GameAction::CastSpell { card, method },
            taps: taps.into_iter().collect(),
            reserved,
        })
    }

    /// Casting methods worth trying for a card, cheapest first
    fn methods_for(view: &GameStateView, card: CardId, def: &CardDefinition) -> SmallVec<[CastMethod; 3]> {
        let mut methods = SmallVec::new();
        if view.is_card_in_zone(card, crate::zones::Zone::Graveyard) {
            if def.flashback.is_some() {
                methods.push(CastMethod::Flashback);
            }
            return methods;
        }
        methods.push(CastMethod::Normal);
        methods.extend((0..def.alternate_costs.len()).map(CastMethod::Alternate));
        methods
    }

    /// Whether a mana spell makes some otherwise uncastable spell castable
    fn ritual_unlocks(&self, view: &GameStateView, planner: &ManaPlanner, ritual: &Intent) -> bool {
        let game = view.game();
        let GameAction::CastSpell { card: ritual_card, method } = ritual.action else {
            return false;
        };
        let Some(def) = game.card(ritual_card).ok().and_then(|c| c.def()) else {
            return false;
        };
        let Some(cost) = game.effective_cast_cost(view.player_id(), ritual_card, method) else {
            return false;
        };

        let mut pool = view.mana_pool();
        for &(_, color) in &ritual.taps {
            pool.add_color(color);
        }
        if pool.pay(&cost.mana.phyrexian_as_colored()).is_err() {
            return false;
        }
        for effect in &def.spell.effects {
            if let Effect::AddMana { color, amount } = effect {
                pool.add(*color, *amount);
            }
        }
        let spent: Vec<CardId> = ritual.taps.iter().map(|&(c, _)| c).collect();
        let after = planner.without(&spent);

        view.hand().iter().any(|&other| {
            if other == ritual_card {
                return false;
            }
            let Some(other_def) = game.card(other).ok().and_then(|c| c.def()) else {
                return false;
            };
            if other_def.is_land() || other_def.is_mana_spell() {
                return false;
            }
            let Some(other_cost) = game.effective_cast_cost(view.player_id(), other, CastMethod::Normal) else {
                return false;
            };
            !planner.can_pay(&other_cost.mana, &view.mana_pool()) && after.can_pay(&other_cost.mana, &pool)
        })
    }

    /// Whether a spell of this role fits the current priority window
    fn fits_window(&self, view: &GameStateView, card: CardId, role: SpellRole, def: &CardDefinition) -> bool {
        let game = view.game();
        let me = view.player_id();
        let sorcery_window = game.sorcery_timing(me);
        let top_is_enemy_spell = game
            .stack
            .top()
            .is_some_and(|e| e.controller != me && e.spell_card().is_some());

        match role {
            SpellRole::Counter => {
                if !top_is_enemy_spell {
                    return false;
                }
                let is_pact = def.cost.is_zero()
                    && def.spell.effects.iter().any(|e| matches!(e, Effect::Delayed { .. }));
                if is_pact {
                    let sources = view
                        .my_permanents()
                        .into_iter()
                        .filter(|&c| game.card(c).ok().and_then(|gc| gc.def()).is_some_and(|d| !d.produces.is_empty()))
                        .count();
                    return sources >= PACT_MIN_SOURCES;
                }
                // Soft counters only against an opponent who cannot pay
                for effect in &def.spell.effects {
                    if let Effect::CounterUnlessPays { amount, .. } = effect {
                        let tax = ManaCost {
                            generic: *amount,
                            ..ManaCost::default()
                        };
                        if let Some(opponent) = view.opponent_id() {
                            let theirs = ManaPlanner::from_state(game, opponent);
                            let pool = game.get_player(opponent).map(|p| p.mana_pool).unwrap_or_default();
                            if theirs.can_pay(&tax, &pool) {
                                return false;
                            }
                        }
                    }
                }
                true
            }
            SpellRole::Pump => {
                game.stack.is_empty()
                    && game.turn.current_step == Step::DeclareBlockers
                    && game.combat.blockers_declared
                    && view
                        .my_creatures()
                        .into_iter()
                        .any(|c| game.combat.is_blocking(c) || (game.combat.is_attacking(c) && game.combat.is_blocked(c)))
            }
            SpellRole::Removal => {
                let opponent_end_step = !view.is_my_turn() && game.turn.current_step == Step::End && game.stack.is_empty();
                let in_window = sorcery_window
                    || (game.stack.is_empty()
                        && !view.is_my_turn()
                        && matches!(game.turn.current_step, Step::DeclareAttackers | Step::End));
                in_window
                    && (self.removal_target(view, card, def).is_some()
                        || self.is_lethal_burn(view, def)
                        || (opponent_end_step && Self::damage_from(def) > 0))
            }
            SpellRole::Ritual => sorcery_window,
            SpellRole::Other => {
                sorcery_window
                    || (def.is_instant_or_sorcery()
                        && game.stack.is_empty()
                        && !view.is_my_turn()
                        && game.turn.current_step == Step::End)
            }
        }
    }

    /// The most expensive spell worth casting right now, with its taps
    fn best_cast(&self, view: &GameStateView) -> Option<Intent> {
        let game = view.game();
        let planner = ManaPlanner::from_state(game, view.player_id());
        let mut best: Option<(u8, Intent)> = None;
        let mut rituals: Vec<Intent> = Vec::new();

        let cards = view.hand().iter().chain(view.graveyard().iter()).copied();
        for card in cards {
            let Some(def) = game.card(card).ok().and_then(|c| c.def()) else {
                continue;
            };
            if def.is_land() {
                continue;
            }
            let role = Self::role_of(def);
            if !self.fits_window(view, card, role, def) {
                continue;
            }
            for method in Self::methods_for(view, card, def) {
                if let CastMethod::Alternate(_) = method {
                    let target_cmc = game
                        .stack
                        .top()
                        .and_then(|e| e.spell_card())
                        .map(|c| game.card(c).map(|gc| gc.cmc()).unwrap_or(0))
                        .unwrap_or(0);
                    if role == SpellRole::Counter && target_cmc < PITCH_COUNTER_MIN_CMC {
                        continue;
                    }
                }
                let Some(intent) = self.intent_for(view, &planner, card, method) else {
                    continue;
                };
                if role == SpellRole::Ritual {
                    rituals.push(intent);
                    break;
                }
                let cmc = def.cost.cmc();
                if best.as_ref().map_or(true, |(b, _)| cmc > *b) {
                    best = Some((cmc, intent));
                }
                break;
            }
        }

        if let Some((_, intent)) = best {
            return Some(intent);
        }
        rituals.into_iter().find(|r| self.ritual_unlocks(view, &planner, r))
    }

    /// Cycle a card that could not be cast even with every source tapped
    fn best_cycle(&self, view: &GameStateView) -> Option<Intent> {
        let game = view.game();
        let me = view.player_id();
        if !game.sorcery_timing(me) {
            return None;
        }
        let planner = ManaPlanner::from_state(game, me);
        let pool = view.mana_pool();
        view.hand().iter().copied().find_map(|card| {
            let def = game.card(card).ok()?.def()?;
            let cycling = def.cycling?;
            if planner.can_pay(&def.cost, &pool) {
                return None;
            }
            if cycling.life > 0 && view.life() <= cycling.life {
                return None;
            }
            let taps = planner.plan(&cycling.mana, &pool)?;
            Some(Intent {
                action: GameAction::Cycle { card },
                taps: taps.into_iter().collect(),
                reserved: ManaPool::new(),
            })
        })
    }

    /// Ninjutsu the cheapest unblocked attacker back to hand
    fn best_ninjutsu(&self, view: &GameStateView) -> Option<Intent> {
        let game = view.game();
        if !view.is_my_turn() || game.turn.current_step != Step::DeclareBlockers || !game.combat.blockers_declared {
            return None;
        }
        let attacker = game
            .combat
            .unblocked_attackers()
            .into_iter()
            .min_by_key(|&a| self.evaluate_creature(game, a))?;
        let planner = ManaPlanner::from_state(game, view.player_id());
        view.hand().iter().copied().find_map(|ninja| {
            let cost = game.card(ninja).ok()?.def()?.ninjutsu?;
            let taps = planner.plan(&cost, &view.mana_pool())?;
            Some(Intent {
                action: GameAction::Ninjutsu { ninja, attacker },
                taps: taps.into_iter().collect(),
                reserved: ManaPool::new(),
            })
        })
    }

    /// Next step of the current intent, dropping it once it stalls
    fn continue_intent(&mut self, legal: &[GameAction]) -> Option<GameAction> {
        let mut intent = self.intent.take()?;
        if let Some((card, color)) = intent.taps.pop_front() {
            let tap = GameAction::TapForMana { card };
            if legal.contains(&tap) {
                self.planned_colors.insert(card, color);
                self.intent = Some(intent);
                return Some(tap);
            }
            self.planned_colors.clear();
            return None;
        }
        self.planned_colors.clear();
        if legal.contains(&intent.action) {
            self.reserved = intent.reserved;
            Some(intent.action)
        } else {
            None
        }
    }

    fn begin(&mut self, intent: Intent, legal: &[GameAction]) -> Option<GameAction> {
        self.intent = Some(intent);
        self.continue_intent(legal)
    }

    /// Finish paying a spell stuck on Phyrexian symbols
    fn pay_pending(&mut self, view: &GameStateView, legal: &[GameAction]) -> GameAction {
        let Some(pending) = view.pending_cast() else {
            return GameAction::PassPriority;
        };
        if pending.is_fully_paid() && legal.contains(&GameAction::CompleteCast) {
            self.reserved = ManaPool::new();
            return GameAction::CompleteCast;
        }
        for color in Color::COLORED {
            if pending.remaining(color) == 0 {
                continue;
            }
            let with_mana = GameAction::PayPhyrexian { color, with_life: false };
            if legal.contains(&with_mana) {
                return with_mana;
            }
            let planner = ManaPlanner::from_state(view.game(), view.player_id());
            let source = planner.sources().iter().find(|s| s.colors.contains(&color)).map(|s| s.card);
            if let Some(card) = source {
                let tap = GameAction::TapForMana { card };
                if legal.contains(&tap) {
                    self.planned_colors.insert(card, color);
                    return tap;
                }
            }
            let with_life = GameAction::PayPhyrexian { color, with_life: true };
            if view.life() - PHYREXIAN_LIFE >= PHYREXIAN_LIFE_FLOOR && legal.contains(&with_life) {
                return with_life;
            }
            break;
        }
        self.reserved = ManaPool::new();
        GameAction::CancelCast
    }

    /// The land whose colors the hand needs most
    fn best_land(&self, view: &GameStateView, legal: &[GameAction]) -> Option<GameAction> {
        let game = view.game();
        let mut available = ManaPool::new();
        for source in ManaPlanner::from_state(game, view.player_id()).sources() {
            for &color in &source.colors {
                available.add_color(color);
            }
        }
        let wanted = |color: Color| -> i32 {
            view.hand()
                .iter()
                .filter_map(|&c| game.card(c).ok().and_then(|gc| gc.def()))
                .filter(|d| !d.is_land())
                .map(|d| (d.cost.colored_amount(color) + d.cost.phyrexian_amount(color)) as i32)
                .sum()
        };
        legal
            .iter()
            .copied()
            .filter(|a| matches!(a, GameAction::PlayLand { .. }))
            .max_by_key(|a| {
                let GameAction::PlayLand { card } = a else {
                    return i32::MIN;
                };
                let Some(def) = game.card(*card).ok().and_then(|c| c.def()) else {
                    return i32::MIN;
                };
                let mut score = 0;
                for &color in &def.produces {
                    score += wanted(color) * if available.amount(color) == 0 { 3 } else { 1 };
                }
                if !def.fetches.is_empty() {
                    score += 1;
                }
                if def.enters_tapped {
                    score -= 2;
                }
                score
            })
    }

    /// Loyalty: prefer abilities that add loyalty
    fn best_loyalty(&self, view: &GameStateView, legal: &[GameAction]) -> Option<GameAction> {
        let game = view.game();
        legal
            .iter()
            .copied()
            .filter_map(|a| match a {
                GameAction::ActivateLoyalty { card, index } => {
                    let change = game
                        .card(card)
                        .ok()
                        .and_then(|c| c.def())
                        .and_then(|d| d.loyalty_abilities.get(index))
                        .map(|l| l.change)?;
                    let loyalty = game.card(card).map(|c| c.loyalty()).unwrap_or(0);
                    (change >= 0 || loyalty + change > 0).then_some((change, a))
                }
                _ => None,
            })
            .max_by_key(|&(change, _)| change)
            .map(|(_, a)| a)
    }

    fn next_action(&mut self, view: &GameStateView, legal: &[GameAction]) -> GameAction {
        if view.pending_cast().is_some() {
            return self.pay_pending(view, legal);
        }
        if let Some(action) = self.continue_intent(legal) {
            return action;
        }
        let game = view.game();
        let me = view.player_id();

        if game.sorcery_timing(me) {
            if let Some(land) = self.best_land(view, legal) {
                return land;
            }
            let has_spells = view.hand().iter().any(|&c| !view.is_land(c));
            if has_spells {
                if let Some(&fetch) = legal.iter().find(|a| matches!(a, GameAction::Fetch { .. })) {
                    return fetch;
                }
            }
        }
        if let Some(ninjutsu) = self.best_ninjutsu(view) {
            if let Some(action) = self.begin(ninjutsu, legal) {
                return action;
            }
        }
        if let Some(cast) = self.best_cast(view) {
            if let Some(action) = self.begin(cast, legal) {
                return action;
            }
        }
        if game.sorcery_timing(me) {
            if let Some(loyalty) = self.best_loyalty(view, legal) {
                return loyalty;
            }
            if let Some(cycle) = self.best_cycle(view) {
                if let Some(action) = self.begin(cycle, legal) {
                    return action;
                }
            }
        }
        GameAction::PassPriority
    }

    // ---- target selection ----

    fn pick_target(&mut self, view: &GameStateView, source: CardId, spec: TargetSpec, candidates: &[TargetRef]) -> Option<TargetRef> {
        let game = view.game();
        let me = view.player_id();
        if self.chosen.first().is_some_and(|&(s, _)| s != source) {
            self.chosen.clear();
        }
        let fresh: Vec<TargetRef> = candidates
            .iter()
            .copied()
            .filter(|t| !self.chosen.iter().any(|&(_, c)| c == *t))
            .collect();
        let def = game.card(source).ok().and_then(|c| c.def());
        let damage = def.map(Self::damage_from).unwrap_or(0);
        let opponent = view.opponent_id();
        let is_mine = |t: &TargetRef| match *t {
            TargetRef::Player(p) => p == me,
            TargetRef::Permanent(c) | TargetRef::Spell(c) | TargetRef::GraveyardCard(c) => view.controller_of(c) == Some(me),
        };
        let creature_value = |t: &TargetRef| match *t {
            TargetRef::Permanent(c) => self.evaluate_creature(game, c),
            _ => 0,
        };
        let kills = |t: &TargetRef| match (*t, def) {
            (TargetRef::Permanent(c), Some(d)) => self.removal_kills(game, d, c),
            _ => false,
        };

        let choice = match (spec.filter, spec.polarity) {
            (TargetFilter::Spell | TargetFilter::NoncreatureSpell, _) => {
                // The topmost opposing spell
                let stack_order: Vec<CardId> = game.stack.iter().filter_map(|e| e.spell_card()).collect();
                fresh
                    .iter()
                    .copied()
                    .filter(|t| !is_mine(t))
                    .max_by_key(|t| match *t {
                        TargetRef::Spell(c) => stack_order.iter().position(|&s| s == c).unwrap_or(0),
                        _ => 0,
                    })
            }
            (TargetFilter::CreatureCardInYourGraveyard, _) => fresh.iter().copied().max_by_key(|t| match *t {
                TargetRef::GraveyardCard(c) => self.card_value(game, c),
                _ => 0,
            }),
            (_, Polarity::Beneficial) => {
                let in_combat = |t: &TargetRef| match *t {
                    TargetRef::Permanent(c) => game.combat.is_attacking(c) || game.combat.is_blocking(c),
                    _ => false,
                };
                fresh
                    .iter()
                    .copied()
                    .filter(is_mine)
                    .max_by_key(|t| (in_combat(t), creature_value(t)))
            }
            (_, Polarity::Harmful) => {
                let face = opponent
                    .map(TargetRef::Player)
                    .filter(|t| fresh.contains(t));
                let lethal_face = face.filter(|_| damage > 0 && damage >= view.opponent_life());
                let best_kill = fresh
                    .iter()
                    .copied()
                    .filter(|t| !is_mine(t) && matches!(t, TargetRef::Permanent(_)) && kills(t))
                    .max_by_key(creature_value);
                let best_enemy = fresh
                    .iter()
                    .copied()
                    .filter(|t| !is_mine(t) && matches!(t, TargetRef::Permanent(_)))
                    .max_by_key(creature_value);
                match spec.filter {
                    TargetFilter::AnyTarget => lethal_face.or(best_kill).or(face),
                    TargetFilter::Player | TargetFilter::Opponent => face,
                    _ => best_kill.or(best_enemy),
                }
            }
        };

        let choice = match choice {
            Some(t) => Some(t),
            None if spec.optional => None,
            None => fresh.first().copied().or_else(|| candidates.first().copied()),
        };
        if let Some(t) = choice {
            self.chosen.push((source, t));
        }
        choice
    }

    fn discard_order(&self, game: &GameState, hand: &[CardId]) -> Vec<CardId> {
        let mut cards = hand.to_vec();
        cards.sort_by_key(|&c| match game.card(c).ok().and_then(|gc| gc.def()) {
            Some(def) if def.is_land() => 0,
            Some(def) if def.is_creature() => {
                let power = def.power.unwrap_or(0);
                let toughness = def.toughness.unwrap_or(0);
                80 + power * 15 + toughness * 10 + def.cost.cmc() as i32 * 5
            }
            Some(_) => 100,
            None => 0,
        });
        cards
    }
}

impl PlayerController for HeuristicController {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn choose_action<'a>(&'a mut self, view: &'a GameStateView<'a>, legal: &'a [GameAction]) -> Decision<'a, GameAction> {
        let action = self.next_action(view, legal);
        let action = if legal.contains(&action) {
            action
        } else {
            self.intent = None;
            GameAction::PassPriority
        };
        if action != GameAction::PassPriority && !matches!(action, GameAction::TapForMana { .. }) {
            view.logger().controller_choice(
                "HEURISTIC",
                &format!("{} chose {}", view.game().player_name(view.player_id()), action.describe(view.game())),
            );
        }
        decided(action)
    }

    fn keep_hand<'a>(&'a mut self, view: &'a GameStateView<'a>, hand: &'a [CardId]) -> Decision<'a, bool> {
        let size = hand.len().saturating_sub(view.mulligans_taken() as usize);
        let lands = hand.iter().filter(|&&c| view.is_land(c)).count();
        let keep = match size {
            0..=4 => true,
            5 => (1..=3).contains(&lands),
            6 => (2..=4).contains(&lands),
            _ => (2..=5).contains(&lands),
        };
        view.logger().controller_choice(
            "HEURISTIC",
            &format!(
                "{} {} a {}-card hand with {} lands",
                view.game().player_name(view.player_id()),
                if keep { "keeps" } else { "mulligans" },
                size,
                lands
            ),
        );
        decided(keep)
    }

    fn choose_cards_to_bottom<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        hand: &'a [CardId],
        count: usize,
    ) -> Decision<'a, SmallVec<[CardId; 7]>> {
        let game = view.game();
        let lands: Vec<CardId> = hand.iter().copied().filter(|&c| view.is_land(c)).collect();
        let mut spells: Vec<CardId> = hand.iter().copied().filter(|&c| !view.is_land(c)).collect();
        // Most expensive spells go first
        spells.sort_by_key(|&c| std::cmp::Reverse(game.card(c).map(|gc| gc.cmc()).unwrap_or(0)));

        let kept_size = hand.len() - count;
        let mut bottom = SmallVec::new();
        let mut lands_left = lands.len();
        let mut land_iter = lands.iter();
        let mut spell_iter = spells.iter();
        while bottom.len() < count {
            let too_many_lands = lands_left * 2 > kept_size;
            let next = if too_many_lands {
                land_iter.next().or_else(|| spell_iter.next())
            } else {
                spell_iter.next().or_else(|| land_iter.next())
            };
            let Some(&card) = next else {
                break;
            };
            if view.is_land(card) {
                lands_left -= 1;
            }
            bottom.push(card);
        }
        decided(bottom)
    }

    fn choose_mana_color<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        source: CardId,
        options: &'a [Color],
    ) -> Decision<'a, Color> {
        if let Some(color) = self.planned_colors.remove(&source).filter(|c| options.contains(c)) {
            return decided(color);
        }
        let game = view.game();
        let demand = |color: Color| -> u32 {
            view.hand()
                .iter()
                .filter_map(|&c| game.card(c).ok().and_then(|gc| gc.def()))
                .map(|d| (d.cost.colored_amount(color) + d.cost.phyrexian_amount(color)) as u32)
                .sum()
        };
        let color = options
            .iter()
            .copied()
            .max_by_key(|&c| (demand(c), std::cmp::Reverse(c.index())))
            .unwrap_or(Color::Colorless);
        decided(color)
    }

    fn split_generic_payment<'a>(
        &'a mut self,
        _view: &'a GameStateView<'a>,
        cost: ManaCost,
        pool: ManaPool,
    ) -> Decision<'a, Option<ManaPool>> {
        if self.reserved.is_empty() {
            return decided(None);
        }
        let mut spare = [0u8; 6];
        let mut held = [0u8; 6];
        for color in Color::ALL {
            let free = pool.amount(color).saturating_sub(cost.colored_amount(color));
            let keep = self.reserved.amount(color).min(free);
            held[color.index()] = keep;
            spare[color.index()] = free - keep;
        }
        let largest = |slots: &[u8; 6]| {
            Color::ALL
                .iter()
                .copied()
                .filter(|c| slots[c.index()] > 0)
                .max_by_key(|c| (slots[c.index()], std::cmp::Reverse(c.index())))
        };

        let mut split = ManaPool::new();
        for _ in 0..cost.generic {
            let color = if let Some(c) = largest(&spare) {
                spare[c.index()] -= 1;
                c
            } else if let Some(c) = largest(&held) {
                held[c.index()] -= 1;
                c
            } else {
                return decided(None);
            };
            split.add_color(color);
        }
        decided(Some(split))
    }

    fn choose_attackers<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        candidates: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 8]>> {
        let attackers: SmallVec<[CardId; 8]> = candidates
            .iter()
            .copied()
            .filter(|&c| self.should_attack(view, c))
            .collect();

        if !attackers.is_empty() {
            view.logger().controller_choice(
                "HEURISTIC",
                &format!(
                    "chose {} attackers from {} available creatures (aggression={})",
                    attackers.len(),
                    candidates.len(),
                    self.aggression_level
                ),
            );
        } else if !candidates.is_empty() {
            view.logger().controller_choice(
                "HEURISTIC",
                &format!(
                    "chose not to attack with {} available creatures (aggression={})",
                    candidates.len(),
                    self.aggression_level
                ),
            );
        }
        decided(attackers)
    }

    fn choose_blockers<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        blockers: &'a [CardId],
        attackers: &'a [CardId],
    ) -> Decision<'a, SmallVec<[(CardId, CardId); 8]>> {
        if attackers.is_empty() || blockers.is_empty() {
            return decided(SmallVec::new());
        }
        let blocks: SmallVec<[(CardId, CardId); 8]> = self.plan_blocks(view, blockers, attackers).into_iter().collect();
        if blocks.is_empty() {
            view.logger().controller_choice(
                "HEURISTIC",
                &format!(
                    "chose not to block (no favorable blocks among {} blockers vs {} attackers)",
                    blockers.len(),
                    attackers.len()
                ),
            );
        } else {
            view.logger().controller_choice(
                "HEURISTIC",
                &format!("chose {} blockers for {} attackers", blocks.len(), attackers.len()),
            );
        }
        decided(blocks)
    }

    fn order_blockers<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        _attacker: CardId,
        blockers: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 4]>> {
        let game = view.game();
        let mut order: SmallVec<[CardId; 4]> = blockers.iter().copied().collect();
        // Kill the easiest blockers first, the most valuable among equals
        order.sort_by_key(|&b| {
            let lethal = game.toughness(b) - game.card(b).map(|c| c.damage).unwrap_or(0);
            (lethal, std::cmp::Reverse(self.evaluate_creature(game, b)))
        });
        decided(order)
    }

    fn choose_target<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        source: CardId,
        spec: TargetSpec,
        candidates: &'a [TargetRef],
    ) -> Decision<'a, Option<TargetRef>> {
        let target = self.pick_target(view, source, spec, candidates);
        if let Some(t) = target {
            view.logger().controller_choice(
                "HEURISTIC",
                &format!("targets {} with {}", view.game().target_name(t), view.card_name(source)),
            );
        }
        decided(target)
    }

    fn choose_card<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        prompt: CardPrompt,
        options: &'a [CardId],
        _optional: bool,
    ) -> Decision<'a, Option<CardId>> {
        let game = view.game();
        let choice = match prompt {
            CardPrompt::Search => {
                let all_lands = options.iter().all(|&c| view.is_land(c));
                if all_lands {
                    let demand = |c: CardId| -> i32 {
                        let Some(def) = game.card(c).ok().and_then(|gc| gc.def()) else {
                            return 0;
                        };
                        def.produces
                            .iter()
                            .map(|&color| {
                                view.hand()
                                    .iter()
                                    .filter_map(|&h| game.card(h).ok().and_then(|gc| gc.def()))
                                    .map(|d| d.cost.colored_amount(color) as i32)
                                    .sum::<i32>()
                            })
                            .sum()
                    };
                    options.iter().copied().max_by_key(|&c| demand(c))
                } else {
                    options.iter().copied().max_by_key(|&c| self.card_value(game, c))
                }
            }
            CardPrompt::PutBack => self.discard_order(game, options).first().copied(),
            CardPrompt::Sacrifice => options.iter().copied().min_by_key(|&c| self.evaluate_creature(game, c)),
            CardPrompt::ExileForCost => options.iter().copied().min_by_key(|&c| {
                let is_counter = game
                    .card(c)
                    .ok()
                    .and_then(|gc| gc.def())
                    .is_some_and(|d| Self::role_of(d) == SpellRole::Counter);
                (is_counter, self.card_value(game, c))
            }),
            CardPrompt::ReturnLand => options.iter().copied().max_by_key(|&c| view.is_tapped(c)),
        };
        decided(choice)
    }

    fn split_into_piles<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        cards: &'a [CardId],
    ) -> Decision<'a, SmallVec<[CardId; 5]>> {
        // The best card alone against the rest
        let game = view.game();
        let best = cards.iter().copied().max_by_key(|&c| self.card_value(game, c));
        decided(best.into_iter().collect())
    }

    fn choose_pile<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        first: &'a [CardId],
        second: &'a [CardId],
    ) -> Decision<'a, Pile> {
        let game = view.game();
        let worth = |pile: &[CardId]| -> i32 { pile.iter().map(|&c| self.card_value(game, c)).sum() };
        let pile = if worth(first) >= worth(second) {
            Pile::First
        } else {
            Pile::Second
        };
        decided(pile)
    }

    fn divide_damage<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        amount: i32,
        targets: &'a [TargetRef],
    ) -> Decision<'a, SmallVec<[i32; 3]>> {
        let game = view.game();
        if targets.is_empty() || amount < targets.len() as i32 {
            return decided(SmallVec::new());
        }
        let mut split: SmallVec<[i32; 3]> = targets.iter().map(|_| 1).collect();
        let mut left = amount - targets.len() as i32;
        // Top creatures up to lethal, the rest to a player
        for (i, target) in targets.iter().enumerate() {
            if let TargetRef::Permanent(c) = *target {
                let lethal = game.toughness(c) - game.card(c).map(|gc| gc.damage).unwrap_or(0);
                let extra = (lethal - split[i]).clamp(0, left);
                split[i] += extra;
                left -= extra;
            }
        }
        if left > 0 {
            let sink = targets
                .iter()
                .position(|t| matches!(t, TargetRef::Player(_)))
                .unwrap_or(0);
            split[sink] += left;
        }
        decided(split)
    }

    fn choose_to_pay<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        cost: ManaCost,
        reason: PaymentReason,
    ) -> Decision<'a, bool> {
        view.logger().controller_choice(
            "HEURISTIC",
            &format!(
                "{} pays {} ({})",
                view.game().player_name(view.player_id()),
                cost,
                match reason {
                    PaymentReason::KeepSpell { .. } => "to keep a spell",
                    PaymentReason::AvoidLosing => "to avoid losing",
                }
            ),
        );
        decided(true)
    }

    fn choose_cards_to_discard<'a>(
        &'a mut self,
        view: &'a GameStateView<'a>,
        hand: &'a [CardId],
        count: usize,
    ) -> Decision<'a, SmallVec<[CardId; 7]>> {
        let order = self.discard_order(view.game(), hand);
        decided(order.into_iter().take(count).collect())
    }

    fn on_game_end(&mut self, view: &GameStateView<'_>, won: bool) {
        self.intent = None;
        self.planned_colors.clear();
        view.logger().controller_choice(
            "HEURISTIC",
            &format!(
                "{} {}",
                view.game().player_name(view.player_id()),
                if won { "won" } else { "did not win" }
            ),
        );
    }
}
