//! Combat system
//!
//! Attackers always attack the opposing player. Each blocker blocks one
//! attacker; an attacker may be blocked by several creatures, ordered for
//! damage assignment by the attacking player.

use crate::core::{CardId, Keyword, PlayerId, TargetRef};
use crate::game::GameState;
use crate::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Combat state for the current combat phase
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CombatState {
    /// Attacker -> defending player
    pub attackers: BTreeMap<CardId, PlayerId>,

    /// Blocker -> the attacker it blocks
    pub blockers: BTreeMap<CardId, CardId>,

    /// Attacker -> its blockers in damage assignment order
    ///
    /// An attacker stays blocked after its blockers leave combat.
    pub attacker_blockers: BTreeMap<CardId, SmallVec<[CardId; 4]>>,

    pub blockers_declared: bool,

    /// A first strike damage step happened this combat
    pub first_strike_dealt: bool,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_attacker(&mut self, attacker: CardId, defending_player: PlayerId) {
        self.attackers.insert(attacker, defending_player);
    }

    pub fn declare_blocker(&mut self, blocker: CardId, attacker: CardId) {
        self.blockers.insert(blocker, attacker);
        self.attacker_blockers.entry(attacker).or_default().push(blocker);
    }

    pub fn is_attacking(&self, card_id: CardId) -> bool {
        self.attackers.contains_key(&card_id)
    }

    pub fn is_blocking(&self, card_id: CardId) -> bool {
        self.blockers.contains_key(&card_id)
    }

    pub fn is_blocked(&self, attacker: CardId) -> bool {
        self.attacker_blockers.contains_key(&attacker)
    }

    pub fn get_blockers(&self, attacker: CardId) -> SmallVec<[CardId; 4]> {
        self.attacker_blockers.get(&attacker).cloned().unwrap_or_default()
    }

    pub fn set_blocker_order(&mut self, attacker: CardId, order: SmallVec<[CardId; 4]>) {
        self.attacker_blockers.insert(attacker, order);
    }

    pub fn get_defending_player(&self, attacker: CardId) -> Option<PlayerId> {
        self.attackers.get(&attacker).copied()
    }

    pub fn get_attackers(&self) -> Vec<CardId> {
        self.attackers.keys().copied().collect()
    }

    /// Attackers nobody blocked (ninjutsu candidates)
    pub fn unblocked_attackers(&self) -> Vec<CardId> {
        self.attackers
            .keys()
            .copied()
            .filter(|a| !self.is_blocked(*a))
            .collect()
    }

    /// Swap an unblocked attacker for another creature attacking the same
    /// player
    pub fn replace_attacker(&mut self, old: CardId, new: CardId) -> bool {
        match self.attackers.remove(&old) {
            Some(defender) => {
                self.attackers.insert(new, defender);
                true
            }
            None => false,
        }
    }

    /// Remove a creature that left the battlefield
    pub fn remove(&mut self, card_id: CardId) {
        self.attackers.remove(&card_id);
        if let Some(attacker) = self.blockers.remove(&card_id) {
            if let Some(list) = self.attacker_blockers.get_mut(&attacker) {
                list.retain(|b| *b != card_id);
            }
        }
    }

    pub fn clear(&mut self) {
        *self = CombatState::default();
    }
}

impl GameState {
    /// Whether `blocker` is able to block `attacker`
    pub fn can_block(&self, blocker: CardId, attacker: CardId) -> bool {
        let Ok(card) = self.cards.get(blocker) else {
            return false;
        };
        if !card.is_creature() || card.tapped || !self.battlefield.contains(blocker) {
            return false;
        }
        if self.has_keyword(attacker, Keyword::Flying)
            && !self.has_keyword(blocker, Keyword::Flying)
            && !self.has_keyword(blocker, Keyword::Reach)
        {
            return false;
        }
        true
    }

    /// Creatures that may be declared as attackers by the active player
    pub fn attack_candidates(&self, player_id: PlayerId) -> Vec<CardId> {
        self.creatures_of(player_id)
            .into_iter()
            .filter(|&id| {
                self.cards.get(id).is_ok_and(|c| !c.tapped)
                    && !self.is_summoning_sick(id)
                    && !self.has_keyword(id, Keyword::Defender)
            })
            .collect()
    }

    pub fn any_first_strike_in_combat(&self) -> bool {
        self.combat
            .attackers
            .keys()
            .chain(self.combat.blockers.keys())
            .any(|&c| self.has_keyword(c, Keyword::FirstStrike))
    }

    fn deals_damage_this_step(&self, card_id: CardId, first_strike_step: bool) -> bool {
        let first_striker = self.has_keyword(card_id, Keyword::FirstStrike);
        if first_strike_step {
            first_striker
        } else {
            !(first_striker && self.combat.first_strike_dealt)
        }
    }

    /// Assign and deal combat damage for one damage step
    ///
    /// Each attacker assigns lethal damage to its blockers in order
    /// (deathtouch makes 1 lethal); excess goes to the last blocker, or to
    /// the player with trample. All damage is dealt simultaneously.
    pub fn assign_combat_damage(&mut self, first_strike_step: bool) -> Result<()> {
        let mut assignments: Vec<(CardId, TargetRef, i32)> = Vec::new();

        for attacker in self.combat.get_attackers() {
            if !self.battlefield.contains(attacker) || !self.deals_damage_this_step(attacker, first_strike_step) {
                continue;
            }
            let mut remaining = self.power(attacker);
            if remaining <= 0 {
                continue;
            }
            let defender = self.combat.get_defending_player(attacker);
            let trample = self.has_keyword(attacker, Keyword::Trample);
            let deathtouch = self.has_keyword(attacker, Keyword::Deathtouch);

            if !self.combat.is_blocked(attacker) {
                if let Some(player) = defender {
                    assignments.push((attacker, TargetRef::Player(player), remaining));
                }
                continue;
            }

            let blockers: SmallVec<[CardId; 4]> = self
                .combat
                .get_blockers(attacker)
                .into_iter()
                .filter(|b| self.battlefield.contains(*b))
                .collect();
            for (i, &blocker) in blockers.iter().enumerate() {
                if remaining <= 0 {
                    break;
                }
                let marked = self.cards.get(blocker).map(|c| c.damage).unwrap_or(0);
                let lethal = if deathtouch {
                    1
                } else {
                    (self.toughness(blocker) - marked).max(0)
                };
                let is_last = i + 1 == blockers.len();
                let amount = if is_last && !trample { remaining } else { remaining.min(lethal) };
                if amount > 0 {
                    assignments.push((attacker, TargetRef::Permanent(blocker), amount));
                    remaining -= amount;
                }
            }
            if trample && remaining > 0 {
                if let Some(player) = defender {
                    assignments.push((attacker, TargetRef::Player(player), remaining));
                }
            }
        }

        for (&blocker, &attacker) in &self.combat.blockers {
            if !self.battlefield.contains(blocker)
                || !self.battlefield.contains(attacker)
                || !self.deals_damage_this_step(blocker, first_strike_step)
            {
                continue;
            }
            let power = self.power(blocker);
            if power > 0 {
                assignments.push((blocker, TargetRef::Permanent(attacker), power));
            }
        }

        for (source, target, amount) in assignments {
            self.deal_damage(source, target, amount, true)?;
        }
        if first_strike_step {
            self.combat.first_strike_dealt = true;
        }
        Ok(())
    }
}
