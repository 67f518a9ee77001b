//! Continuous effects: pumps, anthems, keyword grants and cost reducers
//!
//! Static abilities register an effect when their permanent enters the
//! battlefield and drop it when it leaves. Pumps register an effect that
//! expires in the cleanup step. Characteristics are always computed on
//! read, never written back into the card.

use crate::cards::{CardDefinition, CostScope};
use crate::core::{CardId, Keyword, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Duration {
    UntilEndOfTurn,
    WhileSourceOnBattlefield,
}

/// What a power/toughness change or keyword grant applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affected {
    Card(CardId),
    CreaturesControlledBy(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContinuousKind {
    ModifyPowerToughness {
        affected: Affected,
        power: i32,
        toughness: i32,
    },
    GrantKeyword {
        affected: Affected,
        keyword: Keyword,
    },
    CostReduction {
        amount: u8,
        scope: CostScope,
    },
}

impl Affected {
    fn covers(self, card: CardId, controller: PlayerId) -> bool {
        match self {
            Affected::Card(c) => c == card,
            Affected::CreaturesControlledBy(p) => p == controller,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousEffect {
    pub source: CardId,
    pub controller: PlayerId,
    pub kind: ContinuousKind,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContinuousEffects {
    effects: Vec<ContinuousEffect>,
}

impl ContinuousEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: ContinuousEffect) {
        self.effects.push(effect);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContinuousEffect> + '_ {
        self.effects.iter()
    }

    /// Drop every until-end-of-turn effect (cleanup step)
    pub fn expire_end_of_turn(&mut self) {
        self.effects.retain(|e| e.duration != Duration::UntilEndOfTurn);
    }

    /// Drop the static effects of a permanent that left the battlefield
    pub fn remove_from_source(&mut self, source: CardId) {
        self.effects
            .retain(|e| !(e.source == source && e.duration == Duration::WhileSourceOnBattlefield));
    }

    /// Drop pumps and grants applied to a card that changed zones
    pub fn remove_affecting(&mut self, card: CardId) {
        self.effects.retain(|e| {
            !matches!(
                e.kind,
                ContinuousKind::ModifyPowerToughness {
                    affected: Affected::Card(c),
                    ..
                } | ContinuousKind::GrantKeyword {
                    affected: Affected::Card(c),
                    ..
                } if c == card
            )
        });
    }

    /// Total power and toughness modification for a creature
    pub fn power_toughness_bonus(&self, card: CardId, controller: PlayerId) -> (i32, i32) {
        self.effects
            .iter()
            .filter_map(|e| match e.kind {
                ContinuousKind::ModifyPowerToughness {
                    affected,
                    power,
                    toughness,
                } => affected.covers(card, controller).then_some((power, toughness)),
                _ => None,
            })
            .fold((0, 0), |(p, t), (dp, dt)| (p + dp, t + dt))
    }

    /// Whether some effect gives the creature `keyword`
    pub fn grants_keyword(&self, card: CardId, controller: PlayerId, keyword: Keyword) -> bool {
        self.effects.iter().any(|e| match e.kind {
            ContinuousKind::GrantKeyword { affected, keyword: k } => k == keyword && affected.covers(card, controller),
            _ => false,
        })
    }

    /// Generic mana knocked off a spell `caster` is casting
    pub fn cost_reduction(&self, caster: PlayerId, spell: &CardDefinition) -> u8 {
        self.effects
            .iter()
            .filter_map(|e| match e.kind {
                ContinuousKind::CostReduction { amount, scope } => {
                    let applies = match scope {
                        CostScope::AllSpells => true,
                        CostScope::YourInstantsAndSorceries => {
                            e.controller == caster && spell.is_instant_or_sorcery()
                        }
                    };
                    applies.then_some(amount)
                }
                _ => None,
            })
            .fold(0u8, |acc, n| acc.saturating_add(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::lookup;

    fn pump(card: u32, power: i32) -> ContinuousEffect {
        ContinuousEffect {
            source: CardId::new(100),
            controller: PlayerId::new(0),
            kind: ContinuousKind::ModifyPowerToughness {
                affected: Affected::Card(CardId::new(card)),
                power,
                toughness: power,
            },
            duration: Duration::UntilEndOfTurn,
        }
    }

    #[test]
    fn test_pumps_stack_and_expire() {
        let mut effects = ContinuousEffects::new();
        effects.add(pump(1, 3));
        effects.add(pump(1, 1));
        assert_eq!(effects.power_toughness_bonus(CardId::new(1), PlayerId::new(0)), (4, 4));
        assert_eq!(effects.power_toughness_bonus(CardId::new(2), PlayerId::new(0)), (0, 0));

        effects.expire_end_of_turn();
        assert!(effects.is_empty());
    }

    #[test]
    fn test_anthem_follows_controller() {
        let mut effects = ContinuousEffects::new();
        effects.add(ContinuousEffect {
            source: CardId::new(50),
            controller: PlayerId::new(1),
            kind: ContinuousKind::ModifyPowerToughness {
                affected: Affected::CreaturesControlledBy(PlayerId::new(1)),
                power: 1,
                toughness: 1,
            },
            duration: Duration::WhileSourceOnBattlefield,
        });
        assert_eq!(effects.power_toughness_bonus(CardId::new(7), PlayerId::new(1)), (1, 1));
        assert_eq!(effects.power_toughness_bonus(CardId::new(7), PlayerId::new(0)), (0, 0));

        effects.expire_end_of_turn();
        assert_eq!(effects.len(), 1);
        effects.remove_from_source(CardId::new(50));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_keyword_grants_expire_and_follow_their_card() {
        let (alice, bob) = (PlayerId::new(0), PlayerId::new(1));
        let mut effects = ContinuousEffects::new();
        effects.add(ContinuousEffect {
            source: CardId::new(20),
            controller: alice,
            kind: ContinuousKind::GrantKeyword {
                affected: Affected::Card(CardId::new(3)),
                keyword: Keyword::Flying,
            },
            duration: Duration::UntilEndOfTurn,
        });
        effects.add(ContinuousEffect {
            source: CardId::new(21),
            controller: bob,
            kind: ContinuousKind::GrantKeyword {
                affected: Affected::CreaturesControlledBy(bob),
                keyword: Keyword::Haste,
            },
            duration: Duration::WhileSourceOnBattlefield,
        });

        assert!(effects.grants_keyword(CardId::new(3), alice, Keyword::Flying));
        assert!(!effects.grants_keyword(CardId::new(3), alice, Keyword::Haste));
        assert!(effects.grants_keyword(CardId::new(9), bob, Keyword::Haste));
        assert!(!effects.grants_keyword(CardId::new(9), alice, Keyword::Haste));
        assert_eq!(effects.power_toughness_bonus(CardId::new(3), alice), (0, 0));

        effects.remove_affecting(CardId::new(3));
        assert!(!effects.grants_keyword(CardId::new(3), alice, Keyword::Flying));
        effects.expire_end_of_turn();
        assert!(effects.grants_keyword(CardId::new(9), bob, Keyword::Haste));
    }

    #[test]
    fn test_cost_reduction_scopes() {
        let mut effects = ContinuousEffects::new();
        effects.add(ContinuousEffect {
            source: CardId::new(1),
            controller: PlayerId::new(0),
            kind: ContinuousKind::CostReduction {
                amount: 1,
                scope: CostScope::YourInstantsAndSorceries,
            },
            duration: Duration::WhileSourceOnBattlefield,
        });
        let bolt = lookup("Lightning Bolt").unwrap();
        let bears = lookup("Grizzly Bears").unwrap();
        assert_eq!(effects.cost_reduction(PlayerId::new(0), bolt), 1);
        assert_eq!(effects.cost_reduction(PlayerId::new(1), bolt), 0);
        assert_eq!(effects.cost_reduction(PlayerId::new(0), bears), 0);
    }
}
