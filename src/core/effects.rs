//! Closed effect vocabulary for spells and abilities
//!
//! Every curated card's behavior is expressed as a list of `Effect`s plus
//! the target slots those effects refer to. Adding a new card kind means
//! adding a variant here and a match arm in the resolver.

use crate::core::{CardId, Color, CounterType, Keyword, LandType, ManaCost, PlayerId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A chosen target, fixed when the spell or ability is put on the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    Player(PlayerId),
    /// A permanent on the battlefield
    Permanent(CardId),
    /// A spell on the stack, identified by its card
    Spell(CardId),
    /// A card in a graveyard
    GraveyardCard(CardId),
}

/// What a target slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFilter {
    /// Creature, planeswalker or player
    AnyTarget,
    Creature,
    NonblackCreature,
    Player,
    Opponent,
    Spell,
    NoncreatureSpell,
    Land,
    CreatureCardInYourGraveyard,
}

/// Whether the targeted object is meant to benefit
///
/// Only strategies read this; the rules never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Harmful,
    Beneficial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub filter: TargetFilter,
    pub polarity: Polarity,
    /// "Up to" slots may be left empty
    pub optional: bool,
}

impl TargetSpec {
    pub const fn harmful(filter: TargetFilter) -> Self {
        TargetSpec {
            filter,
            polarity: Polarity::Harmful,
            optional: false,
        }
    }

    pub const fn beneficial(filter: TargetFilter) -> Self {
        TargetSpec {
            filter,
            polarity: Polarity::Beneficial,
            optional: false,
        }
    }

    pub const fn optional(self) -> Self {
        TargetSpec {
            optional: true,
            ..self
        }
    }
}

/// Which player an effect applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRef {
    You,
    Opponent,
    EachPlayer,
    /// The player in target slot `n`
    Target(usize),
    /// The controller of the permanent (or spell) in target slot `n`
    ControllerOfTarget(usize),
    /// The player whose action fired the trigger
    EventPlayer,
}

/// Which permanent a self-or-target effect touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    Target(usize),
    Source,
}

/// Library search restriction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardFilter {
    Any,
    BasicLand,
    Creature,
    LandOfType(SmallVec<[LandType; 2]>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchDestination {
    Hand,
    Battlefield { tapped: bool },
}

/// Who picks the cards for a discard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chooser {
    /// The discarding player
    Affected,
    /// The controller of the spell or ability
    Controller,
}

/// When a delayed trigger fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelayedWhen {
    /// The beginning of the next end step
    NextEndStep,
    /// The beginning of the controller's next upkeep
    YourNextUpkeep,
}

/// Characteristics of a token (tokens have no registry definition)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    pub name: String,
    pub subtype: String,
    pub color: Color,
    pub power: i32,
    pub toughness: i32,
    pub keywords: SmallVec<[Keyword; 2]>,
}

impl TokenSpec {
    pub fn creature(name: &str, color: Color, power: i32, toughness: i32) -> Self {
        TokenSpec {
            name: name.to_string(),
            subtype: name.to_string(),
            color,
            power,
            toughness,
            keywords: SmallVec::new(),
        }
    }

    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.push(keyword);
        self
    }
}

/// One step of a spell or ability's resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    DealDamage { target: usize, amount: i32 },
    /// Divide damage among every chosen target; the controller picks
    /// the split at resolution
    DivideDamage { amount: i32 },
    DrawCards { player: PlayerRef, count: u32 },
    GainLife { player: PlayerRef, amount: i32 },
    LoseLife { player: PlayerRef, amount: i32 },
    /// Read the target creature's power and give that much life
    GainLifeEqualToPower { player: PlayerRef, target: usize },
    Destroy { target: usize },
    Exile { target: usize },
    /// Permanent or graveyard card to its owner's hand
    ReturnToHand { target: usize },
    /// +N/+N (or -N/-N) until end of turn
    Pump { subject: Subject, power: i32, toughness: i32 },
    /// The creature gains a keyword until end of turn
    GrantKeyword { subject: Subject, keyword: Keyword },
    AddCounters { subject: Subject, counter: CounterType, amount: u32 },
    Counter { target: usize },
    CounterUnlessPays { target: usize, amount: u8 },
    AddMana { color: Color, amount: u8 },
    AddManaOfAnyColor { amount: u8 },
    Search { filter: CardFilter, destination: SearchDestination },
    CreateTokens { token: TokenSpec, count: u32 },
    Mill { player: PlayerRef, count: u32 },
    Discard { player: PlayerRef, count: u32, chosen_by: Chooser },
    /// Draw N, then put M cards from hand on top one at a time
    DrawThenPutBack { draw: u32, put_back: u32 },
    /// Reveal the top N; an opponent splits them into two piles and the
    /// controller takes one into hand
    RevealAndSplit { count: u32 },
    RevealHand { player: PlayerRef },
    /// Reveal the top card, put it into hand, lose life equal to its cmc
    RevealTopToHand,
    /// The player sacrifices a creature of their choice
    SacrificeCreature { player: PlayerRef },
    SacrificeSource,
    /// Pay the cost or lose the game
    PayOrLose { cost: ManaCost },
    /// Register a one-shot trigger running `effects` later
    Delayed { when: DelayedWhen, effects: Vec<Effect> },
}

/// Targets plus effects: the body of a spell, trigger or activation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDef {
    pub targets: SmallVec<[TargetSpec; 3]>,
    pub effects: Vec<Effect>,
}

impl AbilityDef {
    pub fn new(effects: Vec<Effect>) -> Self {
        AbilityDef {
            targets: SmallVec::new(),
            effects,
        }
    }

    pub fn targeting(mut self, spec: TargetSpec) -> Self {
        self.targets.push(spec);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_builder() {
        let bolt = AbilityDef::new(vec![Effect::DealDamage { target: 0, amount: 3 }])
            .targeting(TargetSpec::harmful(TargetFilter::AnyTarget));
        assert_eq!(bolt.targets.len(), 1);
        assert_eq!(bolt.targets[0].polarity, Polarity::Harmful);
        assert!(!bolt.targets[0].optional);
        assert!(!bolt.is_empty());
    }

    #[test]
    fn test_optional_target_spec() {
        let spec = TargetSpec::harmful(TargetFilter::AnyTarget).optional();
        assert!(spec.optional);
        assert_eq!(spec.filter, TargetFilter::AnyTarget);
    }

    #[test]
    fn test_nested_delayed_effect_serializes() {
        let effect = Effect::Delayed {
            when: DelayedWhen::NextEndStep,
            effects: vec![Effect::SacrificeSource],
        };
        let json = serde_json::to_string(&effect).unwrap();
        let back: Effect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, effect);
    }
}
