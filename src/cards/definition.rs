//! Immutable card definitions
//!
//! A `CardDefinition` holds the printed rules of one card name. Instances
//! on the battlefield or in a zone (`GameCard`) point at their definition
//! by `DefinitionId` and never copy it.

use crate::core::{
    AbilityDef, CardType, Color, Keyword, LandType, ManaCost, TargetFilter, TargetSpec,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Index of a definition in the static registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefinitionId(pub(crate) u16);

/// A non-alternate cost: mana plus optional extras
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cost {
    pub mana: ManaCost,
    pub life: i32,
    pub tap: bool,
    pub sacrifice_self: bool,
}

impl Cost {
    pub fn mana(text: &str) -> Cost {
        Cost {
            mana: ManaCost::of(text),
            ..Cost::default()
        }
    }

    pub fn tap() -> Cost {
        Cost {
            tap: true,
            ..Cost::default()
        }
    }

    pub fn sacrifice() -> Cost {
        Cost {
            sacrifice_self: true,
            ..Cost::default()
        }
    }

    pub fn life(life: i32) -> Cost {
        Cost {
            life,
            ..Cost::default()
        }
    }

    pub fn plus_life(self, life: i32) -> Cost {
        Cost { life, ..self }
    }

    pub fn plus_tap(self) -> Cost {
        Cost { tap: true, ..self }
    }
}

/// A way to cast a spell without paying its mana cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlternateCost {
    /// Pay life and exile another card of the given color from hand
    ExileCardFromHand { color: Color, life: i32 },
    /// Return an untapped-or-tapped land of the given type to hand
    ReturnLand { land_type: LandType },
    /// Pay life, allowed only while controlling a land of the given type
    PayLife { life: i32, requires: LandType },
}

/// The event half of a triggered ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerCondition {
    EntersBattlefield,
    Dies,
    YourUpkeep,
    /// Any player plays a land (the event player is the one who played it)
    AnyPlayerPlaysLand,
    /// A land enters the battlefield under your control
    LandEntersUnderYourControl,
    YouCastNoncreatureSpell,
    DealsCombatDamageToPlayer,
    /// The enchanted land is tapped for mana; resolves immediately
    EnchantedLandTappedForMana,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredAbilityDef {
    pub condition: TriggerCondition,
    pub ability: AbilityDef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedAbilityDef {
    pub cost: Cost,
    pub ability: AbilityDef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyAbilityDef {
    pub change: i32,
    pub ability: AbilityDef,
}

/// Which spells a cost reducer applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostScope {
    AllSpells,
    YourInstantsAndSorceries,
}

/// Abilities that apply while the permanent is on the battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaticAbility {
    CreaturesYouControlGet { power: i32, toughness: i32 },
    CreaturesYouControlHave(Keyword),
    SpellsCostLess { amount: u8, scope: CostScope },
}

/// Printed rules of one card
#[derive(Debug, Clone)]
pub struct CardDefinition {
    pub name: &'static str,
    pub cost: ManaCost,
    pub types: SmallVec<[CardType; 2]>,
    pub subtypes: &'static [&'static str],
    pub colors: SmallVec<[Color; 2]>,
    pub power: Option<i32>,
    pub toughness: Option<i32>,
    pub loyalty: Option<i32>,
    pub keywords: SmallVec<[Keyword; 3]>,
    /// Targets and effects of an instant or sorcery; for auras, the
    /// enchant target
    pub spell: AbilityDef,
    pub triggers: Vec<TriggeredAbilityDef>,
    pub activated: Vec<ActivatedAbilityDef>,
    pub loyalty_abilities: Vec<LoyaltyAbilityDef>,
    pub statics: Vec<StaticAbility>,
    pub alternate_costs: Vec<AlternateCost>,
    pub flashback: Option<Cost>,
    pub cycling: Option<Cost>,
    pub ninjutsu: Option<ManaCost>,
    /// `{T}: Add one mana of any of these colors`
    pub produces: SmallVec<[Color; 2]>,
    /// Fetch lands: pay 1 life, tap, sacrifice, search for one of these
    pub fetches: SmallVec<[LandType; 2]>,
    pub enters_tapped: bool,
}

impl CardDefinition {
    fn base(name: &'static str, cost: &str, card_type: CardType) -> Self {
        let cost = ManaCost::of(cost);
        let mut types = SmallVec::new();
        types.push(card_type);
        CardDefinition {
            name,
            cost,
            types,
            subtypes: &[],
            colors: cost.colors(),
            power: None,
            toughness: None,
            loyalty: None,
            keywords: SmallVec::new(),
            spell: AbilityDef::default(),
            triggers: Vec::new(),
            activated: Vec::new(),
            loyalty_abilities: Vec::new(),
            statics: Vec::new(),
            alternate_costs: Vec::new(),
            flashback: None,
            cycling: None,
            ninjutsu: None,
            produces: SmallVec::new(),
            fetches: SmallVec::new(),
            enters_tapped: false,
        }
    }

    pub fn creature(name: &'static str, cost: &str, power: i32, toughness: i32) -> Self {
        let mut def = Self::base(name, cost, CardType::Creature);
        def.power = Some(power);
        def.toughness = Some(toughness);
        def
    }

    pub fn artifact_creature(name: &'static str, cost: &str, power: i32, toughness: i32) -> Self {
        let mut def = Self::creature(name, cost, power, toughness);
        def.types.insert(0, CardType::Artifact);
        def
    }

    pub fn instant(name: &'static str, cost: &str, spell: AbilityDef) -> Self {
        let mut def = Self::base(name, cost, CardType::Instant);
        def.spell = spell;
        def
    }

    pub fn sorcery(name: &'static str, cost: &str, spell: AbilityDef) -> Self {
        let mut def = Self::base(name, cost, CardType::Sorcery);
        def.spell = spell;
        def
    }

    pub fn land(name: &'static str, subtypes: &'static [&'static str]) -> Self {
        let mut def = Self::base(name, "", CardType::Land);
        def.subtypes = subtypes;
        def.produces = subtypes
            .iter()
            .filter_map(|s| LandType::from_subtype(s))
            .map(|t| match t {
                LandType::Plains => Color::White,
                LandType::Island => Color::Blue,
                LandType::Swamp => Color::Black,
                LandType::Mountain => Color::Red,
                LandType::Forest => Color::Green,
            })
            .collect();
        def
    }

    pub fn artifact(name: &'static str, cost: &str) -> Self {
        Self::base(name, cost, CardType::Artifact)
    }

    pub fn enchantment(name: &'static str, cost: &str) -> Self {
        Self::base(name, cost, CardType::Enchantment)
    }

    /// An aura whose enchant restriction is a target chosen on cast
    pub fn aura(name: &'static str, cost: &str, enchant: TargetFilter) -> Self {
        let mut def = Self::base(name, cost, CardType::Enchantment);
        def.subtypes = &["Aura"];
        def.spell = AbilityDef::default().targeting(TargetSpec::beneficial(enchant));
        def
    }

    pub fn planeswalker(name: &'static str, cost: &str, loyalty: i32) -> Self {
        let mut def = Self::base(name, cost, CardType::Planeswalker);
        def.loyalty = Some(loyalty);
        def
    }

    pub fn subtypes(mut self, subtypes: &'static [&'static str]) -> Self {
        self.subtypes = subtypes;
        self
    }

    pub fn keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.push(keyword);
        self
    }

    pub fn colors(mut self, colors: &[Color]) -> Self {
        self.colors = colors.iter().copied().collect();
        self
    }

    pub fn trigger(mut self, condition: TriggerCondition, ability: AbilityDef) -> Self {
        self.triggers.push(TriggeredAbilityDef { condition, ability });
        self
    }

    pub fn activated(mut self, cost: Cost, ability: AbilityDef) -> Self {
        self.activated.push(ActivatedAbilityDef { cost, ability });
        self
    }

    pub fn loyalty_ability(mut self, change: i32, ability: AbilityDef) -> Self {
        self.loyalty_abilities.push(LoyaltyAbilityDef { change, ability });
        self
    }

    pub fn static_ability(mut self, ability: StaticAbility) -> Self {
        self.statics.push(ability);
        self
    }

    pub fn alternate(mut self, cost: AlternateCost) -> Self {
        self.alternate_costs.push(cost);
        self
    }

    pub fn flashback(mut self, cost: Cost) -> Self {
        self.flashback = Some(cost);
        self
    }

    pub fn cycling(mut self, cost: Cost) -> Self {
        self.cycling = Some(cost);
        self
    }

    pub fn ninjutsu(mut self, cost: &str) -> Self {
        self.ninjutsu = Some(ManaCost::of(cost));
        self
    }

    pub fn produces(mut self, colors: &[Color]) -> Self {
        self.produces = colors.iter().copied().collect();
        self
    }

    pub fn fetches(mut self, land_types: &[LandType]) -> Self {
        self.fetches = land_types.iter().copied().collect();
        self
    }

    pub fn enters_tapped(mut self) -> Self {
        self.enters_tapped = true;
        self
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn is_planeswalker(&self) -> bool {
        self.is_type(CardType::Planeswalker)
    }

    pub fn is_instant_or_sorcery(&self) -> bool {
        self.is_type(CardType::Instant) || self.is_type(CardType::Sorcery)
    }

    pub fn is_permanent(&self) -> bool {
        self.types.iter().all(|t| t.is_permanent())
    }

    pub fn is_aura(&self) -> bool {
        self.subtypes.contains(&"Aura")
    }

    /// Castable at instant speed
    pub fn has_flash(&self) -> bool {
        self.is_type(CardType::Instant) || self.keywords.contains(&Keyword::Flash)
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    pub fn has_color(&self, color: Color) -> bool {
        self.colors.contains(&color)
    }

    pub fn land_types(&self) -> SmallVec<[LandType; 2]> {
        self.subtypes
            .iter()
            .filter_map(|s| LandType::from_subtype(s))
            .collect()
    }

    pub fn is_basic_land(&self) -> bool {
        self.is_land() && matches!(self.name, "Plains" | "Island" | "Swamp" | "Mountain" | "Forest")
    }

    /// Whether the card does something useful when it resolves from the
    /// stack as a non-permanent spell
    pub fn is_mana_spell(&self) -> bool {
        self.is_instant_or_sorcery()
            && self
                .spell
                .effects
                .iter()
                .all(|e| matches!(e, crate::core::Effect::AddMana { .. }))
            && !self.spell.effects.is_empty()
    }
}
