//! Per-instance card state
//!
//! A `GameCard` is one physical card (or token) in one game. Its printed
//! rules live in the static registry; the instance only carries what can
//! change during play.

use crate::cards::{self, CardDefinition, DefinitionId};
use crate::core::{CardName, CardType, Color, CounterType, EntityId, GameEntity, Keyword, PlayerId, TokenSpec};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type CardId = EntityId<GameCard>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCard {
    pub id: CardId,
    pub name: CardName,

    /// Registry definition; `None` for tokens
    pub definition: Option<DefinitionId>,

    /// Characteristics of a token (tokens have no definition)
    pub token: Option<TokenSpec>,

    pub owner: PlayerId,
    pub controller: PlayerId,
    pub tapped: bool,

    /// Damage marked this turn
    pub damage: i32,

    /// Marked damage includes damage from a deathtouch source
    pub deathtouch_damage: bool,

    pub counters: SmallVec<[(CounterType, i32); 2]>,

    /// For auras: the permanent this is attached to
    pub attached_to: Option<CardId>,

    /// Turn on which this permanent last came under its controller's
    /// control (for summoning sickness)
    pub entered_turn: Option<u32>,

    /// A planeswalker may activate one loyalty ability per turn
    pub loyalty_activated: bool,
}

impl GameCard {
    pub fn new(id: CardId, definition_id: DefinitionId, owner: PlayerId) -> Self {
        let name = cards::definition(definition_id)
            .map(|d| CardName::new(d.name))
            .unwrap_or_else(|| CardName::new("<unknown>"));
        GameCard {
            id,
            name,
            definition: Some(definition_id),
            token: None,
            owner,
            controller: owner,
            tapped: false,
            damage: 0,
            deathtouch_damage: false,
            counters: SmallVec::new(),
            attached_to: None,
            entered_turn: None,
            loyalty_activated: false,
        }
    }

    pub fn new_token(id: CardId, spec: TokenSpec, owner: PlayerId) -> Self {
        GameCard {
            id,
            name: CardName::new(format!("{} Token", spec.name)),
            definition: None,
            token: Some(spec),
            owner,
            controller: owner,
            tapped: false,
            damage: 0,
            deathtouch_damage: false,
            counters: SmallVec::new(),
            attached_to: None,
            entered_turn: None,
            loyalty_activated: false,
        }
    }

    /// The printed rules, if this is not a token
    pub fn def(&self) -> Option<&'static CardDefinition> {
        self.definition.and_then(cards::definition)
    }

    pub fn is_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        match (&self.token, self.def()) {
            (Some(_), _) => card_type == CardType::Creature,
            (None, Some(def)) => def.is_type(card_type),
            (None, None) => false,
        }
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

    pub fn has_color(&self, color: Color) -> bool {
        match (&self.token, self.def()) {
            (Some(spec), _) => spec.color == color,
            (None, Some(def)) => def.has_color(color),
            (None, None) => false,
        }
    }

    /// Keyword from the card's own text or token characteristics
    ///
    /// Grants from continuous effects are not included; ask
    /// `GameState::has_keyword` for the full answer.
    pub fn has_printed_keyword(&self, keyword: Keyword) -> bool {
        match (&self.token, self.def()) {
            (Some(spec), _) => spec.keywords.contains(&keyword),
            (None, Some(def)) => def.has_keyword(keyword),
            (None, None) => false,
        }
    }

    pub fn base_power(&self) -> i32 {
        match (&self.token, self.def()) {
            (Some(spec), _) => spec.power,
            (None, Some(def)) => def.power.unwrap_or(0),
            (None, None) => 0,
        }
    }

    pub fn base_toughness(&self) -> i32 {
        match (&self.token, self.def()) {
            (Some(spec), _) => spec.toughness,
            (None, Some(def)) => def.toughness.unwrap_or(0),
            (None, None) => 0,
        }
    }

    pub fn cmc(&self) -> u8 {
        self.def().map(|d| d.cost.cmc()).unwrap_or(0)
    }

    pub fn tap(&mut self) {
        self.tapped = true;
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    pub fn counter(&self, counter_type: CounterType) -> i32 {
        self.counters
            .iter()
            .find(|(t, _)| *t == counter_type)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn add_counters(&mut self, counter_type: CounterType, amount: i32) {
        if let Some((_, n)) = self.counters.iter_mut().find(|(t, _)| *t == counter_type) {
            *n += amount;
        } else {
            self.counters.push((counter_type, amount));
        }
    }

    /// Remove up to `amount` counters, returning how many were removed
    pub fn remove_counters(&mut self, counter_type: CounterType, amount: i32) -> i32 {
        let Some((_, n)) = self.counters.iter_mut().find(|(t, _)| *t == counter_type) else {
            return 0;
        };
        let removed = amount.min(*n);
        *n -= removed;
        removed
    }

    pub fn loyalty(&self) -> i32 {
        self.counter(CounterType::Loyalty)
    }

    /// Clear everything that does not survive a zone change
    pub fn reset_for_zone_change(&mut self) {
        self.tapped = false;
        self.damage = 0;
        self.deathtouch_damage = false;
        self.counters.clear();
        self.attached_to = None;
        self.entered_turn = None;
        self.loyalty_activated = false;
        self.controller = self.owner;
    }
}

impl GameEntity<GameCard> for GameCard {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
