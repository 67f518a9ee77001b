//! Core game types and entities

pub mod card;
pub mod effects;
pub mod entity;
pub mod mana;
pub mod player;
pub mod types;

pub use card::{CardId, GameCard};
pub use effects::{
    AbilityDef, CardFilter, Chooser, DelayedWhen, Effect, PlayerRef, Polarity, SearchDestination, Subject,
    TargetFilter, TargetRef, TargetSpec, TokenSpec,
};
pub use entity::{EntityId, EntityStore, GameEntity};
pub use mana::{Color, ManaCost, ManaPayment, ManaPool};
pub use player::{Player, PlayerId, PHYREXIAN_LIFE};
pub use types::{CardName, CardType, CounterType, Keyword, LandType, PlayerName};
