//! Strongly-typed wrappers and small enums shared across the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Card types (a card can have several, e.g. artifact creature)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
    Planeswalker,
}

impl CardType {
    /// Whether a card of this type stays on the battlefield when it resolves
    pub fn is_permanent(self) -> bool {
        !matches!(self, CardType::Instant | CardType::Sorcery)
    }
}

/// Keyword abilities the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Flying,
    Reach,
    FirstStrike,
    Deathtouch,
    Lifelink,
    Haste,
    Trample,
    Vigilance,
    Defender,
    Flash,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Keyword::Flying => "flying",
            Keyword::Reach => "reach",
            Keyword::FirstStrike => "first strike",
            Keyword::Deathtouch => "deathtouch",
            Keyword::Lifelink => "lifelink",
            Keyword::Haste => "haste",
            Keyword::Trample => "trample",
            Keyword::Vigilance => "vigilance",
            Keyword::Defender => "defender",
            Keyword::Flash => "flash",
        };
        write!(f, "{s}")
    }
}

/// Counter kinds tracked on permanents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterType {
    PlusOnePlusOne,
    MinusOneMinusOne,
    Loyalty,
}

impl fmt::Display for CounterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterType::PlusOnePlusOne => write!(f, "+1/+1"),
            CounterType::MinusOneMinusOne => write!(f, "-1/-1"),
            CounterType::Loyalty => write!(f, "loyalty"),
        }
    }
}

/// Basic land types, used by fetch lands, Daze and Snuff Out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandType {
    Plains,
    Island,
    Swamp,
    Mountain,
    Forest,
}

impl LandType {
    pub fn from_subtype(subtype: &str) -> Option<LandType> {
        match subtype {
            "Plains" => Some(LandType::Plains),
            "Island" => Some(LandType::Island),
            "Swamp" => Some(LandType::Swamp),
            "Mountain" => Some(LandType::Mountain),
            "Forest" => Some(LandType::Forest),
            _ => None,
        }
    }
}

impl fmt::Display for LandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Card name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardName(String);

impl CardName {
    pub fn new(s: impl Into<String>) -> Self {
        CardName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CardName {
    fn from(s: &str) -> Self {
        CardName(s.to_string())
    }
}

/// Player name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: impl Into<String>) -> Self {
        PlayerName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerName {
    fn from(s: String) -> Self {
        PlayerName(s)
    }
}

impl From<&str> for PlayerName {
    fn from(s: &str) -> Self {
        PlayerName(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_type_from_subtype() {
        assert_eq!(LandType::from_subtype("Island"), Some(LandType::Island));
        assert_eq!(LandType::from_subtype("Goblin"), None);
    }

    #[test]
    fn test_permanent_types() {
        assert!(CardType::Creature.is_permanent());
        assert!(CardType::Planeswalker.is_permanent());
        assert!(!CardType::Instant.is_permanent());
        assert!(!CardType::Sorcery.is_permanent());
    }

    #[test]
    fn test_names() {
        assert_eq!(CardName::new("Lightning Bolt").as_str(), "Lightning Bolt");
        assert_eq!(PlayerName::from("Alice").to_string(), "Alice");
        assert_eq!(CounterType::PlusOnePlusOne.to_string(), "+1/+1");
    }
}
