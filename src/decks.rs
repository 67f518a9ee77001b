//! Deck lists (.dck text format) and the built-in sample decks
//!
//! A deck file is one "N Card Name" line per entry. Blank lines, `#`
//! comments and `[Section]` headers are skipped, except that `Name=` sets
//! the deck name and everything after a `[Sideboard]` header goes to the
//! sideboard. Names are matched against the curated registry only when the
//! deck is turned into definitions.

use crate::cards::{lookup_id, DefinitionId};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Smallest main deck a game will start with
pub const MIN_DECK_SIZE: usize = 40;

/// A deck entry (card name and count)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub card_name: String,
    pub count: u8,
}

/// A complete deck list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    pub name: String,
    pub main_deck: Vec<DeckEntry>,
    pub sideboard: Vec<DeckEntry>,
}

impl DeckList {
    /// Load a deck from a .dck file
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = fs::read_to_string(path)?;
        let mut deck = Self::parse(&content)?;
        if deck.name.is_empty() {
            if let Some(stem) = path.file_stem() {
                deck.name = stem.to_string_lossy().into_owned();
            }
        }
        Ok(deck)
    }

    /// Parse a deck from its text content
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut name = String::new();
        let mut main_deck = Vec::new();
        let mut sideboard = Vec::new();
        let mut in_sideboard = false;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if let Some(value) = line.strip_prefix("Name=") {
                name = value.trim().to_string();
                continue;
            }
            if line.starts_with('[') {
                in_sideboard = line.eq_ignore_ascii_case("[sideboard]");
                continue;
            }
            if line.is_empty() || line.starts_with('#') || line.contains('=') {
                continue;
            }

            // "4 Lightning Bolt" or "4 Lightning Bolt|M10"
            let entry = line
                .split_once(' ')
                .and_then(|(count, rest)| {
                    let count = count.trim_end_matches('x').parse::<u8>().ok()?;
                    let card_name = rest.split_once('|').map_or(rest, |(name, _set)| name).trim();
                    (count > 0 && !card_name.is_empty()).then(|| DeckEntry {
                        card_name: card_name.to_string(),
                        count,
                    })
                })
                .ok_or_else(|| MtgError::ParseError(format!("deck line {}: {line:?}", line_no + 1)))?;

            if in_sideboard {
                sideboard.push(entry);
            } else {
                main_deck.push(entry);
            }
        }

        if main_deck.is_empty() {
            return Err(MtgError::InvalidDeck("empty deck".to_string()));
        }

        Ok(DeckList {
            name,
            main_deck,
            sideboard,
        })
    }

    /// Total cards in main deck
    pub fn total_cards(&self) -> usize {
        self.main_deck.iter().map(|e| e.count as usize).sum()
    }

    /// Total cards in sideboard
    pub fn sideboard_size(&self) -> usize {
        self.sideboard.iter().map(|e| e.count as usize).sum()
    }

    /// The main deck as registry definitions, one per card
    ///
    /// Fails on the first name the registry does not know and on decks
    /// smaller than `MIN_DECK_SIZE`.
    pub fn to_definitions(&self) -> Result<Vec<DefinitionId>> {
        let total = self.total_cards();
        if total < MIN_DECK_SIZE {
            return Err(MtgError::InvalidDeck(format!(
                "{} has {total} cards, need at least {MIN_DECK_SIZE}",
                self.display_name()
            )));
        }
        let mut cards = Vec::with_capacity(total);
        for entry in &self.main_deck {
            let id = lookup_id(&entry.card_name).ok_or_else(|| MtgError::UnknownCard(entry.card_name.clone()))?;
            cards.extend(std::iter::repeat(id).take(entry.count as usize));
        }
        Ok(cards)
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "unnamed deck"
        } else {
            &self.name
        }
    }

    /// Render back to .dck text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if !self.name.is_empty() {
            out.push_str(&format!("[metadata]\nName={}\n\n", self.name));
        }
        out.push_str("[Main]\n");
        for entry in &self.main_deck {
            out.push_str(&format!("{} {}\n", entry.count, entry.card_name));
        }
        if !self.sideboard.is_empty() {
            out.push_str("\n[Sideboard]\n");
            for entry in &self.sideboard {
                out.push_str(&format!("{} {}\n", entry.count, entry.card_name));
            }
        }
        out
    }
}

const RED_AGGRO: &str = "\
[metadata]
Name=Red Aggro

[Main]
20 Mountain
4 Monastery Swiftspear
4 Raging Goblin
4 Mogg Fanatic
4 Ball Lightning
4 Hill Giant
4 Lightning Bolt
4 Shock
4 Firebolt
4 Forked Bolt
4 Arc Lightning
";

const GREEN_STOMPY: &str = "\
[metadata]
Name=Green Stompy

[Main]
22 Forest
4 Llanowar Elves
4 Birds of Paradise
4 Grizzly Bears
4 Elvish Visionary
4 Giant Spider
4 Craw Wurm
4 Thundering Tanadon
2 Colossal Dreadmaw
4 Giant Growth
4 Rampant Growth
";

const DIMIR_CONTROL: &str = "\
[metadata]
Name=Dimir Control

[Main]
10 Island
6 Swamp
4 Underground Sea
4 Polluted Delta
4 Counterspell
4 Mana Leak
2 Negate
4 Doom Blade
2 Diabolic Edict
4 Brainstorm
2 Fact or Fiction
4 Vampire Nighthawk
2 Air Elemental
4 Ninja of the Deep Hours
2 Gravedigger
2 Jace Beleren
";

const WHITE_WEENIE: &str = "\
[metadata]
Name=White Weenie

[Main]
20 Plains
4 Savannah Lions
4 Steppe Lynx
4 Youthful Knight
4 Porcelain Legionnaire
4 Vault Skirge
4 Serra Angel
4 Swords to Plowshares
4 Raise the Alarm
4 Glorious Anthem
4 Renewed Faith
";

const SAMPLE_DECKS: &[(&str, &str)] = &[
    ("red", RED_AGGRO),
    ("green", GREEN_STOMPY),
    ("dimir", DIMIR_CONTROL),
    ("white", WHITE_WEENIE),
];

/// Short names accepted by `sample_deck`
pub fn sample_deck_names() -> impl Iterator<Item = &'static str> {
    SAMPLE_DECKS.iter().map(|(key, _)| *key)
}

/// One of the built-in decks by short name
pub fn sample_deck(key: &str) -> Result<DeckList> {
    let (_, text) = SAMPLE_DECKS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .ok_or_else(|| MtgError::InvalidDeck(format!("no sample deck named {key:?}")))?;
    DeckList::parse(text)
}

/// A sample deck name or a path to a .dck file
pub fn load_deck(source: &str) -> Result<DeckList> {
    let path = Path::new(source);
    if path.exists() {
        DeckList::load_from_file(path)
    } else {
        sample_deck(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::definition;

    #[test]
    fn test_parse_simple_deck() {
        let content = r#"
[metadata]
Name=Test Deck

[Main]
20 Mountain
40 Lightning Bolt|M10

[Sideboard]
15 Shock
"#;

        let deck = DeckList::parse(content).unwrap();
        assert_eq!(deck.name, "Test Deck");
        assert_eq!(deck.main_deck.len(), 2);
        assert_eq!(deck.total_cards(), 60);
        assert_eq!(deck.main_deck[1].card_name, "Lightning Bolt");
        assert_eq!(deck.sideboard_size(), 15);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(DeckList::parse("# nothing here\n"), Err(MtgError::InvalidDeck(_))));
        assert!(matches!(DeckList::parse("four Lightning Bolt"), Err(MtgError::ParseError(_))));
        assert!(matches!(DeckList::parse("0 Lightning Bolt"), Err(MtgError::ParseError(_))));
    }

    #[test]
    fn test_unknown_card_is_reported_by_name() {
        let deck = DeckList::parse("40 Mountain\n4 Black Lotus\n").unwrap();
        match deck.to_definitions() {
            Err(MtgError::UnknownCard(name)) => assert_eq!(name, "Black Lotus"),
            other => panic!("expected UnknownCard, got {other:?}"),
        }
    }

    #[test]
    fn test_small_decks_are_invalid() {
        let deck = DeckList::parse("20 Mountain\n").unwrap();
        assert!(matches!(deck.to_definitions(), Err(MtgError::InvalidDeck(_))));
    }

    #[test]
    fn test_sample_decks_are_legal_sixty() {
        for key in sample_deck_names() {
            let deck = sample_deck(key).unwrap();
            assert_eq!(deck.total_cards(), 60, "{key}");
            let cards = deck.to_definitions().unwrap();
            assert_eq!(cards.len(), 60);
            let lands = cards
                .iter()
                .filter(|&&id| definition(id).is_some_and(|d| d.is_land()))
                .count();
            assert!((20..=24).contains(&lands), "{key} has {lands} lands");
        }
    }

    #[test]
    fn test_text_round_trip() {
        let deck = sample_deck("DIMIR").unwrap();
        let again = DeckList::parse(&deck.to_text()).unwrap();
        assert_eq!(again, deck);
    }

    #[test]
    fn test_load_deck_falls_back_to_samples() {
        assert_eq!(load_deck("red").unwrap().name, "Red Aggro");
        assert!(load_deck("no-such-deck").is_err());
    }
}
