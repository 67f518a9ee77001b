//! Zones: each player's library, hand, graveyard and exile, plus the
//! shared battlefield

use crate::core::{CardId, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
    /// Spells being cast or waiting to resolve; tracked by `Stack`, not a `CardZone`
    Stack,
}

/// Ordered cards in one zone
///
/// A library's top card is the last element, so a draw is a pop and
/// "put on the bottom" inserts at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardZone {
    pub zone_type: Zone,
    pub owner: PlayerId,
    pub cards: Vec<CardId>,
}

impl CardZone {
    pub fn new(zone_type: Zone, owner: PlayerId) -> Self {
        CardZone {
            zone_type,
            owner,
            cards: Vec::new(),
        }
    }

    pub fn add(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    /// Remove a card, keeping the others in order
    pub fn remove(&mut self, card_id: CardId) -> bool {
        match self.cards.iter().position(|&id| id == card_id) {
            Some(pos) => {
                self.cards.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CardId> + '_ {
        self.cards.iter().copied()
    }

    pub fn draw_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    pub fn peek_top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    /// Up to `n` cards from the top, topmost first
    pub fn top(&self, n: usize) -> Vec<CardId> {
        self.cards.iter().rev().take(n).copied().collect()
    }

    pub fn add_to_top(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    pub fn add_to_bottom(&mut self, card_id: CardId) {
        self.cards.insert(0, card_id);
    }

    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        use rand::seq::SliceRandom;
        self.cards.shuffle(rng);
    }
}

/// The four zones a player owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerZones {
    pub library: CardZone,
    pub hand: CardZone,
    pub graveyard: CardZone,
    pub exile: CardZone,
}

impl PlayerZones {
    pub fn new(player_id: PlayerId) -> Self {
        PlayerZones {
            library: CardZone::new(Zone::Library, player_id),
            hand: CardZone::new(Zone::Hand, player_id),
            graveyard: CardZone::new(Zone::Graveyard, player_id),
            exile: CardZone::new(Zone::Exile, player_id),
        }
    }

    /// `None` for the shared zones
    pub fn get_zone(&self, zone: Zone) -> Option<&CardZone> {
        match zone {
            Zone::Library => Some(&self.library),
            Zone::Hand => Some(&self.hand),
            Zone::Graveyard => Some(&self.graveyard),
            Zone::Exile => Some(&self.exile),
            Zone::Battlefield | Zone::Stack => None,
        }
    }

    pub fn get_zone_mut(&mut self, zone: Zone) -> Option<&mut CardZone> {
        match zone {
            Zone::Library => Some(&mut self.library),
            Zone::Hand => Some(&mut self.hand),
            Zone::Graveyard => Some(&mut self.graveyard),
            Zone::Exile => Some(&mut self.exile),
            Zone::Battlefield | Zone::Stack => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn ids(range: std::ops::Range<u32>) -> Vec<CardId> {
        range.map(CardId::new).collect()
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut hand = CardZone::new(Zone::Hand, PlayerId::new(1));
        for id in ids(10..14) {
            hand.add(id);
        }
        assert!(hand.remove(CardId::new(11)));
        assert!(!hand.remove(CardId::new(11)));
        assert_eq!(hand.cards, vec![CardId::new(10), CardId::new(12), CardId::new(13)]);
    }

    #[test]
    fn test_library_top_and_bottom() {
        let mut library = CardZone::new(Zone::Library, PlayerId::new(1));
        let (brainstorm, bolt, island) = (CardId::new(1), CardId::new(2), CardId::new(3));
        library.add_to_top(brainstorm);
        library.add_to_top(bolt);
        library.add_to_bottom(island);

        assert_eq!(library.top(5), vec![bolt, brainstorm, island]);
        assert_eq!(library.peek_top(), Some(bolt));
        assert_eq!(library.draw_top(), Some(bolt));
        assert_eq!(library.draw_top(), Some(brainstorm));
        assert_eq!(library.draw_top(), Some(island));
        assert_eq!(library.draw_top(), None);
    }

    #[test]
    fn test_same_seed_same_shuffle() {
        let mut a = CardZone::new(Zone::Library, PlayerId::new(1));
        let mut b = a.clone();
        for id in ids(0..40) {
            a.add(id);
            b.add(id);
        }
        a.shuffle(&mut rand_chacha::ChaCha12Rng::seed_from_u64(7));
        b.shuffle(&mut rand_chacha::ChaCha12Rng::seed_from_u64(7));
        assert_eq!(a.cards, b.cards);
        assert_ne!(a.cards, ids(0..40));
    }

    #[test]
    fn test_shared_zones_are_not_per_player() {
        let zones = PlayerZones::new(PlayerId::new(1));
        assert!(zones.get_zone(Zone::Battlefield).is_none());
        assert!(zones.get_zone(Zone::Stack).is_none());
        assert_eq!(zones.get_zone(Zone::Exile).map(|z| z.zone_type), Some(Zone::Exile));
    }
}
