//! Player representation

use crate::core::{EntityId, GameEntity, ManaPool, PlayerName};
use serde::{Deserialize, Serialize};

pub type PlayerId = EntityId<Player>;

/// Life paid for one Phyrexian mana symbol
pub const PHYREXIAN_LIFE: i32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: PlayerName,
    pub life: i32,
    pub mana_pool: ManaPool,

    /// Set by state-based actions; never cleared
    pub has_lost: bool,

    /// Tried to draw from an empty library since the last check
    pub drew_from_empty_library: bool,

    pub lands_played_this_turn: u8,
    pub max_lands_per_turn: u8,
    pub max_hand_size: usize,
    pub mulligans_taken: u8,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>, starting_life: i32) -> Self {
        Player {
            id,
            name: name.into(),
            life: starting_life,
            mana_pool: ManaPool::new(),
            has_lost: false,
            drew_from_empty_library: false,
            lands_played_this_turn: 0,
            max_lands_per_turn: 1,
            max_hand_size: 7,
            mulligans_taken: 0,
        }
    }

    pub fn gain_life(&mut self, amount: i32) {
        self.life += amount;
    }

    /// Lose life; the loss itself is applied by state-based actions
    pub fn lose_life(&mut self, amount: i32) {
        self.life -= amount;
    }

    pub fn can_play_land(&self) -> bool {
        self.lands_played_this_turn < self.max_lands_per_turn
    }

    /// Whether the player can pay `symbols` Phyrexian symbols with life
    pub fn can_pay_phyrexian_life(&self, symbols: u8) -> bool {
        self.life >= PHYREXIAN_LIFE * symbols as i32
    }

    pub fn play_land(&mut self) {
        self.lands_played_this_turn += 1;
    }

    pub fn reset_lands_played(&mut self) {
        self.lands_played_this_turn = 0;
    }

    pub fn empty_mana_pool(&mut self) {
        self.mana_pool.clear();
    }
}

impl GameEntity<Player> for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let id = PlayerId::new(1);
        let player = Player::new(id, "Alice", 20);

        assert_eq!(player.id, id);
        assert_eq!(player.name.as_str(), "Alice");
        assert_eq!(player.life, 20);
        assert!(!player.has_lost);
    }

    #[test]
    fn test_life_changes_do_not_decide_the_game() {
        let mut player = Player::new(PlayerId::new(1), "Bob", 20);
        player.lose_life(25);
        assert_eq!(player.life, -5);
        // Losing is a state-based action, not a side effect of life loss
        assert!(!player.has_lost);
        player.gain_life(10);
        assert_eq!(player.life, 5);
    }

    #[test]
    fn test_phyrexian_life_requires_two_per_symbol() {
        let mut player = Player::new(PlayerId::new(1), "Cleo", 3);
        assert!(player.can_pay_phyrexian_life(1));
        assert!(!player.can_pay_phyrexian_life(2));
        player.life = 1;
        assert!(!player.can_pay_phyrexian_life(1));
    }

    #[test]
    fn test_land_playing() {
        let mut player = Player::new(PlayerId::new(1), "Charlie", 20);

        assert!(player.can_play_land());
        player.play_land();
        assert!(!player.can_play_land());

        player.reset_lands_played();
        assert!(player.can_play_land());
    }
}
