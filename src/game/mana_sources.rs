//! Mana availability and tap planning
//!
//! `ManaPlanner` is a read-only snapshot of the untapped mana sources a
//! player controls. It answers "can this cost be paid from pool plus
//! sources?" and, if so, which sources to tap for which colors. The
//! engine uses it to pay "unless its controller pays" costs; the
//! heuristic controller uses it to sequence `TapForMana` actions.
//!
//! Each source makes one mana of one of its colors. Colored requirements
//! are matched by a small backtracking search (scarce colors first,
//! least flexible sources first); the generic remainder takes whatever is
//! left, again least flexible first so dual lands are kept for last.

use crate::core::{CardId, Color, ManaCost, ManaPool, PlayerId};
use crate::game::GameState;
use smallvec::SmallVec;

/// An untapped permanent that can make mana right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManaSource {
    pub card: CardId,
    pub colors: SmallVec<[Color; 5]>,
}

/// Which source to tap for which color
pub type TapPlan = SmallVec<[(CardId, Color); 8]>;

/// Beyond this many sources the colored search stops backtracking
const SEARCH_LIMIT: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct ManaPlanner {
    player_id: Option<PlayerId>,
    sources: Vec<ManaSource>,
}

impl ManaPlanner {
    pub fn new(player_id: PlayerId) -> Self {
        ManaPlanner {
            player_id: Some(player_id),
            sources: Vec::new(),
        }
    }

    /// Snapshot the player's usable sources
    pub fn from_state(game: &GameState, player_id: PlayerId) -> Self {
        let mut planner = Self::new(player_id);
        planner.update(game);
        planner
    }

    /// Rescan the battlefield
    pub fn update(&mut self, game: &GameState) {
        self.sources.clear();
        let Some(player_id) = self.player_id else {
            return;
        };
        for card in game.battlefield.iter() {
            let colors = game.mana_options(player_id, card);
            if !colors.is_empty() {
                self.sources.push(ManaSource { card, colors });
            }
        }
        // Least flexible first
        self.sources.sort_by_key(|s| (s.colors.len(), s.card));
    }

    pub fn sources(&self) -> &[ManaSource] {
        &self.sources
    }

    /// The same planner with some sources already spent
    pub fn without(&self, spent: &[CardId]) -> ManaPlanner {
        ManaPlanner {
            player_id: self.player_id,
            sources: self
                .sources
                .iter()
                .filter(|s| !spent.contains(&s.card))
                .cloned()
                .collect(),
        }
    }

    /// Total mana available from pool plus sources
    pub fn potential_total(&self, pool: &ManaPool) -> u32 {
        pool.total() + self.sources.len() as u32
    }

    pub fn can_pay(&self, cost: &ManaCost, pool: &ManaPool) -> bool {
        self.plan(cost, pool).is_some()
    }

    /// Sources to tap so that pool plus the new mana covers `cost`
    ///
    /// Phyrexian symbols count as colored mana here; callers that will
    /// pay them with life should strip them first.
    pub fn plan(&self, cost: &ManaCost, pool: &ManaPool) -> Option<TapPlan> {
        let cost = cost.phyrexian_as_colored();

        let mut pips: SmallVec<[Color; 8]> = SmallVec::new();
        let mut leftover = 0u32;
        for color in Color::ALL {
            let need = cost.colored_amount(color);
            let have = pool.amount(color);
            for _ in have.min(need)..need {
                pips.push(color);
            }
            leftover += have.saturating_sub(need) as u32;
        }
        let generic_need = (cost.generic as u32).saturating_sub(leftover) as usize;

        if pips.len() + generic_need > self.sources.len() {
            return None;
        }

        // Scarcest colors first
        pips.sort_by_key(|&c| self.sources.iter().filter(|s| s.colors.contains(&c)).count());

        let mut used = vec![false; self.sources.len()];
        let mut plan = TapPlan::new();
        let found = if self.sources.len() <= SEARCH_LIMIT {
            self.assign_colored(&pips, 0, &mut used, &mut plan)
        } else {
            self.assign_greedy(&pips, &mut used, &mut plan)
        };
        if !found {
            return None;
        }

        for (i, source) in self.sources.iter().enumerate() {
            if plan.len() >= pips.len() + generic_need {
                break;
            }
            if !used[i] {
                used[i] = true;
                plan.push((source.card, source.colors[0]));
            }
        }
        (plan.len() == pips.len() + generic_need).then_some(plan)
    }

    fn assign_colored(&self, pips: &[Color], idx: usize, used: &mut [bool], plan: &mut TapPlan) -> bool {
        let Some(&color) = pips.get(idx) else {
            return true;
        };
        for (i, source) in self.sources.iter().enumerate() {
            if used[i] || !source.colors.contains(&color) {
                continue;
            }
            used[i] = true;
            plan.push((source.card, color));
            if self.assign_colored(pips, idx + 1, used, plan) {
                return true;
            }
            plan.pop();
            used[i] = false;
        }
        false
    }

    fn assign_greedy(&self, pips: &[Color], used: &mut [bool], plan: &mut TapPlan) -> bool {
        for &color in pips {
            let Some(i) = (0..self.sources.len()).find(|&i| !used[i] && self.sources[i].colors.contains(&color))
            else {
                return false;
            };
            used[i] = true;
            plan.push((self.sources[i].card, color));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::lookup_id;

    fn board(names: &[&str]) -> (GameState, PlayerId, Vec<CardId>) {
        let mut game = GameState::new_two_player("Alice".to_string(), "Bob".to_string(), 20);
        let p1 = game.players[0].id;
        let mut ids = Vec::new();
        for name in names {
            let card = game.create_card(lookup_id(name).unwrap(), p1);
            game.put_onto_battlefield(card, p1, false).unwrap();
            ids.push(card);
        }
        // Creature sources need a turn to lose summoning sickness
        game.turn.turn_number += 1;
        (game, p1, ids)
    }

    #[test]
    fn test_plan_prefers_basics_for_generic() {
        let (game, p1, ids) = board(&["Volcanic Island", "Mountain", "Mountain"]);
        let planner = ManaPlanner::from_state(&game, p1);
        let plan = planner.plan(&ManaCost::parse("{1}{U}").unwrap(), &ManaPool::new()).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan.contains(&(ids[0], Color::Blue)));
    }

    #[test]
    fn test_plan_backtracks_on_dual_lands() {
        // Taiga must make G because only it can; the Volcanic covers R
        let (game, p1, ids) = board(&["Volcanic Island", "Taiga"]);
        let planner = ManaPlanner::from_state(&game, p1);
        let plan = planner.plan(&ManaCost::parse("{R}{G}").unwrap(), &ManaPool::new()).unwrap();
        assert!(plan.contains(&(ids[1], Color::Green)));
        assert!(plan.contains(&(ids[0], Color::Red)));
    }

    #[test]
    fn test_pool_mana_counts() {
        let (game, p1, _) = board(&["Island"]);
        let planner = ManaPlanner::from_state(&game, p1);
        let mut pool = ManaPool::new();
        pool.add(Color::Black, 1);
        assert!(planner.can_pay(&ManaCost::parse("{U}{B}").unwrap(), &pool));
        assert!(!planner.can_pay(&ManaCost::parse("{U}{U}").unwrap(), &pool));
        assert_eq!(planner.potential_total(&pool), 2);
    }

    #[test]
    fn test_mana_creatures_and_tapped_lands() {
        let (mut game, p1, ids) = board(&["Birds of Paradise", "Forest"]);
        game.cards.get_mut(ids[1]).unwrap().tap();
        let planner = ManaPlanner::from_state(&game, p1);
        assert_eq!(planner.sources().len(), 1);
        assert!(planner.can_pay(&ManaCost::parse("{W}").unwrap(), &ManaPool::new()));
        assert!(!planner.can_pay(&ManaCost::parse("{W}{G}").unwrap(), &ManaPool::new()));
    }

    #[test]
    fn test_phyrexian_counts_as_colored() {
        let (game, p1, _) = board(&["Swamp", "Swamp"]);
        let planner = ManaPlanner::from_state(&game, p1);
        assert!(planner.can_pay(&ManaCost::parse("{1}{B/P}").unwrap(), &ManaPool::new()));
        assert!(!planner.can_pay(&ManaCost::parse("{1}{B/P}{B/P}").unwrap(), &ManaPool::new()));
    }
}
