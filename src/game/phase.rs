//! Turn steps and the turn counter

use crate::core::PlayerId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The steps of a turn, in order
///
/// Phases are not modelled separately; the main phases are single steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Untap,
    Upkeep,
    Draw,
    Main1,
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    /// Skipped unless a combatant has first strike
    FirstStrikeDamage,
    CombatDamage,
    EndCombat,
    Main2,
    End,
    Cleanup,
}

impl Step {
    const ORDER: [Step; 13] = [
        Step::Untap,
        Step::Upkeep,
        Step::Draw,
        Step::Main1,
        Step::BeginCombat,
        Step::DeclareAttackers,
        Step::DeclareBlockers,
        Step::FirstStrikeDamage,
        Step::CombatDamage,
        Step::EndCombat,
        Step::Main2,
        Step::End,
        Step::Cleanup,
    ];

    /// The following step, `None` after cleanup
    pub fn next(self) -> Option<Step> {
        let idx = Self::ORDER.iter().position(|&s| s == self)?;
        Self::ORDER.get(idx + 1).copied()
    }

    /// Sorcery-speed actions are only possible in these
    pub fn is_main(self) -> bool {
        matches!(self, Step::Main1 | Step::Main2)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Untap => "untap",
            Step::Upkeep => "upkeep",
            Step::Draw => "draw",
            Step::Main1 => "precombat main",
            Step::BeginCombat => "beginning of combat",
            Step::DeclareAttackers => "declare attackers",
            Step::DeclareBlockers => "declare blockers",
            Step::FirstStrikeDamage => "first strike damage",
            Step::CombatDamage => "combat damage",
            Step::EndCombat => "end of combat",
            Step::Main2 => "postcombat main",
            Step::End => "end",
            Step::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Turn counter, current step, and who acts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStructure {
    /// Starts at 1 and counts both players' turns
    pub turn_number: u32,
    pub current_step: Step,
    pub active_player: PlayerId,
    /// `None` while nobody may act (untap, cleanup, between steps)
    pub priority_player: Option<PlayerId>,
}

impl TurnStructure {
    pub fn new(starting_player: PlayerId) -> Self {
        TurnStructure {
            turn_number: 1,
            current_step: Step::Untap,
            active_player: starting_player,
            priority_player: None,
        }
    }

    /// Move to the next step; false once cleanup is done
    pub fn advance_step(&mut self) -> bool {
        match self.current_step.next() {
            Some(step) => {
                self.current_step = step;
                self.priority_player = None;
                true
            }
            None => false,
        }
    }

    pub fn next_turn(&mut self, next_player: PlayerId) {
        self.turn_number += 1;
        self.current_step = Step::Untap;
        self.active_player = next_player;
        self.priority_player = None;
    }
}
