//! The stack of spells and abilities waiting to resolve

use crate::core::{AbilityDef, CardId, CardName, PlayerId, TargetRef};
use crate::game::CastMethod;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Targets chosen for each slot; `None` marks an "up to" slot left empty
pub type ChosenTargets = SmallVec<[Option<TargetRef>; 3]>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StackItem {
    /// A card cast as a spell; the card itself sits on the stack
    Spell { card: CardId, method: CastMethod },
    /// A triggered or activated ability; the source stays where it is
    Ability {
        source: CardId,
        source_name: CardName,
        ability: AbilityDef,
        /// The player whose action fired a trigger, if any
        event_player: Option<PlayerId>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackEntry {
    pub item: StackItem,
    pub controller: PlayerId,
    pub targets: ChosenTargets,
}

impl StackEntry {
    pub fn spell(card: CardId, method: CastMethod, controller: PlayerId, targets: ChosenTargets) -> Self {
        StackEntry {
            item: StackItem::Spell { card, method },
            controller,
            targets,
        }
    }

    /// The card a spell entry represents
    pub fn spell_card(&self) -> Option<CardId> {
        match self.item {
            StackItem::Spell { card, .. } => Some(card),
            StackItem::Ability { .. } => None,
        }
    }

    /// The card that created this entry (the spell card or ability source)
    pub fn source(&self) -> CardId {
        match &self.item {
            StackItem::Spell { card, .. } => *card,
            StackItem::Ability { source, .. } => *source,
        }
    }

    pub fn is_ability(&self) -> bool {
        matches!(self.item, StackItem::Ability { .. })
    }
}

/// Last in, first out
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stack {
    entries: Vec<StackEntry>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<StackEntry> {
        self.entries.pop()
    }

    pub fn top(&self) -> Option<&StackEntry> {
        self.entries.last()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries from the bottom up
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &StackEntry> + '_ {
        self.entries.iter()
    }

    pub fn contains_spell(&self, card: CardId) -> bool {
        self.find_spell(card).is_some()
    }

    pub fn find_spell(&self, card: CardId) -> Option<&StackEntry> {
        self.entries.iter().find(|e| e.spell_card() == Some(card))
    }

    /// Take a spell off the stack wherever it is (countering)
    pub fn remove_spell(&mut self, card: CardId) -> Option<StackEntry> {
        let pos = self.entries.iter().position(|e| e.spell_card() == Some(card))?;
        Some(self.entries.remove(pos))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
