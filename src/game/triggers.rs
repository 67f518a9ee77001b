//! Game events and the triggered abilities they fire
//!
//! Events are matched against permanents when they happen; matching
//! triggers wait in `GameState::pending_triggers` until the engine next
//! puts triggers on the stack, which it does in APNAP order.

use crate::cards::TriggerCondition;
use crate::core::{AbilityDef, CardId, CardName, DelayedWhen, Effect, PlayerId};
use crate::game::GameState;
use serde::{Deserialize, Serialize};

/// Something that happened and may trigger abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    EnteredBattlefield { card: CardId, controller: PlayerId },
    /// A creature went from the battlefield to a graveyard
    Died { card: CardId, controller: PlayerId },
    UpkeepBegan { player: PlayerId },
    EndStepBegan { player: PlayerId },
    LandPlayed { card: CardId, player: PlayerId },
    SpellCast { card: CardId, controller: PlayerId },
    CombatDamageToPlayer { source: CardId, player: PlayerId },
}

/// A trigger waiting to be put on the stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTrigger {
    pub source: CardId,
    pub source_name: CardName,
    pub controller: PlayerId,
    pub ability: AbilityDef,
    pub event_player: Option<PlayerId>,
}

/// A one-shot trigger created by a resolving effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayedTrigger {
    pub source: CardId,
    pub source_name: CardName,
    pub controller: PlayerId,
    pub when: DelayedWhen,
    pub effects: Vec<Effect>,
}

impl DelayedTrigger {
    fn fires_on(&self, event: &GameEvent) -> bool {
        match (self.when, event) {
            (DelayedWhen::NextEndStep, GameEvent::EndStepBegan { .. }) => true,
            (DelayedWhen::YourNextUpkeep, GameEvent::UpkeepBegan { player }) => *player == self.controller,
            _ => false,
        }
    }
}

fn condition_matches(
    condition: TriggerCondition,
    event: &GameEvent,
    source: CardId,
    source_controller: PlayerId,
) -> bool {
    match (condition, event) {
        (TriggerCondition::EntersBattlefield, GameEvent::EnteredBattlefield { card, .. }) => *card == source,
        (TriggerCondition::Dies, GameEvent::Died { card, .. }) => *card == source,
        (TriggerCondition::YourUpkeep, GameEvent::UpkeepBegan { player }) => *player == source_controller,
        (TriggerCondition::AnyPlayerPlaysLand, GameEvent::LandPlayed { .. }) => true,
        // Whether the entering permanent is a land is checked by the caller
        (TriggerCondition::LandEntersUnderYourControl, GameEvent::EnteredBattlefield { controller, .. }) => {
            *controller == source_controller
        }
        (TriggerCondition::YouCastNoncreatureSpell, GameEvent::SpellCast { controller, .. }) => {
            *controller == source_controller
        }
        (TriggerCondition::DealsCombatDamageToPlayer, GameEvent::CombatDamageToPlayer { source: s, .. }) => {
            *s == source
        }
        _ => false,
    }
}

fn event_player(event: &GameEvent) -> Option<PlayerId> {
    match *event {
        GameEvent::EnteredBattlefield { controller, .. }
        | GameEvent::Died { controller, .. }
        | GameEvent::SpellCast { controller, .. } => Some(controller),
        GameEvent::UpkeepBegan { player }
        | GameEvent::EndStepBegan { player }
        | GameEvent::LandPlayed { player, .. }
        | GameEvent::CombatDamageToPlayer { player, .. } => Some(player),
    }
}

impl GameState {
    /// Record an event: queue every trigger it fires
    pub fn fire_event(&mut self, event: GameEvent) {
        // Extra checks that need the state rather than just the event
        let entering_land = match event {
            GameEvent::EnteredBattlefield { card, .. } => self.cards.get(card).map(|c| c.is_land()).unwrap_or(false),
            _ => false,
        };
        let cast_noncreature = match event {
            GameEvent::SpellCast { card, .. } => self.cards.get(card).map(|c| !c.is_creature()).unwrap_or(false),
            _ => false,
        };

        // A dying creature's own "dies" trigger looks back at it in the graveyard
        let mut candidates: Vec<CardId> = self.battlefield.iter().collect();
        if let GameEvent::Died { card, .. } = event {
            if !candidates.contains(&card) {
                candidates.push(card);
            }
        }

        let mut fired = Vec::new();
        for source in candidates {
            let Ok(card) = self.cards.get(source) else {
                continue;
            };
            let Some(def) = card.def() else {
                continue;
            };
            let controller = match event {
                GameEvent::Died { card: dead, controller } if dead == source => controller,
                _ => card.controller,
            };
            for trigger in &def.triggers {
                if !condition_matches(trigger.condition, &event, source, controller) {
                    continue;
                }
                let extra_ok = match trigger.condition {
                    TriggerCondition::LandEntersUnderYourControl => entering_land,
                    TriggerCondition::YouCastNoncreatureSpell => cast_noncreature,
                    _ => true,
                };
                if extra_ok {
                    fired.push(PendingTrigger {
                        source,
                        source_name: card.name.clone(),
                        controller,
                        ability: trigger.ability.clone(),
                        event_player: event_player(&event),
                    });
                }
            }
        }

        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.delayed_triggers)
            .into_iter()
            .partition(|d| d.fires_on(&event));
        self.delayed_triggers = waiting;
        for delayed in due {
            fired.push(PendingTrigger {
                source: delayed.source,
                source_name: delayed.source_name,
                controller: delayed.controller,
                ability: AbilityDef::new(delayed.effects),
                event_player: event_player(&event),
            });
        }

        for trigger in &fired {
            self.logger
                .verbose(&format!("{} triggers ({:?})", trigger.source_name, event));
        }
        self.pending_triggers.extend(fired);
    }

    /// Take the queued triggers in APNAP order: the active player's first,
    /// so the non-active player's end up on top of the stack
    pub fn take_pending_triggers(&mut self) -> Vec<PendingTrigger> {
        let active = self.turn.active_player;
        let (mut ordered, others): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_triggers)
            .into_iter()
            .partition(|t| t.controller == active);
        ordered.extend(others);
        ordered
    }
}
