//! Player actions and the state mechanics behind them

use crate::cards::TriggerCondition;
use crate::core::{AbilityDef, CardId, Color, Keyword, ManaCost, ManaPayment, PlayerId, TargetRef, PHYREXIAN_LIFE};
use crate::game::{ChosenTargets, GameEvent, GameState};
use crate::zones::Zone;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// How a spell is being cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastMethod {
    /// From hand, paying the mana cost
    Normal,
    /// From the graveyard, paying the flashback cost; exiled afterwards
    Flashback,
    /// From hand, paying the card's n-th alternate cost
    Alternate(usize),
}

/// Everything a player can do while holding priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameAction {
    PassPriority,
    PlayLand { card: CardId },
    CastSpell { card: CardId, method: CastMethod },
    /// Pay one Phyrexian symbol of a spell being cast, with mana or 2 life
    PayPhyrexian { color: Color, with_life: bool },
    /// Put the spell being cast on the stack once fully paid
    CompleteCast,
    /// Abandon the spell being cast, refunding everything paid
    CancelCast,
    TapForMana { card: CardId },
    ActivateAbility { card: CardId, index: usize },
    ActivateLoyalty { card: CardId, index: usize },
    /// Pay 1 life, tap and sacrifice a fetch land to search for a land
    Fetch { card: CardId },
    Cycle { card: CardId },
    /// Return an unblocked attacker to hand and put the ninja onto the
    /// battlefield attacking in its place
    Ninjutsu { ninja: CardId, attacker: CardId },
}

impl GameAction {
    /// Actions allowed while a cast is waiting for payment
    pub fn is_payment_step(&self) -> bool {
        matches!(
            self,
            GameAction::TapForMana { .. }
                | GameAction::PayPhyrexian { .. }
                | GameAction::CompleteCast
                | GameAction::CancelCast
        )
    }

    /// Human-readable description with card names resolved
    pub fn describe(&self, game: &GameState) -> String {
        match *self {
            GameAction::PassPriority => "pass priority".to_string(),
            GameAction::PlayLand { card } => format!("play {}", game.card_name(card)),
            GameAction::CastSpell { card, method } => match method {
                CastMethod::Normal => format!("cast {}", game.card_name(card)),
                CastMethod::Flashback => format!("cast {} with flashback", game.card_name(card)),
                CastMethod::Alternate(i) => {
                    format!("cast {} for its alternate cost #{}", game.card_name(card), i + 1)
                }
            },
            GameAction::PayPhyrexian { color, with_life } => {
                if with_life {
                    format!("pay {{{color}/P}} with {PHYREXIAN_LIFE} life")
                } else {
                    format!("pay {{{color}/P}} with {{{color}}}")
                }
            }
            GameAction::CompleteCast => "finish casting".to_string(),
            GameAction::CancelCast => "cancel casting".to_string(),
            GameAction::TapForMana { card } => format!("tap {} for mana", game.card_name(card)),
            GameAction::ActivateAbility { card, index } => {
                format!("activate {} ability #{}", game.card_name(card), index + 1)
            }
            GameAction::ActivateLoyalty { card, index } => {
                format!("activate {} loyalty ability #{}", game.card_name(card), index + 1)
            }
            GameAction::Fetch { card } => format!("crack {}", game.card_name(card)),
            GameAction::Cycle { card } => format!("cycle {}", game.card_name(card)),
            GameAction::Ninjutsu { ninja, attacker } => format!(
                "ninjutsu {} in for {}",
                game.card_name(ninja),
                game.card_name(attacker)
            ),
        }
    }
}

/// What dispatching an action did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// The action happened
    Done,
    /// The player passed priority
    Passed,
    /// A cast was started or paid into but still owes Phyrexian mana
    AwaitingPayment,
    /// The action was illegal; nothing changed
    Rejected(String),
}

/// A spell in the middle of being cast
///
/// The card stays in its zone until `CompleteCast`; everything paid so
/// far is recorded so `CancelCast` can refund it exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCast {
    pub card: CardId,
    pub controller: PlayerId,
    pub method: CastMethod,
    pub targets: ChosenTargets,
    pub paid: ManaPayment,
    pub life_paid: i32,
    /// Phyrexian symbols still owed, WUBRG
    pub remaining_phyrexian: [u8; 5],
}

impl PendingCast {
    pub fn remaining(&self, color: Color) -> u8 {
        match color {
            Color::Colorless => 0,
            c => self.remaining_phyrexian[c.index()],
        }
    }

    pub fn is_fully_paid(&self) -> bool {
        self.remaining_phyrexian.iter().all(|&n| n == 0)
    }

    /// The Phyrexian symbols still owed, as a cost
    pub fn remaining_cost(&self) -> ManaCost {
        ManaCost {
            phyrexian: self.remaining_phyrexian,
            ..ManaCost::default()
        }
    }
}

impl fmt::Display for PendingCast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "casting {} (paid {}", self.card, self.paid)?;
        if self.life_paid > 0 {
            write!(f, " and {} life", self.life_paid)?;
        }
        write!(f, ", owes {})", self.remaining_cost())
    }
}

impl GameState {
    /// Deal damage from a source to a player or permanent
    ///
    /// Lifelink, deathtouch and combat-damage triggers are applied here.
    /// Damage to a permanent that is no longer on the battlefield is lost.
    pub fn deal_damage(&mut self, source: CardId, target: TargetRef, amount: i32, combat: bool) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }
        let source_name = self.card_name(source);
        let dealt = match target {
            TargetRef::Player(player_id) => {
                self.get_player_mut(player_id)?.lose_life(amount);
                self.logger.normal(&format!(
                    "{} deals {} damage to {}",
                    source_name,
                    amount,
                    self.player_name(player_id)
                ));
                if combat {
                    self.fire_event(GameEvent::CombatDamageToPlayer {
                        source,
                        player: player_id,
                    });
                }
                true
            }
            TargetRef::Permanent(card_id) if self.battlefield.contains(card_id) => {
                let deathtouch = self.has_keyword(source, Keyword::Deathtouch);
                let target_name = self.card_name(card_id);
                let card = self.cards.get_mut(card_id)?;
                if card.is_creature() {
                    card.damage += amount;
                    card.deathtouch_damage |= deathtouch;
                }
                if card.is_planeswalker() {
                    card.remove_counters(crate::core::CounterType::Loyalty, amount);
                }
                self.logger
                    .normal(&format!("{source_name} deals {amount} damage to {target_name}"));
                true
            }
            _ => false,
        };

        if dealt && self.has_keyword(source, Keyword::Lifelink) {
            let controller = self.cards.get(source)?.controller;
            self.get_player_mut(controller)?.gain_life(amount);
        }
        Ok(())
    }

    /// Play a land from hand (legality already checked)
    pub fn play_land(&mut self, player_id: PlayerId, card_id: CardId) -> Result<()> {
        if !self.hand(player_id).contains(&card_id) {
            return Err(MtgError::InvalidAction(format!(
                "{} is not in hand",
                self.card_name(card_id)
            )));
        }
        self.get_player_mut(player_id)?.play_land();
        self.logger.normal(&format!(
            "{} plays {}",
            self.player_name(player_id),
            self.card_name(card_id)
        ));
        self.put_onto_battlefield(card_id, player_id, false)?;
        self.fire_event(GameEvent::LandPlayed {
            card: card_id,
            player: player_id,
        });
        Ok(())
    }

    /// Colors a permanent can tap for right now, empty if it cannot
    pub fn mana_options(&self, player_id: PlayerId, card_id: CardId) -> SmallVec<[Color; 5]> {
        let Ok(card) = self.cards.get(card_id) else {
            return SmallVec::new();
        };
        if card.controller != player_id
            || card.tapped
            || !self.battlefield.contains(card_id)
            || self.is_summoning_sick(card_id)
        {
            return SmallVec::new();
        }
        card.def()
            .map(|d| d.produces.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Tap a mana source for one mana of `color`
    ///
    /// Only the source's own mana is added here. Mana triggers of auras
    /// on the source are run by the engine, see `mana_triggers`.
    pub fn tap_for_mana(&mut self, player_id: PlayerId, card_id: CardId, color: Color) -> Result<()> {
        if !self.mana_options(player_id, card_id).contains(&color) {
            return Err(MtgError::InvalidAction(format!(
                "{} cannot produce {color}",
                self.card_name(card_id)
            )));
        }
        self.cards.get_mut(card_id)?.tap();
        self.get_player_mut(player_id)?.mana_pool.add_color(color);
        self.logger.verbose(&format!(
            "{} taps {} for {}",
            self.player_name(player_id),
            self.card_name(card_id),
            color
        ));
        Ok(())
    }

    /// "Whenever enchanted land is tapped for mana" abilities of the
    /// auras attached to `land`, in battlefield order
    pub fn mana_triggers(&self, land: CardId) -> Vec<(CardId, &'static AbilityDef)> {
        self.battlefield
            .iter()
            .filter_map(|aura| self.cards.get(aura).ok())
            .filter(|aura| aura.attached_to == Some(land))
            .filter_map(|aura| aura.def().map(|def| (aura.id, def)))
            .flat_map(|(aura, def)| {
                def.triggers
                    .iter()
                    .filter(|t| t.condition == TriggerCondition::EnchantedLandTappedForMana)
                    .map(move |t| (aura, &t.ability))
            })
            .collect()
    }

    /// Abandon the spell being cast: every mana and life point paid so
    /// far goes back, and the card stays where it was
    pub fn refund_pending_cast(&mut self) -> Result<()> {
        let Some(pending) = self.pending_cast.take() else {
            return Ok(());
        };
        let player = self.get_player_mut(pending.controller)?;
        player.mana_pool.refund(&pending.paid);
        player.gain_life(pending.life_paid);
        self.logger.normal(&format!(
            "{} stops casting {}",
            self.player_name(pending.controller),
            self.card_name(pending.card)
        ));
        Ok(())
    }

    /// Counter a spell: off the stack to the graveyard, or exile if it
    /// was cast with flashback
    pub fn counter_spell(&mut self, card_id: CardId) -> Result<()> {
        let entry = self.stack.remove_spell(card_id).ok_or_else(|| {
            MtgError::InvalidAction("cannot counter a spell that is not on the stack".to_string())
        })?;
        let destination = match entry.item {
            crate::game::StackItem::Spell {
                method: CastMethod::Flashback,
                ..
            } => Zone::Exile,
            _ => Zone::Graveyard,
        };
        self.logger.normal(&format!("{} is countered", self.card_name(card_id)));
        self.move_card(card_id, destination)
    }
}
