//! Card definitions and the curated registry

pub mod definition;
pub mod registry;

pub use definition::{
    ActivatedAbilityDef, AlternateCost, CardDefinition, Cost, CostScope, DefinitionId, LoyaltyAbilityDef,
    StaticAbility, TriggerCondition, TriggeredAbilityDef,
};
pub use registry::{all_definitions, definition, lookup, lookup_id, normalize_name};
