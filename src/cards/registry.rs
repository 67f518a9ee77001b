//! The curated card library
//!
//! A process-wide table built once on first use. Lookups are pure and
//! accent/case-insensitive ("Jotun Grunt" finds "Jötun Grunt").

use crate::cards::definition::{
    AlternateCost, CardDefinition, Cost, CostScope, DefinitionId, StaticAbility, TriggerCondition,
};
use crate::core::{
    AbilityDef, CardFilter, Chooser, Color, DelayedWhen, Effect, Keyword, LandType,
    ManaCost, PlayerRef, SearchDestination, Subject, TargetFilter, TargetSpec, TokenSpec,
};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// All definitions plus a normalized-name index
pub struct CardRegistry {
    definitions: Vec<CardDefinition>,
    by_name: FxHashMap<String, DefinitionId>,
}

static REGISTRY: Lazy<CardRegistry> = Lazy::new(CardRegistry::build);

/// Normalize a card name for lookup: ASCII-fold, lowercase, trim
pub fn normalize_name(name: &str) -> String {
    deunicode::deunicode(name.trim()).to_lowercase()
}

/// Look up a definition by name
pub fn lookup(name: &str) -> Option<&'static CardDefinition> {
    REGISTRY.by_name.get(&normalize_name(name)).map(|&id| &REGISTRY.definitions[id.0 as usize])
}

/// Look up a definition's registry index by name
pub fn lookup_id(name: &str) -> Option<DefinitionId> {
    REGISTRY.by_name.get(&normalize_name(name)).copied()
}

/// Resolve a registry index
pub fn definition(id: DefinitionId) -> Option<&'static CardDefinition> {
    REGISTRY.definitions.get(id.0 as usize)
}

pub fn all_definitions() -> &'static [CardDefinition] {
    &REGISTRY.definitions
}

impl CardRegistry {
    fn build() -> Self {
        let definitions = curated_cards();
        let by_name = definitions
            .iter()
            .enumerate()
            .map(|(i, def)| (normalize_name(def.name), DefinitionId(i as u16)))
            .collect();
        CardRegistry {
            definitions,
            by_name,
        }
    }
}

fn any_target() -> TargetSpec {
    TargetSpec::harmful(TargetFilter::AnyTarget)
}

fn damage(amount: i32) -> AbilityDef {
    AbilityDef::new(vec![Effect::DealDamage { target: 0, amount }]).targeting(any_target())
}

fn draw(count: u32) -> AbilityDef {
    AbilityDef::new(vec![Effect::DrawCards {
        player: PlayerRef::You,
        count,
    }])
}

fn counter_target(filter: TargetFilter) -> AbilityDef {
    AbilityDef::new(vec![Effect::Counter { target: 0 }]).targeting(TargetSpec::harmful(filter))
}

fn counter_unless(amount: u8) -> AbilityDef {
    AbilityDef::new(vec![Effect::CounterUnlessPays { target: 0, amount }])
        .targeting(TargetSpec::harmful(TargetFilter::Spell))
}

fn pump_self(power: i32, toughness: i32) -> AbilityDef {
    AbilityDef::new(vec![Effect::Pump {
        subject: Subject::Source,
        power,
        toughness,
    }])
}

fn tokens(name: &str, color: Color, count: u32) -> AbilityDef {
    AbilityDef::new(vec![Effect::CreateTokens {
        token: TokenSpec::creature(name, color, 1, 1),
        count,
    }])
}

fn curated_cards() -> Vec<CardDefinition> {
    let mut cards = Vec::new();
    cards.extend(lands());
    cards.extend(creatures());
    cards.extend(spells());
    cards.extend(other_permanents());
    cards
}

fn lands() -> Vec<CardDefinition> {
    vec![
        CardDefinition::land("Plains", &["Plains"]),
        CardDefinition::land("Island", &["Island"]),
        CardDefinition::land("Swamp", &["Swamp"]),
        CardDefinition::land("Mountain", &["Mountain"]),
        CardDefinition::land("Forest", &["Forest"]),
        CardDefinition::land("Tundra", &["Plains", "Island"]),
        CardDefinition::land("Underground Sea", &["Island", "Swamp"]),
        CardDefinition::land("Badlands", &["Swamp", "Mountain"]),
        CardDefinition::land("Taiga", &["Mountain", "Forest"]),
        CardDefinition::land("Savannah", &["Forest", "Plains"]),
        CardDefinition::land("Scrubland", &["Plains", "Swamp"]),
        CardDefinition::land("Volcanic Island", &["Island", "Mountain"]),
        CardDefinition::land("Bayou", &["Swamp", "Forest"]),
        CardDefinition::land("Plateau", &["Mountain", "Plains"]),
        CardDefinition::land("Tropical Island", &["Forest", "Island"]),
        CardDefinition::land("Flooded Strand", &[]).fetches(&[LandType::Plains, LandType::Island]),
        CardDefinition::land("Polluted Delta", &[]).fetches(&[LandType::Island, LandType::Swamp]),
        CardDefinition::land("Bloodstained Mire", &[]).fetches(&[LandType::Swamp, LandType::Mountain]),
        CardDefinition::land("Wooded Foothills", &[]).fetches(&[LandType::Mountain, LandType::Forest]),
        CardDefinition::land("Windswept Heath", &[]).fetches(&[LandType::Forest, LandType::Plains]),
        CardDefinition::land("Forgotten Cave", &[])
            .produces(&[Color::Red])
            .enters_tapped()
            .cycling(Cost::mana("{R}")),
        CardDefinition::land("Lonely Sandbar", &[])
            .produces(&[Color::Blue])
            .enters_tapped()
            .cycling(Cost::mana("{U}")),
    ]
}

fn creatures() -> Vec<CardDefinition> {
    use TriggerCondition::*;
    vec![
        CardDefinition::creature("Savannah Lions", "{W}", 2, 1).subtypes(&["Cat"]),
        CardDefinition::creature("Grizzly Bears", "{1}{G}", 2, 2).subtypes(&["Bear"]),
        CardDefinition::creature("Hill Giant", "{3}{R}", 3, 3).subtypes(&["Giant"]),
        CardDefinition::creature("Craw Wurm", "{4}{G}{G}", 6, 4).subtypes(&["Wurm"]),
        CardDefinition::creature("Colossal Dreadmaw", "{4}{G}{G}", 6, 6)
            .subtypes(&["Dinosaur"])
            .keyword(Keyword::Trample),
        CardDefinition::creature("Serra Angel", "{3}{W}{W}", 4, 4)
            .subtypes(&["Angel"])
            .keyword(Keyword::Flying)
            .keyword(Keyword::Vigilance),
        CardDefinition::creature("Air Elemental", "{3}{U}{U}", 4, 4)
            .subtypes(&["Elemental"])
            .keyword(Keyword::Flying),
        CardDefinition::creature("Shivan Dragon", "{4}{R}{R}", 5, 5)
            .subtypes(&["Dragon"])
            .keyword(Keyword::Flying)
            .activated(Cost::mana("{R}"), pump_self(1, 0)),
        CardDefinition::creature("Giant Spider", "{3}{G}", 2, 4)
            .subtypes(&["Spider"])
            .keyword(Keyword::Reach),
        CardDefinition::creature("Raging Goblin", "{R}", 1, 1)
            .subtypes(&["Goblin", "Berserker"])
            .keyword(Keyword::Haste),
        CardDefinition::creature("Youthful Knight", "{1}{W}", 2, 1)
            .subtypes(&["Human", "Knight"])
            .keyword(Keyword::FirstStrike),
        CardDefinition::creature("Typhoid Rats", "{B}", 1, 1)
            .subtypes(&["Rat"])
            .keyword(Keyword::Deathtouch),
        CardDefinition::creature("Vampire Nighthawk", "{1}{B}{B}", 2, 3)
            .subtypes(&["Vampire", "Shaman"])
            .keyword(Keyword::Flying)
            .keyword(Keyword::Deathtouch)
            .keyword(Keyword::Lifelink),
        CardDefinition::creature("Ball Lightning", "{R}{R}{R}", 6, 1)
            .subtypes(&["Elemental"])
            .keyword(Keyword::Trample)
            .keyword(Keyword::Haste)
            .trigger(
                EntersBattlefield,
                AbilityDef::new(vec![Effect::Delayed {
                    when: DelayedWhen::NextEndStep,
                    effects: vec![Effect::SacrificeSource],
                }]),
            ),
        CardDefinition::creature("Monastery Swiftspear", "{R}", 1, 2)
            .subtypes(&["Human", "Monk"])
            .keyword(Keyword::Haste)
            .trigger(YouCastNoncreatureSpell, pump_self(1, 1)),
        CardDefinition::creature("Steppe Lynx", "{W}", 0, 1)
            .subtypes(&["Cat"])
            .trigger(LandEntersUnderYourControl, pump_self(2, 2)),
        CardDefinition::creature("Llanowar Elves", "{G}", 1, 1)
            .subtypes(&["Elf", "Druid"])
            .produces(&[Color::Green]),
        CardDefinition::creature("Birds of Paradise", "{G}", 0, 1)
            .subtypes(&["Bird"])
            .keyword(Keyword::Flying)
            .produces(&Color::COLORED),
        CardDefinition::creature("Prodigal Sorcerer", "{2}{U}", 1, 1)
            .subtypes(&["Human", "Wizard"])
            .activated(Cost::tap(), damage(1)),
        CardDefinition::creature("Mogg Fanatic", "{R}", 1, 1)
            .subtypes(&["Goblin"])
            .activated(Cost::sacrifice(), damage(1)),
        CardDefinition::creature("Wall of Omens", "{1}{W}", 0, 4)
            .subtypes(&["Wall"])
            .keyword(Keyword::Defender)
            .trigger(EntersBattlefield, draw(1)),
        CardDefinition::creature("Elvish Visionary", "{1}{G}", 1, 1)
            .subtypes(&["Elf", "Shaman"])
            .trigger(EntersBattlefield, draw(1)),
        CardDefinition::creature("Gravedigger", "{3}{B}", 2, 2)
            .subtypes(&["Zombie"])
            .trigger(
                EntersBattlefield,
                AbilityDef::new(vec![Effect::ReturnToHand { target: 0 }]).targeting(
                    TargetSpec::beneficial(TargetFilter::CreatureCardInYourGraveyard).optional(),
                ),
            ),
        CardDefinition::creature("Festering Goblin", "{B}", 1, 1)
            .subtypes(&["Zombie", "Goblin"])
            .trigger(
                Dies,
                AbilityDef::new(vec![Effect::Pump {
                    subject: Subject::Target(0),
                    power: -1,
                    toughness: -1,
                }])
                .targeting(TargetSpec::harmful(TargetFilter::Creature)),
            ),
        CardDefinition::creature("Dark Confidant", "{1}{B}", 2, 1)
            .subtypes(&["Human", "Wizard"])
            .trigger(YourUpkeep, AbilityDef::new(vec![Effect::RevealTopToHand])),
        CardDefinition::creature("Ninja of the Deep Hours", "{3}{U}", 2, 2)
            .subtypes(&["Human", "Ninja"])
            .ninjutsu("{1}{U}")
            .trigger(DealsCombatDamageToPlayer, draw(1)),
        CardDefinition::artifact_creature("Porcelain Legionnaire", "{2}{W/P}", 3, 1)
            .subtypes(&["Phyrexian", "Soldier"])
            .keyword(Keyword::FirstStrike),
        CardDefinition::artifact_creature("Vault Skirge", "{1}{B/P}", 1, 1)
            .subtypes(&["Phyrexian", "Bat"])
            .keyword(Keyword::Flying)
            .keyword(Keyword::Lifelink),
        CardDefinition::artifact_creature("Thundering Tanadon", "{4}{G/P}{G/P}", 5, 4)
            .subtypes(&["Phyrexian", "Beast"])
            .keyword(Keyword::Trample),
        CardDefinition::artifact_creature("Ornithopter", "{0}", 0, 2)
            .subtypes(&["Thopter"])
            .keyword(Keyword::Flying),
        CardDefinition::creature("Goblin Electromancer", "{U}{R}", 2, 2)
            .subtypes(&["Goblin", "Wizard"])
            .static_ability(StaticAbility::SpellsCostLess {
                amount: 1,
                scope: CostScope::YourInstantsAndSorceries,
            }),
        CardDefinition::creature("Street Wraith", "{3}{B}{B}", 3, 4)
            .subtypes(&["Wraith"])
            .cycling(Cost::life(2)),
    ]
}

fn spells() -> Vec<CardDefinition> {
    let creature = TargetSpec::harmful(TargetFilter::Creature);
    let nonblack = TargetSpec::harmful(TargetFilter::NonblackCreature);

    vec![
        // Burn
        CardDefinition::instant("Lightning Bolt", "{R}", damage(3)),
        CardDefinition::instant("Shock", "{R}", damage(2)),
        CardDefinition::instant("Gut Shot", "{R/P}", damage(1)),
        CardDefinition::sorcery("Firebolt", "{R}", damage(2)).flashback(Cost::mana("{4}{R}")),
        CardDefinition::sorcery(
            "Forked Bolt",
            "{R}",
            AbilityDef::new(vec![Effect::DivideDamage { amount: 2 }])
                .targeting(any_target())
                .targeting(any_target().optional()),
        ),
        CardDefinition::sorcery(
            "Arc Lightning",
            "{2}{R}",
            AbilityDef::new(vec![Effect::DivideDamage { amount: 3 }])
                .targeting(any_target())
                .targeting(any_target().optional())
                .targeting(any_target().optional()),
        ),
        // Counterspells
        CardDefinition::instant("Counterspell", "{U}{U}", counter_target(TargetFilter::Spell)),
        CardDefinition::instant("Negate", "{1}{U}", counter_target(TargetFilter::NoncreatureSpell)),
        CardDefinition::instant("Mana Leak", "{1}{U}", counter_unless(3)),
        CardDefinition::instant("Daze", "{1}{U}", counter_unless(1)).alternate(AlternateCost::ReturnLand {
            land_type: LandType::Island,
        }),
        CardDefinition::instant("Miscalculation", "{1}{U}", counter_unless(2)).cycling(Cost::mana("{2}")),
        CardDefinition::instant("Force of Will", "{3}{U}{U}", counter_target(TargetFilter::Spell)).alternate(
            AlternateCost::ExileCardFromHand {
                color: Color::Blue,
                life: 1,
            },
        ),
        CardDefinition::instant(
            "Pact of Negation",
            "{0}",
            AbilityDef::new(vec![
                Effect::Counter { target: 0 },
                Effect::Delayed {
                    when: DelayedWhen::YourNextUpkeep,
                    effects: vec![Effect::PayOrLose {
                        cost: ManaCost::of("{3}{U}{U}"),
                    }],
                },
            ])
            .targeting(TargetSpec::harmful(TargetFilter::Spell)),
        )
        .colors(&[Color::Blue]),
        // Removal
        CardDefinition::instant(
            "Doom Blade",
            "{1}{B}",
            AbilityDef::new(vec![Effect::Destroy { target: 0 }]).targeting(nonblack),
        ),
        CardDefinition::instant(
            "Snuff Out",
            "{3}{B}",
            AbilityDef::new(vec![Effect::Destroy { target: 0 }]).targeting(nonblack),
        )
        .alternate(AlternateCost::PayLife {
            life: 4,
            requires: LandType::Swamp,
        }),
        CardDefinition::instant(
            "Dismember",
            "{1}{B/P}{B/P}",
            AbilityDef::new(vec![Effect::Pump {
                subject: Subject::Target(0),
                power: -5,
                toughness: -5,
            }])
            .targeting(creature),
        ),
        CardDefinition::instant(
            "Swords to Plowshares",
            "{W}",
            AbilityDef::new(vec![
                Effect::GainLifeEqualToPower {
                    player: PlayerRef::ControllerOfTarget(0),
                    target: 0,
                },
                Effect::Exile { target: 0 },
            ])
            .targeting(creature),
        ),
        CardDefinition::instant(
            "Vapor Snag",
            "{U}",
            AbilityDef::new(vec![
                Effect::LoseLife {
                    player: PlayerRef::ControllerOfTarget(0),
                    amount: 1,
                },
                Effect::ReturnToHand { target: 0 },
            ])
            .targeting(creature),
        ),
        CardDefinition::instant(
            "Unsummon",
            "{U}",
            AbilityDef::new(vec![Effect::ReturnToHand { target: 0 }]).targeting(creature),
        ),
        CardDefinition::instant(
            "Diabolic Edict",
            "{1}{B}",
            AbilityDef::new(vec![Effect::SacrificeCreature {
                player: PlayerRef::Target(0),
            }])
            .targeting(TargetSpec::harmful(TargetFilter::Player)),
        ),
        // Tricks and mana
        CardDefinition::instant(
            "Giant Growth",
            "{G}",
            AbilityDef::new(vec![Effect::Pump {
                subject: Subject::Target(0),
                power: 3,
                toughness: 3,
            }])
            .targeting(TargetSpec::beneficial(TargetFilter::Creature)),
        ),
        CardDefinition::instant(
            "Jump",
            "{U}",
            AbilityDef::new(vec![Effect::GrantKeyword {
                subject: Subject::Target(0),
                keyword: Keyword::Flying,
            }])
            .targeting(TargetSpec::beneficial(TargetFilter::Creature)),
        ),
        CardDefinition::instant(
            "Dark Ritual",
            "{B}",
            AbilityDef::new(vec![Effect::AddMana {
                color: Color::Black,
                amount: 3,
            }]),
        ),
        CardDefinition::sorcery(
            "Rampant Growth",
            "{1}{G}",
            AbilityDef::new(vec![Effect::Search {
                filter: CardFilter::BasicLand,
                destination: SearchDestination::Battlefield { tapped: true },
            }]),
        ),
        // Card flow
        CardDefinition::instant(
            "Brainstorm",
            "{U}",
            AbilityDef::new(vec![Effect::DrawThenPutBack { draw: 3, put_back: 2 }]),
        ),
        CardDefinition::instant(
            "Fact or Fiction",
            "{3}{U}",
            AbilityDef::new(vec![Effect::RevealAndSplit { count: 5 }]),
        ),
        CardDefinition::sorcery(
            "Gitaxian Probe",
            "{U/P}",
            AbilityDef::new(vec![
                Effect::RevealHand {
                    player: PlayerRef::Target(0),
                },
                Effect::DrawCards {
                    player: PlayerRef::You,
                    count: 1,
                },
            ])
            .targeting(TargetSpec::harmful(TargetFilter::Player)),
        ),
        CardDefinition::sorcery(
            "Demonic Tutor",
            "{1}{B}",
            AbilityDef::new(vec![Effect::Search {
                filter: CardFilter::Any,
                destination: SearchDestination::Hand,
            }]),
        ),
        CardDefinition::sorcery("Divination", "{2}{U}", draw(2)),
        CardDefinition::instant("Think Twice", "{1}{U}", draw(1)).flashback(Cost::mana("{2}{U}")),
        CardDefinition::sorcery("Deep Analysis", "{3}{U}", draw(2)).flashback(Cost::mana("{1}{U}").plus_life(3)),
        CardDefinition::sorcery(
            "Faithless Looting",
            "{R}",
            AbilityDef::new(vec![
                Effect::DrawCards {
                    player: PlayerRef::You,
                    count: 2,
                },
                Effect::Discard {
                    player: PlayerRef::You,
                    count: 2,
                    chosen_by: Chooser::Affected,
                },
            ]),
        )
        .flashback(Cost::mana("{2}{R}")),
        CardDefinition::sorcery(
            "Mind Rot",
            "{2}{B}",
            AbilityDef::new(vec![Effect::Discard {
                player: PlayerRef::Target(0),
                count: 2,
                chosen_by: Chooser::Affected,
            }])
            .targeting(TargetSpec::harmful(TargetFilter::Player)),
        ),
        // Tokens and life
        CardDefinition::instant("Raise the Alarm", "{1}{W}", tokens("Soldier", Color::White, 2)),
        CardDefinition::sorcery("Dragon Fodder", "{1}{R}", tokens("Goblin", Color::Red, 2)),
        CardDefinition::instant(
            "Midnight Haunting",
            "{2}{W}",
            AbilityDef::new(vec![Effect::CreateTokens {
                token: TokenSpec::creature("Spirit", Color::White, 1, 1).with_keyword(Keyword::Flying),
                count: 2,
            }]),
        ),
        CardDefinition::instant(
            "Renewed Faith",
            "{2}{W}",
            AbilityDef::new(vec![Effect::GainLife {
                player: PlayerRef::You,
                amount: 6,
            }]),
        )
        .cycling(Cost::mana("{1}{W}")),
    ]
}

fn other_permanents() -> Vec<CardDefinition> {
    vec![
        CardDefinition::artifact("Helm of Awakening", "{2}").static_ability(StaticAbility::SpellsCostLess {
            amount: 1,
            scope: CostScope::AllSpells,
        }),
        CardDefinition::artifact("Horn of Greed", "{3}").trigger(
            TriggerCondition::AnyPlayerPlaysLand,
            AbilityDef::new(vec![Effect::DrawCards {
                player: PlayerRef::EventPlayer,
                count: 1,
            }]),
        ),
        CardDefinition::enchantment("Glorious Anthem", "{1}{W}{W}").static_ability(
            StaticAbility::CreaturesYouControlGet {
                power: 1,
                toughness: 1,
            },
        ),
        CardDefinition::enchantment("Fervor", "{2}{R}")
            .static_ability(StaticAbility::CreaturesYouControlHave(Keyword::Haste)),
        CardDefinition::enchantment("Phyrexian Arena", "{1}{B}{B}").trigger(
            TriggerCondition::YourUpkeep,
            AbilityDef::new(vec![
                Effect::DrawCards {
                    player: PlayerRef::You,
                    count: 1,
                },
                Effect::LoseLife {
                    player: PlayerRef::You,
                    amount: 1,
                },
            ]),
        ),
        CardDefinition::aura("Wild Growth", "{G}", TargetFilter::Land).trigger(
            TriggerCondition::EnchantedLandTappedForMana,
            AbilityDef::new(vec![Effect::AddMana {
                color: Color::Green,
                amount: 1,
            }]),
        ),
        CardDefinition::planeswalker("Jace Beleren", "{1}{U}{U}", 3)
            .subtypes(&["Jace"])
            .loyalty_ability(
                2,
                AbilityDef::new(vec![Effect::DrawCards {
                    player: PlayerRef::EachPlayer,
                    count: 1,
                }]),
            )
            .loyalty_ability(
                -1,
                AbilityDef::new(vec![Effect::DrawCards {
                    player: PlayerRef::Target(0),
                    count: 1,
                }])
                .targeting(TargetSpec::beneficial(TargetFilter::Player)),
            )
            .loyalty_ability(
                -10,
                AbilityDef::new(vec![Effect::Mill {
                    player: PlayerRef::Target(0),
                    count: 20,
                }])
                .targeting(TargetSpec::harmful(TargetFilter::Player)),
            ),
        CardDefinition::planeswalker("Liliana of the Veil", "{1}{B}{B}", 3)
            .subtypes(&["Liliana"])
            .loyalty_ability(
                1,
                AbilityDef::new(vec![Effect::Discard {
                    player: PlayerRef::EachPlayer,
                    count: 1,
                    chosen_by: Chooser::Affected,
                }]),
            )
            .loyalty_ability(
                -2,
                AbilityDef::new(vec![Effect::SacrificeCreature {
                    player: PlayerRef::Target(0),
                }])
                .targeting(TargetSpec::harmful(TargetFilter::Player)),
            ),
    ]
}
