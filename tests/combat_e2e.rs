//! Combat end to end
//!
//! Whole games through `run_game` with creatures placed before the first
//! turn, plus ninjutsu driven through `dispatch` mid-combat.

use mtg_sim::cards::{lookup_id, DefinitionId};
use mtg_sim::core::{CardId, Color, PlayerId};
use mtg_sim::game::{
    create_game, ActionOutcome, GameAction, GameConfig, GameEndReason, GameEngine, GameOutcome, HeuristicController,
    PassController, PlayerController, PlayerSetup, ScriptedController, Step,
};
use mtg_sim::zones::Zone;

fn library(name: &str) -> Vec<DefinitionId> {
    vec![lookup_id(name).unwrap(); 40]
}

fn game(alice: Box<dyn PlayerController>, bob: Box<dyn PlayerController>, max_turns: u32) -> (GameEngine, PlayerId, PlayerId) {
    let players = vec![
        PlayerSetup::new("Alice", library("Plains"), alice),
        PlayerSetup::new("Bob", library("Forest"), bob),
    ];
    let config = GameConfig::default().with_seed(7).with_max_turns(max_turns);
    let engine = create_game(config, players).unwrap();
    let ids = engine.player_ids();
    (engine, ids[0], ids[1])
}

fn creature(engine: &mut GameEngine, name: &str, controller: PlayerId) -> CardId {
    let card = engine.state.create_card(lookup_id(name).unwrap(), controller);
    engine.state.put_onto_battlefield(card, controller, false).unwrap();
    card
}

// ============================================================================
// Bot games
// ============================================================================

#[tokio::test]
async fn test_lifelink_flyer_wins_the_race_alone() {
    let (mut engine, alice, bob) = game(Box::new(HeuristicController::new()), Box::new(PassController::new()), 60);
    creature(&mut engine, "Vault Skirge", alice);

    let result = engine.run_game().await.unwrap();
    assert_eq!(result.winner, Some(alice));
    assert_eq!(engine.is_game_over(), GameOutcome::Winner(alice));
    assert_eq!(result.end_reason, Some(GameEndReason::LifeTotal));
    // Summoning sick on turn 1, then one hit on each of Alice's turns
    assert_eq!(result.turns_played, 41);
    assert_eq!(engine.state.get_player(alice).unwrap().life, 40);
    assert!(engine.state.get_player(bob).unwrap().life <= 0);
}

#[tokio::test]
async fn test_flyer_ignores_ground_blocker() {
    let (mut engine, alice, bob) = game(
        Box::new(HeuristicController::new()),
        Box::new(HeuristicController::new()),
        60,
    );
    creature(&mut engine, "Serra Angel", alice);
    let bears = creature(&mut engine, "Grizzly Bears", bob);

    let result = engine.run_game().await.unwrap();
    assert_eq!(result.winner, Some(alice));
    let messages = engine.state.logger.messages();
    assert!(messages.iter().any(|m| m == "Alice attacks with Serra Angel"));
    assert!(!messages
        .iter()
        .any(|m| m.starts_with(&format!("{} blocks", engine.state.card_name(bears)))));
}

#[tokio::test]
async fn test_outclassed_creature_ends_in_graveyard() {
    let (mut engine, alice, bob) = game(
        Box::new(HeuristicController::new()),
        Box::new(HeuristicController::new()),
        60,
    );
    creature(&mut engine, "Hill Giant", alice);
    let lions = creature(&mut engine, "Savannah Lions", bob);
    engine.state.get_player_mut(bob).unwrap().life = 3;

    // Either the Lions chump the lethal Giant or trade into it on defense
    let result = engine.run_game().await.unwrap();
    assert_eq!(result.winner, Some(alice));
    assert_eq!(engine.state.zone_of(lions), Some(Zone::Graveyard));
}

// ============================================================================
// Scripted combat
// ============================================================================

#[tokio::test]
async fn test_first_strike_kills_blocker_before_it_strikes_back() {
    let (mut engine, alice, bob) = game(Box::new(ScriptedController::new()), Box::new(ScriptedController::new()), 3);
    let legionnaire = creature(&mut engine, "Porcelain Legionnaire", alice);
    let bears = creature(&mut engine, "Grizzly Bears", bob);

    let mut alice_script = ScriptedController::new();
    alice_script.push_attackers(&[legionnaire]);
    engine.set_controller(alice, Box::new(alice_script)).unwrap();
    let mut bob_script = ScriptedController::new();
    bob_script.push_blocks(&[(bears, legionnaire)]);
    engine.set_controller(bob, Box::new(bob_script)).unwrap();

    let result = engine.run_game().await.unwrap();
    assert_eq!(result.end_reason, Some(GameEndReason::TurnLimit));
    assert_eq!(engine.state.zone_of(bears), Some(Zone::Graveyard));
    assert_eq!(engine.state.zone_of(legionnaire), Some(Zone::Battlefield));
    assert_eq!(engine.state.get_player(bob).unwrap().life, 20);
}

#[tokio::test]
async fn test_trample_over_deathtouch_blocker() {
    let (mut engine, alice, bob) = game(Box::new(ScriptedController::new()), Box::new(ScriptedController::new()), 3);
    let tanadon = creature(&mut engine, "Thundering Tanadon", alice);
    let rats = creature(&mut engine, "Typhoid Rats", bob);

    let mut alice_script = ScriptedController::new();
    alice_script.push_attackers(&[tanadon]);
    engine.set_controller(alice, Box::new(alice_script)).unwrap();
    let mut bob_script = ScriptedController::new();
    bob_script.push_blocks(&[(rats, tanadon)]);
    engine.set_controller(bob, Box::new(bob_script)).unwrap();

    engine.run_game().await.unwrap();
    assert_eq!(engine.state.get_player(bob).unwrap().life, 16);
    assert_eq!(engine.state.zone_of(rats), Some(Zone::Graveyard));
    assert_eq!(engine.state.zone_of(tanadon), Some(Zone::Graveyard));
}

#[tokio::test]
async fn test_one_blocker_cannot_block_twice() {
    let (mut engine, alice, bob) = game(Box::new(ScriptedController::new()), Box::new(ScriptedController::new()), 3);
    let lions = creature(&mut engine, "Savannah Lions", alice);
    let bears = creature(&mut engine, "Grizzly Bears", alice);
    let spider = creature(&mut engine, "Giant Spider", bob);

    let mut alice_script = ScriptedController::new();
    alice_script.push_attackers(&[lions, bears]);
    engine.set_controller(alice, Box::new(alice_script)).unwrap();
    let mut bob_script = ScriptedController::new();
    bob_script.push_blocks(&[(spider, lions), (spider, bears)]);
    engine.set_controller(bob, Box::new(bob_script)).unwrap();

    engine.run_game().await.unwrap();
    // The Spider blocks the Lions only; the Bears connect
    assert_eq!(engine.state.zone_of(lions), Some(Zone::Graveyard));
    assert_eq!(engine.state.get_player(bob).unwrap().life, 18);
    let rejections = engine.state.logger.rejections();
    assert!(rejections.iter().any(|m| m.contains("cannot block Grizzly Bears with Giant Spider")));
}

// ============================================================================
// Ninjutsu
// ============================================================================

/// Alice attacking with `attacker`, blockers declared, Alice to act
fn after_blocks(attacker: &str, blocked: bool) -> (GameEngine, PlayerId, CardId, CardId) {
    let (mut engine, alice, bob) = game(Box::new(ScriptedController::new()), Box::new(ScriptedController::new()), 60);
    let attacking = creature(&mut engine, attacker, alice);
    engine.state.turn.turn_number = 3;
    engine.state.turn.active_player = alice;
    engine.state.turn.current_step = Step::DeclareBlockers;
    engine.state.turn.priority_player = Some(alice);
    engine.state.cards.get_mut(attacking).unwrap().tap();
    engine.state.combat.declare_attacker(attacking, bob);
    if blocked {
        let wall = creature(&mut engine, "Wall of Omens", bob);
        engine.state.combat.declare_blocker(wall, attacking);
    }
    engine.state.combat.blockers_declared = true;

    let ninja = engine.state.add_to_hand(lookup_id("Ninja of the Deep Hours").unwrap(), alice).unwrap();
    let pool = &mut engine.state.get_player_mut(alice).unwrap().mana_pool;
    pool.add(Color::Blue, 1);
    pool.add(Color::White, 1);
    (engine, alice, attacking, ninja)
}

#[tokio::test]
async fn test_ninjutsu_swaps_an_unblocked_attacker() {
    let (mut engine, alice, attacker, ninja) = after_blocks("Savannah Lions", false);
    let bob = engine.player_ids()[1];

    let outcome = engine.dispatch(alice, GameAction::Ninjutsu { ninja, attacker }).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Done);
    assert_eq!(engine.state.zone_of(attacker), Some(Zone::Hand));
    assert_eq!(engine.state.zone_of(ninja), Some(Zone::Battlefield));
    assert!(engine.state.combat.is_attacking(ninja));
    assert!(engine.state.cards.get(ninja).unwrap().tapped);
    assert!(engine.state.get_player(alice).unwrap().mana_pool.is_empty());

    engine.state.assign_combat_damage(false).unwrap();
    assert_eq!(engine.state.get_player(bob).unwrap().life, 18);
    assert!(!engine.state.pending_triggers.is_empty());
}

#[tokio::test]
async fn test_ninjutsu_rejected_on_blocked_attacker() {
    let (mut engine, alice, attacker, ninja) = after_blocks("Savannah Lions", true);
    let outcome = engine.dispatch(alice, GameAction::Ninjutsu { ninja, attacker }).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Rejected(_)));
    assert_eq!(engine.state.zone_of(ninja), Some(Zone::Hand));
    assert!(engine.state.combat.is_attacking(attacker));
}
