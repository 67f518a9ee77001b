//! End-to-end engine scenarios
//!
//! Each test builds a game through the public API, puts cards where the
//! scenario needs them, and drives it with `dispatch` / `resolve_top`.

use mtg_sim::cards::lookup_id;
use mtg_sim::core::{CardId, Color, PlayerId, TargetRef};
use mtg_sim::game::{
    create_game, ActionOutcome, CancelToken, CastMethod, GameAction, GameConfig, GameEngine, GameOutcome, GameStateView,
    HeuristicController, PassController, PlayerController, PlayerSetup, ScriptedController, Step,
};
use mtg_sim::zones::Zone;
use mtg_sim::MtgError;
use similar_asserts::assert_eq;

fn deck(name: &str, count: usize) -> Vec<mtg_sim::cards::DefinitionId> {
    vec![lookup_id(name).unwrap(); count]
}

/// Alice to act in her first main phase; both libraries hold `library`
fn engine_with(library: &str) -> (GameEngine, PlayerId, PlayerId) {
    let players = vec![
        PlayerSetup::new("Alice", deck(library, 20), Box::new(ScriptedController::new())),
        PlayerSetup::new("Bob", deck(library, 20), Box::new(ScriptedController::new())),
    ];
    let mut engine = create_game(GameConfig::default(), players).unwrap();
    let ids = engine.player_ids();
    engine.state.turn.active_player = ids[0];
    engine.state.turn.current_step = Step::Main1;
    engine.state.turn.priority_player = Some(ids[0]);
    (engine, ids[0], ids[1])
}

fn on_battlefield(engine: &mut GameEngine, name: &str, owner: PlayerId) -> CardId {
    let card = engine.state.create_card(lookup_id(name).unwrap(), owner);
    engine.state.put_onto_battlefield(card, owner, false).unwrap();
    card
}

fn in_hand(engine: &mut GameEngine, name: &str, owner: PlayerId) -> CardId {
    engine.state.add_to_hand(lookup_id(name).unwrap(), owner).unwrap()
}

fn cast(card: CardId) -> GameAction {
    GameAction::CastSpell {
        card,
        method: CastMethod::Normal,
    }
}

/// Let `bot` act for `player` until it passes
async fn drive(engine: &mut GameEngine, bot: &mut HeuristicController, player: PlayerId) -> Vec<GameAction> {
    let mut taken = Vec::new();
    for _ in 0..10 {
        let legal = engine.legal_actions(player);
        let action = {
            let view = GameStateView::new(&engine.state, player);
            bot.choose_action(&view, &legal).await
        };
        if action == GameAction::PassPriority {
            break;
        }
        let outcome = engine.dispatch(player, action.clone()).await.unwrap();
        assert!(!matches!(outcome, ActionOutcome::Rejected(_)), "{action:?} was rejected");
        taken.push(action);
    }
    taken
}

// ============================================================================
// Bot sequencing
// ============================================================================

#[tokio::test]
async fn test_bot_plays_land_taps_and_casts_one_drop() {
    let (mut engine, p1, _) = engine_with("Mountain");
    let mountain = in_hand(&mut engine, "Mountain", p1);
    let swiftspear = in_hand(&mut engine, "Monastery Swiftspear", p1);

    let mut bot = HeuristicController::new();
    let taken = drive(&mut engine, &mut bot, p1).await;
    assert_eq!(
        taken,
        vec![
            GameAction::PlayLand { card: mountain },
            GameAction::TapForMana { card: mountain },
            cast(swiftspear),
        ]
    );

    assert!(engine.resolve_top().await.unwrap());
    assert_eq!(engine.state.zone_of(swiftspear), Some(Zone::Battlefield));
    assert_eq!(engine.state.get_player(p1).unwrap().mana_pool.total(), 0);
}

#[tokio::test]
async fn test_bot_taps_existing_land_when_land_drop_is_used() {
    let (mut engine, p1, _) = engine_with("Mountain");
    let mountain = on_battlefield(&mut engine, "Mountain", p1);
    engine.state.get_player_mut(p1).unwrap().play_land();
    let goblin = in_hand(&mut engine, "Raging Goblin", p1);

    let mut bot = HeuristicController::new();
    let taken = drive(&mut engine, &mut bot, p1).await;
    assert_eq!(taken, vec![GameAction::TapForMana { card: mountain }, cast(goblin)]);

    engine.resolve_top().await.unwrap();
    assert_eq!(engine.state.zone_of(goblin), Some(Zone::Battlefield));
    assert!(engine.state.get_player(p1).unwrap().mana_pool.is_empty());
}

// ============================================================================
// Stack behavior
// ============================================================================

#[tokio::test]
async fn test_stack_is_lifo_and_triggers_jump_ahead() {
    let (mut engine, p1, p2) = engine_with("Plains");
    let lynx = on_battlefield(&mut engine, "Steppe Lynx", p1);
    let heath = on_battlefield(&mut engine, "Windswept Heath", p1);
    let bolt = in_hand(&mut engine, "Lightning Bolt", p1);
    let plains = engine.state.get_player_zones(p1).unwrap().library.cards[0];

    let mut alice = ScriptedController::new();
    alice.push_target(Some(TargetRef::Player(p2)));
    alice.push_card(Some(plains));
    engine.set_controller(p1, Box::new(alice)).unwrap();

    // A: Bolt, then B: the fetch ability on top of it
    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::Red, 1);
    assert_eq!(engine.dispatch(p1, cast(bolt)).await.unwrap(), ActionOutcome::Done);
    assert_eq!(
        engine.dispatch(p1, GameAction::Fetch { card: heath }).await.unwrap(),
        ActionOutcome::Done
    );
    assert_eq!(engine.state.stack.len(), 2);
    assert!(engine.state.stack.top().unwrap().is_ability());

    // B resolves first; the Plains it fetches triggers the Lynx (C) above A
    engine.resolve_top().await.unwrap();
    assert_eq!(engine.state.zone_of(plains), Some(Zone::Battlefield));
    assert_eq!(engine.state.stack.len(), 2);
    assert_eq!(engine.state.stack.top().unwrap().source(), lynx);

    engine.resolve_top().await.unwrap();
    assert_eq!(engine.state.power(lynx), 2);
    assert_eq!(engine.state.get_player(p2).unwrap().life, 20);

    engine.resolve_top().await.unwrap();
    assert!(engine.state.stack.is_empty());
    assert_eq!(engine.state.get_player(p2).unwrap().life, 17);
    assert_eq!(engine.state.get_player(p1).unwrap().life, 19);
}

#[tokio::test]
async fn test_counterspell_answers_bolt() {
    let (mut engine, p1, p2) = engine_with("Island");
    let bolt = in_hand(&mut engine, "Lightning Bolt", p1);
    let counterspell = in_hand(&mut engine, "Counterspell", p2);

    let mut alice = ScriptedController::new();
    alice.push_target(Some(TargetRef::Player(p2)));
    engine.set_controller(p1, Box::new(alice)).unwrap();
    let mut bob = ScriptedController::new();
    bob.push_target(Some(TargetRef::Spell(bolt)));
    engine.set_controller(p2, Box::new(bob)).unwrap();

    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::Red, 1);
    engine.dispatch(p1, cast(bolt)).await.unwrap();

    engine.state.turn.priority_player = Some(p2);
    engine.state.get_player_mut(p2).unwrap().mana_pool.add(Color::Blue, 2);
    assert_eq!(engine.dispatch(p2, cast(counterspell)).await.unwrap(), ActionOutcome::Done);

    engine.resolve_top().await.unwrap();
    assert!(engine.state.stack.is_empty());
    assert_eq!(engine.state.zone_of(bolt), Some(Zone::Graveyard));
    assert_eq!(engine.state.zone_of(counterspell), Some(Zone::Graveyard));
    assert_eq!(engine.state.get_player(p2).unwrap().life, 20);
}

#[tokio::test]
async fn test_pump_fizzles_when_its_target_dies_first() {
    let (mut engine, p1, p2) = engine_with("Forest");
    let bears = on_battlefield(&mut engine, "Grizzly Bears", p1);
    let growth = in_hand(&mut engine, "Giant Growth", p1);
    let bolt = in_hand(&mut engine, "Lightning Bolt", p2);

    let mut alice = ScriptedController::new();
    alice.push_target(Some(TargetRef::Permanent(bears)));
    engine.set_controller(p1, Box::new(alice)).unwrap();
    let mut bob = ScriptedController::new();
    bob.push_target(Some(TargetRef::Permanent(bears)));
    engine.set_controller(p2, Box::new(bob)).unwrap();

    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::Green, 1);
    engine.dispatch(p1, cast(growth)).await.unwrap();
    engine.state.turn.priority_player = Some(p2);
    engine.state.get_player_mut(p2).unwrap().mana_pool.add(Color::Red, 1);
    engine.dispatch(p2, cast(bolt)).await.unwrap();

    engine.resolve_top().await.unwrap();
    assert_eq!(engine.state.zone_of(bears), Some(Zone::Graveyard));

    engine.resolve_top().await.unwrap();
    assert_eq!(engine.state.zone_of(growth), Some(Zone::Graveyard));
    let messages = engine.state.logger.messages();
    assert!(messages.iter().any(|m| m.contains("Giant Growth has no legal targets left")));
}

// ============================================================================
// Illegal intent and contract violations
// ============================================================================

#[tokio::test]
async fn test_rejected_intent_changes_nothing() {
    let (mut engine, p1, p2) = engine_with("Mountain");
    let firebolt = in_hand(&mut engine, "Firebolt", p1);
    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::Red, 1);

    // A sorcery on the opponent's turn
    engine.state.turn.active_player = p2;
    let before = serde_json::to_value(&engine.state).unwrap();
    let outcome = engine.dispatch(p1, cast(firebolt)).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Rejected(_)));
    let after = serde_json::to_value(&engine.state).unwrap();
    assert_eq!(before, after);

    // Not holding priority at all
    engine.state.turn.active_player = p1;
    let outcome = engine.dispatch(p2, GameAction::PassPriority).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Rejected(_)));
}

#[tokio::test]
async fn test_cancelled_game_unwinds_with_cancelled() {
    let players = vec![
        PlayerSetup::new("Alice", deck("Forest", 40), Box::new(PassController::new())),
        PlayerSetup::new("Bob", deck("Forest", 40), Box::new(PassController::new())),
    ];
    let token = CancelToken::new();
    let mut engine = create_game(GameConfig::default(), players)
        .unwrap()
        .with_cancel_token(token.clone());
    token.cancel();

    let result = engine.run_game().await;
    assert!(matches!(result, Err(MtgError::Cancelled)));
    assert!(engine.state.pending_cast.is_none());
    assert_eq!(engine.is_game_over(), GameOutcome::InProgress);
}
