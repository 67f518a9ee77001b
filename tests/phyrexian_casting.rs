//! The two-phase cast protocol for Phyrexian mana
//!
//! Casting a spell with `{C/P}` symbols pays the rest of the cost from
//! the pool and opens a mid-cast record. Each symbol is then paid with
//! one mana of its color or 2 life, and the cast either completes onto
//! the stack or is cancelled with every payment refunded.

use mtg_sim::cards::lookup_id;
use mtg_sim::core::{CardId, Color, ManaPool, PlayerId, TargetRef};
use mtg_sim::game::{
    create_game, ActionOutcome, CastMethod, GameAction, GameConfig, GameEngine, PlayerSetup, ScriptedController,
    Step,
};
use mtg_sim::zones::Zone;
use mtg_sim::MtgError;

fn engine() -> (GameEngine, PlayerId, PlayerId) {
    let library = vec![lookup_id("Island").unwrap(); 10];
    let players = vec![
        PlayerSetup::new("Alice", library.clone(), Box::new(ScriptedController::new())),
        PlayerSetup::new("Bob", library, Box::new(ScriptedController::new())),
    ];
    let mut engine = create_game(GameConfig::default(), players).unwrap();
    let ids = engine.player_ids();
    engine.state.turn.active_player = ids[0];
    engine.state.turn.current_step = Step::Main1;
    engine.state.turn.priority_player = Some(ids[0]);
    (engine, ids[0], ids[1])
}

fn in_hand(engine: &mut GameEngine, name: &str, owner: PlayerId) -> CardId {
    engine.state.add_to_hand(lookup_id(name).unwrap(), owner).unwrap()
}

fn on_battlefield(engine: &mut GameEngine, name: &str, owner: PlayerId) -> CardId {
    let card = engine.state.create_card(lookup_id(name).unwrap(), owner);
    engine.state.put_onto_battlefield(card, owner, false).unwrap();
    card
}

fn cast(card: CardId) -> GameAction {
    GameAction::CastSpell {
        card,
        method: CastMethod::Normal,
    }
}

fn pay(color: Color, with_life: bool) -> GameAction {
    GameAction::PayPhyrexian { color, with_life }
}

fn life(engine: &GameEngine, player: PlayerId) -> i32 {
    engine.state.get_player(player).unwrap().life
}

fn pool(engine: &GameEngine, player: PlayerId) -> ManaPool {
    engine.state.get_player(player).unwrap().mana_pool
}

#[tokio::test]
async fn test_pure_phyrexian_spell_cast_with_life() {
    let (mut engine, p1, p2) = engine();
    let probe = in_hand(&mut engine, "Gitaxian Probe", p1);
    let mut alice = ScriptedController::new();
    alice.push_target(Some(TargetRef::Player(p2)));
    engine.set_controller(p1, Box::new(alice)).unwrap();

    assert_eq!(engine.dispatch(p1, cast(probe)).await.unwrap(), ActionOutcome::AwaitingPayment);
    assert_eq!(engine.dispatch(p1, pay(Color::Blue, true)).await.unwrap(), ActionOutcome::AwaitingPayment);
    assert_eq!(engine.dispatch(p1, GameAction::CompleteCast).await.unwrap(), ActionOutcome::Done);
    assert_eq!(life(&engine, p1), 18);
    assert!(engine.state.stack.contains_spell(probe));

    let hand_before = engine.state.hand(p1).len();
    engine.resolve_top().await.unwrap();
    assert_eq!(engine.state.hand(p1).len(), hand_before + 1);
    assert_eq!(engine.state.zone_of(probe), Some(Zone::Graveyard));
}

#[tokio::test]
async fn test_only_payment_actions_while_mid_cast() {
    let (mut engine, p1, _) = engine();
    let swamp = on_battlefield(&mut engine, "Swamp", p1);
    let skirge = in_hand(&mut engine, "Vault Skirge", p1);
    in_hand(&mut engine, "Lightning Bolt", p1);
    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::Black, 1);

    engine.dispatch(p1, cast(skirge)).await.unwrap();
    let legal = engine.legal_actions(p1);
    assert!(!legal.is_empty());
    assert!(legal.iter().all(GameAction::is_payment_step));
    assert!(legal.contains(&GameAction::TapForMana { card: swamp }));

    // Tap a land mid-cast and pay the symbol with its mana
    assert_eq!(
        engine.dispatch(p1, GameAction::TapForMana { card: swamp }).await.unwrap(),
        ActionOutcome::Done
    );
    engine.dispatch(p1, pay(Color::Black, false)).await.unwrap();
    assert_eq!(engine.dispatch(p1, GameAction::CompleteCast).await.unwrap(), ActionOutcome::Done);
    assert_eq!(life(&engine, p1), 20);
    assert!(pool(&engine, p1).is_empty());

    engine.resolve_top().await.unwrap();
    assert_eq!(engine.state.zone_of(skirge), Some(Zone::Battlefield));
}

#[tokio::test]
async fn test_cancel_restores_pool_life_and_hand_exactly() {
    let (mut engine, p1, _) = engine();
    let legionnaire = in_hand(&mut engine, "Porcelain Legionnaire", p1);
    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::White, 2);
    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::Blue, 1);
    let pool_before = pool(&engine, p1);

    assert_eq!(
        engine.dispatch(p1, cast(legionnaire)).await.unwrap(),
        ActionOutcome::AwaitingPayment
    );
    assert_eq!(pool(&engine, p1).total(), 1);
    engine.dispatch(p1, pay(Color::White, true)).await.unwrap();
    assert_eq!(life(&engine, p1), 18);

    assert_eq!(engine.dispatch(p1, GameAction::CancelCast).await.unwrap(), ActionOutcome::Done);
    assert_eq!(pool(&engine, p1), pool_before);
    assert_eq!(life(&engine, p1), 20);
    assert_eq!(engine.state.zone_of(legionnaire), Some(Zone::Hand));
    assert!(engine.state.pending_cast.is_none());
    assert!(engine.state.stack.is_empty());
}

#[tokio::test]
async fn test_two_symbols_with_life_on_a_creature_removal() {
    let (mut engine, p1, p2) = engine();
    let wurm = on_battlefield(&mut engine, "Craw Wurm", p2);
    let dismember = in_hand(&mut engine, "Dismember", p1);
    let mut alice = ScriptedController::new();
    alice.push_target(Some(TargetRef::Permanent(wurm)));
    engine.set_controller(p1, Box::new(alice)).unwrap();
    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::Red, 1);

    engine.dispatch(p1, cast(dismember)).await.unwrap();
    engine.dispatch(p1, pay(Color::Black, true)).await.unwrap();
    let early = engine.dispatch(p1, GameAction::CompleteCast).await.unwrap();
    assert!(matches!(early, ActionOutcome::Rejected(_)));
    engine.dispatch(p1, pay(Color::Black, true)).await.unwrap();
    engine.dispatch(p1, GameAction::CompleteCast).await.unwrap();
    assert_eq!(life(&engine, p1), 16);

    engine.resolve_top().await.unwrap();
    assert_eq!(engine.state.zone_of(wurm), Some(Zone::Graveyard));
}

#[tokio::test]
async fn test_life_payment_refused_below_two_life() {
    let (mut engine, p1, _) = engine();
    let skirge = in_hand(&mut engine, "Vault Skirge", p1);
    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::Blue, 1);
    engine.dispatch(p1, cast(skirge)).await.unwrap();

    // Life drops below the price of a symbol while the cast is open
    engine.state.get_player_mut(p1).unwrap().life = 1;
    let outcome = engine.dispatch(p1, pay(Color::Black, true)).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Rejected(_)));
    assert_eq!(life(&engine, p1), 1);
    assert!(engine.state.pending_cast.is_some());

    engine.dispatch(p1, GameAction::CancelCast).await.unwrap();
    assert_eq!(pool(&engine, p1).amount(Color::Blue), 1);
}

#[tokio::test]
async fn test_paying_a_symbol_that_is_not_owed_is_a_contract_violation() {
    let (mut engine, p1, _) = engine();
    let skirge = in_hand(&mut engine, "Vault Skirge", p1);
    engine.state.get_player_mut(p1).unwrap().mana_pool.add(Color::Black, 1);
    engine.dispatch(p1, cast(skirge)).await.unwrap();

    let result = engine.dispatch(p1, pay(Color::Green, true)).await;
    assert!(matches!(result, Err(MtgError::InvalidAction(_))));
    // The open cast is untouched
    assert_eq!(engine.state.pending_cast.as_ref().map(|p| p.card), Some(skirge));
}
