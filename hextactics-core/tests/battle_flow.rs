//! Integration tests for full matches
//!
//! Drives a [`Battle`] through army build, attacks, movement and game over
//! using only the public click/tick API.

use std::cell::RefCell;
use std::rc::Rc;

use hextactics_core::{
    ability::UnitAim, AbilityTemplate, Battle, CacheCategory, Component, Effect, GameEvent, GameOutcome,
    GameState, GridConfig, HexCoord, MatchConfig, NullLifecycle, PlayerId, Roster, Topic, UnitCatalog, UnitId,
    UnitStats, UnitTemplate,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn strike() -> AbilityTemplate {
    let aim = UnitAim {
        can_cast_surrounded: true,
        ..UnitAim::new(0, 1, true)
    };
    AbilityTemplate::new(
        "strike",
        vec![
            Component::UnitAim(aim),
            Component::ClickCast,
            Component::InstantApply,
            Component::Damage {
                amount: 4,
                can_be_dodged: false,
                ignore_armor: false,
            },
        ],
    )
}

fn bolt() -> AbilityTemplate {
    AbilityTemplate::new(
        "bolt",
        vec![
            Component::UnitAim(UnitAim::new(1, 4, true)),
            Component::ClickCast,
            Component::Projectile {
                speed: 2.0,
                visual: Some("arrow".to_string()),
            },
            Component::Damage {
                amount: 3,
                can_be_dodged: false,
                ignore_armor: false,
            },
        ],
    )
}

fn catalog() -> UnitCatalog {
    UnitCatalog::new()
        .with_ability(strike())
        .with_ability(bolt())
        .with_unit(
            UnitTemplate::new(
                "soldier",
                UnitStats {
                    max_health: 8,
                    movement_range: 2,
                    ..Default::default()
                },
            )
            .with_melee("strike"),
        )
        .with_unit(
            UnitTemplate::new(
                "archer",
                UnitStats {
                    max_health: 10,
                    movement_range: 1,
                    ..Default::default()
                },
            )
            .with_ranged("bolt"),
        )
        .with_unit(
            UnitTemplate::new(
                "lancer",
                UnitStats {
                    max_health: 8,
                    movement_range: 3,
                    ..Default::default()
                },
            )
            .with_melee("strike"),
        )
        .with_unit(
            UnitTemplate::new(
                "statue",
                UnitStats {
                    max_health: 8,
                    movement_range: 0,
                    ..Default::default()
                },
            )
            .with_melee("strike"),
        )
}

/// 5x4 open board, spawn bands of two rows, fixed opening player
fn setup(units: &[&str], first_player: usize, lifecycle: &NullLifecycle) -> Battle {
    let config = MatchConfig::default()
        .with_grid(GridConfig::open(5, 4))
        .with_seed(11)
        .with_first_player(first_player);
    Battle::new(config, catalog())
        .unwrap()
        .with_roster(Roster::from_units(units))
        .with_lifecycle(lifecycle.clone())
}

/// Place units by clicking, alternating players
fn deploy(battle: &mut Battle, clicks: &[(i32, i32)]) {
    battle.start_game().unwrap();
    for &(q, r) in clicks {
        battle.click_hex(HexCoord::new(q, r)).unwrap();
    }
    assert_eq!(battle.game_state(), GameState::Battle);
}

fn record(battle: &mut Battle) -> Rc<RefCell<Vec<GameEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    battle
        .events_mut()
        .subscribe_all(move |e| sink.borrow_mut().push(e.clone()));
    log
}

fn occupant(battle: &Battle, q: i32, r: i32) -> UnitId {
    battle
        .grid()
        .get_tile(HexCoord::new(q, r))
        .and_then(|t| t.occupant())
        .unwrap()
}

// ============================================================================
// ARMY BUILD
// ============================================================================

#[test]
fn test_roster_spawns_mirrored_armies() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["soldier", "archer"], 0, &lifecycle);
    battle.start_game().unwrap();

    for player in [PlayerId(0), PlayerId(1)] {
        let army: Vec<_> = battle
            .world()
            .units()
            .filter(|u| u.owner() == Some(player))
            .map(|u| u.template().to_string())
            .collect();
        assert_eq!(army, vec!["soldier", "archer"]);
        assert_eq!(battle.world().player(player).unwrap().unit_count(), 2);
    }
    assert_eq!(lifecycle.live(), 4);
    assert_eq!(battle.selected_unit(), Some(UnitId(0)));
}

// ============================================================================
// COMBAT
// ============================================================================

#[test]
fn test_melee_only_reaches_adjacent_enemies() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["soldier", "soldier"], 0, &lifecycle);
    // p0 (0,1), p1 (0,2), p0 (3,0), p1 (2,3)
    deploy(&mut battle, &[(0, 1), (0, 2), (3, 0), (2, 3)]);

    let active = battle.active_unit().unwrap();
    assert_eq!(battle.unit(active).unwrap().coord(), Some(HexCoord::new(0, 1)));
    assert_eq!(
        battle.action_cache().tiles(CacheCategory::DirectAttack),
        &[HexCoord::new(0, 2)]
    );
}

#[test]
fn test_melee_kill_decides_winner() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["soldier"], 1, &lifecycle);
    let events = record(&mut battle);
    // Player 1 deploys and moves first
    deploy(&mut battle, &[(0, 2), (0, 1)]);

    let victim = occupant(&battle, 0, 1);
    let attacker = battle.active_unit().unwrap();
    assert_eq!(battle.unit(attacker).unwrap().owner(), Some(PlayerId(1)));

    battle.click_hex(HexCoord::new(0, 1)).unwrap();
    assert_eq!(battle.unit(victim).unwrap().health(), 4);
    assert_eq!(battle.game_state(), GameState::Battle);
    assert_eq!(battle.active_unit(), Some(victim));

    // The victim steps away. Its turn ends when the walk completes.
    battle.click_hex(HexCoord::new(1, 0)).unwrap();
    battle.tick(0.5).unwrap();
    assert_eq!(battle.unit(victim).unwrap().coord(), Some(HexCoord::new(1, 0)));
    assert_eq!(battle.active_unit(), Some(attacker));

    // Back in reach: approach and strike
    battle.click_hex(HexCoord::new(1, 0)).unwrap();
    battle.tick(0.5).unwrap();

    assert_eq!(battle.game_state(), GameState::GameOver);
    assert_eq!(battle.outcome(), Some(GameOutcome::Winner(PlayerId(1))));
    assert_eq!(battle.outcome().unwrap().id(), 1);

    battle.tick(0.5).unwrap();
    battle.tick(0.5).unwrap();
    assert!(battle.is_finished());
    assert_eq!(lifecycle.live(), 0);

    let finished: Vec<_> = events
        .borrow()
        .iter()
        .filter(|e| e.topic() == Topic::MatchFinished)
        .cloned()
        .collect();
    assert_eq!(finished, vec![GameEvent::MatchFinished(GameOutcome::Winner(PlayerId(1)))]);
}

#[test]
fn test_simultaneous_elimination_is_a_draw() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["soldier"], 0, &lifecycle);
    deploy(&mut battle, &[(0, 0), (0, 3)]);

    let a = occupant(&battle, 0, 0);
    let b = occupant(&battle, 0, 3);
    battle
        .resolve_effects(&[(a, Effect::damage(100)), (b, Effect::damage(100))])
        .unwrap();

    assert_eq!(battle.game_state(), GameState::GameOver);
    assert_eq!(battle.outcome(), Some(GameOutcome::Draw));
    assert_eq!(battle.outcome().unwrap().id(), -1);
}

#[test]
fn test_projectile_is_one_busy_period() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["archer"], 0, &lifecycle);
    deploy(&mut battle, &[(0, 0), (0, 3)]);
    let events = record(&mut battle);

    let archer = battle.active_unit().unwrap();
    let target = occupant(&battle, 0, 3);
    let bolt = battle.unit(archer).unwrap().ranged().unwrap();
    assert!(battle
        .action_cache()
        .contains(CacheCategory::DirectAttack, HexCoord::new(0, 3)));

    battle.click_hex(HexCoord::new(0, 3)).unwrap();
    assert!(battle.ability(bolt).unwrap().is_busy());
    assert_eq!(lifecycle.live(), 3);

    // A second cast and a second click both bounce off the busy ability
    assert!(!battle.cast_ability(bolt).unwrap());
    battle.click_hex(HexCoord::new(0, 3)).unwrap();

    battle.tick(0.25).unwrap();
    assert_eq!(battle.unit(target).unwrap().health(), 10);
    battle.tick(0.25).unwrap();

    assert_eq!(battle.unit(target).unwrap().health(), 7);
    assert_eq!(lifecycle.live(), 2);
    let hits = events
        .borrow()
        .iter()
        .filter(|e| e.topic() == Topic::HealthChanged)
        .count();
    assert_eq!(hits, 1);
    assert_eq!(battle.active_unit(), Some(target));
}

#[test]
fn test_approach_then_strike() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["soldier"], 0, &lifecycle);
    deploy(&mut battle, &[(0, 1), (0, 3)]);

    let soldier = battle.active_unit().unwrap();
    let enemy = occupant(&battle, 0, 3);
    assert!(battle.action_cache().pairs_for(HexCoord::new(0, 3)).count() > 0);

    battle.click_hex(HexCoord::new(0, 3)).unwrap();
    assert_eq!(battle.queued_actions(), 1);
    assert_eq!(battle.active_unit(), Some(soldier));

    battle.tick(0.25).unwrap();
    assert_eq!(battle.unit(soldier).unwrap().coord(), Some(HexCoord::new(0, 2)));
    assert_eq!(battle.unit(enemy).unwrap().health(), 4);
    assert_eq!(battle.queued_actions(), 0);
    assert_eq!(battle.active_unit(), Some(enemy));
}

#[test]
fn test_approach_takes_the_nearest_hex() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["lancer"], 0, &lifecycle);
    deploy(&mut battle, &[(0, 1), (0, 3)]);

    let lancer = battle.active_unit().unwrap();
    assert_eq!(battle.unit(lancer).unwrap().coord(), Some(HexCoord::new(0, 1)));
    let enemy = occupant(&battle, 0, 3);

    // One step to (0, 2), two steps to (1, 2) or (-1, 3)
    let approaches: Vec<_> = battle.action_cache().pairs_for(HexCoord::new(0, 3)).collect();
    assert!(approaches.contains(&HexCoord::new(0, 2)));
    assert!(approaches.contains(&HexCoord::new(1, 2)));
    assert!(approaches.contains(&HexCoord::new(-1, 3)));

    battle.click_hex(HexCoord::new(0, 3)).unwrap();
    assert_eq!(battle.queued_actions(), 1);

    battle.tick(0.25).unwrap();
    assert_eq!(battle.unit(lancer).unwrap().coord(), Some(HexCoord::new(0, 2)));
    assert_eq!(battle.unit(enemy).unwrap().health(), 4);
    assert_eq!(battle.queued_actions(), 0);
    assert_eq!(battle.active_unit(), Some(enemy));
}

#[test]
fn test_units_without_actions_skip_until_stalemate() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["statue"], 0, &lifecycle);
    let log = record(&mut battle);
    deploy(&mut battle, &[(0, 0), (1, 3)]);

    let first = occupant(&battle, 0, 0);
    let turns_ended = |log: &Rc<RefCell<Vec<GameEvent>>>| {
        log.borrow().iter().filter(|e| e.topic() == Topic::TurnEnded).count()
    };

    // Two placements, then each statue skips once before the guard holds
    assert_eq!(turns_ended(&log), 4);
    assert_eq!(battle.turn().current_turn(), 2);
    assert_eq!(battle.active_unit(), Some(first));
    assert_eq!(battle.game_state(), GameState::Battle);
    assert_eq!(battle.outcome(), None);

    battle.tick(1.0).unwrap();
    battle.highlight_active_hex().unwrap();
    assert_eq!(turns_ended(&log), 4);
    assert_eq!(battle.turn().current_turn(), 2);
    assert_eq!(battle.game_state(), GameState::Battle);
    assert_eq!(battle.outcome(), None);
}

// ============================================================================
// HIGHLIGHT
// ============================================================================

#[test]
fn test_highlight_rebuild_is_idempotent() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["soldier", "archer"], 0, &lifecycle);
    deploy(&mut battle, &[(0, 1), (0, 2), (3, 0), (2, 3)]);

    let tiles = battle.highlighted_tiles();
    let cache = battle.action_cache().clone();
    assert!(!tiles.is_empty());

    battle.highlight_active_hex().unwrap();
    battle.highlight_active_hex().unwrap();
    assert_eq!(battle.highlighted_tiles(), tiles);
    assert_eq!(battle.action_cache(), &cache);

    battle.reset_active_hexes();
    assert!(battle.highlighted_tiles().is_empty());
    assert!(battle.action_cache().is_empty());
}

#[test]
fn test_inspecting_another_unit() {
    let lifecycle = NullLifecycle::new();
    let mut battle = setup(&["soldier"], 0, &lifecycle);
    deploy(&mut battle, &[(0, 0), (0, 3)]);

    let active = battle.active_unit().unwrap();
    let enemy = occupant(&battle, 0, 3);
    battle.click_hex(HexCoord::new(0, 3)).unwrap();

    assert_eq!(battle.selected_unit(), Some(enemy));
    assert_eq!(battle.active_unit(), Some(active));
    assert!(battle.action_cache().tiles(CacheCategory::Move).is_empty());
    assert!(!battle.action_cache().tiles(CacheCategory::Other).is_empty());
}
