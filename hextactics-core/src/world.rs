//! Shared simulation context
//!
//! The world owns every piece of state the ability engine and the match
//! orchestrator both touch: the grid, the unit and ability arenas, the
//! players, the turn counter, the event bus and the seeded RNG. It is built
//! once per match and handed around explicitly.

use std::rc::Rc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::ability::{mitigated_damage, Ability, AbilityArena, AbilityBlueprint, AbilityId, Effect, Target};
use crate::error::{CompositionError, EngineError, EngineResult};
use crate::events::{EventBus, GameEvent};
use crate::grid::Grid;
use crate::hex::{HexCoord, Point3};
use crate::lifecycle::{NullLifecycle, ObjectLifecycle};
use crate::pathfinding::find_hex_path;
use crate::player::{Player, PlayerId};
use crate::roster::UnitTemplate;
use crate::task::TaskStatus;
use crate::turn::TurnState;
use crate::unit::{MoveTask, Unit, UnitId};

pub struct World {
    pub(crate) grid: Grid,
    pub(crate) units: Vec<Unit>,
    pub(crate) abilities: AbilityArena,
    pub(crate) players: Vec<Player>,
    pub(crate) turn: TurnState,
    pub(crate) events: EventBus,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) lifecycle: Box<dyn ObjectLifecycle>,
    blueprints: FxHashMap<String, Rc<AbilityBlueprint>>,
}

impl World {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn new(
        grid: Grid,
        blueprints: FxHashMap<String, AbilityBlueprint>,
        player_count: usize,
        first_player: usize,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            grid,
            units: Vec::new(),
            abilities: AbilityArena::new(),
            players: (0..player_count).map(|i| Player::new(PlayerId(i))).collect(),
            turn: TurnState::new(player_count, first_player),
            events: EventBus::new(),
            rng,
            lifecycle: Box::new(NullLifecycle::new()),
            blueprints: blueprints.into_iter().map(|(k, v)| (k, Rc::new(v))).collect(),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: impl ObjectLifecycle + 'static) -> Self {
        self.lifecycle = Box::new(lifecycle);
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter()
    }

    pub fn ability(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.get(id)
    }

    pub fn abilities(&self) -> &AbilityArena {
        &self.abilities
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn active_player(&self) -> PlayerId {
        self.turn.active_player()
    }

    pub fn blueprint(&self, name: &str) -> Option<&AbilityBlueprint> {
        self.blueprints.get(name).map(|b| b.as_ref())
    }

    pub(crate) fn try_unit(&self, id: UnitId) -> EngineResult<&Unit> {
        self.units.get(id.0).ok_or(EngineError::NoSuchUnit(id.0))
    }

    pub(crate) fn try_unit_mut(&mut self, id: UnitId) -> EngineResult<&mut Unit> {
        self.units.get_mut(id.0).ok_or(EngineError::NoSuchUnit(id.0))
    }

    pub(crate) fn try_ability(&self, id: AbilityId) -> EngineResult<&Ability> {
        self.abilities.get(id).ok_or(EngineError::NoSuchAbility(id.0))
    }

    pub(crate) fn try_ability_mut(&mut self, id: AbilityId) -> EngineResult<&mut Ability> {
        self.abilities.get_mut(id).ok_or(EngineError::NoSuchAbility(id.0))
    }

    pub(crate) fn shared_blueprint(&self, name: &str) -> EngineResult<Rc<AbilityBlueprint>> {
        self.blueprints
            .get(name)
            .cloned()
            .ok_or_else(|| CompositionError::UnknownAbility(name.to_string()).into())
    }

    pub(crate) fn publish(&mut self, event: GameEvent) {
        self.events.publish(event);
    }

    // ========================================================================
    // UNITS
    // ========================================================================

    /// Create a unit with its abilities and hand it to `owner`. The unit is
    /// not on the board until [`World::place_unit`].
    pub fn spawn_unit(&mut self, template: &UnitTemplate, owner: PlayerId) -> EngineResult<UnitId> {
        let id = UnitId(self.units.len());
        let mut unit = Unit::new(id, &template.id, template.display_name(), template.stats.clone());

        for name in &template.skills {
            let blueprint = self.shared_blueprint(name)?;
            unit.skills.push(self.abilities.insert(id, blueprint, false));
        }
        if let Some(name) = &template.melee {
            let blueprint = self.shared_blueprint(name)?;
            blueprint.check_melee()?;
            unit.melee = Some(self.abilities.insert(id, blueprint, false));
        }
        if let Some(name) = &template.ranged {
            let blueprint = self.shared_blueprint(name)?;
            unit.ranged = Some(self.abilities.insert(id, blueprint, false));
        }

        unit.instance = Some(self.lifecycle.spawn(&template.id));
        unit.owner = Some(owner);
        self.units.push(unit);
        if let Some(player) = self.players.get_mut(owner.0) {
            player.add_unit(id);
        }
        self.publish(GameEvent::UnitAdded(id));
        debug!("Spawned {} #{} for {}", template.id, id.0, owner);
        Ok(id)
    }

    /// Put a unit on `coord`, leaving its previous tile
    pub fn place_unit(&mut self, id: UnitId, coord: HexCoord) -> EngineResult<()> {
        self.grid.tile(coord)?;
        let previous = self.try_unit(id)?.coord;
        if let Some(previous) = previous {
            if self.grid.get_tile(previous).and_then(|t| t.occupant()) == Some(id) {
                self.grid.clear_occupant(previous);
            }
        }
        self.grid.set_occupant(coord, id)?;
        let position = self.grid.world_position(coord);
        let unit = self.try_unit_mut(id)?;
        unit.coord = Some(coord);
        let instance = unit.instance;
        if let Some(handle) = instance {
            self.lifecycle.place(handle, position);
        }
        Ok(())
    }

    /// Take a dead or departing unit off the board and away from its owner
    pub fn remove_unit(&mut self, id: UnitId) -> EngineResult<Option<HexCoord>> {
        let unit = self.try_unit_mut(id)?;
        let coord = unit.coord.take();
        let owner = unit.owner.take();
        if let Some(coord) = coord {
            if self.grid.get_tile(coord).and_then(|t| t.occupant()) == Some(id) {
                self.grid.clear_occupant(coord);
            }
        }
        if let Some(owner) = owner {
            if let Some(player) = self.players.get_mut(owner.0) {
                player.remove_unit(id);
            }
        }
        Ok(coord)
    }

    /// Hand a unit to another player. A unit is never queued by two players.
    pub fn transfer_unit(&mut self, id: UnitId, to: PlayerId) -> EngineResult<bool> {
        let Some(from) = self.try_unit(id)?.owner else {
            return Ok(false);
        };
        if from == to || to.0 >= self.players.len() {
            return Ok(false);
        }
        let (a, b) = (from.0.min(to.0), from.0.max(to.0));
        let (left, right) = self.players.split_at_mut(b);
        let (source, dest) = if from.0 == a {
            (&mut left[a], &mut right[0])
        } else {
            (&mut right[0], &mut left[a])
        };
        if !source.transfer_unit(id, dest) {
            return Ok(false);
        }
        self.try_unit_mut(id)?.owner = Some(to);
        Ok(true)
    }

    pub fn is_alive(&self, id: UnitId) -> bool {
        self.unit(id).is_some_and(Unit::is_alive)
    }

    /// Set health, publishing the change. Publishes `UnitRemoved` when the
    /// unit drops to 0.
    pub fn set_health(&mut self, id: UnitId, value: i32) -> EngineResult<i32> {
        let unit = self.try_unit_mut(id)?;
        let delta = unit.set_health(value);
        let died = delta != 0 && unit.is_dead();
        if delta != 0 {
            self.publish(GameEvent::HealthChanged { unit: id, delta });
        }
        if died {
            info!("Unit #{} has fallen", id.0);
            self.publish(GameEvent::UnitRemoved(id));
        }
        Ok(delta)
    }

    pub fn set_mana(&mut self, id: UnitId, value: i32) -> EngineResult<i32> {
        let delta = self.try_unit_mut(id)?.set_mana(value);
        if delta != 0 {
            self.publish(GameEvent::ManaChanged { unit: id, delta });
        }
        Ok(delta)
    }

    /// A living enemy stands next to the unit
    pub fn is_surrounded(&self, id: UnitId) -> bool {
        let Some(unit) = self.unit(id) else {
            return false;
        };
        let Some(coord) = unit.coord() else {
            return false;
        };
        coord.neighbors().iter().any(|n| {
            self.grid
                .get_tile(*n)
                .and_then(|t| t.occupant())
                .and_then(|o| self.unit(o))
                .is_some_and(|other| other.is_alive() && other.is_enemy_of(unit))
        })
    }

    pub fn is_any_skill_busy(&self, id: UnitId) -> bool {
        self.unit(id).is_some_and(|unit| {
            unit.abilities()
                .any(|a| self.abilities.get(a).is_some_and(Ability::is_busy))
        })
    }

    /// Neither walking nor casting
    pub fn is_unit_idle(&self, id: UnitId) -> bool {
        self.unit(id).is_some_and(|u| !u.is_busy()) && !self.is_any_skill_busy(id)
    }

    /// Every unit idle, sub-abilities included
    pub fn is_settled(&self) -> bool {
        self.units.iter().all(|u| !u.is_busy()) && self.abilities.iter().all(|a| !a.is_busy())
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    /// Shortest walk from the unit's hex to `to`
    pub fn path_for(&self, id: UnitId, to: HexCoord) -> Option<Vec<HexCoord>> {
        let from = self.unit(id)?.coord()?;
        find_hex_path(&self.grid, from, to)
    }

    /// Start walking. Occupancy moves when the walk completes.
    pub fn start_move(&mut self, id: UnitId, path: Vec<HexCoord>) -> EngineResult<bool> {
        let unit = self.try_unit_mut(id)?;
        let Some(start) = unit.coord else {
            return Ok(false);
        };
        if path.is_empty() || unit.movement.is_some() {
            return Ok(false);
        }
        debug!("Unit #{} moving {} -> {} ({} steps)", id.0, start, path[path.len() - 1], path.len());
        unit.movement = Some(MoveTask::new(start, path));
        Ok(true)
    }

    /// Advance every walking unit
    pub fn advance_movement(&mut self, dt: f32) -> EngineResult<()> {
        for index in 0..self.units.len() {
            let id = UnitId(index);
            let unit = &mut self.units[index];
            let speed = unit.stats().movement_speed;
            let instance = unit.instance;
            let Some(task) = unit.movement.as_mut() else {
                continue;
            };
            let status = task.advance(dt, speed);
            let position = task.position(self.grid.layout());
            if let Some(handle) = instance {
                self.lifecycle.place(handle, position);
            }
            if status == TaskStatus::Done {
                let destination = task.destination();
                self.units[index].movement = None;
                self.place_unit(id, destination)?;
                self.publish(GameEvent::MoveCompleted(id));
            }
        }
        Ok(())
    }

    // ========================================================================
    // EFFECTS
    // ========================================================================

    /// Apply one effect. Every effect needs a unit target.
    pub fn apply_effect(&mut self, source: &str, effect: &Effect, target: Target) -> EngineResult<()> {
        let Target::Unit(id) = target else {
            return Err(EngineError::InvalidTargetType {
                ability: source.to_string(),
                effect: effect.name(),
            });
        };
        let unit = self.try_unit(id)?;
        let (health, mana, armor, dodge, coord) =
            (unit.health(), unit.mana(), unit.armor(), unit.dodge_chance(), unit.coord());

        match effect {
            Effect::Damage {
                amount,
                can_be_dodged,
                ignore_armor,
            } => {
                if *can_be_dodged && self.rng.gen::<f32>() < dodge {
                    debug!("Unit #{} dodged {}", id.0, source);
                    self.publish(GameEvent::UnitDodged(id));
                } else {
                    self.set_health(id, health - mitigated_damage(*amount, armor, *ignore_armor))?;
                }
            }
            Effect::Heal { amount } => {
                if health <= 0 {
                    debug!("Unit #{} is dead, {} heals nothing", id.0, source);
                } else {
                    self.set_health(id, health + amount)?;
                }
            }
            Effect::Mana { amount } => {
                self.set_mana(id, mana + amount)?;
            }
            Effect::SpawnVisual { template } => {
                let handle = self.lifecycle.spawn(template);
                let position = coord.map_or(Point3::default(), |c| self.grid.world_position(c));
                self.lifecycle.place(handle, position);
            }
        }
        Ok(())
    }

    // ========================================================================
    // TEARDOWN
    // ========================================================================

    /// Recycle unit instances, empty every player and reset the turn counter
    pub fn teardown(&mut self) {
        for player in &mut self.players {
            player.remove_all_units();
        }
        for index in 0..self.units.len() {
            let unit = &mut self.units[index];
            unit.owner = None;
            if let Some(coord) = unit.coord.take() {
                self.grid.clear_occupant(coord);
            }
            if let Some(handle) = unit.instance.take() {
                self.lifecycle.recycle(handle);
            }
        }
        self.turn.reset();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ability::{AbilityTemplate, Component, UnitAim};
    use crate::events::Topic;
    use crate::roster::UnitCatalog;
    use crate::unit::UnitStats;
    use rand::SeedableRng;

    /// Catalog shared by the world and engine tests
    pub(crate) fn catalog() -> UnitCatalog {
        UnitCatalog::new()
            .with_ability(AbilityTemplate::new(
                "strike",
                vec![
                    Component::UnitAim(UnitAim::new(0, 1, true)),
                    Component::ClickCast,
                    Component::InstantApply,
                    Component::Damage {
                        amount: 4,
                        can_be_dodged: false,
                        ignore_armor: false,
                    },
                ],
            ))
            .with_ability(
                AbilityTemplate::new(
                    "bolt",
                    vec![
                        Component::UnitAim(UnitAim::new(1, 4, true)),
                        Component::CastOnTargetSelected,
                        Component::Projectile {
                            speed: 2.0,
                            visual: Some("spark".into()),
                        },
                        Component::Damage {
                            amount: 3,
                            can_be_dodged: false,
                            ignore_armor: true,
                        },
                    ],
                )
                .with_mana_cost(2),
            )
            .with_ability(AbilityTemplate::new(
                "mend",
                vec![
                    Component::UnitAim(UnitAim::new(1, 1, true)),
                    Component::CastOnTargetSelected,
                    Component::InstantApply,
                    Component::Heal { amount: 2 },
                ],
            ))
            .with_ability(AbilityTemplate::new(
                "rally",
                vec![
                    Component::PlayerAim,
                    Component::ClickCast,
                    Component::Broadcast {
                        sub_ability: "mend".into(),
                    },
                ],
            ))
            .with_ability(
                AbilityTemplate::new(
                    "meditate",
                    vec![
                        Component::PlayerAim,
                        Component::CastOnEvent { topic: Topic::TurnEnded },
                        Component::Broadcast {
                            sub_ability: "mend".into(),
                        },
                    ],
                )
                .passive(),
            )
            .with_unit(
                UnitTemplate::new(
                    "knight",
                    UnitStats {
                        max_health: 10,
                        max_mana: 4,
                        armor: 1,
                        ..Default::default()
                    },
                )
                .with_melee("strike")
                .with_skill("bolt")
                .with_skill("rally")
                .with_skill("meditate"),
            )
    }

    pub(crate) fn world(lifecycle: NullLifecycle) -> World {
        let blueprints = catalog().compose().unwrap();
        World::new(Grid::new(6, 6), blueprints, 2, 0, ChaCha8Rng::seed_from_u64(7)).with_lifecycle(lifecycle)
    }

    pub(crate) fn spawn(world: &mut World, owner: usize, coord: HexCoord) -> UnitId {
        let template = catalog().unit("knight").unwrap().clone();
        let id = world.spawn_unit(&template, PlayerId(owner)).unwrap();
        world.place_unit(id, coord).unwrap();
        id
    }

    #[test]
    fn test_spawn_and_place() {
        let probe = NullLifecycle::new();
        let mut world = world(probe.clone());
        let id = spawn(&mut world, 0, HexCoord::new(1, 1));

        let unit = world.unit(id).unwrap();
        assert_eq!(unit.skills().len(), 3);
        assert!(unit.melee().is_some());
        assert_eq!(unit.owner(), Some(PlayerId(0)));
        assert_eq!(world.grid().get_tile(HexCoord::new(1, 1)).unwrap().occupant(), Some(id));
        assert_eq!(probe.live(), 1);
        assert!(world.player(PlayerId(0)).unwrap().contains(id));

        world.place_unit(id, HexCoord::new(2, 1)).unwrap();
        assert!(!world.grid().get_tile(HexCoord::new(1, 1)).unwrap().is_occupied());
        assert_eq!(world.events_mut().drain_pending(), vec![GameEvent::UnitAdded(id)]);
    }

    #[test]
    fn test_damage_publishes_removal() {
        let mut world = world(NullLifecycle::new());
        let id = spawn(&mut world, 0, HexCoord::new(1, 1));
        world.events_mut().drain_pending();

        world.apply_effect("test", &Effect::damage(4), Target::Unit(id)).unwrap();
        assert_eq!(world.unit(id).unwrap().health(), 7);
        world.apply_effect("test", &Effect::damage(50), Target::Unit(id)).unwrap();
        assert!(!world.is_alive(id));
        assert_eq!(
            world.events_mut().drain_pending(),
            vec![
                GameEvent::HealthChanged { unit: id, delta: -3 },
                GameEvent::HealthChanged { unit: id, delta: -7 },
                GameEvent::UnitRemoved(id),
            ]
        );

        // Already dead: nothing changes, nothing published
        world.apply_effect("test", &Effect::damage(5), Target::Unit(id)).unwrap();
        assert!(!world.events().has_pending());
    }

    #[test]
    fn test_heal_skips_dead_units() {
        let mut world = world(NullLifecycle::new());
        let id = spawn(&mut world, 0, HexCoord::new(1, 1));
        let heal = Effect::Heal { amount: 3 };

        world.apply_effect("test", &Effect::damage(5), Target::Unit(id)).unwrap();
        world.apply_effect("test", &heal, Target::Unit(id)).unwrap();
        assert_eq!(world.unit(id).unwrap().health(), 9);

        world.apply_effect("test", &Effect::damage(100), Target::Unit(id)).unwrap();
        world.events_mut().drain_pending();
        world.apply_effect("test", &heal, Target::Unit(id)).unwrap();

        let unit = world.unit(id).unwrap();
        assert_eq!(unit.health(), 0);
        assert!(!world.is_alive(id));
        assert!(!world.events().has_pending());
    }

    #[test]
    fn test_effect_on_player_is_fatal() {
        let mut world = world(NullLifecycle::new());
        let err = world
            .apply_effect("rally", &Effect::Heal { amount: 1 }, Target::Player(PlayerId(0)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTargetType { effect: "Heal", .. }));
    }

    #[test]
    fn test_dodge_is_seeded() {
        let run = |seed: u64| {
            let mut world = world(NullLifecycle::new());
            world.rng = ChaCha8Rng::seed_from_u64(seed);
            let mut template = catalog().unit("knight").unwrap().clone();
            template.stats.dodge_chance = 0.5;
            let id = world.spawn_unit(&template, PlayerId(0)).unwrap();
            let hit = Effect::Damage {
                amount: 1,
                can_be_dodged: true,
                ignore_armor: true,
            };
            for _ in 0..9 {
                world.apply_effect("test", &hit, Target::Unit(id)).unwrap();
            }
            let dodged = world
                .events_mut()
                .drain_pending()
                .iter()
                .filter(|e| matches!(e, GameEvent::UnitDodged(_)))
                .count() as i32;
            (dodged, world.unit(id).unwrap().health())
        };
        let (dodged, health) = run(11);
        assert_eq!(health, 10 - (9 - dodged));
        assert_eq!(run(11), (dodged, health));
    }

    #[test]
    fn test_surrounded() {
        let mut world = world(NullLifecycle::new());
        let a = spawn(&mut world, 0, HexCoord::new(1, 1));
        let b = spawn(&mut world, 1, HexCoord::new(2, 1));
        let c = spawn(&mut world, 0, HexCoord::new(0, 1));
        assert!(world.is_surrounded(a));
        assert!(world.is_surrounded(b));
        assert!(!world.is_surrounded(c));

        world.set_health(b, 0).unwrap();
        assert!(!world.is_surrounded(a));
    }

    #[test]
    fn test_move_updates_occupancy_on_arrival() {
        let mut world = world(NullLifecycle::new());
        let id = spawn(&mut world, 0, HexCoord::new(0, 0));
        let path = world.path_for(id, HexCoord::new(2, 0)).unwrap();
        assert_eq!(path.len(), 2);
        assert!(world.start_move(id, path).unwrap());
        assert!(!world.is_unit_idle(id));

        world.advance_movement(0.25).unwrap();
        assert_eq!(world.grid().get_tile(HexCoord::new(0, 0)).unwrap().occupant(), Some(id));

        world.advance_movement(1.0).unwrap();
        assert!(world.is_unit_idle(id));
        assert_eq!(world.unit(id).unwrap().coord(), Some(HexCoord::new(2, 0)));
        assert!(!world.grid().get_tile(HexCoord::new(0, 0)).unwrap().is_occupied());
        assert!(world
            .events_mut()
            .drain_pending()
            .contains(&GameEvent::MoveCompleted(id)));
    }

    #[test]
    fn test_transfer_and_teardown() {
        let probe = NullLifecycle::new();
        let mut world = world(probe.clone());
        let id = spawn(&mut world, 0, HexCoord::new(0, 0));

        assert!(world.transfer_unit(id, PlayerId(1)).unwrap());
        assert!(!world.player(PlayerId(0)).unwrap().contains(id));
        assert!(world.player(PlayerId(1)).unwrap().contains(id));
        assert_eq!(world.unit(id).unwrap().owner(), Some(PlayerId(1)));
        assert!(!world.transfer_unit(id, PlayerId(1)).unwrap());

        world.teardown();
        assert_eq!(world.player(PlayerId(1)).unwrap().unit_count(), 0);
        assert_eq!(probe.live(), 0);
        assert!(!world.grid().get_tile(HexCoord::new(0, 0)).unwrap().is_occupied());
    }
}
