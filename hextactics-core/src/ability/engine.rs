//! Ability phase machine
//!
//! Everything here runs against the [`World`] so casts can touch units, the
//! grid, the bus and the lifecycle provider. Rejections caused by a busy
//! ability are normal flow control: they are logged and reported as `false`,
//! never as errors.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::ability::cast::Flight;
use crate::ability::{
    Ability, AbilityBlueprint, AbilityId, AbilityPhase, Aim, CastTask, Delivery, DeliveryTask, Target, Trigger,
};
use crate::error::{EngineError, EngineResult};
use crate::events::GameEvent;
use crate::hex::{HexCoord, Point3};
use crate::unit::UnitId;
use crate::world::World;

impl World {
    // ========================================================================
    // ACTIVATION
    // ========================================================================

    /// Enable with a cleared target and publish `AbilityActivated`
    pub fn activate(&mut self, id: AbilityId) -> EngineResult<()> {
        let ability = self.try_ability_mut(id)?;
        if ability.is_busy() {
            warn!("Cannot activate {} while it is busy", ability);
            return Ok(());
        }
        ability.target = None;
        ability.phase = ability.idle_phase();
        if !ability.is_sub_skill() {
            self.publish(GameEvent::AbilityActivated(id));
        }
        self.run_enable_hooks(id)
    }

    /// Enable with `target` already set and cast right away. Without a target
    /// the ability resolves as a failed cast.
    pub fn activate_auto_cast(&mut self, id: AbilityId, target: Option<Target>) -> EngineResult<()> {
        let ability = self.try_ability_mut(id)?;
        if ability.is_busy() {
            warn!("Cannot auto-cast {} while it is busy", ability);
            return Ok(());
        }
        ability.target = target;
        ability.phase = ability.idle_phase();
        let sub_skill = ability.is_sub_skill();

        if target.is_none() {
            return self.resolve_cast(id, false);
        }
        if !sub_skill {
            self.publish(GameEvent::AbilityActivated(id));
        }
        if !self.cast(id)? {
            self.resolve_cast(id, false)?;
        }
        Ok(())
    }

    /// Enable without publishing. Used for weapons at turn start.
    pub(crate) fn enable_silently(&mut self, id: AbilityId) -> EngineResult<()> {
        let ability = self.try_ability_mut(id)?;
        if ability.is_busy() || ability.is_enabled() {
            return Ok(());
        }
        ability.target = None;
        ability.phase = ability.idle_phase();
        self.run_enable_hooks(id)
    }

    fn run_enable_hooks(&mut self, id: AbilityId) -> EngineResult<()> {
        let ability = self.try_ability(id)?;
        let player_aim = matches!(ability.aim(), Aim::Player);
        let on_enable = *ability.trigger() == Trigger::OnEnable;

        if player_aim {
            let player = self.turn.active_player();
            self.assign_target(id, Some(Target::Player(player)))?;
        }
        if on_enable {
            self.cast(id)?;
        }
        Ok(())
    }

    /// Publishes `AbilityDeactivated` when an enabled top-level ability goes
    /// inactive. A no-op while busy.
    pub fn deactivate(&mut self, id: AbilityId) -> EngineResult<()> {
        let ability = self.try_ability_mut(id)?;
        if ability.is_busy() {
            warn!("Cannot deactivate {} while it is busy", ability);
            return Ok(());
        }
        let was_enabled = ability.is_enabled();
        ability.phase = AbilityPhase::Inactive;
        if was_enabled && !ability.is_sub_skill() {
            self.publish(GameEvent::AbilityDeactivated(id));
        }
        Ok(())
    }

    pub(crate) fn disable_silently(&mut self, id: AbilityId) -> EngineResult<()> {
        let ability = self.try_ability_mut(id)?;
        if !ability.is_busy() {
            ability.phase = AbilityPhase::Inactive;
        }
        Ok(())
    }

    // ========================================================================
    // TARGETING
    // ========================================================================

    /// Change the target. An enabled `OnTargetSelected` ability casts as soon
    /// as it gets one.
    pub fn assign_target(&mut self, id: AbilityId, target: Option<Target>) -> EngineResult<()> {
        let ability = self.try_ability_mut(id)?;
        if ability.target == target {
            return Ok(());
        }
        ability.target = target;
        if !ability.is_enabled() {
            return Ok(());
        }
        if !ability.is_busy() {
            ability.phase = ability.idle_phase();
        }
        if target.is_some() && *ability.trigger() == Trigger::OnTargetSelected {
            self.cast(id)?;
        }
        Ok(())
    }

    /// Hexes a unit-aimed ability may target right now
    pub fn available_hexes(&self, id: AbilityId) -> Vec<HexCoord> {
        let Some(ability) = self.ability(id) else {
            return Vec::new();
        };
        let (Some(aim), Some(caster)) = (ability.aim().as_unit(), self.unit(ability.owner())) else {
            return Vec::new();
        };
        aim.available_hexes(&self.grid, caster, self.is_surrounded(caster.id()), |u| self.unit(u))
    }

    /// Let the aim handle a click on `coord`. Returns whether a target was
    /// picked.
    pub fn aim_click(&mut self, id: AbilityId, coord: HexCoord) -> EngineResult<bool> {
        let ability = self.try_ability(id)?;
        if !ability.is_enabled() || ability.is_busy() || ability.aim().as_unit().is_none() {
            return Ok(false);
        }
        if !self.available_hexes(id).contains(&coord) {
            return Ok(false);
        }
        let Some(occupant) = self.grid.get_tile(coord).and_then(|t| t.occupant()) else {
            return Ok(false);
        };
        self.assign_target(id, Some(Target::Unit(occupant)))?;
        Ok(true)
    }

    /// External click trigger. Only `Click` abilities respond.
    pub fn click_cast(&mut self, id: AbilityId) -> EngineResult<bool> {
        let ability = self.try_ability(id)?;
        if !ability.is_enabled() || *ability.trigger() != Trigger::Click {
            return Ok(false);
        }
        self.cast(id)
    }

    // ========================================================================
    // CASTING
    // ========================================================================

    /// Start a cast. Rejected while busy, without a target or without mana.
    pub fn cast(&mut self, id: AbilityId) -> EngineResult<bool> {
        let ability = self.try_ability(id)?;
        if ability.is_busy() {
            debug!("{} is already casting", ability);
            return Ok(false);
        }
        let Some(target) = ability.target() else {
            debug!("{} has no target", ability);
            return Ok(false);
        };
        let (owner, cost) = (ability.owner(), ability.mana_cost());
        let blueprint = ability.blueprint_handle();

        let mana = self.try_unit(owner)?.mana();
        if mana < cost {
            warn!("{} needs {} mana, unit #{} has {}", blueprint.name, cost, owner.0, mana);
            return Ok(false);
        }
        if cost > 0 {
            self.set_mana(owner, mana - cost)?;
        }

        let ability = self.try_ability_mut(id)?;
        ability.phase = AbilityPhase::Casting;
        ability.cast = Some(CastTask::new(target));
        debug!("{} cast on {:?}", ability, target);

        let mut deliveries = Vec::with_capacity(blueprint.deliveries.len());
        for delivery in &blueprint.deliveries {
            deliveries.push(self.begin_delivery(id, owner, &blueprint, delivery, target)?);
        }
        if let Some(task) = self.try_ability_mut(id)?.cast.as_mut() {
            task.deliveries = deliveries;
        }
        self.poll_cast(id)?;
        Ok(true)
    }

    fn begin_delivery(
        &mut self,
        id: AbilityId,
        caster: UnitId,
        blueprint: &AbilityBlueprint,
        delivery: &Delivery,
        target: Target,
    ) -> EngineResult<DeliveryTask> {
        match delivery {
            Delivery::InstantApply => {
                self.apply_effects(blueprint, target)?;
                Ok(DeliveryTask::Finished)
            }
            Delivery::Projectile { speed, visual } => {
                let Target::Unit(unit) = target else {
                    return Err(invalid_target(blueprint, delivery));
                };
                let from = self.unit_position(caster);
                let to = self.unit_position(unit);
                let handle = self.lifecycle.spawn(visual.as_deref().unwrap_or(&blueprint.name));
                self.lifecycle.place(handle, from);
                Ok(DeliveryTask::Projectile(Flight {
                    speed: *speed,
                    progress: 0.0,
                    from,
                    to,
                    visual: handle,
                }))
            }
            Delivery::Broadcast { sub_ability } => {
                let Target::Player(player) = target else {
                    return Err(invalid_target(blueprint, delivery));
                };
                let sub_blueprint = self.shared_blueprint(sub_ability)?;
                let units: Vec<UnitId> = self
                    .players
                    .get(player.0)
                    .map(|p| p.units().collect())
                    .unwrap_or_default();

                let mut subs = Vec::with_capacity(units.len());
                for unit in units {
                    let handle = self.lifecycle.spawn(sub_ability);
                    let sub = self.abilities.insert(caster, Rc::clone(&sub_blueprint), true);
                    subs.push((sub, handle));
                    self.try_ability_mut(sub)?.phase = AbilityPhase::Activated;
                    self.assign_target(sub, Some(Target::Unit(unit)))?;
                    if sub_blueprint.trigger == Trigger::OnEnable {
                        self.cast(sub)?;
                    }
                }
                debug!("Ability #{} broadcast {} to {} units", id.0, sub_ability, subs.len());
                Ok(DeliveryTask::Broadcast(subs))
            }
        }
    }

    fn apply_effects(&mut self, blueprint: &AbilityBlueprint, target: Target) -> EngineResult<()> {
        for effect in &blueprint.effects {
            self.apply_effect(&blueprint.name, effect, target)?;
        }
        Ok(())
    }

    fn unit_position(&self, id: UnitId) -> Point3 {
        self.unit(id)
            .and_then(|u| u.coord())
            .map_or(Point3::default(), |c| self.grid.world_position(c))
    }

    /// Advance every running cast by `dt` seconds
    pub fn advance_casts(&mut self, dt: f32) -> EngineResult<()> {
        let busy: Vec<AbilityId> = self.abilities.iter().filter(|a| a.is_busy()).map(Ability::id).collect();
        for id in busy {
            // A broadcast finishing earlier in this pass may have freed the slot
            if self.abilities.get(id).is_some_and(Ability::is_busy) {
                self.advance_cast(id, dt)?;
            }
        }
        Ok(())
    }

    fn advance_cast(&mut self, id: AbilityId, dt: f32) -> EngineResult<()> {
        let ability = self.try_ability_mut(id)?;
        let blueprint = ability.blueprint_handle();
        let Some(task) = ability.cast.as_mut() else {
            return Ok(());
        };
        let target = task.target;
        let mut deliveries = std::mem::take(&mut task.deliveries);

        for delivery in &mut deliveries {
            let finished = match delivery {
                DeliveryTask::Finished => false,
                DeliveryTask::Projectile(flight) => {
                    let arrived = flight.advance(dt).is_done();
                    self.lifecycle.place(flight.visual, flight.position());
                    if arrived {
                        self.lifecycle.recycle(flight.visual);
                        self.apply_effects(&blueprint, target)?;
                    }
                    arrived
                }
                DeliveryTask::Broadcast(subs) => {
                    let any_busy = subs
                        .iter()
                        .any(|(sub, _)| self.abilities.get(*sub).is_some_and(Ability::is_busy));
                    if !any_busy {
                        for (sub, handle) in subs.drain(..) {
                            self.lifecycle.recycle(handle);
                            self.abilities.remove(sub);
                        }
                    }
                    !any_busy
                }
            };
            if finished {
                *delivery = DeliveryTask::Finished;
            }
        }

        if let Some(task) = self.try_ability_mut(id)?.cast.as_mut() {
            task.deliveries = deliveries;
        }
        self.poll_cast(id)
    }

    fn poll_cast(&mut self, id: AbilityId) -> EngineResult<()> {
        let done = self
            .try_ability(id)?
            .cast_task()
            .is_some_and(|task| !task.is_busy());
        if done {
            self.resolve_cast(id, true)?;
        }
        Ok(())
    }

    /// Finish a cast. Non-passive abilities go inactive.
    pub(crate) fn resolve_cast(&mut self, id: AbilityId, success: bool) -> EngineResult<()> {
        let ability = self.try_ability_mut(id)?;
        ability.cast = None;
        ability.phase = if ability.is_passive() {
            ability.idle_phase()
        } else {
            AbilityPhase::Inactive
        };
        debug!("{} resolved (success: {})", ability, success);
        if !ability.is_sub_skill() {
            self.publish(GameEvent::CastCompleted { ability: id, success });
        }
        Ok(())
    }

    /// Cast every enabled, idle ability listening for this event's topic.
    /// An ability never reacts to its own completion.
    pub fn fire_event_triggers(&mut self, event: &GameEvent) -> EngineResult<()> {
        let topic = event.topic();
        let listening: Vec<AbilityId> = self
            .abilities
            .iter()
            .filter(|a| a.is_enabled() && !a.is_busy() && *a.trigger() == Trigger::OnEvent(topic))
            .filter(|a| !matches!(event, GameEvent::CastCompleted { ability, .. } if *ability == a.id()))
            .map(Ability::id)
            .collect();
        for id in listening {
            self.cast(id)?;
        }
        Ok(())
    }

    // ========================================================================
    // UNIT LEVEL
    // ========================================================================

    /// Switch the active skill. Ignored while the unit or any of its skills is
    /// busy, or when `index` names no skill.
    pub fn select_skill(&mut self, unit: UnitId, index: Option<usize>) -> EngineResult<bool> {
        let current = self.try_unit(unit)?;
        if current.active_skill_index() == index {
            return Ok(false);
        }
        if current.is_busy() || self.is_any_skill_busy(unit) {
            debug!("Unit #{} is busy, skill selection ignored", unit.0);
            return Ok(false);
        }
        let next = match index {
            Some(i) => match current.skills().get(i) {
                Some(skill) => Some(*skill),
                None => {
                    warn!("Unit #{} has no skill {}", unit.0, i);
                    return Ok(false);
                }
            },
            None => None,
        };
        let previous = current.active_skill();

        self.try_unit_mut(unit)?.active_skill = index;
        if let Some(next) = next {
            self.activate(next)?;
        }
        if let Some(previous) = previous {
            self.deactivate(previous)?;
        }
        Ok(true)
    }

    /// Enable or disable melee and ranged weapons without publishing
    pub fn set_weapons_enabled(&mut self, unit: UnitId, enabled: bool) -> EngineResult<()> {
        let current = self.try_unit(unit)?;
        let weapons: Vec<AbilityId> = current.melee().into_iter().chain(current.ranged()).collect();
        for weapon in weapons {
            if enabled {
                self.enable_silently(weapon)?;
            } else {
                self.disable_silently(weapon)?;
            }
        }
        Ok(())
    }
}

fn invalid_target(blueprint: &AbilityBlueprint, delivery: &Delivery) -> EngineError {
    EngineError::InvalidTargetType {
        ability: blueprint.name.clone(),
        effect: delivery.name(),
    }
}
