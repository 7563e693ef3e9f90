//! Ability system
//!
//! An ability is composed from one aim mode, one cast trigger, any number of
//! deliveries and any number of effects. Runtime state lives in an arena
//! owned by the [`World`](crate::world::World); the operations that drive the
//! phase machine are in [`engine`].

pub mod aim;
pub mod cast;
pub mod composition;
pub mod effect;
mod engine;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;
use crate::unit::UnitId;

pub use aim::{Aim, UnitAim};
pub use cast::{CastTask, Delivery, DeliveryTask, Trigger};
pub use composition::{AbilityBlueprint, AbilityTemplate, Component};
pub use effect::{mitigated_damage, Effect};

/// Index into the ability arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilityId(pub usize);

/// What an ability acts on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Unit(UnitId),
    Player(PlayerId),
}

/// Ability lifecycle: Inactive -> Activated -> TargetAssigned -> Casting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityPhase {
    #[default]
    Inactive,
    Activated,
    TargetAssigned,
    Casting,
}

#[derive(Clone, Debug)]
pub struct Ability {
    id: AbilityId,
    owner: UnitId,
    blueprint: Rc<AbilityBlueprint>,
    sub_skill: bool,
    pub(crate) target: Option<Target>,
    pub(crate) phase: AbilityPhase,
    pub(crate) cast: Option<CastTask>,
}

impl Ability {
    pub fn new(id: AbilityId, owner: UnitId, blueprint: Rc<AbilityBlueprint>, sub_skill: bool) -> Self {
        Self {
            id,
            owner,
            blueprint,
            sub_skill,
            target: None,
            phase: AbilityPhase::Inactive,
            cast: None,
        }
    }

    pub fn id(&self) -> AbilityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.blueprint.name
    }

    pub fn owner(&self) -> UnitId {
        self.owner
    }

    pub fn blueprint(&self) -> &AbilityBlueprint {
        &self.blueprint
    }

    pub(crate) fn blueprint_handle(&self) -> Rc<AbilityBlueprint> {
        Rc::clone(&self.blueprint)
    }

    pub fn aim(&self) -> &Aim {
        &self.blueprint.aim
    }

    pub fn trigger(&self) -> &Trigger {
        &self.blueprint.trigger
    }

    pub fn mana_cost(&self) -> i32 {
        self.blueprint.mana_cost
    }

    pub fn is_passive(&self) -> bool {
        self.blueprint.passive
    }

    /// Spawned by a broadcast. Sub-skills never publish events.
    pub fn is_sub_skill(&self) -> bool {
        self.sub_skill
    }

    pub fn target(&self) -> Option<Target> {
        self.target
    }

    pub fn phase(&self) -> AbilityPhase {
        self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.phase != AbilityPhase::Inactive
    }

    /// A cast is running
    pub fn is_busy(&self) -> bool {
        self.cast.is_some()
    }

    pub fn cast_task(&self) -> Option<&CastTask> {
        self.cast.as_ref()
    }

    /// Phase an enabled, idle ability rests in
    pub(crate) fn idle_phase(&self) -> AbilityPhase {
        if self.target.is_some() {
            AbilityPhase::TargetAssigned
        } else {
            AbilityPhase::Activated
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name(), self.id.0)
    }
}

/// Slot arena for abilities. Freed slots are reused by later insertions.
#[derive(Clone, Debug, Default)]
pub struct AbilityArena {
    slots: Vec<Option<Ability>>,
    free: Vec<usize>,
}

impl AbilityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, owner: UnitId, blueprint: Rc<AbilityBlueprint>, sub_skill: bool) -> AbilityId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        let id = AbilityId(index);
        self.slots[index] = Some(Ability::new(id, owner, blueprint, sub_skill));
        id
    }

    pub fn remove(&mut self, id: AbilityId) -> Option<Ability> {
        let ability = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        Some(ability)
    }

    pub fn get(&self, id: AbilityId) -> Option<&Ability> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: AbilityId) -> Option<&mut Ability> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ability> + '_ {
        self.slots.iter().flatten()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
