//! Units, their stats and movement

use serde::{Deserialize, Serialize};

use crate::ability::AbilityId;
use crate::hex::{HexCoord, HexLayout, Point3};
use crate::lifecycle::InstanceHandle;
use crate::player::PlayerId;
use crate::task::TaskStatus;

/// Maximum skills per unit, weapons excluded
pub const MAX_SKILLS: usize = 8;

/// Index into the unit arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub usize);

/// Static unit stats
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStats {
    pub max_health: i32,
    pub max_mana: i32,
    pub armor: i32,
    /// Chance in [0, 1] to dodge a dodgeable hit
    pub dodge_chance: f32,
    /// Movement points per turn
    pub movement_range: u32,
    /// Hexes per second while walking
    pub movement_speed: f32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            max_health: 10,
            max_mana: 0,
            armor: 0,
            dodge_chance: 0.0,
            movement_range: 2,
            movement_speed: 4.0,
        }
    }
}

// ============================================================================
// MOVEMENT
// ============================================================================

/// Walk along a path one hex at a time
#[derive(Clone, Debug, PartialEq)]
pub struct MoveTask {
    start: HexCoord,
    path: Vec<HexCoord>,
    step: usize,
    progress: f32,
}

impl MoveTask {
    /// `path` excludes `start`
    pub fn new(start: HexCoord, path: Vec<HexCoord>) -> Self {
        Self {
            start,
            path,
            step: 0,
            progress: 0.0,
        }
    }

    pub fn start(&self) -> HexCoord {
        self.start
    }

    pub fn path(&self) -> &[HexCoord] {
        &self.path
    }

    pub fn destination(&self) -> HexCoord {
        self.path.last().copied().unwrap_or(self.start)
    }

    /// Advance by `dt` seconds at `speed` hexes per second
    pub fn advance(&mut self, dt: f32, speed: f32) -> TaskStatus {
        if speed <= 0.0 {
            self.step = self.path.len();
        } else {
            self.progress += dt * speed;
            while self.progress >= 1.0 && self.step < self.path.len() {
                self.progress -= 1.0;
                self.step += 1;
            }
        }
        if self.step >= self.path.len() {
            self.progress = 0.0;
            TaskStatus::Done
        } else {
            TaskStatus::Pending
        }
    }

    /// Interpolated world position
    pub fn position(&self, layout: &HexLayout) -> Point3 {
        let from = if self.step == 0 {
            self.start
        } else {
            self.path[self.step - 1]
        };
        match self.path.get(self.step) {
            Some(to) => layout
                .world_position(from)
                .lerp(layout.world_position(*to), self.progress),
            None => layout.world_position(self.destination()),
        }
    }
}

// ============================================================================
// UNIT
// ============================================================================

#[derive(Clone, Debug)]
pub struct Unit {
    id: UnitId,
    template: String,
    name: String,
    stats: UnitStats,
    health: i32,
    mana: i32,
    pub(crate) owner: Option<PlayerId>,
    pub(crate) skills: Vec<AbilityId>,
    pub(crate) melee: Option<AbilityId>,
    pub(crate) ranged: Option<AbilityId>,
    pub(crate) active_skill: Option<usize>,
    pub(crate) coord: Option<HexCoord>,
    pub(crate) movement: Option<MoveTask>,
    pub(crate) instance: Option<InstanceHandle>,
}

impl Unit {
    pub fn new(id: UnitId, template: &str, name: &str, stats: UnitStats) -> Self {
        Self {
            id,
            template: template.to_string(),
            name: name.to_string(),
            health: stats.max_health,
            mana: stats.max_mana,
            stats,
            owner: None,
            skills: Vec::new(),
            melee: None,
            ranged: None,
            active_skill: None,
            coord: None,
            movement: None,
            instance: None,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> &UnitStats {
        &self.stats
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn mana(&self) -> i32 {
        self.mana
    }

    pub fn armor(&self) -> i32 {
        self.stats.armor
    }

    pub fn dodge_chance(&self) -> f32 {
        self.stats.dodge_chance
    }

    pub fn movement_range(&self) -> u32 {
        self.stats.movement_range
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn coord(&self) -> Option<HexCoord> {
        self.coord
    }

    pub fn skills(&self) -> &[AbilityId] {
        &self.skills
    }

    pub fn melee(&self) -> Option<AbilityId> {
        self.melee
    }

    pub fn ranged(&self) -> Option<AbilityId> {
        self.ranged
    }

    pub fn active_skill_index(&self) -> Option<usize> {
        self.active_skill
    }

    pub fn active_skill(&self) -> Option<AbilityId> {
        self.active_skill.and_then(|i| self.skills.get(i).copied())
    }

    /// Skills, then melee, then ranged
    pub fn abilities(&self) -> impl Iterator<Item = AbilityId> + '_ {
        self.skills
            .iter()
            .copied()
            .chain(self.melee)
            .chain(self.ranged)
    }

    pub fn instance(&self) -> Option<InstanceHandle> {
        self.instance
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    /// Walking along a path
    pub fn is_busy(&self) -> bool {
        self.movement.is_some()
    }

    pub fn movement(&self) -> Option<&MoveTask> {
        self.movement.as_ref()
    }

    pub fn is_enemy_of(&self, other: &Unit) -> bool {
        self.owner != other.owner
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Clamp into `0..=max_health`. Returns the applied delta.
    pub fn set_health(&mut self, value: i32) -> i32 {
        let value = value.clamp(0, self.stats.max_health);
        let delta = value - self.health;
        self.health = value;
        delta
    }

    /// Clamp into `0..=max_mana`. Returns the applied delta.
    pub fn set_mana(&mut self, value: i32) -> i32 {
        let value = value.clamp(0, self.stats.max_mana);
        let delta = value - self.mana;
        self.mana = value;
        delta
    }

    /// Back to full health and mana, off the board
    pub fn reset(&mut self) {
        self.health = self.stats.max_health;
        self.mana = self.stats.max_mana;
        self.active_skill = None;
        self.coord = None;
        self.movement = None;
    }
}
