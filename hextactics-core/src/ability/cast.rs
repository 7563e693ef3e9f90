//! Cast triggers, deliveries and the running cast task

use serde::{Deserialize, Serialize};

use crate::ability::{AbilityId, Target};
use crate::events::Topic;
use crate::hex::Point3;
use crate::lifecycle::InstanceHandle;
use crate::task::TaskStatus;

/// What starts a cast. Every ability has exactly one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// An external click once a target is set
    Click,
    /// As soon as a target is assigned
    OnTargetSelected,
    /// When `Topic` is published while the ability is enabled
    OnEvent(Topic),
    /// When the ability is enabled
    OnEnable,
}

/// How effects reach the target
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Delivery {
    /// Effects land immediately
    InstantApply,
    /// A visual travels to the target, effects land on arrival
    Projectile { speed: f32, visual: Option<String> },
    /// Re-cast `sub_ability` on every unit of the target player
    Broadcast { sub_ability: String },
}

impl Delivery {
    pub fn name(&self) -> &'static str {
        match self {
            Delivery::InstantApply => "InstantApply",
            Delivery::Projectile { .. } => "Projectile",
            Delivery::Broadcast { .. } => "Broadcast",
        }
    }
}

/// A projectile in flight
#[derive(Clone, Debug, PartialEq)]
pub struct Flight {
    pub(crate) speed: f32,
    pub(crate) progress: f32,
    pub(crate) from: Point3,
    pub(crate) to: Point3,
    pub(crate) visual: InstanceHandle,
}

impl Flight {
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn position(&self) -> Point3 {
        self.from.lerp(self.to, self.progress.min(1.0))
    }

    pub fn advance(&mut self, dt: f32) -> TaskStatus {
        if self.speed <= 0.0 {
            self.progress = 1.0;
        } else {
            self.progress += dt * self.speed;
        }
        if self.progress >= 1.0 {
            TaskStatus::Done
        } else {
            TaskStatus::Pending
        }
    }
}

/// Runtime state of one delivery
#[derive(Clone, Debug, PartialEq)]
pub enum DeliveryTask {
    Finished,
    Projectile(Flight),
    /// Sub-abilities and the instances spawned for them
    Broadcast(Vec<(AbilityId, InstanceHandle)>),
}

impl DeliveryTask {
    pub fn is_busy(&self) -> bool {
        !matches!(self, DeliveryTask::Finished)
    }
}

/// A cast in progress. The owning ability is busy while it exists.
#[derive(Clone, Debug, PartialEq)]
pub struct CastTask {
    /// Target locked in when the cast began
    pub(crate) target: Target,
    pub(crate) deliveries: Vec<DeliveryTask>,
}

impl CastTask {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            deliveries: Vec::new(),
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn deliveries(&self) -> &[DeliveryTask] {
        &self.deliveries
    }

    pub fn is_busy(&self) -> bool {
        self.deliveries.iter().any(DeliveryTask::is_busy)
    }
}
