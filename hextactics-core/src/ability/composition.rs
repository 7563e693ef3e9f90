//! Ability templates and their validation into blueprints
//!
//! A template is a flat list of components as it appears in data files.
//! Composing it sorts the components into aim, trigger, deliveries and
//! effects, and rejects any cardinality violation up front.

use serde::{Deserialize, Serialize};

use crate::ability::aim::{Aim, UnitAim};
use crate::ability::cast::{Delivery, Trigger};
use crate::ability::effect::Effect;
use crate::error::CompositionError;
use crate::events::Topic;

/// One building block of an ability
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    PlayerAim,
    UnitAim(UnitAim),
    ClickCast,
    CastOnTargetSelected,
    CastOnEvent {
        topic: Topic,
    },
    CastOnEnable,
    InstantApply,
    Projectile {
        speed: f32,
        #[serde(default)]
        visual: Option<String>,
    },
    Broadcast {
        sub_ability: String,
    },
    Damage {
        amount: i32,
        #[serde(default)]
        can_be_dodged: bool,
        #[serde(default)]
        ignore_armor: bool,
    },
    Heal {
        amount: i32,
    },
    Mana {
        amount: i32,
    },
    SpawnVisual {
        template: String,
    },
}

/// Ability definition as stored in the unit catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityTemplate {
    pub name: String,
    #[serde(default)]
    pub mana_cost: i32,
    /// Passive abilities stay enabled after a cast and never end the turn
    #[serde(default)]
    pub passive: bool,
    pub components: Vec<Component>,
}

impl AbilityTemplate {
    pub fn new(name: &str, components: Vec<Component>) -> Self {
        Self {
            name: name.to_string(),
            mana_cost: 0,
            passive: false,
            components,
        }
    }

    pub fn with_mana_cost(mut self, cost: i32) -> Self {
        self.mana_cost = cost;
        self
    }

    pub fn passive(mut self) -> Self {
        self.passive = true;
        self
    }
}

/// A validated ability definition
#[derive(Clone, Debug, PartialEq)]
pub struct AbilityBlueprint {
    pub name: String,
    pub mana_cost: i32,
    pub passive: bool,
    pub aim: Aim,
    pub trigger: Trigger,
    pub deliveries: Vec<Delivery>,
    pub effects: Vec<Effect>,
}

impl AbilityBlueprint {
    pub fn compose(template: &AbilityTemplate) -> Result<Self, CompositionError> {
        let name = || template.name.clone();
        let mut aim = None;
        let mut trigger = None;
        let mut deliveries = Vec::new();
        let mut effects = Vec::new();

        for component in &template.components {
            match component {
                Component::PlayerAim => set_once(&mut aim, Aim::Player, CompositionError::DuplicateAim(name()))?,
                Component::UnitAim(unit_aim) => {
                    set_once(&mut aim, Aim::Unit(unit_aim.clone()), CompositionError::DuplicateAim(name()))?
                }
                Component::ClickCast => set_once(&mut trigger, Trigger::Click, CompositionError::DuplicateCast(name()))?,
                Component::CastOnTargetSelected => set_once(
                    &mut trigger,
                    Trigger::OnTargetSelected,
                    CompositionError::DuplicateCast(name()),
                )?,
                Component::CastOnEvent { topic } => set_once(
                    &mut trigger,
                    Trigger::OnEvent(*topic),
                    CompositionError::DuplicateCast(name()),
                )?,
                Component::CastOnEnable => {
                    set_once(&mut trigger, Trigger::OnEnable, CompositionError::DuplicateCast(name()))?
                }
                Component::InstantApply => deliveries.push(Delivery::InstantApply),
                Component::Projectile { speed, visual } => deliveries.push(Delivery::Projectile {
                    speed: *speed,
                    visual: visual.clone(),
                }),
                Component::Broadcast { sub_ability } => {
                    if deliveries.iter().any(|d| matches!(d, Delivery::Broadcast { .. })) {
                        return Err(CompositionError::DuplicateBroadcast(name()));
                    }
                    deliveries.push(Delivery::Broadcast {
                        sub_ability: sub_ability.clone(),
                    });
                }
                Component::Damage {
                    amount,
                    can_be_dodged,
                    ignore_armor,
                } => effects.push(Effect::Damage {
                    amount: *amount,
                    can_be_dodged: *can_be_dodged,
                    ignore_armor: *ignore_armor,
                }),
                Component::Heal { amount } => effects.push(Effect::Heal { amount: *amount }),
                Component::Mana { amount } => effects.push(Effect::Mana { amount: *amount }),
                Component::SpawnVisual { template } => effects.push(Effect::SpawnVisual {
                    template: template.clone(),
                }),
            }
        }

        Ok(Self {
            name: template.name.clone(),
            mana_cost: template.mana_cost,
            passive: template.passive,
            aim: aim.ok_or_else(|| CompositionError::MissingAim(name()))?,
            trigger: trigger.ok_or_else(|| CompositionError::MissingCast(name()))?,
            deliveries,
            effects,
        })
    }

    /// Name of the sub-ability a broadcast delivery re-casts, if any
    pub fn broadcast_target(&self) -> Option<&str> {
        self.deliveries.iter().find_map(|d| match d {
            Delivery::Broadcast { sub_ability } => Some(sub_ability.as_str()),
            _ => None,
        })
    }

    /// Check this blueprint may serve as a melee weapon
    pub fn check_melee(&self) -> Result<(), CompositionError> {
        match self.aim.as_unit() {
            Some(aim) if aim.is_melee_range() => Ok(()),
            _ => Err(CompositionError::InvalidMeleeRange(self.name.clone())),
        }
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, duplicate: CompositionError) -> Result<(), CompositionError> {
    if slot.is_some() {
        return Err(duplicate);
    }
    *slot = Some(value);
    Ok(())
}
