//! Effects applied to an ability's target

use serde::{Deserialize, Serialize};

/// Something that happens to the target when a delivery lands
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Damage {
        amount: i32,
        can_be_dodged: bool,
        ignore_armor: bool,
    },
    Heal {
        amount: i32,
    },
    Mana {
        amount: i32,
    },
    /// Visual only, placed on the target
    SpawnVisual {
        template: String,
    },
}

impl Effect {
    pub fn damage(amount: i32) -> Self {
        Effect::Damage {
            amount,
            can_be_dodged: false,
            ignore_armor: false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Damage { .. } => "Damage",
            Effect::Heal { .. } => "Heal",
            Effect::Mana { .. } => "Mana",
            Effect::SpawnVisual { .. } => "SpawnVisual",
        }
    }
}

/// Damage left after armor. A hit that connects always deals at least 1.
pub fn mitigated_damage(amount: i32, armor: i32, ignore_armor: bool) -> i32 {
    if ignore_armor {
        amount
    } else {
        (amount - armor).max(1)
    }
}
