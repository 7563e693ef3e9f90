//! Roster and unit catalog data
//!
//! The roster lists one unit template per army slot under the keys `name0`,
//! `name1`, ... The first missing key ends the army. The catalog holds the unit
//! and ability templates those names refer to.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityBlueprint, AbilityTemplate};
use crate::error::CompositionError;
use crate::unit::{UnitStats, MAX_SKILLS};

/// Prefix of roster slot keys
pub const ROSTER_KEY_PREFIX: &str = "name";

pub fn roster_key(slot: usize) -> String {
    format!("{}{}", ROSTER_KEY_PREFIX, slot)
}

/// Keyed access to roster slots
pub trait RosterSource {
    /// Unit template id stored under `key`
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Number of consecutive filled slots, capped at `max`
pub fn army_size(source: &dyn RosterSource, max: usize) -> usize {
    (0..max)
        .find(|slot| source.lookup(&roster_key(*slot)).is_none())
        .unwrap_or(max)
}

/// JSON-backed roster
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    entries: BTreeMap<String, String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill slots `name0..` in order
    pub fn from_units(units: &[&str]) -> Self {
        let entries = units
            .iter()
            .enumerate()
            .map(|(slot, unit)| (roster_key(slot), unit.to_string()))
            .collect();
        Self { entries }
    }

    pub fn insert(&mut self, key: &str, unit: &str) {
        self.entries.insert(key.to_string(), unit.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load from JSON file. Accepts a `{"name0": ...}` map or a plain list of
    /// unit ids.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster: {}", path.display()))?;

        if let Ok(roster) = serde_json::from_str::<Roster>(&content) {
            return Ok(roster);
        }

        let units: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse roster: {}", path.display()))?;
        let names: Vec<&str> = units.iter().map(String::as_str).collect();
        Ok(Self::from_units(&names))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl RosterSource for Roster {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

impl RosterSource for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// Unit definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub id: String,
    /// Display name, defaults to the id
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub stats: UnitStats,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub melee: Option<String>,
    #[serde(default)]
    pub ranged: Option<String>,
}

impl UnitTemplate {
    pub fn new(id: &str, stats: UnitStats) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            stats,
            skills: Vec::new(),
            melee: None,
            ranged: None,
        }
    }

    pub fn with_melee(mut self, ability: &str) -> Self {
        self.melee = Some(ability.to_string());
        self
    }

    pub fn with_ranged(mut self, ability: &str) -> Self {
        self.ranged = Some(ability.to_string());
        self
    }

    pub fn with_skill(mut self, ability: &str) -> Self {
        self.skills.push(ability.to_string());
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Every ability this unit refers to
    pub fn ability_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.skills
            .iter()
            .chain(self.melee.iter())
            .chain(self.ranged.iter())
            .map(String::as_str)
    }
}

/// Unit and ability templates
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitCatalog {
    #[serde(default)]
    pub units: Vec<UnitTemplate>,
    #[serde(default)]
    pub abilities: Vec<AbilityTemplate>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: UnitTemplate) -> Self {
        self.units.push(unit);
        self
    }

    pub fn with_ability(mut self, ability: AbilityTemplate) -> Self {
        self.abilities.push(ability);
        self
    }

    pub fn unit(&self, id: &str) -> Option<&UnitTemplate> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn ability(&self, name: &str) -> Option<&AbilityTemplate> {
        self.abilities.iter().find(|a| a.name == name)
    }

    /// Validate every template and build the ability blueprints
    pub fn compose(&self) -> Result<FxHashMap<String, AbilityBlueprint>, CompositionError> {
        let mut blueprints = FxHashMap::default();
        for template in &self.abilities {
            blueprints.insert(template.name.clone(), AbilityBlueprint::compose(template)?);
        }

        for blueprint in blueprints.values() {
            if let Some(sub) = blueprint.broadcast_target() {
                if !blueprints.contains_key(sub) {
                    return Err(CompositionError::UnknownAbility(sub.to_string()));
                }
            }
        }

        for unit in &self.units {
            if unit.skills.len() > MAX_SKILLS {
                return Err(CompositionError::TooManySkills {
                    unit: unit.id.clone(),
                    count: unit.skills.len(),
                    max: MAX_SKILLS,
                });
            }
            for name in unit.ability_names() {
                if !blueprints.contains_key(name) {
                    return Err(CompositionError::UnknownAbility(name.to_string()));
                }
            }
            if let Some(melee) = &unit.melee {
                blueprints[melee].check_melee()?;
            }
        }

        Ok(blueprints)
    }

    /// Load and validate a catalog from JSON
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read unit catalog: {}", path.display()))?;
        let catalog: UnitCatalog = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse unit catalog: {}", path.display()))?;
        catalog
            .compose()
            .with_context(|| format!("Invalid unit catalog: {}", path.display()))?;
        Ok(catalog)
    }
}
