//! Error types for the simulation core

use crate::hex::HexCoord;

/// Ability composition failures, raised while building abilities from templates.
///
/// These never reach a running match: `Battle::new` and `start_game` refuse to
/// proceed when a template is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    #[error("ability '{0}' has no aim mode")]
    MissingAim(String),

    #[error("ability '{0}' can only have 1 aim mode")]
    DuplicateAim(String),

    #[error("ability '{0}' has no cast mode")]
    MissingCast(String),

    #[error("ability '{0}' can only have 1 cast mode")]
    DuplicateCast(String),

    #[error("ability '{0}' can only have 1 broadcast delivery")]
    DuplicateBroadcast(String),

    #[error("unit '{unit}' has {count} skills, at most {max} allowed")]
    TooManySkills { unit: String, count: usize, max: usize },

    #[error("melee ability '{0}' must aim at units with range [0, 1]")]
    InvalidMeleeRange(String),

    #[error("unknown ability template: {0}")]
    UnknownAbility(String),
}

/// Configuration validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid must be at least 2x2 hexes, got {width}x{height}")]
    GridTooSmall { width: usize, height: usize },

    #[error("roadblock chance must be within [0, 1], got {0}")]
    RoadblockChance(f32),

    #[error("hex size must be positive, got {0}")]
    HexSize(f32),

    #[error("max army size must be within 1..=10, got {0}")]
    ArmySize(usize),

    #[error("max spawn distance must be within 1..=3, got {0}")]
    SpawnDistance(usize),

    #[error("first player {first} out of range for {players} players")]
    FirstPlayer { first: usize, players: usize },
}

/// Fatal engine errors. These signal a caller or data bug and are not recovered.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{effect} on ability '{ability}' requires a unit target")]
    InvalidTargetType { ability: String, effect: &'static str },

    #[error("no tile at {0}")]
    TileNotFound(HexCoord),

    #[error("unknown unit template: {0}")]
    UnknownUnitTemplate(String),

    #[error("roster data unavailable")]
    RosterUnavailable,

    #[error("no such unit: {0}")]
    NoSuchUnit(usize),

    #[error("no such ability: {0}")]
    NoSuchAbility(usize),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;
