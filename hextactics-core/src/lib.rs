//! HexTactics Core - turn-based hex combat simulation
//!
//! This crate provides the engine-independent core of a two-player tactics
//! game:
//! - Hex geometry and an offset-row grid with roadblocks
//! - Weighted shortest-path search
//! - Composable abilities (aim, cast trigger, delivery, effects)
//! - Army build, turn rotation and win detection
//!
//! Presentation hooks are abstracted behind [`ObjectLifecycle`]; time only
//! advances through [`Battle::tick`].

pub mod hex;
pub mod grid;
pub mod pathfinding;
pub mod error;
pub mod config;
pub mod task;
pub mod lifecycle;
pub mod unit;
pub mod player;
pub mod turn;
pub mod events;
pub mod roster;
pub mod ability;
pub mod world;
pub mod highlight;
pub mod battle;

// Re-exports for convenient access
pub use hex::{hex_distance, HexCoord, HexLayout, Point3, DIRECTIONS};
pub use grid::{Grid, Highlight, HighlightTone, Tile};
pub use pathfinding::{find_hex_path, HexPathDomain, SearchDomain, ShortestPathSearch};
pub use error::{CompositionError, ConfigError, EngineError, EngineResult};
pub use config::{GridConfig, MatchConfig, PLAYER_COUNT};
pub use task::{Countdown, TaskStatus};
pub use lifecycle::{InstanceHandle, NullLifecycle, ObjectLifecycle};
pub use unit::{Unit, UnitId, UnitStats, MAX_SKILLS};
pub use player::{Player, PlayerId};
pub use turn::{GameOutcome, GameState, TurnState};
pub use events::{EventBus, GameEvent, Topic};
pub use roster::{army_size, roster_key, Roster, RosterSource, UnitCatalog, UnitTemplate};
pub use ability::{Ability, AbilityId, AbilityPhase, AbilityTemplate, Component, Effect, Target};
pub use world::World;
pub use highlight::{ActionCache, CacheCategory};
pub use battle::Battle;
