//! Aim modes: who an ability may target

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::hex::HexCoord;
use crate::unit::{Unit, UnitId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Aim {
    /// Targets the active player as a whole. Set when the ability is enabled.
    Player,
    /// Targets a unit picked on the grid
    Unit(UnitAim),
}

impl Aim {
    pub fn as_unit(&self) -> Option<&UnitAim> {
        match self {
            Aim::Unit(aim) => Some(aim),
            Aim::Player => None,
        }
    }
}

/// Pick a unit within a hex distance band
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitAim {
    pub range_min: u32,
    pub range_max: u32,
    /// Enemies when set, allies otherwise
    pub target_enemy: bool,
    pub can_target_self: bool,
    /// Usable with a living enemy adjacent to the caster
    pub can_cast_surrounded: bool,
}

impl Default for UnitAim {
    fn default() -> Self {
        Self {
            range_min: 0,
            range_max: 1,
            target_enemy: true,
            can_target_self: false,
            can_cast_surrounded: false,
        }
    }
}

impl UnitAim {
    pub fn new(range_min: u32, range_max: u32, target_enemy: bool) -> Self {
        Self {
            range_min,
            range_max,
            target_enemy,
            ..Default::default()
        }
    }

    /// Melee weapons reach exactly the adjacent ring
    pub fn is_melee_range(&self) -> bool {
        self.range_min == 0 && self.range_max == 1
    }

    pub fn is_legal_target(&self, caster: &Unit, candidate: &Unit) -> bool {
        if candidate.is_dead() {
            return false;
        }
        if candidate.id() == caster.id() {
            return self.can_target_self;
        }
        caster.is_enemy_of(candidate) == self.target_enemy
    }

    /// Hexes holding a legal target, the caster's own hex first when
    /// self-targeting is allowed. Empty while the caster is surrounded.
    pub fn available_hexes<'u>(
        &self,
        grid: &Grid,
        caster: &Unit,
        surrounded: bool,
        unit: impl Fn(UnitId) -> Option<&'u Unit>,
    ) -> Vec<HexCoord> {
        let Some(center) = caster.coord() else {
            return Vec::new();
        };
        if surrounded && !self.can_cast_surrounded {
            return Vec::new();
        }

        let mut hexes = Vec::new();
        if self.can_target_self {
            hexes.push(center);
        }
        for tile in grid.hexes_in_range(center, self.range_min, self.range_max) {
            let legal = tile
                .occupant()
                .and_then(&unit)
                .is_some_and(|candidate| self.is_legal_target(caster, candidate));
            if legal && !hexes.contains(&tile.coord()) {
                hexes.push(tile.coord());
            }
        }
        hexes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;
    use crate::unit::UnitStats;

    fn unit(id: usize, owner: usize, coord: HexCoord) -> Unit {
        let mut unit = Unit::new(UnitId(id), "pawn", "Pawn", UnitStats::default());
        unit.owner = Some(PlayerId(owner));
        unit.coord = Some(coord);
        unit
    }

    fn board(units: &[Unit]) -> Grid {
        let mut grid = Grid::new(6, 6);
        for u in units {
            grid.set_occupant(u.coord().unwrap(), u.id()).unwrap();
        }
        grid
    }

    #[test]
    fn test_legal_targets() {
        let caster = unit(0, 0, HexCoord::new(0, 0));
        let ally = unit(1, 0, HexCoord::new(1, 0));
        let mut enemy = unit(2, 1, HexCoord::new(0, 1));

        let aim = UnitAim::new(0, 1, true);
        assert!(aim.is_legal_target(&caster, &enemy));
        assert!(!aim.is_legal_target(&caster, &ally));
        assert!(!aim.is_legal_target(&caster, &caster));

        let support = UnitAim {
            target_enemy: false,
            can_target_self: true,
            ..Default::default()
        };
        assert!(support.is_legal_target(&caster, &ally));
        assert!(support.is_legal_target(&caster, &caster));

        enemy.set_health(0);
        assert!(!aim.is_legal_target(&caster, &enemy));
    }

    #[test]
    fn test_available_hexes_respect_range() {
        let units = vec![
            unit(0, 0, HexCoord::new(1, 2)),
            unit(1, 1, HexCoord::new(2, 2)),
            unit(2, 1, HexCoord::new(3, 2)),
        ];
        let grid = board(&units);
        let lookup = |id: UnitId| units.get(id.0);

        let melee = UnitAim {
            can_cast_surrounded: true,
            ..UnitAim::new(0, 1, true)
        };
        let hexes = melee.available_hexes(&grid, &units[0], false, lookup);
        assert_eq!(hexes, vec![HexCoord::new(2, 2)]);

        let bow = UnitAim::new(2, 3, true);
        let hexes = bow.available_hexes(&grid, &units[0], false, lookup);
        assert_eq!(hexes, vec![HexCoord::new(3, 2)]);
    }

    #[test]
    fn test_surrounded_caster_has_no_targets() {
        let units = vec![unit(0, 0, HexCoord::new(1, 2)), unit(1, 1, HexCoord::new(2, 2))];
        let grid = board(&units);
        let lookup = |id: UnitId| units.get(id.0);

        let bow = UnitAim::new(1, 3, true);
        assert!(bow.available_hexes(&grid, &units[0], true, lookup).is_empty());

        let brawler = UnitAim {
            can_cast_surrounded: true,
            ..UnitAim::new(1, 3, true)
        };
        assert_eq!(brawler.available_hexes(&grid, &units[0], true, lookup).len(), 1);
    }

    #[test]
    fn test_self_target_listed_first() {
        let units = vec![unit(0, 0, HexCoord::new(1, 2)), unit(1, 0, HexCoord::new(2, 2))];
        let grid = board(&units);
        let heal = UnitAim {
            target_enemy: false,
            can_target_self: true,
            range_max: 2,
            ..Default::default()
        };
        let hexes = heal.available_hexes(&grid, &units[0], false, |id| units.get(id.0));
        assert_eq!(hexes, vec![HexCoord::new(1, 2), HexCoord::new(2, 2)]);
    }
}
