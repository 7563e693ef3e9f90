//! Selection cache
//!
//! Tiles the current selection can act on, grouped by what a click on them
//! does. Rebuilt from scratch on every selection.

use crate::hex::HexCoord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// Targets of the active skill
    DirectAction,
    /// Targets of the melee or ranged attack
    DirectAttack,
    /// Empty tiles the active unit can walk to
    Move,
    /// Informational only
    Other,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 4] = [
        CacheCategory::DirectAction,
        CacheCategory::DirectAttack,
        CacheCategory::Move,
        CacheCategory::Other,
    ];

    fn index(self) -> usize {
        match self {
            CacheCategory::DirectAction => 0,
            CacheCategory::DirectAttack => 1,
            CacheCategory::Move => 2,
            CacheCategory::Other => 3,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionCache {
    tiles: [Vec<HexCoord>; 4],
    /// (tile to move to, enemy tile to melee from there)
    pairs: Vec<(HexCoord, HexCoord)>,
}

impl ActionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the tile was already cached under `category`
    pub fn add(&mut self, category: CacheCategory, coord: HexCoord) -> bool {
        let tiles = &mut self.tiles[category.index()];
        if tiles.contains(&coord) {
            return false;
        }
        tiles.push(coord);
        true
    }

    pub fn contains(&self, category: CacheCategory, coord: HexCoord) -> bool {
        self.tiles[category.index()].contains(&coord)
    }

    /// Cached tiles in insertion order
    pub fn tiles(&self, category: CacheCategory) -> &[HexCoord] {
        &self.tiles[category.index()]
    }

    pub fn add_pair(&mut self, move_to: HexCoord, attack: HexCoord) -> bool {
        if self.pairs.contains(&(move_to, attack)) {
            return false;
        }
        self.pairs.push((move_to, attack));
        true
    }

    pub fn pairs(&self) -> &[(HexCoord, HexCoord)] {
        &self.pairs
    }

    /// Tiles from which `attack` can be meleed after moving
    pub fn pairs_for(&self, attack: HexCoord) -> impl Iterator<Item = HexCoord> + '_ {
        self.pairs
            .iter()
            .filter(move |(_, target)| *target == attack)
            .map(|(move_to, _)| *move_to)
    }

    /// Forget a tile everywhere, e.g. when its unit dies
    pub fn remove_tile(&mut self, coord: HexCoord) {
        for tiles in &mut self.tiles {
            tiles.retain(|c| *c != coord);
        }
        self.pairs.retain(|(move_to, attack)| *move_to != coord && *attack != coord);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.tiles.iter().all(Vec::is_empty)
    }

    /// Empty the cache. Returns every tile it touched so their highlight can
    /// be reset.
    pub fn clear(&mut self) -> Vec<HexCoord> {
        let mut touched: Vec<HexCoord> = self.pairs.drain(..).map(|(_, attack)| attack).collect();
        for tiles in &mut self.tiles {
            for coord in tiles.drain(..) {
                if !touched.contains(&coord) {
                    touched.push(coord);
                }
            }
        }
        touched
    }
}
