//! Hex grid storage, range and reachability queries
//!
//! Tiles are stored in a jagged array of rows. Even rows hold `width` tiles,
//! odd rows one fewer. Row `r`, column `c` holds axial `q = c - (r - (r & 1)) / 2`.

use std::collections::VecDeque;

use rand::Rng;
use rustc_hash::FxHashSet;

use crate::config::GridConfig;
use crate::error::{EngineError, EngineResult};
use crate::hex::{HexCoord, HexLayout, Point3};
use crate::unit::UnitId;

/// Visual mark a collaborator should draw on a tile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightTone {
    /// Plain highlight (movement, placement band)
    Standard,
    /// Enemy that can be attacked
    Attack,
    /// Target of the active skill
    Skill,
    /// Range of a unit that is not the active one
    Inspect,
    /// The selected unit itself
    Selected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Highlight {
    #[default]
    Idle,
    Marked(HighlightTone),
}

/// A single grid cell
#[derive(Clone, Debug)]
pub struct Tile {
    coord: HexCoord,
    passable: bool,
    movement_cost: u32,
    occupant: Option<UnitId>,
    highlight: Highlight,
}

impl Tile {
    fn new(coord: HexCoord, passable: bool) -> Self {
        Self {
            coord,
            passable,
            movement_cost: 1,
            occupant: None,
            highlight: Highlight::Idle,
        }
    }

    pub fn coord(&self) -> HexCoord {
        self.coord
    }

    /// Free to walk through: terrain allows it and nobody stands here
    pub fn is_passable(&self) -> bool {
        self.passable && !self.is_occupied()
    }

    /// Terrain passability, ignoring occupants
    pub fn is_terrain_passable(&self) -> bool {
        self.passable
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    pub fn movement_cost(&self) -> u32 {
        self.movement_cost
    }

    pub fn highlight(&self) -> Highlight {
        self.highlight
    }
}

/// Finite hex grid
#[derive(Clone, Debug)]
pub struct Grid {
    rows: Vec<Vec<Tile>>,
    width: usize,
    layout: HexLayout,
}

impl Grid {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// All-passable grid with unit movement costs
    pub fn new(width: usize, height: usize) -> Self {
        let rows = (0..height)
            .map(|r| {
                (0..row_width(width, r))
                    .map(|c| Tile::new(coord_of(r, c), true))
                    .collect()
            })
            .collect();
        Self {
            rows,
            width,
            layout: HexLayout::default(),
        }
    }

    /// Random grid with roadblocks.
    ///
    /// The two rows at each edge are never blocked, and a tile touching an
    /// existing roadblock stays open so the board remains traversable.
    pub fn generate<R: Rng>(config: &GridConfig, rng: &mut R) -> Self {
        let height = config.height;
        let mut rows: Vec<Vec<Tile>> = Vec::with_capacity(height);

        for r in 0..height {
            let mut row: Vec<Tile> = Vec::with_capacity(row_width(config.width, r));
            for c in 0..row_width(config.width, r) {
                let coord = coord_of(r, c);
                let next_to_roadblock = coord.neighbors().iter().any(|n| {
                    lookup_partial(&rows, &row, *n).is_some_and(|t| !t.passable)
                });
                let eligible = r > 1 && height - r > 2;
                let passable = next_to_roadblock
                    || !(eligible && rng.gen::<f32>() < config.roadblock_chance);
                row.push(Tile::new(coord, passable));
            }
            rows.push(row);
        }

        Self {
            rows,
            width: config.width,
            layout: HexLayout::new(config.hex_size, Point3::default()),
        }
    }

    pub fn with_layout(mut self, layout: HexLayout) -> Self {
        self.layout = layout;
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Hexes in an even row
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row_len(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    /// Checks row bounds, then column bounds after undoing the row offset
    pub fn is_valid(&self, coord: HexCoord) -> bool {
        index_of(coord).is_some_and(|(r, c)| r < self.rows.len() && c < self.rows[r].len())
    }

    pub fn get_tile(&self, coord: HexCoord) -> Option<&Tile> {
        let (r, c) = index_of(coord)?;
        self.rows.get(r)?.get(c)
    }

    pub fn get_tile_mut(&mut self, coord: HexCoord) -> Option<&mut Tile> {
        let (r, c) = index_of(coord)?;
        self.rows.get_mut(r)?.get_mut(c)
    }

    /// Checked lookup that reports a missing tile as an error
    pub fn tile(&self, coord: HexCoord) -> EngineResult<&Tile> {
        self.get_tile(coord).ok_or(EngineError::TileNotFound(coord))
    }

    fn tile_mut(&mut self, coord: HexCoord) -> EngineResult<&mut Tile> {
        self.get_tile_mut(coord).ok_or(EngineError::TileNotFound(coord))
    }

    /// Direct array access by (row, column).
    ///
    /// # Panics
    /// Panics when the indices are out of bounds. Only call after a validity check.
    pub fn tile_direct(&self, row: usize, col: usize) -> &Tile {
        &self.rows[row][col]
    }

    /// Iterate all tiles in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.rows.iter().flatten()
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    pub fn set_occupant(&mut self, coord: HexCoord, unit: UnitId) -> EngineResult<()> {
        self.tile_mut(coord)?.occupant = Some(unit);
        Ok(())
    }

    /// Clear whoever stands on `coord`. Returns the previous occupant.
    pub fn clear_occupant(&mut self, coord: HexCoord) -> Option<UnitId> {
        self.get_tile_mut(coord).and_then(|t| t.occupant.take())
    }

    pub fn set_passable(&mut self, coord: HexCoord, passable: bool) -> EngineResult<()> {
        self.tile_mut(coord)?.passable = passable;
        Ok(())
    }

    /// Costs below 1 are raised to 1
    pub fn set_movement_cost(&mut self, coord: HexCoord, cost: u32) -> EngineResult<()> {
        self.tile_mut(coord)?.movement_cost = cost.max(1);
        Ok(())
    }

    pub fn set_highlight(&mut self, coord: HexCoord, tone: HighlightTone) {
        if let Some(tile) = self.get_tile_mut(coord) {
            tile.highlight = Highlight::Marked(tone);
        }
    }

    pub fn reset_highlight(&mut self, coord: HexCoord) {
        if let Some(tile) = self.get_tile_mut(coord) {
            tile.highlight = Highlight::Idle;
        }
    }

    /// Currently highlighted tiles, row-major
    pub fn highlighted(&self) -> impl Iterator<Item = (HexCoord, HighlightTone)> + '_ {
        self.tiles().filter_map(|t| match t.highlight {
            Highlight::Marked(tone) => Some((t.coord, tone)),
            Highlight::Idle => None,
        })
    }

    // ========================================================================
    // WORLD TRANSFORM
    // ========================================================================

    pub fn world_position(&self, coord: HexCoord) -> Point3 {
        self.layout.world_position(coord)
    }

    pub fn hex_at(&self, position: Point3) -> HexCoord {
        self.layout.hex_at(position)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Tiles with `min_range <= distance <= max_range` from `center`, center excluded.
    ///
    /// Scans the bounding square in axial space, row-major. The square never
    /// extends past the grid's own extent.
    pub fn hexes_in_range(
        &self,
        center: HexCoord,
        min_range: u32,
        max_range: u32,
    ) -> impl Iterator<Item = &Tile> + '_ {
        let extent = self.width + self.height();
        let span = i32::try_from(extent.min(max_range as usize)).unwrap_or(i32::MAX);
        let min_range = i32::try_from(min_range).unwrap_or(i32::MAX);
        let max_range = i32::try_from(max_range).unwrap_or(i32::MAX);
        (center.r.saturating_sub(span)..=center.r.saturating_add(span))
            .flat_map(move |r| {
                (center.q.saturating_sub(span)..=center.q.saturating_add(span)).map(move |q| HexCoord::new(q, r))
            })
            .filter_map(move |coord| self.get_tile(coord))
            .filter(move |tile| {
                let distance = center.distance_to(tile.coord);
                tile.coord != center && distance >= min_range && distance <= max_range
            })
    }

    /// Tiles reachable from `center` within `budget` movement points.
    ///
    /// See [`ReachableTiles`] for the cost accounting.
    pub fn hexes_in_reachable_range(
        &self,
        center: HexCoord,
        budget: u32,
        allow_occupied_as_last: bool,
    ) -> ReachableTiles<'_> {
        ReachableTiles::new(self, center, budget, allow_occupied_as_last)
    }
}

/// Lazy breadth-first enumeration of reachable tiles.
///
/// Tiles are expanded in waves, starting with the center. When a wave is
/// exhausted the running cost grows by the movement cost of the last tile
/// expanded in it, and the search stops once that cost exceeds the budget.
/// A neighbor is enqueued when it is passable, or, with
/// `allow_occupied_as_last`, when it is occupied and the remaining budget
/// equals its movement cost.
pub struct ReachableTiles<'a> {
    grid: &'a Grid,
    budget: u32,
    allow_occupied_as_last: bool,
    visited: FxHashSet<HexCoord>,
    frontier: VecDeque<HexCoord>,
    current_cost: u32,
    remaining_in_wave: usize,
    next_wave: usize,
    finished: bool,
}

impl<'a> ReachableTiles<'a> {
    fn new(grid: &'a Grid, center: HexCoord, budget: u32, allow_occupied_as_last: bool) -> Self {
        let mut visited = FxHashSet::default();
        let mut frontier = VecDeque::new();
        let finished = !grid.is_valid(center);
        if !finished {
            visited.insert(center);
            frontier.push_back(center);
        }
        Self {
            grid,
            budget,
            allow_occupied_as_last,
            visited,
            frontier,
            current_cost: 0,
            remaining_in_wave: 1,
            next_wave: 0,
            finished,
        }
    }

    fn can_enter(&self, tile: &Tile) -> bool {
        tile.is_passable()
            || (self.allow_occupied_as_last
                && tile.is_occupied()
                && self.budget - self.current_cost == tile.movement_cost)
    }
}

impl<'a> Iterator for ReachableTiles<'a> {
    type Item = &'a Tile;

    fn next(&mut self) -> Option<&'a Tile> {
        if self.finished {
            return None;
        }
        let Some(current) = self.frontier.pop_front() else {
            self.finished = true;
            return None;
        };
        let grid = self.grid;
        let tile = grid.get_tile(current)?;

        for neighbor in current.neighbors() {
            if self.visited.contains(&neighbor) {
                continue;
            }
            let Some(neighbor_tile) = grid.get_tile(neighbor) else {
                continue;
            };
            if self.can_enter(neighbor_tile) {
                self.next_wave += 1;
                self.frontier.push_back(neighbor);
                self.visited.insert(neighbor);
            }
        }

        self.remaining_in_wave -= 1;
        if self.remaining_in_wave == 0 {
            self.current_cost += tile.movement_cost;
            if self.current_cost > self.budget {
                self.finished = true;
            } else {
                self.remaining_in_wave = self.next_wave;
                self.next_wave = 0;
            }
        }

        Some(tile)
    }
}

// ============================================================================
// INDEX HELPERS
// ============================================================================

fn row_width(width: usize, row: usize) -> usize {
    if row % 2 == 0 {
        width
    } else {
        width.saturating_sub(1)
    }
}

fn coord_of(row: usize, col: usize) -> HexCoord {
    let r = row as i32;
    HexCoord::new(col as i32 - (r - (r & 1)) / 2, r)
}

fn index_of(coord: HexCoord) -> Option<(usize, usize)> {
    if coord.r < 0 {
        return None;
    }
    let col = coord.q.checked_add(coord.r / 2)?;
    if col < 0 {
        return None;
    }
    Some((coord.r as usize, col as usize))
}

/// Lookup while the grid is still being generated
fn lookup_partial<'t>(done: &'t [Vec<Tile>], current: &'t [Tile], coord: HexCoord) -> Option<&'t Tile> {
    let (r, c) = index_of(coord)?;
    if r < done.len() {
        done[r].get(c)
    } else if r == done.len() {
        current.get(c)
    } else {
        None
    }
}
