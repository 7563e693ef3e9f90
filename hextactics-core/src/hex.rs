//! Hex geometry with axial coordinates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axial hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

/// Direction vectors in axial coordinates (dq, dr)
/// Index: 0=E, 1=NE, 2=NW, 3=W, 4=SW, 5=SE
pub const DIRECTIONS: [(i32, i32); 6] = [
    (1, 0),   // E
    (1, -1),  // NE
    (0, -1),  // NW
    (-1, 0),  // W
    (-1, 1),  // SW
    (0, 1),   // SE
];

impl HexCoord {
    /// Sentinel that never maps to a tile. Used as the root action of a path search.
    pub const INVALID: HexCoord = HexCoord { q: i32::MIN, r: i32::MIN };

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Implicit third cube coordinate
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Distance between two hexes
    pub fn distance_to(&self, other: HexCoord) -> i32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = ((self.q + self.r) - (other.q + other.r)).abs();
        dq.max(dr).max(ds)
    }

    /// Get neighbor in direction (0-5)
    pub fn neighbor(&self, direction: usize) -> HexCoord {
        let (dq, dr) = DIRECTIONS[direction % 6];
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// All six neighbors, in `DIRECTIONS` order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        let mut out = [*self; 6];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.neighbor(i);
        }
        out
    }

    pub fn is_adjacent(&self, other: HexCoord) -> bool {
        self.distance_to(other) == 1
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Distance between two hexes
pub fn hex_distance(a: HexCoord, b: HexCoord) -> i32 {
    a.distance_to(b)
}

// ============================================================================
// WORLD TRANSFORM
// ============================================================================

/// A point in world space. Hexes lie on the XZ plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation towards `to`
    pub fn lerp(self, to: Point3, t: f32) -> Point3 {
        Point3::new(
            self.x + (to.x - self.x) * t,
            self.y + (to.y - self.y) * t,
            self.z + (to.z - self.z) * t,
        )
    }
}

const SQRT_3: f32 = 1.732_050_8;

/// Pointy-top layout mapping hexes to world positions and back
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HexLayout {
    /// Distance from hex center to a corner
    pub size: f32,
    /// World position of hex (0, 0)
    pub origin: Point3,
}

impl Default for HexLayout {
    fn default() -> Self {
        Self {
            size: 1.0,
            origin: Point3::default(),
        }
    }
}

impl HexLayout {
    pub fn new(size: f32, origin: Point3) -> Self {
        Self { size, origin }
    }

    /// Center of `coord` in world space
    pub fn world_position(&self, coord: HexCoord) -> Point3 {
        let q = coord.q as f32;
        let r = coord.r as f32;
        let x = self.size * SQRT_3 * (q + r / 2.0);
        let z = self.size * 1.5 * r;
        Point3::new(self.origin.x + x, self.origin.y, self.origin.z + z)
    }

    /// Hex containing the world position (height is ignored)
    pub fn hex_at(&self, position: Point3) -> HexCoord {
        let x = (position.x - self.origin.x) / self.size;
        let z = (position.z - self.origin.z) / self.size;
        let q = SQRT_3 / 3.0 * x - z / 3.0;
        let r = 2.0 / 3.0 * z;
        cube_round(q, r)
    }
}

fn cube_round(q: f32, r: f32) -> HexCoord {
    let s = -q - r;
    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    HexCoord::new(rq as i32, rr as i32)
}
