//! Map cell coordinates used for dispatch-time target search.

use serde::{Deserialize, Serialize};

/// A cell on the host simulation's map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Horizontal coordinate (west to east).
    pub x: i32,
    /// Vertical coordinate (south to north).
    pub z: i32,
}

impl Cell {
    /// Construct a cell from coordinates.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Euclidean distance to another cell.
    pub fn distance_to(self, other: Self) -> f32 {
        let dx = f64::from(self.x.saturating_sub(other.x));
        let dz = f64::from(self.z.saturating_sub(other.z));
        #[allow(clippy::cast_possible_truncation)]
        let d = dx.hypot(dz) as f32;
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let a = Cell::new(0, 0);
        let b = Cell::new(3, 4);
        assert!((a.distance_to(b) - 5.0).abs() < f32::EPSILON);
        assert!((b.distance_to(a) - 5.0).abs() < f32::EPSILON);
    }
}
