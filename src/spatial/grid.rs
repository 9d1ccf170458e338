//! Square grid coordinates
//!
//! Movement and attacks use the four orthogonal neighbours; "touching"
//! (Chebyshev distance 1) also counts diagonals.

use serde::{Deserialize, Serialize};

/// A tile on the square grid
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

/// Orthogonal unit directions
pub const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl GridCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Taxicab distance
    pub fn manhattan(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// King-move distance
    pub fn chebyshev(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// The four orthogonal neighbours (may be out of bounds)
    pub fn neighbors(&self) -> [GridCoord; 4] {
        DIRECTIONS.map(|(dx, dy)| self.offset(dx, dy))
    }

    /// All eight surrounding tiles (may be out of bounds)
    pub fn surrounding(&self) -> [GridCoord; 8] {
        [
            self.offset(1, 0),
            self.offset(1, 1),
            self.offset(0, 1),
            self.offset(-1, 1),
            self.offset(-1, 0),
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
        ]
    }

    /// Orthogonally adjacent
    pub fn is_adjacent(&self, other: &Self) -> bool {
        self.manhattan(other) == 1
    }

    /// Diagonally adjacent
    pub fn is_diagonal(&self, other: &Self) -> bool {
        self.x.abs_diff(other.x) == 1 && self.y.abs_diff(other.y) == 1
    }

    /// Adjacent or diagonal
    pub fn touches(&self, other: &Self) -> bool {
        self.chebyshev(other) == 1
    }

    /// Unit step (signum per axis) from self toward other
    pub fn direction_to(&self, other: &Self) -> (i32, i32) {
        ((other.x - self.x).signum(), (other.y - self.y).signum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let a = GridCoord::new(0, 0);
        let b = GridCoord::new(3, 4);
        assert_eq!(a.manhattan(&b), 7);
        assert_eq!(a.chebyshev(&b), 4);
        assert_eq!(b.manhattan(&a), 7);
    }

    #[test]
    fn test_adjacency_and_diagonal() {
        let c = GridCoord::new(5, 5);
        assert!(c.is_adjacent(&GridCoord::new(5, 6)));
        assert!(!c.is_adjacent(&GridCoord::new(6, 6)));
        assert!(c.is_diagonal(&GridCoord::new(6, 6)));
        assert!(!c.is_diagonal(&GridCoord::new(5, 6)));
        assert!(c.touches(&GridCoord::new(4, 6)));
        assert!(!c.touches(&c));
    }

    #[test]
    fn test_neighbors_are_adjacent() {
        let c = GridCoord::new(2, 2);
        for n in c.neighbors() {
            assert!(c.is_adjacent(&n));
        }
        for s in c.surrounding() {
            assert!(c.touches(&s));
        }
    }

    #[test]
    fn test_direction_to() {
        let c = GridCoord::new(2, 2);
        assert_eq!(c.direction_to(&GridCoord::new(9, 0)), (1, -1));
        assert_eq!(c.direction_to(&c), (0, 0));
    }
}
