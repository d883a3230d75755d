//! D8 flow direction tables
//!
//! Direction encoding shared by every traversal in the workspace:
//! ```text
//!   4  3  2
//!   5  0  1
//!   6  7  8
//! ```
//! `0` = no outgoing flow (domain exit), `1`-`8` = direction to a neighbor
//! (1=E, 2=NE, 3=N, 4=NW, 5=W, 6=SW, 7=S, 8=SE).
//!
//! [`SCAN_ORDER`] is the normative neighbor evaluation order for
//! tie-breaking: cardinal before diagonal, clockwise from north. Every
//! implementation must use the same order so that identical inputs yield
//! identical flow fields.

/// Direction offsets: (row_offset, col_offset), indexed by direction code.
/// Index 0 is unused.
pub const OFFSETS: [(isize, isize); 9] = [
    (0, 0),   // 0: no flow
    (0, 1),   // 1: E
    (-1, 1),  // 2: NE
    (-1, 0),  // 3: N
    (-1, -1), // 4: NW
    (0, -1),  // 5: W
    (1, -1),  // 6: SW
    (1, 0),   // 7: S
    (1, 1),   // 8: SE
];

/// Neighbor evaluation order: cardinal before diagonal, clockwise from
/// north. The first neighbor reaching the steepest slope wins ties.
pub const SCAN_ORDER: [u8; 8] = [
    3, // N
    1, // E
    7, // S
    5, // W
    2, // NE
    8, // SE
    6, // SW
    4, // NW
];

/// Get the opposite direction
pub fn opposite(dir: u8) -> u8 {
    if dir == 0 {
        0
    } else {
        ((dir - 1 + 4) % 8) + 1
    }
}

/// Whether the direction code is diagonal
pub fn is_diagonal(dir: u8) -> bool {
    matches!(dir, 2 | 4 | 6 | 8)
}

/// Physical distance of one step in the given direction for a grid with
/// cell dimensions `dx` x `dy`. Cardinal steps cover one cell dimension,
/// diagonal steps the hypotenuse.
pub fn step_distance(dir: u8, dx: f64, dy: f64) -> f64 {
    match dir {
        1 | 5 => dx,
        3 | 7 => dy,
        2 | 4 | 6 | 8 => dx.hypot(dy),
        _ => 0.0,
    }
}

/// Offset for a direction code. Returns (0, 0) for code 0.
pub fn offset(dir: u8) -> (isize, isize) {
    OFFSETS[dir as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_opposite() {
        assert_eq!(opposite(1), 5); // E -> W
        assert_eq!(opposite(3), 7); // N -> S
        assert_eq!(opposite(2), 6); // NE -> SW
        assert_eq!(opposite(8), 4); // SE -> NW
        assert_eq!(opposite(0), 0);
    }

    #[test]
    fn test_scan_order_cardinal_first() {
        for (i, &dir) in SCAN_ORDER.iter().enumerate() {
            if i < 4 {
                assert!(!is_diagonal(dir), "first four must be cardinal");
            } else {
                assert!(is_diagonal(dir), "last four must be diagonal");
            }
        }
    }

    #[test]
    fn test_step_distance_rectangular_cells() {
        assert_relative_eq!(step_distance(1, 2.0, 3.0), 2.0);
        assert_relative_eq!(step_distance(7, 2.0, 3.0), 3.0);
        assert_relative_eq!(step_distance(8, 3.0, 4.0), 5.0);
        assert_relative_eq!(step_distance(0, 2.0, 3.0), 0.0);
    }

    #[test]
    fn test_offsets_consistent_with_codes() {
        // Direction 3 (N) must point one row up
        assert_eq!(offset(3), (-1, 0));
        // Direction 8 (SE) one row down, one col right
        assert_eq!(offset(8), (1, 1));
    }
}
