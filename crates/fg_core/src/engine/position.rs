//! Pitch geometry: square coordinates, Chebyshev distance, 8-adjacency
//! and the d8 scatter compass.

use serde::{Deserialize, Serialize};

pub const PITCH_WIDTH: i8 = 26;
pub const PITCH_HEIGHT: i8 = 15;

/// A square on the 26x15 pitch. Off-pitch coordinates are representable
/// and used as sentinels (crowd, dugout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i8,
    pub y: i8,
}

/// The eight compass offsets, clockwise from north. A d8 roll of 1-8
/// indexes this table.
const COMPASS: [(i8, i8); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

impl Position {
    pub const OFF_PITCH: Position = Position { x: -1, y: -1 };

    pub fn new(x: i8, y: i8) -> Self {
        Position { x, y }
    }

    pub fn is_on_pitch(self) -> bool {
        self.x >= 0 && self.x < PITCH_WIDTH && self.y >= 0 && self.y < PITCH_HEIGHT
    }

    /// Home end zone is the column x=0, away end zone x=25.
    pub fn is_in_end_zone(self, home: bool) -> bool {
        if home {
            self.x == 0
        } else {
            self.x == PITCH_WIDTH - 1
        }
    }

    pub fn is_in_wide_zone(self) -> bool {
        (self.y >= 0 && self.y < 4) || (self.y >= 11 && self.y < PITCH_HEIGHT)
    }

    /// Chebyshev distance: diagonal steps count as one square.
    pub fn distance_to(self, other: Position) -> i32 {
        let dx = (self.x as i32 - other.x as i32).abs();
        let dy = (self.y as i32 - other.y as i32).abs();
        dx.max(dy)
    }

    /// All 8 neighbouring squares; some may be off pitch.
    pub fn adjacent(self) -> [Position; 8] {
        [
            Position::new(self.x - 1, self.y - 1),
            Position::new(self.x, self.y - 1),
            Position::new(self.x + 1, self.y - 1),
            Position::new(self.x - 1, self.y),
            Position::new(self.x + 1, self.y),
            Position::new(self.x - 1, self.y + 1),
            Position::new(self.x, self.y + 1),
            Position::new(self.x + 1, self.y + 1),
        ]
    }

    pub fn adjacent_on_pitch_count(self) -> usize {
        self.adjacent().iter().filter(|p| p.is_on_pitch()).count()
    }

    pub fn offset(self, dx: i8, dy: i8) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn clamped_to_pitch(self) -> Position {
        Position::new(
            self.x.clamp(0, PITCH_WIDTH - 1),
            self.y.clamp(0, PITCH_HEIGHT - 1),
        )
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::OFF_PITCH
    }
}

/// Unit offset for a d8 scatter roll (1=N clockwise to 8=NW).
pub fn scatter_direction(d8: i32) -> Position {
    let idx = (d8.clamp(1, 8) - 1) as usize;
    let (dx, dy) = COMPASS[idx];
    Position::new(dx, dy)
}

/// Index of a normalized direction vector in the compass table.
pub(crate) fn compass_index(dx: i8, dy: i8) -> usize {
    COMPASS
        .iter()
        .position(|&(cx, cy)| cx == dx && cy == dy)
        .unwrap_or(0)
}

pub(crate) fn compass_offset(idx: usize) -> (i8, i8) {
    COMPASS[idx % 8]
}
