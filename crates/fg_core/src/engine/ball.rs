//! Ball state: carried, loose on the ground, or off pitch.

use serde::{Deserialize, Serialize};

use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallState {
    pub position: Position,
    pub is_held: bool,
    /// Carrier player id, or -1 when nobody holds the ball.
    pub carrier_id: i32,
}

impl BallState {
    pub fn off_pitch() -> Self {
        BallState {
            position: Position::OFF_PITCH,
            is_held: false,
            carrier_id: -1,
        }
    }

    pub fn on_ground(position: Position) -> Self {
        BallState {
            position,
            is_held: false,
            carrier_id: -1,
        }
    }

    pub fn carried(position: Position, carrier_id: i32) -> Self {
        BallState {
            position,
            is_held: true,
            carrier_id,
        }
    }

    pub fn is_on_pitch(&self) -> bool {
        self.position.is_on_pitch()
    }
}

impl Default for BallState {
    fn default() -> Self {
        BallState::off_pitch()
    }
}
