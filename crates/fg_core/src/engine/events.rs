//! Structured event records appended to a caller-provided sink. The
//! engine never inspects them; they feed replays, logs and tests.

use serde::{Deserialize, Serialize};

use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    PlayerMove,
    Dodge,
    Gfi,
    Block,
    Push,
    Injury,
    Touchdown,
    Turnover,
    BallBounce,
    Pass,
    Catch,
    Pickup,
    Foul,
    Kickoff,
    WeatherChange,
    SkillUsed,
    KnockedDown,
    ArmourBreak,
    Casualty,
    Regeneration,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameEvent {
    pub kind: EventKind,
    pub player_id: i32,
    pub target_id: i32,
    pub from: Position,
    pub to: Position,
    pub roll: i32,
    pub success: bool,
}

impl GameEvent {
    pub fn new(kind: EventKind, player_id: i32, target_id: i32) -> Self {
        GameEvent {
            kind,
            player_id,
            target_id,
            from: Position::OFF_PITCH,
            to: Position::OFF_PITCH,
            roll: 0,
            success: false,
        }
    }

    pub fn at(mut self, from: Position, to: Position) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_roll(mut self, roll: i32, success: bool) -> Self {
        self.roll = roll;
        self.success = success;
        self
    }
}

/// Append to the sink when one is attached.
pub fn emit(events: Option<&mut Vec<GameEvent>>, event: GameEvent) {
    if let Some(sink) = events {
        sink.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_into_sink() {
        let mut sink = Vec::new();
        emit(
            Some(&mut sink),
            GameEvent::new(EventKind::Dodge, 3, -1).with_roll(4, true),
        );
        emit(None, GameEvent::new(EventKind::Dodge, 4, -1));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].player_id, 3);
        assert!(sink[0].success);
    }
}
