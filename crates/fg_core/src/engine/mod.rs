//! The rules engine: state, dice, resolvers, enumeration and the match
//! loop. Everything here mutates `MatchState` in place and reports
//! outcomes as plain data; the search layer clones and replays.

pub mod ball;
pub mod ball_and_chain;
pub mod ball_handling;
pub mod big_guy;
pub mod block;
pub mod bomb;
pub mod dice;
pub mod enumerator;
pub mod events;
pub mod foul;
pub mod gaze;
pub mod helpers;
pub mod injury;
pub mod kickoff;
pub mod match_state;
pub mod movement;
pub mod pass;
pub mod pathfinder;
pub mod player;
pub mod position;
pub mod resolver;
pub mod simulator;
pub mod team;
pub mod ttm;
pub mod turn;

#[cfg(test)]
mod contract_tests;

pub use ball::BallState;
pub use dice::{BlockDieFace, DiceRoller, FixedDice, SeededDice};
pub use enumerator::available_actions;
pub use events::{EventKind, GameEvent};
pub use match_state::{GamePhase, MatchState, Weather};
pub use player::{Player, PlayerState, PlayerStats, Skill, SkillSet, TeamSide};
pub use position::{Position, PITCH_HEIGHT, PITCH_WIDTH};
pub use resolver::{execute_action, resolve_action, Action, ActionKind, ActionOutcome};
pub use simulator::{
    setup_half, simple_kickoff, simulate_match, simulate_match_logged, GameResult,
    LoggedGameResult, StateLog,
};
pub use team::TeamState;
