//! Per-team match state: score, reroll pool and the per-turn action flags.

use serde::{Deserialize, Serialize};

use super::player::TeamSide;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TeamState {
    pub side: TeamSide,
    pub score: i32,
    pub rerolls: i32,
    pub reroll_used_this_turn: bool,
    pub turn_number: i32,
    pub blitz_used_this_turn: bool,
    pub pass_used_this_turn: bool,
    pub foul_used_this_turn: bool,
    pub has_apothecary: bool,
    pub apothecary_used: bool,
}

impl TeamState {
    pub fn new(side: TeamSide) -> Self {
        TeamState {
            side,
            score: 0,
            rerolls: 0,
            reroll_used_this_turn: false,
            turn_number: 0,
            blitz_used_this_turn: false,
            pass_used_this_turn: false,
            foul_used_this_turn: false,
            has_apothecary: false,
            apothecary_used: false,
        }
    }

    /// One team reroll per turn, while the pool lasts.
    pub fn can_use_reroll(&self) -> bool {
        self.rerolls > 0 && !self.reroll_used_this_turn
    }

    pub fn reset_for_new_turn(&mut self) {
        self.reroll_used_this_turn = false;
        self.blitz_used_this_turn = false;
        self.pass_used_this_turn = false;
        self.foul_used_this_turn = false;
    }
}
