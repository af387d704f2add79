//! 15-float action vector.
//!
//! ## Layout
//! ```text
//! [0-5]  kind one-hots: end turn, move, block, blitz, pass/hand-off, other
//! [6]    player strength (/7)       [7]  player agility (/7)
//! [8]    is ball carrier            [9]  is a scoring move
//! [10]   distance to end zone (/26) [11] block dice (signed, /3)
//! [12]   moves the ball forward     [13] go-for-its required (/3)
//! [14]   foul target is down
//! ```

use crate::engine::helpers::{block_dice_info, count_assists};
use crate::engine::match_state::MatchState;
use crate::engine::player::{PlayerState, Skill, TeamSide};
use crate::engine::resolver::{Action, ActionKind};

pub const NUM_ACTION_FEATURES: usize = 15;

pub fn extract_action_features(
    state: &MatchState,
    action: &Action,
) -> [f32; NUM_ACTION_FEATURES] {
    let mut out = [0.0f32; NUM_ACTION_FEATURES];

    out[0] = if action.kind == ActionKind::EndTurn { 1.0 } else { 0.0 };
    out[1] = if action.kind == ActionKind::Move { 1.0 } else { 0.0 };
    out[2] = if action.kind == ActionKind::Block { 1.0 } else { 0.0 };
    out[3] = if action.kind == ActionKind::Blitz { 1.0 } else { 0.0 };
    out[4] = if matches!(action.kind, ActionKind::Pass | ActionKind::HandOff) {
        1.0
    } else {
        0.0
    };
    out[5] = if matches!(
        action.kind,
        ActionKind::Foul
            | ActionKind::ThrowTeamMate
            | ActionKind::BombThrow
            | ActionKind::HypnoticGaze
            | ActionKind::BallAndChain
            | ActionKind::MultipleBlock
    ) {
        1.0
    } else {
        0.0
    };

    if !(1..=22).contains(&action.player_id) {
        return out;
    }
    let player = state.player(action.player_id);

    out[6] = player.stats.strength as f32 / 7.0;
    out[7] = player.stats.agility as f32 / 7.0;

    let is_carrier = state.ball.is_held && state.ball.carrier_id == action.player_id;
    out[8] = if is_carrier { 1.0 } else { 0.0 };

    let end_zone_x: i8 = match player.side {
        TeamSide::Home => 25,
        TeamSide::Away => 0,
    };

    if is_carrier && action.kind == ActionKind::Move && action.target.x == end_zone_x {
        out[9] = 1.0;
    }

    if player.is_on_pitch() {
        let mut dist = (player.position.x as i32 - end_zone_x as i32).abs();
        if action.kind == ActionKind::Move && action.target.is_on_pitch() {
            dist = (action.target.x as i32 - end_zone_x as i32).abs();
        }
        out[10] = dist as f32 / 26.0;
    }

    if matches!(action.kind, ActionKind::Block | ActionKind::Blitz)
        && (1..=22).contains(&action.target_id)
    {
        let defender = state.player(action.target_id);
        if defender.is_on_pitch() && player.is_on_pitch() {
            let mut att_st = player.stats.strength as i32;
            if action.kind == ActionKind::Blitz && player.has_skill(Skill::Horns) {
                att_st += 1;
            }

            let att_assists = count_assists(
                state,
                defender.position,
                player.side,
                player.id,
                defender.id,
                defender.id,
            );
            let def_assists = count_assists(
                state,
                player.position,
                defender.side,
                defender.id,
                player.id,
                player.id,
            );

            let info = block_dice_info(
                att_st + att_assists,
                defender.stats.strength as i32 + def_assists,
            );
            let mut dice = info.count as f32;
            if !info.attacker_chooses {
                dice = -dice;
            }
            out[11] = dice / 3.0;
        }
    }

    if action.kind == ActionKind::Move && player.is_on_pitch() && action.target.is_on_pitch() {
        let current = (player.position.x as i32 - end_zone_x as i32).abs();
        let target = (action.target.x as i32 - end_zone_x as i32).abs();
        if target < current {
            out[12] = 1.0;
        }

        let move_dist = player.position.distance_to(action.target);
        let gfi = (move_dist - player.movement_remaining as i32).max(0);
        out[13] = gfi.min(3) as f32 / 3.0;
    }

    if action.kind == ActionKind::Foul && (1..=22).contains(&action.target_id) {
        let target = state.player(action.target_id);
        if matches!(target.state, PlayerState::Prone | PlayerState::Stunned) {
            out[14] = 1.0;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ball::BallState;
    use crate::engine::player::PlayerStats;
    use crate::engine::position::Position;

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8, strength: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(6, strength, 3, 8);
        p.movement_remaining = 6;
    }

    #[test]
    fn test_kind_one_hots() {
        let state = MatchState::new();
        let f = extract_action_features(&state, &Action::end_turn());
        assert_eq!(f[0], 1.0);
        assert_eq!(f[1..6].iter().sum::<f32>(), 0.0);
    }

    #[test]
    fn test_scoring_move_flag() {
        let mut state = MatchState::new();
        place(&mut state, 1, 24, 7, 3);
        state.ball = BallState::carried(Position::new(24, 7), 1);

        let action = Action::new(ActionKind::Move, 1, -1, Position::new(25, 7));
        let f = extract_action_features(&state, &action);

        assert_eq!(f[1], 1.0);
        assert_eq!(f[8], 1.0, "carrier");
        assert_eq!(f[9], 1.0, "scores");
        assert_eq!(f[12], 1.0, "forward");
        assert_eq!(f[10], 0.0, "distance after the move");
    }

    #[test]
    fn test_block_dice_feature_signed() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7, 4);
        place(&mut state, 12, 11, 7, 3);

        let action = Action::new(ActionKind::Block, 1, 12, Position::new(11, 7));
        let f = extract_action_features(&state, &action);
        assert!((f[11] - 2.0 / 3.0).abs() < 1e-6, "two dice, attacker picks");

        // Outmatched attacker sees a negative value.
        state.player_mut(1).stats.strength = 2;
        state.player_mut(12).stats.strength = 5;
        let f = extract_action_features(&state, &action);
        assert!((f[11] + 3.0 / 3.0).abs() < 1e-6, "three dice against");
    }

    #[test]
    fn test_gfi_fraction() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7, 3);
        state.player_mut(1).movement_remaining = 0;

        let action = Action::new(ActionKind::Move, 1, -1, Position::new(11, 7));
        let f = extract_action_features(&state, &action);
        assert!((f[13] - 1.0 / 3.0).abs() < 1e-6, "one go-for-it");
    }
}
