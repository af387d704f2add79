//! Turn transitions and the touchdown / half-over checks that follow
//! every executed action.

use super::events::{emit, EventKind, GameEvent};
use super::match_state::MatchState;
use super::player::{PlayerState, Skill};
use super::position::Position;

/// Switch the active side: eject secret weapons, flip the side, advance
/// the incoming team's turn counter and reset per-turn state.
pub fn resolve_end_turn(state: &mut MatchState, mut events: Option<&mut Vec<GameEvent>>) {
    let current = state.active_team;

    // Secret weapons are sent off when their drive's turn ends. An
    // ejected carrier leaves the ball where they stood; end-of-turn
    // rolls no dice, so it does not bounce.
    for id in MatchState::side_ids(current) {
        let p = state.player(id);
        if p.is_on_pitch() && p.has_skill(Skill::SecretWeapon) {
            if state.ball.is_held && state.ball.carrier_id == id {
                let pos = state.player(id).position;
                state.ball = super::ball::BallState::on_ground(pos);
            }
            let p = state.player_mut(id);
            p.state = PlayerState::Ejected;
            p.position = Position::OFF_PITCH;
        }
    }

    state.active_team = current.opponent();

    let new_side = state.active_team;
    state.team_mut(new_side).turn_number += 1;

    state.reset_players_for_new_turn(new_side);
    state.team_mut(new_side).reset_for_new_turn();
    state.turnover_pending = false;

    let turn = state.team(new_side).turn_number;
    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Turnover, -1, -1).with_roll(turn, true),
    );
}

/// A touchdown is a standing carrier in the opponent's end zone.
pub fn check_touchdown(state: &MatchState) -> bool {
    if !state.ball.is_held {
        return false;
    }
    let carrier = state.player(state.ball.carrier_id);
    if carrier.state != PlayerState::Standing {
        return false;
    }
    match carrier.side {
        // Home scores in the away end zone (x=25) and vice versa.
        super::player::TeamSide::Home => carrier.position.is_in_end_zone(false),
        super::player::TeamSide::Away => carrier.position.is_in_end_zone(true),
    }
}

/// Eight turns per side per half.
pub fn check_half_over(state: &MatchState) -> bool {
    state.team(state.active_team).turn_number > 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ball::BallState;
    use crate::engine::player::{PlayerStats, TeamSide};

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(6, 3, 3, 8);
    }

    #[test]
    fn test_end_turn_flips_and_resets() {
        let mut state = MatchState::new();
        state.active_team = TeamSide::Home;
        state.away_team.turn_number = 2;
        state.turnover_pending = true;
        place(&mut state, 12, 10, 7);
        state.player_mut(12).state = PlayerState::Stunned;
        state.player_mut(12).has_acted = true;

        resolve_end_turn(&mut state, None);

        assert_eq!(state.active_team, TeamSide::Away);
        assert_eq!(state.away_team.turn_number, 3);
        assert!(!state.turnover_pending);
        assert_eq!(state.player(12).state, PlayerState::Prone);
        assert!(!state.player(12).has_acted);
    }

    #[test]
    fn test_end_turn_ejects_secret_weapons() {
        let mut state = MatchState::new();
        state.active_team = TeamSide::Home;
        place(&mut state, 5, 12, 7);
        state.player_mut(5).skills.add(Skill::SecretWeapon);

        resolve_end_turn(&mut state, None);

        assert_eq!(state.player(5).state, PlayerState::Ejected);
        assert!(!state.player(5).position.is_on_pitch());
    }

    #[test]
    fn test_touchdown_requires_standing_carrier() {
        let mut state = MatchState::new();
        place(&mut state, 1, 25, 7);
        state.ball = BallState::carried(Position::new(25, 7), 1);
        assert!(check_touchdown(&state));

        state.player_mut(1).state = PlayerState::Prone;
        assert!(!check_touchdown(&state));
    }

    #[test]
    fn test_touchdown_wrong_end_zone() {
        let mut state = MatchState::new();
        // Home carrier in its own end zone is not a score.
        place(&mut state, 1, 0, 7);
        state.ball = BallState::carried(Position::new(0, 7), 1);
        assert!(!check_touchdown(&state));

        place(&mut state, 12, 0, 9);
        state.ball = BallState::carried(Position::new(0, 9), 12);
        assert!(check_touchdown(&state));
    }

    #[test]
    fn test_half_over_after_eight_turns() {
        let mut state = MatchState::new();
        state.active_team = TeamSide::Home;
        state.home_team.turn_number = 8;
        assert!(!check_half_over(&state));
        state.home_team.turn_number = 9;
        assert!(check_half_over(&state));
    }
}
