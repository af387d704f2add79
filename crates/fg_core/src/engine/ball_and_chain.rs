//! Ball & chain: the carrier careens one scattered square at a time for
//! their full movement, auto-blocking anything they hit. Whatever
//! happens, it is never a turnover.

use super::ball_handling::{handle_ball_on_player_down, resolve_bounce};
use super::dice::{BlockDieFace, DiceRoller};
use super::events::{emit, EventKind, GameEvent};
use super::injury::{resolve_armour_and_injury, InjuryContext};
use super::match_state::MatchState;
use super::player::{PlayerState, Skill};
use super::position::{scatter_direction, Position};
use super::resolver::ActionOutcome;

/// One-die collision. Returns true when the swinger goes down.
fn resolve_auto_block(
    state: &mut MatchState,
    bc_id: i32,
    target_id: i32,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> bool {
    let face = dice.block_die();

    let bc_pos = state.player(bc_id).position;
    let target_pos = state.player(target_id).position;
    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Block, bc_id, target_id)
            .at(bc_pos, target_pos)
            .with_roll(face as i32, true),
    );

    let knock_down = |state: &mut MatchState,
                      id: i32,
                      dice: &mut dyn DiceRoller,
                      events: Option<&mut Vec<GameEvent>>| {
        state.player_mut(id).state = PlayerState::Prone;
        let mut events = events;
        let pos = state.player(id).position;
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::KnockedDown, id, -1).at(pos, Position::OFF_PITCH),
        );
        let ctx = InjuryContext::default();
        resolve_armour_and_injury(state, id, dice, &ctx, events.as_deref_mut());
        handle_ball_on_player_down(state, id, dice, events);
    };

    match face {
        BlockDieFace::AttackerDown => {
            knock_down(state, bc_id, dice, events);
            true
        }
        BlockDieFace::BothDown => {
            let bc_falls = !state.player(bc_id).has_skill(Skill::Block);
            let def_falls = !state.player(target_id).has_skill(Skill::Block);
            if bc_falls {
                knock_down(state, bc_id, dice, events.as_deref_mut());
            }
            if def_falls {
                knock_down(state, target_id, dice, events);
            }
            bc_falls
        }
        BlockDieFace::Pushed => false,
        BlockDieFace::DefenderStumbles => {
            let saved = state.player(target_id).has_skill(Skill::Dodge)
                && !state.player(bc_id).has_skill(Skill::Tackle);
            if !saved {
                knock_down(state, target_id, dice, events);
            }
            false
        }
        BlockDieFace::DefenderDown => {
            knock_down(state, target_id, dice, events);
            false
        }
    }
}

pub fn resolve_ball_and_chain(
    state: &mut MatchState,
    player_id: i32,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    state.player_mut(player_id).has_acted = true;

    let ma = state.player(player_id).stats.movement as i32;

    for _ in 0..ma {
        let d8 = dice.d8();
        let scatter = scatter_direction(d8);
        let current = state.player(player_id).position;
        let target = current.offset(scatter.x, scatter.y);

        // Careening off the pitch: KO, drop the ball, stop. Not a
        // turnover.
        if !target.is_on_pitch() {
            handle_ball_on_player_down(state, player_id, dice, events.as_deref_mut());
            let p = state.player_mut(player_id);
            p.state = PlayerState::Ko;
            p.position = Position::OFF_PITCH;
            return ActionOutcome::ok();
        }

        if let Some(occupant) = state.player_at(target) {
            if occupant.state == PlayerState::Standing {
                let occupant_id = occupant.id;
                let went_down =
                    resolve_auto_block(state, player_id, occupant_id, dice, events.as_deref_mut());
                if went_down {
                    return ActionOutcome::ok();
                }
            }
            // The square stays blocked either way; swing again.
            continue;
        }

        let old_pos = state.player(player_id).position;
        state.player_mut(player_id).position = target;
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::PlayerMove, player_id, -1)
                .at(old_pos, target)
                .with_roll(0, true),
        );

        if state.ball.is_held && state.ball.carrier_id == player_id {
            state.ball.position = target;
        }

        // These players cannot hold the ball; rolling over it kicks it
        // loose again.
        if !state.ball.is_held && state.ball.position == target {
            resolve_bounce(state, target, dice, 0, events.as_deref_mut());
        }
    }

    ActionOutcome::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dice::FixedDice;
    use crate::engine::player::PlayerStats;

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8, movement: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(movement, 7, 3, 7);
    }

    #[test]
    fn test_swing_moves_by_scatter() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7, 3);

        // Three hops east.
        let mut dice = FixedDice::new(vec![3, 3, 3]);
        let outcome = resolve_ball_and_chain(&mut state, 1, &mut dice, None);

        assert!(outcome.success);
        assert!(!outcome.turnover);
        assert_eq!(state.player(1).position, Position::new(13, 7));
        assert!(state.player(1).has_acted);
    }

    #[test]
    fn test_off_pitch_is_ko_not_turnover() {
        let mut state = MatchState::new();
        place(&mut state, 1, 25, 7, 3);

        // East off the pitch on the first hop.
        let mut dice = FixedDice::new(vec![3]);
        let outcome = resolve_ball_and_chain(&mut state, 1, &mut dice, None);

        assert!(outcome.success);
        assert!(!outcome.turnover);
        assert_eq!(state.player(1).state, PlayerState::Ko);
    }

    #[test]
    fn test_collision_auto_block() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7, 1);
        place(&mut state, 12, 11, 7, 6);

        // Hop east into the opponent: block die 6 floors them, armour
        // 4+4=8 breaks AV7, injury 3+3=6 stuns.
        let mut dice = FixedDice::new(vec![3, 6, 4, 4, 3, 3]);
        let outcome = resolve_ball_and_chain(&mut state, 1, &mut dice, None);

        assert!(outcome.success);
        assert_eq!(state.player(12).state, PlayerState::Stunned);
        assert_eq!(
            state.player(1).position,
            Position::new(10, 7),
            "never enters the occupied square"
        );
    }
}
