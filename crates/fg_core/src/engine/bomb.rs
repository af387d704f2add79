//! Bombardier: lob a bomb pass-style; everyone standing around the
//! blast goes down. The thrower is immune to their own handiwork and a
//! bomb never hands over the turn.

use super::ball_handling::handle_ball_on_player_down;
use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::helpers::{count_disturbing_presence, count_tacklezones};
use super::injury::{resolve_armour_and_injury, InjuryContext};
use super::match_state::{MatchState, Weather};
use super::pass::PassRange;
use super::player::{PlayerState, Skill};
use super::position::{scatter_direction, Position};
use super::resolver::ActionOutcome;

pub fn resolve_bomb_throw(
    state: &mut MatchState,
    thrower_id: i32,
    target: Position,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let thrower_side = state.player(thrower_id).side;
    state.player_mut(thrower_id).has_acted = true;
    state.team_mut(thrower_side).pass_used_this_turn = true;

    let thrower = state.player(thrower_id).clone();

    let dist = thrower.position.distance_to(target);
    let range = PassRange::from_distance(dist);

    let mut pass_target = 7 - thrower.stats.agility as i32;
    pass_target -= range.modifier();
    if !thrower.has_skill(Skill::NervesOfSteel) {
        pass_target += count_tacklezones(state, thrower.position, thrower_side, -1);
    }
    pass_target += count_disturbing_presence(state, thrower.position, thrower_side);
    if matches!(
        state.weather,
        Weather::PouringRain | Weather::Blizzard | Weather::VerySunny
    ) {
        pass_target += 1;
    }
    let pass_target = pass_target.clamp(2, 6);

    let roll = dice.d6();
    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Pass, thrower_id, -1)
            .at(thrower.position, target)
            .with_roll(roll, roll >= pass_target && roll != 1),
    );

    let mut explosion = target;
    if roll == 1 {
        // Dropped at the thrower's feet, more or less.
        let d8 = dice.d8();
        let s = scatter_direction(d8);
        explosion = thrower.position.offset(s.x, s.y);
    } else if roll < pass_target {
        for _ in 0..3 {
            let d8 = dice.d8();
            let s = scatter_direction(d8);
            explosion = explosion.offset(s.x, s.y);
        }
    }

    // Off the pitch it fizzles in the stands.
    if !explosion.is_on_pitch() {
        return ActionOutcome::ok();
    }

    // Blast radius: the square and its ring. Standing players only;
    // the thrower is immune.
    for dy in -1..=1i8 {
        for dx in -1..=1i8 {
            let pos = explosion.offset(dx, dy);
            if !pos.is_on_pitch() {
                continue;
            }
            let Some(victim) = state.player_at(pos) else {
                continue;
            };
            if victim.id == thrower_id || victim.state != PlayerState::Standing {
                continue;
            }
            let victim_id = victim.id;

            state.player_mut(victim_id).state = PlayerState::Prone;
            let vpos = state.player(victim_id).position;
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::KnockedDown, victim_id, thrower_id)
                    .at(vpos, Position::OFF_PITCH),
            );
            let ctx = InjuryContext::default();
            resolve_armour_and_injury(state, victim_id, dice, &ctx, events.as_deref_mut());
            handle_ball_on_player_down(state, victim_id, dice, events.as_deref_mut());
        }
    }

    ActionOutcome::ok()
}
