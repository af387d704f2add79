//! Loose-ball mechanics: pickups, catches, bounces and throw-ins.

use super::ball::BallState;
use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::helpers::{attempt_roll, catch_target, pickup_target};
use super::match_state::MatchState;
use super::player::Skill;
use super::position::{scatter_direction, Position};

/// Bounce chains terminate after this many hops; the ball then rests
/// where it lies. Guards against adversarial catch-drop loops.
const MAX_BOUNCE_DEPTH: i32 = 5;

/// Attempt to pick the ball up at the player's square. On success the
/// ball is carried; on failure the caller decides the consequences.
pub fn resolve_pickup(
    state: &mut MatchState,
    player_id: i32,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> bool {
    let pos = state.player(player_id).position;

    if state.player(player_id).has_skill(Skill::NoHands) {
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Pickup, player_id, -1)
                .at(pos, Position::OFF_PITCH)
                .with_roll(0, false),
        );
        return false;
    }

    let target = pickup_target(state, &state.player(player_id).clone());
    let success = attempt_roll(
        state,
        player_id,
        dice,
        target,
        Some(Skill::SureHands),
        false,
        true,
        events.as_deref_mut(),
    );

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Pickup, player_id, -1)
            .at(pos, Position::OFF_PITCH)
            .with_roll(target, success),
    );

    if success {
        state.ball = BallState::carried(pos, player_id);
    }
    success
}

/// Attempt to catch a ball arriving at the catcher's square.
pub fn resolve_catch(
    state: &mut MatchState,
    catcher_id: i32,
    dice: &mut dyn DiceRoller,
    modifier: i32,
    mut events: Option<&mut Vec<GameEvent>>,
) -> bool {
    let pos = state.player(catcher_id).position;

    if state.player(catcher_id).has_skill(Skill::NoHands) {
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Catch, catcher_id, -1)
                .at(pos, Position::OFF_PITCH)
                .with_roll(0, false),
        );
        return false;
    }

    let target = catch_target(state, &state.player(catcher_id).clone(), modifier);
    let success = attempt_roll(
        state,
        catcher_id,
        dice,
        target,
        Some(Skill::Catch),
        false,
        true,
        events.as_deref_mut(),
    );

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Catch, catcher_id, -1)
            .at(pos, Position::OFF_PITCH)
            .with_roll(target, success),
    );

    if success {
        state.ball = BallState::carried(pos, catcher_id);
    }
    success
}

/// Scatter the ball one square. A standing player at the landing square
/// gets a catch attempt; a drop bounces again up to the depth cap.
pub fn resolve_bounce(
    state: &mut MatchState,
    from: Position,
    dice: &mut dyn DiceRoller,
    depth: i32,
    mut events: Option<&mut Vec<GameEvent>>,
) {
    if depth > MAX_BOUNCE_DEPTH {
        state.ball = BallState::on_ground(from);
        return;
    }

    let d8 = dice.d8();
    let offset = scatter_direction(d8);
    let dest = from.offset(offset.x, offset.y);

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::BallBounce, -1, -1)
            .at(from, dest)
            .with_roll(d8, true),
    );

    if !dest.is_on_pitch() {
        resolve_throw_in(state, from, dice, events);
        return;
    }

    let catcher = state.player_at(dest).filter(|p| p.state.can_act()).map(|p| p.id);
    if let Some(catcher_id) = catcher {
        state.ball = BallState::on_ground(dest);
        if !resolve_catch(state, catcher_id, dice, 0, events.as_deref_mut()) {
            resolve_bounce(state, dest, dice, depth + 1, events);
        }
    } else {
        state.ball = BallState::on_ground(dest);
    }
}

/// The crowd hurls the ball back: d8 direction, 2d6 squares, clamped to
/// the pitch, then a catch-or-bounce at the landing square.
pub fn resolve_throw_in(
    state: &mut MatchState,
    last_on_pitch: Position,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) {
    let d8 = dice.d8();
    let distance = dice.d2d6();
    let offset = scatter_direction(d8);

    let mut dest = Position::new(
        last_on_pitch.x + offset.x * distance as i8,
        last_on_pitch.y + offset.y * distance as i8,
    );
    if !dest.is_on_pitch() {
        dest = dest.clamped_to_pitch();
    }

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::BallBounce, -1, -1)
            .at(last_on_pitch, dest)
            .with_roll(distance, true),
    );

    let catcher = state.player_at(dest).filter(|p| p.state.can_act()).map(|p| p.id);
    if let Some(catcher_id) = catcher {
        state.ball = BallState::on_ground(dest);
        if !resolve_catch(state, catcher_id, dice, 0, events.as_deref_mut()) {
            resolve_bounce(state, dest, dice, 0, events);
        }
    } else {
        state.ball = BallState::on_ground(dest);
    }
}

/// When a carrier hits the turf, the ball lands at their square and
/// bounces.
pub fn handle_ball_on_player_down(
    state: &mut MatchState,
    player_id: i32,
    dice: &mut dyn DiceRoller,
    events: Option<&mut Vec<GameEvent>>,
) {
    if !state.ball.is_held || state.ball.carrier_id != player_id {
        return;
    }
    let pos = state.player(player_id).position;
    state.ball = BallState::on_ground(pos);
    resolve_bounce(state, pos, dice, 0, events);
}
