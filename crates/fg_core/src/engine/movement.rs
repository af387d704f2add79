//! Single-square movement and everything that can interrupt it:
//! tentacles, dodges, go-for-it rolls, shadowing chases and pickups.

use super::ball_handling::{handle_ball_on_player_down, resolve_pickup};
use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::helpers::{attempt_roll, count_tacklezones, dodge_target, tackle_adjacent};
use super::injury::{resolve_armour_and_injury, InjuryContext};
use super::match_state::{MatchState, Weather};
use super::pathfinder::gfi_allowance;
use super::player::{PlayerState, Skill};
use super::position::Position;
use super::resolver::ActionOutcome;

/// Adjacent enemies with Tentacles contest a dodge step before it starts:
/// d6 + mover ST vs d6 + tentacle ST, escape on strictly greater. A caught
/// mover stays put and their movement ends, without a turnover.
fn check_tentacles(
    state: &mut MatchState,
    player_id: i32,
    from: Position,
    dice: &mut dyn DiceRoller,
    events: Option<&mut Vec<GameEvent>>,
) -> bool {
    let mover = state.player(player_id).clone();

    for pos in from.adjacent() {
        if !pos.is_on_pitch() {
            continue;
        }
        let Some(opp) = state.player_at(pos) else {
            continue;
        };
        if opp.side == mover.side
            || !opp.state.can_act()
            || opp.lost_tacklezones
            || !opp.has_skill(Skill::Tentacles)
        {
            continue;
        }
        let opp_id = opp.id;
        let opp_st = opp.stats.strength as i32;

        let mover_roll = dice.d6();
        let tent_roll = dice.d6();
        let escaped = mover_roll + mover.stats.strength as i32 > tent_roll + opp_st;

        emit(
            events,
            GameEvent::new(EventKind::SkillUsed, opp_id, player_id)
                .with_roll(Skill::Tentacles as i32, !escaped),
        );

        if !escaped {
            state.player_mut(player_id).has_moved = true;
            return true;
        }
        // One tentacles contest per step.
        break;
    }
    false
}

/// After a successful dodge, one adjacent enemy with Shadowing may chase
/// into the vacated square on d6 + its MA - mover MA >= 6.
fn check_shadowing(
    state: &mut MatchState,
    player_id: i32,
    from: Position,
    dice: &mut dyn DiceRoller,
    events: Option<&mut Vec<GameEvent>>,
) {
    let mover_ma = state.player(player_id).stats.movement as i32;
    let mover_side = state.player(player_id).side;

    for pos in from.adjacent() {
        if !pos.is_on_pitch() {
            continue;
        }
        let Some(opp) = state.player_at(pos) else {
            continue;
        };
        if opp.side == mover_side
            || !opp.state.can_act()
            || opp.lost_tacklezones
            || !opp.has_skill(Skill::Shadowing)
        {
            continue;
        }
        let opp_id = opp.id;
        let opp_pos = opp.position;
        let opp_ma = opp.stats.movement as i32;

        let roll = dice.d6();
        let follows = roll + opp_ma - mover_ma >= 6;

        emit(
            events,
            GameEvent::new(EventKind::SkillUsed, opp_id, player_id)
                .at(opp_pos, from)
                .with_roll(Skill::Shadowing as i32, follows),
        );

        if follows && state.player_id_at(from).is_none() {
            state.player_mut(opp_id).position = from;
            if state.ball.is_held && state.ball.carrier_id == opp_id {
                state.ball.position = from;
            }
        }
        // One shadowing attempt per step.
        break;
    }
}

fn fall_at_destination(
    state: &mut MatchState,
    player_id: i32,
    to: Position,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let p = state.player_mut(player_id);
    p.position = to;
    p.state = PlayerState::Prone;
    p.has_acted = true;

    let ctx = InjuryContext::default();
    resolve_armour_and_injury(state, player_id, dice, &ctx, events.as_deref_mut());
    handle_ball_on_player_down(state, player_id, dice, events);

    ActionOutcome::turnover()
}

/// One step to an adjacent empty square, with all interrupts resolved in
/// order: tentacles, movement spend, dodge, go-for-it, shadowing, pickup.
pub fn resolve_move_step(
    state: &mut MatchState,
    player_id: i32,
    to: Position,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let from = state.player(player_id).position;

    if from.distance_to(to) != 1 || !to.is_on_pitch() {
        return ActionOutcome::fail();
    }
    if state.player_id_at(to).is_some() {
        return ActionOutcome::fail();
    }

    let needs_dodge = count_tacklezones(state, from, state.player(player_id).side, -1) > 0;

    if needs_dodge && check_tentacles(state, player_id, from, dice, events.as_deref_mut()) {
        // Caught: movement over, no turnover.
        return ActionOutcome::ok();
    }

    {
        let p = state.player_mut(player_id);
        p.movement_remaining -= 1;
        p.has_moved = true;
    }

    let mut needs_gfi = false;
    if state.player(player_id).movement_remaining < 0 {
        let max_gfi = gfi_allowance(&state.player(player_id).clone());
        if (state.player(player_id).movement_remaining as i32) < -max_gfi {
            state.player_mut(player_id).movement_remaining += 1;
            return ActionOutcome::fail();
        }
        needs_gfi = true;
    }

    if needs_dodge {
        let player = state.player(player_id).clone();
        let target = dodge_target(state, &player, to, from);
        let tackle_negates = tackle_adjacent(state, from, player.side);

        let dodge_ok = attempt_roll(
            state,
            player_id,
            dice,
            target,
            Some(Skill::Dodge),
            tackle_negates,
            true,
            events.as_deref_mut(),
        );

        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Dodge, player_id, -1)
                .at(from, to)
                .with_roll(target, dodge_ok),
        );

        if !dodge_ok {
            return fall_at_destination(state, player_id, to, dice, events);
        }
    }

    if needs_gfi {
        let gfi_target = if state.weather == Weather::Blizzard { 3 } else { 2 };

        let gfi_ok = attempt_roll(
            state,
            player_id,
            dice,
            gfi_target,
            Some(Skill::SureFeet),
            false,
            true,
            events.as_deref_mut(),
        );

        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Gfi, player_id, -1)
                .at(from, to)
                .with_roll(gfi_target, gfi_ok),
        );

        if !gfi_ok {
            return fall_at_destination(state, player_id, to, dice, events);
        }
    }

    state.player_mut(player_id).position = to;
    if state.ball.is_held && state.ball.carrier_id == player_id {
        state.ball.position = to;
    }

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::PlayerMove, player_id, -1)
            .at(from, to)
            .with_roll(0, true),
    );

    if needs_dodge {
        check_shadowing(state, player_id, from, dice, events.as_deref_mut());
    }

    if !state.ball.is_held && state.ball.position == to {
        let picked_up = resolve_pickup(state, player_id, dice, events);
        if !picked_up {
            state.player_mut(player_id).has_acted = true;
            return ActionOutcome::turnover();
        }
    }

    ActionOutcome::ok()
}

/// Leap over intervening squares: up to distance 2, costs 2 movement,
/// agility roll against tacklezones at the landing square only.
pub fn resolve_leap(
    state: &mut MatchState,
    player_id: i32,
    to: Position,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let from = state.player(player_id).position;

    let dist = from.distance_to(to);
    if !(1..=2).contains(&dist) || !to.is_on_pitch() {
        return ActionOutcome::fail();
    }
    if state.player_id_at(to).is_some() {
        return ActionOutcome::fail();
    }

    {
        let p = state.player_mut(player_id);
        p.movement_remaining -= 2;
        p.has_moved = true;
    }

    let mut needs_gfi = false;
    if state.player(player_id).movement_remaining < 0 {
        let max_gfi = gfi_allowance(&state.player(player_id).clone());
        if (state.player(player_id).movement_remaining as i32) < -max_gfi {
            state.player_mut(player_id).movement_remaining += 2;
            return ActionOutcome::fail();
        }
        needs_gfi = true;
    }

    let player = state.player(player_id).clone();
    let mut target = 7 - player.stats.agility as i32;
    target += count_tacklezones(state, to, player.side, -1);
    if player.has_skill(Skill::VeryLongLegs) {
        target -= 1;
    }
    let target = target.clamp(2, 6);

    let leap_ok = attempt_roll(
        state,
        player_id,
        dice,
        target,
        None,
        false,
        true,
        events.as_deref_mut(),
    );

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Dodge, player_id, -1)
            .at(from, to)
            .with_roll(target, leap_ok),
    );

    if !leap_ok {
        return fall_at_destination(state, player_id, to, dice, events);
    }

    if needs_gfi {
        let gfi_target = if state.weather == Weather::Blizzard { 3 } else { 2 };
        let gfi_ok = attempt_roll(
            state,
            player_id,
            dice,
            gfi_target,
            Some(Skill::SureFeet),
            false,
            true,
            events.as_deref_mut(),
        );
        if !gfi_ok {
            return fall_at_destination(state, player_id, to, dice, events);
        }
    }

    state.player_mut(player_id).position = to;
    if state.ball.is_held && state.ball.carrier_id == player_id {
        state.ball.position = to;
    }

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::PlayerMove, player_id, -1)
            .at(from, to)
            .with_roll(0, true),
    );

    if !state.ball.is_held && state.ball.position == to {
        let picked_up = resolve_pickup(state, player_id, dice, events);
        if !picked_up {
            state.player_mut(player_id).has_acted = true;
            return ActionOutcome::turnover();
        }
    }

    ActionOutcome::ok()
}

/// Standing up costs 3 movement, or nothing with Jump Up.
pub fn resolve_stand_up(
    state: &mut MatchState,
    player_id: i32,
    _dice: &mut dyn DiceRoller,
    _events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let p = state.player(player_id);
    if p.state != PlayerState::Prone {
        return ActionOutcome::fail();
    }

    if p.has_skill(Skill::JumpUp) {
        state.player_mut(player_id).state = PlayerState::Standing;
        return ActionOutcome::ok();
    }

    if p.movement_remaining < 3 {
        return ActionOutcome::fail();
    }

    let p = state.player_mut(player_id);
    p.movement_remaining -= 3;
    p.state = PlayerState::Standing;
    ActionOutcome::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ball::BallState;
    use crate::engine::dice::FixedDice;
    use crate::engine::player::PlayerStats;

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(6, 3, 3, 8);
        p.movement_remaining = 6;
    }

    #[test]
    fn test_simple_step() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);

        let mut dice = FixedDice::new(vec![]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 7), &mut dice, None);

        assert!(outcome.success);
        assert!(!outcome.turnover);
        assert_eq!(state.player(1).position, Position::new(11, 7));
        assert_eq!(state.player(1).movement_remaining, 5);
    }

    #[test]
    fn test_step_rejects_non_adjacent_and_occupied() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        place(&mut state, 2, 11, 7);

        let mut dice = FixedDice::new(vec![]);
        assert!(!resolve_move_step(&mut state, 1, Position::new(13, 7), &mut dice, None).success);
        assert!(!resolve_move_step(&mut state, 1, Position::new(11, 7), &mut dice, None).success);
        assert_eq!(state.player(1).position, Position::new(10, 7));
        assert_eq!(state.player(1).movement_remaining, 6, "no movement spent");
    }

    #[test]
    fn test_dodge_success_and_carrier_ball_moves() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        place(&mut state, 12, 10, 8);
        state.ball = BallState::carried(Position::new(10, 7), 1);

        // Dodge target 7-3=4 into a clear square; roll 4.
        let mut dice = FixedDice::new(vec![4]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 6), &mut dice, None);

        assert!(outcome.success);
        assert_eq!(state.ball.position, Position::new(11, 6));
    }

    #[test]
    fn test_failed_dodge_is_knockdown_turnover() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        place(&mut state, 12, 10, 8);
        state.ball = BallState::carried(Position::new(10, 7), 1);

        // Dodge fails on 2 (no rerolls), armour 3+3=6 holds, ball bounces d8=3.
        let mut dice = FixedDice::new(vec![2, 3, 3, 3]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 7), &mut dice, None);

        assert!(outcome.turnover);
        assert_eq!(state.player(1).state, PlayerState::Prone);
        assert_eq!(state.player(1).position, Position::new(11, 7));
        assert!(!state.ball.is_held);
        assert_eq!(state.ball.position, Position::new(12, 7), "bounced east");
    }

    #[test]
    fn test_gfi_required_and_failed() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        state.player_mut(1).movement_remaining = 0;

        // GFI target 2 fails on 1; armour holds.
        let mut dice = FixedDice::new(vec![1, 2, 2]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 7), &mut dice, None);

        assert!(outcome.turnover);
        assert_eq!(state.player(1).state, PlayerState::Prone);
    }

    #[test]
    fn test_gfi_blizzard_target() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        state.player_mut(1).movement_remaining = 0;
        state.weather = Weather::Blizzard;

        // 2 fails against blizzard target 3.
        let mut dice = FixedDice::new(vec![2, 4, 4, 3, 3]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 7), &mut dice, None);
        assert!(outcome.turnover);
    }

    #[test]
    fn test_gfi_exhausted_is_rejected() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        state.player_mut(1).movement_remaining = -2;

        let mut dice = FixedDice::new(vec![]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 7), &mut dice, None);
        assert!(!outcome.success);
        assert_eq!(state.player(1).movement_remaining, -2, "undone");
    }

    #[test]
    fn test_tentacles_trap_ends_movement() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        place(&mut state, 12, 10, 8);
        state.player_mut(12).skills.add(Skill::Tentacles);
        state.player_mut(12).stats.strength = 5;

        // Mover 3+3=6 vs tentacles 3+5=8: caught.
        let mut dice = FixedDice::new(vec![3, 3]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 6), &mut dice, None);

        assert!(outcome.success);
        assert!(!outcome.turnover);
        assert_eq!(state.player(1).position, Position::new(10, 7), "held in place");
        assert!(state.player(1).has_moved);
    }

    #[test]
    fn test_shadowing_follows_into_vacated_square() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        place(&mut state, 12, 10, 8);
        state.player_mut(12).skills.add(Skill::Shadowing);
        state.player_mut(12).stats.movement = 8;

        // Dodge 4 passes; shadow roll 4 + 8 - 6 = 6 follows.
        let mut dice = FixedDice::new(vec![4, 4]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 6), &mut dice, None);

        assert!(outcome.success);
        assert_eq!(state.player(12).position, Position::new(10, 7));
    }

    #[test]
    fn test_step_onto_ball_picks_up() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        state.ball = BallState::on_ground(Position::new(11, 7));

        // Pickup target 6-3=3; roll 5.
        let mut dice = FixedDice::new(vec![5]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 7), &mut dice, None);

        assert!(outcome.success);
        assert!(state.ball.is_held);
        assert_eq!(state.ball.carrier_id, 1);
    }

    #[test]
    fn test_failed_pickup_is_turnover() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        state.ball = BallState::on_ground(Position::new(11, 7));

        // Pickup 2 fails target 3; bounce d8=1 north.
        let mut dice = FixedDice::new(vec![2, 1]);
        let outcome = resolve_move_step(&mut state, 1, Position::new(11, 7), &mut dice, None);

        assert!(outcome.turnover);
        assert!(state.player(1).has_acted);
        assert_eq!(state.ball.position, Position::new(11, 6));
    }

    #[test]
    fn test_stand_up_costs_three() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        state.player_mut(1).state = PlayerState::Prone;

        let mut dice = FixedDice::new(vec![]);
        let outcome = resolve_stand_up(&mut state, 1, &mut dice, None);
        assert!(outcome.success);
        assert_eq!(state.player(1).state, PlayerState::Standing);
        assert_eq!(state.player(1).movement_remaining, 3);
    }

    #[test]
    fn test_stand_up_needs_movement_unless_jump_up() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        state.player_mut(1).state = PlayerState::Prone;
        state.player_mut(1).movement_remaining = 2;

        let mut dice = FixedDice::new(vec![]);
        assert!(!resolve_stand_up(&mut state, 1, &mut dice, None).success);

        state.player_mut(1).skills.add(Skill::JumpUp);
        assert!(resolve_stand_up(&mut state, 1, &mut dice, None).success);
        assert_eq!(state.player(1).movement_remaining, 2, "jump up is free");
    }

    #[test]
    fn test_leap_clears_tacklezones() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        place(&mut state, 12, 11, 7);

        // Leap to (12,7): distance 2, lands in opponent's zone.
        // Target 7-3 +1 TZ = 5; roll 5 passes.
        let mut dice = FixedDice::new(vec![5]);
        let outcome = resolve_leap(&mut state, 1, Position::new(12, 7), &mut dice, None);

        assert!(outcome.success);
        assert_eq!(state.player(1).position, Position::new(12, 7));
        assert_eq!(state.player(1).movement_remaining, 4);
    }
}
