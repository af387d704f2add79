//! Throw team-mate: hurl an adjacent Right Stuff player downfield, with
//! the Always Hungry mishap, scatter on anything but a clean throw, and
//! a landing roll at the far end.

use super::ball_handling::handle_ball_on_player_down;
use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::helpers::count_tacklezones;
use super::injury::{resolve_armour_and_injury, resolve_crowd_surf, InjuryContext};
use super::match_state::MatchState;
use super::pass::PassRange;
use super::player::{PlayerState, Skill};
use super::position::{scatter_direction, Position};
use super::resolver::ActionOutcome;

pub fn resolve_throw_team_mate(
    state: &mut MatchState,
    thrower_id: i32,
    projectile_id: i32,
    target: Position,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let thrower_side = state.player(thrower_id).side;
    state.player_mut(thrower_id).has_acted = true;
    state.team_mut(thrower_side).pass_used_this_turn = true;

    let thrower = state.player(thrower_id).clone();

    // Always Hungry: on a 1 (after a possible team reroll) the thrower
    // eats the projectile instead.
    if thrower.has_skill(Skill::AlwaysHungry) {
        let mut hungry_roll = dice.d6();
        if hungry_roll == 1 {
            let mut rerolled = false;
            if state.team(thrower_side).can_use_reroll() {
                let team = state.team_mut(thrower_side);
                team.rerolls -= 1;
                team.reroll_used_this_turn = true;

                let mut can_reroll = true;
                if thrower.has_skill(Skill::Loner) {
                    let loner_roll = dice.d6();
                    if loner_roll < 4 {
                        can_reroll = false;
                    }
                }
                if can_reroll {
                    hungry_roll = dice.d6();
                    if hungry_roll != 1 {
                        rerolled = true;
                    }
                }
            }

            if !rerolled && hungry_roll == 1 {
                emit(
                    events.as_deref_mut(),
                    GameEvent::new(EventKind::SkillUsed, thrower_id, projectile_id)
                        .at(thrower.position, Position::OFF_PITCH)
                        .with_roll(Skill::AlwaysHungry as i32, false),
                );
                handle_ball_on_player_down(state, projectile_id, dice, events.as_deref_mut());
                let p = state.player_mut(projectile_id);
                p.state = PlayerState::Injured;
                p.position = Position::OFF_PITCH;
                return ActionOutcome::ok(); // gruesome, but not a turnover
            }
        }
    }

    // Accuracy roll, pass-style but without interception.
    let dist = thrower.position.distance_to(target);
    let mut range = PassRange::from_distance(dist);
    if thrower.has_skill(Skill::StrongArm) && range != PassRange::QuickPass {
        range = range.shortened();
    }

    let mut pass_target = 7 - thrower.stats.agility as i32;
    pass_target -= range.modifier();
    if !thrower.has_skill(Skill::NervesOfSteel) {
        pass_target += count_tacklezones(state, thrower.position, thrower_side, -1);
    }
    let pass_target = pass_target.clamp(2, 6);

    let roll = dice.d6();
    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Pass, thrower_id, projectile_id)
            .at(thrower.position, target)
            .with_roll(roll, roll >= pass_target && roll != 1),
    );

    let fumble = roll == 1;
    let accurate = !fumble && roll >= pass_target;

    let mut land = target;
    if fumble {
        // Straight up and down: one scatter from the thrower.
        let d8 = dice.d8();
        let s = scatter_direction(d8);
        land = thrower.position.offset(s.x, s.y);
    } else if !accurate {
        let d8 = dice.d8();
        let s = scatter_direction(d8);
        land = target.offset(s.x, s.y);
    }

    if !land.is_on_pitch() {
        handle_ball_on_player_down(state, projectile_id, dice, events.as_deref_mut());
        state.player_mut(projectile_id).position = Position::OFF_PITCH;
        resolve_crowd_surf(state, projectile_id, dice, events.as_deref_mut());
        return ActionOutcome::turnover();
    }

    // Bounce off occupied squares until an empty one or the crowd.
    while state.player_id_at(land).is_some() {
        let d8 = dice.d8();
        let s = scatter_direction(d8);
        land = land.offset(s.x, s.y);
        if !land.is_on_pitch() {
            handle_ball_on_player_down(state, projectile_id, dice, events.as_deref_mut());
            state.player_mut(projectile_id).position = Position::OFF_PITCH;
            resolve_crowd_surf(state, projectile_id, dice, events.as_deref_mut());
            return ActionOutcome::turnover();
        }
    }

    state.player_mut(projectile_id).position = land;
    if state.ball.is_held && state.ball.carrier_id == projectile_id {
        state.ball.position = land;
    }

    // Landing roll: agility against the zones waiting below.
    let projectile = state.player(projectile_id).clone();
    let mut land_target = 7 - projectile.stats.agility as i32;
    land_target += count_tacklezones(state, land, projectile.side, -1);
    let land_target = land_target.clamp(2, 6);

    let land_roll = dice.d6();
    if land_roll >= land_target {
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::SkillUsed, projectile_id, -1)
                .at(land, Position::OFF_PITCH)
                .with_roll(Skill::RightStuff as i32, true),
        );
        return ActionOutcome::ok();
    }

    // Crash landing.
    state.player_mut(projectile_id).state = PlayerState::Prone;
    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::KnockedDown, projectile_id, -1).at(land, Position::OFF_PITCH),
    );
    let ctx = InjuryContext::default();
    resolve_armour_and_injury(state, projectile_id, dice, &ctx, events.as_deref_mut());
    handle_ball_on_player_down(state, projectile_id, dice, events);

    ActionOutcome::turnover()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dice::FixedDice;
    use crate::engine::player::PlayerStats;

    fn setup() -> MatchState {
        let mut state = MatchState::new();
        let t = state.player_mut(1);
        t.state = PlayerState::Standing;
        t.position = Position::new(5, 7);
        t.stats = PlayerStats::new(5, 5, 2, 9);
        t.skills.add(Skill::ThrowTeamMate);

        let p = state.player_mut(2);
        p.state = PlayerState::Standing;
        p.position = Position::new(6, 7);
        p.stats = PlayerStats::new(6, 2, 3, 7);
        p.skills.add(Skill::RightStuff);
        p.skills.add(Skill::Stunty);
        state
    }

    #[test]
    fn test_accurate_throw_clean_landing() {
        let mut state = setup();

        // Quick pass (dist 3): target 7-2-1=4; roll 5 accurate.
        // Landing: 7-3=4; roll 4 sticks it.
        let mut dice = FixedDice::new(vec![5, 4]);
        let outcome =
            resolve_throw_team_mate(&mut state, 1, 2, Position::new(8, 7), &mut dice, None);

        assert!(outcome.success);
        assert!(!outcome.turnover);
        assert_eq!(state.player(2).position, Position::new(8, 7));
        assert_eq!(state.player(2).state, PlayerState::Standing);
        assert!(state.home_team.pass_used_this_turn);
    }

    #[test]
    fn test_crash_landing_is_turnover() {
        let mut state = setup();

        // Accurate (5), landing 2 fails target 4: prone, armour 4+4=8
        // breaks AV7, injury 2+2+1 stunty = 5 stuns.
        let mut dice = FixedDice::new(vec![5, 2, 4, 4, 2, 2]);
        let outcome =
            resolve_throw_team_mate(&mut state, 1, 2, Position::new(8, 7), &mut dice, None);

        assert!(outcome.turnover);
        assert_eq!(state.player(2).state, PlayerState::Stunned);
    }

    #[test]
    fn test_inaccurate_throw_scatters_once() {
        let mut state = setup();

        // Roll 2 misses target 4 (not a fumble): scatter d8=1 north from
        // the aim point, landing (8,6); landing roll 4 sticks.
        let mut dice = FixedDice::new(vec![2, 1, 4]);
        let outcome =
            resolve_throw_team_mate(&mut state, 1, 2, Position::new(8, 7), &mut dice, None);

        assert!(outcome.success);
        assert_eq!(state.player(2).position, Position::new(8, 6));
    }

    #[test]
    fn test_always_hungry_eats_projectile() {
        let mut state = setup();
        state.player_mut(1).skills.add(Skill::AlwaysHungry);

        // Hungry roll 1, no team rerolls: munch. Not a turnover.
        let mut dice = FixedDice::new(vec![1]);
        let outcome =
            resolve_throw_team_mate(&mut state, 1, 2, Position::new(8, 7), &mut dice, None);

        assert!(outcome.success);
        assert!(!outcome.turnover);
        assert_eq!(state.player(2).state, PlayerState::Injured);
    }

    #[test]
    fn test_thrown_off_pitch_crowd_surfs() {
        let mut state = setup();
        state.player_mut(1).position = Position::new(24, 7);
        state.player_mut(2).position = Position::new(25, 7);

        // Aim at (25,5), quick range target 4, roll 2 inaccurate,
        // scatter east (d8=3) off the pitch: crowd surf, injury
        // 2+2+1 stunty +1 crowd = 6 -> stunned -> demoted to KO.
        let mut dice = FixedDice::new(vec![2, 3, 2, 2]);
        let outcome =
            resolve_throw_team_mate(&mut state, 1, 2, Position::new(25, 5), &mut dice, None);

        assert!(outcome.turnover);
        assert_eq!(state.player(2).state, PlayerState::Ko);
        assert!(!state.player(2).position.is_on_pitch());
    }
}
