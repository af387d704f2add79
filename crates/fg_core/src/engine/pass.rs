//! Passing: range bands, interception along the throwing line, fumbles,
//! scatter on inaccurate throws, hail-mary bombs and the adjacent
//! hand-off.

use serde::{Deserialize, Serialize};

use super::ball::BallState;
use super::ball_handling::{resolve_bounce, resolve_catch, resolve_throw_in};
use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::helpers::{count_disturbing_presence, count_tacklezones};
use super::match_state::{MatchState, Weather};
use super::player::Skill;
use super::position::{scatter_direction, Position};
use super::resolver::ActionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassRange {
    QuickPass,
    ShortPass,
    LongPass,
    LongBomb,
}

impl PassRange {
    pub fn from_distance(dist: i32) -> PassRange {
        if dist <= 3 {
            PassRange::QuickPass
        } else if dist <= 6 {
            PassRange::ShortPass
        } else if dist <= 10 {
            PassRange::LongPass
        } else {
            PassRange::LongBomb
        }
    }

    /// Accuracy modifier: +1 quick, 0 short, -1 long, -2 bomb.
    pub fn modifier(self) -> i32 {
        match self {
            PassRange::QuickPass => 1,
            PassRange::ShortPass => 0,
            PassRange::LongPass => -1,
            PassRange::LongBomb => -2,
        }
    }

    /// Strong Arm throws one band further.
    pub fn shortened(self) -> PassRange {
        match self {
            PassRange::QuickPass | PassRange::ShortPass => PassRange::QuickPass,
            PassRange::LongPass => PassRange::ShortPass,
            PassRange::LongBomb => PassRange::LongPass,
        }
    }
}

/// Squares strictly between source and destination on the Bresenham
/// line.
pub fn pass_path(src: Position, dst: Position) -> Vec<Position> {
    let mut out = Vec::new();
    let (mut x0, mut y0) = (src.x as i32, src.y as i32);
    let (x1, y1) = (dst.x as i32, dst.y as i32);

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        out.push(Position::new(x0 as i8, y0 as i8));
    }
    out
}

/// First eligible enemy along the path gets one interception attempt.
/// Returns the interceptor's id when the ball is picked off.
fn check_interception(
    state: &mut MatchState,
    passer_id: i32,
    target: Position,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> Option<i32> {
    let passer = state.player(passer_id).clone();
    let enemy_side = passer.side.opponent();

    for pos in pass_path(passer.position, target) {
        if !pos.is_on_pitch() {
            continue;
        }
        let Some(interceptor) = state.player_at(pos) else {
            continue;
        };
        if interceptor.side != enemy_side
            || !interceptor.state.can_act()
            || interceptor.lost_tacklezones
            || interceptor.has_skill(Skill::NoHands)
        {
            continue;
        }

        let int_id = interceptor.id;
        let mut int_target = 7 - interceptor.stats.agility as i32 + 2;
        if interceptor.has_skill(Skill::VeryLongLegs) {
            int_target -= 1;
        }
        if interceptor.has_skill(Skill::ExtraArms) {
            int_target -= 1;
        }
        if !interceptor.has_skill(Skill::NervesOfSteel) {
            int_target += count_tacklezones(state, pos, enemy_side, -1);
        }
        let int_target = int_target.clamp(2, 6);

        let roll = dice.d6();
        let mut success = roll >= int_target;

        // Safe Throw forces one reroll of a successful interception.
        if success && passer.has_skill(Skill::SafeThrow) {
            let reroll = dice.d6();
            if reroll < int_target {
                success = false;
                emit(
                    events.as_deref_mut(),
                    GameEvent::new(EventKind::SkillUsed, passer_id, -1)
                        .with_roll(Skill::SafeThrow as i32, true),
                );
            }
        }

        if success {
            let int_pos = state.player(int_id).position;
            state.ball = BallState::carried(int_pos, int_id);
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::Catch, int_id, passer_id)
                    .at(int_pos, Position::OFF_PITCH)
                    .with_roll(int_target, true),
            );
            return Some(int_id);
        }
        // Only the first eligible defender reaches for it.
        break;
    }
    None
}

fn landing_outcome(state: &MatchState, passer_side: super::player::TeamSide) -> ActionOutcome {
    if state.ball.is_held && state.player(state.ball.carrier_id).side == passer_side {
        ActionOutcome::ok()
    } else {
        ActionOutcome::turnover()
    }
}

pub fn resolve_pass(
    state: &mut MatchState,
    passer_id: i32,
    target: Position,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let passer_side = state.player(passer_id).side;
    state.team_mut(passer_side).pass_used_this_turn = true;
    state.player_mut(passer_id).has_acted = true;

    if !state.ball.is_held || state.ball.carrier_id != passer_id {
        return ActionOutcome::turnover();
    }

    let passer = state.player(passer_id).clone();
    let is_hail_mary = passer.has_skill(Skill::HailMaryPass);
    let dist = passer.position.distance_to(target);

    if !is_hail_mary && dist > 13 {
        return ActionOutcome::turnover();
    }

    // The ball leaves the passer's hands now.
    state.ball = BallState::on_ground(passer.position);

    if is_hail_mary {
        // No interception; d6: 1 fumbles, anything else lands wild.
        let hmp_roll = dice.d6();
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Pass, passer_id, -1)
                .at(passer.position, target)
                .with_roll(hmp_roll, hmp_roll >= 2),
        );

        if hmp_roll == 1 {
            resolve_bounce(state, passer.position, dice, 0, events);
            return ActionOutcome::turnover();
        }

        let mut land = target;
        for _ in 0..3 {
            let d8 = dice.d8();
            let s = scatter_direction(d8);
            land = land.offset(s.x, s.y);
        }

        if !land.is_on_pitch() {
            resolve_throw_in(state, target, dice, events);
            return ActionOutcome::turnover();
        }

        state.ball = BallState::on_ground(land);

        let catcher = state
            .player_at(land)
            .filter(|p| p.state.can_act())
            .map(|p| (p.id, p.side));
        if let Some((catcher_id, catcher_side)) = catcher {
            if resolve_catch(state, catcher_id, dice, 0, events.as_deref_mut()) {
                return if catcher_side == passer_side {
                    ActionOutcome::ok()
                } else {
                    ActionOutcome::turnover()
                };
            }
        }
        if !state.ball.is_held {
            resolve_bounce(state, land, dice, 0, events);
        }
        return landing_outcome(state, passer_side);
    }

    // Regular pass: interception first.
    if check_interception(state, passer_id, target, dice, events.as_deref_mut()).is_some() {
        return ActionOutcome::turnover();
    }

    let mut range = PassRange::from_distance(dist);
    if passer.has_skill(Skill::StrongArm) && range != PassRange::QuickPass {
        range = range.shortened();
    }

    let mut pass_target = 7 - passer.stats.agility as i32;
    pass_target -= range.modifier();

    if passer.has_skill(Skill::Accurate) {
        pass_target -= 1;
    }
    if !passer.has_skill(Skill::NervesOfSteel) {
        pass_target += count_tacklezones(state, passer.position, passer_side, -1);
    }
    pass_target += count_disturbing_presence(state, passer.position, passer_side);

    if matches!(
        state.weather,
        Weather::PouringRain | Weather::Blizzard | Weather::VerySunny
    ) {
        pass_target += 1;
    }

    let pass_target = pass_target.clamp(2, 6);

    let mut roll = dice.d6();

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Pass, passer_id, -1)
            .at(passer.position, target)
            .with_roll(roll, roll >= pass_target),
    );

    // A natural 1 fumbles unless rerolled away.
    if roll == 1 {
        let mut rerolled = false;

        if passer.has_skill(Skill::Pass) {
            roll = dice.d6();
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::SkillUsed, passer_id, -1)
                    .with_roll(Skill::Pass as i32, roll != 1 && roll >= pass_target),
            );
            if roll == 1 {
                resolve_bounce(state, passer.position, dice, 0, events);
                return ActionOutcome::turnover();
            }
            rerolled = true;
        }

        if !rerolled
            && passer.has_skill(Skill::Pro)
            && !state.player(passer_id).pro_used_this_turn
        {
            state.player_mut(passer_id).pro_used_this_turn = true;
            let pro_roll = dice.d6();
            if pro_roll >= 4 {
                roll = dice.d6();
                if roll == 1 {
                    resolve_bounce(state, passer.position, dice, 0, events);
                    return ActionOutcome::turnover();
                }
                rerolled = true;
            }
        }

        if !rerolled && state.team(passer_side).can_use_reroll() {
            let team = state.team_mut(passer_side);
            team.rerolls -= 1;
            team.reroll_used_this_turn = true;

            if passer.has_skill(Skill::Loner) {
                let loner_roll = dice.d6();
                if loner_roll < 4 {
                    resolve_bounce(state, passer.position, dice, 0, events);
                    return ActionOutcome::turnover();
                }
            }
            roll = dice.d6();
            if roll == 1 {
                resolve_bounce(state, passer.position, dice, 0, events);
                return ActionOutcome::turnover();
            }
            rerolled = true;
        }

        if !rerolled {
            resolve_bounce(state, passer.position, dice, 0, events);
            return ActionOutcome::turnover();
        }
    }

    let accurate = roll >= pass_target;

    if accurate {
        state.ball = BallState::on_ground(target);
        let catcher = state
            .player_at(target)
            .filter(|p| p.state.can_act() && !p.has_skill(Skill::NoHands))
            .map(|p| (p.id, p.side));
        if let Some((catcher_id, catcher_side)) = catcher {
            if resolve_catch(state, catcher_id, dice, 1, events.as_deref_mut()) {
                return if catcher_side == passer_side {
                    ActionOutcome::ok()
                } else {
                    ActionOutcome::turnover()
                };
            }
        }
    } else {
        // Off target: d8 direction, d6 squares.
        let dir = dice.d8();
        let scatter_dist = dice.d6();
        let s = scatter_direction(dir);
        let land = Position::new(
            target.x + s.x * scatter_dist as i8,
            target.y + s.y * scatter_dist as i8,
        );

        if !land.is_on_pitch() {
            resolve_throw_in(state, target, dice, events);
            return ActionOutcome::turnover();
        }

        state.ball = BallState::on_ground(land);

        let catcher = state
            .player_at(land)
            .filter(|p| p.state.can_act() && !p.has_skill(Skill::NoHands))
            .map(|p| (p.id, p.side));
        if let Some((catcher_id, catcher_side)) = catcher {
            if resolve_catch(state, catcher_id, dice, 0, events.as_deref_mut()) {
                return if catcher_side == passer_side {
                    ActionOutcome::ok()
                } else {
                    ActionOutcome::turnover()
                };
            }
        }
    }

    if !state.ball.is_held {
        let pos = state.ball.position;
        resolve_bounce(state, pos, dice, 0, events);
    }

    landing_outcome(state, passer_side)
}

/// Hand the ball to an adjacent standing teammate: a catch at +1, no
/// interception, no accuracy roll.
pub fn resolve_hand_off(
    state: &mut MatchState,
    giver_id: i32,
    receiver_id: i32,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let giver_side = state.player(giver_id).side;
    state.team_mut(giver_side).pass_used_this_turn = true;
    state.player_mut(giver_id).has_acted = true;

    let giver_pos = state.player(giver_id).position;
    let receiver_pos = state.player(receiver_id).position;

    if giver_pos.distance_to(receiver_pos) != 1 {
        return ActionOutcome::fail();
    }

    if !state.ball.is_held || state.ball.carrier_id != giver_id {
        return ActionOutcome::turnover();
    }

    state.ball = BallState::on_ground(receiver_pos);

    if resolve_catch(state, receiver_id, dice, 1, events.as_deref_mut()) {
        return ActionOutcome::ok();
    }

    if !state.ball.is_held {
        resolve_bounce(state, receiver_pos, dice, 0, events);
    }

    landing_outcome(state, giver_side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dice::FixedDice;
    use crate::engine::player::{PlayerState, PlayerStats, TeamSide};

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8, agility: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(6, 3, agility, 8);
    }

    #[test]
    fn test_range_bands() {
        assert_eq!(PassRange::from_distance(3), PassRange::QuickPass);
        assert_eq!(PassRange::from_distance(6), PassRange::ShortPass);
        assert_eq!(PassRange::from_distance(10), PassRange::LongPass);
        assert_eq!(PassRange::from_distance(13), PassRange::LongBomb);
        assert_eq!(PassRange::QuickPass.modifier(), 1);
        assert_eq!(PassRange::LongBomb.modifier(), -2);
    }

    #[test]
    fn test_pass_path_straight_line() {
        let path = pass_path(Position::new(2, 7), Position::new(6, 7));
        assert_eq!(
            path,
            vec![
                Position::new(3, 7),
                Position::new(4, 7),
                Position::new(5, 7)
            ]
        );
    }

    #[test]
    fn test_accurate_pass_caught() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 3);
        place(&mut state, 2, 8, 7, 3);
        state.ball = BallState::carried(Position::new(5, 7), 1);

        // Quick pass (dist 3): target 7-3-1=3; roll 4 accurate.
        // Catch at +1: 7-3-1=3; roll 5 catches.
        let mut dice = FixedDice::new(vec![4, 5]);
        let outcome = resolve_pass(&mut state, 1, Position::new(8, 7), &mut dice, None);

        assert!(outcome.success);
        assert!(!outcome.turnover);
        assert_eq!(state.ball.carrier_id, 2);
        assert!(state.home_team.pass_used_this_turn);
        assert!(state.player(1).has_acted);
    }

    #[test]
    fn test_interception() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 3);
        place(&mut state, 2, 9, 7, 3);
        place(&mut state, 12, 7, 7, 3);
        state.ball = BallState::carried(Position::new(5, 7), 1);

        // Interceptor target: 7-3+2=6; roll 6 picks it off.
        let mut dice = FixedDice::new(vec![6]);
        let outcome = resolve_pass(&mut state, 1, Position::new(9, 7), &mut dice, None);

        assert!(outcome.turnover);
        assert_eq!(state.ball.carrier_id, 12);
    }

    #[test]
    fn test_safe_throw_forces_reroll() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 3);
        place(&mut state, 2, 9, 7, 3);
        place(&mut state, 12, 7, 7, 3);
        state.player_mut(1).skills.add(Skill::SafeThrow);
        state.ball = BallState::carried(Position::new(5, 7), 1);

        // Interception 6 succeeds, safe throw reroll 2 cancels it.
        // Pass continues: dist 4 short, target 7-3-0=4; roll 5 accurate.
        // Catch at +1: 3; roll 4.
        let mut dice = FixedDice::new(vec![6, 2, 5, 4]);
        let outcome = resolve_pass(&mut state, 1, Position::new(9, 7), &mut dice, None);

        assert!(outcome.success);
        assert_eq!(state.ball.carrier_id, 2);
    }

    #[test]
    fn test_natural_one_fumbles() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 3);
        place(&mut state, 2, 8, 7, 3);
        state.ball = BallState::carried(Position::new(5, 7), 1);

        // Roll 1, no rerolls: ball bounces from the passer (d8=3 east).
        let mut dice = FixedDice::new(vec![1, 3]);
        let outcome = resolve_pass(&mut state, 1, Position::new(8, 7), &mut dice, None);

        assert!(outcome.turnover);
        assert!(!state.ball.is_held);
        assert_eq!(state.ball.position, Position::new(6, 7));
    }

    #[test]
    fn test_inaccurate_pass_scatters() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 3);
        state.ball = BallState::carried(Position::new(5, 7), 1);

        // Long pass to (13,7): dist 8, target 7-3+1=5; roll 3 misses.
        // Scatter d8=1 north, d6=2: lands (13,5), then bounces south.
        let mut dice = FixedDice::new(vec![3, 1, 2, 5]);
        let outcome = resolve_pass(&mut state, 1, Position::new(13, 7), &mut dice, None);

        assert!(outcome.turnover);
        assert_eq!(state.ball.position, Position::new(13, 6));
    }

    #[test]
    fn test_pass_out_of_range_is_turnover() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 3);
        state.ball = BallState::carried(Position::new(5, 7), 1);

        let mut dice = FixedDice::new(vec![]);
        let outcome = resolve_pass(&mut state, 1, Position::new(20, 7), &mut dice, None);
        assert!(outcome.turnover);
    }

    #[test]
    fn test_hail_mary_ignores_range_and_interceptors() {
        let mut state = MatchState::new();
        place(&mut state, 1, 2, 7, 3);
        place(&mut state, 12, 10, 7, 6); // would intercept a normal pass
        state.player_mut(1).skills.add(Skill::HailMaryPass);
        state.ball = BallState::carried(Position::new(2, 7), 1);

        // HMP roll 4 (no fumble), three scatters: N, E, E -> (22,6),
        // then a final bounce south.
        let mut dice = FixedDice::new(vec![4, 1, 3, 3, 5]);
        let outcome = resolve_pass(&mut state, 1, Position::new(20, 7), &mut dice, None);

        assert!(outcome.turnover, "nobody caught it");
        assert_eq!(state.ball.position, Position::new(22, 7));
        assert_eq!(state.ball.carrier_id, -1);
    }

    #[test]
    fn test_hand_off_adjacent_catch() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 3);
        place(&mut state, 2, 6, 7, 3);
        state.ball = BallState::carried(Position::new(5, 7), 1);

        // Catch at +1: 7-3-1=3; roll 3.
        let mut dice = FixedDice::new(vec![3]);
        let outcome = resolve_hand_off(&mut state, 1, 2, &mut dice, None);

        assert!(outcome.success);
        assert_eq!(state.ball.carrier_id, 2);
    }

    #[test]
    fn test_hand_off_requires_adjacency() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 3);
        place(&mut state, 2, 8, 7, 3);
        state.ball = BallState::carried(Position::new(5, 7), 1);

        let mut dice = FixedDice::new(vec![]);
        let outcome = resolve_hand_off(&mut state, 1, 2, &mut dice, None);
        assert!(!outcome.success);
        assert!(!outcome.turnover);
        assert_eq!(state.ball.carrier_id, 1, "ball stays put");
    }

    #[test]
    fn test_enemy_catch_at_target_is_turnover() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 3);
        place(&mut state, 12, 8, 7, 4);
        state.ball = BallState::carried(Position::new(5, 7), 1);
        state.away_team.side = TeamSide::Away;

        // Quick pass target 3: roll 5 accurate. Enemy at the target
        // catches at +1 (7-4-1=2): roll 4.
        let mut dice = FixedDice::new(vec![5, 4]);
        let outcome = resolve_pass(&mut state, 1, Position::new(8, 7), &mut dice, None);

        assert!(outcome.turnover);
        assert_eq!(state.ball.carrier_id, 12);
    }
}
