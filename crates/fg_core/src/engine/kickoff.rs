//! The full kickoff: scatter the kick, resolve the 2d6 kickoff table,
//! roll weather and settle the ball.

use serde::{Deserialize, Serialize};

use super::ball::BallState;
use super::ball_handling::{resolve_bounce, resolve_catch};
use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::match_state::{weather_from_roll, GamePhase, MatchState};
use super::player::{PlayerState, Skill, TeamSide};
use super::position::{scatter_direction, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KickoffEvent {
    GetTheRef,
    Riot,
    PerfectDefence,
    HighKick,
    Cheering,
    BrilliantCoaching,
    ChangingWeather,
    QuickSnap,
    Blitz,
    ThrowARock,
    PitchInvasion,
}

pub fn kickoff_event_from_roll(roll: i32) -> KickoffEvent {
    match roll.clamp(2, 12) {
        2 => KickoffEvent::GetTheRef,
        3 => KickoffEvent::Riot,
        4 => KickoffEvent::PerfectDefence,
        5 => KickoffEvent::HighKick,
        6 => KickoffEvent::Cheering,
        7 => KickoffEvent::BrilliantCoaching,
        8 => KickoffEvent::ChangingWeather,
        9 => KickoffEvent::QuickSnap,
        10 => KickoffEvent::Blitz,
        11 => KickoffEvent::ThrowARock,
        _ => KickoffEvent::PitchInvasion,
    }
}

/// A stunned victim drops a carried ball where they stand.
fn resolve_bounce_if_carrying(
    state: &mut MatchState,
    player_id: i32,
    dice: &mut dyn DiceRoller,
    events: Option<&mut Vec<GameEvent>>,
) {
    if state.ball.is_held && state.ball.carrier_id == player_id {
        super::ball_handling::handle_ball_on_player_down(state, player_id, dice, events);
    }
}

/// Closest standing player on a side to a square.
fn find_closest_player(state: &MatchState, side: TeamSide, target: Position) -> Option<i32> {
    let mut best_id = None;
    let mut best_dist = i32::MAX;
    for p in state.on_pitch_of(side) {
        if p.state != PlayerState::Standing {
            continue;
        }
        let d = p.position.distance_to(target);
        if d < best_dist {
            best_dist = d;
            best_id = Some(p.id);
        }
    }
    best_id
}

/// Shift a standing player one square toward a target, if a closer
/// empty square exists.
fn move_player_toward(state: &mut MatchState, player_id: i32, target: Position) {
    let p = state.player(player_id);
    if p.state != PlayerState::Standing {
        return;
    }
    let mut best_dist = p.position.distance_to(target);
    let mut best_pos = p.position;

    for pos in p.position.adjacent() {
        if !pos.is_on_pitch() || state.player_id_at(pos).is_some() {
            continue;
        }
        let d = pos.distance_to(target);
        if d < best_dist {
            best_dist = d;
            best_pos = pos;
        }
    }

    if best_pos != state.player(player_id).position {
        if state.ball.is_held && state.ball.carrier_id == player_id {
            state.ball.position = best_pos;
        }
        state.player_mut(player_id).position = best_pos;
    }
}

fn resolve_kickoff_event(
    state: &mut MatchState,
    event: KickoffEvent,
    receiving: TeamSide,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) {
    let kicking = receiving.opponent();

    match event {
        KickoffEvent::GetTheRef | KickoffEvent::PerfectDefence => {
            // No effect in this ruleset.
        }

        KickoffEvent::Riot => {
            let recv_team = state.team_mut(receiving);
            if recv_team.turn_number <= 1 {
                recv_team.turn_number += 1;
            } else {
                recv_team.turn_number -= 1;
            }
        }

        KickoffEvent::HighKick => {
            // Closest receiver drops under the ball.
            if !state.ball.is_held {
                let ball_pos = state.ball.position;
                if let Some(id) = find_closest_player(state, receiving, ball_pos) {
                    if state.player_id_at(ball_pos).is_none() {
                        state.player_mut(id).position = ball_pos;
                    }
                }
            }
        }

        KickoffEvent::Cheering | KickoffEvent::BrilliantCoaching => {
            // Opposed d6; the louder dugout banks a reroll.
            let home_roll = dice.d6();
            let away_roll = dice.d6();
            if home_roll > away_roll {
                state.home_team.rerolls += 1;
            } else if away_roll > home_roll {
                state.away_team.rerolls += 1;
            }
        }

        KickoffEvent::ChangingWeather => {
            let weather_roll = dice.d2d6();
            state.weather = weather_from_roll(weather_roll);
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::WeatherChange, -1, -1).with_roll(weather_roll, true),
            );
        }

        KickoffEvent::QuickSnap | KickoffEvent::Blitz => {
            // One free shuffle toward the line of scrimmage.
            let side = if event == KickoffEvent::QuickSnap {
                receiving
            } else {
                kicking
            };
            let los_x = if side == TeamSide::Home { 12 } else { 13 };
            let los_target = Position::new(los_x, 7);
            let ids: Vec<i32> = state
                .on_pitch_of(side)
                .filter(|p| p.state == PlayerState::Standing)
                .map(|p| p.id)
                .collect();
            for id in ids {
                move_player_toward(state, id, los_target);
            }
        }

        KickoffEvent::ThrowARock => {
            for side in [TeamSide::Home, TeamSide::Away] {
                let standing: Vec<i32> = state
                    .on_pitch_of(side)
                    .filter(|p| p.state == PlayerState::Standing)
                    .map(|p| p.id)
                    .collect();
                if standing.is_empty() {
                    continue;
                }
                let pick = (dice.d6() as usize) % standing.len();
                let victim = standing[pick];
                resolve_bounce_if_carrying(state, victim, dice, events.as_deref_mut());
                state.player_mut(victim).state = PlayerState::Stunned;
                let pos = state.player(victim).position;
                emit(
                    events.as_deref_mut(),
                    GameEvent::new(EventKind::KnockedDown, victim, -1)
                        .at(pos, Position::OFF_PITCH),
                );
            }
        }

        KickoffEvent::PitchInvasion => {
            for id in 1..=22 {
                if state.player(id).state != PlayerState::Standing {
                    continue;
                }
                let roll = dice.d6();
                if roll == 6 {
                    resolve_bounce_if_carrying(state, id, dice, events.as_deref_mut());
                    state.player_mut(id).state = PlayerState::Stunned;
                    let pos = state.player(id).position;
                    emit(
                        events.as_deref_mut(),
                        GameEvent::new(EventKind::KnockedDown, id, -1)
                            .at(pos, Position::OFF_PITCH)
                            .with_roll(roll, false),
                    );
                }
            }
        }
    }
}

/// Kick off to the receiving side: scatter the ball, run the kickoff
/// table, roll weather and settle the landing. Ends in the Play phase.
pub fn resolve_kickoff(
    state: &mut MatchState,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) {
    let receiving = state.kicking_team.opponent();
    state.active_team = receiving;

    state.home_team.turn_number = 0;
    state.away_team.turn_number = 0;

    state.team_mut(receiving).turn_number = 1;
    state.team_mut(receiving).reset_for_new_turn();
    state.reset_players_for_new_turn(receiving);

    // Aim at the middle of the receiving half.
    let kick_x: i8 = if state.kicking_team == TeamSide::Home {
        18
    } else {
        7
    };
    let kick_y: i8 = 7;

    let dist = dice.d6();
    let dir = dice.d8();
    let scatter = scatter_direction(dir);
    let land = Position::new(
        kick_x + scatter.x * dist as i8,
        kick_y + scatter.y * dist as i8,
    )
    .clamped_to_pitch();

    // A kick landing in the kicking half is a touchback: the receivers
    // hand the ball to whoever stands closest.
    let touchback = match receiving {
        TeamSide::Home => land.x > 12,
        TeamSide::Away => land.x < 13,
    };

    if touchback {
        if let Some(id) = find_closest_player(state, receiving, land) {
            let pos = state.player(id).position;
            state.ball = BallState::carried(pos, id);
        } else {
            state.ball = BallState::on_ground(land);
        }
    } else {
        state.ball = BallState::on_ground(land);
    }

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Kickoff, -1, -1)
            .at(Position::OFF_PITCH, land)
            .with_roll(0, true),
    );

    let kickoff_roll = dice.d2d6();
    let ko_event = kickoff_event_from_roll(kickoff_roll);
    resolve_kickoff_event(state, ko_event, receiving, dice, events.as_deref_mut());

    if ko_event != KickoffEvent::ChangingWeather {
        state.weather = weather_from_roll(dice.d2d6());
    }

    // Kick-off return: the closest returner jogs up to 3 squares.
    if !touchback {
        let ball_pos = state.ball.position;
        let mut best: Option<(i32, i32)> = None;
        for p in state.on_pitch_of(receiving) {
            if p.state != PlayerState::Standing || !p.has_skill(Skill::KickOffReturn) {
                continue;
            }
            let d = p.position.distance_to(ball_pos);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((p.id, d));
            }
        }
        if let Some((id, _)) = best {
            for _ in 0..3 {
                let ball_pos = state.ball.position;
                move_player_toward(state, id, ball_pos);
            }
        }
    }

    // Settle the landing.
    if !touchback && !state.ball.is_held {
        let ball_pos = state.ball.position;
        let catcher = state
            .player_at(ball_pos)
            .filter(|p| p.side == receiving && p.state == PlayerState::Standing)
            .map(|p| p.id);
        if let Some(catcher_id) = catcher {
            if !resolve_catch(state, catcher_id, dice, 0, events.as_deref_mut()) {
                let pos = state.ball.position;
                resolve_bounce(state, pos, dice, 0, events);
            }
        }
    }

    state.phase = GamePhase::Play;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dice::FixedDice;
    use crate::engine::player::PlayerStats;

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(6, 3, 3, 8);
    }

    #[test]
    fn test_kickoff_table_mapping() {
        assert_eq!(kickoff_event_from_roll(2), KickoffEvent::GetTheRef);
        assert_eq!(kickoff_event_from_roll(7), KickoffEvent::BrilliantCoaching);
        assert_eq!(kickoff_event_from_roll(8), KickoffEvent::ChangingWeather);
        assert_eq!(kickoff_event_from_roll(12), KickoffEvent::PitchInvasion);
        assert_eq!(kickoff_event_from_roll(99), KickoffEvent::PitchInvasion);
    }

    #[test]
    fn test_kickoff_lands_in_play_phase() {
        let mut state = MatchState::new();
        state.kicking_team = TeamSide::Away;
        place(&mut state, 1, 8, 7);
        place(&mut state, 12, 16, 7);

        // Kick at (7,7): scatter d6=2 east (d8=3) -> (9,7) in receiving
        // half. Kickoff 3+4=7 brilliant coaching: home 5 vs away 2 gives
        // home a reroll. Weather 3+4=7 nice.
        let mut dice = FixedDice::new(vec![2, 3, 3, 4, 5, 2, 3, 4]);
        resolve_kickoff(&mut state, &mut dice, None);

        assert_eq!(state.phase, GamePhase::Play);
        assert_eq!(state.active_team, TeamSide::Home);
        assert_eq!(state.home_team.turn_number, 1);
        assert_eq!(state.home_team.rerolls, 1);
        assert!(!state.ball.is_held);
        assert_eq!(state.ball.position, Position::new(9, 7));
    }

    #[test]
    fn test_touchback_hands_ball_to_closest_receiver() {
        let mut state = MatchState::new();
        state.kicking_team = TeamSide::Away;
        place(&mut state, 1, 8, 7);
        place(&mut state, 12, 20, 7);

        // Kick from (7,7) scatters d6=6 east -> x=13: kicking half for
        // the home receivers, so touchback. Kickoff 7 coaching (tie, no
        // reroll), weather 7.
        let mut dice = FixedDice::new(vec![6, 3, 3, 4, 4, 4, 3, 4]);
        resolve_kickoff(&mut state, &mut dice, None);

        assert!(state.ball.is_held);
        assert_eq!(state.ball.carrier_id, 1);
        assert_eq!(state.ball.position, Position::new(8, 7));
    }

    #[test]
    fn test_changing_weather_skips_second_roll() {
        let mut state = MatchState::new();
        state.kicking_team = TeamSide::Away;
        place(&mut state, 1, 8, 7);

        // Scatter d6=1 north (d8=1) from (7,7) -> (7,6).
        // Kickoff 4+4=8 changing weather; 6+6=12 blizzard. No second
        // weather roll follows.
        let mut dice = FixedDice::new(vec![1, 1, 4, 4, 6, 6]);
        resolve_kickoff(&mut state, &mut dice, None);

        assert_eq!(state.weather, crate::engine::match_state::Weather::Blizzard);
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn test_riot_adjusts_receiving_turn() {
        let mut state = MatchState::new();
        state.kicking_team = TeamSide::Away;
        place(&mut state, 1, 8, 7);

        // Scatter d6=1 north. Kickoff 1+2=3 riot: receiving turn 1 -> 2.
        // Weather 3+4.
        let mut dice = FixedDice::new(vec![1, 1, 1, 2, 3, 4]);
        resolve_kickoff(&mut state, &mut dice, None);

        assert_eq!(state.home_team.turn_number, 2, "lost a turn to the riot");
    }
}
