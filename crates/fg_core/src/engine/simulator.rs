//! Match loop: half setup and formations, kickoffs, the decision loop
//! driving policies, and the logged variant used for training data.

use tracing::debug;

use crate::features::{extract_state_features, NUM_STATE_FEATURES};
use crate::roster::TeamRoster;

use super::ball::BallState;
use super::ball_handling::resolve_catch;
use super::dice::DiceRoller;
use super::enumerator::available_actions;
use super::kickoff::resolve_kickoff;
use super::match_state::{weather_from_roll, GamePhase, MatchState};
use super::player::{PlayerState, Skill, TeamSide};
use super::position::{scatter_direction, Position};
use super::resolver::{execute_action, Action};

/// Decision cap per match; a runaway policy cannot spin forever.
const MAX_DECISIONS: i32 = 5000;

/// A policy picks one action per decision point.
pub type ActionSelector<'a> = dyn FnMut(&MatchState) -> Action + 'a;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameResult {
    pub home_score: i32,
    pub away_score: i32,
    pub total_actions: i32,
}

/// State features captured at a turn boundary, from the perspective of
/// the side about to act.
#[derive(Debug, Clone)]
pub struct StateLog {
    pub features: [f32; NUM_STATE_FEATURES],
    pub perspective: TeamSide,
}

#[derive(Debug, Clone, Default)]
pub struct LoggedGameResult {
    pub result: GameResult,
    pub states: Vec<StateLog>,
}

/// Formation slot offsets from the line of scrimmage, receiver shape:
/// four on the line, four in the second row, three deep.
const OFFENSIVE_FORMATION: [(i8, i8); 11] = [
    (0, 5),
    (0, 6),
    (0, 7),
    (0, 8),
    (-1, 4),
    (-1, 6),
    (-1, 8),
    (-1, 10),
    (-3, 3),
    (-3, 7),
    (-3, 11),
];

/// Kicking shape: three short columns and two deep safeties covering
/// the gaps. Slot 10 is the deep safety who receives the Kick trait.
const DEFENSIVE_FORMATION: [(i8, i8); 11] = [
    (0, 4),
    (0, 7),
    (0, 10),
    (-1, 4),
    (-1, 7),
    (-1, 10),
    (-2, 4),
    (-2, 7),
    (-2, 10),
    (-5, 5),
    (-5, 9),
];

/// Fill eleven slots from the roster: specialists claim the backfield
/// first, linemen backfill the front.
fn build_team(state: &mut MatchState, side: TeamSide, roster: &TeamRoster, formation: &[(i8, i8); 11]) {
    let base_id = match side {
        TeamSide::Home => 1,
        TeamSide::Away => 12,
    };
    let base_los: i8 = match side {
        TeamSide::Home => 12,
        TeamSide::Away => 13,
    };
    // Away mirrors the x offsets.
    let flip: i8 = match side {
        TeamSide::Home => 1,
        TeamSide::Away => -1,
    };

    let place = |state: &mut MatchState, slot: usize, template_idx: usize| {
        let (dx, y) = formation[slot];
        let roster_t = &roster.positionals[template_idx];
        let p = state.player_mut(base_id + slot as i32);
        p.side = side;
        p.state = PlayerState::Standing;
        p.position = Position::new(base_los + dx * flip, y);
        p.stats = roster_t.stats;
        p.skills = roster_t.skills;
        p.movement_remaining = p.stats.movement;
        p.has_moved = false;
        p.has_acted = false;
        p.used_blitz = false;
        p.lost_tacklezones = false;
        p.pro_used_this_turn = false;
    };

    // Specialists from the back of the formation down.
    let mut slot: i32 = 10;
    for template_idx in 1..roster.positionals.len() {
        let qty = roster.positionals[template_idx].quantity.min(11) as i32;
        for _ in 0..qty {
            if slot < 0 {
                break;
            }
            place(state, slot as usize, template_idx);
            slot -= 1;
        }
    }

    // Linemen take whatever is left at the front.
    for s in 0..=slot {
        place(state, s as usize, 0);
    }

    let team = state.team_mut(side);
    team.side = side;
    team.rerolls = 3;
    team.turn_number = 0;
    team.has_apothecary = roster.has_apothecary;
    team.apothecary_used = false;
    team.reset_for_new_turn();
}

/// Place both teams for a drive. The kicking side lines up in the
/// defensive shape and its deep safety is granted the Kick trait; the
/// receivers take the offensive shape.
pub fn setup_half(
    state: &mut MatchState,
    home: &TeamRoster,
    away: &TeamRoster,
    kicking_team: TeamSide,
) {
    for id in 1..=22 {
        let p = state.player_mut(id);
        p.state = PlayerState::OffPitch;
        p.position = Position::OFF_PITCH;
        p.has_moved = false;
        p.has_acted = false;
        p.used_blitz = false;
        p.lost_tacklezones = false;
        p.pro_used_this_turn = false;
    }

    state.kicking_team = kicking_team;

    let home_formation = if kicking_team == TeamSide::Home {
        &DEFENSIVE_FORMATION
    } else {
        &OFFENSIVE_FORMATION
    };
    let away_formation = if kicking_team == TeamSide::Away {
        &DEFENSIVE_FORMATION
    } else {
        &OFFENSIVE_FORMATION
    };

    build_team(state, TeamSide::Home, home, home_formation);
    build_team(state, TeamSide::Away, away, away_formation);

    // The kicker's deep safety handles kicks.
    let kick_base_id = match kicking_team {
        TeamSide::Home => 1,
        TeamSide::Away => 12,
    };
    let safety = state.player_mut(kick_base_id + 10);
    if safety.is_on_pitch() {
        safety.skills.add(Skill::Kick);
    }

    state.ball = BallState::off_pitch();
    state.turnover_pending = false;
    state.phase = GamePhase::Setup;
}

fn has_kick_player(state: &MatchState, kicking_team: TeamSide) -> bool {
    state
        .on_pitch_of(kicking_team)
        .any(|p| p.state == PlayerState::Standing && p.has_skill(Skill::Kick))
}

/// Abbreviated kickoff: scatter the ball deep, skip the kickoff table,
/// roll weather, go straight to play.
pub fn simple_kickoff(state: &mut MatchState, dice: &mut dyn DiceRoller) {
    let receiving = state.kicking_team.opponent();
    state.active_team = receiving;

    state.home_team.turn_number = 0;
    state.away_team.turn_number = 0;

    state.team_mut(receiving).turn_number = 1;
    state.team_mut(receiving).reset_for_new_turn();
    state.reset_players_for_new_turn(receiving);

    let kick_x: i8 = if state.kicking_team == TeamSide::Home {
        22
    } else {
        3
    };
    let kick_y: i8 = 7;

    let mut dist = dice.d6();
    if has_kick_player(state, state.kicking_team) {
        dist = (dist + 1) / 2;
    }
    let dir = dice.d8();
    let scatter = scatter_direction(dir);
    let land = Position::new(
        kick_x + scatter.x * dist as i8,
        kick_y + scatter.y * dist as i8,
    )
    .clamped_to_pitch();

    let catcher = state
        .player_at(land)
        .filter(|p| p.side == receiving && p.state == PlayerState::Standing)
        .map(|p| p.id);
    match catcher {
        Some(catcher_id) => {
            state.ball = BallState::on_ground(land);
            resolve_catch(state, catcher_id, dice, 0, None);
        }
        None => {
            state.ball = BallState::on_ground(land);
        }
    }

    state.phase = GamePhase::Play;
    state.weather = weather_from_roll(dice.d2d6());
}

fn run_match_loop(
    state: &mut MatchState,
    home: &TeamRoster,
    away: &TeamRoster,
    home_policy: &mut ActionSelector,
    away_policy: &mut ActionSelector,
    dice: &mut dyn DiceRoller,
    full_kickoff: bool,
    mut state_log: Option<&mut Vec<StateLog>>,
) -> GameResult {
    let do_kickoff = |state: &mut MatchState, dice: &mut dyn DiceRoller| {
        if full_kickoff {
            resolve_kickoff(state, dice, None);
        } else {
            simple_kickoff(state, dice);
        }
    };

    state.half = 1;
    state.kicking_team = TeamSide::Away; // home receives first
    setup_half(state, home, away, state.kicking_team);
    do_kickoff(state, dice);

    if let Some(log) = state_log.as_deref_mut() {
        log.push(StateLog {
            features: extract_state_features(state, state.active_team),
            perspective: state.active_team,
        });
    }

    let mut actions = Vec::new();
    let mut total_actions = 0;
    let mut last_active = state.active_team;
    let mut last_turn = state.team(last_active).turn_number;

    while state.phase != GamePhase::GameOver && total_actions < MAX_DECISIONS {
        match state.phase {
            GamePhase::Touchdown => {
                state.kicking_team = state.kicking_team.opponent();
                setup_half(state, home, away, state.kicking_team);
                do_kickoff(state, dice);
                continue;
            }
            GamePhase::HalfTime => {
                state.half = 2;
                state.kicking_team = state.kicking_team.opponent();
                setup_half(state, home, away, state.kicking_team);
                do_kickoff(state, dice);
                continue;
            }
            _ => {}
        }

        if let Some(log) = state_log.as_deref_mut() {
            let cur = state.active_team;
            let turn = state.team(cur).turn_number;
            if cur != last_active || turn != last_turn {
                log.push(StateLog {
                    features: extract_state_features(state, cur),
                    perspective: cur,
                });
                last_active = cur;
                last_turn = turn;
            }
        }

        available_actions(state, &mut actions);

        if actions.is_empty() {
            execute_action(state, &Action::end_turn(), dice, None);
            total_actions += 1;
            continue;
        }

        let chosen = if state.active_team == TeamSide::Home {
            home_policy(state)
        } else {
            away_policy(state)
        };

        execute_action(state, &chosen, dice, None);
        total_actions += 1;
    }

    debug!(
        home = state.home_team.score,
        away = state.away_team.score,
        total_actions,
        "match finished"
    );

    GameResult {
        home_score: state.home_team.score,
        away_score: state.away_team.score,
        total_actions,
    }
}

/// Run a full match between two rosters under two policies.
pub fn simulate_match(
    home: &TeamRoster,
    away: &TeamRoster,
    home_policy: &mut ActionSelector,
    away_policy: &mut ActionSelector,
    dice: &mut dyn DiceRoller,
    full_kickoff: bool,
) -> GameResult {
    let mut state = MatchState::new();
    run_match_loop(
        &mut state,
        home,
        away,
        home_policy,
        away_policy,
        dice,
        full_kickoff,
        None,
    )
}

/// As `simulate_match`, but also captures a feature snapshot at every
/// turn boundary. Policies that record their own decision
/// distributions keep them; read those off the policy afterwards.
pub fn simulate_match_logged(
    home: &TeamRoster,
    away: &TeamRoster,
    home_policy: &mut ActionSelector,
    away_policy: &mut ActionSelector,
    dice: &mut dyn DiceRoller,
    full_kickoff: bool,
) -> LoggedGameResult {
    let mut state = MatchState::new();
    let mut states = Vec::new();
    let result = run_match_loop(
        &mut state,
        home,
        away,
        home_policy,
        away_policy,
        dice,
        full_kickoff,
        Some(&mut states),
    );
    LoggedGameResult { result, states }
}
