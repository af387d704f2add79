//! Action dispatch: one entry point resolves any declared action,
//! running the pre-action discipline gates first and the turnover /
//! touchdown / half-over bookkeeping after.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ball_and_chain::resolve_ball_and_chain;
use super::big_guy::{has_big_guy_skill, resolve_big_guy_check};
use super::block::{resolve_block, resolve_multiple_block, BlockParams};
use super::bomb::resolve_bomb_throw;
use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::foul::resolve_foul;
use super::gaze::resolve_hypnotic_gaze;
use super::match_state::{GamePhase, MatchState};
use super::movement::{resolve_move_step, resolve_stand_up};
use super::pass::{resolve_hand_off, resolve_pass};
use super::pathfinder::reach_adjacent_to;
use super::player::PlayerState;
use super::position::Position;
use super::ttm::resolve_throw_team_mate;
use super::turn::{check_half_over, check_touchdown, resolve_end_turn};

/// Outcome of one resolved action. Failure and turnover are expected
/// results, not errors; illegal actions come back as plain failures
/// with the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub turnover: bool,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        ActionOutcome {
            success: true,
            turnover: false,
        }
    }

    pub fn fail() -> Self {
        ActionOutcome {
            success: false,
            turnover: false,
        }
    }

    pub fn turnover() -> Self {
        ActionOutcome {
            success: false,
            turnover: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Move,
    Block,
    Blitz,
    Pass,
    HandOff,
    Foul,
    ThrowTeamMate,
    BombThrow,
    HypnoticGaze,
    BallAndChain,
    MultipleBlock,
    EndTurn,
    SetupPlayer,
    EndSetup,
}

impl ActionKind {
    pub fn requires_player(self) -> bool {
        !matches!(self, ActionKind::EndTurn | ActionKind::EndSetup)
    }
}

/// A declared action. Ids are -1 when unused; `target` doubles as a
/// position payload. For a multiple block the second defender's id is
/// carried in `target.x`; the layout is part of the trained-feature
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub player_id: i32,
    pub target_id: i32,
    pub target: Position,
}

impl Action {
    pub fn end_turn() -> Self {
        Action {
            kind: ActionKind::EndTurn,
            player_id: -1,
            target_id: -1,
            target: Position::OFF_PITCH,
        }
    }

    pub fn new(kind: ActionKind, player_id: i32, target_id: i32, target: Position) -> Self {
        Action {
            kind,
            player_id,
            target_id,
            target,
        }
    }
}

/// Resolve one action against the state. No end-of-turn bookkeeping
/// happens here; `execute_action` layers that on.
pub fn resolve_action(
    state: &mut MatchState,
    action: &Action,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    if action.kind.requires_player() && !(1..=22).contains(&action.player_id) {
        return ActionOutcome::fail();
    }

    // Discipline gates fire before the declared action does anything.
    if action.kind.requires_player() && has_big_guy_skill(state, action.player_id) {
        let gate = resolve_big_guy_check(
            state,
            action.player_id,
            action.kind,
            dice,
            events.as_deref_mut(),
        );
        if gate.action_blocked && !gate.proceed {
            // Wasted, not a turnover.
            return ActionOutcome::ok();
        }
    }

    match action.kind {
        ActionKind::Move => {
            if state.player(action.player_id).state == PlayerState::Prone {
                let stood = resolve_stand_up(state, action.player_id, dice, events.as_deref_mut());
                if !stood.success {
                    return stood;
                }
                // Target on own square encodes a bare stand-up.
                if action.target == state.player(action.player_id).position {
                    return ActionOutcome::ok();
                }
            }
            resolve_move_step(state, action.player_id, action.target, dice, events)
        }

        ActionKind::Block => {
            let params = BlockParams {
                attacker_id: action.player_id,
                target_id: action.target_id,
                is_blitz: false,
                horns_bonus: false,
            };
            resolve_block(state, &params, dice, events, false, false)
        }

        ActionKind::Blitz => resolve_blitz(state, action, dice, events),

        ActionKind::Pass => {
            resolve_pass(state, action.player_id, action.target, dice, events)
        }

        ActionKind::HandOff => {
            resolve_hand_off(state, action.player_id, action.target_id, dice, events)
        }

        ActionKind::Foul => {
            resolve_foul(state, action.player_id, action.target_id, dice, events)
        }

        ActionKind::ThrowTeamMate => resolve_throw_team_mate(
            state,
            action.player_id,
            action.target_id,
            action.target,
            dice,
            events,
        ),

        ActionKind::BombThrow => {
            resolve_bomb_throw(state, action.player_id, action.target, dice, events)
        }

        ActionKind::HypnoticGaze => {
            resolve_hypnotic_gaze(state, action.player_id, action.target_id, dice, events)
        }

        ActionKind::BallAndChain => {
            resolve_ball_and_chain(state, action.player_id, dice, events)
        }

        ActionKind::MultipleBlock => resolve_multiple_block(
            state,
            action.player_id,
            action.target_id,
            action.target.x as i32,
            dice,
            events,
        ),

        ActionKind::EndTurn => {
            resolve_end_turn(state, events);
            ActionOutcome::ok()
        }

        ActionKind::SetupPlayer | ActionKind::EndSetup => ActionOutcome::fail(),
    }
}

/// A blitz is movement toward the target followed by a block with the
/// blitz bonuses. Intermediate steps use the greedy nearest-empty-square
/// walk; any knockdown or turnover along the way ends the action.
fn resolve_blitz(
    state: &mut MatchState,
    action: &Action,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let side = state.player(action.player_id).side;
    state.team_mut(side).blitz_used_this_turn = true;
    state.player_mut(action.player_id).used_blitz = true;

    if state.player(action.player_id).state == PlayerState::Prone {
        let stood = resolve_stand_up(state, action.player_id, dice, events.as_deref_mut());
        if !stood.success {
            return stood;
        }
    }

    loop {
        let me = state.player(action.player_id).position;
        let target_pos = state.player(action.target_id).position;
        if me.distance_to(target_pos) <= 1 {
            break;
        }

        let player = state.player(action.player_id).clone();
        if reach_adjacent_to(state, &player, target_pos).is_none() {
            return ActionOutcome::fail();
        }

        // Greedy next step: adjacent empty square closest to the target.
        let mut best_next: Option<Position> = None;
        let mut best_dist = i32::MAX;
        for pos in me.adjacent() {
            if !pos.is_on_pitch() || state.player_id_at(pos).is_some() {
                continue;
            }
            let d = pos.distance_to(target_pos);
            if d < best_dist {
                best_dist = d;
                best_next = Some(pos);
            }
        }
        let Some(next) = best_next else {
            return ActionOutcome::fail();
        };

        let step = resolve_move_step(state, action.player_id, next, dice, events.as_deref_mut());
        if step.turnover || !step.success {
            return step;
        }
        if state.player(action.player_id).state != PlayerState::Standing {
            return ActionOutcome::turnover();
        }
    }

    let me = state.player(action.player_id).position;
    let target_pos = state.player(action.target_id).position;
    if me.distance_to(target_pos) != 1 {
        return ActionOutcome::fail();
    }

    let params = BlockParams {
        attacker_id: action.player_id,
        target_id: action.target_id,
        is_blitz: true,
        horns_bonus: true,
    };
    resolve_block(state, &params, dice, events, false, false)
}

/// Resolve, then settle the table: turnovers hand the turn over,
/// touchdowns score and move to the touchdown phase, and a spent turn
/// counter closes the half.
pub fn execute_action(
    state: &mut MatchState,
    action: &Action,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let outcome = resolve_action(state, action, dice, events.as_deref_mut());

    if outcome.turnover {
        state.turnover_pending = true;
        resolve_end_turn(state, events.as_deref_mut());
    }

    if check_touchdown(state) {
        let scoring_side = state.player(state.ball.carrier_id).side;
        state.team_mut(scoring_side).score += 1;
        state.phase = GamePhase::Touchdown;
        debug!(?scoring_side, "touchdown");
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Touchdown, state.ball.carrier_id, -1)
                .at(state.ball.position, Position::OFF_PITCH)
                .with_roll(0, true),
        );
    }

    if check_half_over(state) {
        state.phase = if state.half >= 2 {
            GamePhase::GameOver
        } else {
            GamePhase::HalfTime
        };
    }

    outcome
}
