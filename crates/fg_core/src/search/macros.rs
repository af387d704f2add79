//! Macro actions: tactical intents that expand into short primitive
//! plans. The enumerator emits a handful of situation-matched macros
//! instead of hundreds of primitives; greedy expansion turns the chosen
//! macro into concrete moves on a live state.

use serde::{Deserialize, Serialize};

use crate::engine::dice::DiceRoller;
use crate::engine::enumerator::available_actions;
use crate::engine::helpers::{block_dice_info, count_assists, count_tacklezones};
use crate::engine::match_state::{GamePhase, MatchState};
use crate::engine::player::{Player, PlayerState, Skill, TeamSide};
use crate::engine::position::{Position, PITCH_HEIGHT};
use crate::engine::resolver::{execute_action, Action, ActionKind};
use crate::features::NUM_ACTION_FEATURES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MacroKind {
    Score,
    Advance,
    Cage,
    Blitz,
    Block,
    Pickup,
    Pass,
    Foul,
    Reposition,
    EndTurn,
    BlitzAndScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    pub kind: MacroKind,
    /// Primary player, or -1 when the expansion picks one.
    pub player_id: i32,
    pub target_id: i32,
    pub target_pos: Position,
}

impl Macro {
    pub fn end_turn() -> Self {
        Macro {
            kind: MacroKind::EndTurn,
            player_id: -1,
            target_id: -1,
            target_pos: Position::OFF_PITCH,
        }
    }

    fn new(kind: MacroKind, player_id: i32, target_id: i32, target_pos: Position) -> Self {
        Macro {
            kind,
            player_id,
            target_id,
            target_pos,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MacroExpansion {
    pub actions: Vec<Action>,
    pub turnover: bool,
}

fn end_zone_x(side: TeamSide) -> i8 {
    match side {
        TeamSide::Home => 25,
        TeamSide::Away => 0,
    }
}

fn dist_to_end_zone(pos: Position, side: TeamSide) -> i32 {
    (pos.x as i32 - end_zone_x(side) as i32).abs()
}

fn forward_dx(side: TeamSide) -> i8 {
    match side {
        TeamSide::Home => 1,
        TeamSide::Away => -1,
    }
}

fn find_carrier(state: &MatchState) -> Option<&Player> {
    if !state.ball.is_held || state.ball.carrier_id <= 0 {
        return None;
    }
    let p = state.player(state.ball.carrier_id);
    if p.side != state.active_team || !p.is_on_pitch() {
        return None;
    }
    Some(p)
}

fn is_free_to_act(p: &Player) -> bool {
    p.can_act() && !p.has_moved
}

/// Signed block dice from the attacker's side (+2 = two dice, attacker
/// picks; -2 = two dice against).
fn block_dice_count(state: &MatchState, att: &Player, def: &Player, is_blitz: bool) -> i32 {
    let mut att_st = att.stats.strength as i32;
    if is_blitz && att.has_skill(Skill::Horns) {
        att_st += 1;
    }
    let att_assists = count_assists(state, def.position, att.side, att.id, def.id, def.id);
    let def_assists = count_assists(state, att.position, def.side, def.id, att.id, att.id);
    let info = block_dice_info(att_st + att_assists, def.stats.strength as i32 + def_assists);
    if info.attacker_chooses {
        info.count
    } else {
        -info.count
    }
}

fn find_nearest_free_player(
    state: &MatchState,
    target: Position,
    exclude_id: i32,
) -> Option<i32> {
    let mut best = None;
    let mut best_dist = i32::MAX;
    for p in state.on_pitch_of(state.active_team) {
        if p.id == exclude_id || !is_free_to_act(p) || p.has_skill(Skill::BallAndChain) {
            continue;
        }
        let d = p.position.distance_to(target);
        if d < best_dist {
            best_dist = d;
            best = Some(p.id);
        }
    }
    best
}

/// Emit the macros that fit the current tactical situation: a small,
/// curated set instead of the full primitive fan-out.
pub fn available_macros(state: &MatchState, out: &mut Vec<Macro>) {
    out.clear();

    if state.phase != GamePhase::Play {
        return;
    }

    let my_side = state.active_team;
    let my_team = state.team(my_side);

    out.push(Macro::end_turn());

    let carrier = find_carrier(state);
    let i_have_ball = carrier.is_some();
    let ball_on_ground = !state.ball.is_held && state.ball.is_on_pitch();

    // Score: the carrier can reach the end zone this turn.
    if let Some(carrier) = carrier {
        if carrier.can_act() {
            let dist = dist_to_end_zone(carrier.position, my_side);
            let max_reach = carrier.movement_remaining as i32 + 2;
            if dist <= max_reach && dist > 0 {
                out.push(Macro::new(MacroKind::Score, carrier.id, -1, Position::OFF_PITCH));
            }
            // Advance: forward progress without a scoring chance.
            if carrier.movement_remaining > 0 && dist > max_reach {
                out.push(Macro::new(
                    MacroKind::Advance,
                    carrier.id,
                    -1,
                    Position::OFF_PITCH,
                ));
            }
        }

        // Cage: free teammates can wall the carrier in.
        let has_free_teammate = state.on_pitch_of(my_side).any(|p| {
            p.id != carrier.id && is_free_to_act(p) && !p.has_skill(Skill::BallAndChain)
        });
        if has_free_teammate {
            out.push(Macro::new(MacroKind::Cage, carrier.id, -1, Position::OFF_PITCH));
        }
    }

    // Blitz: best single target by dice, sideline and ball pressure.
    if !my_team.blitz_used_this_turn {
        let mut best_score = i32::MIN;
        let mut best_target = -1;

        for blitzer in state.on_pitch_of(my_side) {
            if !is_free_to_act(blitzer) || blitzer.has_skill(Skill::BallAndChain) {
                continue;
            }
            for def in state.on_pitch_of(my_side.opponent()) {
                if def.state != PlayerState::Standing {
                    continue;
                }
                let dice = block_dice_count(state, blitzer, def, true);
                let mut score = dice * 2;
                if def.position.y == 0 || def.position.y == PITCH_HEIGHT - 1 {
                    score += 3;
                }
                if let Some(carrier) = carrier {
                    if def.position.distance_to(carrier.position) <= 2 {
                        score += 2;
                    }
                }
                if state.ball.is_held && state.ball.carrier_id == def.id {
                    score += 5;
                }
                if score > best_score {
                    best_score = score;
                    best_target = def.id;
                }
            }
        }

        if best_target > 0 {
            out.push(Macro::new(MacroKind::Blitz, -1, best_target, Position::OFF_PITCH));
        }
    }

    // Blitz-and-score: a defender camps the carrier's lane; knock them
    // aside and walk it in.
    if let Some(carrier) = carrier {
        if carrier.can_act() && !my_team.blitz_used_this_turn {
            let dist = dist_to_end_zone(carrier.position, my_side);
            let max_reach = carrier.movement_remaining as i32 + 2;

            if dist > 0 && dist <= max_reach + 3 {
                let mut best_blocker = -1;
                let mut best_dist = i32::MAX;
                for def in state.on_pitch_of(my_side.opponent()) {
                    if def.state != PlayerState::Standing {
                        continue;
                    }
                    let def_dist = dist_to_end_zone(def.position, my_side);
                    if def_dist >= dist {
                        continue; // behind the carrier
                    }
                    let y_diff = (def.position.y as i32 - carrier.position.y as i32).abs();
                    if y_diff > 2 {
                        continue;
                    }
                    let x_dist = (def.position.x as i32 - carrier.position.x as i32).abs();
                    if x_dist <= 2 && x_dist + y_diff <= 3 {
                        let total = x_dist + y_diff;
                        if total < best_dist {
                            best_dist = total;
                            best_blocker = def.id;
                        }
                    }
                }

                if best_blocker > 0 {
                    out.push(Macro::new(
                        MacroKind::BlitzAndScore,
                        carrier.id,
                        best_blocker,
                        Position::OFF_PITCH,
                    ));
                }
            }
        }
    }

    // Block: only favourable two-plus-dice hits.
    for att in state.on_pitch_of(my_side) {
        if !att.can_act() || att.has_skill(Skill::BallAndChain) {
            continue;
        }
        for pos in att.position.adjacent() {
            if !pos.is_on_pitch() {
                continue;
            }
            let Some(def) = state.player_at(pos) else {
                continue;
            };
            if def.side == my_side || def.state != PlayerState::Standing {
                continue;
            }
            if block_dice_count(state, att, def, false) >= 2 {
                out.push(Macro::new(MacroKind::Block, att.id, def.id, Position::OFF_PITCH));
            }
        }
    }

    // Pickup: send the nearest free player to a loose ball.
    if ball_on_ground {
        if let Some(id) = find_nearest_free_player(state, state.ball.position, -1) {
            out.push(Macro::new(MacroKind::Pickup, id, -1, state.ball.position));
        }
    }

    // Pass: a forward receiver in range.
    if let Some(carrier) = carrier {
        if !my_team.pass_used_this_turn && carrier.can_act() {
            let carrier_dist = dist_to_end_zone(carrier.position, my_side);
            for target in state.on_pitch_of(my_side) {
                if target.id == carrier.id || target.state != PlayerState::Standing {
                    continue;
                }
                let dist = carrier.position.distance_to(target.position);
                let target_dist = dist_to_end_zone(target.position, my_side);
                if (1..=10).contains(&dist) && target_dist < carrier_dist {
                    out.push(Macro::new(
                        MacroKind::Pass,
                        carrier.id,
                        target.id,
                        Position::OFF_PITCH,
                    ));
                }
            }
        }
    }

    // Foul: one macro per fouler with a downed neighbour.
    if !my_team.foul_used_this_turn {
        for fouler in state.on_pitch_of(my_side) {
            if !fouler.can_act() || fouler.has_skill(Skill::BallAndChain) {
                continue;
            }
            let downed = fouler.position.adjacent().iter().find_map(|pos| {
                if !pos.is_on_pitch() {
                    return None;
                }
                state.player_at(*pos).and_then(|t| {
                    if t.side != my_side
                        && matches!(t.state, PlayerState::Prone | PlayerState::Stunned)
                    {
                        Some(t.id)
                    } else {
                        None
                    }
                })
            });
            if let Some(target_id) = downed {
                out.push(Macro::new(MacroKind::Foul, fouler.id, target_id, Position::OFF_PITCH));
            }
        }
    }

    // Reposition: free players take up smart ground. Ball support on
    // offence, a deep safety and a screen on defence.
    let my_end_zone = end_zone_x(my_side.opponent());
    let on_defense = !i_have_ball && !ball_on_ground;
    let mut safety_placed = false;

    let free_ids: Vec<i32> = state
        .on_pitch_of(my_side)
        .filter(|p| {
            is_free_to_act(p)
                && !p.has_skill(Skill::BallAndChain)
                && carrier.map_or(true, |c| c.id != p.id)
        })
        .map(|p| p.id)
        .collect();

    for id in free_ids {
        let p = state.player(id);

        let has_adjacent_enemy = p.position.adjacent().iter().any(|pos| {
            pos.is_on_pitch()
                && state
                    .player_at(*pos)
                    .is_some_and(|o| o.side != my_side && o.state == PlayerState::Standing)
        });
        if has_adjacent_enemy {
            continue;
        }

        let target = if ball_on_ground {
            state.ball.position
        } else if let Some(carrier) = carrier {
            let dx = forward_dx(my_side);
            if p.position.distance_to(carrier.position) <= 3 {
                // Screen two squares ahead of the carrier.
                Position::new(carrier.position.x + dx * 2, carrier.position.y)
            } else {
                carrier.position
            }
        } else if on_defense {
            if !safety_placed && p.stats.movement >= 6 {
                safety_placed = true;
                Position::new(my_end_zone, 7)
            } else {
                let ball_pos = if state.ball.is_on_pitch() {
                    state.ball.position
                } else {
                    Position::new(end_zone_x(my_side), 7)
                };
                let screen_x = (ball_pos.x as i32 + my_end_zone as i32) / 2;
                let screen_y = (3 + (p.id % 9)).clamp(1, 13);
                Position::new(screen_x as i8, screen_y as i8)
            }
        } else {
            let dx = forward_dx(my_side);
            Position::new(p.position.x + dx * 3, 7)
        };

        out.push(Macro::new(MacroKind::Reposition, id, -1, target));
    }
}

// ---------------------------------------------------------------------
// Greedy expansion
// ---------------------------------------------------------------------

fn execute_and_record(
    state: &mut MatchState,
    action: Action,
    dice: &mut dyn DiceRoller,
    result: &mut MacroExpansion,
) -> bool {
    result.actions.push(action);
    let outcome = execute_action(state, &action, dice, None);
    if outcome.turnover {
        result.turnover = true;
        return true;
    }
    false
}

/// Move preference: closer to the target, out of enemy zones, no
/// go-for-its, off the sidelines. Lower is better.
fn score_move_action(state: &MatchState, action: &Action, target: Position, player_id: i32) -> i32 {
    let p = state.player(player_id);
    let dist = action.target.distance_to(target);

    let dest_tz = count_tacklezones(state, action.target, p.side, -1);
    let currently_in_tz = count_tacklezones(state, p.position, p.side, -1) > 0;
    let needs_gfi = p.movement_remaining <= 0;

    let mut score = dist * 10;
    if dest_tz > 0 && !currently_in_tz {
        score += 20 * dest_tz;
    }
    if needs_gfi {
        score += 8;
    }
    if action.target.y <= 1 || action.target.y >= 13 {
        score += 6;
    }
    score
}

fn find_move_toward(
    state: &MatchState,
    actions: &[Action],
    player_id: i32,
    target: Position,
) -> Option<Action> {
    let mut best: Option<Action> = None;
    let mut best_score = i32::MAX;
    for a in actions {
        if a.kind != ActionKind::Move || a.player_id != player_id {
            continue;
        }
        let score = score_move_action(state, a, target, player_id);
        if score < best_score {
            best_score = score;
            best = Some(*a);
        }
    }
    best
}

/// Walk a player toward a target square one scored step at a time, with
/// a one-square detour allowance and loop detection.
fn move_player_toward(
    state: &mut MatchState,
    player_id: i32,
    target: Position,
    dice: &mut dyn DiceRoller,
    result: &mut MacroExpansion,
    max_steps: i32,
) -> bool {
    let mut last_pos = Position::OFF_PITCH;
    let mut actions = Vec::new();

    for _ in 0..max_steps {
        let p = state.player(player_id);
        if !p.is_on_pitch() || p.lost_tacklezones {
            return false;
        }
        if p.position == target {
            return true;
        }
        let current_pos = p.position;
        let current_dist = current_pos.distance_to(target);

        available_actions(state, &mut actions);
        let Some(best_move) = find_move_toward(state, &actions, player_id, target) else {
            return false;
        };

        let move_dist = best_move.target.distance_to(target);
        if move_dist > current_dist + 1 {
            return false; // too much of a detour
        }
        if move_dist >= current_dist && best_move.target == last_pos {
            return false; // bouncing between two squares
        }

        last_pos = current_pos;
        if execute_and_record(state, best_move, dice, result) {
            return false;
        }
    }
    false
}

fn expand_score(state: &mut MatchState, macro_: &Macro, dice: &mut dyn DiceRoller) -> MacroExpansion {
    let mut result = MacroExpansion::default();
    let carrier = state.player(macro_.player_id);
    let target = Position::new(end_zone_x(carrier.side), carrier.position.y);
    move_player_toward(state, macro_.player_id, target, dice, &mut result, 14);
    result
}

fn expand_advance(
    state: &mut MatchState,
    macro_: &Macro,
    dice: &mut dyn DiceRoller,
) -> MacroExpansion {
    let mut result = MacroExpansion::default();
    let carrier = state.player(macro_.player_id).clone();
    let dx = forward_dx(carrier.side);
    let my_team = state.team(carrier.side);

    // Pace the drive: arrive at the end zone around the final turn, and
    // keep half the movement in hand for the cage.
    let dist = dist_to_end_zone(carrier.position, carrier.side);
    let turns_remaining = (9 - my_team.turn_number).max(1);
    let ideal_steps = ((dist + turns_remaining - 1) / turns_remaining).max(1);

    let remaining = carrier.movement_remaining as i32;
    let max_safe = (remaining / 2).max(1);
    let mut steps = ideal_steps.min(max_safe);
    if turns_remaining <= 2 {
        steps = ideal_steps.min(remaining);
    }

    let target_x = (carrier.position.x as i32 + dx as i32 * steps).clamp(1, 24);
    let mut target_y = carrier.position.y;
    if target_y < 5 {
        target_y += 1;
    } else if target_y > 9 {
        target_y -= 1;
    }

    let target = Position::new(target_x as i8, target_y);
    move_player_toward(state, macro_.player_id, target, dice, &mut result, steps + 2);
    result
}

fn expand_cage(state: &mut MatchState, macro_: &Macro, dice: &mut dyn DiceRoller) -> MacroExpansion {
    let mut result = MacroExpansion::default();
    let cp = state.player(macro_.player_id).position;

    let corners = [
        cp.offset(1, 1),
        cp.offset(1, -1),
        cp.offset(-1, 1),
        cp.offset(-1, -1),
    ];

    for corner in corners {
        if !corner.is_on_pitch() {
            continue;
        }
        if state.player_id_at(corner).is_some() {
            continue; // already covered (or contested)
        }
        let Some(mover) = find_nearest_free_player(state, corner, macro_.player_id) else {
            continue;
        };
        move_player_toward(state, mover, corner, dice, &mut result, 4);
        if result.turnover {
            return result;
        }
    }
    result
}

fn expand_blitz(state: &mut MatchState, macro_: &Macro, dice: &mut dyn DiceRoller) -> MacroExpansion {
    let mut result = MacroExpansion::default();

    let mut actions = Vec::new();
    available_actions(state, &mut actions);

    if let Some(a) = actions
        .iter()
        .find(|a| a.kind == ActionKind::Blitz && a.target_id == macro_.target_id)
    {
        execute_and_record(state, *a, dice, &mut result);
    }
    result
}

fn expand_blitz_and_score(
    state: &mut MatchState,
    macro_: &Macro,
    dice: &mut dyn DiceRoller,
) -> MacroExpansion {
    let mut result = MacroExpansion::default();
    let carrier_id = macro_.player_id;
    let blocker_pos = state.player(macro_.target_id).position;

    let mut actions = Vec::new();
    available_actions(state, &mut actions);

    // Prefer a non-carrier blitzer with the best dice.
    let mut best_blitz: Option<Action> = None;
    let mut best_score = i32::MIN;
    for a in &actions {
        if a.kind != ActionKind::Blitz || a.target_id != macro_.target_id {
            continue;
        }
        let blitzer = state.player(a.player_id).clone();
        let blocker = state.player(macro_.target_id).clone();
        let dice_count = block_dice_count(state, &blitzer, &blocker, true);
        let score = dice_count * 10 + if a.player_id == carrier_id { 0 } else { 5 };
        if score > best_score {
            best_score = score;
            best_blitz = Some(*a);
        }
    }

    let Some(blitz) = best_blitz else {
        return result;
    };
    if execute_and_record(state, blitz, dice, &mut result) {
        return result;
    }

    // Finish the job if the blitzer stalled short of the blocker.
    for _ in 0..12 {
        available_actions(state, &mut actions);

        let block = actions.iter().copied().find(|a| {
            a.kind == ActionKind::Block
                && a.player_id == blitz.player_id
                && a.target_id == macro_.target_id
        });
        if let Some(block) = block {
            if execute_and_record(state, block, dice, &mut result) {
                return result;
            }
            break;
        }

        let Some(step) = find_move_toward(state, &actions, blitz.player_id, blocker_pos) else {
            break;
        };
        if execute_and_record(state, step, dice, &mut result) {
            return result;
        }
    }

    // Now the carrier runs for it.
    let carrier = state.player(carrier_id);
    if !carrier.is_on_pitch() || carrier.lost_tacklezones || !carrier.can_act() {
        return result;
    }
    let target = Position::new(end_zone_x(carrier.side), carrier.position.y);
    move_player_toward(state, carrier_id, target, dice, &mut result, 14);
    result
}

fn expand_simple_action(
    state: &mut MatchState,
    kinds: &[ActionKind],
    player_id: i32,
    target_id: i32,
    dice: &mut dyn DiceRoller,
) -> MacroExpansion {
    let mut result = MacroExpansion::default();
    let mut actions = Vec::new();
    available_actions(state, &mut actions);

    for &kind in kinds {
        if let Some(a) = actions
            .iter()
            .find(|a| a.kind == kind && a.player_id == player_id && a.target_id == target_id)
        {
            execute_and_record(state, *a, dice, &mut result);
            return result;
        }
    }
    result
}

/// Expand a macro into primitive actions, executing them on the state
/// as they are produced. Stops on turnover.
pub fn greedy_expand_macro(
    state: &mut MatchState,
    macro_: &Macro,
    dice: &mut dyn DiceRoller,
) -> MacroExpansion {
    match macro_.kind {
        MacroKind::Score => expand_score(state, macro_, dice),
        MacroKind::Advance => expand_advance(state, macro_, dice),
        MacroKind::Cage => expand_cage(state, macro_, dice),
        MacroKind::Blitz => expand_blitz(state, macro_, dice),
        MacroKind::Block => expand_simple_action(
            state,
            &[ActionKind::Block],
            macro_.player_id,
            macro_.target_id,
            dice,
        ),
        MacroKind::Pickup => {
            let mut result = MacroExpansion::default();
            move_player_toward(state, macro_.player_id, macro_.target_pos, dice, &mut result, 8);
            result
        }
        MacroKind::Pass => expand_simple_action(
            state,
            // Hand-off first: shorter odds than a throw.
            &[ActionKind::HandOff, ActionKind::Pass],
            macro_.player_id,
            macro_.target_id,
            dice,
        ),
        MacroKind::Foul => expand_simple_action(
            state,
            &[ActionKind::Foul],
            macro_.player_id,
            macro_.target_id,
            dice,
        ),
        MacroKind::Reposition => {
            let mut result = MacroExpansion::default();
            move_player_toward(state, macro_.player_id, macro_.target_pos, dice, &mut result, 4);
            result
        }
        MacroKind::EndTurn => {
            let mut result = MacroExpansion::default();
            execute_and_record(state, Action::end_turn(), dice, &mut result);
            result
        }
        MacroKind::BlitzAndScore => expand_blitz_and_score(state, macro_, dice),
    }
}

// ---------------------------------------------------------------------
// Macro features (same width as action features, for policy reuse)
// ---------------------------------------------------------------------

pub fn extract_macro_features(state: &MatchState, macro_: &Macro) -> [f32; NUM_ACTION_FEATURES] {
    let mut out = [0.0f32; NUM_ACTION_FEATURES];

    // [0-9] one-hot kind; blitz-and-score shares the blitz slot.
    let slot = match macro_.kind {
        MacroKind::Score => 0,
        MacroKind::Advance => 1,
        MacroKind::Cage => 2,
        MacroKind::Blitz | MacroKind::BlitzAndScore => 3,
        MacroKind::Block => 4,
        MacroKind::Pickup => 5,
        MacroKind::Pass => 6,
        MacroKind::Foul => 7,
        MacroKind::Reposition => 8,
        MacroKind::EndTurn => 9,
    };
    out[slot] = 1.0;

    let my_side = state.active_team;

    // [10] scoring potential.
    match macro_.kind {
        MacroKind::Score | MacroKind::BlitzAndScore => out[10] = 1.0,
        MacroKind::Advance if macro_.player_id > 0 => {
            let p = state.player(macro_.player_id);
            if p.is_on_pitch() {
                let dist = dist_to_end_zone(p.position, my_side).max(1);
                let reach = p.movement_remaining as i32 + 2;
                out[10] = (reach as f32 / dist as f32).min(1.0);
            }
        }
        _ => {}
    }

    // [11] block dice quality.
    if matches!(
        macro_.kind,
        MacroKind::Block | MacroKind::Blitz | MacroKind::BlitzAndScore
    ) {
        if macro_.target_id > 0 && macro_.player_id > 0 {
            let att = state.player(macro_.player_id);
            let def = state.player(macro_.target_id);
            if att.is_on_pitch() && def.is_on_pitch() {
                let is_blitz = macro_.kind == MacroKind::Blitz;
                out[11] = block_dice_count(state, att, def, is_blitz) as f32 / 3.0;
            }
        } else if macro_.kind == MacroKind::Blitz && macro_.target_id > 0 {
            // Blitzer still unchosen: assume middling dice.
            out[11] = 0.3;
        }
    }

    // [12] primary player strength.
    if macro_.player_id > 0 {
        out[12] = state.player(macro_.player_id).stats.strength as f32 / 7.0;
    }

    // [13] rough failure probability.
    out[13] = match macro_.kind {
        MacroKind::EndTurn => 0.0,
        MacroKind::Block => 0.15,
        MacroKind::Blitz => 0.25,
        MacroKind::BlitzAndScore => 0.35,
        MacroKind::Score => {
            if macro_.player_id > 0 {
                let p = state.player(macro_.player_id);
                if p.is_on_pitch() {
                    let dist = dist_to_end_zone(p.position, my_side);
                    let gfis = (dist - p.movement_remaining as i32).max(0);
                    gfis as f32 * 0.17
                } else {
                    0.1
                }
            } else {
                0.1
            }
        }
        MacroKind::Pickup => 0.33,
        MacroKind::Pass => 0.4,
        MacroKind::Foul => 0.08,
        _ => 0.1,
    };

    // [14] positional gain.
    out[14] = match macro_.kind {
        MacroKind::Score | MacroKind::BlitzAndScore => 1.0,
        MacroKind::Advance if macro_.player_id > 0 => {
            let p = state.player(macro_.player_id);
            if p.is_on_pitch() {
                let steps = (p.movement_remaining as i32 / 2).max(1);
                (steps as f32 / 6.0).min(1.0)
            } else {
                0.0
            }
        }
        MacroKind::Cage => 0.5,
        MacroKind::Reposition => 0.3,
        _ => 0.0,
    };

    out
}
