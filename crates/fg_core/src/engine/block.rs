//! Block resolution: strength tallies with assists, the block dice pool,
//! automatic face choice, pushback chains and crowd surfs, follow-ups,
//! and the frenzy / multiple-block wrappers.

use super::ball::BallState;
use super::ball_handling::{handle_ball_on_player_down, resolve_bounce};
use super::dice::{BlockDieFace, DiceRoller};
use super::events::{emit, EventKind, GameEvent};
use super::helpers::{block_dice_info, count_assists, pushback_squares};
use super::injury::{resolve_armour_and_injury, resolve_crowd_surf, InjuryContext};
use super::match_state::MatchState;
use super::player::{Player, PlayerState, Skill};
use super::position::{Position, PITCH_HEIGHT, PITCH_WIDTH};
use super::resolver::ActionOutcome;

#[derive(Debug, Clone, Copy)]
pub struct BlockParams {
    pub attacker_id: i32,
    pub target_id: i32,
    pub is_blitz: bool,
    /// Horns grants +1 ST on a blitz.
    pub horns_bonus: bool,
}

/// Face utility from the attacker's side; the chooser maximises or
/// minimises it depending on who picks.
fn score_face(
    face: BlockDieFace,
    att_has_block: bool,
    def_has_block: bool,
    def_has_dodge: bool,
    att_has_tackle: bool,
) -> i32 {
    match face {
        BlockDieFace::DefenderDown => 10,
        BlockDieFace::DefenderStumbles => {
            if def_has_dodge && !att_has_tackle {
                5
            } else {
                9
            }
        }
        BlockDieFace::Pushed => 5,
        BlockDieFace::BothDown => {
            if att_has_block && !def_has_block {
                8 // only the defender falls
            } else if att_has_block && def_has_block {
                4 // nothing happens
            } else if !att_has_block && def_has_block {
                1 // only the attacker falls
            } else {
                3 // both fall
            }
        }
        BlockDieFace::AttackerDown => 0,
    }
}

pub fn auto_choose_block_die(
    faces: &[BlockDieFace],
    attacker_chooses: bool,
    att: &Player,
    def: &Player,
) -> BlockDieFace {
    let att_block = att.has_skill(Skill::Block);
    let def_block = def.has_skill(Skill::Block);
    let def_dodge = def.has_skill(Skill::Dodge);
    let att_tackle = att.has_skill(Skill::Tackle);

    let mut best = faces[0];
    let mut best_score = score_face(best, att_block, def_block, def_dodge, att_tackle);

    for &face in &faces[1..] {
        let s = score_face(face, att_block, def_block, def_dodge, att_tackle);
        let better = if attacker_chooses {
            s > best_score
        } else {
            s < best_score
        };
        if better {
            best_score = s;
            best = face;
        }
    }
    best
}

fn should_reroll_block(face: BlockDieFace, att: &Player) -> bool {
    match face {
        BlockDieFace::AttackerDown => true,
        BlockDieFace::BothDown => !att.has_skill(Skill::Block),
        _ => false,
    }
}

fn juggernaut_rewrite(face: BlockDieFace, is_blitz: bool, att: &Player) -> BlockDieFace {
    if face == BlockDieFace::BothDown && is_blitz && att.has_skill(Skill::Juggernaut) {
        BlockDieFace::Pushed
    } else {
        face
    }
}

/// Shove the occupant of a push square one cell onward, continuing the
/// chain when the next square is occupied too, and crowd-surfing
/// whoever runs out of pitch. Only players caught in the chain can go
/// into the crowd this way; the primary defender still takes a valid
/// square.
fn chain_push(
    state: &mut MatchState,
    pusher_pos: Position,
    occupant_id: i32,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) {
    let occupant_pos = state.player(occupant_id).position;
    let chain_squares = pushback_squares(pusher_pos, occupant_pos);

    if chain_squares.is_empty() {
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Push, occupant_id, -1)
                .at(occupant_pos, Position::OFF_PITCH)
                .with_roll(0, true),
        );
        handle_ball_on_player_down(state, occupant_id, dice, events.as_deref_mut());
        state.player_mut(occupant_id).position = Position::OFF_PITCH;
        resolve_crowd_surf(state, occupant_id, dice, events);
        return;
    }

    let mut chain_idx = 0;
    for (i, sq) in chain_squares.iter().enumerate() {
        if state.player_id_at(*sq).is_none() {
            chain_idx = i;
            break;
        }
    }
    let chain_dest = chain_squares[chain_idx];

    // Everything occupied: the chain keeps rolling in the same
    // direction. Movement is strictly outward, so this terminates.
    if let Some(next_id) = state.player_id_at(chain_dest) {
        chain_push(state, occupant_pos, next_id, dice, events.as_deref_mut());
    }

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Push, occupant_id, -1)
            .at(occupant_pos, chain_dest)
            .with_roll(0, true),
    );

    if state.ball.is_held && state.ball.carrier_id == occupant_id {
        state.ball.position = chain_dest;
    }
    state.player_mut(occupant_id).position = chain_dest;
}

/// Resolve the push itself. Returns the chosen destination and whether
/// the defender went into the crowd. A chain push moves the occupant of
/// the chosen square in the same direction first; only players caught
/// in the chain can crowd-surf off it.
fn resolve_pushback(
    state: &mut MatchState,
    attacker_id: i32,
    defender_id: i32,
    is_blitz: bool,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> (Position, bool) {
    let attacker = state.player(attacker_id).clone();
    let defender = state.player(defender_id).clone();

    // Stand Firm cancels the push, unless a blitzing Juggernaut overrides.
    if defender.has_skill(Skill::StandFirm)
        && !(is_blitz && attacker.has_skill(Skill::Juggernaut))
    {
        return (defender.position, false);
    }

    let squares = pushback_squares(attacker.position, defender.position);

    if squares.is_empty() {
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Push, defender_id, -1)
                .at(defender.position, Position::OFF_PITCH)
                .with_roll(0, true),
        );
        return (Position::OFF_PITCH, true);
    }

    let mut chosen_idx = 0;
    if defender.has_skill(Skill::SideStep)
        && !(attacker.has_skill(Skill::Grab) && !is_blitz)
    {
        // Side Step: defender picks the square furthest from the attacker.
        let mut best_dist = -1;
        for (i, sq) in squares.iter().enumerate() {
            let d = sq.distance_to(attacker.position);
            if d > best_dist {
                best_dist = d;
                chosen_idx = i;
            }
        }
    } else if attacker.has_skill(Skill::Grab) && !is_blitz {
        // Grab (non-blitz only): attacker steers toward the sidelines.
        let mut best = -1;
        for (i, sq) in squares.iter().enumerate() {
            let edge_dist = (sq.x as i32)
                .min(PITCH_WIDTH as i32 - 1 - sq.x as i32)
                .min(sq.y as i32)
                .min(PITCH_HEIGHT as i32 - 1 - sq.y as i32);
            let score = 100 - edge_dist;
            if score > best {
                best = score;
                chosen_idx = i;
            }
        }
    } else {
        // Default: first empty square, else the straight push.
        for (i, sq) in squares.iter().enumerate() {
            if state.player_id_at(*sq).is_none() {
                chosen_idx = i;
                break;
            }
        }
    }

    let push_dest = squares[chosen_idx];

    // Chain push into an occupied square.
    if let Some(occupant_id) = state.player_id_at(push_dest) {
        chain_push(state, defender.position, occupant_id, dice, events.as_deref_mut());
    }

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Push, defender_id, -1)
            .at(defender.position, push_dest)
            .with_roll(0, true),
    );

    state.player_mut(defender_id).position = push_dest;
    if state.ball.is_held && state.ball.carrier_id == defender_id {
        state.ball.position = push_dest;
    }

    (push_dest, false)
}

pub fn resolve_block(
    state: &mut MatchState,
    params: &BlockParams,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
    frenzy_second_block: bool,
    no_follow_up: bool,
) -> ActionOutcome {
    let att_id = params.attacker_id;
    let def_id = params.target_id;
    let def_old_pos = state.player(def_id).position;

    // Foul Appearance may waste the action outright.
    if state.player(def_id).has_skill(Skill::FoulAppearance) {
        let fa_roll = dice.d6();
        if fa_roll == 1 {
            state.player_mut(att_id).has_acted = true;
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::SkillUsed, def_id, att_id)
                    .with_roll(Skill::FoulAppearance as i32, true),
            );
            return ActionOutcome::fail();
        }
    }

    // Chainsaw: no block dice, just armour with kickback risk.
    if state.player(att_id).has_skill(Skill::Chainsaw) {
        let att_pos = state.player(att_id).position;
        let def_pos = state.player(def_id).position;
        let chainsaw_roll = dice.d6();
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Block, att_id, def_id)
                .at(att_pos, def_pos)
                .with_roll(chainsaw_roll, chainsaw_roll >= 2),
        );

        if chainsaw_roll == 1 {
            state.player_mut(att_id).state = PlayerState::Prone;
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::KnockedDown, att_id, -1).at(att_pos, Position::OFF_PITCH),
            );
            let ctx = InjuryContext::default();
            resolve_armour_and_injury(state, att_id, dice, &ctx, events.as_deref_mut());
            handle_ball_on_player_down(state, att_id, dice, events);
            state.player_mut(att_id).has_acted = true;
            return ActionOutcome::turnover();
        }
        let ctx = InjuryContext::default();
        resolve_armour_and_injury(state, def_id, dice, &ctx, events.as_deref_mut());
        handle_ball_on_player_down(state, def_id, dice, events);
        state.player_mut(att_id).has_acted = true;
        return ActionOutcome::ok();
    }

    // Stab: straight to armour, never a turnover.
    if state.player(att_id).has_skill(Skill::Stab) {
        let att_pos = state.player(att_id).position;
        let def_pos = state.player(def_id).position;
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::Block, att_id, def_id)
                .at(att_pos, def_pos)
                .with_roll(0, true),
        );
        let ctx = InjuryContext {
            has_stakes: state.player(att_id).has_skill(Skill::Stakes),
            ..InjuryContext::default()
        };
        resolve_armour_and_injury(state, def_id, dice, &ctx, events.as_deref_mut());
        handle_ball_on_player_down(state, def_id, dice, events);
        state.player_mut(att_id).has_acted = true;
        return ActionOutcome::ok();
    }

    // Strength tallies.
    let att = state.player(att_id).clone();
    let def = state.player(def_id).clone();

    let mut att_st = att.stats.strength as i32;
    let def_st = def.stats.strength as i32;
    if params.horns_bonus && att.has_skill(Skill::Horns) {
        att_st += 1;
    }

    let att_assists = count_assists(state, def.position, att.side, att_id, def_id, def_id);
    let def_assists = count_assists(state, att.position, def.side, att_id, def_id, att_id);

    let mut eff_att_st = att_st + att_assists;
    let eff_def_st = def_st + def_assists;

    // Dauntless: equalize on a successful d6 + ST > defender ST.
    if att.has_skill(Skill::Dauntless) && eff_def_st > eff_att_st {
        let dauntless_roll = dice.d6();
        let success = dauntless_roll + att.stats.strength as i32 > def.stats.strength as i32;
        if success {
            eff_att_st = eff_def_st;
        }
        emit(
            events.as_deref_mut(),
            GameEvent::new(EventKind::SkillUsed, att_id, -1)
                .with_roll(Skill::Dauntless as i32, success),
        );
    }

    let dice_info = block_dice_info(eff_att_st, eff_def_st);

    let mut faces: Vec<BlockDieFace> = (0..dice_info.count).map(|_| dice.block_die()).collect();
    let mut chosen = auto_choose_block_die(&faces, dice_info.attacker_chooses, &att, &def);
    chosen = juggernaut_rewrite(chosen, params.is_blitz, &att);

    // A bad pool may be rerolled once, whole: Pro first, then a team
    // reroll behind the Loner gate.
    if should_reroll_block(chosen, &att) {
        let mut rerolled = false;

        if att.has_skill(Skill::Pro) && !state.player(att_id).pro_used_this_turn {
            state.player_mut(att_id).pro_used_this_turn = true;
            let pro_roll = dice.d6();
            if pro_roll >= 4 {
                for face in faces.iter_mut() {
                    *face = dice.block_die();
                }
                chosen = auto_choose_block_die(&faces, dice_info.attacker_chooses, &att, &def);
                chosen = juggernaut_rewrite(chosen, params.is_blitz, &att);
                rerolled = true;
            }
        }

        if !rerolled && should_reroll_block(chosen, &att) && state.team(att.side).can_use_reroll()
        {
            let team = state.team_mut(att.side);
            team.rerolls -= 1;
            team.reroll_used_this_turn = true;

            let mut can_reroll = true;
            if att.has_skill(Skill::Loner) {
                let loner_roll = dice.d6();
                if loner_roll < 4 {
                    can_reroll = false;
                }
            }

            if can_reroll {
                for face in faces.iter_mut() {
                    *face = dice.block_die();
                }
                chosen = auto_choose_block_die(&faces, dice_info.attacker_chooses, &att, &def);
                chosen = juggernaut_rewrite(chosen, params.is_blitz, &att);
            }
        }
    }

    emit(
        events.as_deref_mut(),
        GameEvent::new(EventKind::Block, att_id, def_id)
            .at(att.position, def.position)
            .with_roll(chosen as i32, true),
    );

    // Apply the chosen face.
    let mut def_pushed = false;
    let mut def_knocked_down = false;
    let mut att_knocked_down = false;
    let mut turnover = false;

    match chosen {
        BlockDieFace::AttackerDown => {
            state.player_mut(att_id).state = PlayerState::Prone;
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::KnockedDown, att_id, -1)
                    .at(att.position, Position::OFF_PITCH),
            );
            let ctx = InjuryContext::default();
            resolve_armour_and_injury(state, att_id, dice, &ctx, events.as_deref_mut());
            handle_ball_on_player_down(state, att_id, dice, events);
            state.player_mut(att_id).has_acted = true;
            return ActionOutcome::turnover();
        }

        BlockDieFace::BothDown => {
            let def_wrestle = def.has_skill(Skill::Wrestle);
            let att_wrestle = att.has_skill(Skill::Wrestle) && !att.has_skill(Skill::Block);

            if def_wrestle || att_wrestle {
                // Wrestle: both prone, no armour, no turnover.
                state.player_mut(att_id).state = PlayerState::Prone;
                state.player_mut(def_id).state = PlayerState::Prone;
                emit(
                    events.as_deref_mut(),
                    GameEvent::new(
                        EventKind::SkillUsed,
                        if def_wrestle { def_id } else { att_id },
                        -1,
                    )
                    .with_roll(Skill::Wrestle as i32, true),
                );
                handle_ball_on_player_down(state, att_id, dice, events.as_deref_mut());
                handle_ball_on_player_down(state, def_id, dice, events);
                state.player_mut(att_id).has_acted = true;
                return ActionOutcome::ok();
            }

            let att_falls = !att.has_skill(Skill::Block);
            let def_falls = !def.has_skill(Skill::Block);

            if att_falls {
                state.player_mut(att_id).state = PlayerState::Prone;
                att_knocked_down = true;
                turnover = true;
                emit(
                    events.as_deref_mut(),
                    GameEvent::new(EventKind::KnockedDown, att_id, -1)
                        .at(att.position, Position::OFF_PITCH),
                );
            }
            if def_falls {
                def_knocked_down = true;
                def_pushed = true;
            }

            if !def_pushed {
                // Defender kept its feet; settle the attacker and stop.
                if att_knocked_down {
                    let ctx = InjuryContext::default();
                    resolve_armour_and_injury(state, att_id, dice, &ctx, events.as_deref_mut());
                    handle_ball_on_player_down(state, att_id, dice, events);
                }
                state.player_mut(att_id).has_acted = true;
                return if turnover {
                    ActionOutcome::turnover()
                } else {
                    ActionOutcome::ok()
                };
            }
        }

        BlockDieFace::Pushed => {
            def_pushed = true;
        }

        BlockDieFace::DefenderStumbles => {
            // Dodge converts the knockdown to a push, unless Tackle.
            def_pushed = true;
            if !(def.has_skill(Skill::Dodge) && !att.has_skill(Skill::Tackle)) {
                def_knocked_down = true;
            }
        }

        BlockDieFace::DefenderDown => {
            def_pushed = true;
            def_knocked_down = true;
        }
    }

    if def_pushed {
        let (_, crowd_surf) =
            resolve_pushback(state, att_id, def_id, params.is_blitz, dice, events.as_deref_mut());

        if crowd_surf {
            handle_ball_on_player_down(state, def_id, dice, events.as_deref_mut());
            state.player_mut(def_id).position = Position::OFF_PITCH;
            resolve_crowd_surf(state, def_id, dice, events.as_deref_mut());

            if !no_follow_up {
                state.player_mut(att_id).position = def_old_pos;
                if state.ball.is_held && state.ball.carrier_id == att_id {
                    state.ball.position = def_old_pos;
                }
            }
            state.player_mut(att_id).has_acted = true;

            if att_knocked_down {
                let ctx = InjuryContext::default();
                resolve_armour_and_injury(state, att_id, dice, &ctx, events.as_deref_mut());
                handle_ball_on_player_down(state, att_id, dice, events);
            }
            return if turnover {
                ActionOutcome::turnover()
            } else {
                ActionOutcome::ok()
            };
        }

        // Strip Ball: a pushed, still-standing carrier drops the ball.
        if !def_knocked_down
            && state.ball.is_held
            && state.ball.carrier_id == def_id
            && att.has_skill(Skill::StripBall)
        {
            let drop_pos = state.player(def_id).position;
            state.ball = BallState::on_ground(drop_pos);
            resolve_bounce(state, drop_pos, dice, 0, events.as_deref_mut());
        }

        let fend_prevents = def.has_skill(Skill::Fend) && !def_knocked_down;
        if !no_follow_up && !fend_prevents {
            state.player_mut(att_id).position = def_old_pos;
            if state.ball.is_held && state.ball.carrier_id == att_id {
                state.ball.position = def_old_pos;
            }
        }

        if def_knocked_down {
            state.player_mut(def_id).state = PlayerState::Prone;
            let def_pos = state.player(def_id).position;
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::KnockedDown, def_id, -1)
                    .at(def_pos, Position::OFF_PITCH),
            );

            let mut ctx = InjuryContext::default();
            if att.has_skill(Skill::MightyBlow) {
                ctx.armour_modifier += 1;
                ctx.injury_modifier += 1;
            }
            ctx.has_claw = att.has_skill(Skill::Claw);
            ctx.has_stakes = att.has_skill(Skill::Stakes);
            ctx.has_decay = def.has_skill(Skill::Decay);

            resolve_armour_and_injury(state, def_id, dice, &ctx, events.as_deref_mut());
            handle_ball_on_player_down(state, def_id, dice, events.as_deref_mut());
        }
    }

    if att_knocked_down {
        let ctx = InjuryContext::default();
        resolve_armour_and_injury(state, att_id, dice, &ctx, events.as_deref_mut());
        handle_ball_on_player_down(state, att_id, dice, events.as_deref_mut());
    }

    state.player_mut(att_id).has_acted = true;

    // Frenzy: a second block is mandatory while both stand adjacent.
    if !frenzy_second_block
        && att.has_skill(Skill::Frenzy)
        && state.player(att_id).state.can_act()
        && state.player(def_id).state.can_act()
        && state
            .player(att_id)
            .position
            .distance_to(state.player(def_id).position)
            == 1
    {
        let second = BlockParams {
            horns_bonus: false,
            ..*params
        };
        state.player_mut(att_id).has_acted = false;
        return resolve_block(state, &second, dice, events, true, no_follow_up);
    }

    if turnover {
        ActionOutcome::turnover()
    } else {
        ActionOutcome::ok()
    }
}

/// Two simultaneous blocks against adjacent defenders, each at +2 ST and
/// without follow-up. The second defender's id travels in the action's
/// `target.x` field.
pub fn resolve_multiple_block(
    state: &mut MatchState,
    attacker_id: i32,
    target1_id: i32,
    target2_id: i32,
    dice: &mut dyn DiceRoller,
    mut events: Option<&mut Vec<GameEvent>>,
) -> ActionOutcome {
    let mut skip_first = false;

    // Foul Appearance is checked per defender.
    if state.player(target1_id).has_skill(Skill::FoulAppearance) {
        let fa_roll = dice.d6();
        if fa_roll == 1 {
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::SkillUsed, target1_id, attacker_id)
                    .with_roll(Skill::FoulAppearance as i32, true),
            );
            skip_first = true;
        }
    }

    if !skip_first {
        let orig_st = state.player(target1_id).stats.strength;
        state.player_mut(target1_id).stats.strength = orig_st + 2;

        let params = BlockParams {
            attacker_id,
            target_id: target1_id,
            is_blitz: false,
            horns_bonus: false,
        };
        let outcome = resolve_block(state, &params, dice, events.as_deref_mut(), false, true);

        state.player_mut(target1_id).stats.strength = orig_st;

        if outcome.turnover || state.player(attacker_id).state != PlayerState::Standing {
            return ActionOutcome::turnover();
        }
    }

    // The attacker strikes both in one action.
    state.player_mut(attacker_id).has_acted = false;

    if state.player(target2_id).has_skill(Skill::FoulAppearance) {
        let fa_roll = dice.d6();
        if fa_roll == 1 {
            state.player_mut(attacker_id).has_acted = true;
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::SkillUsed, target2_id, attacker_id)
                    .with_roll(Skill::FoulAppearance as i32, true),
            );
            return ActionOutcome::ok();
        }
    }

    let orig_st = state.player(target2_id).stats.strength;
    state.player_mut(target2_id).stats.strength = orig_st + 2;

    let params = BlockParams {
        attacker_id,
        target_id: target2_id,
        is_blitz: false,
        horns_bonus: false,
    };
    let outcome = resolve_block(state, &params, dice, events, false, true);

    state.player_mut(target2_id).stats.strength = orig_st;

    outcome
}
