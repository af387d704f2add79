//! Shared rules arithmetic: tacklezone counting, agility-roll targets,
//! block assists and dice tables, the pushback arc, and the unified
//! reroll ladder every dice check runs through.

use super::dice::DiceRoller;
use super::events::{emit, EventKind, GameEvent};
use super::match_state::{MatchState, Weather};
use super::player::{Player, Skill, TeamSide};
use super::position::{compass_index, compass_offset, Position};

/// Number of enemy tacklezones covering a square. `exclude_id` skips one
/// opponent (the player being blocked, for assist counting).
pub fn count_tacklezones(
    state: &MatchState,
    pos: Position,
    friendly_side: TeamSide,
    exclude_id: i32,
) -> i32 {
    let mut count = 0;
    for adj in pos.adjacent() {
        if !adj.is_on_pitch() {
            continue;
        }
        if let Some(p) = state.player_at(adj) {
            if p.side != friendly_side
                && p.id != exclude_id
                && p.state.exerts_tacklezone()
                && !p.lost_tacklezones
            {
                count += 1;
            }
        }
    }
    count
}

/// Enemy Disturbing Presence players within 3 squares.
pub fn count_disturbing_presence(
    state: &MatchState,
    pos: Position,
    friendly_side: TeamSide,
) -> i32 {
    state
        .on_pitch_of(friendly_side.opponent())
        .filter(|p| p.has_skill(Skill::DisturbingPresence) && p.position.distance_to(pos) <= 3)
        .count() as i32
}

fn clamp_target(target: i32) -> i32 {
    target.clamp(2, 6)
}

/// Dodge target for a step out of `source` into `dest`.
///
/// 7 - AG (Break Tackle may substitute ST), plus tacklezones at the
/// destination, minus Dodge (negated by any adjacent Tackle at the
/// source), Stunty, Titchy and Two Heads, plus Prehensile Tail and at
/// most one Diving Tackle at the source. Clamped to 2..=6.
pub fn dodge_target(
    state: &MatchState,
    player: &Player,
    dest: Position,
    source: Position,
) -> i32 {
    let mut ag = player.stats.agility as i32;
    if player.has_skill(Skill::BreakTackle) && (player.stats.strength as i32) > ag {
        ag = player.stats.strength as i32;
    }

    let mut target = 7 - ag;
    target += count_tacklezones(state, dest, player.side, -1);

    if player.has_skill(Skill::Dodge) && !tackle_adjacent(state, source, player.side) {
        target -= 1;
    }
    if player.has_skill(Skill::Stunty) {
        target -= 1;
    }
    if player.has_skill(Skill::Titchy) {
        target -= 1;
    }
    if player.has_skill(Skill::TwoHeads) {
        target -= 1;
    }

    for adj in source.adjacent() {
        if !adj.is_on_pitch() {
            continue;
        }
        if let Some(opp) = state.player_at(adj) {
            if opp.side != player.side
                && opp.state.exerts_tacklezone()
                && !opp.lost_tacklezones
                && opp.has_skill(Skill::PrehensileTail)
            {
                target += 1;
            }
        }
    }

    // Only one Diving Tackle applies per step.
    for adj in source.adjacent() {
        if !adj.is_on_pitch() {
            continue;
        }
        if let Some(opp) = state.player_at(adj) {
            if opp.side != player.side
                && opp.state.exerts_tacklezone()
                && !opp.lost_tacklezones
                && opp.has_skill(Skill::DivingTackle)
            {
                target += 2;
                break;
            }
        }
    }

    clamp_target(target)
}

/// True when any standing opponent with Tackle stands adjacent to `pos`.
pub fn tackle_adjacent(state: &MatchState, pos: Position, friendly_side: TeamSide) -> bool {
    pos.adjacent().iter().any(|adj| {
        adj.is_on_pitch()
            && state.player_at(*adj).is_some_and(|opp| {
                opp.side != friendly_side
                    && opp.state.exerts_tacklezone()
                    && !opp.lost_tacklezones
                    && opp.has_skill(Skill::Tackle)
            })
    })
}

/// Pickup target: 6 - AG, plus tacklezones and rain unless Big Hand,
/// minus Extra Arms. Clamped to 2..=6.
pub fn pickup_target(state: &MatchState, player: &Player) -> i32 {
    let mut target = 6 - player.stats.agility as i32;

    if !player.has_skill(Skill::BigHand) {
        target += count_tacklezones(state, player.position, player.side, -1);
        if state.weather == Weather::PouringRain {
            target += 1;
        }
    }
    if player.has_skill(Skill::ExtraArms) {
        target -= 1;
    }

    clamp_target(target)
}

/// Catch target: 7 - AG - modifier, plus tacklezones unless Nerves of
/// Steel, plus Disturbing Presence and rain, minus Extra Arms and
/// Diving Catch. Clamped to 2..=6.
pub fn catch_target(state: &MatchState, catcher: &Player, modifier: i32) -> i32 {
    let mut target = 7 - catcher.stats.agility as i32 - modifier;

    if !catcher.has_skill(Skill::NervesOfSteel) {
        target += count_tacklezones(state, catcher.position, catcher.side, -1);
    }
    target += count_disturbing_presence(state, catcher.position, catcher.side);

    if catcher.has_skill(Skill::ExtraArms) {
        target -= 1;
    }
    if catcher.has_skill(Skill::DivingCatch) {
        target -= 1;
    }
    if state.weather == Weather::PouringRain {
        target += 1;
    }

    clamp_target(target)
}

/// Offensive/defensive assists adjacent to `target_pos`. A friendly
/// player assists when standing, keeping its tacklezones, and either has
/// Guard or stands in no enemy tacklezone, not counting the one thrown
/// by `tz_exclude_id`, the player being blocked.
pub fn count_assists(
    state: &MatchState,
    target_pos: Position,
    assisting_side: TeamSide,
    exclude_id1: i32,
    exclude_id2: i32,
    tz_exclude_id: i32,
) -> i32 {
    let mut count = 0;
    for adj in target_pos.adjacent() {
        if !adj.is_on_pitch() {
            continue;
        }
        let Some(p) = state.player_at(adj) else {
            continue;
        };
        if p.side != assisting_side || p.id == exclude_id1 || p.id == exclude_id2 {
            continue;
        }
        if !p.state.can_act() || p.lost_tacklezones {
            continue;
        }

        if p.has_skill(Skill::Guard) {
            count += 1;
        } else if count_tacklezones(state, p.position, assisting_side, tz_exclude_id) == 0 {
            count += 1;
        }
    }
    count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDiceInfo {
    pub count: i32,
    pub attacker_chooses: bool,
}

/// Strength ratio to dice count and chooser.
pub fn block_dice_info(att_st: i32, def_st: i32) -> BlockDiceInfo {
    if att_st > 2 * def_st {
        BlockDiceInfo {
            count: 3,
            attacker_chooses: true,
        }
    } else if att_st > def_st {
        BlockDiceInfo {
            count: 2,
            attacker_chooses: true,
        }
    } else if att_st == def_st {
        BlockDiceInfo {
            count: 1,
            attacker_chooses: true,
        }
    } else if def_st > 2 * att_st {
        BlockDiceInfo {
            count: 3,
            attacker_chooses: false,
        }
    } else {
        BlockDiceInfo {
            count: 2,
            attacker_chooses: false,
        }
    }
}

/// The three candidate pushback squares behind the defender: straight
/// on, 45 degrees clockwise and 45 degrees counter-clockwise, filtered
/// to on-pitch. An empty result means the push goes into the crowd.
pub fn pushback_squares(attacker_pos: Position, defender_pos: Position) -> Vec<Position> {
    let mut dx = defender_pos.x - attacker_pos.x;
    let mut dy = defender_pos.y - attacker_pos.y;
    dx = dx.signum();
    dy = dy.signum();

    let idx = compass_index(dx, dy);
    let dirs = [idx, (idx + 1) % 8, (idx + 7) % 8];

    let mut out = Vec::with_capacity(3);
    for d in dirs {
        let (ox, oy) = compass_offset(d);
        let p = defender_pos.offset(ox, oy);
        if p.is_on_pitch() {
            out.push(p);
        }
    }
    out
}

/// The unified roll ladder: base d6 against `target`, then a named skill
/// reroll (unless negated), then Pro on a 4+ (once per turn), then a team
/// reroll gated by Loner on a 4+. Returns plain success; the ladder never
/// fails out-of-band.
pub fn attempt_roll(
    state: &mut MatchState,
    player_id: i32,
    dice: &mut dyn DiceRoller,
    target: i32,
    skill_reroll: Option<Skill>,
    skill_negated: bool,
    team_reroll_allowed: bool,
    mut events: Option<&mut Vec<GameEvent>>,
) -> bool {
    let roll = dice.d6();
    if roll >= target {
        return true;
    }

    // Skill reroll.
    if let Some(skill) = skill_reroll {
        if state.player(player_id).has_skill(skill) && !skill_negated {
            let roll = dice.d6();
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::SkillUsed, player_id, -1)
                    .with_roll(skill as i32, roll >= target),
            );
            if roll >= target {
                return true;
            }
        }
    }

    // Pro reroll.
    if state.player(player_id).has_skill(Skill::Pro)
        && !state.player(player_id).pro_used_this_turn
    {
        state.player_mut(player_id).pro_used_this_turn = true;
        let pro_roll = dice.d6();
        if pro_roll >= 4 {
            let roll = dice.d6();
            emit(
                events.as_deref_mut(),
                GameEvent::new(EventKind::SkillUsed, player_id, -1)
                    .with_roll(Skill::Pro as i32, roll >= target),
            );
            if roll >= target {
                return true;
            }
        }
    }

    // Team reroll.
    if team_reroll_allowed {
        let side = state.player(player_id).side;
        if state.team(side).can_use_reroll() {
            let team = state.team_mut(side);
            team.rerolls -= 1;
            team.reroll_used_this_turn = true;

            if state.player(player_id).has_skill(Skill::Loner) {
                let loner_roll = dice.d6();
                if loner_roll < 4 {
                    return false; // reroll wasted
                }
            }

            let roll = dice.d6();
            if roll >= target {
                return true;
            }
        }
    }

    false
}
