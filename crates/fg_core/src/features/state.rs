//! 70-float state vector, always from one side's perspective.
//!
//! ## Layout
//! ```text
//! [0]     score diff (/6, clamped)       [1-2]   my / opp score (/4)
//! [3]     match progress (/16 turns)     [4-5]   standing counts (/11)
//! [6-7]   KO counts                      [8-9]   casualty counts
//! [10-11] reroll pools (/4)              [12-14] possession (mine/theirs/loose)
//! [15]    carrier distance to score      [16]    ball in my half
//! [17-18] average x positions            [19-20] average strength
//! [21]    cage count around my carrier   [22]    receiving this drive
//! [23]    my turn                        [24-26] weather one-hots
//! [27-28] blitz / pass still available   [29]    bias (1.0)
//! [30-31] sideline fractions             [32]    turns remaining (/8)
//! [33]    score advantage with ball      [34]    carrier near end zone
//! [35]    stall incentive                [36-37] average armour
//! [38-39] average agility                [40]    zones on my carrier
//! [41-42] scoring threats (mine/theirs)  [43-44] engaged fractions
//! [45-46] prone+stunned counts           [47]    free players
//! [48-51] block / dodge skill fractions  [52-55] guard/mighty blow/claw/regen
//! [56-58] cage diagonals (mine/risk/opp) [59]    carrier can score
//! [60]    pass scoring threats           [61]    frenzy trap risk
//! [62]    screen between ball and goal   [63]    carrier blitzable
//! [64]    surfable opponents             [65]    favourable blocks
//! [66]    one-turn-score vulnerability   [67]    loose ball proximity
//! [68]    deep safeties                  [69]    isolated players
//! ```

use crate::engine::helpers::{block_dice_info, count_assists, count_tacklezones};
use crate::engine::match_state::{MatchState, Weather};
use crate::engine::player::{PlayerState, Skill, TeamSide};
use crate::engine::position::Position;

pub const NUM_STATE_FEATURES: usize = 70;

fn clampf(v: f32, lo: f32, hi: f32) -> f32 {
    v.max(lo).min(hi)
}

/// X with 0 at my own end zone and 25 at the one I score in.
fn normalize_x(x: i8, perspective: TeamSide) -> f32 {
    match perspective {
        TeamSide::Home => x as f32,
        TeamSide::Away => (25 - x) as f32,
    }
}

fn distance_to_end_zone(x: i8, perspective: TeamSide) -> i32 {
    match perspective {
        TeamSide::Home => (25 - x) as i32,
        TeamSide::Away => x as i32,
    }
}

fn in_my_half(x: i8, perspective: TeamSide) -> bool {
    match perspective {
        TeamSide::Home => x <= 12,
        TeamSide::Away => x >= 13,
    }
}

#[derive(Clone, Copy)]
struct StandingInfo {
    pos: Position,
    id: i32,
    ma: i32,
    st: i32,
    has_frenzy: bool,
}

pub fn extract_state_features(
    state: &MatchState,
    perspective: TeamSide,
) -> [f32; NUM_STATE_FEATURES] {
    let mut out = [0.0f32; NUM_STATE_FEATURES];
    let opp = perspective.opponent();

    let my_team = state.team(perspective);
    let opp_team = state.team(opp);

    let mut my_standing = 0;
    let mut opp_standing = 0;
    let mut my_ko = 0;
    let mut opp_ko = 0;
    let mut my_injured = 0;
    let mut opp_injured = 0;
    let mut my_prone_stunned = 0;
    let mut opp_prone_stunned = 0;

    let mut my_x_sum = 0.0;
    let mut opp_x_sum = 0.0;
    let mut my_st_sum = 0.0;
    let mut opp_st_sum = 0.0;
    let mut my_av_sum = 0.0;
    let mut opp_av_sum = 0.0;
    let mut my_ag_sum = 0.0;
    let mut opp_ag_sum = 0.0;

    let mut my_sideline = 0;
    let mut opp_sideline = 0;

    let mut my_block = 0;
    let mut opp_block = 0;
    let mut my_dodge = 0;
    let mut opp_dodge = 0;
    let mut my_guard = 0;
    let mut my_mighty_blow = 0;
    let mut my_claw = 0;
    let mut my_regen = 0;
    let mut my_total = 0;

    let mut my_engaged = 0;
    let mut opp_engaged = 0;

    let mut my_players: Vec<StandingInfo> = Vec::with_capacity(11);
    let mut opp_players: Vec<StandingInfo> = Vec::with_capacity(11);

    for p in state.players_of(perspective) {
        my_total += 1;
        match p.state {
            PlayerState::Standing => {
                my_standing += 1;
                my_x_sum += normalize_x(p.position.x, perspective);
                my_st_sum += p.stats.strength as f32;
                my_av_sum += p.stats.armour as f32;
                my_ag_sum += p.stats.agility as f32;
                if p.position.y == 0 || p.position.y == 14 {
                    my_sideline += 1;
                }
                if p.has_skill(Skill::Block) {
                    my_block += 1;
                }
                if p.has_skill(Skill::Dodge) {
                    my_dodge += 1;
                }
                if p.has_skill(Skill::Guard) {
                    my_guard += 1;
                }
                if p.has_skill(Skill::MightyBlow) {
                    my_mighty_blow += 1;
                }
                if p.has_skill(Skill::Claw) {
                    my_claw += 1;
                }
                if count_tacklezones(state, p.position, perspective, -1) > 0 {
                    my_engaged += 1;
                }
                my_players.push(StandingInfo {
                    pos: p.position,
                    id: p.id,
                    ma: p.stats.movement as i32,
                    st: p.stats.strength as i32,
                    has_frenzy: p.has_skill(Skill::Frenzy),
                });
            }
            PlayerState::Ko => my_ko += 1,
            PlayerState::Injured | PlayerState::Dead => my_injured += 1,
            _ => {}
        }
        if matches!(p.state, PlayerState::Prone | PlayerState::Stunned) {
            my_prone_stunned += 1;
        }
        if p.has_skill(Skill::Regeneration) {
            my_regen += 1;
        }
    }

    for p in state.players_of(opp) {
        match p.state {
            PlayerState::Standing => {
                opp_standing += 1;
                opp_x_sum += normalize_x(p.position.x, perspective);
                opp_st_sum += p.stats.strength as f32;
                opp_av_sum += p.stats.armour as f32;
                opp_ag_sum += p.stats.agility as f32;
                if p.position.y == 0 || p.position.y == 14 {
                    opp_sideline += 1;
                }
                if p.has_skill(Skill::Block) {
                    opp_block += 1;
                }
                if p.has_skill(Skill::Dodge) {
                    opp_dodge += 1;
                }
                if count_tacklezones(state, p.position, opp, -1) > 0 {
                    opp_engaged += 1;
                }
                opp_players.push(StandingInfo {
                    pos: p.position,
                    id: p.id,
                    ma: p.stats.movement as i32,
                    st: p.stats.strength as i32,
                    has_frenzy: p.has_skill(Skill::Frenzy),
                });
            }
            PlayerState::Ko => opp_ko += 1,
            PlayerState::Injured | PlayerState::Dead => opp_injured += 1,
            _ => {}
        }
        if matches!(p.state, PlayerState::Prone | PlayerState::Stunned) {
            opp_prone_stunned += 1;
        }
    }

    // Ball situation.
    let mut i_have_ball = false;
    let mut opp_has_ball = false;
    let mut ball_on_ground = false;
    let mut carrier_dist_td = 13;
    let mut carrier_tz = 0;
    let mut scoring_threat = false;
    let mut opp_scoring_threat = false;
    let mut carrier_pos = Position::OFF_PITCH;
    let mut opp_carrier_pos = Position::OFF_PITCH;
    let mut carrier_ma = 0;

    if state.ball.is_held && state.ball.carrier_id > 0 {
        let carrier = state.player(state.ball.carrier_id);
        if carrier.side == perspective {
            i_have_ball = true;
            if carrier.state == PlayerState::Standing {
                carrier_dist_td = distance_to_end_zone(carrier.position.x, perspective);
                carrier_tz = count_tacklezones(state, carrier.position, perspective, -1);
                scoring_threat = carrier.stats.movement as i32 >= carrier_dist_td;
                carrier_pos = carrier.position;
                carrier_ma = carrier.stats.movement as i32;
            }
        } else {
            opp_has_ball = true;
            if carrier.state == PlayerState::Standing {
                let opp_dist = distance_to_end_zone(carrier.position.x, opp);
                opp_scoring_threat = carrier.stats.movement as i32 >= opp_dist;
                opp_carrier_pos = carrier.position;
            }
        }
    } else {
        ball_on_ground = true;
    }

    let ball_in_my_half = state.ball.is_on_pitch() && in_my_half(state.ball.position.x, perspective);
    let is_receiving = state.kicking_team != perspective;
    let is_my_turn = state.active_team == perspective;
    let turns_remaining = (9 - my_team.turn_number).max(0);

    let score_diff = my_team.score - opp_team.score;
    let mut score_adv_with_ball = 0.0;
    if score_diff >= 0 && i_have_ball {
        score_adv_with_ball = clampf((score_diff + 1) as f32 / 4.0, 0.0, 1.0);
    }

    let carrier_near_end_zone = i_have_ball && carrier_dist_td <= 3;

    // Holding the ball while ahead with turns in hand is worth
    // something on its own.
    let mut stall_incentive = 0.0;
    if i_have_ball && turns_remaining > 2 {
        stall_incentive = turns_remaining as f32 / 8.0;
        if score_adv_with_ball > 0.0 {
            stall_incentive *= 1.5;
        }
    }

    let mut cage_count = 0;
    if i_have_ball && carrier_pos.is_on_pitch() {
        for adj in carrier_pos.adjacent() {
            if !adj.is_on_pitch() {
                continue;
            }
            if let Some(p) = state.player_at(adj) {
                if p.side == perspective && p.state == PlayerState::Standing {
                    cage_count += 1;
                }
            }
        }
    }

    let diagonal_corners = |center: Position| {
        [
            center.offset(-1, -1),
            center.offset(1, -1),
            center.offset(-1, 1),
            center.offset(1, 1),
        ]
    };

    let mut cage_diagonal = 0;
    if i_have_ball && carrier_pos.is_on_pitch() {
        for d in diagonal_corners(carrier_pos) {
            if !d.is_on_pitch() {
                continue;
            }
            if let Some(p) = state.player_at(d) {
                if p.side == perspective && p.state == PlayerState::Standing {
                    cage_diagonal += 1;
                }
            }
        }
    }

    let cage_overload_risk = if i_have_ball && carrier_pos.is_on_pitch() {
        clampf((cage_count - 4) as f32 / 4.0, 0.0, 1.0)
    } else {
        0.0
    };

    let mut opp_cage_diagonal = 0;
    if opp_has_ball && opp_carrier_pos.is_on_pitch() {
        for d in diagonal_corners(opp_carrier_pos) {
            if !d.is_on_pitch() {
                continue;
            }
            if let Some(p) = state.player_at(d) {
                if p.side == opp && p.state == PlayerState::Standing {
                    opp_cage_diagonal += 1;
                }
            }
        }
    }

    let carrier_can_score =
        i_have_ball && carrier_pos.is_on_pitch() && carrier_ma + 2 >= carrier_dist_td;

    // Teammates in throwing range who could walk it in after a catch.
    let mut pass_threats = 0;
    if i_have_ball && carrier_pos.is_on_pitch() {
        for mp in &my_players {
            if mp.pos == carrier_pos {
                continue;
            }
            if mp.pos.distance_to(carrier_pos) <= 10 {
                let dist_td = distance_to_end_zone(mp.pos.x, perspective);
                if mp.ma + 2 >= dist_td {
                    pass_threats += 1;
                }
            }
        }
    }

    // Frenzy players facing two or more opponents can be baited into a
    // bad follow-up.
    let mut frenzy_traps = 0;
    let mut my_frenzy_count = 0;
    for mp in &my_players {
        if !mp.has_frenzy {
            continue;
        }
        my_frenzy_count += 1;
        let adj_opp = opp_players
            .iter()
            .filter(|op| mp.pos.distance_to(op.pos) == 1)
            .count();
        if adj_opp >= 2 {
            frenzy_traps += 1;
        }
    }

    let mut screen_count = 0;
    if opp_has_ball && opp_carrier_pos.is_on_pitch() {
        for mp in &my_players {
            let behind = match perspective {
                TeamSide::Home => mp.pos.x < opp_carrier_pos.x,
                TeamSide::Away => mp.pos.x > opp_carrier_pos.x,
            };
            if behind {
                screen_count += 1;
            }
        }
    }

    let mut carrier_blitzable = false;
    if i_have_ball && carrier_pos.is_on_pitch() {
        carrier_blitzable = opp_players
            .iter()
            .any(|op| op.pos.distance_to(carrier_pos) <= op.ma);
    }

    let mut surfable_opps = 0;
    for op in &opp_players {
        if op.pos.y != 0 && op.pos.y != 14 {
            continue;
        }
        if my_players
            .iter()
            .any(|mp| mp.pos.distance_to(op.pos) <= mp.ma)
        {
            surfable_opps += 1;
        }
    }

    let mut favorable_blocks = 0;
    for mp in &my_players {
        for op in &opp_players {
            if mp.pos.distance_to(op.pos) != 1 {
                continue;
            }
            let my_assists = count_assists(state, op.pos, perspective, mp.id, op.id, op.id);
            let opp_assists = count_assists(state, mp.pos, opp, op.id, mp.id, mp.id);
            let info = block_dice_info(mp.st + my_assists, op.st + opp_assists);
            if info.count >= 2 && info.attacker_chooses {
                favorable_blocks += 1;
                break;
            }
        }
    }

    let mut one_turn_td_vuln = false;
    for op in &opp_players {
        let dist = distance_to_end_zone(op.pos.x, opp);
        if op.ma + 2 >= dist && count_tacklezones(state, op.pos, opp, -1) == 0 {
            one_turn_td_vuln = true;
            break;
        }
    }

    let mut loose_ball_prox = 0.5;
    if ball_on_ground && state.ball.is_on_pitch() {
        let ball_pos = state.ball.position;
        let my_closest = my_players
            .iter()
            .map(|p| p.pos.distance_to(ball_pos))
            .min()
            .unwrap_or(99);
        let opp_closest = opp_players
            .iter()
            .map(|p| p.pos.distance_to(ball_pos))
            .min()
            .unwrap_or(99);
        loose_ball_prox = clampf((opp_closest - my_closest + 5) as f32 / 10.0, 0.0, 1.0);
    }

    let mut deep_safeties = 0;
    let my_ez_dist = |pos: Position| match perspective {
        TeamSide::Home => pos.x as i32,
        TeamSide::Away => 25 - pos.x as i32,
    };
    if let Some(deepest) = opp_players.iter().map(|p| my_ez_dist(p.pos)).min() {
        deep_safeties = my_players
            .iter()
            .filter(|p| my_ez_dist(p.pos) < deepest)
            .count();
    }

    let mut isolated_count = 0;
    for (i, mp) in my_players.iter().enumerate() {
        let has_nearby = my_players
            .iter()
            .enumerate()
            .any(|(k, other)| k != i && mp.pos.distance_to(other.pos) <= 3);
        if !has_nearby {
            isolated_count += 1;
        }
    }

    out[0] = clampf((my_team.score - opp_team.score) as f32 / 6.0, -1.0, 1.0);
    out[1] = (my_team.score as f32 / 4.0).min(1.0);
    out[2] = (opp_team.score as f32 / 4.0).min(1.0);
    out[3] = ((my_team.turn_number + (state.half - 1) * 8) as f32 / 16.0).min(1.0);
    out[4] = my_standing as f32 / 11.0;
    out[5] = opp_standing as f32 / 11.0;
    out[6] = my_ko as f32 / 11.0;
    out[7] = opp_ko as f32 / 11.0;
    out[8] = my_injured as f32 / 11.0;
    out[9] = opp_injured as f32 / 11.0;
    out[10] = (my_team.rerolls as f32 / 4.0).min(1.0);
    out[11] = (opp_team.rerolls as f32 / 4.0).min(1.0);
    out[12] = if i_have_ball { 1.0 } else { 0.0 };
    out[13] = if opp_has_ball { 1.0 } else { 0.0 };
    out[14] = if ball_on_ground { 1.0 } else { 0.0 };
    out[15] = if i_have_ball {
        carrier_dist_td as f32 / 26.0
    } else {
        0.5
    };
    out[16] = if ball_in_my_half { 1.0 } else { 0.0 };
    out[17] = if my_standing > 0 {
        (my_x_sum / my_standing as f32) / 26.0
    } else {
        0.5
    };
    out[18] = if opp_standing > 0 {
        (opp_x_sum / opp_standing as f32) / 26.0
    } else {
        0.5
    };
    out[19] = if my_standing > 0 {
        (my_st_sum / my_standing as f32) / 5.0
    } else {
        0.0
    };
    out[20] = if opp_standing > 0 {
        (opp_st_sum / opp_standing as f32) / 5.0
    } else {
        0.0
    };
    out[21] = (cage_count as f32 / 4.0).min(1.0);
    out[22] = if is_receiving { 1.0 } else { 0.0 };
    out[23] = if is_my_turn { 1.0 } else { 0.0 };
    out[24] = if state.weather == Weather::Nice { 1.0 } else { 0.0 };
    out[25] = if state.weather == Weather::PouringRain {
        1.0
    } else {
        0.0
    };
    out[26] = if state.weather == Weather::Blizzard {
        1.0
    } else {
        0.0
    };
    out[27] = if !my_team.blitz_used_this_turn { 1.0 } else { 0.0 };
    out[28] = if !my_team.pass_used_this_turn { 1.0 } else { 0.0 };
    out[29] = 1.0;
    out[30] = if my_standing > 0 {
        my_sideline as f32 / my_standing as f32
    } else {
        0.0
    };
    out[31] = if opp_standing > 0 {
        opp_sideline as f32 / opp_standing as f32
    } else {
        0.0
    };
    out[32] = turns_remaining as f32 / 8.0;
    out[33] = score_adv_with_ball;
    out[34] = if carrier_near_end_zone { 1.0 } else { 0.0 };
    out[35] = stall_incentive;
    out[36] = if my_standing > 0 {
        (my_av_sum / my_standing as f32) / 10.0
    } else {
        0.0
    };
    out[37] = if opp_standing > 0 {
        (opp_av_sum / opp_standing as f32) / 10.0
    } else {
        0.0
    };
    out[38] = if my_standing > 0 {
        (my_ag_sum / my_standing as f32) / 5.0
    } else {
        0.0
    };
    out[39] = if opp_standing > 0 {
        (opp_ag_sum / opp_standing as f32) / 5.0
    } else {
        0.0
    };
    out[40] = if i_have_ball {
        (carrier_tz as f32 / 4.0).min(1.0)
    } else {
        0.0
    };
    out[41] = if scoring_threat { 1.0 } else { 0.0 };
    out[42] = if opp_scoring_threat { 1.0 } else { 0.0 };
    out[43] = if my_standing > 0 {
        my_engaged as f32 / my_standing as f32
    } else {
        0.0
    };
    out[44] = if opp_standing > 0 {
        opp_engaged as f32 / opp_standing as f32
    } else {
        0.0
    };
    out[45] = my_prone_stunned as f32 / 11.0;
    out[46] = opp_prone_stunned as f32 / 11.0;
    out[47] = (my_standing - my_engaged) as f32 / 11.0;
    out[48] = if my_standing > 0 {
        my_block as f32 / my_standing as f32
    } else {
        0.0
    };
    out[49] = if opp_standing > 0 {
        opp_block as f32 / opp_standing as f32
    } else {
        0.0
    };
    out[50] = if my_standing > 0 {
        my_dodge as f32 / my_standing as f32
    } else {
        0.0
    };
    out[51] = if opp_standing > 0 {
        opp_dodge as f32 / opp_standing as f32
    } else {
        0.0
    };
    out[52] = if my_standing > 0 {
        my_guard as f32 / my_standing as f32
    } else {
        0.0
    };
    out[53] = if my_standing > 0 {
        my_mighty_blow as f32 / my_standing as f32
    } else {
        0.0
    };
    out[54] = if my_standing > 0 {
        my_claw as f32 / my_standing as f32
    } else {
        0.0
    };
    out[55] = if my_total > 0 {
        my_regen as f32 / my_total as f32
    } else {
        0.0
    };
    out[56] = cage_diagonal as f32 / 4.0;
    out[57] = cage_overload_risk;
    out[58] = opp_cage_diagonal as f32 / 4.0;
    out[59] = if carrier_can_score { 1.0 } else { 0.0 };
    out[60] = (pass_threats as f32 / 3.0).min(1.0);
    out[61] = if my_frenzy_count > 0 {
        frenzy_traps as f32 / my_frenzy_count as f32
    } else {
        0.0
    };
    out[62] = if opp_has_ball {
        (screen_count as f32 / 5.0).min(1.0)
    } else {
        0.0
    };
    out[63] = if i_have_ball && carrier_blitzable { 1.0 } else { 0.0 };
    out[64] = (surfable_opps as f32 / 3.0).min(1.0);
    out[65] = if my_standing > 0 {
        (favorable_blocks as f32 / my_standing as f32).min(1.0)
    } else {
        0.0
    };
    out[66] = if one_turn_td_vuln { 1.0 } else { 0.0 };
    out[67] = loose_ball_prox;
    out[68] = (deep_safeties as f32 / 3.0).min(1.0);
    out[69] = if my_standing > 0 {
        isolated_count as f32 / my_standing as f32
    } else {
        0.0
    };

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ball::BallState;
    use crate::engine::player::PlayerStats;

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(6, 3, 3, 8);
    }

    #[test]
    fn test_vector_width_and_bias() {
        let state = MatchState::new();
        let f = extract_state_features(&state, TeamSide::Home);
        assert_eq!(f.len(), NUM_STATE_FEATURES);
        assert_eq!(f[29], 1.0, "bias term");
    }

    #[test]
    fn test_possession_indicators() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        state.ball = BallState::carried(Position::new(10, 7), 1);

        let mine = extract_state_features(&state, TeamSide::Home);
        assert_eq!(mine[12], 1.0);
        assert_eq!(mine[13], 0.0);
        assert_eq!(mine[14], 0.0);

        let theirs = extract_state_features(&state, TeamSide::Away);
        assert_eq!(theirs[12], 0.0);
        assert_eq!(theirs[13], 1.0);
    }

    #[test]
    fn test_score_diff_is_antisymmetric() {
        let mut state = MatchState::new();
        state.home_team.score = 2;
        state.away_team.score = 1;

        let home = extract_state_features(&state, TeamSide::Home);
        let away = extract_state_features(&state, TeamSide::Away);
        assert!(home[0] > 0.0);
        assert!(away[0] < 0.0);
        assert!((home[0] + away[0]).abs() < 1e-6);
    }

    #[test]
    fn test_carrier_distance_uses_perspective() {
        let mut state = MatchState::new();
        place(&mut state, 1, 24, 7);
        state.ball = BallState::carried(Position::new(24, 7), 1);

        let f = extract_state_features(&state, TeamSide::Home);
        // One square out: 1/26.
        assert!((f[15] - 1.0 / 26.0).abs() < 1e-6);
        assert_eq!(f[34], 1.0, "near end zone");
        assert_eq!(f[41], 1.0, "scoring threat");
        assert_eq!(f[59], 1.0, "can score with GFI room");
    }

    #[test]
    fn test_cage_counting() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7);
        state.ball = BallState::carried(Position::new(10, 7), 1);
        place(&mut state, 2, 9, 6);
        place(&mut state, 3, 11, 6);
        place(&mut state, 4, 9, 8);
        place(&mut state, 5, 11, 8);

        let f = extract_state_features(&state, TeamSide::Home);
        assert_eq!(f[21], 1.0, "four in the cage");
        assert_eq!(f[56], 1.0, "all four diagonals");
    }

    #[test]
    fn test_standing_counts() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 5);
        place(&mut state, 2, 6, 5);
        state.player_mut(2).state = PlayerState::Prone;
        place(&mut state, 12, 20, 5);

        let f = extract_state_features(&state, TeamSide::Home);
        assert!((f[4] - 1.0 / 11.0).abs() < 1e-6);
        assert!((f[5] - 1.0 / 11.0).abs() < 1e-6);
        assert!((f[45] - 1.0 / 11.0).abs() < 1e-6, "one prone");
    }
}
