//! Legal-action enumeration. Everything emitted here must resolve
//! without an invariant violation; the resolver trusts this list.

use super::match_state::{GamePhase, MatchState};
use super::pathfinder::{gfi_allowance, reach_adjacent_to};
use super::player::{PlayerState, Skill};
use super::position::Position;
use super::resolver::{Action, ActionKind};

/// All legal primitive actions for the active side. Empty outside the
/// play phase except that end-turn is always present during play.
pub fn available_actions(state: &MatchState, out: &mut Vec<Action>) {
    out.clear();

    if state.phase != GamePhase::Play {
        return;
    }

    let side = state.active_team;
    let enemy_side = side.opponent();
    let team = state.team(side);

    out.push(Action::end_turn());

    for id in MatchState::side_ids(side) {
        let p = state.player(id);
        if !p.is_on_pitch() || !p.can_act() {
            continue;
        }

        // A ball & chain player swings or does nothing at all.
        if p.has_skill(Skill::BallAndChain) {
            out.push(Action::new(
                ActionKind::BallAndChain,
                id,
                -1,
                Position::OFF_PITCH,
            ));
            continue;
        }

        let adjacent = p.position.adjacent();

        // Single-step moves.
        let max_gfi = gfi_allowance(p);
        for pos in adjacent {
            if !pos.is_on_pitch() || state.player_id_at(pos).is_some() {
                continue;
            }
            if (p.movement_remaining as i32) - 1 < -max_gfi {
                continue;
            }
            out.push(Action::new(ActionKind::Move, id, -1, pos));
        }

        // Blocks against adjacent standing enemies.
        for pos in adjacent {
            if !pos.is_on_pitch() {
                continue;
            }
            if let Some(enemy) = state.player_at(pos) {
                if enemy.side == enemy_side && enemy.state.can_act() {
                    out.push(Action::new(ActionKind::Block, id, enemy.id, enemy.position));
                }
            }
        }

        // Blitzes against any reachable standing enemy.
        if !team.blitz_used_this_turn && !p.used_blitz {
            for enemy in state.on_pitch_of(enemy_side) {
                if enemy.state != PlayerState::Standing {
                    continue;
                }
                if p.position.distance_to(enemy.position) == 1
                    || reach_adjacent_to(state, p, enemy.position).is_some()
                {
                    out.push(Action::new(ActionKind::Blitz, id, enemy.id, enemy.position));
                }
            }
        }

        let carries_ball = state.ball.is_held && state.ball.carrier_id == id;

        // Passes to standing teammates in range.
        if !team.pass_used_this_turn && carries_ball && !p.has_skill(Skill::NoHands) {
            for teammate in state.on_pitch_of(side) {
                if teammate.id == id || teammate.state != PlayerState::Standing {
                    continue;
                }
                if p.position.distance_to(teammate.position) > 13 {
                    continue;
                }
                out.push(Action::new(ActionKind::Pass, id, -1, teammate.position));
            }

            // Hand-offs to adjacent standing teammates.
            for pos in adjacent {
                if !pos.is_on_pitch() {
                    continue;
                }
                if let Some(teammate) = state.player_at(pos) {
                    if teammate.side == side && teammate.state == PlayerState::Standing {
                        out.push(Action::new(
                            ActionKind::HandOff,
                            id,
                            teammate.id,
                            teammate.position,
                        ));
                    }
                }
            }
        }

        // Fouls against adjacent downed enemies.
        if !team.foul_used_this_turn {
            for pos in adjacent {
                if !pos.is_on_pitch() {
                    continue;
                }
                if let Some(enemy) = state.player_at(pos) {
                    if enemy.side == enemy_side
                        && matches!(enemy.state, PlayerState::Prone | PlayerState::Stunned)
                    {
                        out.push(Action::new(ActionKind::Foul, id, enemy.id, enemy.position));
                    }
                }
            }
        }

        // Throw team-mate: an adjacent Right Stuff carrier and a coarse
        // lattice of landing squares.
        if p.has_skill(Skill::ThrowTeamMate) && !team.pass_used_this_turn {
            for pos in adjacent {
                if !pos.is_on_pitch() {
                    continue;
                }
                let Some(teammate) = state.player_at(pos) else {
                    continue;
                };
                if teammate.side != side
                    || teammate.state != PlayerState::Standing
                    || !teammate.has_skill(Skill::RightStuff)
                {
                    continue;
                }
                let teammate_id = teammate.id;
                let mut tx = 0i8;
                while tx < 26 {
                    let mut ty = 0i8;
                    while ty < 15 {
                        let landing = Position::new(tx, ty);
                        let dist = p.position.distance_to(landing);
                        if dist > 0 && dist <= 13 {
                            out.push(Action::new(
                                ActionKind::ThrowTeamMate,
                                id,
                                teammate_id,
                                landing,
                            ));
                        }
                        ty += 3;
                    }
                    tx += 3;
                }
            }
        }

        // Bombs at standing enemies in range.
        if p.has_skill(Skill::Bombardier) && !team.pass_used_this_turn {
            for enemy in state.on_pitch_of(enemy_side) {
                if enemy.state != PlayerState::Standing {
                    continue;
                }
                if p.position.distance_to(enemy.position) > 13 {
                    continue;
                }
                out.push(Action::new(ActionKind::BombThrow, id, -1, enemy.position));
            }
        }

        // Hypnotic gaze at adjacent standing enemies.
        if p.has_skill(Skill::HypnoticGaze) {
            for pos in adjacent {
                if !pos.is_on_pitch() {
                    continue;
                }
                if let Some(enemy) = state.player_at(pos) {
                    if enemy.side == enemy_side && enemy.state == PlayerState::Standing {
                        out.push(Action::new(
                            ActionKind::HypnoticGaze,
                            id,
                            enemy.id,
                            enemy.position,
                        ));
                    }
                }
            }
        }

        // Multiple block: every pair of adjacent standing enemies. The
        // second defender's id rides in target.x.
        if p.has_skill(Skill::MultipleBlock) && !p.has_skill(Skill::Frenzy) {
            let mut adj_enemies = Vec::with_capacity(8);
            for pos in adjacent {
                if !pos.is_on_pitch() {
                    continue;
                }
                if let Some(enemy) = state.player_at(pos) {
                    if enemy.side == enemy_side && enemy.state == PlayerState::Standing {
                        adj_enemies.push(enemy.id);
                    }
                }
            }
            for i in 0..adj_enemies.len() {
                for j in (i + 1)..adj_enemies.len() {
                    out.push(Action::new(
                        ActionKind::MultipleBlock,
                        id,
                        adj_enemies[i],
                        Position::new(adj_enemies[j] as i8, 0),
                    ));
                }
            }
        }
    }

    // Prone players with enough movement get a stand-up-only move.
    for id in MatchState::side_ids(side) {
        let p = state.player(id);
        if !p.is_on_pitch() || p.state != PlayerState::Prone {
            continue;
        }
        if p.has_acted || p.lost_tacklezones {
            continue;
        }
        if p.has_skill(Skill::JumpUp) || p.movement_remaining >= 3 {
            out.push(Action::new(ActionKind::Move, id, -1, p.position));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ball::BallState;
    use crate::engine::player::{PlayerStats, TeamSide};

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(6, 3, 3, 8);
        p.movement_remaining = 6;
    }

    fn actions_of(state: &MatchState, kind: ActionKind) -> Vec<Action> {
        let mut out = Vec::new();
        available_actions(state, &mut out);
        out.into_iter().filter(|a| a.kind == kind).collect()
    }

    #[test]
    fn test_empty_outside_play_phase() {
        let state = MatchState::new();
        let mut out = Vec::new();
        available_actions(&state, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_end_turn_always_present() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        let mut out = Vec::new();
        available_actions(&state, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ActionKind::EndTurn);
    }

    #[test]
    fn test_moves_blocks_blitzes() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        state.active_team = TeamSide::Home;
        place(&mut state, 1, 10, 7);
        place(&mut state, 12, 11, 7);
        place(&mut state, 13, 16, 7);
        place(&mut state, 14, 24, 2); // out of blitz range

        let moves = actions_of(&state, ActionKind::Move);
        assert_eq!(moves.len(), 7, "eight neighbours, one occupied");

        let blocks = actions_of(&state, ActionKind::Block);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].target_id, 12);

        // The adjacent enemy and the reachable one; the far corner is
        // beyond movement plus go-for-its.
        let blitzes = actions_of(&state, ActionKind::Blitz);
        assert_eq!(blitzes.len(), 2);
        assert!(blitzes.iter().all(|a| a.target_id != 14));
    }

    #[test]
    fn test_blitz_respects_team_flag() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);
        place(&mut state, 12, 11, 7);
        state.home_team.blitz_used_this_turn = true;

        assert!(actions_of(&state, ActionKind::Blitz).is_empty());
    }

    #[test]
    fn test_pass_and_hand_off_for_carrier_only() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);
        place(&mut state, 2, 11, 7);
        place(&mut state, 3, 15, 7);
        state.ball = BallState::carried(Position::new(10, 7), 1);

        let passes = actions_of(&state, ActionKind::Pass);
        assert_eq!(passes.len(), 2, "both standing teammates in range");

        let hand_offs = actions_of(&state, ActionKind::HandOff);
        assert_eq!(hand_offs.len(), 1);
        assert_eq!(hand_offs[0].target_id, 2);

        state.home_team.pass_used_this_turn = true;
        assert!(actions_of(&state, ActionKind::Pass).is_empty());
        assert!(actions_of(&state, ActionKind::HandOff).is_empty());
    }

    #[test]
    fn test_foul_targets_downed_enemies() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);
        place(&mut state, 12, 11, 7);
        state.player_mut(12).state = PlayerState::Prone;

        let fouls = actions_of(&state, ActionKind::Foul);
        assert_eq!(fouls.len(), 1);
        assert_eq!(fouls[0].target_id, 12);

        state.home_team.foul_used_this_turn = true;
        assert!(actions_of(&state, ActionKind::Foul).is_empty());
    }

    #[test]
    fn test_ball_and_chain_is_exclusive() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);
        state.player_mut(1).skills.add(Skill::BallAndChain);
        place(&mut state, 12, 11, 7);

        let mut out = Vec::new();
        available_actions(&state, &mut out);

        let for_player: Vec<_> = out.iter().filter(|a| a.player_id == 1).collect();
        assert_eq!(for_player.len(), 1);
        assert_eq!(for_player[0].kind, ActionKind::BallAndChain);
    }

    #[test]
    fn test_prone_stand_up_encoded_as_self_move() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);
        state.player_mut(1).state = PlayerState::Prone;

        let moves = actions_of(&state, ActionKind::Move);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].target, Position::new(10, 7));

        state.player_mut(1).movement_remaining = 2;
        assert!(
            actions_of(&state, ActionKind::Move).is_empty(),
            "not enough movement to stand"
        );
    }

    #[test]
    fn test_multiple_block_pair_encoding() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);
        state.player_mut(1).skills.add(Skill::MultipleBlock);
        place(&mut state, 12, 11, 7);
        place(&mut state, 13, 10, 8);

        let mbs = actions_of(&state, ActionKind::MultipleBlock);
        assert_eq!(mbs.len(), 1);
        assert_eq!(mbs[0].target_id, 12, "adjacency scan order");
        assert_eq!(mbs[0].target.x as i32, 13, "second id rides in target.x");
    }

    #[test]
    fn test_acted_players_emit_nothing() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);
        state.player_mut(1).has_acted = true;

        let mut out = Vec::new();
        available_actions(&state, &mut out);
        assert_eq!(out.len(), 1, "only end turn remains");
    }
}
