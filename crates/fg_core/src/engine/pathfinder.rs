//! Bounded reachability over the pitch grid. The search budget is the
//! player's remaining movement plus the go-for-it allowance, with the
//! stand-up surcharge applied up front.

use super::helpers::count_tacklezones;
use super::match_state::MatchState;
use super::player::{Player, PlayerState, Skill};
use super::position::{Position, PITCH_HEIGHT, PITCH_WIDTH};

const GRID_SIZE: usize = (PITCH_WIDTH as usize) * (PITCH_HEIGHT as usize);

fn grid_idx(pos: Position) -> usize {
    pos.y as usize * PITCH_WIDTH as usize + pos.x as usize
}

/// A single-step move candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTarget {
    pub pos: Position,
    /// Leaving the current square requires a dodge roll.
    pub requires_dodge: bool,
    /// The step spends a go-for-it square.
    pub is_gfi: bool,
}

pub fn gfi_allowance(player: &Player) -> i32 {
    if player.has_skill(Skill::Sprint) {
        3
    } else {
        2
    }
}

/// Breadth-first reachability: can the player end adjacent to `target`?
/// Occupied squares block, the target square itself is never entered, and
/// the cheapest adjacent square is returned.
pub fn reach_adjacent_to(
    state: &MatchState,
    player: &Player,
    target: Position,
) -> Option<Position> {
    if !player.is_on_pitch() || player.state == PlayerState::Stunned {
        return None;
    }

    let max_range = player.movement_remaining as i32 + gfi_allowance(player);

    // Standing up spends from the same budget.
    let start_cost = if player.state == PlayerState::Prone && !player.has_skill(Skill::JumpUp) {
        3
    } else {
        0
    };

    if max_range <= start_cost {
        return None;
    }

    // Cheap reject before flooding the grid.
    if player.position.distance_to(target) > max_range - start_cost + 1 {
        return None;
    }

    let mut visited = [false; GRID_SIZE];
    let mut queue: Vec<(Position, i32)> = Vec::with_capacity(64);
    let mut head = 0;

    visited[grid_idx(player.position)] = true;
    queue.push((player.position, start_cost));

    let mut best_adjacent: Option<Position> = None;
    let mut best_cost = i32::MAX;

    while head < queue.len() {
        let (cur, cost) = queue[head];
        head += 1;

        if cur.distance_to(target) == 1 && cur != player.position && cost < best_cost {
            best_cost = cost;
            best_adjacent = Some(cur);
        }

        for next in cur.adjacent() {
            if !next.is_on_pitch() {
                continue;
            }
            let idx = grid_idx(next);
            if visited[idx] {
                continue;
            }
            if next == target || state.player_id_at(next).is_some() {
                continue;
            }
            let next_cost = cost + 1;
            if next_cost > max_range {
                continue;
            }
            visited[idx] = true;
            queue.push((next, next_cost));
        }
    }

    best_adjacent
}

/// All legal single-step targets from the player's current square with
/// their dodge and go-for-it flags.
pub fn valid_move_targets(state: &MatchState, player: &Player) -> Vec<MoveTarget> {
    if !player.state.can_act() || player.lost_tacklezones {
        return Vec::new();
    }

    let in_tz = count_tacklezones(state, player.position, player.side, -1) > 0;
    let max_gfi = gfi_allowance(player);

    let mut out = Vec::with_capacity(8);
    for pos in player.position.adjacent() {
        if !pos.is_on_pitch() {
            continue;
        }
        if state.player_id_at(pos).is_some() {
            continue;
        }

        let after = player.movement_remaining as i32 - 1;
        if after < -max_gfi {
            continue;
        }

        out.push(MoveTarget {
            pos,
            requires_dodge: in_tz,
            is_gfi: after < 0,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::player::PlayerStats;

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8, movement: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(movement, 3, 3, 8);
        p.movement_remaining = movement;
    }

    #[test]
    fn test_reach_adjacent_simple() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 6);
        place(&mut state, 12, 10, 7, 6);

        let adj = reach_adjacent_to(&state, &state.player(1).clone(), Position::new(10, 7));
        assert!(adj.is_some());
        assert_eq!(adj.unwrap().distance_to(Position::new(10, 7)), 1);
    }

    #[test]
    fn test_reach_respects_budget() {
        let mut state = MatchState::new();
        place(&mut state, 1, 0, 7, 2);
        place(&mut state, 12, 12, 7, 6);

        // 2 MA + 2 GFI = 4 squares; target adjacency needs 11.
        assert!(reach_adjacent_to(&state, &state.player(1).clone(), Position::new(12, 7)).is_none());
    }

    #[test]
    fn test_reach_prone_pays_standup() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 4);
        state.player_mut(1).state = PlayerState::Prone;
        place(&mut state, 12, 10, 7, 6);

        // 4 MA - 3 stand up + 2 GFI = 3 range; adjacency needs 4.
        assert!(reach_adjacent_to(&state, &state.player(1).clone(), Position::new(10, 7)).is_none());

        // Jump Up waives the surcharge.
        state.player_mut(1).skills.add(Skill::JumpUp);
        assert!(reach_adjacent_to(&state, &state.player(1).clone(), Position::new(10, 7)).is_some());
    }

    #[test]
    fn test_reach_never_enters_target_square() {
        let mut state = MatchState::new();
        place(&mut state, 1, 5, 7, 6);
        place(&mut state, 12, 7, 7, 6);

        let adj = reach_adjacent_to(&state, &state.player(1).clone(), Position::new(7, 7));
        assert!(adj.is_some());
        assert_ne!(adj.unwrap(), Position::new(7, 7));
    }

    #[test]
    fn test_reach_blocked_by_wall_of_players() {
        let mut state = MatchState::new();
        place(&mut state, 1, 0, 0, 1);
        // Wall off the corner: (1,0) and (0,1) and (1,1).
        place(&mut state, 2, 1, 0, 6);
        place(&mut state, 3, 0, 1, 6);
        place(&mut state, 4, 1, 1, 6);
        place(&mut state, 12, 5, 5, 6);

        assert!(reach_adjacent_to(&state, &state.player(1).clone(), Position::new(5, 5)).is_none());
    }

    #[test]
    fn test_single_step_targets_flags() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7, 1);
        place(&mut state, 12, 11, 7, 6);

        let targets = valid_move_targets(&state, &state.player(1).clone());
        // One adjacent square is occupied by the opponent.
        assert_eq!(targets.len(), 7);
        for t in &targets {
            assert!(t.requires_dodge, "standing in a tacklezone");
            assert!(!t.is_gfi, "first step is within movement");
        }

        state.player_mut(1).movement_remaining = 0;
        let targets = valid_move_targets(&state, &state.player(1).clone());
        assert!(targets.iter().all(|t| t.is_gfi));
    }

    #[test]
    fn test_single_step_exhausted_gfi() {
        let mut state = MatchState::new();
        place(&mut state, 1, 10, 7, 6);
        state.player_mut(1).movement_remaining = -2;

        assert!(valid_move_targets(&state, &state.player(1).clone()).is_empty());

        state.player_mut(1).skills.add(Skill::Sprint);
        assert!(!valid_move_targets(&state, &state.player(1).clone()).is_empty());
    }
}
