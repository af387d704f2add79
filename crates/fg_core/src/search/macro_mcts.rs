//! Tree search over macros. Structure mirrors the primitive search,
//! but edges are tactical intents re-expanded with fresh dice on every
//! replay, and leaves are scored by a positional heuristic that a value
//! function can sharpen but not replace.

use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::engine::dice::SeededDice;
use crate::engine::match_state::{GamePhase, MatchState};
use crate::engine::player::{PlayerState, TeamSide};
use crate::features::{extract_state_features, NUM_ACTION_FEATURES};

use super::macros::{
    available_macros, extract_macro_features, greedy_expand_macro, Macro, MacroKind,
};
use super::mcts::MctsConfig;
use super::policy_net::PolicyNetwork;
use super::value::ValueFunction;

struct Node {
    macro_: Macro,
    parent: Option<usize>,
    children: Vec<usize>,
    visits: i32,
    total_value: f64,
    prior: f32,
    expanded: bool,
}

impl Node {
    fn new(macro_: Macro, parent: Option<usize>, prior: f32) -> Self {
        Node {
            macro_,
            parent,
            children: Vec::new(),
            visits: 0,
            total_value: 0.0,
            prior,
            expanded: false,
        }
    }

    fn q(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_value / self.visits as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct MacroChildVisit {
    pub macro_: Macro,
    pub visits: i32,
}

pub struct MacroMctsSearch<'a> {
    value_fn: Option<&'a (dyn ValueFunction + Sync)>,
    policy: Option<&'a PolicyNetwork>,
    config: MctsConfig,
    dice: SeededDice,
    noise_rng: ChaCha8Rng,

    last_iterations: i32,
    last_best_value: f64,
    last_child_visits: Vec<MacroChildVisit>,
}

impl<'a> MacroMctsSearch<'a> {
    pub fn new(
        value_fn: Option<&'a (dyn ValueFunction + Sync)>,
        config: MctsConfig,
        seed: u64,
    ) -> Self {
        use rand::SeedableRng;
        MacroMctsSearch {
            value_fn,
            policy: None,
            config,
            dice: SeededDice::new(seed),
            noise_rng: ChaCha8Rng::seed_from_u64(seed ^ 0x51ed_270b),
            last_iterations: 0,
            last_best_value: 0.0,
            last_child_visits: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: &'a PolicyNetwork) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn last_iterations(&self) -> i32 {
        self.last_iterations
    }

    pub fn last_best_value(&self) -> f64 {
        self.last_best_value
    }

    pub fn last_child_visits(&self) -> &[MacroChildVisit] {
        &self.last_child_visits
    }

    pub fn search(&mut self, state: &MatchState) -> Macro {
        let mut macros = Vec::new();
        available_macros(state, &mut macros);

        if macros.is_empty() {
            return Macro::end_turn();
        }
        if macros.len() == 1 {
            self.last_iterations = 0;
            self.last_best_value = 0.0;
            self.last_child_visits.clear();
            return macros[0];
        }

        let mut arena: Vec<Node> = Vec::with_capacity(256);
        arena.push(Node::new(Macro::end_turn(), None, 1.0));
        arena[0].visits = 1;

        self.expand(&mut arena, 0, state);

        if self.config.dirichlet_alpha > 0.0 {
            self.mix_root_noise(&mut arena);
        }

        let searching_side = state.active_team;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            // 1. Select.
            let mut node = self.select(&arena, 0);

            // 2. Open-loop replay: macros re-expand with fresh dice.
            let mut sim = state.clone();
            if !self.replay_to_node(&mut sim, &arena, node) {
                iterations += 1;
                continue;
            }

            // 3. Expand.
            if !arena[node].expanded && arena[node].visits > 0 {
                self.expand(&mut arena, node, &sim);
                if let Some(&first_child) = arena[node].children.first() {
                    node = first_child;
                    let macro_ = arena[node].macro_;
                    greedy_expand_macro(&mut sim, &macro_, &mut self.dice);
                }
            }

            // 4. Evaluate.
            let value = self.evaluate(&sim, searching_side);

            // 5. Backpropagate.
            let mut cur = Some(node);
            while let Some(idx) = cur {
                arena[idx].visits += 1;
                arena[idx].total_value += value;
                cur = arena[idx].parent;
            }

            iterations += 1;
        }

        self.last_iterations = iterations;
        trace!(iterations, children = arena[0].children.len(), "macro search done");

        self.last_child_visits = arena[0]
            .children
            .iter()
            .filter(|&&c| arena[c].visits > 0)
            .map(|&c| MacroChildVisit {
                macro_: arena[c].macro_,
                visits: arena[c].visits,
            })
            .collect();

        let best = arena[0]
            .children
            .iter()
            .copied()
            .max_by_key(|&c| arena[c].visits);

        match best {
            Some(c) => {
                self.last_best_value = arena[c].q();
                arena[c].macro_
            }
            None => macros[0],
        }
    }

    fn select(&self, arena: &[Node], root: usize) -> usize {
        let mut node = root;
        while arena[node].expanded && !arena[node].children.is_empty() {
            let parent_visits = arena[node].visits as f64;

            let mut visited_sum = 0.0;
            let mut visited_count = 0;
            for &c in &arena[node].children {
                if arena[c].visits > 0 {
                    visited_sum += arena[c].q();
                    visited_count += 1;
                }
            }
            let fpu = if visited_count > 0 {
                visited_sum / visited_count as f64
            } else {
                0.0
            };

            let next = arena[node].children.iter().copied().max_by(|&a, &b| {
                let score = |n: &Node| {
                    let q = if n.visits == 0 { fpu } else { n.q() };
                    q + self.config.exploration_c * n.prior as f64 * parent_visits.sqrt()
                        / (1.0 + n.visits as f64)
                };
                score(&arena[a])
                    .partial_cmp(&score(&arena[b]))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            match next {
                Some(c) => node = c,
                None => break,
            }
        }
        node
    }

    fn expand(&mut self, arena: &mut Vec<Node>, node: usize, state: &MatchState) {
        if matches!(
            state.phase,
            GamePhase::GameOver | GamePhase::Touchdown | GamePhase::HalfTime
        ) {
            arena[node].expanded = true;
            return;
        }

        let mut macros = Vec::new();
        available_macros(state, &mut macros);
        let n = macros.len();
        if n == 0 {
            arena[node].expanded = true;
            return;
        }

        let mut priors = vec![1.0f32 / n as f32; n];
        if let Some(policy) = self.policy {
            let state_feats = extract_state_features(state, state.active_team);
            let mut packed = vec![0.0f32; n * NUM_ACTION_FEATURES];
            for (i, m) in macros.iter().enumerate() {
                let feats = extract_macro_features(state, m);
                packed[i * NUM_ACTION_FEATURES..(i + 1) * NUM_ACTION_FEATURES]
                    .copy_from_slice(&feats);
            }
            // Softmax at unit temperature; saved temperatures can be
            // too sharp for search priors.
            let mut max_logit = f32::NEG_INFINITY;
            for i in 0..n {
                priors[i] = policy.evaluate_action(
                    &state_feats,
                    &packed[i * NUM_ACTION_FEATURES..(i + 1) * NUM_ACTION_FEATURES],
                );
                max_logit = max_logit.max(priors[i]);
            }
            let mut sum = 0.0;
            for p in priors.iter_mut() {
                *p = (*p - max_logit).exp();
                sum += *p;
            }
            if sum > 0.0 {
                for p in priors.iter_mut() {
                    *p /= sum;
                }
            }

            self.apply_prior_schedule(state, &macros, &mut priors);
        }

        for (i, m) in macros.iter().enumerate() {
            let child = Node::new(*m, Some(node), priors[i]);
            arena.push(child);
            let child_idx = arena.len() - 1;
            arena[node].children.push(child_idx);
        }
        arena[node].expanded = true;
    }

    /// Floor the priors of the macros that win games. Scoring pressure
    /// scales with the clock; blocks and cages keep a baseline; ending
    /// the turn never dominates.
    fn apply_prior_schedule(&self, state: &MatchState, macros: &[Macro], priors: &mut [f32]) {
        let my_team = state.team(state.active_team);
        let opp_team = state.team(state.active_team.opponent());
        let turns_remaining = (9 - my_team.turn_number).max(0);
        let trailing_badly = my_team.score - opp_team.score <= -2;
        let n = macros.len();
        let mut needs_renorm = false;

        for (i, m) in macros.iter().enumerate() {
            let mut min_prior = 0.0f32;
            match m.kind {
                MacroKind::Score | MacroKind::BlitzAndScore => {
                    min_prior = if turns_remaining <= 1 {
                        if m.player_id > 0 {
                            let p = state.player(m.player_id);
                            let dist = (p.position.x as i32
                                - match state.active_team {
                                    TeamSide::Home => 25,
                                    TeamSide::Away => 0,
                                })
                            .abs();
                            if dist <= p.movement_remaining as i32 {
                                0.60 // safe walk-in on the last turn
                            } else {
                                0.40
                            }
                        } else {
                            0.40
                        }
                    } else if trailing_badly {
                        0.50
                    } else if turns_remaining <= 2 {
                        0.35
                    } else if turns_remaining <= 4 {
                        0.20
                    } else {
                        0.08
                    };
                }
                MacroKind::Advance => {
                    if trailing_badly {
                        min_prior = 0.15;
                    }
                }
                MacroKind::Block => min_prior = 0.12,
                MacroKind::Cage => min_prior = 0.08,
                MacroKind::EndTurn => {
                    if priors[i] > 0.10 && n > 2 {
                        priors[i] = 0.10;
                        needs_renorm = true;
                    }
                }
                _ => {}
            }
            if min_prior > 0.0 && priors[i] < min_prior {
                priors[i] = min_prior;
                needs_renorm = true;
            }
        }

        if needs_renorm {
            let sum: f32 = priors.iter().sum();
            if sum > 0.0 {
                for p in priors.iter_mut() {
                    *p /= sum;
                }
            }
        }
    }

    /// Hand-crafted positional judgment, clamped to [-1, 1]. A value
    /// function, when present, is averaged in on top.
    fn evaluate(&self, state: &MatchState, perspective: TeamSide) -> f64 {
        let my = state.team(perspective);
        let opp = state.team(perspective.opponent());
        let mut heuristic = (my.score - opp.score) as f64 * 0.5;

        let turns_left = (9 - my.turn_number).max(0);

        if state.ball.is_held && state.ball.carrier_id > 0 {
            let carrier = state.player(state.ball.carrier_id);
            let ez_x: i32 = match carrier.side {
                TeamSide::Home => 25,
                TeamSide::Away => 0,
            };
            let dist = (carrier.position.x as i32 - ez_x).abs();
            let ma = carrier.stats.movement as i32;
            let proximity = 1.0 - dist as f64 / 25.0;

            if carrier.side == perspective {
                heuristic += 0.1;
                heuristic += 0.25 * proximity;

                if dist <= carrier.movement_remaining as i32 {
                    heuristic += 0.4; // a safe walk-in is nearly a score
                } else if dist <= carrier.movement_remaining as i32 + 2 {
                    heuristic += 0.2;
                }

                // Stall pacing: on track to score on the final turn.
                if turns_left > 0 && dist > 0 {
                    let ideal = (turns_left * ma).max(1);
                    let pacing = 1.0 - (dist - ideal).abs() as f64 / ideal as f64;
                    if pacing > 0.0 {
                        heuristic += 0.1 * pacing;
                    }
                }

                if turns_left <= 2 && dist <= ma + 2 {
                    heuristic += 0.3; // now or never
                }
            } else {
                heuristic -= 0.1;
                heuristic -= 0.25 * proximity;
                if dist <= carrier.movement_remaining as i32 {
                    heuristic -= 0.4;
                }
            }
        } else if !state.ball.is_held && state.ball.is_on_pitch() {
            heuristic -= 0.1; // a loose ball helps nobody
        }

        let my_standing = state
            .on_pitch_of(perspective)
            .filter(|p| p.state == PlayerState::Standing)
            .count() as i64;
        let opp_standing = state
            .on_pitch_of(perspective.opponent())
            .filter(|p| p.state == PlayerState::Standing)
            .count() as i64;
        heuristic += (my_standing - opp_standing) as f64 * 0.03;

        let mut value = heuristic.clamp(-1.0, 1.0);

        if let Some(vf) = self.value_fn {
            let features = extract_state_features(state, perspective);
            let learned = (vf.evaluate(&features) as f64).tanh();
            value = 0.5 * value + 0.5 * learned;
        }

        value
    }

    fn replay_to_node(&mut self, state: &mut MatchState, arena: &[Node], node: usize) -> bool {
        let mut path = Vec::new();
        let mut cur = node;
        while let Some(parent) = arena[cur].parent {
            path.push(cur);
            cur = parent;
        }

        for &idx in path.iter().rev() {
            if matches!(
                state.phase,
                GamePhase::GameOver | GamePhase::Touchdown | GamePhase::HalfTime
            ) {
                return false;
            }
            let macro_ = arena[idx].macro_;
            let expansion = greedy_expand_macro(state, &macro_, &mut self.dice);
            if expansion.turnover {
                return false;
            }
        }
        true
    }

    fn mix_root_noise(&mut self, arena: &mut [Node]) {
        use rand_distr::{Distribution, Gamma};

        let n = arena[0].children.len();
        if n == 0 {
            return;
        }
        let gamma = match Gamma::new(self.config.dirichlet_alpha as f64, 1.0) {
            Ok(g) => g,
            Err(_) => return,
        };
        let mut noise: Vec<f64> = (0..n).map(|_| gamma.sample(&mut self.noise_rng)).collect();
        let sum: f64 = noise.iter().sum();
        if sum <= 0.0 {
            return;
        }
        for x in noise.iter_mut() {
            *x /= sum;
        }

        let w = self.config.dirichlet_weight;
        let children: Vec<usize> = arena[0].children.clone();
        for (i, c) in children.into_iter().enumerate() {
            arena[c].prior = (1.0 - w) * arena[c].prior + w * noise[i] as f32;
        }
    }
}
