//! Primitive-action Monte-Carlo tree search: UCT by default, PUCT with
//! first-play urgency when a policy prior is attached, open-loop replay
//! with fresh dice on every iteration.
//!
//! The tree lives in an index arena; nodes refer to their parent and
//! children by handle, so growing child vectors never invalidates a
//! reference. Nothing downstream of a roll is cached: replay re-rolls
//! the whole path, which keeps value estimates honest under dice
//! variance.

use std::time::Instant;

use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::engine::dice::{DiceRoller, SeededDice};
use crate::engine::enumerator::available_actions;
use crate::engine::match_state::{GamePhase, MatchState};
use crate::engine::player::TeamSide;
use crate::engine::resolver::{execute_action, Action};
use crate::features::{extract_action_features, extract_state_features, NUM_ACTION_FEATURES};

use super::policy_net::PolicyNetwork;
use super::value::ValueFunction;

#[derive(Debug, Clone)]
pub struct MctsConfig {
    pub time_budget_ms: u64,
    pub max_iterations: i32,
    pub exploration_c: f64,
    /// 0 evaluates leaves directly; otherwise random playout depth.
    pub rollout_depth: i32,
    /// Progressive widening cap on children per node (0 = unlimited).
    /// Only effective with a policy prior attached.
    pub max_children: usize,
    /// Root Dirichlet noise; 0 disables. Self-play training uses 0.3.
    pub dirichlet_alpha: f32,
    /// prior <- (1-w)*prior + w*noise.
    pub dirichlet_weight: f32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            time_budget_ms: 1000,
            max_iterations: 100_000,
            exploration_c: std::f64::consts::SQRT_2,
            rollout_depth: 0,
            max_children: 0,
            dirichlet_alpha: 0.0,
            dirichlet_weight: 0.25,
        }
    }
}

impl MctsConfig {
    /// Small budgets for unit tests.
    pub fn for_testing() -> Self {
        MctsConfig {
            time_budget_ms: 10_000,
            max_iterations: 400,
            ..MctsConfig::default()
        }
    }

    pub fn with_iterations(mut self, n: i32) -> Self {
        self.max_iterations = n;
        self
    }
}

struct Node {
    action: Action,
    parent: Option<usize>,
    children: Vec<usize>,
    visits: i32,
    total_value: f64,
    prior: f32,
    expanded: bool,
}

impl Node {
    fn new(action: Action, parent: Option<usize>, prior: f32) -> Self {
        Node {
            action,
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

/// Visit counts for the root's children, recorded for policy training.
#[derive(Debug, Clone)]
pub struct ChildVisit {
    pub action: Action,
    pub visits: i32,
}

pub struct MctsSearch<'a> {
    value_fn: Option<&'a (dyn ValueFunction + Sync)>,
    policy: Option<&'a PolicyNetwork>,
    config: MctsConfig,
    dice: SeededDice,
    noise_rng: ChaCha8Rng,

    last_iterations: i32,
    last_best_value: f64,
    last_child_visits: Vec<ChildVisit>,
}

impl<'a> MctsSearch<'a> {
    pub fn new(
        value_fn: Option<&'a (dyn ValueFunction + Sync)>,
        config: MctsConfig,
        seed: u64,
    ) -> Self {
        use rand::SeedableRng;
        MctsSearch {
            value_fn,
            policy: None,
            config,
            dice: SeededDice::new(seed),
            noise_rng: ChaCha8Rng::seed_from_u64(seed ^ 0x9e37_79b9),
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

    pub fn last_child_visits(&self) -> &[ChildVisit] {
        &self.last_child_visits
    }

    pub fn search(&mut self, state: &MatchState) -> Action {
        let mut actions = Vec::new();
        available_actions(state, &mut actions);

        if actions.is_empty() {
            return Action::end_turn();
        }
        if actions.len() == 1 {
            // Nothing to search over.
            self.last_iterations = 0;
            self.last_best_value = 0.0;
            self.last_child_visits.clear();
            return actions[0];
        }

        let mut arena: Vec<Node> = Vec::with_capacity(1024);
        arena.push(Node::new(Action::end_turn(), None, 1.0));
        // Virtual root visit keeps the exploration term alive.
        arena[0].visits = 1;

        self.expand(&mut arena, 0, state);

        if self.config.dirichlet_alpha > 0.0 {
            self.mix_root_noise(&mut arena);
        }

        let searching_side = state.active_team;
        let start = Instant::now();
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            if iterations > 0 && (iterations & 63) == 0 {
                let elapsed = start.elapsed().as_millis() as u64;
                if elapsed >= self.config.time_budget_ms {
                    break;
                }
            }

            // 1. Select.
            let mut node = self.select(&arena, 0);

            // 2. Replay the path open-loop on a fresh clone.
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
                    let action = arena[node].action;
                    execute_action(&mut sim, &action, &mut self.dice, None);
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
        trace!(iterations, children = arena[0].children.len(), "search done");

        self.last_child_visits = arena[0]
            .children
            .iter()
            .filter(|&&c| arena[c].visits > 0)
            .map(|&c| ChildVisit {
                action: arena[c].action,
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
                arena[c].action
            }
            None => actions[0],
        }
    }

    /// Walk down the tree by UCT (or PUCT with FPU when a prior policy
    /// is attached) until an unexpanded or childless node.
    fn select(&self, arena: &[Node], root: usize) -> usize {
        let mut node = root;
        while arena[node].expanded && !arena[node].children.is_empty() {
            let next = if self.policy.is_some() {
                self.best_child_puct(arena, node)
            } else {
                self.best_child_uct(arena, node)
            };
            match next {
                Some(c) => node = c,
                None => break,
            }
        }
        node
    }

    fn best_child_uct(&self, arena: &[Node], node: usize) -> Option<usize> {
        let parent_log_n = (arena[node].visits.max(1) as f64).ln();
        arena[node]
            .children
            .iter()
            .copied()
            .max_by(|&a, &b| {
                let ua = self.uct(&arena[a], parent_log_n);
                let ub = self.uct(&arena[b], parent_log_n);
                ua.partial_cmp(&ub).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn uct(&self, child: &Node, parent_log_n: f64) -> f64 {
        if child.visits == 0 {
            return f64::MAX;
        }
        child.q() + self.config.exploration_c * (parent_log_n / child.visits as f64).sqrt()
    }

    fn best_child_puct(&self, arena: &[Node], node: usize) -> Option<usize> {
        let parent_visits = arena[node].visits as f64;

        // First-play urgency: unvisited children start from the mean Q
        // of their visited siblings instead of zero.
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

        arena[node]
            .children
            .iter()
            .copied()
            .max_by(|&a, &b| {
                let sa = self.puct(&arena[a], parent_visits, fpu);
                let sb = self.puct(&arena[b], parent_visits, fpu);
                sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn puct(&self, child: &Node, parent_visits: f64, fpu: f64) -> f64 {
        let q = if child.visits == 0 { fpu } else { child.q() };
        let u = self.config.exploration_c
            * child.prior as f64
            * parent_visits.sqrt()
            / (1.0 + child.visits as f64);
        q + u
    }

    fn expand(&mut self, arena: &mut Vec<Node>, node: usize, state: &MatchState) {
        if matches!(
            state.phase,
            GamePhase::GameOver | GamePhase::Touchdown | GamePhase::HalfTime
        ) {
            arena[node].expanded = true;
            return;
        }

        let mut actions = Vec::new();
        available_actions(state, &mut actions);
        let n = actions.len();
        if n == 0 {
            arena[node].expanded = true;
            return;
        }

        let mut priors = vec![1.0f32 / n as f32; n];
        if let Some(policy) = self.policy {
            let state_feats = extract_state_features(state, state.active_team);
            let mut packed = vec![0.0f32; n * NUM_ACTION_FEATURES];
            for (i, action) in actions.iter().enumerate() {
                let feats = extract_action_features(state, action);
                packed[i * NUM_ACTION_FEATURES..(i + 1) * NUM_ACTION_FEATURES]
                    .copy_from_slice(&feats);
            }
            policy.compute_priors(&state_feats, &packed, n, &mut priors);
        }

        // Progressive widening: keep only the strongest candidates when
        // a cap is set, then renormalise their mass.
        let mut order: Vec<usize> = (0..n).collect();
        let mut keep = n;
        if self.config.max_children > 0 && n > self.config.max_children && self.policy.is_some() {
            order.sort_by(|&a, &b| {
                priors[b]
                    .partial_cmp(&priors[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            keep = self.config.max_children;

            let kept_mass: f32 = order[..keep].iter().map(|&i| priors[i]).sum();
            if kept_mass > 0.0 {
                for &i in &order[..keep] {
                    priors[i] /= kept_mass;
                }
            }
        }

        for &i in &order[..keep] {
            let child = Node::new(actions[i], Some(node), priors[i]);
            arena.push(child);
            let child_idx = arena.len() - 1;
            arena[node].children.push(child_idx);
        }
        arena[node].expanded = true;
    }

    fn evaluate(&mut self, state: &MatchState, perspective: TeamSide) -> f64 {
        if self.config.rollout_depth > 0 {
            return self.rollout(state.clone(), perspective, self.config.rollout_depth);
        }
        self.static_eval(state, perspective)
    }

    fn static_eval(&self, state: &MatchState, perspective: TeamSide) -> f64 {
        if let Some(vf) = self.value_fn {
            let features = extract_state_features(state, perspective);
            let raw = vf.evaluate(&features) as f64;
            // Keep Q bounded so the exploration term stays relevant.
            return raw.tanh();
        }

        // No value function: score and possession only.
        let my = state.team(perspective);
        let opp = state.team(perspective.opponent());
        let mut value = (my.score - opp.score) as f64 * 0.5;
        if state.ball.is_held && state.ball.carrier_id > 0 {
            if state.player(state.ball.carrier_id).side == perspective {
                value += 0.1;
            } else {
                value -= 0.1;
            }
        }
        value.clamp(-1.0, 1.0)
    }

    fn rollout(&mut self, mut state: MatchState, perspective: TeamSide, depth: i32) -> f64 {
        let mut actions = Vec::new();
        for _ in 0..depth {
            if state.phase != GamePhase::Play {
                break;
            }
            available_actions(&state, &mut actions);
            if actions.is_empty() {
                break;
            }
            let idx =
                ((self.dice.d6() - 1 + self.dice.d6() - 1) as usize) % actions.len();
            let action = actions[idx];
            execute_action(&mut state, &action, &mut self.dice, None);
        }
        self.static_eval(&state, perspective)
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
            let action = arena[idx].action;
            execute_action(state, &action, &mut self.dice, None);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ball::BallState;
    use crate::engine::player::{PlayerState, PlayerStats};
    use crate::engine::position::Position;
    use crate::engine::resolver::ActionKind;
    use crate::search::value::LinearValue;

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(6, 3, 3, 8);
        p.movement_remaining = 6;
    }

    /// A value function that only cares about the score differential.
    fn score_diff_value() -> LinearValue {
        let mut weights = vec![0.0f32; crate::features::NUM_STATE_FEATURES];
        weights[0] = 1.0;
        LinearValue::new(weights)
    }

    fn one_step_to_score() -> MatchState {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        state.active_team = TeamSide::Home;
        state.home_team.turn_number = 1;
        state.away_team.turn_number = 1;
        place(&mut state, 1, 24, 7);
        place(&mut state, 12, 5, 3);
        state.ball = BallState::carried(Position::new(24, 7), 1);
        state
    }

    #[test]
    fn test_finds_winning_move() {
        let state = one_step_to_score();
        let vf = score_diff_value();
        let mut search = MctsSearch::new(
            Some(&vf),
            MctsConfig::for_testing().with_iterations(300),
            42,
        );

        let action = search.search(&state);

        assert_eq!(action.kind, ActionKind::Move);
        assert_eq!(action.player_id, 1);
        assert_eq!(action.target.x, 25, "walks into the end zone");
        assert!(search.last_iterations() > 0);
    }

    #[test]
    fn test_single_action_returns_without_search() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        // Nobody can act: only end turn is available.
        let vf = score_diff_value();
        let mut search = MctsSearch::new(Some(&vf), MctsConfig::for_testing(), 42);

        let action = search.search(&state);

        assert_eq!(action.kind, ActionKind::EndTurn);
        assert_eq!(search.last_iterations(), 0, "no iterations spent");
    }

    #[test]
    fn test_visits_monotone_in_budget() {
        let state = one_step_to_score();
        let vf = score_diff_value();

        let mut small = MctsSearch::new(
            Some(&vf),
            MctsConfig::for_testing().with_iterations(100),
            7,
        );
        small.search(&state);
        let small_max = small
            .last_child_visits()
            .iter()
            .map(|cv| cv.visits)
            .max()
            .unwrap_or(0);

        let mut large = MctsSearch::new(
            Some(&vf),
            MctsConfig::for_testing().with_iterations(400),
            7,
        );
        large.search(&state);
        let large_max = large
            .last_child_visits()
            .iter()
            .map(|cv| cv.visits)
            .max()
            .unwrap_or(0);

        assert!(
            large_max >= small_max,
            "more budget, at least as many visits: {} vs {}",
            large_max,
            small_max
        );
    }

    #[test]
    fn test_child_visit_log_present() {
        let state = one_step_to_score();
        let vf = score_diff_value();
        let mut search = MctsSearch::new(
            Some(&vf),
            MctsConfig::for_testing().with_iterations(150),
            9,
        );
        search.search(&state);

        let visits = search.last_child_visits();
        assert!(!visits.is_empty());
        let total: i32 = visits.iter().map(|cv| cv.visits).sum();
        assert!(total > 0 && total <= 150 + 1);
    }

    #[test]
    fn test_search_is_deterministic_per_seed() {
        let state = one_step_to_score();
        let vf = score_diff_value();

        let mut a = MctsSearch::new(Some(&vf), MctsConfig::for_testing().with_iterations(120), 5);
        let mut b = MctsSearch::new(Some(&vf), MctsConfig::for_testing().with_iterations(120), 5);

        assert_eq!(a.search(&state), b.search(&state));
    }

    #[test]
    fn test_progressive_widening_caps_children() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        state.active_team = TeamSide::Home;
        for id in 1..=6 {
            place(&mut state, id, (4 + id * 2) as i8, 7);
        }

        let net = PolicyNetwork::new(vec![0.0; super::super::policy_net::POLICY_INPUT_SIZE], 0.0, 1.0);
        let vf = score_diff_value();
        let config = MctsConfig {
            max_children: 5,
            ..MctsConfig::for_testing().with_iterations(50)
        };
        let mut search = MctsSearch::new(Some(&vf), config, 3).with_policy(&net);
        search.search(&state);

        assert!(
            search.last_child_visits().len() <= 5,
            "root children capped by widening"
        );
    }
}
