//! Decision policies: the quick baselines and the searchers, plus the
//! per-decision visit logging that feeds policy training.

use crate::engine::dice::{DiceRoller, SeededDice};
use crate::engine::enumerator::available_actions;
use crate::engine::match_state::MatchState;
use crate::engine::player::{PlayerState, TeamSide};
use crate::engine::resolver::{execute_action, Action, ActionKind};
use crate::features::{
    extract_action_features, extract_state_features, NUM_ACTION_FEATURES, NUM_STATE_FEATURES,
};

use super::macro_mcts::MacroMctsSearch;
use super::macros::{extract_macro_features, greedy_expand_macro};
use super::mcts::{MctsConfig, MctsSearch};
use super::value::ValueFunction;

/// One logged decision: the state the searcher saw and the visit mass
/// of its top actions.
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub state_features: [f32; NUM_STATE_FEATURES],
    pub perspective: TeamSide,
    pub visits: Vec<ActionVisit>,
}

#[derive(Debug, Clone)]
pub struct ActionVisit {
    pub action_features: [f32; NUM_ACTION_FEATURES],
    pub visit_fraction: f32,
}

/// Uniform pick over the legal actions.
pub fn random_policy(state: &MatchState, dice: &mut dyn DiceRoller) -> Action {
    let mut actions = Vec::new();
    available_actions(state, &mut actions);

    if actions.is_empty() {
        return Action::end_turn();
    }
    if actions.len() == 1 {
        return actions[0];
    }

    let r = (dice.d6() - 1) * 6 + (dice.d6() - 1);
    actions[r as usize % actions.len()]
}

/// Carry the ball forward, chase a loose ball, hit what's adjacent.
pub fn greedy_policy(state: &MatchState, dice: &mut dyn DiceRoller) -> Action {
    let mut actions = Vec::new();
    available_actions(state, &mut actions);

    if actions.is_empty() {
        return Action::end_turn();
    }

    let my_side = state.active_team;

    // Carrier toward the end zone first.
    if state.ball.is_held && state.ball.carrier_id > 0 {
        let carrier = state.player(state.ball.carrier_id);
        if carrier.side == my_side && carrier.state == PlayerState::Standing {
            let target_x: i8 = match my_side {
                TeamSide::Home => 25,
                TeamSide::Away => 0,
            };
            let forward = target_x > carrier.position.x;
            for a in &actions {
                if a.kind == ActionKind::Move && a.player_id == carrier.id {
                    let advances = if forward {
                        a.target.x > carrier.position.x
                    } else {
                        a.target.x < carrier.position.x
                    };
                    if advances {
                        return *a;
                    }
                }
            }
        }
    }

    // Loose ball: grab it, or close in on it.
    if !state.ball.is_held && state.ball.is_on_pitch() {
        let ball_pos = state.ball.position;
        for a in &actions {
            if a.kind == ActionKind::Move && a.target == ball_pos {
                return *a;
            }
        }
        let mut best: Option<Action> = None;
        let mut best_dist = i32::MAX;
        for a in &actions {
            if a.kind == ActionKind::Move {
                let d = a.target.distance_to(ball_pos);
                if d < best_dist {
                    best_dist = d;
                    best = Some(*a);
                }
            }
        }
        if let Some(a) = best {
            return a;
        }
    }

    // Knock something over.
    let blocks: Vec<Action> = actions
        .iter()
        .copied()
        .filter(|a| a.kind == ActionKind::Block)
        .collect();
    if !blocks.is_empty() {
        let r = (dice.d6() - 1) as usize % blocks.len();
        return blocks[r];
    }

    if let Some(a) = actions.iter().find(|a| a.kind == ActionKind::Blitz) {
        return *a;
    }

    let moves: Vec<Action> = actions
        .iter()
        .copied()
        .filter(|a| a.kind == ActionKind::Move)
        .collect();
    if !moves.is_empty() {
        let r = (dice.d6() - 1) as usize % moves.len();
        return moves[r];
    }

    actions[0]
}

/// Epsilon-greedy over one-step lookahead values. The greedy arm knows
/// how to score, which keeps reward signals flowing during training.
pub fn learning_policy(
    state: &MatchState,
    dice: &mut dyn DiceRoller,
    vf: &dyn ValueFunction,
    epsilon: f32,
) -> Action {
    let mut actions = Vec::new();
    available_actions(state, &mut actions);

    if actions.is_empty() {
        return Action::end_turn();
    }

    let r = ((dice.d6() - 1) * 36 + (dice.d6() - 1) * 6 + (dice.d6() - 1)) as f32 / 216.0;
    if r < epsilon {
        return greedy_policy(state, dice);
    }

    let perspective = state.active_team;
    let mut best_idx = 0;
    let mut best_value = f32::NEG_INFINITY;

    for (i, action) in actions.iter().enumerate() {
        let mut clone = state.clone();
        let mut sim_dice = SeededDice::new((i as u64) * 31 + 17);
        execute_action(&mut clone, action, &mut sim_dice, None);

        let features = extract_state_features(&clone, perspective);
        let value = vf.evaluate(&features);
        if value > best_value {
            best_value = value;
            best_idx = i;
        }
    }

    actions[best_idx]
}

/// Search-backed policy over primitive actions. Each call runs a fresh
/// search; decision logging captures the root visit distribution.
pub struct MctsPolicy<'a> {
    search: MctsSearch<'a>,
    decisions: Vec<PolicyDecision>,
    log_decisions: bool,
    top_k: usize,
}

impl<'a> MctsPolicy<'a> {
    pub fn new(
        value_fn: Option<&'a (dyn ValueFunction + Sync)>,
        config: MctsConfig,
        seed: u64,
    ) -> Self {
        MctsPolicy {
            search: MctsSearch::new(value_fn, config, seed),
            decisions: Vec::new(),
            log_decisions: false,
            top_k: 20,
        }
    }

    pub fn search_mut(&mut self) -> &mut MctsSearch<'a> {
        &mut self.search
    }

    pub fn set_log_decisions(&mut self, log: bool, top_k: usize) {
        self.log_decisions = log;
        self.top_k = top_k;
    }

    pub fn decisions(&self) -> &[PolicyDecision] {
        &self.decisions
    }

    pub fn clear_decisions(&mut self) {
        self.decisions.clear();
    }

    pub fn last_iterations(&self) -> i32 {
        self.search.last_iterations()
    }

    pub fn select(&mut self, state: &MatchState) -> Action {
        let action = self.search.search(state);

        if self.log_decisions {
            let child_visits = self.search.last_child_visits();
            let total: i32 = child_visits.iter().map(|cv| cv.visits).sum();
            if total > 0 {
                let mut sorted: Vec<_> = child_visits.to_vec();
                sorted.sort_by(|a, b| b.visits.cmp(&a.visits));

                let visits = sorted
                    .iter()
                    .take(self.top_k)
                    .map(|cv| ActionVisit {
                        action_features: extract_action_features(state, &cv.action),
                        visit_fraction: cv.visits as f32 / total as f32,
                    })
                    .collect();

                self.decisions.push(PolicyDecision {
                    state_features: extract_state_features(state, state.active_team),
                    perspective: state.active_team,
                    visits,
                });
            }
        }

        action
    }
}

/// Search-backed policy over macros. The chosen macro expands into a
/// plan replayed one action per call; a stale plan is dropped and the
/// search runs again.
pub struct MacroMctsPolicy<'a> {
    search: MacroMctsSearch<'a>,
    expansion_dice: SeededDice,
    current_plan: Vec<Action>,
    plan_index: usize,

    decisions: Vec<PolicyDecision>,
    log_decisions: bool,
    top_k: usize,
}

impl<'a> MacroMctsPolicy<'a> {
    pub fn new(
        value_fn: Option<&'a (dyn ValueFunction + Sync)>,
        config: MctsConfig,
        seed: u64,
    ) -> Self {
        MacroMctsPolicy {
            search: MacroMctsSearch::new(value_fn, config, seed),
            expansion_dice: SeededDice::new(seed.wrapping_add(12345)),
            current_plan: Vec::new(),
            plan_index: 0,
            decisions: Vec::new(),
            log_decisions: false,
            top_k: 20,
        }
    }

    pub fn search_mut(&mut self) -> &mut MacroMctsSearch<'a> {
        &mut self.search
    }

    pub fn set_log_decisions(&mut self, log: bool, top_k: usize) {
        self.log_decisions = log;
        self.top_k = top_k;
    }

    pub fn decisions(&self) -> &[PolicyDecision] {
        &self.decisions
    }

    pub fn clear_decisions(&mut self) {
        self.decisions.clear();
    }

    pub fn last_iterations(&self) -> i32 {
        self.search.last_iterations()
    }

    pub fn select(&mut self, state: &MatchState) -> Action {
        // Keep following the plan while it stays legal.
        if self.plan_index < self.current_plan.len() {
            let planned = self.current_plan[self.plan_index];
            let mut legal = Vec::new();
            available_actions(state, &mut legal);
            if legal.contains(&planned) {
                self.plan_index += 1;
                return planned;
            }
            self.current_plan.clear();
            self.plan_index = 0;
        }

        let best_macro = self.search.search(state);

        if self.log_decisions {
            let child_visits = self.search.last_child_visits();
            let total: i32 = child_visits.iter().map(|cv| cv.visits).sum();
            if total > 0 {
                let mut sorted: Vec<_> = child_visits.to_vec();
                sorted.sort_by(|a, b| b.visits.cmp(&a.visits));

                let visits = sorted
                    .iter()
                    .take(self.top_k)
                    .map(|cv| ActionVisit {
                        action_features: extract_macro_features(state, &cv.macro_),
                        visit_fraction: cv.visits as f32 / total as f32,
                    })
                    .collect();

                self.decisions.push(PolicyDecision {
                    state_features: extract_state_features(state, state.active_team),
                    perspective: state.active_team,
                    visits,
                });
            }
        }

        // Expand the macro on a scratch clone to produce the plan.
        let mut plan_state = state.clone();
        let expansion = greedy_expand_macro(&mut plan_state, &best_macro, &mut self.expansion_dice);
        self.current_plan = expansion.actions;
        self.plan_index = 0;

        if self.current_plan.is_empty() {
            return Action::end_turn();
        }

        let first = self.current_plan[0];
        let mut legal = Vec::new();
        available_actions(state, &mut legal);
        if legal.contains(&first) {
            self.plan_index = 1;
            return first;
        }

        // The expansion drifted from reality; fall back to something
        // sensible.
        self.current_plan.clear();
        self.plan_index = 0;
        greedy_policy(state, &mut self.expansion_dice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ball::BallState;
    use crate::engine::match_state::GamePhase;
    use crate::engine::player::PlayerStats;
    use crate::engine::position::Position;
    use crate::search::value::LinearValue;

    fn place(state: &mut MatchState, id: i32, x: i8, y: i8) {
        let p = state.player_mut(id);
        p.state = PlayerState::Standing;
        p.position = Position::new(x, y);
        p.stats = PlayerStats::new(6, 3, 3, 8);
        p.movement_remaining = 6;
    }

    fn score_diff_value() -> LinearValue {
        let mut weights = vec![0.0f32; NUM_STATE_FEATURES];
        weights[0] = 1.0;
        LinearValue::new(weights)
    }

    #[test]
    fn test_random_policy_returns_legal_action() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);

        let mut legal = Vec::new();
        available_actions(&state, &mut legal);

        let mut dice = SeededDice::new(5);
        for _ in 0..50 {
            let action = random_policy(&state, &mut dice);
            assert!(legal.contains(&action));
        }
    }

    #[test]
    fn test_greedy_policy_advances_carrier() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);
        state.ball = BallState::carried(Position::new(10, 7), 1);

        let mut dice = SeededDice::new(5);
        let action = greedy_policy(&state, &mut dice);

        assert_eq!(action.kind, ActionKind::Move);
        assert_eq!(action.player_id, 1);
        assert!(action.target.x > 10, "moves toward the away end zone");
    }

    #[test]
    fn test_greedy_policy_chases_loose_ball() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        place(&mut state, 1, 10, 7);
        state.ball = BallState::on_ground(Position::new(11, 7));

        let mut dice = SeededDice::new(5);
        let action = greedy_policy(&state, &mut dice);

        assert_eq!(action.kind, ActionKind::Move);
        assert_eq!(action.target, Position::new(11, 7), "straight to the ball");
    }

    #[test]
    fn test_mcts_policy_logs_decisions() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        state.active_team = TeamSide::Home;
        state.home_team.turn_number = 1;
        place(&mut state, 1, 24, 7);
        state.ball = BallState::carried(Position::new(24, 7), 1);
        place(&mut state, 12, 5, 3);

        let vf = score_diff_value();
        let mut policy = MctsPolicy::new(Some(&vf), MctsConfig::for_testing().with_iterations(100), 13);
        policy.set_log_decisions(true, 5);

        let _ = policy.select(&state);

        assert_eq!(policy.decisions().len(), 1);
        let decision = &policy.decisions()[0];
        assert!(!decision.visits.is_empty());
        assert!(decision.visits.len() <= 5);
        let mass: f32 = decision.visits.iter().map(|v| v.visit_fraction).sum();
        assert!(mass <= 1.0 + 1e-5);
        // Sorted descending by visit share.
        for pair in decision.visits.windows(2) {
            assert!(pair[0].visit_fraction >= pair[1].visit_fraction);
        }
    }

    #[test]
    fn test_macro_policy_replays_plan() {
        let mut state = MatchState::new();
        state.phase = GamePhase::Play;
        state.active_team = TeamSide::Home;
        state.home_team.turn_number = 1;
        place(&mut state, 1, 22, 7);
        state.ball = BallState::carried(Position::new(22, 7), 1);
        place(&mut state, 12, 3, 3);

        let mut policy =
            MacroMctsPolicy::new(None, MctsConfig::for_testing().with_iterations(80), 21);

        // First call searches and returns the plan head; follow the
        // plan through the live state and it should keep validating.
        let mut dice = SeededDice::new(77);
        let mut steps = 0;
        while state.phase == GamePhase::Play && steps < 20 {
            let action = policy.select(&state);
            execute_action(&mut state, &action, &mut dice, None);
            steps += 1;
        }

        assert_eq!(state.phase, GamePhase::Touchdown, "plan carried it home");
        assert_eq!(state.home_team.score, 1);
    }
}
