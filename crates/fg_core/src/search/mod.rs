//! Decision search: Monte-Carlo tree search over primitive actions and
//! over macro intents, with the value/policy function seams and the
//! baseline policies.

pub mod macro_mcts;
pub mod macros;
pub mod mcts;
pub mod policies;
pub mod policy_net;
pub mod value;

pub use macro_mcts::{MacroChildVisit, MacroMctsSearch};
pub use macros::{
    available_macros, extract_macro_features, greedy_expand_macro, Macro, MacroExpansion,
    MacroKind,
};
pub use mcts::{ChildVisit, MctsConfig, MctsSearch};
pub use policies::{
    greedy_policy, learning_policy, random_policy, ActionVisit, MacroMctsPolicy, MctsPolicy,
    PolicyDecision,
};
pub use policy_net::{
    load_policy_network, load_policy_network_from_str, PolicyNetwork, POLICY_INPUT_SIZE,
};
pub use value::{
    load_value_function, load_value_function_from_str, LinearValue, NeuralValue, ValueFunction,
    WeightsError,
};
