//! Linear policy head: one logit per action from the concatenated
//! state and action features, softmaxed into priors for the search.

use std::path::Path;

use serde_json::Value;

use crate::features::{NUM_ACTION_FEATURES, NUM_STATE_FEATURES};

use super::value::WeightsError;

pub const POLICY_INPUT_SIZE: usize = NUM_STATE_FEATURES + NUM_ACTION_FEATURES;

pub struct PolicyNetwork {
    /// 85 weights: state block first, action block after.
    weights: Vec<f32>,
    bias: f32,
    temperature: f32,
}

impl PolicyNetwork {
    pub fn new(mut weights: Vec<f32>, bias: f32, temperature: f32) -> Self {
        if weights.len() < POLICY_INPUT_SIZE {
            weights.resize(POLICY_INPUT_SIZE, 0.0);
        }
        PolicyNetwork {
            weights,
            bias,
            temperature,
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn set_temperature(&mut self, t: f32) {
        self.temperature = t;
    }

    /// Raw logit for one action in one state.
    pub fn evaluate_action(&self, state_features: &[f32], action_features: &[f32]) -> f32 {
        let mut logit = self.bias;
        for (i, &f) in state_features.iter().take(NUM_STATE_FEATURES).enumerate() {
            logit += self.weights[i] * f;
        }
        for (i, &f) in action_features.iter().take(NUM_ACTION_FEATURES).enumerate() {
            logit += self.weights[NUM_STATE_FEATURES + i] * f;
        }
        logit
    }

    /// Softmax priors over a packed feature batch
    /// (`num_actions * NUM_ACTION_FEATURES` floats).
    pub fn compute_priors(
        &self,
        state_features: &[f32],
        action_features: &[f32],
        num_actions: usize,
        out: &mut [f32],
    ) {
        if num_actions == 0 {
            return;
        }
        if num_actions == 1 {
            out[0] = 1.0;
            return;
        }

        let mut max_logit = f32::NEG_INFINITY;
        for i in 0..num_actions {
            let feats = &action_features[i * NUM_ACTION_FEATURES..(i + 1) * NUM_ACTION_FEATURES];
            out[i] = self.evaluate_action(state_features, feats) / self.temperature;
            if out[i] > max_logit {
                max_logit = out[i];
            }
        }

        let mut sum = 0.0;
        for p in out.iter_mut().take(num_actions) {
            *p = (*p - max_logit).exp();
            sum += *p;
        }

        if sum > 0.0 {
            for p in out.iter_mut().take(num_actions) {
                *p /= sum;
            }
        } else {
            let uniform = 1.0 / num_actions as f32;
            for p in out.iter_mut().take(num_actions) {
                *p = uniform;
            }
        }
    }
}

pub fn load_policy_network_from_str(json: &str) -> Result<PolicyNetwork, WeightsError> {
    let parsed: Value = serde_json::from_str(json)?;

    let weights = parsed
        .get("policy_weights")
        .and_then(|w| w.as_array())
        .ok_or_else(|| WeightsError::Format("missing policy_weights".into()))?
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect();

    let bias = parsed
        .get("policy_bias")
        .and_then(|b| b.as_f64())
        .unwrap_or(0.0) as f32;

    let temperature = parsed
        .get("policy_temperature")
        .and_then(|t| t.as_f64())
        .unwrap_or(1.0) as f32;

    Ok(PolicyNetwork::new(weights, bias, temperature))
}

pub fn load_policy_network(path: impl AsRef<Path>) -> Result<PolicyNetwork, WeightsError> {
    let content = std::fs::read_to_string(path)?;
    load_policy_network_from_str(&content)
}
