//! Leaf evaluation: a linear model or a small one-hidden-layer net over
//! the 70-float state vector, loaded from JSON weight files. The format
//! is auto-detected: a bare array is linear, objects carry a `type` tag.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed weights json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unrecognized weights format: {0}")]
    Format(String),
}

pub trait ValueFunction {
    fn evaluate(&self, features: &[f32]) -> f32;
}

/// Plain dot product over the feature vector.
pub struct LinearValue {
    weights: Vec<f32>,
}

impl LinearValue {
    pub fn new(weights: Vec<f32>) -> Self {
        LinearValue { weights }
    }
}

impl ValueFunction for LinearValue {
    fn evaluate(&self, features: &[f32]) -> f32 {
        self.weights
            .iter()
            .zip(features.iter())
            .map(|(w, f)| w * f)
            .sum()
    }
}

/// One hidden ReLU layer, tanh output.
pub struct NeuralValue {
    input_size: usize,
    hidden_size: usize,
    /// Row-major: `w1[input][hidden]`.
    w1: Vec<Vec<f32>>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: f32,
}

impl NeuralValue {
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        w1: Vec<Vec<f32>>,
        b1: Vec<f32>,
        w2: Vec<f32>,
        b2: f32,
    ) -> Self {
        NeuralValue {
            input_size,
            hidden_size,
            w1,
            b1,
            w2,
            b2,
        }
    }
}

impl ValueFunction for NeuralValue {
    fn evaluate(&self, features: &[f32]) -> f32 {
        let in_size = features.len().min(self.input_size);

        let mut out = self.b2;
        for j in 0..self.hidden_size {
            let mut sum = self.b1[j];
            for (i, &f) in features.iter().enumerate().take(in_size) {
                sum += f * self.w1[i][j];
            }
            let hidden = sum.max(0.0);
            out += hidden * self.w2[j];
        }
        out.tanh()
    }
}

fn parse_f32(v: &Value) -> f32 {
    v.as_f64().unwrap_or(0.0) as f32
}

fn parse_f32_array(v: &Value) -> Vec<f32> {
    v.as_array()
        .map(|a| a.iter().map(parse_f32).collect())
        .unwrap_or_default()
}

fn parse_neural(
    json: &Value,
    w1_key: &str,
    b1_key: &str,
    w2_key: &str,
    b2_key: &str,
) -> Result<Box<dyn ValueFunction + Send + Sync>, WeightsError> {
    let hidden_size = json["hidden_size"]
        .as_u64()
        .ok_or_else(|| WeightsError::Format("missing hidden_size".into()))?
        as usize;

    let w1_json = json[w1_key]
        .as_array()
        .ok_or_else(|| WeightsError::Format(format!("missing {}", w1_key)))?;
    let input_size = w1_json.len();
    let w1: Vec<Vec<f32>> = w1_json.iter().map(parse_f32_array).collect();

    let b1 = parse_f32_array(&json[b1_key]);
    if b1.len() != hidden_size {
        return Err(WeightsError::Format(format!("bad {} length", b1_key)));
    }

    // W2 rows may arrive as single-element arrays.
    let w2: Vec<f32> = json[w2_key]
        .as_array()
        .ok_or_else(|| WeightsError::Format(format!("missing {}", w2_key)))?
        .iter()
        .map(|row| match row {
            Value::Array(inner) => inner.first().map(parse_f32).unwrap_or(0.0),
            other => parse_f32(other),
        })
        .collect();

    let b2 = match &json[b2_key] {
        Value::Array(inner) => inner.first().map(parse_f32).unwrap_or(0.0),
        other => parse_f32(other),
    };

    Ok(Box::new(NeuralValue::new(
        input_size,
        hidden_size,
        w1,
        b1,
        w2,
        b2,
    )))
}

fn parse_value_json(json: &Value) -> Result<Box<dyn ValueFunction + Send + Sync>, WeightsError> {
    if let Some(obj) = json.as_object() {
        let kind = obj.get("type").and_then(|t| t.as_str()).unwrap_or("");

        if kind == "alphazero_linear" {
            if let Some(vw) = obj.get("value_weights") {
                return Ok(Box::new(LinearValue::new(parse_f32_array(vw))));
            }
        }
        if kind == "alphazero_neural" && obj.contains_key("value_W1") {
            return parse_neural(json, "value_W1", "value_b1", "value_W2", "value_b2");
        }
        if kind == "neural" {
            return parse_neural(json, "W1", "b1", "W2", "b2");
        }
        return Err(WeightsError::Format(format!(
            "unknown value function type: {:?}",
            kind
        )));
    }

    if json.is_array() {
        return Ok(Box::new(LinearValue::new(parse_f32_array(json))));
    }

    Err(WeightsError::Format("expected object or array".into()))
}

pub fn load_value_function(
    path: impl AsRef<Path>,
) -> Result<Box<dyn ValueFunction + Send + Sync>, WeightsError> {
    let content = std::fs::read_to_string(path)?;
    load_value_function_from_str(&content)
}

pub fn load_value_function_from_str(
    json: &str,
) -> Result<Box<dyn ValueFunction + Send + Sync>, WeightsError> {
    let parsed: Value = serde_json::from_str(json)?;
    parse_value_json(&parsed)
}
