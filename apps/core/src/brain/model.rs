//! Inference-only feed-forward network loaded from a JSON weights artifact.
//!
//! Artifact layout:
//!
//! ```json
//! {"layers": [{"weights": [[0.1, 0.2], ...], "bias": [0.0, 0.0], "activation": "relu"}]}
//! ```
//!
//! `weights` has one row per input and one column per output.

use std::sync::Mutex;

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::intent::IntentModel;
use super::vectorizer::FeatureVector;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Softmax,
    Sigmoid,
    Linear,
}

impl Activation {
    fn apply(&self, mut values: Array1<f32>) -> Array1<f32> {
        match self {
            Activation::Relu => {
                values.mapv_inplace(|x| x.max(0.0));
                values
            }
            Activation::Sigmoid => {
                values.mapv_inplace(sigmoid);
                values
            }
            Activation::Softmax => {
                let max = values.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
                values.mapv_inplace(|x| (x - max).exp());
                let sum = values.sum();
                if sum > 0.0 {
                    values /= sum;
                }
                values
            }
            Activation::Linear => values,
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1. / (1. + (-x).exp())
}

/// Serialized form of one dense layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    /// shape (inputs, outputs)
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

impl DenseLayer {
    fn from_spec(index: usize, spec: LayerSpec) -> Result<Self, AppError> {
        let inputs = spec.weights.len();
        let outputs = spec.bias.len();
        if inputs == 0 || outputs == 0 {
            return Err(AppError::Model(format!("layer {} has no weights", index)));
        }
        if let Some(row) = spec.weights.iter().position(|row| row.len() != outputs) {
            return Err(AppError::Model(format!(
                "layer {}: weight row {} has {} columns, bias has {}",
                index,
                row,
                spec.weights[row].len(),
                outputs
            )));
        }
        let flat: Vec<f32> = spec.weights.into_iter().flatten().collect();
        Ok(Self {
            weights: Array2::from_shape_vec((inputs, outputs), flat)?,
            bias: Array1::from(spec.bias),
            activation: spec.activation,
        })
    }

    fn forward(&self, input: &ArrayView1<f32>) -> Array1<f32> {
        let z = input.dot(&self.weights) + &self.bias;
        self.activation.apply(z)
    }
}

/// Stack of dense layers evaluated left to right.
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn from_spec(spec: NetworkSpec) -> Result<Self, AppError> {
        if spec.layers.is_empty() {
            return Err(AppError::Model("network has no layers".to_string()));
        }
        let layers = spec
            .layers
            .into_iter()
            .enumerate()
            .map(|(i, layer)| DenseLayer::from_spec(i, layer))
            .collect::<Result<Vec<_>, _>>()?;

        for (i, pair) in layers.windows(2).enumerate() {
            let produced = pair[0].weights.ncols();
            let expected = pair[1].weights.nrows();
            if produced != expected {
                return Err(AppError::Model(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i,
                    produced,
                    i + 1,
                    expected
                )));
            }
        }
        Ok(Self { layers })
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let spec: NetworkSpec = serde_json::from_str(json)
            .map_err(|e| AppError::Model(format!("invalid model artifact: {}", e)))?;
        Self::from_spec(spec)
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map(|l| l.weights.ncols()).unwrap_or(0)
    }

    pub fn forward(&self, input: &[f32]) -> Result<Array1<f32>, AppError> {
        if input.len() != self.input_width() {
            return Err(AppError::Model(format!(
                "network expects {} inputs, got {}",
                self.input_width(),
                input.len()
            )));
        }
        let mut activations = Array1::from(input.to_vec());
        for layer in &self.layers {
            activations = layer.forward(&activations.view());
        }
        Ok(activations)
    }
}

impl IntentModel for DenseNetwork {
    fn input_width(&self) -> usize {
        self.layers.first().map(|l| l.weights.nrows()).unwrap_or(0)
    }

    fn predict(&self, features: &FeatureVector) -> Result<Vec<f32>, AppError> {
        Ok(self.forward(&features.to_f32())?.to_vec())
    }
}

/// A model whose inference needs exclusive access, e.g. one that reuses
/// internal scratch buffers.
pub trait ExclusiveModel: Send {
    fn input_width(&self) -> usize;

    fn predict_mut(&mut self, features: &FeatureVector) -> Result<Vec<f32>, AppError>;
}

/// Shares an [`ExclusiveModel`] between concurrent callers by serializing
/// inference behind a mutex.
pub struct SerializedModel<M> {
    input_width: usize,
    inner: Mutex<M>,
}

impl<M: ExclusiveModel> SerializedModel<M> {
    pub fn new(model: M) -> Self {
        Self {
            input_width: model.input_width(),
            inner: Mutex::new(model),
        }
    }
}

impl<M: ExclusiveModel> IntentModel for SerializedModel<M> {
    fn input_width(&self) -> usize {
        self.input_width
    }

    fn predict(&self, features: &FeatureVector) -> Result<Vec<f32>, AppError> {
        let mut model = self
            .inner
            .lock()
            .map_err(|_| AppError::Model("model lock poisoned".to_string()))?;
        model.predict_mut(features)
    }
}
