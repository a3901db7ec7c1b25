//! Recurrent sequence model
//!
//! Stacked leaky recurrent layers with fixed random weights read the lag window
//! one value at a time. Only the dense `tanh` readout on the final state is
//! trained, by mini-batch Adam with dropout and early stopping.

use crate::error::{ForecastError, Result};
use crate::models::{check_pair, ForecastModel, TrainedForecastModel};
use ndarray::{s, Array1, Array2, ArrayView2, Axis, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use trade_math::linalg::{rows_to_matrix, spectral_radius};
use trade_math::Activation;

const SPECTRAL_RADIUS: f64 = 0.9;
const LEAK_RATE: f64 = 0.5;
const POWER_ITERATIONS: usize = 100;
const PATIENCE: usize = 3;
const VALIDATION_FRACTION: f64 = 0.1;
const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-7;

/// Sequence model hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceParams {
    pub units: usize,
    /// Extra recurrent layers on top of the first one
    pub num_layers: usize,
    pub dropout_rate: f64,
    pub activation: Activation,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
}

impl fmt::Display for SequenceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sequence(units={}, layers={}, dropout={}, activation={}, lr={}, batch={}, epochs={})",
            self.units,
            self.num_layers + 1,
            self.dropout_rate,
            self.activation,
            self.learning_rate,
            self.batch_size,
            self.epochs
        )
    }
}

/// Candidate values for the sequence search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceGrid {
    pub activation: Vec<Activation>,
    pub batch_size: Vec<usize>,
    pub dropout_rate: Vec<f64>,
    pub epochs: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub num_layers: Vec<usize>,
    pub units: Vec<usize>,
}

impl Default for SequenceGrid {
    fn default() -> Self {
        Self {
            activation: vec![Activation::Relu, Activation::Tanh],
            batch_size: vec![1, 2],
            dropout_rate: vec![0.1],
            epochs: vec![10, 20, 30, 40],
            learning_rate: vec![0.1, 0.01, 0.001],
            num_layers: vec![0, 1, 2],
            units: vec![6, 12, 24, 36],
        }
    }
}

impl SequenceGrid {
    pub fn total_combinations(&self) -> usize {
        self.activation.len()
            * self.batch_size.len()
            * self.dropout_rate.len()
            * self.epochs.len()
            * self.learning_rate.len()
            * self.num_layers.len()
            * self.units.len()
    }

    /// Every combination; `activation` varies slowest and `units` fastest
    pub fn combinations(&self) -> Vec<SequenceParams> {
        let mut combos = Vec::with_capacity(self.total_combinations());
        for &activation in &self.activation {
            for &batch_size in &self.batch_size {
                for &dropout_rate in &self.dropout_rate {
                    for &epochs in &self.epochs {
                        for &learning_rate in &self.learning_rate {
                            for &num_layers in &self.num_layers {
                                for &units in &self.units {
                                    combos.push(SequenceParams {
                                        units,
                                        num_layers,
                                        dropout_rate,
                                        activation,
                                        learning_rate,
                                        batch_size,
                                        epochs,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        combos
    }
}

/// Leaky recurrent layer with fixed weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RecurrentLayer {
    input_weights: Array2<f64>,
    recurrent_weights: Array2<f64>,
    bias: Array1<f64>,
}

impl RecurrentLayer {
    fn random(rng: &mut StdRng, inputs: usize, units: usize) -> Self {
        let dist = Uniform::new(-1.0, 1.0);
        let input_weights = Array2::from_shape_fn((units, inputs), |_| dist.sample(&mut *rng));
        let mut recurrent_weights = Array2::from_shape_fn((units, units), |_| dist.sample(&mut *rng));
        let bias = Array1::from_shape_fn(units, |_| 0.1 * dist.sample(&mut *rng));

        let radius = spectral_radius(&recurrent_weights, POWER_ITERATIONS);
        if radius > 0.0 {
            recurrent_weights *= SPECTRAL_RADIUS / radius;
        }

        Self {
            input_weights,
            recurrent_weights,
            bias,
        }
    }

    /// State after every input of the sequence
    fn run(&self, inputs: &[Array1<f64>], activation: Activation) -> Vec<Array1<f64>> {
        let mut state = Array1::<f64>::zeros(self.bias.len());
        let mut states = Vec::with_capacity(inputs.len());
        for input in inputs {
            let pre = self.input_weights.dot(input) + self.recurrent_weights.dot(&state) + &self.bias;
            state = state * (1.0 - LEAK_RATE) + pre.mapv(|z| activation.apply(z)) * LEAK_RATE;
            states.push(state.clone());
        }
        states
    }
}

/// Dense `tanh` output layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Readout {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl Readout {
    fn forward(&self, state: &Array1<f64>) -> Array1<f64> {
        (self.weights.dot(state) + &self.bias).mapv(f64::tanh)
    }

    fn is_finite(&self) -> bool {
        self.weights.iter().chain(self.bias.iter()).all(|w| w.is_finite())
    }
}

/// Adam moment estimates for the readout
struct Adam {
    learning_rate: f64,
    step: i32,
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

impl Adam {
    fn new(learning_rate: f64, outputs: usize, units: usize) -> Self {
        Self {
            learning_rate,
            step: 0,
            m_w: Array2::zeros((outputs, units)),
            v_w: Array2::zeros((outputs, units)),
            m_b: Array1::zeros(outputs),
            v_b: Array1::zeros(outputs),
        }
    }

    fn apply(&mut self, readout: &mut Readout, grad_w: &Array2<f64>, grad_b: &Array1<f64>) {
        self.step += 1;
        let c1 = 1.0 - BETA1.powi(self.step);
        let c2 = 1.0 - BETA2.powi(self.step);
        let lr = self.learning_rate;
        let update = |param: &mut f64, &grad: &f64, m: &mut f64, v: &mut f64| {
            *m = BETA1 * *m + (1.0 - BETA1) * grad;
            *v = BETA2 * *v + (1.0 - BETA2) * grad * grad;
            *param -= lr * (*m / c1) / ((*v / c2).sqrt() + ADAM_EPSILON);
        };

        Zip::from(&mut readout.weights)
            .and(grad_w)
            .and(&mut self.m_w)
            .and(&mut self.v_w)
            .for_each(update);
        Zip::from(&mut readout.bias)
            .and(grad_b)
            .and(&mut self.m_b)
            .and(&mut self.v_b)
            .for_each(update);
    }
}

fn mean_squared(readout: &Readout, states: &[Array1<f64>], targets: ArrayView2<f64>) -> f64 {
    let count = targets.len().max(1) as f64;
    states
        .iter()
        .zip(targets.outer_iter())
        .map(|(s, t)| {
            let diff = readout.forward(s) - &t;
            diff.dot(&diff)
        })
        .sum::<f64>()
        / count
}

/// Unfitted sequence model
#[derive(Debug, Clone)]
pub struct SequenceModel {
    name: String,
    params: SequenceParams,
    seed: u64,
}

impl SequenceModel {
    pub fn new(params: SequenceParams, seed: u64) -> Result<Self> {
        if params.units == 0 || params.batch_size == 0 || params.epochs == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Units, batch size and epochs must be positive in {}",
                params
            )));
        }
        if !(0.0..1.0).contains(&params.dropout_rate) {
            return Err(ForecastError::InvalidParameter(format!(
                "Dropout rate must be in [0, 1), got {}",
                params.dropout_rate
            )));
        }
        if !(params.learning_rate > 0.0 && params.learning_rate.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "Learning rate must be positive, got {}",
                params.learning_rate
            )));
        }
        Ok(Self {
            name: params.to_string(),
            params,
            seed,
        })
    }

    pub fn params(&self) -> SequenceParams {
        self.params
    }
}

/// Sequence model with a trained readout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedSequenceModel {
    name: String,
    activation: Activation,
    layers: Vec<RecurrentLayer>,
    readout: Readout,
    lag: usize,
    horizon: usize,
}

fn final_state(layers: &[RecurrentLayer], activation: Activation, row: &[f64]) -> Array1<f64> {
    let mut sequence: Vec<Array1<f64>> = row.iter().map(|&v| Array1::from_elem(1, v)).collect();
    for layer in layers {
        sequence = layer.run(&sequence, activation);
    }
    sequence.pop().unwrap_or_else(|| Array1::zeros(0))
}

impl ForecastModel for SequenceModel {
    type Trained = TrainedSequenceModel;

    fn train(&self, x: &[Vec<f64>], y: &[Vec<f64>]) -> Result<Self::Trained> {
        check_pair(x, y)?;
        let p = self.params;
        let horizon = y[0].len();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut layers = Vec::with_capacity(p.num_layers + 1);
        layers.push(RecurrentLayer::random(&mut rng, 1, p.units));
        for _ in 0..p.num_layers {
            layers.push(RecurrentLayer::random(&mut rng, p.units, p.units));
        }

        let targets = rows_to_matrix(y)?;
        let states: Vec<Array1<f64>> = x
            .iter()
            .map(|row| final_state(&layers, p.activation, row))
            .collect();

        // Early stopping watches a held-out tail; a single row trains and
        // monitors on itself.
        let held_out = if states.len() >= 2 {
            ((states.len() as f64 * VALIDATION_FRACTION).ceil() as usize).max(1)
        } else {
            0
        };
        let fit_rows = states.len() - held_out;
        let (monitor_states, monitor_targets) = if held_out > 0 {
            (&states[fit_rows..], targets.slice(s![fit_rows.., ..]))
        } else {
            (&states[..], targets.view())
        };

        let limit = (6.0 / (p.units + horizon) as f64).sqrt();
        let init = Uniform::new(-limit, limit);
        let mut readout = Readout {
            weights: Array2::from_shape_fn((horizon, p.units), |_| init.sample(&mut rng)),
            bias: Array1::zeros(horizon),
        };
        let mut adam = Adam::new(p.learning_rate, horizon, p.units);
        let keep = 1.0 - p.dropout_rate;

        let mut best = readout.clone();
        let mut best_loss = f64::INFINITY;
        let mut stale = 0;
        let order: Vec<usize> = (0..fit_rows.max(1)).collect();

        for epoch in 0..p.epochs {
            for batch in order.chunks(p.batch_size) {
                let mut grad_w = Array2::<f64>::zeros((horizon, p.units));
                let mut grad_b = Array1::<f64>::zeros(horizon);
                for &i in batch {
                    let state = states[i].mapv(|s| if rng.gen::<f64>() < keep { s / keep } else { 0.0 });
                    let output = readout.forward(&state);
                    let delta = (&output - &targets.row(i))
                        * output.mapv(|o| 1.0 - o * o)
                        * (2.0 / horizon as f64);
                    let outer = delta
                        .view()
                        .insert_axis(Axis(1))
                        .dot(&state.view().insert_axis(Axis(0)));
                    grad_w += &outer;
                    grad_b += &delta;
                }
                let scale = 1.0 / batch.len() as f64;
                grad_w *= scale;
                grad_b *= scale;
                adam.apply(&mut readout, &grad_w, &grad_b);
            }

            let loss = mean_squared(&readout, monitor_states, monitor_targets.view());
            debug!(model = %self.name, epoch, loss, "sequence epoch");
            if loss < best_loss {
                best_loss = loss;
                best = readout.clone();
                stale = 0;
            } else {
                stale += 1;
                if stale >= PATIENCE {
                    break;
                }
            }
        }

        if !best.is_finite() {
            return Err(ForecastError::ModelError(format!(
                "{} diverged during training",
                self.name
            )));
        }

        Ok(TrainedSequenceModel {
            name: self.name.clone(),
            activation: p.activation,
            layers,
            readout: best,
            lag: x[0].len(),
            horizon,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedSequenceModel {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.lag {
                    return Err(ForecastError::InvalidParameter(format!(
                        "Expected rows of {} values, got {}",
                        self.lag,
                        row.len()
                    )));
                }
                let state = final_state(&self.layers, self.activation, row);
                Ok(self.readout.forward(&state).to_vec())
            })
            .collect()
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SequenceParams {
        SequenceParams {
            units: 6,
            num_layers: 1,
            dropout_rate: 0.1,
            activation: Activation::Tanh,
            learning_rate: 0.01,
            batch_size: 2,
            epochs: 10,
        }
    }

    fn pair() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let series: Vec<f64> = (0..60).map(|t| (t as f64 * 0.5).sin() * 0.8).collect();
        let x = (0..10).map(|i| series[i * 4..i * 4 + 12].to_vec()).collect();
        let y = (0..10).map(|i| series[i * 4 + 12..i * 4 + 24].to_vec()).collect();
        (x, y)
    }

    #[test]
    fn test_grid_size() {
        assert_eq!(SequenceGrid::default().total_combinations(), 576);
    }

    #[test]
    fn test_seeded_training_is_deterministic() {
        let (x, y) = pair();
        let a = SequenceModel::new(params(), 42).unwrap().train(&x, &y).unwrap();
        let b = SequenceModel::new(params(), 42).unwrap().train(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_outputs_stay_in_tanh_range() {
        let (x, y) = pair();
        let model = SequenceModel::new(params(), 7).unwrap().train(&x, &y).unwrap();
        let blocks = model.predict(&x).unwrap();
        assert_eq!(blocks.len(), x.len());
        assert!(blocks.iter().flatten().all(|v| v.abs() <= 1.0));
        assert_eq!(model.horizon(), 12);
    }

    #[test]
    fn test_invalid_dropout() {
        let mut p = params();
        p.dropout_rate = 1.0;
        assert!(SequenceModel::new(p, 42).is_err());
    }
}
