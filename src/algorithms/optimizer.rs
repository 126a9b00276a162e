use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

/// Update rule for one dense parameter table. Each table gets its own
/// optimizer instance so moment estimates never mix.
pub trait Optimizer: Send + Sync {
    fn step(&mut self, params: &mut Array2<f32>, gradients: &Array2<f32>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    Adam,
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f64) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Sgd => Box::new(SGD::new(learning_rate)),
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate, 0.9, 0.999, 1e-8)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SGD {
    learning_rate: f64,
}

impl SGD {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut Array2<f32>, gradients: &Array2<f32>) {
        params.scaled_add(-(self.learning_rate as f32), gradients);
    }
}

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
    m: Option<Array2<f32>>,
    v: Option<Array2<f32>>,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: None,
            v: None,
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut Array2<f32>, gradients: &Array2<f32>) {
        self.t += 1;

        let beta1 = self.beta1 as f32;
        let beta2 = self.beta2 as f32;
        let lr = self.learning_rate as f32;
        let eps = self.epsilon as f32;
        let bias1 = 1.0 - beta1.powi(self.t);
        let bias2 = 1.0 - beta2.powi(self.t);

        let m = self.m.get_or_insert_with(|| Array2::zeros(params.raw_dim()));
        let v = self.v.get_or_insert_with(|| Array2::zeros(params.raw_dim()));

        Zip::from(params)
            .and(m)
            .and(v)
            .and(gradients)
            .for_each(|p, m, v, &g| {
                // Biased first and second moment estimates
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;

                let m_hat = *m / bias1;
                let v_hat = *v / bias2;
                *p -= lr * m_hat / (v_hat.sqrt() + eps);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sgd_step() {
        let mut sgd = SGD::new(0.1);
        let mut params = array![[1.0, 2.0], [3.0, 4.0]];
        let grads = array![[1.0, 0.0], [0.0, -2.0]];

        sgd.step(&mut params, &grads);

        assert!((params[[0, 0]] - 0.9).abs() < 1e-6);
        assert_eq!(params[[0, 1]], 2.0);
        assert!((params[[1, 1]] - 4.2).abs() < 1e-6);
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(0.01, 0.9, 0.999, 1e-8);
        let mut params = array![[1.0, 1.0]];
        let grads = array![[0.5, -3.0]];

        adam.step(&mut params, &grads);

        // First bias-corrected step is lr * sign(g)
        assert!((params[[0, 0]] - 0.99).abs() < 1e-5);
        assert!((params[[0, 1]] - 1.01).abs() < 1e-5);
    }

    #[test]
    fn test_adam_zero_gradient_leaves_fresh_params() {
        let mut adam = OptimizerKind::Adam.build(0.001);
        let mut params = array![[0.3, -0.7]];
        adam.step(&mut params, &Array2::zeros((1, 2)));
        assert_eq!(params, array![[0.3, -0.7]]);
    }

    #[test]
    fn test_kind_deserializes_lowercase() {
        let kind: OptimizerKind = serde_json::from_str("\"sgd\"").unwrap();
        assert_eq!(kind, OptimizerKind::Sgd);
    }
}
