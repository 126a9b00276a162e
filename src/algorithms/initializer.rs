use ndarray::Array2;
use rand::Rng;
use std::f32::consts::PI;

/// Standard deviation used for fresh embedding tables. Keeps initial dot
/// products close to zero.
pub const EMBEDDING_STD_DEV: f32 = 0.01;

/// Box-Muller sample from N(mean, std_dev²).
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f32, std_dev: f32) -> f32 {
    // gen() is in [0, 1); flip to (0, 1] so ln never sees zero
    let u1: f32 = 1.0 - rng.gen::<f32>();
    let u2: f32 = rng.gen();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    z0 * std_dev + mean
}

/// Embedding table of shape `(rows, cols)` drawn from N(0, EMBEDDING_STD_DEV²).
pub fn embedding_matrix<R: Rng + ?Sized>(rng: &mut R, rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |_| sample_normal(rng, 0.0, EMBEDDING_STD_DEV))
}
