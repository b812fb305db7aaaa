//! Finite-difference verification of analytic gradients.
//!
//! Backpropagation bugs produce gradients that are plausibly scaled but
//! subtly wrong; the only reliable defense is comparing against a central
//! finite-difference estimate. These checks are O(n) full objective
//! evaluations for n weights, so they are for validation runs, not
//! training.

use error::Result;
use matrix::Mat;
use network::Network;

/// The default perturbation size. The expected relative difference bounds
/// quoted below assume this value.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// Parameter counts above this trigger a cost warning (the check still
/// runs).
const WARN_THRESHOLD: usize = 512;

/// Anything a cost closure may return: a bare cost, or a (cost, gradient)
/// pair whose gradient is ignored.
pub trait CostValue {
    fn cost(&self) -> f64;
}

impl CostValue for f64 {
    fn cost(&self) -> f64 {
        *self
    }
}

impl CostValue for (f64, Vec<f64>) {
    fn cost(&self) -> f64 {
        self.0
    }
}

/// Estimates the gradient of `f` at `theta` by central differences:
/// `numgrad[i] = (f(theta + e_i * epsilon) - f(theta - e_i * epsilon))
/// / (2 * epsilon)`, perturbing one index at a time.
pub fn numerical_gradient<F, C>(mut f: F, theta: &[f64], epsilon: f64) -> Vec<f64>
where
    F: FnMut(&[f64]) -> C,
    C: CostValue,
{
    if theta.len() > WARN_THRESHOLD {
        println!(
            "Warning: estimating the numerical gradient of {} weights \
             takes {} objective evaluations and may be slow.",
            theta.len(),
            2 * theta.len()
        );
    }
    let mut perturbed = theta.to_vec();
    let mut numgrad = vec![0.0; theta.len()];
    for i in 0..theta.len() {
        perturbed[i] = theta[i] + epsilon;
        let above = f(&perturbed).cost();
        perturbed[i] = theta[i] - epsilon;
        let below = f(&perturbed).cost();
        perturbed[i] = theta[i];
        numgrad[i] = (above - below) / (2.0 * epsilon);
    }
    numgrad
}

/// The relative difference norm `||a - b|| / ||a + b||` used to compare a
/// numerical and an analytic gradient. A correct backpropagation
/// implementation checked at the default epsilon lands below 1e-9.
pub fn relative_difference(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    let mut diff = 0.0;
    let mut total = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        diff += (x - y) * (x - y);
        total += (x + y) * (x + y);
    }
    diff.sqrt() / total.sqrt()
}

/// Compares the network's analytic gradient on `(inputs, targets)` against
/// the finite-difference estimate at the current weights, returning the
/// relative difference norm.
pub fn check_gradients(
    network: &Network,
    inputs: &Mat,
    targets: &Mat,
    lambda: f64,
) -> Result<f64> {
    let (_, analytic) =
        network.cost_and_gradient(inputs, targets, None, lambda)?;
    // Validated by the call above; perturbed evaluations cannot fail for a
    // new reason, so the closure only surfaces the cost.
    let numeric = numerical_gradient(
        |weights| match network.cost(inputs, targets, Some(weights), lambda) {
            Ok(cost) => cost,
            Err(_) => ::std::f64::NAN,
        },
        network.weights(),
        DEFAULT_EPSILON,
    );
    Ok(relative_difference(&numeric, &analytic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use activator::Activator;
    use matrix::Mat;
    use network::{Network, Objective};
    use rand::{SeedableRng, StdRng};

    #[test]
    fn numerical_gradient_of_quadratic() {
        // f(theta) = sum(theta^2), gradient 2 * theta.
        let theta = [1.0, -2.0, 0.5];
        let numgrad = numerical_gradient(
            |t: &[f64]| t.iter().map(|x| x * x).sum::<f64>(),
            &theta,
            DEFAULT_EPSILON,
        );
        for (n, t) in numgrad.iter().zip(&theta) {
            assert!((n - 2.0 * t).abs() < 1e-8);
        }
    }

    #[test]
    fn accepts_cost_gradient_pairs() {
        let numgrad = numerical_gradient(
            |t: &[f64]| (t[0] * t[0], vec![0.0]),
            &[3.0],
            DEFAULT_EPSILON,
        );
        assert!((numgrad[0] - 6.0).abs() < 1e-8);
    }

    fn xor_style_data() -> (Mat, Mat) {
        let inputs = Mat::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ]).unwrap();
        let targets = Mat::from_rows(&[
            vec![0.1],
            vec![0.9],
            vec![0.9],
            vec![0.1],
        ]).unwrap();
        (inputs, targets)
    }

    fn assert_gradients_check(network: &mut Network, lambda: f64) {
        let (inputs, targets) = xor_style_data();
        for seed in &[1usize, 2, 3] {
            let mut rng: StdRng = SeedableRng::from_seed(&[*seed][..]);
            network.initialize_weights_from(&mut rng, 0.5);
            let diff =
                check_gradients(network, &inputs, &targets, lambda).unwrap();
            assert!(
                diff < 1e-6,
                "relative difference {} too large for seed {}",
                diff,
                seed
            );
        }
    }

    #[test]
    fn backprop_matches_finite_differences_for_mse() {
        let mut network =
            Network::new(&[2, 2, 1], Objective::MeanSquaredError).unwrap();
        assert_gradients_check(&mut network, 0.0);
    }

    #[test]
    fn backprop_matches_finite_differences_for_logistic() {
        let mut network =
            Network::new(&[2, 2, 1], Objective::Logistic).unwrap();
        assert_gradients_check(&mut network, 0.0);
    }

    #[test]
    fn backprop_handles_regularization() {
        let mut network =
            Network::new(&[2, 2, 1], Objective::MeanSquaredError).unwrap();
        assert_gradients_check(&mut network, 0.3);
    }

    #[test]
    fn backprop_handles_mixed_activations() {
        // Distinct hidden and output activations expose any confusion about
        // which layer's derivative applies at which pre-activations.
        let mut network = Network::with_activators(
            &[2, 3, 2, 1],
            &[Activator::ArcTan, Activator::TanH, Activator::Sigmoid],
            Objective::MeanSquaredError,
        ).unwrap();
        assert_gradients_check(&mut network, 0.1);
    }

    #[test]
    fn backprop_handles_deep_logistic_networks() {
        let mut network = Network::with_activators(
            &[2, 4, 3, 1],
            &[Activator::TanH, Activator::ArcTan, Activator::Sigmoid],
            Objective::Logistic,
        ).unwrap();
        assert_gradients_check(&mut network, 0.05);
    }
}
