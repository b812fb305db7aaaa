//! Training glue: the external-optimizer boundary and a simple provided
//! minimizer.
//!
//! The network side of the contract is a closure `(weights) -> (cost,
//! gradient)` plus an initial vector; any gradient-based optimizer that
//! honors it can implement `Minimizer`. `GradientDescent` is the batch
//! steepest-descent minimizer provided with the crate.

use error::{Error, Result};
use network::Network;
use training_set::TrainingSet;

use std::time::{Duration, Instant};

/// A black-box gradient-based optimizer.
///
/// Given an objective returning `(cost, gradient)` and an initial vector,
/// returns an improved vector of identical length. Errors from the
/// objective must be propagated, not swallowed.
pub trait Minimizer {
    fn minimize<F>(&self, objective: F, initial: Vec<f64>) -> Result<Vec<f64>>
    where
        F: FnMut(&[f64]) -> Result<(f64, Vec<f64>)>;
}

/// Trains `network` on `data` by handing its objective and current weights
/// to `minimizer`, then writes the result back into the network.
///
/// Returns the final cost at the optimized weights.
pub fn train<M: Minimizer>(
    network: &mut Network,
    data: &TrainingSet,
    minimizer: &M,
    lambda: f64,
) -> Result<f64> {
    if data.inputs().cols() != network.n_inputs()
        || data.outputs().cols() != network.n_outputs()
    {
        return Err(Error::Validation(format!(
            "training data is {}-in/{}-out but the network is {}-in/{}-out",
            data.inputs().cols(),
            data.outputs().cols(),
            network.n_inputs(),
            network.n_outputs()
        )));
    }

    let initial = network.weights().to_vec();
    let optimized = {
        let objective = |weights: &[f64]| {
            network.cost_and_gradient(
                data.inputs(),
                data.outputs(),
                Some(weights),
                lambda,
            )
        };
        minimizer.minimize(objective, initial)?
    };
    network.set_weights(&optimized)?;
    network.cost(data.inputs(), data.outputs(), None, lambda)
}

/// Logging frequency to use during training
#[derive(Copy, Clone, Debug)]
pub enum Logging {
    /// No logs will be printed
    Silent,
    /// A summary will be printed at completion
    Completion,
    /// A summary will be printed after every `n` iterations
    Iterations(usize),
}

impl Logging {
    /// Performs logging at the current `iteration` of training.
    fn iteration(&self, iteration: usize, cost: f64) {
        use self::Logging::*;
        if let &Iterations(freq) = self {
            if freq > 0 && iteration % freq == 0 {
                println!("Iteration {}:\tcost={}", iteration, cost);
            }
        }
    }

    /// Performs logging at the end of training.
    fn completion(&self, iterations: usize, cost: f64, start_time: Instant) {
        if let &Logging::Silent = self {
            return;
        }
        println!(
            "Ran {} iterations in {} seconds.",
            iterations,
            start_time.elapsed().as_secs()
        );
        println!("Final cost: {}", cost);
    }
}

/// When to stop minimizing
#[derive(Copy, Clone, Debug)]
pub enum StopCondition {
    /// Stops after the provided number of iterations
    Iterations(usize),
    /// Stops when the cost drops below the provided threshold
    CostThreshold(f64),
    /// Stops after the provided duration
    Duration(Duration),
}

impl From<Duration> for StopCondition {
    fn from(duration: Duration) -> StopCondition {
        StopCondition::Duration(duration)
    }
}

impl StopCondition {
    /// Returns true when minimization is complete.
    fn should_stop(&self, iteration: usize, cost: f64, start_time: Instant) -> bool {
        use self::StopCondition::*;
        match self {
            &Iterations(iterations) => iteration >= iterations,
            &CostThreshold(threshold) => cost < threshold,
            &Duration(duration) => start_time.elapsed() > duration,
        }
    }
}

/// Full-batch steepest descent.
///
/// Serviceable for small problems and demos; anything serious should bring
/// a real minimizer through the `Minimizer` trait.
#[derive(Debug)]
pub struct GradientDescent {
    learning_rate: f64,
    logging: Logging,
    stop_condition: StopCondition,
}

impl GradientDescent {
    /// Creates a new minimizer with some default values. These defaults
    /// are:
    ///
    /// * A learning rate of 0.1.
    /// * Stops after 1000 iterations.
    /// * Logs on completion.
    pub fn new() -> Self {
        GradientDescent {
            learning_rate: 0.1,
            logging: Logging::Completion,
            stop_condition: StopCondition::Iterations(1000),
        }
    }

    /// Sets the step size used along the negative gradient.
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Sets the type of logging to be emitted while minimizing.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Sets the condition to finish minimizing.
    pub fn stop_condition<C>(mut self, condition: C) -> Self
    where
        C: Into<StopCondition>,
    {
        self.stop_condition = condition.into();
        self
    }
}

impl Minimizer for GradientDescent {
    fn minimize<F>(&self, mut objective: F, initial: Vec<f64>) -> Result<Vec<f64>>
    where
        F: FnMut(&[f64]) -> Result<(f64, Vec<f64>)>,
    {
        let mut weights = initial;
        let start_time = Instant::now();
        let mut iteration = 0;
        loop {
            let (cost, gradient) = objective(&weights)?;
            for (w, g) in weights.iter_mut().zip(&gradient) {
                *w -= self.learning_rate * g;
            }
            iteration += 1;

            self.logging.iteration(iteration, cost);
            if self
                .stop_condition
                .should_stop(iteration, cost, start_time)
            {
                self.logging.completion(iteration, cost, start_time);
                return Ok(weights);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::Error;
    use matrix::Mat;
    use network::{Network, Objective};
    use training_set::TrainingSet;

    fn xor_data() -> TrainingSet {
        let inputs = Mat::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ]).unwrap();
        let outputs = Mat::from_rows(&[
            vec![0.1],
            vec![0.9],
            vec![0.9],
            vec![0.1],
        ]).unwrap();
        TrainingSet::new(inputs, outputs).unwrap()
    }

    #[test]
    fn minimizes_a_quadratic_bowl() {
        // f(w) = sum((w - 3)^2): unique minimum at w = 3.
        let minimizer = GradientDescent::new()
            .learning_rate(0.2)
            .logging(Logging::Silent)
            .stop_condition(StopCondition::Iterations(200));
        let result = minimizer
            .minimize(
                |w| {
                    let cost = w.iter().map(|x| (x - 3.0) * (x - 3.0)).sum();
                    let gradient = w.iter().map(|x| 2.0 * (x - 3.0)).collect();
                    Ok((cost, gradient))
                },
                vec![0.0, 10.0],
            )
            .unwrap();
        assert!((result[0] - 3.0).abs() < 1e-6);
        assert!((result[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_mismatched_training_data() {
        let mut network =
            Network::new(&[3, 2, 2], Objective::MeanSquaredError).unwrap();
        let minimizer = GradientDescent::new().logging(Logging::Silent);
        match train(&mut network, &xor_data(), &minimizer, 0.0) {
            Err(Error::Validation(_)) => {}
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn learns_xor() {
        let data = xor_data();
        let minimizer = GradientDescent::new()
            .learning_rate(3.0)
            .logging(Logging::Silent)
            .stop_condition(StopCondition::Iterations(20_000));

        // Steepest descent on XOR occasionally stalls in a symmetric local
        // minimum, so allow a few fresh initializations.
        let mut best = ::std::f64::INFINITY;
        for _ in 0..5 {
            let mut network =
                Network::new(&[2, 2, 1], Objective::MeanSquaredError)
                    .unwrap();
            network.initialize_weights(0.5);
            let cost = train(&mut network, &data, &minimizer, 1e-6).unwrap();
            if cost < best {
                best = cost;
            }
            // Well under the 0.01 success threshold, so each of the four
            // predictions is individually close as well.
            if cost < 0.005 {
                for r in 0..4 {
                    let input = data.inputs().row(r).to_vec();
                    let expected = data.outputs().get(r, 0);
                    let out = network.predict_one(&input, None).unwrap();
                    assert!(
                        (out[0] - expected).abs() < 0.1,
                        "prediction {} too far from {}",
                        out[0],
                        expected
                    );
                }
                return;
            }
        }
        panic!("failed to learn XOR in 5 attempts; best cost {}", best);
    }
}
