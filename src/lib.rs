//! A from-scratch [multi-layer perceptron]
//! (https://en.wikipedia.org/wiki/Multilayer_perceptron) engine.
//!
//! The crate builds a layered feedforward network over a single flat weight
//! vector, computes forward activations, evaluates a training objective
//! (mean-squared-error or logistic cross-entropy) with L2 regularization
//! together with its exact backpropagated gradient, and hands the pair to a
//! gradient-based minimizer through the `trainer::Minimizer` boundary.
//! `check::numerical_gradient` provides the finite-difference estimate used
//! to validate the analytic gradient.
//!
//! # Example
//!
//! Train a small network to compute a smoothed XOR function:
//!
//! ```
//! use perceptron::matrix::Mat;
//! use perceptron::network::{Network, Objective};
//! use perceptron::trainer::{self, GradientDescent, Logging, StopCondition};
//! use perceptron::training_set::TrainingSet;
//!
//! let inputs = Mat::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//! ]).unwrap();
//! let outputs = Mat::from_rows(&[
//!     vec![0.1], vec![0.9], vec![0.9], vec![0.1],
//! ]).unwrap();
//! let data = TrainingSet::new(inputs, outputs).unwrap();
//!
//! let mut network = Network::new(&[2, 2, 1], Objective::MeanSquaredError)
//!     .unwrap();
//! network.initialize_weights(0.5);
//!
//! let minimizer = GradientDescent::new()
//!     .learning_rate(3.0)
//!     .logging(Logging::Silent)
//!     .stop_condition(StopCondition::Iterations(100));
//! let cost = trainer::train(&mut network, &data, &minimizer, 1e-6).unwrap();
//! assert!(cost.is_finite());
//! ```

extern crate itertools;
extern crate rand;
extern crate rblas;
extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod activator;
pub mod check;
pub mod error;
pub mod layer;
pub mod matrix;
pub mod network;
pub mod trainer;
pub mod training_set;

pub use activator::Activator;
pub use error::{Error, Result};
pub use network::{Network, Objective};
pub use training_set::TrainingSet;
