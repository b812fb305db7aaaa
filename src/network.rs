//! The layered feedforward network: construction over a single flat weight
//! vector, forward propagation, and the two training objectives with their
//! exact gradients.
//!
//! # Example
//!
//! ```
//! use perceptron::network::{Network, Objective};
//!
//! let mut network = Network::new(&[2, 2, 1], Objective::MeanSquaredError)
//!     .unwrap();
//! assert_eq!(network.n_weights(), 9);
//!
//! // A hand-built XOR solution: hidden nodes compute OR and AND, the
//! // output node computes OR AND (NOT AND).
//! network
//!     .set_weights(&[-10.0, 20.0, 20.0, -30.0, 20.0, 20.0, -10.0, 20.0, -20.0])
//!     .unwrap();
//! let out = network.predict_one(&[1.0, 0.0], None).unwrap();
//! assert!(out[0] > 0.999);
//! let out = network.predict_one(&[1.0, 1.0], None).unwrap();
//! assert!(out[0] < 0.001);
//! ```

use activator::Activator;
use error::{Error, Result};
use layer::{Block, Layer};
use matrix::{mat_mul, Mat, MatView};

use itertools::multizip;
use rand;
use rand::distributions::{IndependentSample, Range};
use rand::Rng;
use rblas::attribute::Transpose;

/// The default half-width of the uniform weight initialization interval.
pub const DEFAULT_INIT_EPSILON: f64 = 0.12;

/// The training objective to minimize.
///
/// Both objectives share the same forward pass and the same backward
/// recursion; they differ only in the cost formula and in the error signal
/// seeded at the output layer.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Objective {
    /// `J = 0.5 * sum((A - y)^2) / m`. Suited to regression and function
    /// approximation.
    MeanSquaredError,
    /// Cross-entropy, `J = sum(-y*ln(A) - (1-y)*ln(1-A)) / m`. Only valid
    /// when targets lie in (0, 1) and the final activation maps into (0, 1);
    /// outside that domain the cost is infinite or undefined, by documented
    /// precondition rather than a checked error.
    Logistic,
}

impl Objective {
    /// The summed (not yet averaged) cost over a batch of predictions.
    fn total_cost(&self, predictions: &Mat, targets: &Mat) -> f64 {
        let pairs = predictions
            .as_slice()
            .iter()
            .zip(targets.as_slice().iter());
        match self {
            &Objective::MeanSquaredError => {
                let mut total = 0.0;
                for (&a, &y) in pairs {
                    let r = a - y;
                    total += r * r;
                }
                0.5 * total
            }
            &Objective::Logistic => {
                let mut total = 0.0;
                for (&a, &y) in pairs {
                    // Zero-coefficient terms are skipped, not evaluated, so
                    // exact 0.0/1.0 targets can never turn a saturated
                    // prediction into 0 * ln(0) = NaN. The cost may still be
                    // infinite.
                    if y != 0.0 {
                        total -= y * a.ln();
                    }
                    if y != 1.0 {
                        total -= (1.0 - y) * (1.0 - a).ln();
                    }
                }
                total
            }
        }
    }

    /// The error signal at the output layer, `D = d(mJ)/dZ`.
    ///
    /// For the logistic objective paired with a matching final activation
    /// this is exactly `A - y`; the cancellation of the activation
    /// derivative is by construction of the cost, not a shortcut.
    fn output_error(
        &self,
        predictions: &Mat,
        targets: &Mat,
        z: &Mat,
        activator: Activator,
    ) -> Mat {
        let mut d = Mat::zeros(predictions.rows(), predictions.cols());
        match self {
            &Objective::MeanSquaredError => {
                for (dv, &a, &y, &zv) in multizip((
                    d.as_mut_slice().iter_mut(),
                    predictions.as_slice().iter(),
                    targets.as_slice().iter(),
                    z.as_slice().iter(),
                )) {
                    *dv = (a - y) * activator.fprime(zv);
                }
            }
            &Objective::Logistic => {
                for (dv, &a, &y) in multizip((
                    d.as_mut_slice().iter_mut(),
                    predictions.as_slice().iter(),
                    targets.as_slice().iter(),
                )) {
                    *dv = a - y;
                }
            }
        }
        d
    }
}

/// Computes the weight block of every non-input layer, in layer order, and
/// the total parameter count.
///
/// This is the single source of truth for the flat layout: construction,
/// `weight_views`, and gradient assembly all carve buffers through the
/// blocks it returns.
fn weight_blocks(dimensions: &[usize]) -> (Vec<Block>, usize) {
    let mut blocks = Vec::with_capacity(dimensions.len() - 1);
    let mut offset = 0;
    for j in 1..dimensions.len() {
        let rows = dimensions[j];
        let cols = dimensions[j - 1] + 1;
        blocks.push(Block::new(offset, rows, cols));
        offset += rows * cols;
    }
    (blocks, offset)
}

/// Per-layer intermediates of one batched forward pass.
struct ForwardPass {
    /// Activations; `a[0]` is the bias-augmented input batch, hidden layers
    /// are bias-augmented, the final layer is not.
    a: Vec<Mat>,
    /// Pre-activations, one per non-input layer (`z[j - 1]` feeds layer `j`).
    z: Vec<Mat>,
}

/// A multi-layer perceptron over a single flat weight vector.
///
/// The network owns all parameters in one contiguous buffer; layers hold
/// `(offset, shape)` ranges into it. Network inputs and outputs are read
/// and written only through the bound accessors (`set_inputs`, `inputs`,
/// `outputs`), which go through the first and last layers' storage, so the
/// bindings themselves can never be replaced.
#[derive(Debug, Serialize, Deserialize)]
pub struct Network {
    dimensions: Vec<usize>,
    layers: Vec<Layer>,
    weights: Vec<f64>,
    n_weights: usize,
    objective: Objective,
}

impl Network {
    /// Creates a network with sigmoid activations on every non-input layer.
    ///
    /// `dimensions[0]` is the input width; every entry must be positive and
    /// there must be at least two.
    pub fn new(dimensions: &[usize], objective: Objective) -> Result<Self> {
        Network::uniform(dimensions, Activator::Sigmoid, objective)
    }

    /// Creates a network using `activator` for every non-input layer.
    pub fn uniform(
        dimensions: &[usize],
        activator: Activator,
        objective: Objective,
    ) -> Result<Self> {
        if dimensions.len() < 2 {
            return Err(Error::Configuration(format!(
                "a network needs at least 2 layers, got {}",
                dimensions.len()
            )));
        }
        let activators = vec![activator; dimensions.len() - 1];
        Network::with_activators(dimensions, &activators, objective)
    }

    /// Creates a network with one activation function per non-input layer.
    ///
    /// `activators` must hold exactly `dimensions.len() - 1` entries.
    pub fn with_activators(
        dimensions: &[usize],
        activators: &[Activator],
        objective: Objective,
    ) -> Result<Self> {
        if dimensions.len() < 2 {
            return Err(Error::Configuration(format!(
                "a network needs at least 2 layers, got {}",
                dimensions.len()
            )));
        }
        if dimensions.iter().any(|&d| d == 0) {
            return Err(Error::Configuration(
                "every layer needs at least one node".to_string(),
            ));
        }
        if activators.len() != dimensions.len() - 1 {
            return Err(Error::Configuration(format!(
                "expected {} activation functions (one per non-input \
                 layer), got {}",
                dimensions.len() - 1,
                activators.len()
            )));
        }

        // Two passes: size the flat buffer first, then hand each layer its
        // range of it.
        let (blocks, n_weights) = weight_blocks(dimensions);
        let mut layers = Vec::with_capacity(dimensions.len());
        layers.push(Layer::input(dimensions[0]));
        for j in 1..dimensions.len() {
            layers.push(Layer::new(
                dimensions[j],
                activators[j - 1],
                blocks[j - 1],
            ));
        }
        Ok(Network {
            dimensions: dimensions.to_vec(),
            layers: layers,
            weights: vec![0.0; n_weights],
            n_weights: n_weights,
            objective: objective,
        })
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn n_inputs(&self) -> usize {
        self.dimensions[0]
    }

    pub fn n_outputs(&self) -> usize {
        self.dimensions[self.dimensions.len() - 1]
    }

    pub fn n_weights(&self) -> usize {
        self.n_weights
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// The flat weight vector: layer-major, row-major within each layer's
    /// block.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Overwrites the flat weight vector.
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<()> {
        if weights.len() != self.n_weights {
            return Err(Error::Shape(format!(
                "expected {} weights, got {}",
                self.n_weights,
                weights.len()
            )));
        }
        self.weights.copy_from_slice(weights);
        Ok(())
    }

    /// Fills the weights with uniform values in `[-epsilon, epsilon]` from
    /// the thread-local generator. Use `initialize_weights_from` with a
    /// seeded generator for reproducible runs.
    pub fn initialize_weights(&mut self, epsilon: f64) {
        let mut rng = rand::thread_rng();
        self.initialize_weights_from(&mut rng, epsilon);
    }

    /// Fills the weights with uniform values in `[-epsilon, epsilon]`.
    pub fn initialize_weights_from<R: Rng>(&mut self, rng: &mut R, epsilon: f64) {
        assert!(epsilon > 0.0);
        let range = Range::new(-epsilon, epsilon);
        for w in &mut self.weights {
            *w = range.ind_sample(rng);
        }
    }

    /// The current network inputs (the input layer's activations).
    pub fn inputs(&self) -> &[f64] {
        self.layers[0].activations()
    }

    /// Writes the network inputs in place.
    pub fn set_inputs(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.n_inputs() {
            return Err(Error::Validation(format!(
                "expected {} input values, got {}",
                self.n_inputs(),
                values.len()
            )));
        }
        self.layers[0].activations_mut().copy_from_slice(values);
        Ok(())
    }

    /// The outputs written by the last `feed_forward` call.
    pub fn outputs(&self) -> &[f64] {
        self.layers[self.layers.len() - 1].activations()
    }

    /// Recomputes every non-input layer's outputs, in order, from the
    /// current inputs and stored weights. Read the result via `outputs()`.
    pub fn feed_forward(&mut self) -> Result<()> {
        for j in 1..self.layers.len() {
            let (before, after) = self.layers.split_at_mut(j);
            after[0].compute_outputs(before[j - 1].outputs(), &self.weights)?;
        }
        Ok(())
    }

    /// Borrows each layer's weight block out of `weights` (or the stored
    /// vector), in layer order; `None` for the input layer.
    pub fn weight_views<'a>(
        &'a self,
        weights: Option<&'a [f64]>,
    ) -> Result<Vec<Option<MatView<'a>>>> {
        let views = self.views(weights.unwrap_or(&self.weights))?;
        let mut out = Vec::with_capacity(self.layers.len());
        out.push(None);
        out.extend(views.into_iter().map(Some));
        Ok(out)
    }

    /// Views for the non-input layers only, shared by the forward and
    /// backward passes.
    fn views<'a>(&self, flat: &'a [f64]) -> Result<Vec<MatView<'a>>> {
        if flat.len() != self.n_weights {
            return Err(Error::Shape(format!(
                "expected a flat vector of {} weights, got {}",
                self.n_weights,
                flat.len()
            )));
        }
        let mut views = Vec::with_capacity(self.layers.len() - 1);
        for layer in &self.layers[1..] {
            match layer.weight_block() {
                Some(block) => views.push(block.view(flat)?),
                None => {
                    return Err(Error::Configuration(
                        "non-input layer is missing its weight block"
                            .to_string(),
                    ))
                }
            }
        }
        Ok(views)
    }

    /// Stateless batched prediction.
    ///
    /// Runs the forward pass over `inputs` (one example per row) using the
    /// supplied flat weight vector if given, else the stored weights.
    /// Neither the stored weights nor any layer's outputs are touched.
    pub fn predict(&self, inputs: &Mat, weights: Option<&[f64]>) -> Result<Mat> {
        if inputs.cols() != self.n_inputs() {
            return Err(Error::Validation(format!(
                "expected {} input columns, got {}",
                self.n_inputs(),
                inputs.cols()
            )));
        }
        let theta = self.views(weights.unwrap_or(&self.weights))?;
        let pass = self.forward_batch(inputs, &theta);
        let mut a = pass.a;
        Ok(a.pop().unwrap())
    }

    /// Stateless prediction for a single example.
    pub fn predict_one(
        &self,
        inputs: &[f64],
        weights: Option<&[f64]>,
    ) -> Result<Vec<f64>> {
        let batch = Mat::from_rows(&[inputs.to_vec()])?;
        let out = self.predict(&batch, weights)?;
        Ok(out.row(0).to_vec())
    }

    /// The objective cost over a batch, without the gradient.
    ///
    /// Numerically identical to the cost component of `cost_and_gradient`
    /// for the same arguments.
    pub fn cost(
        &self,
        inputs: &Mat,
        targets: &Mat,
        weights: Option<&[f64]>,
        lambda: f64,
    ) -> Result<f64> {
        self.validate_batch(inputs, targets)?;
        let theta = self.views(weights.unwrap_or(&self.weights))?;
        let pass = self.forward_batch(inputs, &theta);
        Ok(self.batch_cost(&pass, &theta, targets, lambda))
    }

    /// The objective cost over a batch together with its exact gradient,
    /// as a flat vector with the same layout as `weights()`.
    ///
    /// The backward recursion is derived from the stated cost formulas:
    /// with `D_j = d(mJ)/dZ_j`, the objectives differ only in the output
    /// seed (mean-squared-error keeps its activation-derivative factor,
    /// the logistic seed is plain `A - y`), and every hidden step applies
    /// that layer's own activation derivative at its own pre-activations:
    /// `D_j = (D_{j+1} . W_{j+1})[:, 1..] (*) g_j'(Z_j)`.
    pub fn cost_and_gradient(
        &self,
        inputs: &Mat,
        targets: &Mat,
        weights: Option<&[f64]>,
        lambda: f64,
    ) -> Result<(f64, Vec<f64>)> {
        self.validate_batch(inputs, targets)?;
        let theta = self.views(weights.unwrap_or(&self.weights))?;
        let pass = self.forward_batch(inputs, &theta);
        let cost = self.batch_cost(&pass, &theta, targets, lambda);

        let m = inputs.rows();
        let m_f = m as f64;
        let n_layers = self.layers.len();
        let mut grad = vec![0.0; self.n_weights];

        let mut d = self.objective.output_error(
            &pass.a[n_layers - 1],
            targets,
            &pass.z[n_layers - 2],
            self.layers[n_layers - 1].activator(),
        );

        for j in (1..n_layers).rev() {
            let block = match self.layers[j].weight_block() {
                Some(block) => block,
                None => {
                    return Err(Error::Configuration(
                        "non-input layer is missing its weight block"
                            .to_string(),
                    ))
                }
            };

            // grad_j = D_j^T . A_{j-1} / m, written straight into the flat
            // gradient through the same block ranges as the weights.
            {
                let mut gblock = block.view_mut(&mut grad)?;
                mat_mul(
                    1.0 / m_f,
                    Transpose::Trans,
                    &d,
                    Transpose::NoTrans,
                    &pass.a[j - 1],
                    &mut gblock,
                );
            }

            // L2 penalty gradient, skipping each block's bias column.
            if lambda != 0.0 {
                let w = &theta[j - 1];
                let start = block.offset();
                for r in 0..block.rows() {
                    for c in 1..block.cols() {
                        grad[start + r * block.cols() + c] +=
                            lambda / m_f * w.get(r, c);
                    }
                }
            }

            if j > 1 {
                // D_{j-1} = (D_j . W_j)[:, 1..] (*) g'(Z_{j-1}); the full
                // product is taken first and the bias column dropped in the
                // elementwise step.
                let w = &theta[j - 1];
                let mut e = Mat::zeros(m, block.cols());
                mat_mul(1.0, Transpose::NoTrans, &d, Transpose::NoTrans, w, &mut e);
                let z_prev = &pass.z[j - 2];
                let activator = self.layers[j - 1].activator();
                let n_prev = self.layers[j - 1].n_nodes();
                let mut d_prev = Mat::zeros(m, n_prev);
                for r in 0..m {
                    for k in 0..n_prev {
                        d_prev.set(
                            r,
                            k,
                            e.get(r, k + 1)
                                * activator.fprime(z_prev.get(r, k)),
                        );
                    }
                }
                d = d_prev;
            }
        }
        Ok((cost, grad))
    }

    /// Runs the shared batched forward pass, retaining per-layer
    /// activations and pre-activations.
    fn forward_batch(&self, inputs: &Mat, theta: &[MatView]) -> ForwardPass {
        let n_layers = self.layers.len();
        let m = inputs.rows();
        let mut a = Vec::with_capacity(n_layers);
        let mut z = Vec::with_capacity(n_layers - 1);
        a.push(inputs.bias_augmented());
        for j in 1..n_layers {
            // Z_j = A_{j-1} . W_j^T
            let mut zj = Mat::zeros(m, self.layers[j].n_nodes());
            mat_mul(
                1.0,
                Transpose::NoTrans,
                &a[j - 1],
                Transpose::Trans,
                &theta[j - 1],
                &mut zj,
            );
            let activator = self.layers[j].activator();
            let aj = zj.map(|v| activator.f(v));
            // Only hidden layers carry a bias column forward.
            a.push(if j == n_layers - 1 {
                aj
            } else {
                aj.bias_augmented()
            });
            z.push(zj);
        }
        ForwardPass { a: a, z: z }
    }

    fn batch_cost(
        &self,
        pass: &ForwardPass,
        theta: &[MatView],
        targets: &Mat,
        lambda: f64,
    ) -> f64 {
        let m = targets.rows() as f64;
        let predictions = &pass.a[self.layers.len() - 1];
        let mut cost = self.objective.total_cost(predictions, targets) / m;
        if lambda != 0.0 {
            let mut penalty = 0.0;
            for w in theta {
                for r in 0..w.rows() {
                    // Column 0 holds the bias weights, which are never
                    // regularized.
                    for c in 1..w.cols() {
                        let v = w.get(r, c);
                        penalty += v * v;
                    }
                }
            }
            cost += lambda * penalty / (2.0 * m);
        }
        cost
    }

    fn validate_batch(&self, inputs: &Mat, targets: &Mat) -> Result<()> {
        if inputs.cols() != self.n_inputs() {
            return Err(Error::Validation(format!(
                "expected {} input columns, got {}",
                self.n_inputs(),
                inputs.cols()
            )));
        }
        if targets.cols() != self.n_outputs() {
            return Err(Error::Validation(format!(
                "expected {} output columns, got {}",
                self.n_outputs(),
                targets.cols()
            )));
        }
        if inputs.rows() != targets.rows() {
            return Err(Error::Validation(format!(
                "input and output row counts differ: {} vs {}",
                inputs.rows(),
                targets.rows()
            )));
        }
        Ok(())
    }
}
