//! A single network layer and its range into the flat weight vector.

use activator::Activator;
use error::{Error, Result};
use matrix::{MatView, MatViewMut};

use rblas::attribute::Transpose;
use rblas::matrix_vector::ops::Gemv;

/// The position and shape of one layer's weight block inside the network's
/// flat parameter vector.
///
/// Weights are stored layer-major, and row-major within a block: row `r` of
/// a block holds the incoming weights of node `r + 1` (node 0 is the bias
/// unit and has none). The same descriptor is used to carve up the weight
/// vector and the gradient vector, so the two layouts cannot diverge.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    offset: usize,
    rows: usize,
    cols: usize,
}

impl Block {
    pub fn new(offset: usize, rows: usize, cols: usize) -> Self {
        Block {
            offset: offset,
            rows: rows,
            cols: cols,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Borrows this block out of `flat` as a matrix.
    pub fn view<'a>(&self, flat: &'a [f64]) -> Result<MatView<'a>> {
        let end = self.offset + self.len();
        if end > flat.len() {
            return Err(Error::Shape(format!(
                "weight block [{}, {}) exceeds buffer of length {}",
                self.offset,
                end,
                flat.len()
            )));
        }
        Ok(MatView::new(&flat[self.offset..end], self.rows, self.cols))
    }

    /// Borrows this block out of `flat` as a mutable matrix.
    pub fn view_mut<'a>(&self, flat: &'a mut [f64]) -> Result<MatViewMut<'a>> {
        let end = self.offset + self.len();
        if end > flat.len() {
            return Err(Error::Shape(format!(
                "weight block [{}, {}) exceeds buffer of length {}",
                self.offset,
                end,
                flat.len()
            )));
        }
        Ok(MatViewMut::new(
            &mut flat[self.offset..end],
            self.rows,
            self.cols,
        ))
    }
}

/// One stage of the network: a node count, an activation function, the
/// layer's most recent outputs, and (for non-input layers) the range of the
/// flat weight vector feeding it.
///
/// `outputs[0]` is the fixed bias unit and holds 1.0 from construction
/// onwards; the real activations live in `outputs[1..]`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Layer {
    n_nodes: usize,
    activator: Activator,
    outputs: Vec<f64>,
    weights: Option<Block>,
}

impl Layer {
    /// Creates the input layer, which has no incoming weights.
    pub fn input(n_nodes: usize) -> Self {
        Layer::with_weights(n_nodes, Activator::Identity, None)
    }

    /// Creates a non-input layer fed by the given weight block.
    pub fn new(n_nodes: usize, activator: Activator, weights: Block) -> Self {
        Layer::with_weights(n_nodes, activator, Some(weights))
    }

    fn with_weights(
        n_nodes: usize,
        activator: Activator,
        weights: Option<Block>,
    ) -> Self {
        let mut outputs = vec![0.0; n_nodes + 1];
        outputs[0] = 1.0;
        Layer {
            n_nodes: n_nodes,
            activator: activator,
            outputs: outputs,
            weights: weights,
        }
    }

    /// The number of real (non-bias) nodes.
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// The width of the output vector, including the bias unit.
    pub fn n_outputs(&self) -> usize {
        self.n_nodes + 1
    }

    pub fn activator(&self) -> Activator {
        self.activator
    }

    /// The full output vector; index 0 is the bias unit.
    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    /// The activations written by the last forward pass (bias excluded).
    pub fn activations(&self) -> &[f64] {
        &self.outputs[1..]
    }

    pub(crate) fn activations_mut(&mut self) -> &mut [f64] {
        &mut self.outputs[1..]
    }

    /// This layer's weight block, or `None` for the input layer.
    pub fn weight_block(&self) -> Option<Block> {
        self.weights
    }

    /// Computes `outputs[1..] = activator(W . prev_outputs)`, where
    /// `prev_outputs` is the preceding layer's full (bias-included) output
    /// vector and `W` is this layer's block of `flat`.
    ///
    /// Fails with a configuration error on the input layer, which has no
    /// incoming weights to apply.
    pub fn compute_outputs(
        &mut self,
        prev_outputs: &[f64],
        flat: &[f64],
    ) -> Result<()> {
        let block = match self.weights {
            Some(ref block) => block,
            None => {
                return Err(Error::Configuration(
                    "layer has no inputs; outputs cannot be computed for \
                     the input layer"
                        .to_string(),
                ))
            }
        };
        let weights = block.view(flat)?;
        assert_eq!(prev_outputs.len(), block.cols());
        f64::gemv(
            Transpose::NoTrans,
            &1.0,
            &weights,
            prev_outputs,
            &0.0,
            &mut self.outputs[1..],
        );
        let activator = self.activator;
        for y in &mut self.outputs[1..] {
            *y = activator.f(*y);
        }
        Ok(())
    }
}
