//! Paired training data: validation, normalization, and partitioning.

use error::{Error, Result};
use matrix::Mat;

use rand;
use rand::Rng;

/// Per-column feature scaling parameters retained by `normalize`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    /// Column means of the unscaled inputs.
    pub mean: Vec<f64>,
    /// Column standard deviations of the unscaled inputs.
    pub std_dev: Vec<f64>,
}

/// A set of paired training examples: row `i` of `inputs` corresponds to
/// row `i` of `outputs`.
///
/// Construction validates the pairing (equal row counts, declared column
/// widths, no NaN values) so downstream code can assume it.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSet {
    inputs: Mat,
    outputs: Mat,
    name: Option<String>,
    scaling: Option<Scaling>,
}

impl TrainingSet {
    /// Builds a training set from separate input and output matrices.
    pub fn new(inputs: Mat, outputs: Mat) -> Result<Self> {
        if inputs.rows() != outputs.rows() {
            return Err(Error::Validation(format!(
                "input and output row counts differ: {} vs {}",
                inputs.rows(),
                outputs.rows()
            )));
        }
        let has_nan = inputs.as_slice().iter().any(|x| x.is_nan())
            || outputs.as_slice().iter().any(|x| x.is_nan());
        if has_nan {
            return Err(Error::Validation(
                "NaN values found in training data".to_string(),
            ));
        }
        Ok(TrainingSet {
            inputs: inputs,
            outputs: outputs,
            name: None,
            scaling: None,
        })
    }

    /// Builds a training set from one combined matrix whose first `n_in`
    /// columns are inputs and remaining `n_out` columns are outputs.
    pub fn from_combined(data: &Mat, n_in: usize, n_out: usize) -> Result<Self> {
        if data.cols() != n_in + n_out {
            return Err(Error::Validation(format!(
                "combined data has {} columns, expected {} inputs + {} \
                 outputs",
                data.cols(),
                n_in,
                n_out
            )));
        }
        let mut inputs = Mat::zeros(data.rows(), n_in);
        let mut outputs = Mat::zeros(data.rows(), n_out);
        for r in 0..data.rows() {
            let row = data.row(r);
            inputs.as_mut_slice()[r * n_in..(r + 1) * n_in]
                .copy_from_slice(&row[..n_in]);
            outputs.as_mut_slice()[r * n_out..(r + 1) * n_out]
                .copy_from_slice(&row[n_in..]);
        }
        TrainingSet::new(inputs, outputs)
    }

    /// Attaches a label, useful when partitioning into named subsets.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|name| name.as_str())
    }

    pub fn inputs(&self) -> &Mat {
        &self.inputs
    }

    pub fn outputs(&self) -> &Mat {
        &self.outputs
    }

    /// The number of paired examples.
    pub fn len(&self) -> usize {
        self.inputs.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The scaling parameters retained by `normalize`, if it was applied.
    pub fn scaling(&self) -> Option<&Scaling> {
        self.scaling.as_ref()
    }

    /// Scales each input column to quarter-standard-deviation units around
    /// its mean: `x := (x - mean) * 0.25 / std`. Constant columns are
    /// centered to zero without the division. The parameters are retained
    /// for inverse use.
    pub fn normalize(&mut self) {
        let m = self.inputs.rows() as f64;
        let cols = self.inputs.cols();
        let mut mean = vec![0.0; cols];
        let mut std_dev = vec![0.0; cols];
        for r in 0..self.inputs.rows() {
            for c in 0..cols {
                mean[c] += self.inputs.get(r, c);
            }
        }
        for c in 0..cols {
            mean[c] /= m;
        }
        for r in 0..self.inputs.rows() {
            for c in 0..cols {
                let d = self.inputs.get(r, c) - mean[c];
                std_dev[c] += d * d;
            }
        }
        for c in 0..cols {
            std_dev[c] = (std_dev[c] / m).sqrt();
        }
        for r in 0..self.inputs.rows() {
            for c in 0..cols {
                // A constant column has zero deviation; centering alone
                // zeroes it, and dividing would reintroduce NaN.
                let centered = self.inputs.get(r, c) - mean[c];
                let scaled = if std_dev[c] > 0.0 {
                    centered * 0.25 / std_dev[c]
                } else {
                    centered
                };
                self.inputs.set(r, c, scaled);
            }
        }
        self.scaling = Some(Scaling {
            mean: mean,
            std_dev: std_dev,
        });
    }

    /// Partitions the examples into named subsets using the thread-local
    /// generator for the shuffle. See `split_with`.
    pub fn split(
        &mut self,
        ratios: &[f64],
        names: &[&str],
        shuffle: bool,
    ) -> Result<Vec<TrainingSet>> {
        let mut rng = rand::thread_rng();
        self.split_with(&mut rng, ratios, names, shuffle)
    }

    /// Partitions the examples into disjoint, exhaustive subsets of
    /// proportional sizes.
    ///
    /// `ratios` must sum to 1.0. Each subset takes `floor(m * ratio)` rows
    /// except the last, which takes the remainder, so every row lands in
    /// exactly one subset. When `shuffle` is set the rows of this set are
    /// first permuted in place, with the same permutation applied to inputs
    /// and outputs so the pairing is preserved.
    pub fn split_with<R: Rng>(
        &mut self,
        rng: &mut R,
        ratios: &[f64],
        names: &[&str],
        shuffle: bool,
    ) -> Result<Vec<TrainingSet>> {
        if names.len() != ratios.len() {
            return Err(Error::Validation(format!(
                "{} ratios but {} subset names",
                ratios.len(),
                names.len()
            )));
        }
        let total: f64 = ratios.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(Error::Validation(format!(
                "subset ratios must sum to 1.0, got {}",
                total
            )));
        }

        let m = self.len();
        if shuffle {
            self.shuffle_rows(rng);
        }

        let mut sizes: Vec<usize> =
            ratios.iter().map(|r| (m as f64 * r) as usize).collect();
        let assigned: usize = sizes[..sizes.len() - 1].iter().sum();
        let last = sizes.len() - 1;
        sizes[last] = m - assigned;

        let mut subsets = Vec::with_capacity(ratios.len());
        let mut start = 0;
        for (size, name) in sizes.iter().zip(names) {
            let finish = start + size;
            let inputs = self.copy_rows(&self.inputs, start, finish);
            let outputs = self.copy_rows(&self.outputs, start, finish);
            subsets.push(TrainingSet::new(inputs, outputs)?.with_name(name));
            start = finish;
        }
        Ok(subsets)
    }

    /// Applies one random permutation to the rows of both matrices.
    fn shuffle_rows<R: Rng>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        rng.shuffle(&mut order);

        let mut inputs = Mat::zeros(self.inputs.rows(), self.inputs.cols());
        let mut outputs = Mat::zeros(self.outputs.rows(), self.outputs.cols());
        for (to, &from) in order.iter().enumerate() {
            let width = self.inputs.cols();
            inputs.as_mut_slice()[to * width..(to + 1) * width]
                .copy_from_slice(self.inputs.row(from));
            let width = self.outputs.cols();
            outputs.as_mut_slice()[to * width..(to + 1) * width]
                .copy_from_slice(self.outputs.row(from));
        }
        self.inputs = inputs;
        self.outputs = outputs;
    }

    fn copy_rows(&self, source: &Mat, start: usize, finish: usize) -> Mat {
        let width = source.cols();
        let mut out = Mat::zeros(finish - start, width);
        out.as_mut_slice()
            .copy_from_slice(&source.as_slice()[start * width..finish * width]);
        out
    }
}
