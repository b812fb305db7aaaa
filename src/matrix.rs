//! Dense matrix storage and views.
//!
//! `Mat` owns its data; `MatView` and `MatViewMut` borrow a rectangular
//! block out of a flat buffer, which is how per-layer weight and gradient
//! blocks alias the network's single parameter vector. All three implement
//! `rblas::Matrix` so BLAS products operate on any mix of them.

use error::{Error, Result};

use rand;
use rand::distributions::IndependentSample;
use rblas::attribute::{Order, Transpose};
use rblas::matrix::ops::Gemm;
use rblas::Matrix;
use std::os::raw::c_int;

/// An owned, row-major matrix of `f64`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat {
    rows: usize,
    cols: usize,
    data: Vec<f64>, // row-major array
}

impl Mat {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Mat {
            rows: rows,
            cols: cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix by drawing every element from `distribution`.
    pub fn random<D>(distribution: D, rows: usize, cols: usize) -> Self
    where
        D: IndependentSample<f64>,
    {
        let mut rng = rand::thread_rng();
        let mut data = Vec::with_capacity(rows * cols);
        for _ in 0..(rows * cols) {
            data.push(distribution.ind_sample(&mut rng));
        }
        Mat {
            rows: rows,
            cols: cols,
            data: data,
        }
    }

    /// Wraps a row-major buffer of length `rows * cols`.
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::Shape(format!(
                "buffer of length {} cannot be shaped to {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Mat {
            rows: rows,
            cols: cols,
            data: data,
        })
    }

    /// Copies a sequence of equal-length rows into a matrix.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Shape("matrix must have at least one row".to_string()));
        }
        let width = rows[0].len();
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(Error::Shape(format!(
                    "ragged rows: expected width {}, found {}",
                    width,
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Mat {
            rows: rows.len(),
            cols: width,
            data: data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Returns a copy with a column of ones prepended to every row, the
    /// bias-unit convention used throughout the forward pass.
    pub fn bias_augmented(&self) -> Mat {
        let mut out = Mat::zeros(self.rows, self.cols + 1);
        for r in 0..self.rows {
            out.set(r, 0, 1.0);
            out.as_mut_slice()[r * (self.cols + 1) + 1..(r + 1) * (self.cols + 1)]
                .copy_from_slice(self.row(r));
        }
        out
    }

    /// Applies `f` elementwise, producing a new matrix.
    pub fn map<F>(&self, f: F) -> Mat
    where
        F: Fn(f64) -> f64,
    {
        Mat {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }
}

impl Matrix<f64> for Mat {
    fn rows(&self) -> c_int {
        self.rows as c_int
    }

    fn cols(&self) -> c_int {
        self.cols as c_int
    }

    fn as_ptr(&self) -> *const f64 {
        self.data.as_ptr()
    }

    fn as_mut_ptr(&mut self) -> *mut f64 {
        self.data.as_mut_ptr()
    }

    fn order(&self) -> Order {
        Order::RowMajor
    }
}

/// A read-only rectangular view over a flat buffer.
#[derive(Debug)]
pub struct MatView<'a> {
    rows: usize,
    cols: usize,
    data: &'a [f64],
}

impl<'a> MatView<'a> {
    pub fn new(data: &'a [f64], rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols);
        MatView {
            rows: rows,
            cols: cols,
            data: data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        self.data
    }

    /// Copies the view into an owned matrix.
    pub fn to_mat(&self) -> Mat {
        Mat {
            rows: self.rows,
            cols: self.cols,
            data: self.data.to_vec(),
        }
    }
}

impl<'a> Matrix<f64> for MatView<'a> {
    fn rows(&self) -> c_int {
        self.rows as c_int
    }

    fn cols(&self) -> c_int {
        self.cols as c_int
    }

    fn as_ptr(&self) -> *const f64 {
        self.data.as_ptr()
    }

    // Required by the trait; BLAS only reads through shared views, and this
    // method takes `&mut self`, which cannot be produced for one.
    fn as_mut_ptr(&mut self) -> *mut f64 {
        self.data.as_ptr() as *mut f64
    }

    fn order(&self) -> Order {
        Order::RowMajor
    }
}

/// A mutable rectangular view over a flat buffer.
#[derive(Debug)]
pub struct MatViewMut<'a> {
    rows: usize,
    cols: usize,
    data: &'a mut [f64],
}

impl<'a> MatViewMut<'a> {
    pub fn new(data: &'a mut [f64], rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols);
        MatViewMut {
            rows: rows,
            cols: cols,
            data: data,
        }
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }
}

impl<'a> Matrix<f64> for MatViewMut<'a> {
    fn rows(&self) -> c_int {
        self.rows as c_int
    }

    fn cols(&self) -> c_int {
        self.cols as c_int
    }

    fn as_ptr(&self) -> *const f64 {
        self.data.as_ptr()
    }

    fn as_mut_ptr(&mut self) -> *mut f64 {
        self.data.as_mut_ptr()
    }

    fn order(&self) -> Order {
        Order::RowMajor
    }
}

/// Computes `c = alpha * op(a) . op(b)`, overwriting `c`.
pub fn mat_mul<A, B, C>(
    alpha: f64,
    at: Transpose,
    a: &A,
    bt: Transpose,
    b: &B,
    c: &mut C,
) where
    A: Matrix<f64>,
    B: Matrix<f64>,
    C: Matrix<f64>,
{
    f64::gemm(&alpha, at, a, bt, b, &0.0, c);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rblas::attribute::Transpose;

    #[test]
    fn from_vec_rejects_bad_length() {
        assert!(Mat::from_vec(vec![1.0, 2.0, 3.0], 2, 2).is_err());
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(Mat::from_rows(&rows).is_err());
    }

    #[test]
    fn bias_augmented_prepends_ones() {
        let m = Mat::from_rows(&[vec![2.0, 3.0], vec![4.0, 5.0]]).unwrap();
        let a = m.bias_augmented();
        assert_eq!(a.rows(), 2);
        assert_eq!(a.cols(), 3);
        assert_eq!(a.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(a.row(1), &[1.0, 4.0, 5.0]);
    }

    #[test]
    fn mat_mul_no_transpose() {
        // (2x3) . (3x2)
        let a = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let b = Mat::from_vec(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], 3, 2).unwrap();
        let mut c = Mat::zeros(2, 2);
        mat_mul(1.0, Transpose::NoTrans, &a, Transpose::NoTrans, &b, &mut c);
        assert_eq!(c.row(0), &[58.0, 64.0]);
        assert_eq!(c.row(1), &[139.0, 154.0]);
    }

    #[test]
    fn mat_mul_with_second_operand_transposed() {
        // (2x3) . (2x3)^T
        let a = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let b = Mat::from_vec(vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0], 2, 3).unwrap();
        let mut c = Mat::zeros(2, 2);
        mat_mul(1.0, Transpose::NoTrans, &a, Transpose::Trans, &b, &mut c);
        assert_eq!(c.row(0), &[4.0, 2.0]);
        assert_eq!(c.row(1), &[10.0, 5.0]);
    }

    #[test]
    fn mat_mul_with_first_operand_transposed() {
        // (2x2)^T . (2x3)
        let a = Mat::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let b = Mat::from_vec(vec![1.0, 0.0, 2.0, 0.0, 1.0, 2.0], 2, 3).unwrap();
        let mut c = Mat::zeros(2, 3);
        mat_mul(1.0, Transpose::Trans, &a, Transpose::NoTrans, &b, &mut c);
        assert_eq!(c.row(0), &[1.0, 3.0, 8.0]);
        assert_eq!(c.row(1), &[2.0, 4.0, 12.0]);
    }

    #[test]
    fn random_draws_from_the_distribution() {
        use rand::distributions::Range;
        let m = Mat::random(Range::new(-0.1, 0.1), 4, 5);
        assert_eq!(m.rows(), 4);
        assert_eq!(m.cols(), 5);
        for &v in m.as_slice() {
            assert!(v > -0.1 && v < 0.1);
        }
    }

    #[test]
    fn views_alias_flat_storage() {
        let mut flat = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        {
            let mut view = MatViewMut::new(&mut flat[2..6], 2, 2);
            view.set(1, 0, 40.0);
        }
        assert_eq!(flat[4], 40.0);
        let view = MatView::new(&flat[2..6], 2, 2);
        assert_eq!(view.get(0, 1), 3.0);
    }
}
