//! Dense matrix operations
//!
//! Row-major dense matrix representation with the big-integer kernels the
//! lifting engine needs: multiply, accumulate, column-block read/write and
//! modular reduction.

use crate::error::{DpolError, Result};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Dense matrix in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Clone> Matrix<T> {
    /// Create a matrix from a flat vector (row-major order)
    pub fn from_flat(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(DpolError::DimensionMismatch {
                context: "Matrix::from_flat",
                expected: format!("{} entries", rows * cols),
                actual: format!("{} entries", data.len()),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Create a matrix from a list of equally sized rows
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != ncols {
                return Err(DpolError::DimensionMismatch {
                    context: "Matrix::from_rows",
                    expected: format!("{} columns", ncols),
                    actual: format!("{} columns in row {}", row.len(), i),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: nrows,
            cols: ncols,
        })
    }

    /// Get matrix dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Get number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Get number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Access element at (i, j)
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[i * self.cols + j]
    }

    /// Mutable access to element at (i, j)
    pub fn get_mut(&mut self, i: usize, j: usize) -> &mut T {
        &mut self.data[i * self.cols + j]
    }

    /// Get underlying data as slice
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get mutable underlying data
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume and return underlying data
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Get a row as a slice
    pub fn row(&self, i: usize) -> &[T] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Elementwise map into a new matrix of the same shape
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Matrix<U> {
        Matrix {
            data: self.data.iter().map(f).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Copy out the column block `[col_start, col_start + width)`
    pub fn block(&self, col_start: usize, width: usize) -> Matrix<T> {
        let mut data = Vec::with_capacity(self.rows * width);
        for i in 0..self.rows {
            let start = i * self.cols + col_start;
            data.extend_from_slice(&self.data[start..start + width]);
        }
        Matrix {
            data,
            rows: self.rows,
            cols: width,
        }
    }

    /// Overwrite the column block starting at `col_start` with `src`
    pub fn set_block(&mut self, col_start: usize, src: &Matrix<T>) -> Result<()> {
        if src.rows != self.rows || col_start + src.cols > self.cols {
            return Err(DpolError::dims(
                "Matrix::set_block",
                (self.rows, self.cols.saturating_sub(col_start)),
                src.dims(),
            ));
        }
        for i in 0..self.rows {
            let start = i * self.cols + col_start;
            self.data[start..start + src.cols].clone_from_slice(src.row(i));
        }
        Ok(())
    }
}

impl Matrix<BigInt> {
    /// Create a zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![BigInt::zero(); rows * cols],
            rows,
            cols,
        }
    }

    /// Create an identity matrix
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            *m.get_mut(i, i) = BigInt::one();
        }
        m
    }

    /// Build from machine integers (row-major)
    pub fn from_i64(data: &[i64], rows: usize, cols: usize) -> Result<Self> {
        Self::from_flat(data.iter().map(|&v| BigInt::from(v)).collect(), rows, cols)
    }

    /// Build from a `u32` residue buffer (row-major)
    pub fn from_residues(data: &[u32], rows: usize, cols: usize) -> Result<Self> {
        Self::from_flat(data.iter().map(|&v| BigInt::from(v)).collect(), rows, cols)
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(Zero::is_zero)
    }

    /// Dense product `self · other`
    pub fn mul(&self, other: &Matrix<BigInt>) -> Result<Matrix<BigInt>> {
        if self.cols != other.rows {
            return Err(DpolError::dims(
                "Matrix::mul",
                (self.cols, other.cols),
                other.dims(),
            ));
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for l in 0..self.cols {
                let a = self.get(i, l);
                if a.is_zero() {
                    continue;
                }
                let rhs = other.row(l);
                let dst = &mut out.data[i * other.cols..(i + 1) * other.cols];
                for (d, b) in dst.iter_mut().zip(rhs) {
                    if !b.is_zero() {
                        *d += a * b;
                    }
                }
            }
        }
        Ok(out)
    }

    /// In-place `self += other`
    pub fn add_assign(&mut self, other: &Matrix<BigInt>) -> Result<()> {
        if self.dims() != other.dims() {
            return Err(DpolError::dims("Matrix::add_assign", self.dims(), other.dims()));
        }
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
        Ok(())
    }

    /// `self - other`
    pub fn sub(&self, other: &Matrix<BigInt>) -> Result<Matrix<BigInt>> {
        if self.dims() != other.dims() {
            return Err(DpolError::dims("Matrix::sub", self.dims(), other.dims()));
        }
        Ok(Matrix {
            data: self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect(),
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Entrywise Euclidean remainder, every entry lands in `[0, m)`
    pub fn mod_floor(&self, m: &BigInt) -> Matrix<BigInt> {
        self.map(|x| x.mod_floor(m))
    }

    /// Reduce all entries modulo p
    pub fn reduce_mod(&self, p: u32) -> Vec<u32> {
        let p_big = BigInt::from(p);
        self.data
            .iter()
            .map(|x| x.mod_floor(&p_big).to_u32().unwrap_or(0))
            .collect()
    }

    /// Largest absolute entry (zero for an empty matrix)
    pub fn max_abs(&self) -> BigInt {
        self.data
            .iter()
            .map(|x| x.abs())
            .max()
            .unwrap_or_else(BigInt::zero)
    }
}
