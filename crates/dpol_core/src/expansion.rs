//! Double Plus One Lifting (DPOL)
//!
//! Builds a sparse X-adic expansion of A⁻¹ and applies it to right-hand
//! sides without ever materializing the high-precision inverse.
//!
//! # Recurrence
//!
//! Starting from A0 ≡ A⁻¹ (mod X) and `A·A0 = I − X·R0`, each step sets
//!
//! ```text
//!   M[i]   = (A0 · R[i]²) mod X
//!   R[i+1] = (R[i]² − A·M[i]) / X        (exact)
//!   C[i+1] = C[i]·(I + X^e·R[i]) + X^(2e)·M[i],   e = 2^(i+1) − 1
//! ```
//!
//! so that `A·C[i] = I − X^(2^(i+1)−1)·R[i]`: precision goes from e to 2e+1
//! per step. After k steps C[k] ≡ A⁻¹ (mod X^(2^(k+1)−1)).
//!
//! Applying C[k] to B unrolls the recurrence from the outermost factor
//! inwards, so the applier walks i = k−1 down to 0 with an explicit
//! accumulator instead of recursing k levels deep.

use crate::backend::{Backend, CpuBackend};
use crate::error::{DpolError, Result};
use crate::matrix::Matrix;
use crate::primes::PrimeGenerator;
use crate::xadic::XadicMatrix;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;
use tracing::debug;

/// Number of X-adic digits a level-k expansion determines: 2^(k+1) − 1
///
/// None when the count does not fit in a `usize`.
pub fn precision_for_level(level: usize) -> Option<usize> {
    let shift = u32::try_from(level.checked_add(1)?).ok()?;
    1usize.checked_shl(shift).map(|v| v - 1)
}

/// Sparse inverse expansion (A0, R[0..k), M[0..k)) of a square matrix
#[derive(Debug, Clone)]
pub struct SparseInverseExpansion {
    modulus: u32,
    a0: Matrix<BigInt>,
    r: Vec<Matrix<BigInt>>,
    m: Vec<Matrix<BigInt>>,
}

impl SparseInverseExpansion {
    /// Build the level-`level` expansion of `a` with the CPU inverse oracle
    pub fn build(a: &Matrix<BigInt>, modulus: u32, level: usize) -> Result<Self> {
        Self::build_with(&CpuBackend::new(), a, modulus, level)
    }

    /// Build the expansion using `backend` for `A⁻¹ mod X`
    ///
    /// # Errors
    /// * `DimensionMismatch` - `a` is not square
    /// * `InvalidModulus` - X is not prime, or X divides det(A)
    /// * `InvariantViolation` - a lifting quotient was not exact
    pub fn build_with<B: Backend>(
        backend: &B,
        a: &Matrix<BigInt>,
        modulus: u32,
        level: usize,
    ) -> Result<Self> {
        if !a.is_square() {
            return Err(DpolError::dims(
                "SparseInverseExpansion::build",
                (a.rows(), a.rows()),
                a.dims(),
            ));
        }
        let a0 = inverse_oracle(backend, a, modulus)?;
        let n = a.rows();
        let x = BigInt::from(modulus);

        let residual = Matrix::identity(n).sub(&a.mul(&a0)?)?;
        let mut current = exact_quotient(&residual, &x, 0)?;

        let mut r = Vec::with_capacity(level);
        let mut m = Vec::with_capacity(level);
        for i in 0..level {
            let r_sq = current.mul(&current)?;
            let m_i = a0.mul(&r_sq)?.mod_floor(&x);
            let next = exact_quotient(&r_sq.sub(&a.mul(&m_i)?)?, &x, i + 1)?;
            debug!(
                step = i,
                residual_bits = current.max_abs().bits(),
                "lifted expansion"
            );
            r.push(std::mem::replace(&mut current, next));
            m.push(m_i);
        }

        Ok(Self { modulus, a0, r, m })
    }

    /// Apply the expansion to an encoded right-hand side.
    ///
    /// Returns the X-adic encoding of A⁻¹·B modulo X^(2^(k+1)−1). `b` must
    /// carry at least that many digits; extra digits are not determined by
    /// the expansion and are truncated from the result.
    pub fn apply(&self, b: &XadicMatrix) -> Result<XadicMatrix> {
        if b.modulus() != self.modulus {
            return Err(DpolError::InvalidModulus {
                modulus: b.modulus(),
                reason: format!("expansion was built for radix {}", self.modulus),
            });
        }
        if b.rows() != self.dim() {
            return Err(DpolError::dims(
                "SparseInverseExpansion::apply",
                (self.dim(), b.cols()),
                (b.rows(), b.cols()),
            ));
        }
        let required = self.precision().ok_or(DpolError::PrecisionInsufficient {
            required: usize::MAX,
            available: b.precision(),
        })?;
        if b.precision() < required {
            return Err(DpolError::PrecisionInsufficient {
                required,
                available: b.precision(),
            });
        }

        let mut expansion = XadicMatrix::zeros(b.rows(), b.cols(), self.modulus, b.precision())?;
        let mut factor = b.clone();

        for i in (0..self.level()).rev() {
            // 2^(i+1) − 1 and 2^(i+2) − 2 are below 2^(k+1) − 1, which fits
            let r_shift = (1usize << (i + 1)) - 1;
            let m_shift = 2 * r_shift;

            let mut term = factor.left_mul(&self.m[i])?;
            term.shift(m_shift);
            expansion.add_assign(&term)?;
            expansion.normalize();

            let mut term = factor.left_mul(&self.r[i])?;
            term.shift(r_shift);
            factor.add_assign(&term)?;
            factor.normalize();

            debug!(step = i, r_shift, m_shift, "applied expansion level");
        }

        expansion.add_assign(&factor.left_mul(&self.a0)?)?;
        expansion.normalize();
        expansion.truncate(required);
        Ok(expansion)
    }

    /// Radix X
    pub fn modulus(&self) -> u32 {
        self.modulus
    }

    /// Lifting level k
    pub fn level(&self) -> usize {
        self.m.len()
    }

    /// Matrix dimension n
    pub fn dim(&self) -> usize {
        self.a0.rows()
    }

    /// Digits of A⁻¹ determined by this expansion, 2^(k+1) − 1
    pub fn precision(&self) -> Option<usize> {
        precision_for_level(self.level())
    }

    /// A⁻¹ mod X, entries in `[0, X)`
    pub fn a0(&self) -> &Matrix<BigInt> {
        &self.a0
    }

    /// Residual tables R[0..k)
    pub fn residuals(&self) -> &[Matrix<BigInt>] {
        &self.r
    }

    /// Correction tables M[0..k), entries in `[0, X)`
    pub fn corrections(&self) -> &[Matrix<BigInt>] {
        &self.m
    }
}

/// `A⁻¹ mod X` through the backend, with the modulus preconditions checked
fn inverse_oracle<B: Backend>(backend: &B, a: &Matrix<BigInt>, modulus: u32) -> Result<Matrix<BigInt>> {
    if !PrimeGenerator::is_prime_u32(modulus) {
        return Err(DpolError::InvalidModulus {
            modulus,
            reason: "modulus must be prime".to_string(),
        });
    }
    let n = a.rows();
    let a_mod = a.reduce_mod(modulus);
    match backend.inverse_mod(&a_mod, n, modulus) {
        Some(inv) => Matrix::from_residues(&inv, n, n),
        None => Err(DpolError::InvalidModulus {
            modulus,
            reason: format!(
                "matrix is singular modulo {} (det ≡ {})",
                modulus,
                backend.determinant_mod(&a_mod, n, modulus)
            ),
        }),
    }
}

/// Entrywise `num / x`, failing if any entry leaves a remainder
fn exact_quotient(num: &Matrix<BigInt>, x: &BigInt, step: usize) -> Result<Matrix<BigInt>> {
    let (rows, cols) = num.dims();
    let mut data = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let (q, rem) = num.get(i, j).div_rem(x);
            if !rem.is_zero() {
                return Err(DpolError::InvariantViolation {
                    step,
                    detail: format!("entry ({}, {}) leaves remainder {} modulo {}", i, j, rem, x),
                });
            }
            data.push(q);
        }
    }
    Matrix::from_flat(data, rows, cols)
}

/// Build the level-`level` expansion of `a` for radix `modulus`
pub fn build_expansion(a: &Matrix<BigInt>, modulus: u32, level: usize) -> Result<SparseInverseExpansion> {
    SparseInverseExpansion::build(a, modulus, level)
}

/// Apply `expansion` to the encoded right-hand side `b`
pub fn apply(expansion: &SparseInverseExpansion, b: &XadicMatrix) -> Result<XadicMatrix> {
    expansion.apply(b)
}
