//! X-adic (digit-sliced) matrices
//!
//! An n×m big-integer matrix is stored as an n×(m·p) matrix whose column
//! block `t` (columns `[t·m, (t+1)·m)`) holds the coefficient of X^t of every
//! logical entry:
//!
//! ```text
//!   entry(i, j) = Σ_{t=0}^{p-1} data(i, t·m + j) · X^t
//! ```
//!
//! A slice is *clean* when all its digits are in `[0, X)`. Arithmetic
//! (accumulation, multiplication by a plain matrix) leaves slices *dirty*;
//! [`XadicMatrix::normalize`] restores the canonical form with a single
//! ascending carry sweep.
//!
//! Every operation here is arithmetic modulo X^p: digits past slice p−1 are
//! truncated. Mutating operations take `&mut self` and update in place;
//! conversions ([`XadicMatrix::encode`], [`XadicMatrix::decode`]) build new
//! values.

use crate::error::{DpolError, Result};
use crate::matrix::Matrix;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Pow, Signed, Zero};

/// Matrix in X-adic positional encoding with `precision` digit slices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XadicMatrix {
    data: Matrix<BigInt>,
    modulus: u32,
    cols: usize,
    precision: usize,
}

impl XadicMatrix {
    /// All-zero encoding of an n×m matrix
    pub fn zeros(rows: usize, cols: usize, modulus: u32, precision: usize) -> Result<Self> {
        check_modulus(modulus)?;
        Ok(Self {
            data: Matrix::zeros(rows, cols * precision),
            modulus,
            cols,
            precision,
        })
    }

    /// Wrap an existing n×(m·p) digit buffer without touching its digits
    pub fn from_raw(
        data: Matrix<BigInt>,
        modulus: u32,
        cols: usize,
        precision: usize,
    ) -> Result<Self> {
        check_modulus(modulus)?;
        if data.cols() != cols * precision {
            return Err(DpolError::dims(
                "XadicMatrix::from_raw",
                (data.rows(), cols * precision),
                data.dims(),
            ));
        }
        Ok(Self {
            data,
            modulus,
            cols,
            precision,
        })
    }

    /// Encode `a` into `precision` base-`modulus` digits per entry.
    ///
    /// Each entry is first reduced modulo X^p, so negative entries are
    /// stored as their X-adic residue and digits past p−1 are dropped.
    pub fn encode(a: &Matrix<BigInt>, modulus: u32, precision: usize) -> Result<Self> {
        check_modulus(modulus)?;
        if precision == 0 {
            return Err(DpolError::PrecisionInsufficient {
                required: 1,
                available: 0,
            });
        }

        let (n, m) = a.dims();
        let x = BigInt::from(modulus);
        let x_pow = Pow::pow(&x, precision);
        let mut out = Self::zeros(n, m, modulus, precision)?;

        for i in 0..n {
            for j in 0..m {
                let mut v = a.get(i, j).mod_floor(&x_pow);
                for t in 0..precision {
                    if v.is_zero() {
                        break;
                    }
                    let (q, r) = v.div_rem(&x);
                    *out.data.get_mut(i, t * m + j) = r;
                    v = q;
                }
            }
        }
        Ok(out)
    }

    /// Collapse the digit slices back into plain entries.
    ///
    /// No range validation: dirty digits collapse to the value they
    /// represent, so an un-normalized sum can be read directly.
    pub fn decode(&self) -> Matrix<BigInt> {
        let (n, m) = (self.rows(), self.cols);
        let x = BigInt::from(self.modulus);
        let mut out = Matrix::zeros(n, m);

        for i in 0..n {
            for j in 0..m {
                let mut acc = BigInt::zero();
                for t in (0..self.precision).rev() {
                    acc = acc * &x + self.data.get(i, t * m + j);
                }
                *out.get_mut(i, j) = acc;
            }
        }
        out
    }

    /// Collapse and map every entry into the symmetric range (−X^p/2, X^p/2]
    pub fn decode_signed(&self) -> Matrix<BigInt> {
        let x_pow = self.radix_power();
        let half = &x_pow / 2;
        self.decode().map(|v| {
            let r = v.mod_floor(&x_pow);
            if r > half {
                r - &x_pow
            } else {
                r
            }
        })
    }

    /// Multiply by X^`swift`, truncated to p digits.
    ///
    /// Slice t moves to t+swift; slices pushed past p−1 are dropped and the
    /// first `swift` slices become zero.
    pub fn shift(&mut self, swift: usize) {
        if swift == 0 {
            return;
        }
        let width = self.cols * self.precision;
        let offset = swift.saturating_mul(self.cols).min(width);
        let rows = self.rows();
        let buf = self.data.as_mut_slice();

        for i in 0..rows {
            let row = &mut buf[i * width..(i + 1) * width];
            row.rotate_right(offset);
            for d in &mut row[..offset] {
                *d = BigInt::zero();
            }
        }
    }

    /// Restore canonical digits in `[0, X)` with one ascending carry sweep.
    ///
    /// Out-of-range digits (negative or ≥ X) keep their floor remainder and
    /// push the floor quotient into the same cell of the next slice, which
    /// the sweep visits later. The last slice is reduced with no outgoing
    /// carry. Returns `true` when a nonzero carry was discarded there, which
    /// means the value was reduced modulo X^p.
    pub fn normalize(&mut self) -> bool {
        let (n, m, p) = (self.rows(), self.cols, self.precision);
        let x = BigInt::from(self.modulus);
        let mut overflowed = false;

        for t in 0..p {
            for i in 0..n {
                for j in 0..m {
                    let digit = self.data.get_mut(i, t * m + j);
                    if !digit.is_negative() && *digit < x {
                        continue;
                    }
                    let (carry, rem) = digit.div_mod_floor(&x);
                    *digit = rem;
                    if t + 1 < p {
                        *self.data.get_mut(i, (t + 1) * m + j) += carry;
                    } else if !carry.is_zero() {
                        overflowed = true;
                    }
                }
            }
        }
        overflowed
    }

    /// Like [`normalize`](Self::normalize), but a carry escaping the last
    /// slice is an error instead of a silent reduction modulo X^p.
    pub fn normalize_strict(&mut self) -> Result<()> {
        if self.normalize() {
            return Err(DpolError::PrecisionOverflow {
                precision: self.precision,
            });
        }
        Ok(())
    }

    /// True when every digit lies in `[0, X)`
    pub fn is_clean(&self) -> bool {
        let x = BigInt::from(self.modulus);
        self.data
            .as_slice()
            .iter()
            .all(|d| !d.is_negative() && *d < x)
    }

    /// Digitwise `self += other` (result is dirty)
    pub fn add_assign(&mut self, other: &XadicMatrix) -> Result<()> {
        self.check_compatible(other, "XadicMatrix::add_assign")?;
        self.data.add_assign(&other.data)
    }

    /// `lhs · self`, applied slice by slice (result is dirty)
    ///
    /// Multiplication by a plain matrix is linear in every digit, so the
    /// whole n×(m·p) buffer is multiplied at once.
    pub fn left_mul(&self, lhs: &Matrix<BigInt>) -> Result<XadicMatrix> {
        if lhs.cols() != self.rows() {
            return Err(DpolError::dims(
                "XadicMatrix::left_mul",
                (lhs.rows(), self.rows()),
                lhs.dims(),
            ));
        }
        Ok(Self {
            data: lhs.mul(&self.data)?,
            modulus: self.modulus,
            cols: self.cols,
            precision: self.precision,
        })
    }

    /// Drop every slice at or above `precision` (reduction modulo X^precision)
    pub fn truncate(&mut self, precision: usize) {
        if precision >= self.precision {
            return;
        }
        self.data = self.data.block(0, self.cols * precision);
        self.precision = precision;
    }

    /// Copy of digit slice `t` as an n×m matrix
    pub fn slice(&self, t: usize) -> Result<Matrix<BigInt>> {
        if t >= self.precision {
            return Err(DpolError::PrecisionInsufficient {
                required: t + 1,
                available: self.precision,
            });
        }
        Ok(self.data.block(t * self.cols, self.cols))
    }

    /// Overwrite digit slice `t`
    pub fn set_slice(&mut self, t: usize, digits: &Matrix<BigInt>) -> Result<()> {
        if t >= self.precision {
            return Err(DpolError::PrecisionInsufficient {
                required: t + 1,
                available: self.precision,
            });
        }
        if digits.dims() != (self.rows(), self.cols) {
            return Err(DpolError::dims(
                "XadicMatrix::set_slice",
                (self.rows(), self.cols),
                digits.dims(),
            ));
        }
        self.data.set_block(t * self.cols, digits)
    }

    /// X^p, the modulus of the arithmetic this encoding performs
    pub fn radix_power(&self) -> BigInt {
        Pow::pow(&BigInt::from(self.modulus), self.precision)
    }

    pub fn modulus(&self) -> u32 {
        self.modulus
    }

    /// Logical row count n
    pub fn rows(&self) -> usize {
        self.data.rows()
    }

    /// Logical column count m
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of digit slices p
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// The underlying n×(m·p) digit buffer
    pub fn as_matrix(&self) -> &Matrix<BigInt> {
        &self.data
    }

    pub fn into_matrix(self) -> Matrix<BigInt> {
        self.data
    }

    fn check_compatible(&self, other: &XadicMatrix, context: &'static str) -> Result<()> {
        if self.modulus != other.modulus {
            return Err(DpolError::InvalidModulus {
                modulus: other.modulus,
                reason: format!("{} expects radix {}", context, self.modulus),
            });
        }
        if self.precision != other.precision {
            return Err(DpolError::PrecisionInsufficient {
                required: self.precision,
                available: other.precision,
            });
        }
        if self.rows() != other.rows() || self.cols != other.cols {
            return Err(DpolError::dims(
                context,
                (self.rows(), self.cols),
                (other.rows(), other.cols),
            ));
        }
        Ok(())
    }
}

fn check_modulus(modulus: u32) -> Result<()> {
    if modulus < 2 {
        return Err(DpolError::InvalidModulus {
            modulus,
            reason: "radix must be at least 2".to_string(),
        });
    }
    Ok(())
}

/// Encode `a` as an X-adic matrix with `precision` digits
pub fn encode(a: &Matrix<BigInt>, modulus: u32, precision: usize) -> Result<XadicMatrix> {
    XadicMatrix::encode(a, modulus, precision)
}

/// Collapse an X-adic matrix (clean or dirty) into plain entries
pub fn decode(a: &XadicMatrix) -> Matrix<BigInt> {
    a.decode()
}

/// Shifted copy: `a · X^swift` truncated to p digits
pub fn shift(a: &XadicMatrix, swift: usize) -> XadicMatrix {
    let mut out = a.clone();
    out.shift(swift);
    out
}

/// Canonicalized copy of `a` (last-slice overflow reduced modulo X^p)
pub fn normalize(a: &XadicMatrix) -> XadicMatrix {
    let mut out = a.clone();
    out.normalize();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(data: &[i64], rows: usize, cols: usize) -> Matrix<BigInt> {
        Matrix::from_i64(data, rows, cols).unwrap()
    }

    #[test]
    fn test_encode_layout() {
        // 38 = 3 + 2·5 + 1·25, 7 = 2 + 1·5
        let a = m(&[38, 7], 1, 2);
        let enc = XadicMatrix::encode(&a, 5, 3).unwrap();
        assert_eq!(enc.as_matrix(), &m(&[3, 2, 2, 1, 1, 0], 1, 6));
        assert_eq!(enc.slice(1).unwrap(), m(&[2, 1], 1, 2));
        assert!(enc.is_clean());
        assert_eq!(enc.decode(), a);
    }

    #[test]
    fn test_encode_truncates_high_digits() {
        // 130 = 0 + 1·5 + 0·25 + 1·125; two digits keep only 5
        let enc = XadicMatrix::encode(&m(&[130], 1, 1), 5, 2).unwrap();
        assert_eq!(enc.decode(), m(&[5], 1, 1));
    }

    #[test]
    fn test_encode_negative_is_residue() {
        let enc = XadicMatrix::encode(&m(&[-1, -12], 2, 1), 5, 3).unwrap();
        assert_eq!(enc.decode(), m(&[124, 113], 2, 1));
        assert_eq!(enc.decode_signed(), m(&[-1, -12], 2, 1));
    }

    #[test]
    fn test_encode_rejects_bad_parameters() {
        let a = m(&[1], 1, 1);
        assert!(matches!(
            XadicMatrix::encode(&a, 1, 3),
            Err(DpolError::InvalidModulus { .. })
        ));
        assert!(matches!(
            XadicMatrix::encode(&a, 5, 0),
            Err(DpolError::PrecisionInsufficient { .. })
        ));
    }

    #[test]
    fn test_decode_dirty() {
        // digits [7, 9] in base 5 collapse to 7 + 45 = 52
        let raw = XadicMatrix::from_raw(m(&[7, 9], 1, 2), 5, 1, 2).unwrap();
        assert!(!raw.is_clean());
        assert_eq!(raw.decode(), m(&[52], 1, 1));
    }

    #[test]
    fn test_shift_within_precision() {
        let a = m(&[3, 17], 1, 2);
        let mut enc = XadicMatrix::encode(&a, 5, 4).unwrap();
        enc.shift(2);
        assert_eq!(enc.decode(), m(&[75, 425], 1, 2));
        assert_eq!(enc.slice(0).unwrap(), m(&[0, 0], 1, 2));
        assert_eq!(enc.slice(1).unwrap(), m(&[0, 0], 1, 2));
    }

    #[test]
    fn test_shift_truncates() {
        // 17 = 2 + 3·5; shifted by 1 with p = 2 keeps only 2·5
        let mut enc = XadicMatrix::encode(&m(&[17], 1, 1), 5, 2).unwrap();
        enc.shift(1);
        assert_eq!(enc.decode(), m(&[10], 1, 1));

        enc.shift(5);
        assert!(enc.as_matrix().is_zero());
    }

    #[test]
    fn test_normalize_multi_unit_carry() {
        // digits [27, 0, 0] = 27 = 2 + 0·5 + 1·25
        let mut raw = XadicMatrix::from_raw(m(&[27, 0, 0], 1, 3), 5, 1, 3).unwrap();
        assert!(!raw.normalize());
        assert_eq!(raw.as_matrix(), &m(&[2, 0, 1], 1, 3));
    }

    #[test]
    fn test_normalize_negative_digits() {
        // digits [-1, 1] = -1 + 5 = 4
        let mut raw = XadicMatrix::from_raw(m(&[-1, 1], 1, 2), 5, 1, 2).unwrap();
        assert!(!raw.normalize());
        assert_eq!(raw.as_matrix(), &m(&[4, 0], 1, 2));
    }

    #[test]
    fn test_normalize_last_slice_overflow() {
        // digits [0, 6] = 30 ≡ 5 mod 25
        let mut raw = XadicMatrix::from_raw(m(&[0, 6], 1, 2), 5, 1, 2).unwrap();
        let mut strict = raw.clone();
        assert!(raw.normalize());
        assert_eq!(raw.decode(), m(&[5], 1, 1));
        assert_eq!(
            strict.normalize_strict(),
            Err(DpolError::PrecisionOverflow { precision: 2 })
        );
    }

    #[test]
    fn test_left_mul_and_accumulate() {
        let b = XadicMatrix::encode(&m(&[4, 3], 2, 1), 5, 3).unwrap();
        let a = m(&[2, 1, 1, 1], 2, 2);
        let mut prod = b.left_mul(&a).unwrap();
        assert_eq!(prod.decode(), m(&[11, 7], 2, 1));

        prod.add_assign(&b).unwrap();
        prod.normalize();
        assert!(prod.is_clean());
        assert_eq!(prod.decode(), m(&[15, 10], 2, 1));
    }

    #[test]
    fn test_add_rejects_mismatched_precision() {
        let a = XadicMatrix::zeros(2, 1, 5, 3).unwrap();
        let mut b = XadicMatrix::zeros(2, 1, 5, 2).unwrap();
        assert!(b.add_assign(&a).is_err());
    }

    #[test]
    fn test_zeros_rejects_degenerate_radix() {
        for radix in [0, 1] {
            assert!(matches!(
                XadicMatrix::zeros(1, 1, radix, 2),
                Err(DpolError::InvalidModulus { .. })
            ));
        }
        let mut z = XadicMatrix::zeros(1, 1, 2, 2).unwrap();
        assert!(!z.normalize());
        assert!(z.is_clean());
    }

    #[test]
    fn test_slice_bounds() {
        let mut enc = XadicMatrix::encode(&m(&[38, 7], 1, 2), 5, 2).unwrap();
        assert_eq!(enc.slice(1).unwrap(), m(&[2, 1], 1, 2));
        assert_eq!(
            enc.slice(2),
            Err(DpolError::PrecisionInsufficient {
                required: 3,
                available: 2
            })
        );
        assert!(enc.set_slice(2, &m(&[0, 0], 1, 2)).is_err());
        assert!(matches!(
            enc.set_slice(0, &m(&[0], 1, 1)),
            Err(DpolError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_truncate() {
        let mut enc = XadicMatrix::encode(&m(&[38], 1, 1), 5, 3).unwrap();
        enc.truncate(2);
        assert_eq!(enc.precision(), 2);
        assert_eq!(enc.decode(), m(&[13], 1, 1));
    }

    #[test]
    fn test_free_functions_leave_input_untouched() {
        let enc = encode(&m(&[3], 1, 1), 5, 3).unwrap();
        let shifted = shift(&enc, 1);
        assert_eq!(decode(&shifted), m(&[15], 1, 1));
        assert_eq!(decode(&enc), m(&[3], 1, 1));
        assert_eq!(normalize(&enc), enc);
    }
}
