//! Backend trait for the modular inverse oracle
//!
//! Lifting needs `A⁻¹ mod X` exactly once per expansion. Everything after
//! that is big-integer arithmetic, so the backend surface is small:
//! determinant and inverse over the prime field Z/XZ.

/// Backend trait for modular linear algebra over a prime field
///
/// Implementations can target CPU or an accelerator; the lifting engine
/// only relies on the results being exact residues in `[0, p)`.
pub trait Backend: Send + Sync {
    /// Name of this backend (for logging)
    fn name(&self) -> &'static str;

    /// Compute det(A) mod prime p
    ///
    /// # Arguments
    /// * `matrix` - Flattened n×n matrix
    /// * `n` - Matrix dimension
    /// * `p` - Prime modulus
    fn determinant_mod(&self, matrix: &[u32], n: usize, p: u32) -> u32;

    /// Compute A⁻¹ mod prime p
    ///
    /// # Returns
    /// Flattened n×n inverse with entries in `[0, p)`, or None if A is
    /// singular mod p
    fn inverse_mod(&self, matrix: &[u32], n: usize, p: u32) -> Option<Vec<u32>>;
}

/// Arithmetic in Z/pZ for a 32-bit prime p (products fit in u64)
#[derive(Debug, Clone, Copy)]
struct PrimeField {
    p: u64,
}

impl PrimeField {
    fn new(p: u32) -> Self {
        Self { p: p as u64 }
    }

    fn reduce(self, a: u32) -> u64 {
        a as u64 % self.p
    }

    fn mul(self, a: u64, b: u64) -> u64 {
        a * b % self.p
    }

    fn sub(self, a: u64, b: u64) -> u64 {
        (a + self.p - b) % self.p
    }

    fn neg(self, a: u64) -> u64 {
        (self.p - a) % self.p
    }

    fn pow(self, mut base: u64, mut exp: u64) -> u64 {
        let mut acc = 1 % self.p;
        base %= self.p;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = self.mul(acc, base);
            }
            base = self.mul(base, base);
            exp >>= 1;
        }
        acc
    }

    /// a^(p−2) by Fermat; None for a ≡ 0
    fn inv(self, a: u64) -> Option<u64> {
        if a % self.p == 0 {
            return None;
        }
        Some(self.pow(a, self.p - 2))
    }
}

/// Gauss-Jordan on the leading n columns of an n×w row-major buffer.
///
/// On success the leading block is the identity, the trailing w−n columns
/// hold A⁻¹ applied to whatever they started as, and the return value is
/// det of the input leading block. None when that block is singular.
fn gauss_jordan(field: PrimeField, rows: &mut [u64], n: usize, w: usize) -> Option<u64> {
    let mut det = 1 % field.p;

    for col in 0..n {
        let pivot = (col..n).find(|&r| rows[r * w + col] != 0)?;
        if pivot != col {
            for j in 0..w {
                rows.swap(col * w + j, pivot * w + j);
            }
            det = field.neg(det);
        }

        let pivot_val = rows[col * w + col];
        det = field.mul(det, pivot_val);
        let pivot_inv = field.inv(pivot_val)?;
        for v in &mut rows[col * w..(col + 1) * w] {
            *v = field.mul(*v, pivot_inv);
        }

        // columns left of `col` are already zero in the pivot row
        for r in 0..n {
            let factor = rows[r * w + col];
            if r == col || factor == 0 {
                continue;
            }
            for j in col..w {
                let sub = field.mul(factor, rows[col * w + j]);
                rows[r * w + j] = field.sub(rows[r * w + j], sub);
            }
        }
    }

    Some(det)
}

/// CPU backend: Gauss-Jordan elimination over Z/pZ
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for CpuBackend {
    fn name(&self) -> &'static str {
        "CPU"
    }

    fn determinant_mod(&self, matrix: &[u32], n: usize, p: u32) -> u32 {
        let field = PrimeField::new(p);
        let mut rows: Vec<u64> = matrix.iter().map(|&v| field.reduce(v)).collect();
        gauss_jordan(field, &mut rows, n, n).map_or(0, |det| det as u32)
    }

    fn inverse_mod(&self, matrix: &[u32], n: usize, p: u32) -> Option<Vec<u32>> {
        let field = PrimeField::new(p);
        let w = 2 * n;

        // [A | I]
        let mut aug = vec![0u64; n * w];
        for i in 0..n {
            for j in 0..n {
                aug[i * w + j] = field.reduce(matrix[i * n + j]);
            }
            aug[i * w + n + i] = 1 % field.p;
        }

        gauss_jordan(field, &mut aug, n, w)?;

        Some(
            aug.chunks(w)
                .flat_map(|row| row[n..].iter().map(|&v| v as u32))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_inverse() {
        let f = PrimeField::new(101);
        for a in 1..101u64 {
            let inv = f.inv(a).unwrap();
            assert_eq!(f.mul(a, inv), 1);
        }
        assert_eq!(f.inv(0), None);
        assert_eq!(f.inv(202), None);
    }

    #[test]
    fn test_cpu_determinant() {
        let backend = CpuBackend::new();

        // [[2, 1], [1, 3]], det = 5
        assert_eq!(backend.determinant_mod(&[2, 1, 1, 3], 2, 7), 5);
        // [[0, 1], [1, 0]] needs a row swap, det = -1
        assert_eq!(backend.determinant_mod(&[0, 1, 1, 0], 2, 13), 12);
        // det = 94
        let sym3 = [4, 1, 2, 1, 5, 1, 2, 1, 6];
        assert_eq!(backend.determinant_mod(&sym3, 3, 101), 94);
        assert_eq!(backend.determinant_mod(&sym3, 3, 47), 0);
    }

    #[test]
    fn test_cpu_inverse() {
        let backend = CpuBackend::new();

        // [[2, 1], [1, 1]]⁻¹ = [[1, -1], [-1, 2]] ≡ [[1, 4], [4, 2]] mod 5
        let inv = backend.inverse_mod(&[2, 1, 1, 1], 2, 5).unwrap();
        assert_eq!(inv, vec![1, 4, 4, 2]);
    }

    #[test]
    fn test_cpu_inverse_is_two_sided() {
        let backend = CpuBackend::new();
        let a = [4u32, 1, 2, 1, 5, 1, 2, 1, 6];
        let p = 2147483647u32;
        let f = PrimeField::new(p);

        let inv = backend.inverse_mod(&a, 3, p).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let left = (0..3).fold(0, |acc, k| {
                    (acc + f.mul(a[i * 3 + k] as u64, inv[k * 3 + j] as u64)) % f.p
                });
                let right = (0..3).fold(0, |acc, k| {
                    (acc + f.mul(inv[i * 3 + k] as u64, a[k * 3 + j] as u64)) % f.p
                });
                assert_eq!(left, (i == j) as u64);
                assert_eq!(right, (i == j) as u64);
            }
        }
    }

    #[test]
    fn test_cpu_inverse_singular() {
        let backend = CpuBackend::new();
        // det = 5 ≡ 0 mod 5
        assert!(backend.inverse_mod(&[2, 1, 1, 3], 2, 5).is_none());
        assert!(backend.inverse_mod(&[2, 4, 3, 6], 2, 7).is_none());
    }
}
