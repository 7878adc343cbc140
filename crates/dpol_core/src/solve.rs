//! Exact linear system solving with DPOL
//!
//! Picks the radix X and lifting level k, then drives the pipeline
//!
//! ```text
//!   A, X, k ──build──▶ (A0, R, M)
//!   B ──encode──▶ B_enc ──apply──▶ X_enc ──decode_signed──▶ X
//! ```
//!
//! The level is chosen from a Hadamard bound on the entries of A⁻¹B so that
//! X^(2^(k+1)−1) covers the symmetric range of every solution entry.

use crate::backend::{Backend, CpuBackend};
use crate::error::{DpolError, Result};
use crate::expansion::{precision_for_level, SparseInverseExpansion};
use crate::matrix::Matrix;
use crate::primes::PrimeGenerator;
use crate::xadic::XadicMatrix;
use num_bigint::BigInt;
use num_traits::One;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for DPOL solving
#[derive(Debug, Clone)]
pub struct DpolConfig {
    /// Radix X; None walks the 31-bit primes until one does not divide det(A)
    pub modulus: Option<u32>,
    /// Lifting level k; None derives it from the solution bound
    pub level: Option<usize>,
    /// Check A·X = B exactly before returning
    pub verify: bool,
    /// Upper limit on k (the encoding carries 2^(k+1) − 1 digits)
    pub max_level: usize,
    /// How many candidate primes to try when `modulus` is None
    pub max_modulus_attempts: usize,
}

impl Default for DpolConfig {
    fn default() -> Self {
        Self {
            modulus: None,
            level: None,
            verify: true,
            max_level: 20,
            max_modulus_attempts: 16,
        }
    }
}

impl DpolConfig {
    /// Config pinned to a given radix
    pub fn with_modulus(modulus: u32) -> Self {
        Self {
            modulus: Some(modulus),
            ..Self::default()
        }
    }
}

/// Timing breakdown for a DPOL solve (milliseconds)
#[derive(Debug, Clone, Default)]
pub struct DpolTimings {
    /// Oracle inverse plus R/M table construction
    pub build_ms: f64,
    pub encode_ms: f64,
    pub apply_ms: f64,
    pub decode_ms: f64,
    pub verify_ms: f64,
    pub total_ms: f64,
}

/// Result of a DPOL solve
#[derive(Debug, Clone)]
pub struct DpolResult {
    /// A⁻¹·B
    pub solution: Matrix<BigInt>,
    /// Radix X used for lifting
    pub modulus: u32,
    /// Lifting level k
    pub level: usize,
    /// Digits of the X-adic solution, 2^(k+1) − 1
    pub precision: usize,
    /// Whether A·X = B was checked
    pub verified: bool,
    pub timings: DpolTimings,
}

/// Squared Hadamard bound on |(A⁻¹B)_ij| for integral A⁻¹B
///
/// By Cramer's rule each entry is det(A_j)/det(A) with |det(A)| ≥ 1, and
/// replacing a column of A by a column of B grows row r's squared norm by at
/// most max_j b_rj².
pub fn solution_bound_sq(a: &Matrix<BigInt>, b: &Matrix<BigInt>) -> BigInt {
    let mut bound = BigInt::one();
    for r in 0..a.rows() {
        let row_sq: BigInt = a.row(r).iter().map(|v| v * v).sum();
        let rhs_sq = b.row(r).iter().map(|v| v * v).max().unwrap_or_default();
        bound *= row_sq + rhs_sq;
    }
    bound
}

/// Smallest digit count d with X^d > 2·bound, i.e. X^(2d) > 4·bound²
pub fn digits_needed(bound_sq: &BigInt, modulus: u32) -> usize {
    let target = bound_sq * 4u32;
    let x_sq = BigInt::from(modulus) * modulus;
    let mut digits = 1;
    let mut power = x_sq.clone();
    while power <= target {
        power *= &x_sq;
        digits += 1;
    }
    digits
}

/// Smallest k with 2^(k+1) − 1 ≥ `digits`
pub fn level_for_digits(digits: usize) -> usize {
    let mut level = 0;
    while precision_for_level(level).is_some_and(|p| p < digits) {
        level += 1;
    }
    level
}

/// DPOL linear system solver
///
/// Generic over the backend that supplies `A⁻¹ mod X`.
pub struct DpolSolver<B: Backend> {
    backend: B,
    config: DpolConfig,
}

impl DpolSolver<CpuBackend> {
    pub fn cpu() -> Self {
        Self::new(CpuBackend::new())
    }
}

impl<B: Backend> DpolSolver<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, DpolConfig::default())
    }

    pub fn with_config(backend: B, config: DpolConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &DpolConfig {
        &self.config
    }

    /// Solve A·X = B exactly for integral A⁻¹B
    ///
    /// # Errors
    /// * `DimensionMismatch` - A not square or B has the wrong row count
    /// * `InvalidModulus` - the configured radix is unusable, or no candidate
    ///   prime was coprime with det(A)
    /// * `PrecisionInsufficient` - the configured or maximal level cannot
    ///   hold the solution bound
    /// * `VerificationFailed` - the decoded X does not satisfy A·X = B
    pub fn solve(&self, a: &Matrix<BigInt>, b: &Matrix<BigInt>) -> Result<DpolResult> {
        let start = Instant::now();
        let mut timings = DpolTimings::default();

        if !a.is_square() {
            return Err(DpolError::dims("solve", (a.rows(), a.rows()), a.dims()));
        }
        if b.rows() != a.rows() {
            return Err(DpolError::dims("solve", (a.rows(), b.cols()), b.dims()));
        }

        let bound_sq = solution_bound_sq(a, b);
        debug!(bound_bits = bound_sq.bits() / 2, "solution bound");

        // 1. Radix, level and expansion
        let build_start = Instant::now();
        let (expansion, precision) = match self.config.modulus {
            Some(x) => self.build_for(a, &bound_sq, x)?,
            None => self.build_auto(a, &bound_sq)?,
        };
        timings.build_ms = build_start.elapsed().as_secs_f64() * 1000.0;

        let modulus = expansion.modulus();
        let level = expansion.level();
        info!(
            backend = self.backend.name(),
            n = a.rows(),
            m = b.cols(),
            modulus,
            level,
            precision,
            "built DPOL expansion"
        );

        // 2. Encode B
        let encode_start = Instant::now();
        let b_enc = XadicMatrix::encode(b, modulus, precision)?;
        timings.encode_ms = encode_start.elapsed().as_secs_f64() * 1000.0;

        // 3. Apply
        let apply_start = Instant::now();
        let x_enc = expansion.apply(&b_enc)?;
        timings.apply_ms = apply_start.elapsed().as_secs_f64() * 1000.0;

        // 4. Decode into the symmetric range
        let decode_start = Instant::now();
        let solution = x_enc.decode_signed();
        timings.decode_ms = decode_start.elapsed().as_secs_f64() * 1000.0;

        // 5. Verification
        if self.config.verify {
            let verify_start = Instant::now();
            verify_solution(a, b, &solution)?;
            timings.verify_ms = verify_start.elapsed().as_secs_f64() * 1000.0;
        }

        timings.total_ms = start.elapsed().as_secs_f64() * 1000.0;

        Ok(DpolResult {
            solution,
            modulus,
            level,
            precision,
            verified: self.config.verify,
            timings,
        })
    }

    /// Build for a fixed radix, validating the level against the bound
    fn build_for(
        &self,
        a: &Matrix<BigInt>,
        bound_sq: &BigInt,
        modulus: u32,
    ) -> Result<(SparseInverseExpansion, usize)> {
        let level = self.choose_level(bound_sq, modulus)?;
        let precision = precision_for_level(level).ok_or(DpolError::PrecisionInsufficient {
            required: usize::MAX,
            available: 0,
        })?;
        let expansion = SparseInverseExpansion::build_with(&self.backend, a, modulus, level)?;
        Ok((expansion, precision))
    }

    /// Walk the 31-bit primes until one does not divide det(A)
    fn build_auto(
        &self,
        a: &Matrix<BigInt>,
        bound_sq: &BigInt,
    ) -> Result<(SparseInverseExpansion, usize)> {
        let candidates = PrimeGenerator::generate_31bit_primes(self.config.max_modulus_attempts);
        let mut last_err = None;
        for x in candidates {
            match self.build_for(a, bound_sq, x) {
                Ok(found) => return Ok(found),
                Err(err @ DpolError::InvalidModulus { .. }) => {
                    warn!(modulus = x, "skipping modulus: {}", err);
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or(DpolError::InvalidModulus {
            modulus: 0,
            reason: "no candidate moduli".to_string(),
        }))
    }

    fn choose_level(&self, bound_sq: &BigInt, modulus: u32) -> Result<usize> {
        if modulus < 2 {
            return Err(DpolError::InvalidModulus {
                modulus,
                reason: "radix must be at least 2".to_string(),
            });
        }
        let digits = digits_needed(bound_sq, modulus);
        let level = match self.config.level {
            Some(level) => level,
            None => level_for_digits(digits),
        };
        if level > self.config.max_level {
            return Err(DpolError::PrecisionInsufficient {
                required: digits,
                available: precision_for_level(self.config.max_level).unwrap_or(usize::MAX),
            });
        }
        let available = precision_for_level(level).unwrap_or(usize::MAX);
        if available < digits {
            return Err(DpolError::PrecisionInsufficient {
                required: digits,
                available,
            });
        }
        Ok(level)
    }
}

/// Check A·X = B exactly, reporting the first mismatching entry
pub fn verify_solution(a: &Matrix<BigInt>, b: &Matrix<BigInt>, x: &Matrix<BigInt>) -> Result<()> {
    let ax = a.mul(x)?;
    if ax.dims() != b.dims() {
        return Err(DpolError::dims("verify_solution", b.dims(), ax.dims()));
    }
    for i in 0..b.rows() {
        for j in 0..b.cols() {
            if ax.get(i, j) != b.get(i, j) {
                return Err(DpolError::VerificationFailed { row: i, col: j });
            }
        }
    }
    Ok(())
}

/// Solve A·X = B with the default configuration and CPU oracle
pub fn solve_linear_system(a: &Matrix<BigInt>, b: &Matrix<BigInt>) -> Result<Matrix<BigInt>> {
    DpolSolver::cpu().solve(a, b).map(|r| r.solution)
}
