//! DPOL Core Library
//!
//! Exact integer linear system solving by Double Plus One Lifting.
//!
//! # Overview
//!
//! A⁻¹·B is computed X-adically: a sparse expansion of A⁻¹ (one modular
//! inverse plus two small tables per doubling step) is applied to a
//! digit-sliced encoding of B, with a carry sweep after every
//! multiply-accumulate so digit magnitudes never grow with the precision.
//!
//! # Key Components
//!
//! - [`matrix`] - Dense big-integer matrix operations
//! - [`backend`] - Modular inverse oracle (CPU Gauss-Jordan)
//! - [`primes`] - Prime radix generation
//! - [`xadic`] - X-adic encoding, shift and carry normalization
//! - [`expansion`] - Expansion construction and application
//! - [`solve`] - Parameter selection and the end-to-end solver
//!
//! # Example
//!
//! ```
//! use dpol_core::{solve_linear_system, Matrix};
//!
//! let a = Matrix::from_i64(&[2, 1, 1, 1], 2, 2).unwrap();
//! let b = Matrix::from_i64(&[1, 0], 2, 1).unwrap();
//! let x = solve_linear_system(&a, &b).unwrap();
//! assert_eq!(x, Matrix::from_i64(&[1, -1], 2, 1).unwrap());
//! ```

pub mod backend;
pub mod error;
pub mod expansion;
pub mod matrix;
pub mod primes;
pub mod solve;
pub mod xadic;

pub use backend::{Backend, CpuBackend};
pub use error::{DpolError, Result};
pub use expansion::{apply, build_expansion, precision_for_level, SparseInverseExpansion};
pub use matrix::Matrix;
pub use primes::PrimeGenerator;
pub use solve::{
    solve_linear_system, verify_solution, DpolConfig, DpolResult, DpolSolver, DpolTimings,
};
pub use xadic::{decode, encode, normalize, shift, XadicMatrix};
