//! Property tests for the X-adic primitives and the DPOL solver

use dpol_core::solve::{digits_needed, solution_bound_sq};
use dpol_core::{
    build_expansion, decode, encode, normalize, shift, solve_linear_system, CpuBackend,
    DpolConfig, DpolError, DpolSolver, Matrix, XadicMatrix,
};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Pow;
use proptest::prelude::*;

const SMALL_PRIMES: [u32; 8] = [2, 3, 5, 7, 11, 13, 101, 65521];
const SMALL_RADICES: [u32; 3] = [5, 7, 11];

fn x_pow(modulus: u32, precision: usize) -> BigInt {
    Pow::pow(&BigInt::from(modulus), precision)
}

/// (modulus, precision, rows, cols, raw entries)
fn encoding_params() -> impl Strategy<Value = (u32, usize, usize, usize, Vec<i64>)> {
    (2u32..60, 1usize..6, 1usize..4, 1usize..4).prop_flat_map(|(x, p, n, m)| {
        (
            Just(x),
            Just(p),
            Just(n),
            Just(m),
            proptest::collection::vec(any::<i64>(), n * m),
        )
    })
}

/// Diagonally dominant n×n matrix plus an n×m integral solution
fn system_params() -> impl Strategy<Value = (usize, Vec<i64>, usize, Vec<i64>)> {
    (1usize..5, 1usize..3).prop_flat_map(|(n, m)| {
        (
            Just(n),
            proptest::collection::vec(-40i64..40, n * n),
            Just(m),
            proptest::collection::vec(-1_000_000i64..1_000_000, n * m),
        )
    })
}

fn dominant(n: usize, raw: &[i64]) -> Matrix<BigInt> {
    let mut data = raw.to_vec();
    for i in 0..n {
        data[i * n + i] = 50 * n as i64 + raw[i * n + i].abs();
    }
    Matrix::from_i64(&data, n, n).unwrap()
}

proptest! {
    #[test]
    fn prop_round_trip((x, p, n, m, raw) in encoding_params()) {
        let range = x_pow(x, p);
        let a = Matrix::from_i64(&raw, n, m).unwrap().mod_floor(&range);
        let enc = encode(&a, x, p).unwrap();
        prop_assert!(enc.is_clean());
        prop_assert_eq!(decode(&enc), a);
    }

    #[test]
    fn prop_signed_round_trip((x, p, n, m, raw) in encoding_params()) {
        let range = x_pow(x, p);
        let half = &range / 2;
        // fold every entry into (−X^p/2, X^p/2]
        let a = Matrix::from_i64(&raw, n, m).unwrap().map(|v| {
            let r = v.mod_floor(&range);
            if r > half { r - &range } else { r }
        });
        let enc = encode(&a, x, p).unwrap();
        prop_assert_eq!(enc.decode_signed(), a);
    }

    #[test]
    fn prop_shift_law((x, p, n, m, raw) in encoding_params(), s in 0usize..8) {
        let range = x_pow(x, p);
        let a = Matrix::from_i64(&raw, n, m).unwrap().mod_floor(&range);
        let shifted = decode(&shift(&encode(&a, x, p).unwrap(), s));

        let scale = x_pow(x, s);
        let expected = a.map(|v| (v * &scale).mod_floor(&range));
        prop_assert_eq!(&shifted, &expected);
        if s >= p {
            prop_assert!(shifted.is_zero());
        }
    }

    #[test]
    fn prop_shift_exact_below_capacity(
        (x, p, n, m, raw) in encoding_params(),
        s in 0usize..6,
    ) {
        prop_assume!(s < p);
        // entries with at most p − s digits survive the shift untouched
        let a = Matrix::from_i64(&raw, n, m).unwrap().mod_floor(&x_pow(x, p - s));
        let shifted = decode(&shift(&encode(&a, x, p).unwrap(), s));
        let scale = x_pow(x, s);
        prop_assert_eq!(shifted, a.map(|v| v * &scale));
    }

    #[test]
    fn prop_normalize((x, p, n, m, raw) in encoding_params()) {
        let digits: Vec<BigInt> = raw
            .iter()
            .cycle()
            .take(n * m * p)
            .map(|&v| BigInt::from(v % 10_000))
            .collect();
        let dirty = XadicMatrix::from_raw(
            Matrix::from_flat(digits, n, m * p).unwrap(),
            x,
            m,
            p,
        )
        .unwrap();

        let mut once = dirty.clone();
        let overflowed = once.normalize();
        prop_assert!(once.is_clean());
        prop_assert_eq!(&normalize(&once), &once);

        let range = x_pow(x, p);
        prop_assert_eq!(
            once.decode(),
            dirty.decode().mod_floor(&range)
        );
        if !overflowed {
            prop_assert_eq!(once.decode(), dirty.decode());
        }
    }

    #[test]
    fn prop_inverse_congruence(
        (n, raw, _m, _sol) in system_params(),
        x in proptest::sample::select(SMALL_PRIMES.to_vec()),
        level in 0usize..3,
    ) {
        let a = dominant(n, &raw);
        let expansion = match build_expansion(&a, x, level) {
            Ok(e) => e,
            Err(DpolError::InvalidModulus { .. }) => return Ok(()),
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        };
        let modulus = BigInt::from(x);
        let product = a.mul(expansion.a0()).unwrap().mod_floor(&modulus);
        prop_assert_eq!(product, Matrix::identity(n));

        // the whole expansion inverts A to 2^(k+1) − 1 digits
        let p = expansion.precision().unwrap();
        let c = expansion
            .apply(&encode(&Matrix::identity(n), x, p).unwrap())
            .unwrap();
        let check = a.mul(&c.decode()).unwrap().mod_floor(&x_pow(x, p));
        prop_assert_eq!(check, Matrix::identity(n));
    }

    #[test]
    fn prop_end_to_end((n, raw, m, sol) in system_params()) {
        let a = dominant(n, &raw);
        let x_true = Matrix::from_i64(&sol, n, m).unwrap();
        let b = a.mul(&x_true).unwrap();

        let x = solve_linear_system(&a, &b).unwrap();
        prop_assert_eq!(a.mul(&x).unwrap(), b);
        prop_assert_eq!(x, x_true);
    }

    #[test]
    fn prop_pinned_small_radix(
        (n, raw, m, sol) in system_params(),
        x in proptest::sample::select(SMALL_RADICES.to_vec()),
    ) {
        let a = dominant(n, &raw);
        let x_true = Matrix::from_i64(&sol, n, m).unwrap();
        let b = a.mul(&x_true).unwrap();

        let solver = DpolSolver::with_config(CpuBackend::new(), DpolConfig::with_modulus(x));
        let result = match solver.solve(&a, &b) {
            Ok(r) => r,
            Err(DpolError::InvalidModulus { .. }) => return Ok(()),
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        };
        prop_assert_eq!(result.modulus, x);
        prop_assert!(result.precision >= digits_needed(&solution_bound_sq(&a, &b), x));
        prop_assert_eq!(result.solution, x_true);
    }
}
