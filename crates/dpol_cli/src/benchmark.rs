//! DPOL scaling benchmark
//!
//! Random diagonally dominant systems with a known integral solution:
//! B = A·X_true, so every run doubles as a correctness check.

use dpol_core::{CpuBackend, DpolConfig, DpolSolver, Matrix, Result as DpolResult};
use num_bigint::BigInt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
struct BenchResult {
    n: usize,
    rhs: usize,
    modulus: u32,
    level: usize,
    precision: usize,
    build_ms: f64,
    apply_ms: f64,
    total_ms: f64,
    result_hash: String,
}

pub fn run_benchmark(
    sizes_str: &str,
    rhs: usize,
    bound: i64,
    seed: u64,
    trials: usize,
    config: DpolConfig,
    export: Option<PathBuf>,
) -> Result<(), String> {
    let sizes = parse_sizes(sizes_str)?;
    if bound < 1 {
        return Err("bound must be positive".to_string());
    }
    let trials = trials.max(1);

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║           DPOL - Double Plus One Lifting Benchmark           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Configuration:");
    println!("  Sizes:  {:?}", sizes);
    println!("  RHS:    {}", rhs);
    println!("  Bound:  {}", bound);
    println!("  Trials: {}", trials);
    println!();

    let solver = DpolSolver::with_config(CpuBackend::new(), config);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut results = Vec::with_capacity(sizes.len());

    println!("┌────────┬────────────┬─────┬───────┬────────────┬────────────┬────────────┐");
    println!("│   n    │     X      │  k  │   p   │ Build(ms)  │ Apply(ms)  │ Total(ms)  │");
    println!("├────────┼────────────┼─────┼───────┼────────────┼────────────┼────────────┤");

    for &n in &sizes {
        let (a, x_true, b) = generate_system(&mut rng, n, rhs, bound).map_err(|e| e.to_string())?;

        let mut build_ms = 0.0;
        let mut apply_ms = 0.0;
        let mut total_ms = 0.0;
        let mut last = None;
        for _ in 0..trials {
            let result = solver.solve(&a, &b).map_err(|e| format!("n={}: {}", n, e))?;
            build_ms += result.timings.build_ms;
            apply_ms += result.timings.apply_ms;
            total_ms += result.timings.total_ms;
            last = Some(result);
        }
        let Some(result) = last else { continue };
        if result.solution != x_true {
            return Err(format!("n={}: recovered solution differs from X_true", n));
        }

        let t = trials as f64;
        let row = BenchResult {
            n,
            rhs,
            modulus: result.modulus,
            level: result.level,
            precision: result.precision,
            build_ms: build_ms / t,
            apply_ms: apply_ms / t,
            total_ms: total_ms / t,
            result_hash: compute_result_hash(&result.solution),
        };
        println!(
            "│ {:>6} │ {:>10} │ {:>3} │ {:>5} │ {:>10.3} │ {:>10.3} │ {:>10.3} │",
            row.n, row.modulus, row.level, row.precision, row.build_ms, row.apply_ms, row.total_ms
        );
        info!(n, hash = %row.result_hash, "solution digest");
        results.push(row);
    }

    println!("└────────┴────────────┴─────┴───────┴────────────┴────────────┴────────────┘");

    if let Some(path) = export {
        export_results(&path, &results)?;
        println!("\nResults exported to: {}", path.display());
    }
    Ok(())
}

/// Comma-separated positive matrix sizes; any malformed token is an error
fn parse_sizes(sizes_str: &str) -> Result<Vec<usize>, String> {
    let sizes = sizes_str
        .split(',')
        .map(|tok| match tok.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("invalid size '{}' in '{}'", tok.trim(), sizes_str)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if sizes.is_empty() {
        return Err(format!("no sizes in '{}'", sizes_str));
    }
    Ok(sizes)
}

/// (A, X_true, B = A·X_true)
fn generate_system(
    rng: &mut StdRng,
    n: usize,
    rhs: usize,
    bound: i64,
) -> DpolResult<(Matrix<BigInt>, Matrix<BigInt>, Matrix<BigInt>)> {
    let a = generate_dominant_matrix(rng, n, bound)?;
    let x_true = generate_solution(rng, n, rhs, bound)?;
    let b = a.mul(&x_true)?;
    Ok((a, x_true, b))
}

/// Off-diagonal entries in [-bound, bound], diagonal large enough to dominate
fn generate_dominant_matrix(rng: &mut StdRng, n: usize, bound: i64) -> DpolResult<Matrix<BigInt>> {
    let mut data = vec![BigInt::from(0); n * n];
    for i in 0..n {
        for j in 0..n {
            data[i * n + j] = if i == j {
                BigInt::from(bound) * n + rng.gen_range(1..=bound)
            } else {
                BigInt::from(rng.gen_range(-bound..=bound))
            };
        }
    }
    Matrix::from_flat(data, n, n)
}

fn generate_solution(rng: &mut StdRng, n: usize, rhs: usize, bound: i64) -> DpolResult<Matrix<BigInt>> {
    let data = (0..n * rhs)
        .map(|_| BigInt::from(rng.gen_range(-bound..=bound)))
        .collect();
    Matrix::from_flat(data, n, rhs)
}

/// Compute SHA256 hash of solution for deterministic verification
fn compute_result_hash(solution: &Matrix<BigInt>) -> String {
    let mut hasher = Sha256::new();
    for val in solution.as_slice() {
        hasher.update(val.to_string().as_bytes());
        hasher.update(b",");
    }
    format!("{:x}", hasher.finalize())
}

fn export_results(path: &Path, results: &[BenchResult]) -> Result<(), String> {
    let mut file =
        File::create(path).map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    let mut write = || -> std::io::Result<()> {
        writeln!(file, "n,rhs,modulus,level,precision,build_ms,apply_ms,total_ms,result_hash")?;
        for r in results {
            writeln!(
                file,
                "{},{},{},{},{},{:.6},{:.6},{:.6},{}",
                r.n,
                r.rhs,
                r.modulus,
                r.level,
                r.precision,
                r.build_ms,
                r.apply_ms,
                r.total_ms,
                r.result_hash
            )?;
        }
        Ok(())
    };
    write().map_err(|e| format!("cannot write {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Signed;

    #[test]
    fn test_generated_system_solves() {
        let mut rng = StdRng::seed_from_u64(1);
        let (a, x_true, b) = generate_system(&mut rng, 6, 2, 20).unwrap();

        let result = DpolSolver::cpu().solve(&a, &b).unwrap();
        assert_eq!(result.solution, x_true);
    }

    #[test]
    fn test_parse_sizes() {
        assert_eq!(parse_sizes("8, 16,32").unwrap(), vec![8, 16, 32]);
        assert!(parse_sizes("8,x,32").is_err());
        assert!(parse_sizes("8,,32").is_err());
        assert!(parse_sizes("0").is_err());
        assert!(parse_sizes("").is_err());
    }

    #[test]
    fn test_dominant_diagonal_with_extreme_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 3;
        let a = generate_dominant_matrix(&mut rng, n, i64::MAX).unwrap();
        for i in 0..n {
            let off: BigInt = (0..n)
                .filter(|&j| j != i)
                .map(|j| a.get(i, j).abs())
                .sum();
            assert!(a.get(i, i) > &off);
        }
    }

    #[test]
    fn test_result_hash_is_stable() {
        let x = Matrix::from_i64(&[1, -2, 3], 3, 1).unwrap();
        assert_eq!(compute_result_hash(&x), compute_result_hash(&x.clone()));
        let y = Matrix::from_i64(&[1, -2, 4], 3, 1).unwrap();
        assert_ne!(compute_result_hash(&x), compute_result_hash(&y));
    }
}
