//! Text format for linear systems
//!
//! ```text
//! # comment
//! 2 1        <- n m
//! 2 1        <- n rows of A (n entries each)
//! 1 1
//! 1          <- n rows of B (m entries each)
//! 0
//! ```
//!
//! Tokens are whitespace separated; line breaks are not significant.

use dpol_core::Matrix;
use num_bigint::BigInt;
use std::fs;
use std::path::Path;

/// A system A·X = B read from disk
pub struct System {
    pub a: Matrix<BigInt>,
    pub b: Matrix<BigInt>,
}

pub fn read_system(path: &Path) -> Result<System, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    parse_system(&text)
}

pub fn parse_system(text: &str) -> Result<System, String> {
    let mut tokens = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace);

    let mut next_usize = |what: &str| -> Result<usize, String> {
        let tok = tokens.next().ok_or_else(|| format!("missing {}", what))?;
        tok.parse()
            .map_err(|_| format!("invalid {} '{}'", what, tok))
    };
    let n = next_usize("row count n")?;
    let m = next_usize("column count m")?;

    let mut read_entries = |count: usize, what: &str| -> Result<Vec<BigInt>, String> {
        (0..count)
            .map(|idx| {
                let tok = tokens
                    .next()
                    .ok_or_else(|| format!("{} has {} entries, expected {}", what, idx, count))?;
                tok.parse::<BigInt>()
                    .map_err(|_| format!("invalid integer '{}' in {}", tok, what))
            })
            .collect()
    };
    let a_data = read_entries(n * n, "A")?;
    let b_data = read_entries(n * m, "B")?;
    if let Some(extra) = tokens.next() {
        return Err(format!("unexpected trailing token '{}'", extra));
    }

    let a = Matrix::from_flat(a_data, n, n).map_err(|e| e.to_string())?;
    let b = Matrix::from_flat(b_data, n, m).map_err(|e| e.to_string())?;
    Ok(System { a, b })
}
