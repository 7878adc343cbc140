//! DPOL CLI
//!
//! Exact integer linear system solving by Double Plus One Lifting.
//!
//! # Usage
//! ```bash
//! # Solve a system read from a text file
//! dpol solve --input system.txt
//!
//! # Pin the radix and lifting level
//! dpol solve --input system.txt --modulus 101 --level 4
//!
//! # Scaling benchmark on random systems
//! dpol bench --sizes 8,16,32 --rhs 4 --export results.csv
//! ```

mod benchmark;
mod input;

use clap::{Parser, Subcommand};
use dpol_core::{CpuBackend, DpolConfig, DpolSolver};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dpol")]
#[command(about = "Exact integer linear system solving by Double Plus One Lifting")]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve A·X = B for a system read from a file
    Solve {
        /// System file: "n m", then n rows of A, then n rows of B
        #[arg(long)]
        input: PathBuf,

        /// Prime radix X (default: first 31-bit prime coprime with det A)
        #[arg(long)]
        modulus: Option<u32>,

        /// Lifting level k (default: derived from the solution bound)
        #[arg(long)]
        level: Option<usize>,

        /// Skip the exact A·X = B check
        #[arg(long)]
        no_verify: bool,
    },

    /// Benchmark DPOL on random diagonally dominant systems
    Bench {
        /// Matrix sizes to benchmark (comma-separated)
        #[arg(long, default_value = "8,16,32,64")]
        sizes: String,

        /// Number of RHS columns
        #[arg(long, default_value = "4")]
        rhs: usize,

        /// Bound on off-diagonal entries of A and on entries of the solution
        #[arg(long, default_value = "50")]
        bound: i64,

        /// Seed for the random systems
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of trials per size
        #[arg(long, default_value = "3")]
        trials: usize,

        /// Prime radix X (default: automatic)
        #[arg(long)]
        modulus: Option<u32>,

        /// Export results to CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Solve {
            input,
            modulus,
            level,
            no_verify,
        } => {
            let config = DpolConfig {
                modulus,
                level,
                verify: !no_verify,
                ..DpolConfig::default()
            };
            run_solve(&input, config)
        }
        Commands::Bench {
            sizes,
            rhs,
            bound,
            seed,
            trials,
            modulus,
            export,
        } => {
            let config = DpolConfig {
                modulus,
                ..DpolConfig::default()
            };
            benchmark::run_benchmark(&sizes, rhs, bound, seed, trials, config, export)
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            error!("{}", msg);
            ExitCode::FAILURE
        }
    }
}

fn run_solve(path: &Path, config: DpolConfig) -> Result<(), String> {
    let system = input::read_system(path)?;
    let solver = DpolSolver::with_config(CpuBackend::new(), config);
    let result = solver
        .solve(&system.a, &system.b)
        .map_err(|e| format!("solve failed: {}", e))?;

    println!(
        "# n={} m={} X={} k={} p={} verified={}",
        system.a.rows(),
        system.b.cols(),
        result.modulus,
        result.level,
        result.precision,
        result.verified
    );
    for i in 0..result.solution.rows() {
        let row: Vec<String> = result.solution.row(i).iter().map(|v| v.to_string()).collect();
        println!("{}", row.join(" "));
    }
    println!(
        "# build {:.3} ms, apply {:.3} ms, total {:.3} ms",
        result.timings.build_ms, result.timings.apply_ms, result.timings.total_ms
    );
    Ok(())
}
