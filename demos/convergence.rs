//! Range/bearing convergence example
//!
//! Runs the reference experiment (or one loaded from JSON) and prints the
//! final estimate and the error-vs-sample-count curve.
//!
//! Run with: cargo run --example convergence -- --config demos/reference_experiment.json

use clap::Parser;
use rangebearing_filter::{
    monte_carlo_error_curve, run_experiment_with_reporter, ExperimentConfig, LoggingReporter,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Random seed for the measurement noise (default: from config, 42)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of measurements to fuse (default: from config, 1000)
    #[arg(short = 'n', long)]
    samples: Option<usize>,

    /// Monte Carlo trials for the averaged error curve (0 disables)
    #[arg(short, long, default_value_t = 0)]
    trials: usize,

    /// Experiment configuration JSON (overrides the reference scenario)
    #[arg(short, long)]
    config: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Log every step (set RUST_LOG=debug to see it)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let base = match &args.config {
        Some(path) => match ExperimentConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => ExperimentConfig::pedagogical(),
    };
    let mut config = base;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(samples) = args.samples {
        config.n_samples = samples;
    }

    let mut reporter = if args.verbose {
        LoggingReporter::verbose()
    } else {
        LoggingReporter::new()
    };

    let report = match run_experiment_with_reporter(&config, &mut reporter) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Experiment failed: {}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("Range/Bearing Information Filter");
    println!("================================");
    println!("Seed: {}", config.seed);
    println!(
        "Ground truth: ({:.4}, {:.4})",
        config.ground_truth[0], config.ground_truth[1]
    );
    println!("Samples: {}", config.n_samples);
    println!();
    println!(
        "Final estimate: ({:.4}, {:.4})",
        report.final_mean[0], report.final_mean[1]
    );
    println!("Final error: {:.5}", report.final_error);
    println!("trace(Q): {:.3e}", report.final_trace);
    println!();
    println!("Error vs samples:");
    for point in &report.error_curve {
        println!("  n={:5}: {:.5}", point.samples, point.error);
    }

    if args.trials > 0 {
        println!();
        println!("Mean error over {} trials:", args.trials);
        match monte_carlo_error_curve(&config, args.trials) {
            Ok(curve) => {
                for p in &curve.points {
                    println!(
                        "  n={:5}: mean {:.5}  max {:.5}",
                        p.samples, p.mean_error, p.max_error
                    );
                }
            }
            Err(e) => eprintln!("Monte Carlo run failed: {}", e),
        }
    }
}
