use std::path::PathBuf;

use clap::Parser;
use log::info;
use simple_logger::SimpleLogger;

use uf_decoder::codes::toric_code;
use uf_decoder::stats::{error_rate_sweep, monte_carlo};
use uf_decoder::{DecoderOptions, GrowthPolicy};

fn parse_growth(s: &str) -> Result<GrowthPolicy, String> {
    s.parse()
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Cli {
    /// Average decoding runtime on a toric code at a fixed error rate.
    Runtime {
        #[arg(long, default_value_t = 5)]
        distance: usize,
        #[arg(long, default_value_t = 0.01)]
        error_rate: f64,
        #[arg(long, default_value_t = 1000)]
        trials: usize,
        #[arg(long, default_value = "all-clusters", value_parser = parse_growth)]
        growth: GrowthPolicy,
        #[arg(long)]
        heuristic: bool,
        /// Write the aggregated statistics to this file as JSON.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Word-error-rate sweep over a range of physical error rates.
    Wer {
        #[arg(long, default_value_t = 5)]
        distance: usize,
        #[arg(long, default_value_t = 0.01)]
        min_rate: f64,
        #[arg(long, default_value_t = 0.05)]
        max_rate: f64,
        #[arg(long, default_value_t = 0.01)]
        step: f64,
        #[arg(long, default_value_t = 500)]
        trials_per_rate: usize,
        #[arg(long, default_value = "all-clusters", value_parser = parse_growth)]
        growth: GrowthPolicy,
        #[arg(long)]
        heuristic: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    SimpleLogger::new().init().expect("Could not init logger.");
    let cli = Cli::parse();
    match cli {
        Cli::Runtime {
            distance,
            error_rate,
            trials,
            growth,
            heuristic,
            out,
        } => {
            let code = toric_code(distance).expect("Could not build toric code.");
            let options = DecoderOptions {
                growth,
                heuristic_peeling: heuristic,
                seed: None,
            };
            info!(
                "runtime run: distance {:}, p={:}, {:} trials, {:} growth",
                distance, error_rate, trials, growth
            );
            let run = monte_carlo(&code, error_rate, trials, &options)
                .expect("decoding failed mid-run");
            info!(
                "success rate {:.4}, mean decode time {:.3e}s (variance {:.3e})",
                run.success_rate(),
                run.mean_time_secs(),
                run.time_variance_secs()
            );
            let report = serde_json::to_string_pretty(&run).expect("Could not serialize report.");
            match out {
                Some(path) => std::fs::write(path, report).expect("Could not write report."),
                None => println!("{report}"),
            }
        }
        Cli::Wer {
            distance,
            min_rate,
            max_rate,
            step,
            trials_per_rate,
            growth,
            heuristic,
            out,
        } => {
            let code = toric_code(distance).expect("Could not build toric code.");
            let options = DecoderOptions {
                growth,
                heuristic_peeling: heuristic,
                seed: None,
            };
            info!(
                "WER sweep: distance {:}, p in [{:}, {:}] step {:}, {:} trials per rate",
                distance, min_rate, max_rate, step, trials_per_rate
            );
            let sweep = error_rate_sweep(&code, min_rate, max_rate, step, trials_per_rate, &options)
                .expect("decoding failed mid-sweep");
            let report = serde_json::to_string_pretty(&sweep).expect("Could not serialize report.");
            match out {
                Some(path) => std::fs::write(path, report).expect("Could not write report."),
                None => println!("{report}"),
            }
        }
    }
}
