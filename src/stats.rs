use std::collections::BTreeMap;
use std::sync::Mutex;

use log::info;
use rand::thread_rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::code::Code;
use crate::decoder::{DecoderOptions, DecodingResult, UfDecoder};
use crate::error::Result;
use crate::sampling;

/// Aggregate over many independent decode trials: running success count,
/// Welford mean/variance of the per-call decoding time, and a histogram of
/// growth round counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodingRunInformation {
    pub trials: usize,
    pub successes: usize,
    mean_time_secs: f64,
    m2_time_secs: f64,
    pub rounds_histogram: BTreeMap<usize, usize>,
}

impl DecodingRunInformation {
    pub fn new() -> Self {
        DecodingRunInformation::default()
    }

    /// Folds one decode outcome into the aggregate.
    pub fn record(&mut self, result: &DecodingResult) {
        self.trials += 1;
        if result.success {
            self.successes += 1;
        }
        let secs = result.elapsed.as_secs_f64();
        let delta = secs - self.mean_time_secs;
        self.mean_time_secs += delta / self.trials as f64;
        self.m2_time_secs += delta * (secs - self.mean_time_secs);
        *self.rounds_histogram.entry(result.rounds).or_insert(0) += 1;
    }

    /// Combines two aggregates (Chan's parallel update for the variance).
    pub fn merge(&mut self, other: &DecodingRunInformation) {
        if other.trials == 0 {
            return;
        }
        if self.trials == 0 {
            *self = other.clone();
            return;
        }
        let n_self = self.trials as f64;
        let n_other = other.trials as f64;
        let total = n_self + n_other;
        let delta = other.mean_time_secs - self.mean_time_secs;
        self.m2_time_secs += other.m2_time_secs + delta * delta * n_self * n_other / total;
        self.mean_time_secs = (n_self * self.mean_time_secs + n_other * other.mean_time_secs) / total;
        self.trials += other.trials;
        self.successes += other.successes;
        for (&rounds, &count) in other.rounds_histogram.iter() {
            *self.rounds_histogram.entry(rounds).or_insert(0) += count;
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.successes as f64 / self.trials as f64
    }

    pub fn mean_time_secs(&self) -> f64 {
        self.mean_time_secs
    }

    /// Population variance of the per-call decoding time.
    pub fn time_variance_secs(&self) -> f64 {
        if self.trials < 2 {
            return 0.0;
        }
        self.m2_time_secs / self.trials as f64
    }
}

/// Monte-Carlo sweep: `trials` independent decode calls on iid sampled
/// errors, run across the rayon pool. Each call owns its own scratch state;
/// only the fold into the accumulator is serialized behind a lock.
pub fn monte_carlo(
    code: &Code,
    physical_error_rate: f64,
    trials: usize,
    options: &DecoderOptions,
) -> Result<DecodingRunInformation> {
    let decoder = UfDecoder::new(code);
    let info = Mutex::new(DecodingRunInformation::new());
    (0..trials).into_par_iter().try_for_each(|_| -> Result<()> {
        let mut rng = thread_rng();
        let error = sampling::sample_iid_error(code.num_qubits(), physical_error_rate, &mut rng);
        let result = decoder.decode_against(&error, options)?;
        info.lock().expect("statistics lock poisoned").record(&result);
        Ok(())
    })?;
    Ok(info.into_inner().expect("statistics lock poisoned"))
}

/// Word-error-rate sweep over a range of physical error rates, inclusive of
/// both endpoints up to floating point noise.
pub fn error_rate_sweep(
    code: &Code,
    min_rate: f64,
    max_rate: f64,
    step: f64,
    trials_per_rate: usize,
    options: &DecoderOptions,
) -> Result<Vec<(f64, DecodingRunInformation)>> {
    assert!(step > 0.0, "step must be positive");
    let mut out = Vec::new();
    let mut rate = min_rate;
    while rate <= max_rate + f64::EPSILON {
        let run = monte_carlo(code, rate, trials_per_rate, options)?;
        info!(
            "p={:.4}: {:}/{:} trials succeeded, mean decode time {:.3e}s",
            rate,
            run.successes,
            run.trials,
            run.mean_time_secs()
        );
        out.push((rate, run));
        rate += step;
    }
    Ok(out)
}
