use std::time::{Duration, Instant};

use bitvec::prelude::*;
use log::trace;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterSet, GrowthPolicy};
use crate::code::Code;
use crate::error::{DecodingError, Result};
use crate::gf2::{self, Gf2Vec};
use crate::peeling;

/// Per-call knobs for the decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderOptions {
    pub growth: GrowthPolicy,
    /// Use the greedy interior reconstruction instead of spanning-forest
    /// peeling.
    pub heuristic_peeling: bool,
    /// Seed for the single-random growth policy; `None` draws fresh
    /// entropy. Ignored by the other policies.
    pub seed: Option<u64>,
}

/// Outcome of one decode call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodingResult {
    /// Qubits that receive a corrective flip.
    pub correction: Gf2Vec,
    pub success: bool,
    pub elapsed: Duration,
    /// Number of growth rounds the cluster manager ran.
    pub rounds: usize,
}

/// Union-Find decoder over a shared read-only [`Code`].
///
/// Every `decode` call owns a fresh union-find forest and cluster set, so
/// independent calls on the same decoder are safe to run from parallel
/// workers with no synchronisation beyond sharing the code.
pub struct UfDecoder<'a> {
    code: &'a Code,
}

impl<'a> UfDecoder<'a> {
    pub fn new(code: &'a Code) -> Self {
        UfDecoder { code }
    }

    pub fn code(&self) -> &Code {
        self.code
    }

    /// Decodes a measured syndrome. Success means the returned correction
    /// reproduces the observed syndrome exactly.
    pub fn decode(&self, syndrome: &BitSlice, options: &DecoderOptions) -> Result<DecodingResult> {
        let begin = Instant::now();
        let (correction, rounds) = self.correction_for(syndrome, options)?;
        let success = self.code.syndrome(&correction).as_bitslice() == syndrome;
        Ok(DecodingResult {
            correction,
            success,
            elapsed: begin.elapsed(),
            rounds,
        })
    }

    /// Simulation-mode decode: the true physical error is known, so success
    /// is judged by whether the residual error acts trivially on the
    /// encoded state.
    pub fn decode_against(
        &self,
        error: &BitSlice,
        options: &DecoderOptions,
    ) -> Result<DecodingResult> {
        let begin = Instant::now();
        let syndrome = self.code.syndrome(error);
        let (correction, rounds) = self.correction_for(&syndrome, options)?;
        let mut residual = correction.clone();
        gf2::xor_into(&mut residual, error);
        let success = self.code.is_stabilizer(&residual);
        Ok(DecodingResult {
            correction,
            success,
            elapsed: begin.elapsed(),
            rounds,
        })
    }

    fn correction_for(
        &self,
        syndrome: &BitSlice,
        options: &DecoderOptions,
    ) -> Result<(Gf2Vec, usize)> {
        let expected = self.code.num_checks();
        if syndrome.len() != expected {
            return Err(DecodingError::SyndromeLengthMismatch {
                expected,
                found: syndrome.len(),
            });
        }
        let mut correction = bitvec![0; self.code.num_qubits()];
        if syndrome.not_any() {
            return Ok((correction, 0));
        }
        let graph = self.code.tanner_graph();
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut cluster_set = ClusterSet::seed(graph, syndrome);
        let rounds = cluster_set.grow_until_valid(options.growth, &mut rng)?;
        let (uf, clusters) = cluster_set.into_parts();
        trace!(
            "growth finished after {:} round(s) with {:} cluster(s)",
            rounds,
            clusters.len()
        );
        for cluster in clusters.iter() {
            if options.heuristic_peeling {
                peeling::peel_cluster_heuristic(graph, cluster, syndrome, &mut correction);
            } else {
                let odd = uf.is_odd(cluster.root);
                peeling::peel_cluster(graph, cluster, syndrome, odd, &mut correction);
            }
        }
        Ok((correction, rounds))
    }
}

#[cfg(test)]
mod tests {
    use super::{DecoderOptions, UfDecoder};
    use crate::cluster::GrowthPolicy;
    use crate::codes::{repetition_code, steane_code, toric_code};
    use crate::error::DecodingError;
    use bitvec::prelude::*;

    fn all_policies() -> [DecoderOptions; 3] {
        [
            DecoderOptions {
                growth: GrowthPolicy::AllClusters,
                ..Default::default()
            },
            DecoderOptions {
                growth: GrowthPolicy::SingleSmallest,
                ..Default::default()
            },
            DecoderOptions {
                growth: GrowthPolicy::SingleRandom,
                seed: Some(1312),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_zero_syndrome_is_trivial() {
        let code = toric_code(3).unwrap();
        let decoder = UfDecoder::new(&code);
        let syndrome = bitvec![0; code.num_checks()];
        let result = decoder.decode(&syndrome, &DecoderOptions::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.rounds, 0);
        assert!(result.correction.not_any());
    }

    #[test]
    fn test_repetition_middle_error_scenario() {
        // checks {q0+q1, q1+q2}: an error on q1 lights both
        let code = repetition_code(3).unwrap();
        let decoder = UfDecoder::new(&code);
        let result = decoder
            .decode(&bitvec![1, 1], &DecoderOptions::default())
            .unwrap();
        assert!(result.success);
        assert_eq!(result.correction, bitvec![0, 1, 0]);
    }

    #[test]
    fn test_syndrome_length_mismatch() {
        let code = repetition_code(3).unwrap();
        let decoder = UfDecoder::new(&code);
        for bad in [bitvec![1], bitvec![1, 1, 0]] {
            let err = decoder.decode(&bad, &DecoderOptions::default());
            assert!(matches!(
                err,
                Err(DecodingError::SyndromeLengthMismatch {
                    expected: 2,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_round_trip_single_qubit_errors() {
        // applying the correction on top of the error clears the syndrome
        for code in [repetition_code(5).unwrap(), steane_code().unwrap(), toric_code(3).unwrap()] {
            let decoder = UfDecoder::new(&code);
            for qubit in 0..code.num_qubits() {
                let mut error = bitvec![0; code.num_qubits()];
                error.set(qubit, true);
                let result = decoder
                    .decode_against(&error, &DecoderOptions::default())
                    .unwrap();
                let residual = crate::sampling::residual(&error, &result.correction);
                assert!(
                    code.syndrome(&residual).not_any(),
                    "correction left a syndrome for an error on qubit {qubit}"
                );
                assert!(result.success);
            }
        }
    }

    #[test]
    fn test_round_trip_two_qubit_errors_toric() {
        let code = toric_code(3).unwrap();
        let decoder = UfDecoder::new(&code);
        for a in 0..code.num_qubits() {
            for b in (a + 1)..code.num_qubits() {
                let mut error = bitvec![0; code.num_qubits()];
                error.set(a, true);
                error.set(b, true);
                let result = decoder
                    .decode_against(&error, &DecoderOptions::default())
                    .unwrap();
                let residual = crate::sampling::residual(&error, &result.correction);
                assert!(code.syndrome(&residual).not_any());
            }
        }
    }

    #[test]
    fn test_growth_variants_all_resolve_the_syndrome() {
        let code = toric_code(3).unwrap();
        let decoder = UfDecoder::new(&code);
        let mut error = bitvec![0; code.num_qubits()];
        error.set(1, true);
        error.set(10, true);
        error.set(14, true);
        let syndrome = code.syndrome(&error);
        for options in all_policies() {
            let result = decoder.decode(&syndrome, &options).unwrap();
            assert!(
                result.success,
                "policy {:} failed to resolve the syndrome",
                options.growth
            );
            assert_eq!(code.syndrome(&result.correction), syndrome);
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        let code = toric_code(3).unwrap();
        let decoder = UfDecoder::new(&code);
        let mut error = bitvec![0; code.num_qubits()];
        error.set(0, true);
        error.set(7, true);
        let syndrome = code.syndrome(&error);
        let options = DecoderOptions {
            growth: GrowthPolicy::SingleRandom,
            seed: Some(99),
            ..Default::default()
        };
        let first = decoder.decode(&syndrome, &options).unwrap();
        let second = decoder.decode(&syndrome, &options).unwrap();
        assert_eq!(first.correction, second.correction);
        assert_eq!(first.rounds, second.rounds);
    }

    #[test]
    fn test_heuristic_peeling_round_trip() {
        for code in [repetition_code(3).unwrap(), toric_code(3).unwrap()] {
            let decoder = UfDecoder::new(&code);
            let options = DecoderOptions {
                heuristic_peeling: true,
                ..Default::default()
            };
            for qubit in 0..code.num_qubits() {
                let mut error = bitvec![0; code.num_qubits()];
                error.set(qubit, true);
                let result = decoder.decode_against(&error, &options).unwrap();
                let residual = crate::sampling::residual(&error, &result.correction);
                assert!(code.syndrome(&residual).not_any());
            }
        }
    }

    #[test]
    fn test_boundary_error_on_repetition_code() {
        let code = repetition_code(3).unwrap();
        let decoder = UfDecoder::new(&code);
        let mut error = bitvec![0; 3];
        error.set(0, true);
        let result = decoder
            .decode_against(&error, &DecoderOptions::default())
            .unwrap();
        assert!(result.success);
        // the lone defect drains into the boundary qubit
        assert_eq!(result.correction, error);
    }

    #[test]
    fn test_unreachable_syndrome_overflows() {
        let code = toric_code(2).unwrap();
        let decoder = UfDecoder::new(&code);
        let mut syndrome = bitvec![0; code.num_checks()];
        syndrome.set(0, true);
        let err = decoder.decode(&syndrome, &DecoderOptions::default());
        assert!(matches!(
            err,
            Err(DecodingError::ClusterGrowthOverflow { .. })
        ));
    }
}
