use bitvec::prelude::*;
use rand::Rng;

use crate::gf2::Gf2Vec;

/// Samples a physical error where every qubit flips independently with the
/// given rate.
pub fn sample_iid_error<R: Rng>(num_qubits: usize, physical_error_rate: f64, rng: &mut R) -> Gf2Vec {
    let mut error = bitvec![0; num_qubits];
    for ix in 0..num_qubits {
        if rng.gen_bool(physical_error_rate) {
            error.set(ix, true);
        }
    }
    error
}

/// Residual error left after applying a correction, i.e. the bitwise XOR of
/// the two.
pub fn residual(error: &BitSlice, correction: &BitSlice) -> Gf2Vec {
    assert_eq!(
        error.len(),
        correction.len(),
        "error and correction act on different qubit counts"
    );
    let mut out = error.to_bitvec();
    for ix in correction.iter_ones() {
        let flipped = !out[ix];
        out.set(ix, flipped);
    }
    out
}

mod tests {
    use super::{residual, sample_iid_error};
    use bitvec::prelude::*;
    use rand::prelude::*;

    #[test]
    fn test_sample_extremes() {
        let mut rng = thread_rng();
        assert!(sample_iid_error(50, 0.0, &mut rng).not_any());
        assert!(sample_iid_error(50, 1.0, &mut rng).all());
    }

    #[test]
    fn test_residual_cancels_matching_correction() {
        let error = bitvec![1, 0, 1, 0];
        assert!(residual(&error, &error).not_any());
        let correction = bitvec![1, 0, 0, 0];
        assert_eq!(residual(&error, &correction), bitvec![0, 0, 1, 0]);
    }
}
