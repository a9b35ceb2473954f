use bitvec::prelude::*;

use crate::code::Code;
use crate::error::Result;
use crate::gf2::{Gf2Matrix, Gf2Vec};

/// Length-`n` repetition code with open boundaries: checks compare
/// neighbouring qubits, the all-ones vector flips the encoded bit. Needs
/// `n >= 2`; odd `n` gives the usual distance-`n` code.
pub fn repetition_code(n: usize) -> Result<Code> {
    assert!(n >= 2, "repetition code needs at least 2 qubits");
    let mut h = Gf2Matrix::zeros(n - 1, n);
    for ix in 0..n - 1 {
        h.set(ix, ix, true);
        h.set(ix, ix + 1, true);
    }
    let mut logical: Gf2Vec = bitvec![0; n];
    logical.fill(true);
    Code::with_logicals(h, vec![logical])
}

/// One sector of the 7-qubit Steane code: the Hamming parity checks with
/// the transversal all-ones logical.
pub fn steane_code() -> Result<Code> {
    Code::from_rows(
        &[
            vec![0, 0, 0, 1, 1, 1, 1],
            vec![0, 1, 1, 0, 0, 1, 1],
            vec![1, 0, 1, 0, 1, 0, 1],
        ],
        vec![bitvec![1; 7]],
    )
}

/// One sector of the distance-`d` toric code on a periodic `d x d` lattice.
///
/// Qubits sit on edges (`d^2` horizontal then `d^2` vertical), checks are
/// the plaquettes; every edge belongs to exactly two plaquettes, so the
/// graph is closed and clusters can only become valid by pairing defects.
/// The two logicals are the winding cuts: a column of horizontal edges and
/// a row of vertical edges.
pub fn toric_code(d: usize) -> Result<Code> {
    assert!(d >= 2, "toric code needs distance at least 2");
    let n_qubits = 2 * d * d;
    let mut h = Gf2Matrix::zeros(d * d, n_qubits);
    for row in 0..d {
        for col in 0..d {
            let face = row * d + col;
            h.set(face, h_edge(d, row, col), true);
            h.set(face, h_edge(d, (row + 1) % d, col), true);
            h.set(face, v_edge(d, row, col), true);
            h.set(face, v_edge(d, row, (col + 1) % d), true);
        }
    }
    let mut cut_h: Gf2Vec = bitvec![0; n_qubits];
    let mut cut_v: Gf2Vec = bitvec![0; n_qubits];
    for ix in 0..d {
        cut_h.set(h_edge(d, ix, 0), true);
        cut_v.set(v_edge(d, 0, ix), true);
    }
    Code::with_logicals(h, vec![cut_h, cut_v])
}

/// Horizontal edge from vertex `(row, col)` to `(row, col + 1)`.
pub fn h_edge(d: usize, row: usize, col: usize) -> usize {
    (row % d) * d + (col % d)
}

/// Vertical edge from vertex `(row, col)` to `(row + 1, col)`.
pub fn v_edge(d: usize, row: usize, col: usize) -> usize {
    d * d + (row % d) * d + (col % d)
}

mod tests {
    use super::{h_edge, repetition_code, steane_code, toric_code, v_edge};
    use bitvec::prelude::*;

    #[test]
    fn test_repetition_code_shape() {
        let code = repetition_code(5).unwrap();
        assert_eq!(code.num_qubits(), 5);
        assert_eq!(code.num_checks(), 4);
        // end qubits sit on the boundary
        assert!(code.tanner_graph().is_boundary_qubit(0));
        assert!(code.tanner_graph().is_boundary_qubit(4));
        assert!(!code.tanner_graph().is_boundary_qubit(2));
    }

    #[test]
    fn test_steane_code_shape() {
        let code = steane_code().unwrap();
        assert_eq!(code.num_qubits(), 7);
        assert_eq!(code.num_checks(), 3);
        assert_eq!(code.parity_check_matrix().rank(), 3);
        // every check commutes with the logical
        for check in 0..3 {
            let row = code.parity_check_matrix().row(check);
            assert_eq!(row.count_ones() % 2, 0);
        }
    }

    #[test]
    fn test_toric_code_structure() {
        let d = 3;
        let code = toric_code(d).unwrap();
        assert_eq!(code.num_qubits(), 2 * d * d);
        assert_eq!(code.num_checks(), d * d);
        // closed lattice: every qubit touches exactly two plaquettes
        for qubit in 0..code.num_qubits() {
            assert_eq!(code.tanner_graph().degree(qubit), 2);
            assert!(!code.tanner_graph().is_boundary_qubit(qubit));
        }
        // one redundant check on the torus
        assert_eq!(code.parity_check_matrix().rank(), d * d - 1);
    }

    #[test]
    fn test_toric_logicals_are_undetected() {
        let d = 3;
        let code = toric_code(d).unwrap();
        for logical in code.logicals() {
            assert!(code.syndrome(logical).not_any());
        }
        // a contractible loop (one plaquette boundary) is a stabilizer,
        // a winding primal loop is not
        let mut plaquette = bitvec![0; 2 * d * d];
        plaquette.set(h_edge(d, 0, 0), true);
        plaquette.set(h_edge(d, 1, 0), true);
        plaquette.set(v_edge(d, 0, 0), true);
        plaquette.set(v_edge(d, 0, 1), true);
        assert!(code.is_stabilizer(&plaquette));
        let mut winding = bitvec![0; 2 * d * d];
        for col in 0..d {
            winding.set(h_edge(d, 0, col), true);
        }
        assert!(code.syndrome(&winding).not_any());
        assert!(!code.is_stabilizer(&winding));
    }
}
