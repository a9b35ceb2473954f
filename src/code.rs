use bitvec::prelude::*;

use crate::error::{DecodingError, Result};
use crate::gf2::{self, Gf2Matrix, Gf2Vec};
use crate::tanner_graph::TannerGraph;

/// An error-correcting code given by its parity-check matrix over GF(2),
/// plus the qubit supports of its logical operators.
///
/// Rows of the matrix are checks, columns are qubits. The Tanner graph is
/// derived once at construction; after that the whole structure is
/// immutable and safe to share read-only across concurrent decode calls.
#[derive(Debug, Clone)]
pub struct Code {
    h: Gf2Matrix,
    logicals: Vec<Gf2Vec>,
    graph: TannerGraph,
}

impl Code {
    pub fn new(h: Gf2Matrix) -> Result<Self> {
        Code::with_logicals(h, Vec::new())
    }

    pub fn with_logicals(h: Gf2Matrix, logicals: Vec<Gf2Vec>) -> Result<Self> {
        let graph = TannerGraph::build(&h)?;
        for logical in logicals.iter() {
            if logical.len() != h.n_cols {
                return Err(DecodingError::MalformedCode {
                    reason: format!(
                        "logical operator has {} entries on a code with {} qubits",
                        logical.len(),
                        h.n_cols
                    ),
                });
            }
        }
        Ok(Code { h, logicals, graph })
    }

    /// Builds a code from raw 0/1 rows, the entry point for callers that do
    /// not already hold a `Gf2Matrix`.
    pub fn from_rows(rows: &[Vec<u8>], logicals: Vec<Gf2Vec>) -> Result<Self> {
        if rows.is_empty() {
            return Err(DecodingError::MalformedCode {
                reason: "parity-check matrix has no rows".to_string(),
            });
        }
        let n_cols = rows[0].len();
        let mut h = Gf2Matrix::zeros(rows.len(), n_cols);
        for (row_ix, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(DecodingError::MalformedCode {
                    reason: format!(
                        "row {row_ix} has {} entries, expected {n_cols}",
                        row.len()
                    ),
                });
            }
            for (col_ix, entry) in row.iter().enumerate() {
                match entry {
                    0 => {}
                    1 => h.set(row_ix, col_ix, true),
                    _ => {
                        return Err(DecodingError::MalformedCode {
                            reason: format!(
                                "entry ({row_ix}, {col_ix}) is {entry}, expected 0 or 1"
                            ),
                        })
                    }
                }
            }
        }
        Code::with_logicals(h, logicals)
    }

    pub fn num_qubits(&self) -> usize {
        self.h.n_cols
    }

    pub fn num_checks(&self) -> usize {
        self.h.n_rows
    }

    pub fn parity_check_matrix(&self) -> &Gf2Matrix {
        &self.h
    }

    pub fn logicals(&self) -> &[Gf2Vec] {
        &self.logicals
    }

    pub fn tanner_graph(&self) -> &TannerGraph {
        &self.graph
    }

    /// Syndrome of a physical error, one bit per check.
    pub fn syndrome(&self, error: &BitSlice) -> Gf2Vec {
        self.h.mul_vec(error)
    }

    /// Whether `residual` acts trivially on the encoded state: its syndrome
    /// is zero and it commutes with every logical operator. Codes without
    /// attached logicals fall back to membership in the rowspace of the
    /// parity-check matrix.
    pub fn is_stabilizer(&self, residual: &BitSlice) -> bool {
        if self.syndrome(residual).any() {
            return false;
        }
        if self.logicals.is_empty() {
            return self.h.contains_in_rowspace(residual);
        }
        self.logicals
            .iter()
            .all(|logical| gf2::commutes(residual, logical))
    }
}

mod tests {
    use super::Code;
    use crate::error::DecodingError;
    use bitvec::prelude::*;

    #[test]
    fn test_from_rows_validation() {
        assert!(matches!(
            Code::from_rows(&[], Vec::new()),
            Err(DecodingError::MalformedCode { .. })
        ));
        assert!(matches!(
            Code::from_rows(&[vec![1, 1, 0], vec![0, 1]], Vec::new()),
            Err(DecodingError::MalformedCode { .. })
        ));
        assert!(matches!(
            Code::from_rows(&[vec![1, 2, 0]], Vec::new()),
            Err(DecodingError::MalformedCode { .. })
        ));
        assert!(matches!(
            Code::from_rows(&[vec![1, 1, 0]], vec![bitvec![1, 1]]),
            Err(DecodingError::MalformedCode { .. })
        ));
    }

    #[test]
    fn test_syndrome() {
        let code = Code::from_rows(&[vec![1, 1, 0], vec![0, 1, 1]], Vec::new()).unwrap();
        assert_eq!(code.syndrome(&bitvec![0, 1, 0]), bitvec![1, 1]);
        assert_eq!(code.syndrome(&bitvec![0, 0, 1]), bitvec![0, 1]);
        assert_eq!(code.syndrome(&bitvec![0, 0, 0]), bitvec![0, 0]);
    }

    #[test]
    fn test_is_stabilizer_via_logicals() {
        // Steane check set with the all-ones logical
        let code = Code::from_rows(
            &[
                vec![0, 0, 0, 1, 1, 1, 1],
                vec![0, 1, 1, 0, 0, 1, 1],
                vec![1, 0, 1, 0, 1, 0, 1],
            ],
            vec![bitvec![1, 1, 1, 1, 1, 1, 1]],
        )
        .unwrap();
        // a check row has zero syndrome and even overlap with the logical
        assert!(code.is_stabilizer(&bitvec![0, 0, 0, 1, 1, 1, 1]));
        // nonzero syndrome
        assert!(!code.is_stabilizer(&bitvec![1, 0, 0, 0, 0, 0, 0]));
        // in the kernel but anticommutes with the logical
        assert!(!code.is_stabilizer(&bitvec![1, 1, 1, 1, 1, 1, 1]));
    }

    #[test]
    fn test_is_stabilizer_via_rowspace_fallback() {
        // single self-orthogonal check, no logicals attached
        let code = Code::from_rows(&[vec![1, 1, 1, 1]], Vec::new()).unwrap();
        assert!(code.is_stabilizer(&bitvec![1, 1, 1, 1]));
        // zero syndrome, but not a sum of checks
        assert!(!code.is_stabilizer(&bitvec![1, 1, 0, 0]));
        // nonzero syndrome
        assert!(!code.is_stabilizer(&bitvec![1, 0, 0, 0]));
    }
}
