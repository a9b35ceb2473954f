use std::fmt::Display;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

/// Bit vector over GF(2). Syndromes, physical errors, corrections, and
/// logical-operator supports are all stored this way.
pub type Gf2Vec = BitVec;

/// Flips every bit of `dst` that is set in `src`.
pub fn xor_into(dst: &mut BitSlice, src: &BitSlice) {
    for ix in src.iter_ones() {
        let flipped = !dst[ix];
        dst.set(ix, flipped);
    }
}

/// Returns `true` if the supports of `a` and `b` overlap on an even number
/// of positions, i.e. the corresponding Pauli operators commute.
pub fn commutes(a: &BitSlice, b: &BitSlice) -> bool {
    a.iter_ones().filter(|&ix| b[ix]).count() % 2 == 0
}

/// Dense matrix over the two-element field, stored row-major as bit vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gf2Matrix {
    pub n_rows: usize,
    pub n_cols: usize,
    rows: Vec<Gf2Vec>,
}

impl Gf2Matrix {
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Gf2Matrix {
            n_rows,
            n_cols,
            rows: (0..n_rows).map(|_| bitvec![0; n_cols]).collect(),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.rows[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.rows[row].set(col, value);
    }

    pub fn row(&self, row: usize) -> &Gf2Vec {
        &self.rows[row]
    }

    /// Matrix-vector product `M v`. The length of `v` must match `n_cols`.
    pub fn mul_vec(&self, v: &BitSlice) -> Gf2Vec {
        assert_eq!(
            v.len(),
            self.n_cols,
            "[Gf2Matrix] vector length does not match column count"
        );
        let mut out = bitvec![0; self.n_rows];
        for (ix, row) in self.rows.iter().enumerate() {
            let overlap = row.iter_ones().filter(|&jx| v[jx]).count();
            out.set(ix, overlap % 2 == 1);
        }
        out
    }

    pub fn transpose(&self) -> Gf2Matrix {
        let mut out = Gf2Matrix::zeros(self.n_cols, self.n_rows);
        for ix in 0..self.n_rows {
            for jx in self.rows[ix].iter_ones() {
                out.set(jx, ix, true);
            }
        }
        out
    }

    /// Reduces `self` to reduced row echelon form in place and returns the
    /// pivot columns, one per surviving nonzero row.
    pub fn rref(&mut self) -> Vec<usize> {
        let mut pivots = Vec::new();
        let mut pivot_row = 0;
        for col in 0..self.n_cols {
            if pivot_row >= self.n_rows {
                break;
            }
            let src = match (pivot_row..self.n_rows).find(|&r| self.rows[r][col]) {
                Some(r) => r,
                None => continue,
            };
            self.rows.swap(pivot_row, src);
            let pivot = self.rows[pivot_row].clone();
            for r in 0..self.n_rows {
                if r != pivot_row && self.rows[r][col] {
                    xor_into(&mut self.rows[r], &pivot);
                }
            }
            pivots.push(col);
            pivot_row += 1;
        }
        pivots
    }

    pub fn rank(&self) -> usize {
        let mut cloned = self.clone();
        cloned.rref().len()
    }

    /// Checks whether `vec` lies in the rowspace of `self`, by reducing it
    /// against the pivot rows of the echelon form.
    pub fn contains_in_rowspace(&self, vec: &BitSlice) -> bool {
        assert_eq!(
            vec.len(),
            self.n_cols,
            "[Gf2Matrix] vector length does not match column count"
        );
        let mut reduced = self.clone();
        let pivots = reduced.rref();
        let mut residual: Gf2Vec = vec.to_bitvec();
        for (row_ix, col) in pivots.into_iter().enumerate() {
            if residual[col] {
                xor_into(&mut residual, &reduced.rows[row_ix]);
            }
        }
        residual.not_any()
    }
}

impl Display for Gf2Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows.iter() {
            let mut line = String::with_capacity(2 * self.n_cols + 3);
            line.push_str("| ");
            for bit in row.iter() {
                line.push(if *bit { '1' } else { '0' });
                line.push(' ');
            }
            line.push('|');
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

mod tests {
    use super::Gf2Matrix;
    use bitvec::prelude::*;

    fn repetition_check_matrix(n: usize) -> Gf2Matrix {
        let mut h = Gf2Matrix::zeros(n - 1, n);
        for ix in 0..n - 1 {
            h.set(ix, ix, true);
            h.set(ix, ix + 1, true);
        }
        h
    }

    #[test]
    fn test_mul_vec() {
        let h = repetition_check_matrix(3);
        let e = bitvec![0, 1, 0];
        assert_eq!(h.mul_vec(&e), bitvec![1, 1]);
        let e = bitvec![1, 0, 0];
        assert_eq!(h.mul_vec(&e), bitvec![1, 0]);
    }

    #[test]
    fn test_rref_and_rank() {
        let mut h = repetition_check_matrix(4);
        assert_eq!(h.rank(), 3);
        let pivots = h.rref();
        assert_eq!(pivots, vec![0, 1, 2]);
        // duplicated row drops the rank
        let mut redundant = Gf2Matrix::zeros(3, 3);
        for col in 0..3 {
            redundant.set(0, col, col < 2);
            redundant.set(1, col, col < 2);
            redundant.set(2, col, col > 0);
        }
        assert_eq!(redundant.rank(), 2);
    }

    #[test]
    fn test_rowspace_membership() {
        let h = repetition_check_matrix(3);
        // sum of the two checks
        assert!(h.contains_in_rowspace(&bitvec![1, 0, 1]));
        assert!(h.contains_in_rowspace(&bitvec![1, 1, 0]));
        assert!(!h.contains_in_rowspace(&bitvec![1, 0, 0]));
        assert!(!h.contains_in_rowspace(&bitvec![1, 1, 1]));
    }

    #[test]
    fn test_transpose() {
        let h = repetition_check_matrix(3);
        let ht = h.transpose();
        assert_eq!(ht.n_rows, 3);
        assert_eq!(ht.n_cols, 2);
        assert!(ht.get(1, 0) && ht.get(1, 1));
    }
}
