use crate::error::{DecodingError, Result};
use crate::gf2::Gf2Matrix;

/// Tag distinguishing the two sides of the bipartite graph. The payload is
/// the qubit/check index, not the graph node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Qubit(usize),
    Check(usize),
}

/// Bipartite graph of qubit and check nodes, derived once from a
/// parity-check matrix and read-only afterwards.
///
/// Nodes are dense integer ids: qubits occupy `0..n`, checks occupy
/// `n..n + m`. Keeping the graph as an arena of indexed adjacency lists lets
/// the union-find forest mutate parent links in place without any pointer
/// structure.
#[derive(Debug, Clone)]
pub struct TannerGraph {
    num_qubits: usize,
    num_checks: usize,
    adjacency: Vec<Vec<usize>>,
}

impl TannerGraph {
    /// Builds the graph from a parity-check matrix. Fails with
    /// `MalformedCode` when the matrix has no rows or no columns.
    pub fn build(h: &Gf2Matrix) -> Result<Self> {
        if h.n_rows == 0 {
            return Err(DecodingError::MalformedCode {
                reason: "parity-check matrix has no rows".to_string(),
            });
        }
        if h.n_cols == 0 {
            return Err(DecodingError::MalformedCode {
                reason: "parity-check matrix has no columns".to_string(),
            });
        }
        let num_qubits = h.n_cols;
        let num_checks = h.n_rows;
        let mut adjacency = vec![Vec::new(); num_qubits + num_checks];
        for check in 0..num_checks {
            for qubit in h.row(check).iter_ones() {
                adjacency[num_qubits + check].push(qubit);
                adjacency[qubit].push(num_qubits + check);
            }
        }
        Ok(TannerGraph {
            num_qubits,
            num_checks,
            adjacency,
        })
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn num_checks(&self) -> usize {
        self.num_checks
    }

    pub fn num_nodes(&self) -> usize {
        self.num_qubits + self.num_checks
    }

    /// Graph node id of the given check.
    pub fn check_node(&self, check: usize) -> usize {
        self.num_qubits + check
    }

    /// Check index of a check node id. Panics on a qubit node.
    pub fn check_index(&self, node: usize) -> usize {
        assert!(self.is_check(node), "node {node} is not a check node");
        node - self.num_qubits
    }

    pub fn is_check(&self, node: usize) -> bool {
        node >= self.num_qubits
    }

    pub fn kind(&self, node: usize) -> NodeKind {
        if node < self.num_qubits {
            NodeKind::Qubit(node)
        } else {
            NodeKind::Check(node - self.num_qubits)
        }
    }

    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// A qubit incident to exactly one check sits on the open boundary of
    /// the lattice and can absorb an unmatched defect during peeling.
    pub fn is_boundary_qubit(&self, node: usize) -> bool {
        node < self.num_qubits && self.adjacency[node].len() == 1
    }
}

mod tests {
    use super::{NodeKind, TannerGraph};
    use crate::gf2::Gf2Matrix;

    fn repetition_graph(n: usize) -> TannerGraph {
        let mut h = Gf2Matrix::zeros(n - 1, n);
        for ix in 0..n - 1 {
            h.set(ix, ix, true);
            h.set(ix, ix + 1, true);
        }
        TannerGraph::build(&h).unwrap()
    }

    #[test]
    fn test_build_layout() {
        let graph = repetition_graph(3);
        assert_eq!(graph.num_nodes(), 5);
        assert_eq!(graph.kind(1), NodeKind::Qubit(1));
        assert_eq!(graph.kind(3), NodeKind::Check(0));
        assert_eq!(graph.neighbors(1), &[3, 4]);
        assert_eq!(graph.neighbors(graph.check_node(1)), &[1, 2]);
    }

    #[test]
    fn test_boundary_qubits() {
        let graph = repetition_graph(4);
        assert!(graph.is_boundary_qubit(0));
        assert!(graph.is_boundary_qubit(3));
        assert!(!graph.is_boundary_qubit(1));
        // check nodes are never boundary qubits
        assert!(!graph.is_boundary_qubit(graph.check_node(0)));
    }

    #[test]
    fn test_rejects_empty_matrix() {
        let empty = Gf2Matrix::zeros(0, 4);
        assert!(TannerGraph::build(&empty).is_err());
        let no_cols = Gf2Matrix::zeros(2, 0);
        assert!(TannerGraph::build(&no_cols).is_err());
    }
}
