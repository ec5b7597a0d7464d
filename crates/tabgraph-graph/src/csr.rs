//! Compressed sparse row adjacency over one edge type.
//!
//! Built with a counting sort on the row endpoint. Within a row, entries are
//! ordered by column; parallel edges keep their original row order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Csr {
    indptr: Vec<usize>,
    indices: Vec<usize>,
    edge_ids: Vec<usize>,
}

impl Csr {
    /// Build from parallel endpoint arrays. Every `rows[i]` must be `< num_rows`.
    pub fn from_edges(num_rows: usize, rows: &[usize], cols: &[usize]) -> Self {
        let mut indptr = vec![0usize; num_rows + 1];
        for &r in rows {
            indptr[r + 1] += 1;
        }
        for i in 0..num_rows {
            indptr[i + 1] += indptr[i];
        }

        let mut cursor = indptr.clone();
        let mut indices = vec![0usize; rows.len()];
        let mut edge_ids = vec![0usize; rows.len()];
        for (eid, (&r, &c)) in rows.iter().zip(cols).enumerate() {
            let slot = cursor[r];
            indices[slot] = c;
            edge_ids[slot] = eid;
            cursor[r] += 1;
        }

        for r in 0..num_rows {
            let (start, end) = (indptr[r], indptr[r + 1]);
            if end - start > 1 {
                let mut pairs: Vec<(usize, usize)> = indices[start..end]
                    .iter()
                    .copied()
                    .zip(edge_ids[start..end].iter().copied())
                    .collect();
                pairs.sort_unstable();
                for (k, (c, e)) in pairs.into_iter().enumerate() {
                    indices[start + k] = c;
                    edge_ids[start + k] = e;
                }
            }
        }

        Self {
            indptr,
            indices,
            edge_ids,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.indptr.len().saturating_sub(1)
    }

    /// Number of stored edges.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn edge_ids(&self) -> &[usize] {
        &self.edge_ids
    }

    /// Column endpoints of row `r`, sorted.
    pub fn row(&self, r: usize) -> &[usize] {
        match (self.indptr.get(r), self.indptr.get(r + 1)) {
            (Some(&s), Some(&e)) => &self.indices[s..e],
            _ => &[],
        }
    }

    /// Edge ids of row `r`, aligned with [`Csr::row`].
    pub fn row_edge_ids(&self, r: usize) -> &[usize] {
        match (self.indptr.get(r), self.indptr.get(r + 1)) {
            (Some(&s), Some(&e)) => &self.edge_ids[s..e],
            _ => &[],
        }
    }

    pub fn degree(&self, r: usize) -> usize {
        self.row(r).len()
    }

    pub fn degrees(&self) -> Vec<usize> {
        self.indptr.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub fn has_edge(&self, r: usize, c: usize) -> bool {
        self.row(r).binary_search(&c).is_ok()
    }
}
