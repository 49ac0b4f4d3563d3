use problemo::{Problem, ProblemResult};

use crate::E;

use super::diagonal::Diagonal;
use super::error::SparseError;
use super::vector::Vector;

const EPSILON_10: E = 1e-10;

/// A sparse matrix in row-major (CSR) form with persistent row/column
/// scalers and cached norms.
///
/// The scalers start at the identity and are multiplied into (never
/// replaced) by every scaling pass, so the composite preprocessing
/// factor applied to the original matrix is always recoverable from
/// `row_scaler`/`column_scaler` alone.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    values: Vec<E>,
    column_indices: Vec<usize>,
    row_ptrs: Vec<usize>,

    row_scaler: Diagonal,
    column_scaler: Diagonal,

    number_of_rows: usize,
    number_of_columns: usize,

    norm_one: E,
    norm_infty: E,
}

impl CsrMatrix {
    /// Build a matrix from triplets in arbitrary order. Triplets are
    /// stably sorted into row-major order before the CSR `row_ptrs`
    /// array is derived (a histogram-then-prefix-sum pass, matching the
    /// source's `setup`, which assumes its inputs are already grouped
    /// by row).
    pub fn from_triplets(
        values: &[E],
        row_indices: &[usize],
        column_indices: &[usize],
        number_of_rows: usize,
        number_of_columns: usize,
    ) -> Result<Self, Problem> {
        if values.len() != row_indices.len() || values.len() != column_indices.len() {
            return Err(()).via(SparseError::LengthMismatch {
                operation: "CsrMatrix::from_triplets",
                expected: values.len(),
                found: row_indices.len().max(column_indices.len()),
            });
        }

        let nnz = values.len();
        let mut permutation: Vec<usize> = (0..nnz).collect();
        // Stable-sort twice: by column first, then by row, so the final
        // order is primarily row-major with column as the tie-break —
        // the same double stable-sort trick the source's `transpose`
        // uses to produce row-major order for a relabeled matrix.
        permutation.sort_by_key(|&i| column_indices[i]);
        permutation.sort_by_key(|&i| row_indices[i]);

        let sorted_values: Vec<E> = permutation.iter().map(|&i| values[i]).collect();
        let sorted_rows: Vec<usize> = permutation.iter().map(|&i| row_indices[i]).collect();
        let sorted_columns: Vec<usize> = permutation.iter().map(|&i| column_indices[i]).collect();

        let mut row_ptrs = vec![0usize; number_of_rows + 1];
        for &r in &sorted_rows {
            row_ptrs[r + 1] += 1;
        }
        for i in 0..number_of_rows {
            row_ptrs[i + 1] += row_ptrs[i];
        }

        let mut matrix = Self {
            values: sorted_values,
            column_indices: sorted_columns,
            row_ptrs,
            row_scaler: Diagonal::identity(number_of_rows),
            column_scaler: Diagonal::identity(number_of_columns),
            number_of_rows,
            number_of_columns,
            norm_one: 0.0,
            norm_infty: 0.0,
        };
        matrix.setup_norm();
        Ok(matrix)
    }

    pub fn number_of_rows(&self) -> usize {
        self.number_of_rows
    }

    pub fn number_of_columns(&self) -> usize {
        self.number_of_columns
    }

    /// Maximum absolute column sum.
    pub fn norm_one(&self) -> E {
        self.norm_one
    }

    /// Maximum absolute *entry* (not maximum absolute row sum — this is
    /// an intentional, source-faithful choice; see DESIGN.md).
    pub fn norm_infty(&self) -> E {
        self.norm_infty
    }

    pub fn row_scaler(&self) -> &Diagonal {
        &self.row_scaler
    }

    pub fn column_scaler(&self) -> &Diagonal {
        &self.column_scaler
    }

    pub fn setup_norm(&mut self) {
        let mut column_abs_sum = vec![0.0; self.number_of_columns];
        let mut norm_infty = 0.0_f64;

        for i in 0..self.number_of_rows {
            for j in self.row_ptrs[i]..self.row_ptrs[i + 1] {
                let value = self.values[j].abs();
                column_abs_sum[self.column_indices[j]] += value;
                norm_infty = norm_infty.max(value);
            }
        }
        self.norm_one = column_abs_sum.into_iter().fold(0.0, E::max);
        self.norm_infty = norm_infty;
    }

    /// SpMV: `y <- M x`.
    pub fn dot(&self, x: &Vector) -> Result<Vector, Problem> {
        if self.number_of_columns != x.len() {
            return Err(()).via(SparseError::DimensionMismatch {
                operation: "CsrMatrix::dot",
                expected: self.number_of_columns,
                found: x.len(),
            });
        }
        let mut result = Vector::zeros(self.number_of_rows);
        for i in 0..self.number_of_rows {
            let mut acc = 0.0;
            for j in self.row_ptrs[i]..self.row_ptrs[i + 1] {
                acc += self.values[j] * x[self.column_indices[j]];
            }
            result[i] = acc;
        }
        Ok(result)
    }

    /// Returns a new matrix with each row `i` multiplied by `diagonal[i]`.
    pub fn scale_row(&self, diagonal: &Diagonal) -> Result<Self, Problem> {
        if self.number_of_rows != diagonal.len() {
            return Err(()).via(SparseError::DimensionMismatch {
                operation: "CsrMatrix::scale_row",
                expected: self.number_of_rows,
                found: diagonal.len(),
            });
        }
        let mut out = self.clone();
        for i in 0..self.number_of_rows {
            for j in self.row_ptrs[i]..self.row_ptrs[i + 1] {
                out.values[j] *= diagonal.get(i);
            }
        }
        out.setup_norm();
        Ok(out)
    }

    /// Returns a new matrix with each column `j` multiplied by `diagonal[j]`.
    pub fn scale_column(&self, diagonal: &Diagonal) -> Result<Self, Problem> {
        if self.number_of_columns != diagonal.len() {
            return Err(()).via(SparseError::DimensionMismatch {
                operation: "CsrMatrix::scale_column",
                expected: self.number_of_columns,
                found: diagonal.len(),
            });
        }
        let mut out = self.clone();
        for i in 0..out.values.len() {
            out.values[i] *= diagonal.get(out.column_indices[i]);
        }
        out.setup_norm();
        Ok(out)
    }

    /// Row-major transpose: returns a new matrix with dimensions swapped.
    pub fn transpose(&self) -> Self {
        let nnz = self.values.len();
        let mut row_indices = vec![0usize; nnz];
        for i in 0..self.number_of_rows {
            for j in self.row_ptrs[i]..self.row_ptrs[i + 1] {
                row_indices[j] = i;
            }
        }
        // New row = old column, new column = old row.
        Self::from_triplets(
            &self.values,
            &self.column_indices,
            &row_indices,
            self.number_of_columns,
            self.number_of_rows,
        )
        .expect("transpose of a valid matrix cannot fail shape checks")
    }

    /// Iterative Ruiz equilibration: `iterations` passes of max-abs
    /// row/column factors, composed into the persistent scalers.
    pub fn ruiz_scaling(&mut self, iterations: usize) {
        for _ in 0..iterations {
            let mut row_factor = vec![0.0_f64; self.number_of_rows];
            let mut column_factor = vec![0.0_f64; self.number_of_columns];

            for i in 0..self.number_of_rows {
                for j in self.row_ptrs[i]..self.row_ptrs[i + 1] {
                    let value = self.values[j].abs();
                    row_factor[i] = row_factor[i].max(value);
                    column_factor[self.column_indices[j]] =
                        column_factor[self.column_indices[j]].max(value);
                }
            }
            Self::floor_and_sqrt(&mut row_factor);
            Self::floor_and_sqrt(&mut column_factor);
            self.apply_scaling_pass(&row_factor, &column_factor);
        }
    }

    /// Single-pass Pock-Chambolle equilibration: sum-of-abs row/column
    /// factors, composed into the persistent scalers.
    pub fn pock_chambolle_scaling(&mut self) {
        let mut row_factor = vec![0.0_f64; self.number_of_rows];
        let mut column_factor = vec![0.0_f64; self.number_of_columns];

        for i in 0..self.number_of_rows {
            for j in self.row_ptrs[i]..self.row_ptrs[i + 1] {
                let value = self.values[j].abs();
                row_factor[i] += value;
                column_factor[self.column_indices[j]] += value;
            }
        }
        Self::floor_and_sqrt(&mut row_factor);
        Self::floor_and_sqrt(&mut column_factor);
        self.apply_scaling_pass(&row_factor, &column_factor);
    }

    fn floor_and_sqrt(factors: &mut [E]) {
        for f in factors.iter_mut() {
            *f = if *f < EPSILON_10 { 1.0 } else { f.sqrt() };
        }
    }

    fn apply_scaling_pass(&mut self, row_factor: &[E], column_factor: &[E]) {
        for i in 0..self.number_of_rows {
            for j in self.row_ptrs[i]..self.row_ptrs[i + 1] {
                self.values[j] /= row_factor[i] * column_factor[self.column_indices[j]];
            }
        }
        for i in 0..self.number_of_rows {
            let updated = self.row_scaler.get(i) * row_factor[i];
            self.row_scaler.set(i, updated);
        }
        for j in 0..self.number_of_columns {
            let updated = self.column_scaler.get(j) * column_factor[j];
            self.column_scaler.set(j, updated);
        }
        self.setup_norm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_spmv(values: &[(usize, usize, E)], m: usize, n: usize, x: &[E]) -> Vec<E> {
        let mut y = vec![0.0; m];
        for &(i, j, v) in values {
            y[i] += v * x[j];
        }
        let _ = n;
        y
    }

    #[test]
    fn spmv_matches_dense_product() {
        // [[1, 0, 2], [0, 3, 0]]
        let triplets = [(0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0)];
        let values: Vec<E> = triplets.iter().map(|t| t.2).collect();
        let rows: Vec<usize> = triplets.iter().map(|t| t.0).collect();
        let cols: Vec<usize> = triplets.iter().map(|t| t.1).collect();
        let m = CsrMatrix::from_triplets(&values, &rows, &cols, 2, 3).unwrap();

        let mut x = Vector::zeros(3);
        x[0] = 1.0;
        x[1] = 2.0;
        x[2] = 3.0;

        let y = m.dot(&x).unwrap();
        let expected = dense_spmv(&triplets, 2, 3, &[1.0, 2.0, 3.0]);
        for i in 0..2 {
            assert!((y[i] - expected[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn transpose_matches_dense_transpose_product() {
        let triplets = [(0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0)];
        let values: Vec<E> = triplets.iter().map(|t| t.2).collect();
        let rows: Vec<usize> = triplets.iter().map(|t| t.0).collect();
        let cols: Vec<usize> = triplets.iter().map(|t| t.1).collect();
        let m = CsrMatrix::from_triplets(&values, &rows, &cols, 2, 3).unwrap();
        let mt = m.transpose();

        assert_eq!(mt.number_of_rows(), 3);
        assert_eq!(mt.number_of_columns(), 2);

        let mut x = Vector::zeros(2);
        x[0] = 5.0;
        x[1] = 7.0;
        let y = mt.dot(&x).unwrap();
        // Mᵀ x = [1*5, 3*7, 2*5]
        assert!((y[0] - 5.0).abs() < 1e-12);
        assert!((y[1] - 21.0).abs() < 1e-12);
        assert!((y[2] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn norm_infty_is_max_abs_entry_not_max_row_sum() {
        // row 0 has entries summing to 3 (1+2) but max entry is 2.
        let triplets = [(0, 0, 1.0), (0, 1, 2.0)];
        let values: Vec<E> = triplets.iter().map(|t| t.2).collect();
        let rows: Vec<usize> = triplets.iter().map(|t| t.0).collect();
        let cols: Vec<usize> = triplets.iter().map(|t| t.1).collect();
        let m = CsrMatrix::from_triplets(&values, &rows, &cols, 1, 2).unwrap();
        assert_eq!(m.norm_infty(), 2.0);
    }

    #[test]
    fn ruiz_scaling_composes_into_persistent_scaler() {
        let triplets = [(0, 0, 4.0), (0, 1, 2.0), (1, 0, 1.0), (1, 1, 8.0)];
        let values: Vec<E> = triplets.iter().map(|t| t.2).collect();
        let rows: Vec<usize> = triplets.iter().map(|t| t.0).collect();
        let cols: Vec<usize> = triplets.iter().map(|t| t.1).collect();
        let mut m = CsrMatrix::from_triplets(&values, &rows, &cols, 2, 2).unwrap();
        m.ruiz_scaling(2);

        // reconstruct original by undoing row/column scalers
        for i in 0..m.number_of_rows {
            for j in m.row_ptrs[i]..m.row_ptrs[i + 1] {
                let reconstructed =
                    m.values[j] * m.row_scaler.get(i) * m.column_scaler.get(m.column_indices[j]);
                let (oi, oj) = (i, m.column_indices[j]);
                let original = triplets
                    .iter()
                    .find(|t| t.0 == oi && t.1 == oj)
                    .map(|t| t.2)
                    .unwrap();
                assert!((reconstructed - original).abs() < 1e-8);
            }
        }
    }
}
