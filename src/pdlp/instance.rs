use std::ops::Range;

use problemo::{Problem, ProblemResult};

use crate::E;

use super::error::InstanceError;
use super::sparse::{CsrMatrix, Diagonal, Vector};

/// The sense of a single row of the primal constraint matrix, before
/// the instance is partitioned into standard-sense blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    LessEqual,
    Equal,
    GreaterEqual,
}

/// A normalized, standard-sense-form LP instance: rows partitioned into
/// contiguous less/equal/greater blocks, dual bounds derived from
/// constraint senses, trivial primal objective bounds, and the
/// accumulated preprocessing scalers carried on the constraint matrix.
///
/// Built already in the form the core assumes (see §4.2): the caller is
/// responsible for providing rows that make sense as one coherent LP;
/// this constructor only reorders rows by sense; it does not reflect
/// rows or otherwise change the problem's feasible region.
#[derive(Debug, Clone)]
pub struct LpInstance {
    number_of_primal_variables: usize,
    number_of_constraints: usize,

    primal_objective_coefficients: Vector,
    primal_lower_bounds: Vector,
    primal_upper_bounds: Vector,
    is_primal_lower_unbounded: Vec<bool>,
    is_primal_upper_unbounded: Vec<bool>,

    constraint_matrix: CsrMatrix,
    constraint_matrix_transpose: CsrMatrix,

    dual_objective_coefficients: Vector,
    dual_lower_bounds: Vector,
    dual_upper_bounds: Vector,

    less_range: Range<usize>,
    equality_range: Range<usize>,
    greater_range: Range<usize>,

    is_minimization: bool,
    objective_offset: E,

    primal_initial_solution: Vector,
    dual_initial_solution: Vector,

    primal_objective_coefficients_norm: E,
    dual_objective_coefficients_norm: E,

    primal_objective_lower_bound: E,
    primal_objective_upper_bound: E,
}

impl LpInstance {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        primal_objective_coefficients: &[E],
        primal_lower_bounds: &[E],
        primal_upper_bounds: &[E],
        constraint_values: &[E],
        constraint_row_indices: &[usize],
        constraint_column_indices: &[usize],
        constraint_senses: &[ConstraintSense],
        dual_objective_coefficients: &[E],
        is_minimization: bool,
        objective_offset: E,
    ) -> Result<Self, Problem> {
        let n = primal_objective_coefficients.len();
        let m = constraint_senses.len();

        if primal_lower_bounds.len() != n {
            return Err(()).via(InstanceError::BoundLengthMismatch {
                expected: n,
                found: primal_lower_bounds.len(),
            });
        }
        if primal_upper_bounds.len() != n {
            return Err(()).via(InstanceError::BoundLengthMismatch {
                expected: n,
                found: primal_upper_bounds.len(),
            });
        }
        if dual_objective_coefficients.len() != m {
            return Err(()).via(InstanceError::DualCoefficientCountMismatch {
                expected: m,
                found: dual_objective_coefficients.len(),
            });
        }

        // Stable-partition rows by sense: less, equal, greater. Stability
        // keeps each block's internal row order the same as the caller's.
        let mut order: Vec<usize> = (0..m).collect();
        order.sort_by_key(|&i| match constraint_senses[i] {
            ConstraintSense::LessEqual => 0,
            ConstraintSense::Equal => 1,
            ConstraintSense::GreaterEqual => 2,
        });

        let mut old_to_new = vec![0usize; m];
        for (new_index, &old_index) in order.iter().enumerate() {
            old_to_new[old_index] = new_index;
        }

        let permuted_senses: Vec<ConstraintSense> =
            order.iter().map(|&i| constraint_senses[i]).collect();
        let permuted_b: Vec<E> = order
            .iter()
            .map(|&i| dual_objective_coefficients[i])
            .collect();
        let permuted_row_indices: Vec<usize> = constraint_row_indices
            .iter()
            .map(|&r| old_to_new[r])
            .collect();

        let constraint_matrix = CsrMatrix::from_triplets(
            constraint_values,
            &permuted_row_indices,
            constraint_column_indices,
            m,
            n,
        )?;
        let constraint_matrix_transpose = constraint_matrix.transpose();

        let less_count = permuted_senses
            .iter()
            .filter(|s| matches!(s, ConstraintSense::LessEqual))
            .count();
        let equal_count = permuted_senses
            .iter()
            .filter(|s| matches!(s, ConstraintSense::Equal))
            .count();
        let less_range = 0..less_count;
        let equality_range = less_count..(less_count + equal_count);
        let greater_range = (less_count + equal_count)..m;

        let mut dual_lower_bounds = Vector::zeros(m);
        let mut dual_upper_bounds = Vector::zeros(m);
        for i in 0..m {
            let (lo, hi) = match permuted_senses[i] {
                ConstraintSense::LessEqual => (E::NEG_INFINITY, 0.0),
                ConstraintSense::GreaterEqual => (0.0, E::INFINITY),
                ConstraintSense::Equal => (E::NEG_INFINITY, E::INFINITY),
            };
            dual_lower_bounds[i] = lo;
            dual_upper_bounds[i] = hi;
        }

        let is_primal_lower_unbounded: Vec<bool> = primal_lower_bounds
            .iter()
            .map(|v| v.is_infinite() && v.is_sign_negative())
            .collect();
        let is_primal_upper_unbounded: Vec<bool> = primal_upper_bounds
            .iter()
            .map(|v| v.is_infinite() && v.is_sign_positive())
            .collect();

        let (primal_objective_lower_bound, primal_objective_upper_bound) =
            Self::trivial_objective_bounds(
                primal_objective_coefficients,
                primal_lower_bounds,
                primal_upper_bounds,
            );

        let c = Self::vector_of(primal_objective_coefficients);
        let lower = Self::vector_of(primal_lower_bounds);
        let upper = Self::vector_of(primal_upper_bounds);
        let b = Self::vector_of(&permuted_b);

        let primal_objective_coefficients_norm = c.norm();
        let dual_objective_coefficients_norm = b.norm();

        Ok(Self {
            number_of_primal_variables: n,
            number_of_constraints: m,
            primal_objective_coefficients: c,
            primal_lower_bounds: lower,
            primal_upper_bounds: upper,
            is_primal_lower_unbounded,
            is_primal_upper_unbounded,
            constraint_matrix,
            constraint_matrix_transpose,
            dual_objective_coefficients: b,
            dual_lower_bounds,
            dual_upper_bounds,
            less_range,
            equality_range,
            greater_range,
            is_minimization,
            objective_offset,
            primal_initial_solution: Vector::zeros(n),
            dual_initial_solution: Vector::zeros(m),
            primal_objective_coefficients_norm,
            dual_objective_coefficients_norm,
            primal_objective_lower_bound,
            primal_objective_upper_bound,
        })
    }

    fn vector_of(values: &[E]) -> Vector {
        let mut v = Vector::zeros(values.len());
        for (i, &x) in values.iter().enumerate() {
            v[i] = x;
        }
        v
    }

    fn trivial_objective_bounds(c: &[E], lower: &[E], upper: &[E]) -> (E, E) {
        let mut lo = 0.0;
        let mut hi = 0.0;
        for i in 0..c.len() {
            if c[i] >= 0.0 {
                lo += c[i] * lower[i];
                hi += c[i] * upper[i];
            } else {
                lo += c[i] * upper[i];
                hi += c[i] * lower[i];
            }
        }
        (lo, hi)
    }

    /// Set the warm-start primal/dual initial solutions. Replaces the
    /// zero default set up by [`Self::new`].
    pub fn with_initial_solution(mut self, primal: Vector, dual: Vector) -> Self {
        self.primal_initial_solution = primal;
        self.dual_initial_solution = dual;
        self
    }

    /// Run Ruiz scaling for `ruiz_iterations` passes and, if enabled, a
    /// trailing Pock-Chambolle pass. The dual constraint matrix is
    /// rebuilt from the freshly scaled primal matrix.
    pub fn scaling(&mut self, ruiz_iterations: usize, enable_pock_chambolle: bool) {
        self.constraint_matrix.ruiz_scaling(ruiz_iterations);
        if enable_pock_chambolle {
            self.constraint_matrix.pock_chambolle_scaling();
        }
        self.constraint_matrix_transpose = self.constraint_matrix.transpose();
    }

    /// `n <= 1 || m <= 1`: an LP too small to be worth iterating on.
    pub fn is_degenerate(&self) -> bool {
        self.number_of_primal_variables <= 1 || self.number_of_constraints <= 1
    }

    /// No primal variables: already solved.
    pub fn is_trivially_solved(&self) -> bool {
        self.number_of_primal_variables == 0
    }

    pub fn number_of_primal_variables(&self) -> usize {
        self.number_of_primal_variables
    }

    pub fn number_of_constraints(&self) -> usize {
        self.number_of_constraints
    }

    pub fn primal_objective_coefficients(&self) -> &Vector {
        &self.primal_objective_coefficients
    }

    pub fn primal_lower_bounds(&self) -> &Vector {
        &self.primal_lower_bounds
    }

    pub fn primal_upper_bounds(&self) -> &Vector {
        &self.primal_upper_bounds
    }

    pub fn is_primal_lower_unbounded(&self) -> &[bool] {
        &self.is_primal_lower_unbounded
    }

    pub fn is_primal_upper_unbounded(&self) -> &[bool] {
        &self.is_primal_upper_unbounded
    }

    pub fn constraint_matrix(&self) -> &CsrMatrix {
        &self.constraint_matrix
    }

    pub fn constraint_matrix_transpose(&self) -> &CsrMatrix {
        &self.constraint_matrix_transpose
    }

    pub fn dual_objective_coefficients(&self) -> &Vector {
        &self.dual_objective_coefficients
    }

    pub fn dual_lower_bounds(&self) -> &Vector {
        &self.dual_lower_bounds
    }

    pub fn dual_upper_bounds(&self) -> &Vector {
        &self.dual_upper_bounds
    }

    pub fn less_range(&self) -> Range<usize> {
        self.less_range.clone()
    }

    pub fn equality_range(&self) -> Range<usize> {
        self.equality_range.clone()
    }

    pub fn greater_range(&self) -> Range<usize> {
        self.greater_range.clone()
    }

    pub fn is_minimization(&self) -> bool {
        self.is_minimization
    }

    pub fn objective_offset(&self) -> E {
        self.objective_offset
    }

    pub fn primal_initial_solution(&self) -> &Vector {
        &self.primal_initial_solution
    }

    pub fn dual_initial_solution(&self) -> &Vector {
        &self.dual_initial_solution
    }

    pub fn primal_objective_coefficients_norm(&self) -> E {
        self.primal_objective_coefficients_norm
    }

    pub fn dual_objective_coefficients_norm(&self) -> E {
        self.dual_objective_coefficients_norm
    }

    pub fn primal_objective_lower_bound(&self) -> E {
        self.primal_objective_lower_bound
    }

    pub fn primal_objective_upper_bound(&self) -> E {
        self.primal_objective_upper_bound
    }

    pub fn row_scaler(&self) -> &Diagonal {
        self.constraint_matrix.row_scaler()
    }

    pub fn column_scaler(&self) -> &Diagonal {
        self.constraint_matrix.column_scaler()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trivial_1x1() -> LpInstance {
        // min x s.t. x >= 1, 0 <= x <= 10
        LpInstance::new(
            &[1.0],
            &[0.0],
            &[10.0],
            &[1.0],
            &[0],
            &[0],
            &[ConstraintSense::GreaterEqual],
            &[1.0],
            true,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn dual_bounds_follow_constraint_sense() {
        let instance = trivial_1x1();
        assert_eq!(instance.dual_lower_bounds()[0], 0.0);
        assert_eq!(instance.dual_upper_bounds()[0], E::INFINITY);
    }

    #[test]
    fn degenerate_flags_small_instances() {
        let instance = trivial_1x1();
        assert!(instance.is_degenerate());
    }

    #[test]
    fn trivial_objective_bounds_bracket_feasible_region() {
        let instance = trivial_1x1();
        assert_eq!(instance.primal_objective_lower_bound(), 0.0);
        assert_eq!(instance.primal_objective_upper_bound(), 10.0);
    }

    #[test]
    fn rows_are_partitioned_into_contiguous_blocks() {
        // two less, one equal, one greater, given out of order
        let instance = LpInstance::new(
            &[1.0, 1.0],
            &[0.0, 0.0],
            &[5.0, 5.0],
            &[1.0, 1.0, 1.0, 1.0],
            &[0, 1, 2, 3],
            &[0, 1, 0, 1],
            &[
                ConstraintSense::GreaterEqual,
                ConstraintSense::LessEqual,
                ConstraintSense::Equal,
                ConstraintSense::LessEqual,
            ],
            &[1.0, 2.0, 3.0, 4.0],
            true,
            0.0,
        )
        .unwrap();
        assert_eq!(instance.less_range(), 0..2);
        assert_eq!(instance.equality_range(), 2..3);
        assert_eq!(instance.greater_range(), 3..4);
    }
}
