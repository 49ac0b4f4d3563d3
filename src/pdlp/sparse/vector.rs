use std::ops::{Index, IndexMut};

use faer::Col;
use problemo::{Problem, ProblemResult};

use crate::E;

use super::error::SparseError;

/// A dense vector of immutable length, backed by a [`faer::Col`].
///
/// Mirrors the vector type at the bottom of the PDLP sparse substrate:
/// element-wise arithmetic, componentwise clamping to bound vectors, a
/// weighted exponential "learn" update used by the running average, and
/// the norm/dot/distance family used throughout the state manager.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector(Col<E>);

impl Vector {
    /// A zero vector of the given length.
    pub fn zeros(size: usize) -> Self {
        Self(Col::zeros(size))
    }

    pub fn from_col(col: Col<E>) -> Self {
        Self(col)
    }

    pub fn as_col(&self) -> &Col<E> {
        &self.0
    }

    pub fn into_col(self) -> Col<E> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_len(&self, other: &Self, operation: &'static str) -> Result<(), Problem> {
        if self.len() != other.len() {
            return Err(()).via(SparseError::LengthMismatch {
                operation,
                expected: self.len(),
                found: other.len(),
            });
        }
        Ok(())
    }

    pub fn max(&self) -> E {
        (0..self.len()).map(|i| self.0[i]).fold(E::MIN, E::max)
    }

    pub fn min(&self) -> E {
        (0..self.len()).map(|i| self.0[i]).fold(E::MAX, E::min)
    }

    pub fn square_sum(&self) -> E {
        (0..self.len()).map(|i| self.0[i] * self.0[i]).sum()
    }

    /// L2 norm.
    pub fn norm(&self) -> E {
        self.square_sum().sqrt()
    }

    /// Lp norm for `p > 0`.
    pub fn norm_p(&self, p: E) -> E {
        (0..self.len())
            .map(|i| self.0[i].abs().powf(p))
            .sum::<E>()
            .powf(1.0 / p)
    }

    pub fn dot(&self, other: &Self) -> Result<E, Problem> {
        self.check_len(other, "dot")?;
        Ok((0..self.len()).map(|i| self.0[i] * other.0[i]).sum())
    }

    pub fn distance(&self, other: &Self) -> Result<E, Problem> {
        self.check_len(other, "distance")?;
        Ok((0..self.len())
            .map(|i| {
                let diff = self.0[i] - other.0[i];
                diff * diff
            })
            .sum::<E>()
            .sqrt())
    }

    pub fn reset(&mut self) {
        for i in 0..self.len() {
            self.0[i] = 0.0;
        }
    }

    /// Concatenate `other` onto the end of `self`, growing its length.
    pub fn extend(&mut self, other: &Self) {
        let mut grown = Col::zeros(self.len() + other.len());
        for i in 0..self.len() {
            grown[i] = self.0[i];
        }
        for i in 0..other.len() {
            grown[self.len() + i] = other.0[i];
        }
        self.0 = grown;
    }

    /// Componentwise clamp to `[lower, upper]`. Requires matching lengths.
    pub fn clamp(&self, lower: &Self, upper: &Self) -> Result<Self, Problem> {
        self.check_len(lower, "clamp")?;
        self.check_len(upper, "clamp")?;
        let mut out = self.clone();
        for i in 0..self.len() {
            out.0[i] = self.0[i].clamp(lower.0[i], upper.0[i]);
        }
        Ok(out)
    }

    /// `self <- (1 - rate) * self + rate * other`.
    pub fn learn(&mut self, other: &Self, rate: E) -> Result<(), Problem> {
        self.check_len(other, "learn")?;
        let forget_rate = 1.0 - rate;
        for i in 0..self.len() {
            self.0[i] = forget_rate * self.0[i] + rate * other.0[i];
        }
        Ok(())
    }
}

impl Index<usize> for Vector {
    type Output = E;
    fn index(&self, index: usize) -> &E {
        &self.0[index]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, index: usize) -> &mut E {
        &mut self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(values: &[E]) -> Vector {
        let mut v = Vector::zeros(values.len());
        for (i, &x) in values.iter().enumerate() {
            v[i] = x;
        }
        v
    }

    #[test]
    fn dot_is_symmetric() {
        let u = vec_of(&[1.0, 2.0, 3.0]);
        let v = vec_of(&[4.0, -1.0, 0.5]);
        assert_eq!(u.dot(&v).unwrap(), v.dot(&u).unwrap());
    }

    #[test]
    fn distance_to_self_is_zero() {
        let u = vec_of(&[1.0, 2.0, 3.0]);
        assert_eq!(u.distance(&u).unwrap(), 0.0);
    }

    #[test]
    fn norm_matches_dot_with_self() {
        let u = vec_of(&[3.0, 4.0]);
        assert!((u.norm().powi(2) - u.dot(&u).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn clamp_is_idempotent() {
        let lo = vec_of(&[0.0, 0.0]);
        let hi = vec_of(&[1.0, 1.0]);
        let v = vec_of(&[-3.0, 5.0]);
        let once = v.clamp(&lo, &hi).unwrap();
        let twice = once.clamp(&lo, &hi).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn clamp_rejects_length_mismatch() {
        let lo = vec_of(&[0.0]);
        let hi = vec_of(&[1.0, 1.0]);
        let v = vec_of(&[0.5, 0.5]);
        assert!(v.clamp(&lo, &hi).is_err());
    }

    #[test]
    fn learn_blends_towards_target() {
        let mut v = vec_of(&[0.0, 0.0]);
        let target = vec_of(&[1.0, 1.0]);
        v.learn(&target, 0.5).unwrap();
        assert_eq!(v[0], 0.5);
        v.learn(&target, 1.0).unwrap();
        assert_eq!(v[0], 1.0);
    }

    #[test]
    fn extend_concatenates() {
        let mut v = vec_of(&[1.0, 2.0]);
        let w = vec_of(&[3.0]);
        v.extend(&w);
        assert_eq!(v.len(), 3);
        assert_eq!(v[2], 3.0);
    }
}
