use problemo::Problem;

use super::matrix::CsrMatrix;
use super::vector::Vector;

/// `out <- a + b`.
pub fn sum(a: &Vector, b: &Vector) -> Result<Vector, Problem> {
    a.dot(b)?; // cheap length check reused for the error path
    let mut out = a.clone();
    for i in 0..out.len() {
        out[i] += b[i];
    }
    Ok(out)
}

/// `out <- a - b`.
pub fn subtract(a: &Vector, b: &Vector) -> Result<Vector, Problem> {
    a.dot(b)?;
    let mut out = a.clone();
    for i in 0..out.len() {
        out[i] -= b[i];
    }
    Ok(out)
}

/// `out <- alpha * a + beta * b`, two-term dense form.
pub fn linear_combination_2(alpha: f64, a: &Vector, beta: f64, b: &Vector) -> Result<Vector, Problem> {
    a.dot(b)?;
    let mut out = a.clone();
    for i in 0..out.len() {
        out[i] = alpha * a[i] + beta * b[i];
    }
    Ok(out)
}

/// `out <- alpha * a + beta * b + gamma * c`, three-term dense form.
pub fn linear_combination_3(
    alpha: f64,
    a: &Vector,
    beta: f64,
    b: &Vector,
    gamma: f64,
    c: &Vector,
) -> Result<Vector, Problem> {
    a.dot(b)?;
    a.dot(c)?;
    let mut out = a.clone();
    for i in 0..out.len() {
        out[i] = alpha * a[i] + beta * b[i] + gamma * c[i];
    }
    Ok(out)
}

/// `out <- alpha * (M v) + beta * b`, SpMV fused with a two-term combination.
pub fn linear_combination_spmv_2(
    alpha: f64,
    matrix: &CsrMatrix,
    v: &Vector,
    beta: f64,
    b: &Vector,
) -> Result<Vector, Problem> {
    let mv = matrix.dot(v)?;
    mv.dot(b)?;
    let mut out = mv.clone();
    for i in 0..out.len() {
        out[i] = alpha * mv[i] + beta * b[i];
    }
    Ok(out)
}

/// `out <- alpha * (M v) + beta * b + gamma * c`, SpMV fused with a
/// three-term combination.
pub fn linear_combination_spmv_3(
    alpha: f64,
    matrix: &CsrMatrix,
    v: &Vector,
    beta: f64,
    b: &Vector,
    gamma: f64,
    c: &Vector,
) -> Result<Vector, Problem> {
    let mv = matrix.dot(v)?;
    mv.dot(b)?;
    mv.dot(c)?;
    let mut out = mv.clone();
    for i in 0..out.len() {
        out[i] = alpha * mv[i] + beta * b[i] + gamma * c[i];
    }
    Ok(out)
}

/// `u . (M v)`, a dot product fused with an SpMV — used for the
/// primal-dual bilinear term `yᵀ(Ax)` without materializing `Ax`
/// when `u` is cheap to re-walk.
pub fn dot_dot(u: &Vector, matrix: &CsrMatrix, v: &Vector) -> Result<f64, Problem> {
    let mv = matrix.dot(v)?;
    u.dot(&mv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(values: &[f64]) -> Vector {
        let mut v = Vector::zeros(values.len());
        for (i, &x) in values.iter().enumerate() {
            v[i] = x;
        }
        v
    }

    #[test]
    fn sum_and_subtract_are_inverses() {
        let a = vec_of(&[1.0, 2.0, 3.0]);
        let b = vec_of(&[0.5, -1.0, 2.0]);
        let summed = sum(&a, &b).unwrap();
        let recovered = subtract(&summed, &b).unwrap();
        for i in 0..3 {
            assert!((recovered[i] - a[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn linear_combination_2_matches_manual_computation() {
        let a = vec_of(&[1.0, 0.0]);
        let b = vec_of(&[0.0, 1.0]);
        let out = linear_combination_2(2.0, &a, 3.0, &b).unwrap();
        assert_eq!(out[0], 2.0);
        assert_eq!(out[1], 3.0);
    }

    #[test]
    fn dot_dot_matches_explicit_spmv_then_dot() {
        let values = [2.0];
        let rows = [0usize];
        let cols = [0usize];
        let m = CsrMatrix::from_triplets(&values, &rows, &cols, 1, 1).unwrap();
        let u = vec_of(&[3.0]);
        let v = vec_of(&[5.0]);
        let direct = dot_dot(&u, &m, &v).unwrap();
        let expected = u.dot(&m.dot(&v).unwrap()).unwrap();
        assert_eq!(direct, expected);
    }
}
