//! Linear algebra utilities.

use crate::errors::{PalmSimError, PalmSimResult};

/// Solve the tridiagonal system $Ax = d$ with the Thomas algorithm.
///
/// The matrix A has the form:
/// ```text
/// | b[0]  c[0]   0     0    ...   0   |
/// | a[1]  b[1]  c[1]   0    ...   0   |
/// |  0    a[2]  b[2]  c[2]  ...   0   |
/// | ...   ...   ...   ...   ...  ... |
/// |  0     0     0   a[n-1] b[n-1]   |
/// ```
///
/// `a[0]` and `c[n-1]` are ignored. An empty system has an empty solution.
///
/// ```
/// use palmsim_core::utils::linear_algebra::thomas_solve;
///
/// let x = thomas_solve(&[0.0, 1.0], &[4.0, 4.0], &[1.0, 0.0], &[5.0, 5.0]).unwrap();
/// assert!((x[0] - 1.0).abs() < 1e-12);
/// assert!((x[1] - 1.0).abs() < 1e-12);
/// ```
pub fn thomas_solve(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> PalmSimResult<Vec<f64>> {
    let n = b.len();
    if a.len() != n || c.len() != n || d.len() != n {
        return Err(PalmSimError::Error(format!(
            "tridiagonal system has inconsistent lengths: a={}, b={}, c={}, d={}",
            a.len(),
            n,
            c.len(),
            d.len()
        )));
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    let mut denom = b[0];
    for i in 0..n {
        if i > 0 {
            denom = b[i] - a[i] * c_prime[i - 1];
        }
        if denom.abs() < 1e-15 {
            return Err(PalmSimError::Error(format!(
                "zero pivot encountered at row {}",
                i
            )));
        }
        c_prime[i] = c[i] / denom;
        d_prime[i] = if i == 0 {
            d[0] / denom
        } else {
            (d[i] - a[i] * d_prime[i - 1]) / denom
        };
    }

    let mut x = d_prime;
    for i in (0..n - 1).rev() {
        x[i] -= c_prime[i] * x[i + 1];
    }
    Ok(x)
}
