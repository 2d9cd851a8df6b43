//! Natural cubic spline through a set of control points.
//!
//! # Algorithm
//!
//! With knot spacing $h_i = x_{i+1} - x_i$ the second derivatives $M_i$ at
//! the interior knots solve the tridiagonal system
//!
//! $$ h_{i-1} M_{i-1} + 2 (h_{i-1} + h_i) M_i + h_i M_{i+1}
//!    = 6 \left( \frac{y_{i+1} - y_i}{h_i} - \frac{y_i - y_{i-1}}{h_{i-1}} \right) $$
//!
//! with $M_0 = M_{n-1} = 0$. Outside the knot range the spline is continued
//! linearly with its end slopes.

use crate::errors::{PalmSimError, PalmSimResult};
use crate::timestep::FloatValue;
use crate::utils::linear_algebra::thomas_solve;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalCubicSpline {
    x: Vec<FloatValue>,
    y: Vec<FloatValue>,
    second_derivatives: Vec<FloatValue>,
}

impl NaturalCubicSpline {
    /// Fit a spline through `(x, y)` control points sorted by strictly
    /// increasing `x`. At least two points are required.
    pub fn new(points: &[[FloatValue; 2]]) -> PalmSimResult<Self> {
        if points.len() < 2 {
            return Err(PalmSimError::InvalidSpline(format!(
                "at least two control points are required, got {}",
                points.len()
            )));
        }
        if points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(PalmSimError::InvalidSpline(
                "control points must be finite".to_string(),
            ));
        }
        if points.windows(2).any(|w| w[1][0] <= w[0][0]) {
            return Err(PalmSimError::InvalidSpline(
                "control points must be strictly increasing in x".to_string(),
            ));
        }

        let x: Vec<FloatValue> = points.iter().map(|p| p[0]).collect();
        let y: Vec<FloatValue> = points.iter().map(|p| p[1]).collect();
        let n = x.len();
        let h: Vec<FloatValue> = x.windows(2).map(|w| w[1] - w[0]).collect();

        let mut second_derivatives = vec![0.0; n];
        if n > 2 {
            let interior = n - 2;
            let mut sub = vec![0.0; interior];
            let mut diag = vec![0.0; interior];
            let mut sup = vec![0.0; interior];
            let mut rhs = vec![0.0; interior];
            for k in 0..interior {
                let i = k + 1;
                sub[k] = h[i - 1];
                diag[k] = 2.0 * (h[i - 1] + h[i]);
                sup[k] = h[i];
                rhs[k] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
            }
            let solution = thomas_solve(&sub, &diag, &sup, &rhs)?;
            second_derivatives[1..n - 1].copy_from_slice(&solution);
        }

        Ok(Self {
            x,
            y,
            second_derivatives,
        })
    }

    /// Control point abscissae.
    pub fn knots(&self) -> &[FloatValue] {
        &self.x
    }

    /// Evaluate the spline at `x`.
    pub fn evaluate(&self, x: FloatValue) -> FloatValue {
        let n = self.x.len();
        let m = &self.second_derivatives;

        if x <= self.x[0] {
            return self.y[0] + self.slope_at_start() * (x - self.x[0]);
        }
        if x >= self.x[n - 1] {
            return self.y[n - 1] + self.slope_at_end() * (x - self.x[n - 1]);
        }

        // Index of the interval [x_i, x_{i+1}) containing x
        let i = self.x.partition_point(|knot| *knot <= x) - 1;
        let h = self.x[i + 1] - self.x[i];
        let left = self.x[i + 1] - x;
        let right = x - self.x[i];

        m[i] * left.powi(3) / (6.0 * h)
            + m[i + 1] * right.powi(3) / (6.0 * h)
            + (self.y[i] / h - m[i] * h / 6.0) * left
            + (self.y[i + 1] / h - m[i + 1] * h / 6.0) * right
    }

    fn slope_at_start(&self) -> FloatValue {
        let h = self.x[1] - self.x[0];
        let m = &self.second_derivatives;
        (self.y[1] - self.y[0]) / h - h * (2.0 * m[0] + m[1]) / 6.0
    }

    fn slope_at_end(&self) -> FloatValue {
        let n = self.x.len();
        let h = self.x[n - 1] - self.x[n - 2];
        let m = &self.second_derivatives;
        (self.y[n - 1] - self.y[n - 2]) / h + h * (m[n - 2] + 2.0 * m[n - 1]) / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn points() -> Vec<[f64; 2]> {
        vec![
            [0.0, 1.6],
            [3.0, 9.5],
            [6.0, 19.6],
            [9.0, 22.8],
            [12.0, 19.2],
            [15.0, 13.5],
        ]
    }

    #[test]
    fn passes_through_control_points() {
        let spline = NaturalCubicSpline::new(&points()).unwrap();
        for [x, y] in points() {
            assert_relative_eq!(spline.evaluate(x), y, epsilon = 1e-10);
        }
    }

    #[test]
    fn is_smooth_between_control_points() {
        let spline = NaturalCubicSpline::new(&points()).unwrap();
        // Continuity of the first derivative across an interior knot
        let eps = 1e-6;
        let left = (spline.evaluate(6.0) - spline.evaluate(6.0 - eps)) / eps;
        let right = (spline.evaluate(6.0 + eps) - spline.evaluate(6.0)) / eps;
        assert_relative_eq!(left, right, epsilon = 1e-4);
    }

    #[test]
    fn reproduces_straight_lines() {
        let spline = NaturalCubicSpline::new(&[[0.0, 1.0], [1.0, 3.0], [4.0, 9.0]]).unwrap();
        assert_relative_eq!(spline.evaluate(2.5), 6.0, epsilon = 1e-12);
        assert_relative_eq!(spline.evaluate(-1.0), -1.0, epsilon = 1e-12);
        assert_relative_eq!(spline.evaluate(5.0), 11.0, epsilon = 1e-12);
    }

    #[test]
    fn two_points_are_linear() {
        let spline = NaturalCubicSpline::new(&[[0.0, 0.0], [2.0, 4.0]]).unwrap();
        assert_relative_eq!(spline.evaluate(0.5), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_unsorted_points() {
        assert!(NaturalCubicSpline::new(&[[1.0, 0.0], [0.0, 1.0]]).is_err());
        assert!(NaturalCubicSpline::new(&[[1.0, 0.0]]).is_err());
    }
}
