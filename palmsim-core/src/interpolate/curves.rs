//! Closed-form response curves.

use crate::errors::{PalmSimError, PalmSimResult};
use crate::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Bounded parabolic growth-rate pulse.
///
/// The rate is zero outside `(start, end)` and a downward parabola inside,
/// scaled so that its integral over the window equals `area`:
///
/// $$ f(x) = \frac{h}{(W/2)^2} (x - x_1)(x_2 - x),\quad h = \frac{3}{2}\frac{A}{W} $$
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticPulse {
    start: FloatValue,
    end: FloatValue,
    area: FloatValue,
}

impl QuadraticPulse {
    pub fn new(start: FloatValue, end: FloatValue, area: FloatValue) -> PalmSimResult<Self> {
        if !(end > start) {
            return Err(PalmSimError::invalid_parameter(
                "growth window",
                format!("end ({}) must be after start ({})", end, start),
            ));
        }
        Ok(Self { start, end, area })
    }

    pub fn start(&self) -> FloatValue {
        self.start
    }

    pub fn end(&self) -> FloatValue {
        self.end
    }

    /// Peak rate, reached halfway through the window.
    pub fn peak(&self) -> FloatValue {
        1.5 * self.area / (self.end - self.start)
    }

    pub fn rate(&self, x: FloatValue) -> FloatValue {
        if x <= self.start || x >= self.end {
            return 0.0;
        }
        let half_width = 0.5 * (self.end - self.start);
        (self.peak() * (x - self.start) * (self.end - x) / half_width.powi(2)).max(0.0)
    }
}

/// Logistic curve rising from 0 to 1 around `midpoint`.
pub fn logistic(x: FloatValue, midpoint: FloatValue, scale: FloatValue) -> FloatValue {
    1.0 / (1.0 + (-(x - midpoint) / scale).exp())
}

/// Gompertz curve $a e^{-b e^{-c t}}$.
pub fn gompertz(t: FloatValue, a: FloatValue, b: FloatValue, c: FloatValue) -> FloatValue {
    a * (-b * (-c * t).exp()).exp()
}

/// Exponential decay towards an asymptote, $a (1 + b e^{-c t})$.
pub fn decay_to_asymptote(
    t: FloatValue,
    a: FloatValue,
    b: FloatValue,
    c: FloatValue,
) -> FloatValue {
    a * (1.0 + b * (-c * t).exp())
}

/// Saturating response $1 - e^{-a x}$.
pub fn saturating(x: FloatValue, a: FloatValue) -> FloatValue {
    1.0 - (-a * x).exp()
}
