//! Interpolation and response curves shared by the plant components.

pub mod curves;
pub mod spline;

pub use curves::QuadraticPulse;
pub use spline::NaturalCubicSpline;
