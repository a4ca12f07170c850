//! Scalar conversions and interpolation helpers

pub mod conversions;
pub mod interpolation;

pub use conversions::*;
pub use interpolation::{interp_hold, interp_points_hold};
