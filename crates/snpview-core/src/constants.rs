//! Numerical constants and defaults
//!
//! Provides tolerance values, Touchstone defaults and chart-facing floors
//! used throughout the library.

/// Tolerance for detecting near-zero values in division and degenerate fits.
pub const NEAR_ZERO: f64 = 1e-15;

/// Value reported for `20*log10(0)`.
///
/// Charts cannot draw `-inf` or NaN, so a zero magnitude maps to the most
/// negative finite `f64` instead.
pub const DB_FLOOR: f64 = f64::MIN;

/// Default reference impedance in Ohms when a file does not declare one.
pub const DEFAULT_Z0: f64 = 50.0;

/// Smallest port count a Touchstone file can declare.
pub const MIN_PORTS: usize = 1;

/// Largest port count addressable by a `.sNp` extension.
pub const MAX_PORTS: usize = 99;

/// Maximum number of complex pairs per line when writing Touchstone v1
/// files with three or more ports.
pub const PAIRS_PER_LINE: usize = 4;

/// Significant digits written per real number so that a write/parse cycle
/// reproduces the data within 1e-9 relative.
pub const WRITE_PRECISION: usize = 12;
