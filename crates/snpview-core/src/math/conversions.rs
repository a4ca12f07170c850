//! Unit conversion functions
//!
//! Conversions between complex values and the magnitude / dB / angle
//! representations used on disk and on screen.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::constants::DB_FLOOR;

/// Convert complex number to magnitude
#[inline]
pub fn complex_2_magnitude(z: Complex64) -> f64 {
    z.norm()
}

/// Convert complex number to dB (20*log10(|z|)), floored at [`DB_FLOOR`]
#[inline]
pub fn complex_2_db(z: Complex64) -> f64 {
    magnitude_2_db(z.norm())
}

/// Convert complex number to phase in radians, in (-π, π]
#[inline]
pub fn complex_2_radian(z: Complex64) -> f64 {
    z.arg()
}

/// Convert complex number to phase in degrees, in (-180, 180]
#[inline]
pub fn complex_2_degree(z: Complex64) -> f64 {
    radian_2_degree(z.arg())
}

/// Convert magnitude to dB (20*log10(mag))
///
/// Zero maps to [`DB_FLOOR`] rather than `-inf`.
#[inline]
pub fn magnitude_2_db(mag: f64) -> f64 {
    if mag <= 0.0 {
        DB_FLOOR
    } else {
        20.0 * mag.log10()
    }
}

/// Convert dB to magnitude (10^(dB/20))
#[inline]
pub fn db_2_magnitude(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert (magnitude, degree) to complex
#[inline]
pub fn magdeg_2_reim(mag: f64, deg: f64) -> Complex64 {
    Complex64::from_polar(mag, degree_2_radian(deg))
}

/// Convert (dB, degree) to complex
#[inline]
pub fn dbdeg_2_reim(db: f64, deg: f64) -> Complex64 {
    magdeg_2_reim(db_2_magnitude(db), deg)
}

/// Convert complex to (magnitude, degree)
#[inline]
pub fn reim_2_magdeg(z: Complex64) -> (f64, f64) {
    (z.norm(), complex_2_degree(z))
}

/// Convert complex to (dB, degree)
#[inline]
pub fn reim_2_dbdeg(z: Complex64) -> (f64, f64) {
    (complex_2_db(z), complex_2_degree(z))
}

/// Convert radians to degrees
#[inline]
pub fn radian_2_degree(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Convert degrees to radians
#[inline]
pub fn degree_2_radian(deg: f64) -> f64 {
    deg * PI / 180.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_complex_2_magnitude() {
        // 5 = |3 + 4j|
        let z = Complex64::new(3.0, 4.0);
        assert_relative_eq!(complex_2_magnitude(z), 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_complex_2_db() {
        // 20 dB = 20 * log10(|6 + 8j|)
        let z = Complex64::new(6.0, 8.0);
        assert_relative_eq!(complex_2_db(z), 20.0, epsilon = 1e-10);
    }

    #[test]
    fn test_db_floor_for_zero() {
        assert_eq!(complex_2_db(Complex64::new(0.0, 0.0)), DB_FLOOR);
        assert_eq!(magnitude_2_db(0.0), DB_FLOOR);
        assert!(magnitude_2_db(0.0).is_finite());
    }

    #[test]
    fn test_complex_2_degree() {
        // 90° = angle(0 + 1j)
        let z = Complex64::new(0.0, 1.0);
        assert_relative_eq!(complex_2_degree(z), 90.0, epsilon = 1e-10);
        assert_relative_eq!(complex_2_degree(Complex64::new(-1.0, 0.0)), 180.0, epsilon = 1e-10);
    }

    #[test]
    fn test_complex_2_radian() {
        assert_relative_eq!(complex_2_radian(Complex64::new(0.0, -1.0)), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(complex_2_radian(Complex64::new(-1.0, 0.0)), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_db_2_magnitude() {
        assert_relative_eq!(db_2_magnitude(20.0), 10.0, epsilon = 1e-10);
        assert_relative_eq!(db_2_magnitude(-6.0), 0.501187, epsilon = 1e-6);
    }

    #[test]
    fn test_magdeg_2_reim() {
        let z = magdeg_2_reim(1.0, 90.0);
        assert_relative_eq!(z.re, 0.0, epsilon = 1e-10);
        assert_relative_eq!(z.im, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_dbdeg_2_reim() {
        let z = dbdeg_2_reim(20.0, 90.0);
        assert_relative_eq!(z.re, 0.0, epsilon = 1e-10);
        assert_relative_eq!(z.im, 10.0, epsilon = 1e-10);
    }

    #[test]
    fn test_inverse_pairs() {
        let z = Complex64::new(0.3, -0.4);
        let (mag, deg) = reim_2_magdeg(z);
        let back = magdeg_2_reim(mag, deg);
        assert_relative_eq!(back.re, z.re, epsilon = 1e-12);
        assert_relative_eq!(back.im, z.im, epsilon = 1e-12);

        let (db, deg) = reim_2_dbdeg(z);
        let back = dbdeg_2_reim(db, deg);
        assert_relative_eq!(back.re, z.re, epsilon = 1e-12);
        assert_relative_eq!(back.im, z.im, epsilon = 1e-12);
    }
}
