//! Frequency module - represents the frequency axis of a dataset
//!
//! Frequencies are always stored in Hz. The unit found in the file header is
//! kept alongside so data can be written back the way it was read.

use std::fmt;
use thiserror::Error;

/// Frequency unit enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyUnit {
    Hz,
    KHz,
    MHz,
    #[default]
    GHz,
    THz,
}

impl FrequencyUnit {
    /// Get the multiplier to convert to Hz
    pub fn multiplier(&self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::KHz => 1e3,
            FrequencyUnit::MHz => 1e6,
            FrequencyUnit::GHz => 1e9,
            FrequencyUnit::THz => 1e12,
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hz" => Some(FrequencyUnit::Hz),
            "khz" => Some(FrequencyUnit::KHz),
            "mhz" => Some(FrequencyUnit::MHz),
            "ghz" => Some(FrequencyUnit::GHz),
            "thz" => Some(FrequencyUnit::THz),
            _ => None,
        }
    }

    /// Token used on a Touchstone option line
    pub fn touchstone_token(&self) -> &'static str {
        match self {
            FrequencyUnit::Hz => "HZ",
            FrequencyUnit::KHz => "KHZ",
            FrequencyUnit::MHz => "MHZ",
            FrequencyUnit::GHz => "GHZ",
            FrequencyUnit::THz => "THZ",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            FrequencyUnit::Hz => "Hz",
            FrequencyUnit::KHz => "kHz",
            FrequencyUnit::MHz => "MHz",
            FrequencyUnit::GHz => "GHz",
            FrequencyUnit::THz => "THz",
        }
    }

    /// Pick the largest unit that keeps `hz` at or above 1
    pub fn best_for(hz: f64) -> Self {
        let hz = hz.abs();
        if hz >= 1e12 {
            FrequencyUnit::THz
        } else if hz >= 1e9 {
            FrequencyUnit::GHz
        } else if hz >= 1e6 {
            FrequencyUnit::MHz
        } else if hz >= 1e3 {
            FrequencyUnit::KHz
        } else {
            FrequencyUnit::Hz
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reasons a frequency vector cannot form a valid axis
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FrequencyAxisError {
    #[error("frequency axis is empty")]
    Empty,

    /// NaN, infinite or negative value at `index`
    #[error("invalid frequency {value} at index {index}")]
    InvalidValue { index: usize, value: f64 },

    /// `f[index] <= f[index - 1]`
    #[error("frequency {current} at index {index} does not exceed {previous}")]
    NotIncreasing { index: usize, previous: f64, current: f64 },
}

/// Frequency axis of a dataset
///
/// Invariant: at least one point, every value finite and non-negative,
/// strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Frequency {
    /// Frequency vector in Hz
    f: Vec<f64>,
    /// Unit the values were declared in
    unit: FrequencyUnit,
}

impl Frequency {
    /// Create from a frequency vector already expressed in Hz
    pub fn from_hz(f: Vec<f64>, unit: FrequencyUnit) -> Result<Self, FrequencyAxisError> {
        Self::validate(&f)?;
        Ok(Self { f, unit })
    }

    /// Create from a frequency vector expressed in `unit`
    pub fn from_scaled(f: &[f64], unit: FrequencyUnit) -> Result<Self, FrequencyAxisError> {
        let mult = unit.multiplier();
        Self::from_hz(f.iter().map(|&x| x * mult).collect(), unit)
    }

    /// Create a linearly spaced axis between `start` and `stop` (Hz)
    pub fn linear(
        start: f64,
        stop: f64,
        npoints: usize,
        unit: FrequencyUnit,
    ) -> Result<Self, FrequencyAxisError> {
        let f = if npoints == 1 {
            vec![start]
        } else {
            let step = (stop - start) / (npoints.saturating_sub(1)) as f64;
            (0..npoints).map(|i| start + i as f64 * step).collect()
        };
        Self::from_hz(f, unit)
    }

    fn validate(f: &[f64]) -> Result<(), FrequencyAxisError> {
        if f.is_empty() {
            return Err(FrequencyAxisError::Empty);
        }
        for (index, &value) in f.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(FrequencyAxisError::InvalidValue { index, value });
            }
            if index > 0 && value <= f[index - 1] {
                return Err(FrequencyAxisError::NotIncreasing {
                    index,
                    previous: f[index - 1],
                    current: value,
                });
            }
        }
        Ok(())
    }

    /// Get frequency vector in Hz
    #[inline]
    pub fn f(&self) -> &[f64] {
        &self.f
    }

    /// Get frequency vector in the declared unit
    pub fn f_scaled(&self) -> Vec<f64> {
        let mult = self.unit.multiplier();
        self.f.iter().map(|&x| x / mult).collect()
    }

    /// Get the number of frequency points
    #[inline]
    pub fn npoints(&self) -> usize {
        self.f.len()
    }

    /// Get the start frequency in Hz
    #[inline]
    pub fn start(&self) -> f64 {
        self.f[0]
    }

    /// Get the stop frequency in Hz
    #[inline]
    pub fn stop(&self) -> f64 {
        self.f[self.f.len() - 1]
    }

    /// Get the frequency span in Hz
    #[inline]
    pub fn span(&self) -> f64 {
        self.stop() - self.start()
    }

    /// Get the declared unit
    #[inline]
    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    /// Frequency at `index`, clamped to the valid range
    pub fn at(&self, index: usize) -> f64 {
        self.f[index.min(self.f.len() - 1)]
    }

    /// Index of the point closest to `frequency`
    ///
    /// Binary search over the increasing axis. When `frequency` is exactly
    /// halfway between two points the lower index wins. Values outside the
    /// axis resolve to the first or last point.
    pub fn nearest_index(&self, frequency: f64) -> usize {
        let last = self.f.len() - 1;
        if frequency.is_nan() || frequency <= self.f[0] {
            return 0;
        }
        if frequency >= self.f[last] {
            return last;
        }
        // First index with f >= frequency; guaranteed in 1..=last here.
        let upper = self.f.partition_point(|&x| x < frequency);
        let lower = upper - 1;
        if frequency - self.f[lower] <= self.f[upper] - frequency {
            lower
        } else {
            upper
        }
    }

    /// Inclusive index window covering `[f_lo, f_hi]`
    ///
    /// Returns `None` when no point falls inside the window.
    pub fn index_range(&self, f_lo: f64, f_hi: f64) -> Option<std::ops::Range<usize>> {
        let (lo, hi) = if f_lo <= f_hi { (f_lo, f_hi) } else { (f_hi, f_lo) };
        let first = self.f.partition_point(|&x| x < lo);
        let end = self.f.partition_point(|&x| x <= hi);
        (first < end).then_some(first..end)
    }
}

/// Format a frequency with an automatically chosen unit, e.g. `2.4 GHz`
pub fn format_frequency(hz: f64) -> String {
    let unit = FrequencyUnit::best_for(hz);
    let scaled = hz / unit.multiplier();
    let text = format!("{:.3}", scaled);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, unit)
}
