//! Phase analysis
//!
//! Linear-phase deviation and phase difference between two networks, both
//! computed on unwrapped phase in degrees.

use super::core::{Network, PortPair};
use super::derived::{AngleUnit, DerivedError, Quantity, Sample};
use crate::constants::NEAR_ZERO;
use crate::math::interp_hold;

/// Summary statistics of a residual series (degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorStats {
    pub max: f64,
    pub min: f64,
    pub peak_to_peak: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std: f64,
    pub rms: f64,
}

impl ErrorStats {
    /// Statistics of `values`; `None` when empty
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let rms = (values.iter().map(|v| v * v).sum::<f64>() / n).sqrt();

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            max,
            min,
            peak_to_peak: max - min,
            mean,
            median,
            std: variance.sqrt(),
            rms,
        })
    }
}

/// Straight line through unwrapped phase vs frequency
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPhaseFit {
    /// Degrees per Hz
    pub slope: f64,
    /// Degrees at 0 Hz
    pub intercept: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Measured minus fitted phase (degrees) at each point
    pub residuals: Vec<Sample>,
    pub stats: ErrorStats,
}

impl LinearPhaseFit {
    /// Least-squares fit through `phase` samples (degrees)
    pub fn fit(phase: &[Sample]) -> Result<Self, DerivedError> {
        if phase.len() < 2 {
            return Err(DerivedError::InsufficientSamples {
                required: 2,
                available: phase.len(),
            });
        }
        let n = phase.len() as f64;
        let x_mean = phase.iter().map(|s| s.frequency).sum::<f64>() / n;
        let y_mean = phase.iter().map(|s| s.value).sum::<f64>() / n;

        let (sxy, sxx) = phase.iter().fold((0.0, 0.0), |(sxy, sxx), s| {
            let dx = s.frequency - x_mean;
            (sxy + dx * (s.value - y_mean), sxx + dx * dx)
        });
        let slope = if sxx < NEAR_ZERO { 0.0 } else { sxy / sxx };
        let intercept = y_mean - slope * x_mean;

        Self::with_line(phase, slope, intercept)
    }

    /// Residuals and statistics against a caller-chosen line
    pub fn with_line(phase: &[Sample], slope: f64, intercept: f64) -> Result<Self, DerivedError> {
        let residuals: Vec<Sample> = phase
            .iter()
            .map(|s| Sample {
                frequency: s.frequency,
                value: s.value - (slope * s.frequency + intercept),
            })
            .collect();
        let errors: Vec<f64> = residuals.iter().map(|s| s.value).collect();
        let stats = ErrorStats::from_values(&errors).ok_or(DerivedError::InsufficientSamples {
            required: 1,
            available: 0,
        })?;

        let y_mean = phase.iter().map(|s| s.value).sum::<f64>() / phase.len() as f64;
        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let ss_tot: f64 = phase.iter().map(|s| (s.value - y_mean).powi(2)).sum();
        let r_squared = if ss_tot < NEAR_ZERO {
            if ss_res < NEAR_ZERO {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        Ok(Self {
            slope,
            intercept,
            r_squared,
            residuals,
            stats,
        })
    }

    /// Fitted phase (degrees) at `frequency` (Hz)
    pub fn evaluate(&self, frequency: f64) -> f64 {
        self.slope * frequency + self.intercept
    }
}

const UNWRAPPED_DEGREES: Quantity = Quantity::Phase {
    unit: AngleUnit::Degrees,
    unwrap: true,
};

impl Network {
    /// Linear-phase fit of one element over an optional frequency window
    pub fn linear_phase_fit(
        &self,
        pair: PortPair,
        range: Option<(f64, f64)>,
    ) -> Result<LinearPhaseFit, DerivedError> {
        let phase = self.series(pair, UNWRAPPED_DEGREES, range)?.to_vec();
        LinearPhaseFit::fit(&phase)
    }
}

/// Phase of `other` minus phase of `reference`, in degrees
///
/// Evaluated on the reference's frequency points inside `range`. The other
/// network's phase is linearly interpolated onto that grid, holding its edge
/// values outside its own span.
pub fn phase_difference(
    reference: &Network,
    other: &Network,
    pair: PortPair,
    range: Option<(f64, f64)>,
    unwrap: bool,
) -> Result<Vec<Sample>, DerivedError> {
    let quantity = Quantity::Phase {
        unit: AngleUnit::Degrees,
        unwrap,
    };
    let reference_phase = reference.series(pair, quantity, range)?.to_vec();
    if reference_phase.len() < 2 {
        return Err(DerivedError::InsufficientSamples {
            required: 2,
            available: reference_phase.len(),
        });
    }

    let other_phase = other.series(pair, quantity, range)?.to_vec();
    let xs: Vec<f64> = other_phase.iter().map(|s| s.frequency).collect();
    let ys: Vec<f64> = other_phase.iter().map(|s| s.value).collect();

    reference_phase
        .iter()
        .map(|r| {
            let value = interp_hold(&xs, &ys, r.frequency).ok_or(
                DerivedError::InsufficientSamples {
                    required: 1,
                    available: 0,
                },
            )?;
            Ok(Sample {
                frequency: r.frequency,
                value: value - r.value,
            })
        })
        .collect()
}
