//! Derived quantities
//!
//! Magnitude, phase, group delay and reflection-coefficient series computed
//! on demand from a [`Network`]. A [`Series`] only records what to compute;
//! every call to [`Series::iter`] walks the selected frequency points afresh,
//! so a series can be restarted any number of times without caching.

use num_complex::Complex64;
use std::f64::consts::TAU;
use std::ops::Range;
use thiserror::Error;

use super::core::{Network, PortPair};
use crate::constants::NEAR_ZERO;
use crate::error::ErrorKind;
use crate::math::{complex_2_db, complex_2_radian, radian_2_degree};
use crate::touchstone::ParameterType;

/// Minimum selected points for a group delay series
///
/// The first and last points use one-sided differences; with a third point
/// at least one centred difference exists.
pub const GROUP_DELAY_MIN_POINTS: usize = 3;

/// Derived quantity errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DerivedError {
    #[error("need at least {required} frequency points, {available} selected")]
    InsufficientSamples { required: usize, available: usize },

    #[error("derived quantities are only defined for S-parameters, not {}-parameters", .0.token())]
    UnsupportedParameterKind(ParameterType),

    #[error("element S{pair} out of range for a {nports}-port network")]
    PortOutOfRange { pair: PortPair, nports: usize },

    #[error("S{0} is not a reflection coefficient")]
    NotReflection(PortPair),
}

impl DerivedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DerivedError::InsufficientSamples { .. } => ErrorKind::InsufficientSamples,
            DerivedError::UnsupportedParameterKind(_) => ErrorKind::UnsupportedParameterKind,
            DerivedError::PortOutOfRange { .. } | DerivedError::NotReflection(_) => {
                ErrorKind::Other
            }
        }
    }
}

/// Magnitude scale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnitudeScale {
    Linear,
    /// 20*log10(|S|)
    Db,
}

/// Angle unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleUnit {
    Radians,
    Degrees,
}

/// What to derive from a matrix element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Magnitude(MagnitudeScale),
    Phase { unit: AngleUnit, unwrap: bool },
    /// Seconds
    GroupDelay,
}

impl Quantity {
    fn min_points(&self) -> usize {
        match self {
            Quantity::GroupDelay => GROUP_DELAY_MIN_POINTS,
            _ => 1,
        }
    }
}

/// One point of a derived series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Hz
    pub frequency: f64,
    pub value: f64,
}

/// One point of a reflection-coefficient series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionSample {
    /// Hz
    pub frequency: f64,
    pub gamma: Complex64,
}

/// Sequential phase unwrapper
///
/// Each accepted angle is shifted by a multiple of 2π so that it differs
/// from the previous output by at most π.
#[derive(Debug, Clone, Default)]
pub struct PhaseUnwrapper {
    previous: Option<(f64, f64)>,
}

impl PhaseUnwrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unwrap the next angle (radians)
    pub fn unwrap(&mut self, raw: f64) -> f64 {
        let unwrapped = match self.previous {
            None => raw,
            Some((prev_raw, prev_unwrapped)) => {
                let delta = raw - prev_raw;
                prev_unwrapped + (delta - TAU * (delta / TAU).round())
            }
        };
        self.previous = Some((raw, unwrapped));
        unwrapped
    }
}

/// Unwrap a whole slice of angles in radians
pub fn unwrap_phase(raw: &[f64]) -> Vec<f64> {
    let mut unwrapper = PhaseUnwrapper::new();
    raw.iter().map(|&p| unwrapper.unwrap(p)).collect()
}

/// A lazily evaluated derived series over one matrix element
#[derive(Debug, Clone)]
pub struct Series<'a> {
    network: &'a Network,
    pair: PortPair,
    quantity: Quantity,
    indices: Range<usize>,
}

impl<'a> Series<'a> {
    pub fn pair(&self) -> PortPair {
        self.pair
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Number of samples the series yields
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Fresh iterator over the samples
    pub fn iter(&self) -> SeriesIter<'a> {
        let state = match self.quantity {
            Quantity::Magnitude(scale) => IterState::Magnitude(scale),
            Quantity::Phase { unit, unwrap } => IterState::Phase {
                unit,
                unwrapper: unwrap.then(PhaseUnwrapper::new),
            },
            Quantity::GroupDelay => IterState::GroupDelay(GroupDelayWindow::default()),
        };
        SeriesIter {
            network: self.network,
            pair: self.pair,
            next: self.indices.start,
            end: self.indices.end,
            state,
        }
    }

    /// Collect every sample
    pub fn to_vec(&self) -> Vec<Sample> {
        self.iter().collect()
    }
}

impl<'a, 'b> IntoIterator for &'b Series<'a> {
    type Item = Sample;
    type IntoIter = SeriesIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Unwrapped phase at up to three consecutive points
#[derive(Debug, Clone, Default)]
struct GroupDelayWindow {
    unwrapper: PhaseUnwrapper,
    previous: Option<(f64, f64)>,
    current: Option<(f64, f64)>,
    lookahead: Option<(f64, f64)>,
}

impl GroupDelayWindow {
    /// (omega, unwrapped phase) at `index`
    fn point(&mut self, network: &Network, pair: PortPair, index: usize) -> (f64, f64) {
        let omega = TAU * network.frequency_at(index);
        let phase = complex_2_radian(network.data()[[index, pair.row, pair.col]]);
        (omega, self.unwrapper.unwrap(phase))
    }
}

#[derive(Debug, Clone)]
enum IterState {
    Magnitude(MagnitudeScale),
    Phase {
        unit: AngleUnit,
        unwrapper: Option<PhaseUnwrapper>,
    },
    GroupDelay(GroupDelayWindow),
}

/// Iterator over a [`Series`]
#[derive(Debug, Clone)]
pub struct SeriesIter<'a> {
    network: &'a Network,
    pair: PortPair,
    next: usize,
    end: usize,
    state: IterState,
}

impl SeriesIter<'_> {
    #[inline]
    fn value_at(&self, index: usize) -> Complex64 {
        self.network.data()[[index, self.pair.row, self.pair.col]]
    }

    fn next_phase(&mut self, index: usize) -> f64 {
        let raw = complex_2_radian(self.value_at(index));
        let IterState::Phase { unit, unwrapper } = &mut self.state else {
            return raw;
        };
        let rad = match unwrapper {
            Some(u) => u.unwrap(raw),
            None => raw,
        };
        match *unit {
            AngleUnit::Radians => rad,
            AngleUnit::Degrees => radian_2_degree(rad),
        }
    }

    fn next_group_delay(&mut self, index: usize) -> f64 {
        let (network, pair, end) = (self.network, self.pair, self.end);
        let IterState::GroupDelay(window) = &mut self.state else {
            return f64::NAN;
        };

        if window.current.is_none() {
            window.current = Some(window.point(network, pair, index));
        }
        window.lookahead = if index + 1 < end {
            Some(window.point(network, pair, index + 1))
        } else {
            None
        };

        // Centred difference inside, one-sided at either end
        let value = match (window.previous, window.current, window.lookahead) {
            (Some(a), _, Some(b)) | (None, Some(a), Some(b)) | (Some(a), Some(b), None) => {
                let d_omega = b.0 - a.0;
                if d_omega.abs() < NEAR_ZERO {
                    0.0
                } else {
                    -(b.1 - a.1) / d_omega
                }
            }
            _ => 0.0,
        };

        window.previous = window.current;
        window.current = window.lookahead;
        value
    }
}

impl Iterator for SeriesIter<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let frequency = self.network.frequency_at(index);
        let value = match self.state {
            IterState::Magnitude(MagnitudeScale::Linear) => self.value_at(index).norm(),
            IterState::Magnitude(MagnitudeScale::Db) => complex_2_db(self.value_at(index)),
            IterState::Phase { .. } => self.next_phase(index),
            IterState::GroupDelay(_) => self.next_group_delay(index),
        };

        Some(Sample { frequency, value })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SeriesIter<'_> {}

/// Reflection coefficient series for Smith chart display
#[derive(Debug, Clone)]
pub struct ReflectionSeries<'a> {
    network: &'a Network,
    pair: PortPair,
    indices: Range<usize>,
}

impl<'a> ReflectionSeries<'a> {
    pub fn pair(&self) -> PortPair {
        self.pair
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Fresh iterator over the raw complex values
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ReflectionSample> + 'a {
        let network = self.network;
        let PortPair { row, col } = self.pair;
        self.indices.clone().map(move |i| ReflectionSample {
            frequency: network.frequency_at(i),
            gamma: network.data()[[i, row, col]],
        })
    }

    /// Normalised impedance at every point; `None` where Γ = 1
    pub fn impedances(&self) -> impl Iterator<Item = (f64, Option<Complex64>)> + 'a {
        self.iter()
            .map(|s| (s.frequency, gamma_to_impedance(s.gamma)))
    }

    /// Normalised admittance at every point; `None` where Γ = -1
    pub fn admittances(&self) -> impl Iterator<Item = (f64, Option<Complex64>)> + 'a {
        self.iter()
            .map(|s| (s.frequency, gamma_to_admittance(s.gamma)))
    }
}

/// Normalised impedance z = (1 + Γ) / (1 - Γ)
///
/// Returns `None` at the open-circuit point Γ = 1.
pub fn gamma_to_impedance(gamma: Complex64) -> Option<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    let denom = one - gamma;
    if denom.norm() < NEAR_ZERO {
        None
    } else {
        Some((one + gamma) / denom)
    }
}

/// Reflection coefficient Γ = (z - 1) / (z + 1) for a normalised impedance
///
/// Returns `None` for z = -1.
pub fn impedance_to_gamma(z: Complex64) -> Option<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    let denom = z + one;
    if denom.norm() < NEAR_ZERO {
        None
    } else {
        Some((z - one) / denom)
    }
}

/// Normalised admittance y = (1 - Γ) / (1 + Γ)
///
/// Returns `None` at the short-circuit point Γ = -1.
pub fn gamma_to_admittance(gamma: Complex64) -> Option<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    let denom = one + gamma;
    if denom.norm() < NEAR_ZERO {
        None
    } else {
        Some((one - gamma) / denom)
    }
}

/// Reflection coefficient Γ = (1 - y) / (1 + y) for a normalised admittance
///
/// Returns `None` for y = -1.
pub fn admittance_to_gamma(y: Complex64) -> Option<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    let denom = one + y;
    if denom.norm() < NEAR_ZERO {
        None
    } else {
        Some((one - y) / denom)
    }
}

impl Network {
    fn check_element(&self, pair: PortPair) -> Result<(), DerivedError> {
        if self.param_type() != ParameterType::S {
            return Err(DerivedError::UnsupportedParameterKind(self.param_type()));
        }
        if !self.contains(pair) {
            return Err(DerivedError::PortOutOfRange {
                pair,
                nports: self.nports(),
            });
        }
        Ok(())
    }

    fn select(&self, range: Option<(f64, f64)>, required: usize) -> Result<Range<usize>, DerivedError> {
        let indices = match range {
            None => 0..self.nfreq(),
            Some((lo, hi)) => self.index_range(lo, hi).unwrap_or(0..0),
        };
        if indices.len() < required {
            return Err(DerivedError::InsufficientSamples {
                required,
                available: indices.len(),
            });
        }
        Ok(indices)
    }

    /// Derived series for one matrix element
    ///
    /// # Arguments
    /// * `pair` - 0-based matrix element
    /// * `quantity` - what to compute
    /// * `range` - optional inclusive frequency window in Hz
    ///
    /// # Example
    /// ```
    /// use snpview_core::prelude::*;
    /// let content = b"# GHz S MA R 50\n1 0.5 0\n2 0.25 0\n";
    /// let ntwk = Touchstone::from_bytes(content, 1).unwrap();
    /// let s11 = ntwk
    ///     .series(PortPair::new(0, 0), Quantity::Magnitude(MagnitudeScale::Linear), None)
    ///     .unwrap();
    /// let mags: Vec<f64> = s11.iter().map(|s| s.value).collect();
    /// assert_eq!(mags, vec![0.5, 0.25]);
    /// ```
    pub fn series(
        &self,
        pair: PortPair,
        quantity: Quantity,
        range: Option<(f64, f64)>,
    ) -> Result<Series<'_>, DerivedError> {
        self.check_element(pair)?;
        let indices = self.select(range, quantity.min_points())?;
        Ok(Series {
            network: self,
            pair,
            quantity,
            indices,
        })
    }

    /// Raw complex reflection coefficients of a diagonal element
    pub fn reflection(
        &self,
        pair: PortPair,
        range: Option<(f64, f64)>,
    ) -> Result<ReflectionSeries<'_>, DerivedError> {
        self.check_element(pair)?;
        if !pair.is_reflection() {
            return Err(DerivedError::NotReflection(pair));
        }
        let indices = self.select(range, 1)?;
        Ok(ReflectionSeries {
            network: self,
            pair,
            indices,
        })
    }
}
