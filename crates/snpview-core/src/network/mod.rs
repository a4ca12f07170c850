//! Network module - network parameter dataset
//!
//! Provides the immutable [`Network`] dataset, the derived quantity engine
//! built on it and phase analysis helpers.

mod analysis;
mod core;
mod derived;
mod io;

pub use analysis::{phase_difference, ErrorStats, LinearPhaseFit};
pub use self::core::{Network, NetworkError, PortPair};
pub use derived::{
    admittance_to_gamma, gamma_to_admittance, gamma_to_impedance, impedance_to_gamma,
    unwrap_phase, AngleUnit, DerivedError, MagnitudeScale, PhaseUnwrapper, Quantity,
    ReflectionSample, ReflectionSeries, Sample, Series, SeriesIter, GROUP_DELAY_MIN_POINTS,
};
