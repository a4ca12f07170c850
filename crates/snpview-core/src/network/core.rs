//! Core Network struct and constructors
//!
//! Contains the immutable network parameter dataset and its accessors.

use ndarray::{Array1, Array3, ArrayView2};
use num_complex::Complex64;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::{MAX_PORTS, MIN_PORTS};
use crate::frequency::{Frequency, FrequencyAxisError};
use crate::touchstone::{
    DataFormat, ParameterType, Touchstone, TouchstoneError, TouchstoneVersion,
};

/// Errors raised when assembling a [`Network`] from parts
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("invalid port count {0}: expected 1..=99")]
    PortCount(usize),

    #[error("data shape {found:?} does not match [{nfreq}, {nports}, {nports}]")]
    ShapeMismatch {
        nfreq: usize,
        nports: usize,
        found: Vec<usize>,
    },

    #[error("{0}")]
    Shape(String),

    #[error("{found} reference impedances for {nports} ports")]
    ImpedanceCount { nports: usize, found: usize },

    #[error("reference impedance {value} at port {port} must be positive")]
    InvalidImpedance { port: usize, value: f64 },

    #[error("invalid frequency axis: {0}")]
    Frequency(#[from] FrequencyAxisError),
}

/// A (row, column) element of the parameter matrix, 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortPair {
    pub row: usize,
    pub col: usize,
}

impl PortPair {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Diagonal elements are reflection coefficients
    #[inline]
    pub fn is_reflection(&self) -> bool {
        self.row == self.col
    }
}

impl fmt::Display for PortPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.row < 9 && self.col < 9 {
            write!(f, "{}{}", self.row + 1, self.col + 1)
        } else {
            write!(f, "{},{}", self.row + 1, self.col + 1)
        }
    }
}

/// An N-port network parameter dataset
///
/// One complex `nports x nports` matrix per frequency point. Instances are
/// immutable once built; reloading a file produces a new `Network`.
#[derive(Debug, Clone)]
pub struct Network {
    /// Frequency axis
    frequency: Frequency,
    /// Parameter data [nfreq, nports, nports]
    data: Array3<Complex64>,
    /// Reference impedance (per port, Ohms)
    z0: Array1<f64>,
    param_type: ParameterType,
    format: DataFormat,
    version: TouchstoneVersion,
    comments: Vec<String>,
    source: Option<PathBuf>,
}

impl Network {
    /// Create a new S-parameter network, validating shapes and impedances
    ///
    /// The frequency axis is already validated by [`Frequency`].
    pub fn new(
        frequency: Frequency,
        data: Array3<Complex64>,
        z0: Array1<f64>,
    ) -> Result<Self, NetworkError> {
        let shape = data.shape();
        let nports = shape[1];
        if !(MIN_PORTS..=MAX_PORTS).contains(&nports) {
            return Err(NetworkError::PortCount(nports));
        }
        if shape[0] != frequency.npoints() || shape[2] != nports {
            return Err(NetworkError::ShapeMismatch {
                nfreq: frequency.npoints(),
                nports,
                found: shape.to_vec(),
            });
        }
        if z0.len() != nports {
            return Err(NetworkError::ImpedanceCount {
                nports,
                found: z0.len(),
            });
        }
        if let Some((port, &value)) = z0
            .iter()
            .enumerate()
            .find(|(_, &z)| !(z.is_finite() && z > 0.0))
        {
            return Err(NetworkError::InvalidImpedance { port, value });
        }

        Ok(Self {
            frequency,
            data,
            z0,
            param_type: ParameterType::S,
            format: DataFormat::RI,
            version: TouchstoneVersion::V1,
            comments: Vec::new(),
            source: None,
        })
    }

    /// Create from a Touchstone file
    pub fn from_touchstone<P: AsRef<Path>>(path: P) -> Result<Self, TouchstoneError> {
        Touchstone::from_file(path)
    }

    /// Create from Touchstone content
    ///
    /// # Arguments
    /// * `content` - Touchstone file content
    /// * `nports` - Number of ports (typically derived from file extension, e.g., .s2p = 2 ports)
    pub fn from_touchstone_content(content: &[u8], nports: usize) -> Result<Self, TouchstoneError> {
        Touchstone::from_bytes(content, nports)
    }

    pub fn with_param_type(mut self, param_type: ParameterType) -> Self {
        self.param_type = param_type;
        self
    }

    /// Same data, re-encoded as `format` on export
    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_version(mut self, version: TouchstoneVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }

    /// Get the number of ports
    #[inline]
    pub fn nports(&self) -> usize {
        self.data.shape()[1]
    }

    /// Get the number of frequency points
    #[inline]
    pub fn nfreq(&self) -> usize {
        self.data.shape()[0]
    }

    #[inline]
    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    /// Raw parameter data [nfreq, nports, nports]
    #[inline]
    pub fn data(&self) -> &Array3<Complex64> {
        &self.data
    }

    #[inline]
    pub fn z0(&self) -> &Array1<f64> {
        &self.z0
    }

    #[inline]
    pub fn param_type(&self) -> ParameterType {
        self.param_type
    }

    #[inline]
    pub fn format(&self) -> DataFormat {
        self.format
    }

    #[inline]
    pub fn version(&self) -> TouchstoneVersion {
        self.version
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// File the network was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Short display name: the source file name, or `"network"`
    pub fn name(&self) -> String {
        self.source
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "network".to_string())
    }

    #[inline]
    fn clamp_index(&self, index: usize) -> usize {
        index.min(self.nfreq() - 1)
    }

    /// Frequency in Hz at `index` (clamped)
    pub fn frequency_at(&self, index: usize) -> f64 {
        self.frequency.at(index)
    }

    /// Parameter matrix at `index` (clamped)
    pub fn matrix_at(&self, index: usize) -> ArrayView2<'_, Complex64> {
        self.data
            .index_axis(ndarray::Axis(0), self.clamp_index(index))
    }

    /// Single matrix element; every index is clamped to its valid range
    pub fn element(&self, row: usize, col: usize, index: usize) -> Complex64 {
        let last_port = self.nports() - 1;
        self.data[[
            self.clamp_index(index),
            row.min(last_port),
            col.min(last_port),
        ]]
    }

    /// Index of the frequency point closest to `frequency` (Hz)
    pub fn nearest_index(&self, frequency: f64) -> usize {
        self.frequency.nearest_index(frequency)
    }

    /// Indices of the points inside `[f_lo, f_hi]` (Hz, inclusive)
    pub fn index_range(&self, f_lo: f64, f_hi: f64) -> Option<std::ops::Range<usize>> {
        self.frequency.index_range(f_lo, f_hi)
    }

    /// (first, last) frequency in Hz
    pub fn frequency_range(&self) -> (f64, f64) {
        (self.frequency.start(), self.frequency.stop())
    }

    /// Every (row, col) element in row-major order
    pub fn port_pairs(&self) -> impl Iterator<Item = PortPair> + '_ {
        let n = self.nports();
        (0..n).flat_map(move |row| (0..n).map(move |col| PortPair { row, col }))
    }

    /// Whether `pair` addresses an element of this network
    #[inline]
    pub fn contains(&self, pair: PortPair) -> bool {
        pair.row < self.nports() && pair.col < self.nports()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FrequencyUnit;

    fn two_port(nfreq: usize) -> Network {
        let freq = Frequency::linear(1e9, 10e9, nfreq, FrequencyUnit::GHz).unwrap();
        let s = Array3::from_shape_fn((nfreq, 2, 2), |(f, i, j)| {
            Complex64::new(f as f64, (10 * i + j) as f64)
        });
        let z0 = Array1::from_elem(2, 50.0);
        Network::new(freq, s, z0).unwrap()
    }

    #[test]
    fn test_network_creation() {
        let ntwk = two_port(10);

        assert_eq!(ntwk.nports(), 2);
        assert_eq!(ntwk.nfreq(), 10);
        assert_eq!(ntwk.z0()[0], 50.0);
        assert_eq!(ntwk.param_type(), ParameterType::S);
        assert!(ntwk.source().is_none());
        assert_eq!(ntwk.name(), "network");
    }

    #[test]
    fn test_from_touchstone_content() {
        let ntwk =
            Network::from_touchstone_content(b"# MHz S DB R 75\n100 -6 90\n200 -12 45\n", 1)
                .unwrap();
        assert_eq!(ntwk.nfreq(), 2);
        assert_eq!(ntwk.z0()[0], 75.0);
        assert_eq!(ntwk.frequency().f()[1], 200e6);
        assert!((ntwk.element(0, 0, 0).norm() - 0.501).abs() < 1e-3);
    }

    #[test]
    fn test_shape_validation() {
        let freq = Frequency::linear(1e9, 2e9, 3, FrequencyUnit::GHz).unwrap();
        let s = Array3::<Complex64>::zeros((4, 2, 2));
        let z0 = Array1::from_elem(2, 50.0);
        assert!(matches!(
            Network::new(freq.clone(), s, z0.clone()),
            Err(NetworkError::ShapeMismatch { .. })
        ));

        let s = Array3::<Complex64>::zeros((3, 2, 2));
        assert!(matches!(
            Network::new(freq.clone(), s.clone(), Array1::from_elem(3, 50.0)),
            Err(NetworkError::ImpedanceCount { .. })
        ));
        assert!(matches!(
            Network::new(freq, s, Array1::from_vec(vec![50.0, 0.0])),
            Err(NetworkError::InvalidImpedance { port: 1, .. })
        ));
    }

    #[test]
    fn test_accessors_clamp() {
        let ntwk = two_port(5);
        assert_eq!(ntwk.frequency_at(100), ntwk.frequency_at(4));
        assert_eq!(ntwk.element(1, 0, 2), Complex64::new(2.0, 10.0));
        assert_eq!(ntwk.element(5, 5, 99), Complex64::new(4.0, 11.0));
        assert_eq!(ntwk.matrix_at(7)[[0, 1]], Complex64::new(4.0, 1.0));
    }

    #[test]
    fn test_nearest_and_range() {
        let ntwk = two_port(10);
        assert_eq!(ntwk.nearest_index(0.0), 0);
        assert_eq!(ntwk.nearest_index(1e12), 9);
        assert_eq!(ntwk.nearest_index(2.4e9), 1);
        assert_eq!(ntwk.index_range(2e9, 4e9), Some(1..4));
        assert_eq!(ntwk.index_range(20e9, 30e9), None);
        assert_eq!(ntwk.frequency_range(), (1e9, 10e9));
    }

    #[test]
    fn test_port_pairs() {
        let ntwk = two_port(2);
        let pairs: Vec<_> = ntwk.port_pairs().collect();
        assert_eq!(
            pairs,
            vec![
                PortPair::new(0, 0),
                PortPair::new(0, 1),
                PortPair::new(1, 0),
                PortPair::new(1, 1)
            ]
        );
        assert_eq!(PortPair::new(1, 0).to_string(), "21");
        assert_eq!(PortPair::new(10, 0).to_string(), "11,1");
    }

    #[test]
    fn test_network_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Network>();
    }
}
