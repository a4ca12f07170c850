//! Touchstone file I/O module
//!
//! Provides reading and writing of Touchstone (.snp) files.

pub mod parser;
pub mod writer;

use std::io::Write;
use std::path::Path;

pub use parser::{
    DataFormat, MatrixFormat, ParameterType, ParserOptions, TouchstoneError, TouchstoneVersion,
    TwoPortOrder,
};

use crate::network::Network;

/// Entry point for Touchstone reading and writing
///
/// Parsing produces an immutable [`Network`]; writing serialises one back
/// using its retained unit, parameter kind, format and version.
pub struct Touchstone;

impl Touchstone {
    /// Parse raw bytes with a declared port count
    pub fn from_bytes(bytes: &[u8], nports: usize) -> Result<Network, TouchstoneError> {
        parser::parse(bytes, nports)
    }

    /// Parse raw bytes with explicit parser options
    pub fn from_bytes_with(
        bytes: &[u8],
        nports: usize,
        options: &ParserOptions,
    ) -> Result<Network, TouchstoneError> {
        parser::parse_with(bytes, nports, options)
    }

    /// Parse a `.sNp` file, taking the port count from its extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Network, TouchstoneError> {
        parser::read_file(path)
    }

    /// Parse a `.sNp` file with explicit parser options
    pub fn from_file_with<P: AsRef<Path>>(
        path: P,
        options: &ParserOptions,
    ) -> Result<Network, TouchstoneError> {
        parser::read_file_with(path, options)
    }

    /// Serialise a network to any writer
    pub fn write_to<W: Write>(network: &Network, writer: &mut W) -> Result<(), TouchstoneError> {
        writer::write_network(network, writer)
    }

    /// Serialise a network to a string
    pub fn to_string(network: &Network) -> String {
        writer::network_to_string(network)
    }

    /// Write a network to a file
    pub fn write<P: AsRef<Path>>(network: &Network, path: P) -> Result<(), TouchstoneError> {
        writer::write_file(network, path)
    }
}
