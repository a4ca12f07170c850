//! Error classification shared by every component
//!
//! Each component has its own `thiserror` enum. [`ErrorKind`] is the flat
//! discriminant a presentation layer switches on to pick a diagnostic.

use std::fmt;

/// Discriminant for every error the library reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// File could not be read
    Io,
    /// Missing, unknown or contradictory header / option line / keyword
    MalformedHeader,
    /// Declared and found port counts disagree
    PortCountMismatch,
    /// Frequency did not increase from one record to the next
    NonMonotonicFrequency,
    /// A data record has the wrong number of values or a bad token
    MalformedRow,
    /// No frequency point in the file
    EmptyDataset,
    /// Engineering-notation input could not be parsed
    InvalidNumber,
    /// Too few frequency points for the requested quantity
    InsufficientSamples,
    /// Derived quantity requested on a non-S parameter set
    UnsupportedParameterKind,
    /// A limit line violates its construction invariants
    InvalidLimit,
    /// Anything else (bad port index, bad file name, ...)
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Io => "Io",
            ErrorKind::MalformedHeader => "MalformedHeader",
            ErrorKind::PortCountMismatch => "PortCountMismatch",
            ErrorKind::NonMonotonicFrequency => "NonMonotonicFrequency",
            ErrorKind::MalformedRow => "MalformedRow",
            ErrorKind::EmptyDataset => "EmptyDataset",
            ErrorKind::InvalidNumber => "InvalidNumber",
            ErrorKind::InsufficientSamples => "InsufficientSamples",
            ErrorKind::UnsupportedParameterKind => "UnsupportedParameterKind",
            ErrorKind::InvalidLimit => "InvalidLimit",
            ErrorKind::Other => "Other",
        };
        f.write_str(name)
    }
}
