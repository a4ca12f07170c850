//! Touchstone file parser
//!
//! Implements parsing of Touchstone v1 and v2 format files into an immutable
//! [`Network`]. Any structural problem aborts the parse with an error naming
//! the 1-based source line; no partial dataset is ever returned.

use ndarray::{Array1, Array3};
use num_complex::Complex64;
use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;

use crate::constants::{DEFAULT_Z0, MAX_PORTS, MIN_PORTS};
use crate::error::ErrorKind;
use crate::frequency::{Frequency, FrequencyAxisError, FrequencyUnit};
use crate::math::{dbdeg_2_reim, magdeg_2_reim};
use crate::network::{Network, NetworkError};

/// Touchstone parsing errors
#[derive(Error, Debug)]
pub enum TouchstoneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file extension: expected .sNp with N in 1..=99")]
    InvalidExtension,

    #[error("Invalid port count {0}: expected 1..=99")]
    InvalidPortCount(usize),

    #[error("Malformed header at line {line}: {message}")]
    MalformedHeader { line: usize, message: String },

    #[error("Port count mismatch at line {line}: file declares {found} ports, expected {declared}")]
    PortCountMismatch {
        line: usize,
        declared: usize,
        found: usize,
    },

    #[error("Frequency not increasing at line {line}: {current} Hz follows {previous} Hz")]
    NonMonotonicFrequency {
        line: usize,
        previous: f64,
        current: f64,
    },

    #[error("Malformed data row at line {line}: {message}")]
    MalformedRow { line: usize, message: String },

    #[error("[Number of Frequencies] declares {declared} points but {found} were read")]
    FrequencyCountMismatch { declared: usize, found: usize },

    #[error("No frequency points in file")]
    EmptyDataset,

    #[error("Invalid network data: {0}")]
    Network(#[from] NetworkError),
}

impl TouchstoneError {
    /// Classification for diagnostics
    pub fn kind(&self) -> ErrorKind {
        match self {
            TouchstoneError::Io(_) => ErrorKind::Io,
            TouchstoneError::InvalidExtension | TouchstoneError::InvalidPortCount(_) => {
                ErrorKind::Other
            }
            TouchstoneError::MalformedHeader { .. }
            | TouchstoneError::FrequencyCountMismatch { .. } => ErrorKind::MalformedHeader,
            TouchstoneError::PortCountMismatch { .. } => ErrorKind::PortCountMismatch,
            TouchstoneError::NonMonotonicFrequency { .. } => ErrorKind::NonMonotonicFrequency,
            TouchstoneError::MalformedRow { .. } => ErrorKind::MalformedRow,
            TouchstoneError::EmptyDataset => ErrorKind::EmptyDataset,
            TouchstoneError::Network(_) => ErrorKind::Other,
        }
    }

    /// 1-based source line where the problem was detected, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            TouchstoneError::MalformedHeader { line, .. }
            | TouchstoneError::PortCountMismatch { line, .. }
            | TouchstoneError::NonMonotonicFrequency { line, .. }
            | TouchstoneError::MalformedRow { line, .. } => Some(*line),
            _ => None,
        }
    }

    fn header(line: usize, message: impl Into<String>) -> Self {
        TouchstoneError::MalformedHeader {
            line,
            message: message.into(),
        }
    }

    fn row(line: usize, message: impl Into<String>) -> Self {
        TouchstoneError::MalformedRow {
            line,
            message: message.into(),
        }
    }
}

/// Encoding of matrix entries on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
    /// Magnitude-Angle (degrees)
    #[default]
    MA,
    /// dB-Angle (degrees)
    DB,
    /// Real-Imaginary
    RI,
}

impl DataFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RI" => Some(DataFormat::RI),
            "MA" => Some(DataFormat::MA),
            "DB" => Some(DataFormat::DB),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            DataFormat::RI => "RI",
            DataFormat::MA => "MA",
            DataFormat::DB => "DB",
        }
    }

    /// Decode one on-disk pair into a complex value
    #[inline]
    pub fn to_complex(&self, v1: f64, v2: f64) -> Complex64 {
        match self {
            DataFormat::RI => Complex64::new(v1, v2),
            DataFormat::MA => magdeg_2_reim(v1, v2),
            DataFormat::DB => dbdeg_2_reim(v1, v2),
        }
    }
}

/// Network parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterType {
    #[default]
    S,
    Y,
    Z,
    H,
    G,
}

impl ParameterType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "S" => Some(ParameterType::S),
            "Y" => Some(ParameterType::Y),
            "Z" => Some(ParameterType::Z),
            "H" => Some(ParameterType::H),
            "G" => Some(ParameterType::G),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            ParameterType::S => "S",
            ParameterType::Y => "Y",
            ParameterType::Z => "Z",
            ParameterType::H => "H",
            ParameterType::G => "G",
        }
    }
}

/// Touchstone format generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchstoneVersion {
    #[default]
    V1,
    V2,
}

/// Order of the four entries of a 2-port record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TwoPortOrder {
    /// v1 files use `21_12`; v2 files follow `[Two-Port Data Order]`,
    /// falling back to `21_12` when the keyword is absent
    #[default]
    Auto,
    /// S11 S21 S12 S22 (column-major, the historical convention)
    Order21_12,
    /// S11 S12 S21 S22 (row-major)
    Order12_21,
}

/// How much of the matrix a v2 record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixFormat {
    #[default]
    Full,
    Lower,
    Upper,
}

impl MatrixFormat {
    fn values_per_matrix(&self, nports: usize) -> usize {
        match self {
            MatrixFormat::Full => nports * nports,
            MatrixFormat::Lower | MatrixFormat::Upper => nports * (nports + 1) / 2,
        }
    }

    /// Complex entries stored for matrix row `row`
    fn row_pairs(&self, nports: usize, row: usize) -> usize {
        match self {
            MatrixFormat::Full => nports,
            MatrixFormat::Lower => row + 1,
            MatrixFormat::Upper => nports - row,
        }
    }
}

/// Parser configuration
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Entry order for 2-port records
    pub two_port_order: TwoPortOrder,
    /// Keep `!` comment lines on the resulting network
    pub keep_comments: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            two_port_order: TwoPortOrder::Auto,
            keep_comments: true,
        }
    }
}

impl ParserOptions {
    /// Force a 2-port entry order regardless of file metadata.
    pub fn with_two_port_order(mut self, order: TwoPortOrder) -> Self {
        self.two_port_order = order;
        self
    }

    /// Drop comment lines instead of keeping them.
    pub fn without_comments(mut self) -> Self {
        self.keep_comments = false;
        self
    }
}

/// Parse the port count from a `.sNp` (or `.sN`) extension
pub fn port_count_from_extension(ext: &str) -> Result<usize, TouchstoneError> {
    let ext_lower = ext.to_lowercase();
    let digits = ext_lower
        .strip_prefix('s')
        .map(|rest| rest.strip_suffix('p').unwrap_or(rest))
        .ok_or(TouchstoneError::InvalidExtension)?;
    let nports: usize = digits
        .parse()
        .map_err(|_| TouchstoneError::InvalidExtension)?;
    if (MIN_PORTS..=MAX_PORTS).contains(&nports) {
        Ok(nports)
    } else {
        Err(TouchstoneError::InvalidExtension)
    }
}

/// Port count implied by a file name
pub fn port_count_from_path<P: AsRef<Path>>(path: P) -> Result<usize, TouchstoneError> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .ok_or(TouchstoneError::InvalidExtension)?;
    port_count_from_extension(ext)
}

/// Parse a Touchstone file, taking the port count from its extension
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Network, TouchstoneError> {
    read_file_with(path, &ParserOptions::default())
}

/// Parse a Touchstone file with explicit options
pub fn read_file_with<P: AsRef<Path>>(
    path: P,
    options: &ParserOptions,
) -> Result<Network, TouchstoneError> {
    let path = path.as_ref();
    let nports = port_count_from_path(path)?;
    let bytes = std::fs::read(path)?;
    let network = parse_with(&bytes, nports, options)?;
    Ok(network.with_source(path.to_path_buf()))
}

/// Parse raw file content
///
/// # Arguments
/// * `bytes` - Touchstone file content
/// * `nports` - Port count implied by the file name (e.g. `.s2p` = 2), or
///   an explicit override for embedded content. For v2 content `0` means
///   "take it from `[Number of Ports]`".
///
/// # Example
/// ```
/// use snpview_core::touchstone::parser;
/// let content = b"# GHz S RI R 50\n1.0 0.1 0.0 0.9 0.0 0.9 0.0 0.1 0.0\n";
/// let ntwk = parser::parse(content, 2).unwrap();
/// assert_eq!(ntwk.nports(), 2);
/// ```
pub fn parse(bytes: &[u8], nports: usize) -> Result<Network, TouchstoneError> {
    parse_with(bytes, nports, &ParserOptions::default())
}

/// Parse raw file content with explicit options
pub fn parse_with(
    bytes: &[u8],
    nports: usize,
    options: &ParserOptions,
) -> Result<Network, TouchstoneError> {
    let text = decode(bytes);
    let lines: Vec<&str> = text.lines().collect();

    let version = if lines.iter().any(|l| l.trim_start().starts_with('[')) {
        TouchstoneVersion::V2
    } else {
        TouchstoneVersion::V1
    };

    if version == TouchstoneVersion::V1 && !(MIN_PORTS..=MAX_PORTS).contains(&nports) {
        return Err(TouchstoneError::InvalidPortCount(nports));
    }
    if nports > MAX_PORTS {
        return Err(TouchstoneError::InvalidPortCount(nports));
    }

    tracing::debug!("Parsing {:?} Touchstone content, declared ports {}", version, nports);

    let mut state = ParserState::new(version, nports, options);
    for (idx, raw) in lines.iter().enumerate() {
        state.parse_line(raw, idx + 1)?;
    }
    state.finalize(lines.len())
}

/// UTF-8 with a Latin-1 fallback for legacy instrument files
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Values from the `#` option line
#[derive(Debug, Clone, Copy)]
struct OptionLine {
    unit: FrequencyUnit,
    param_type: ParameterType,
    format: DataFormat,
    z0: f64,
}

impl OptionLine {
    fn parse(content: &str, line: usize) -> Result<Self, TouchstoneError> {
        let mut option = OptionLine {
            unit: FrequencyUnit::GHz,
            param_type: ParameterType::S,
            format: DataFormat::MA,
            z0: DEFAULT_Z0,
        };

        let mut tokens = content.trim_start_matches('#').split_whitespace();
        while let Some(token) = tokens.next() {
            if let Some(unit) = FrequencyUnit::from_str(token) {
                option.unit = unit;
            } else if token.eq_ignore_ascii_case("R") {
                let value = tokens.next().ok_or_else(|| {
                    TouchstoneError::header(line, "'R' without a reference resistance")
                })?;
                option.z0 = match value.parse::<f64>() {
                    Ok(r) if r.is_finite() && r > 0.0 => r,
                    _ => {
                        return Err(TouchstoneError::header(
                            line,
                            format!("invalid reference resistance '{}'", value),
                        ))
                    }
                };
            } else if let Some(format) = DataFormat::from_str(token) {
                option.format = format;
            } else if let Some(param_type) = ParameterType::from_str(token) {
                option.param_type = param_type;
            } else {
                return Err(TouchstoneError::header(
                    line,
                    format!("unknown option token '{}'", token),
                ));
            }
        }

        Ok(option)
    }
}

/// Internal parser state
struct ParserState<'o> {
    options: &'o ParserOptions,
    version: TouchstoneVersion,
    declared_ports: usize,
    nports: usize,
    option: Option<OptionLine>,
    comments: Vec<String>,
    saw_content: bool,

    // V2 keywords
    ports_keyword_line: Option<usize>,
    two_port_keyword: Option<TwoPortOrder>,
    matrix_format: MatrixFormat,
    reference: Vec<f64>,
    reference_line: usize,
    expecting_reference: bool,
    declared_nfreq: Option<usize>,
    in_information: bool,
    in_network_data: bool,
    network_data_done: bool,

    // Data accumulation
    frequencies: Vec<f64>,
    values: Vec<Complex64>,
    record: Vec<f64>,
    record_line: usize,
    last_data_line: usize,
    // Record lines follow matrix rows
    row_structured: bool,
}

impl<'o> ParserState<'o> {
    fn new(version: TouchstoneVersion, declared_ports: usize, options: &'o ParserOptions) -> Self {
        Self {
            options,
            version,
            declared_ports,
            nports: declared_ports,
            option: None,
            comments: Vec::new(),
            saw_content: false,
            ports_keyword_line: None,
            two_port_keyword: None,
            matrix_format: MatrixFormat::Full,
            reference: Vec::new(),
            reference_line: 0,
            expecting_reference: false,
            declared_nfreq: None,
            in_information: false,
            in_network_data: false,
            network_data_done: false,
            frequencies: Vec::new(),
            values: Vec::new(),
            record: Vec::new(),
            record_line: 0,
            last_data_line: 0,
            row_structured: false,
        }
    }

    fn is_v2(&self) -> bool {
        self.version == TouchstoneVersion::V2
    }

    fn parse_line(&mut self, raw: &str, line: usize) -> Result<(), TouchstoneError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        if let Some(comment) = trimmed.strip_prefix('!') {
            if self.options.keep_comments {
                self.comments.push(comment.trim().to_string());
            }
            return Ok(());
        }

        // Trailing comment
        let content = match trimmed.find('!') {
            Some(idx) => trimmed[..idx].trim_end(),
            None => trimmed,
        };
        self.saw_content = true;

        if content.starts_with('[') {
            return self.parse_keyword(content, line);
        }

        if self.in_information || self.network_data_done {
            return Ok(());
        }

        if content.starts_with('#') {
            return self.parse_option_line(content, line);
        }

        if self.expecting_reference {
            // A line too long to finish the list is data
            let remaining = self.nports.saturating_sub(self.reference.len());
            if content.split_whitespace().count() <= remaining {
                return self.parse_reference_values(content, line);
            }
            self.close_reference(line)?;
        }

        self.parse_data_line(content, line)
    }

    fn parse_option_line(&mut self, content: &str, line: usize) -> Result<(), TouchstoneError> {
        self.close_reference(line)?;
        if self.option.is_some() {
            tracing::warn!("Ignoring repeated option line at line {}", line);
            return Ok(());
        }
        if self.in_network_data {
            return Err(TouchstoneError::header(
                line,
                "option line inside [Network Data]",
            ));
        }
        self.option = Some(OptionLine::parse(content, line)?);
        Ok(())
    }

    fn parse_keyword(&mut self, content: &str, line: usize) -> Result<(), TouchstoneError> {
        let close = content
            .find(']')
            .ok_or_else(|| TouchstoneError::header(line, "unterminated keyword"))?;
        let keyword = content[1..close]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let value = content[close + 1..].trim();

        if self.in_information {
            if keyword == "end information" {
                self.in_information = false;
            }
            return Ok(());
        }
        if self.network_data_done {
            return Ok(());
        }
        self.close_reference(line)?;

        match keyword.as_str() {
            "version" => {
                if value.is_empty() {
                    return Err(TouchstoneError::header(line, "[Version] without a value"));
                }
                tracing::debug!("Touchstone version {}", value);
            }
            "number of ports" => {
                let found: usize = value.parse().map_err(|_| {
                    TouchstoneError::header(line, format!("invalid [Number of Ports] '{}'", value))
                })?;
                if !(MIN_PORTS..=MAX_PORTS).contains(&found) {
                    return Err(TouchstoneError::header(
                        line,
                        format!("[Number of Ports] {} outside 1..=99", found),
                    ));
                }
                if self.declared_ports != 0 && found != self.declared_ports {
                    return Err(TouchstoneError::PortCountMismatch {
                        line,
                        declared: self.declared_ports,
                        found,
                    });
                }
                self.nports = found;
                self.ports_keyword_line = Some(line);
            }
            "two-port data order" => {
                self.two_port_keyword = Some(match value {
                    "12_21" => TwoPortOrder::Order12_21,
                    "21_12" => TwoPortOrder::Order21_12,
                    other => {
                        return Err(TouchstoneError::header(
                            line,
                            format!("invalid [Two-Port Data Order] '{}'", other),
                        ))
                    }
                });
            }
            "number of frequencies" => {
                let n: usize = value.parse().map_err(|_| {
                    TouchstoneError::header(
                        line,
                        format!("invalid [Number of Frequencies] '{}'", value),
                    )
                })?;
                self.declared_nfreq = Some(n);
            }
            "reference" => {
                if self.ports_keyword_line.is_none() {
                    return Err(TouchstoneError::header(
                        line,
                        "[Reference] before [Number of Ports]",
                    ));
                }
                self.reference.clear();
                self.reference_line = line;
                self.expecting_reference = true;
                self.parse_reference_values(value, line)?;
            }
            "matrix format" => {
                self.matrix_format = match value.to_lowercase().as_str() {
                    "full" => MatrixFormat::Full,
                    "lower" => MatrixFormat::Lower,
                    "upper" => MatrixFormat::Upper,
                    other => {
                        return Err(TouchstoneError::header(
                            line,
                            format!("invalid [Matrix Format] '{}'", other),
                        ))
                    }
                };
            }
            "begin information" => self.in_information = true,
            "network data" => {
                if self.ports_keyword_line.is_none() {
                    return Err(TouchstoneError::header(line, "missing [Number of Ports]"));
                }
                if self.option.is_none() {
                    return Err(TouchstoneError::header(
                        line,
                        "missing option line before [Network Data]",
                    ));
                }
                self.in_network_data = true;
            }
            "noise data" | "end" => {
                self.flush_partial_record()?;
                self.in_network_data = false;
                self.network_data_done = true;
            }
            other => {
                tracing::debug!("Ignoring keyword [{}] at line {}", other, line);
            }
        }
        Ok(())
    }

    /// End a `[Reference]` list at the next keyword or option line
    ///
    /// A single value applies to every port; any other short list is an error.
    fn close_reference(&mut self, line: usize) -> Result<(), TouchstoneError> {
        if !self.expecting_reference {
            return Ok(());
        }
        if self.reference.len() == 1 {
            self.reference = vec![self.reference[0]; self.nports];
            self.expecting_reference = false;
            return Ok(());
        }
        Err(TouchstoneError::header(
            line,
            format!(
                "[Reference] lists {} of {} impedances",
                self.reference.len(),
                self.nports
            ),
        ))
    }

    fn parse_reference_values(&mut self, content: &str, line: usize) -> Result<(), TouchstoneError> {
        for token in content.split_whitespace() {
            match token.parse::<f64>() {
                Ok(r) if r.is_finite() && r > 0.0 => self.reference.push(r),
                _ => {
                    return Err(TouchstoneError::header(
                        line,
                        format!("invalid reference impedance '{}'", token),
                    ))
                }
            }
        }
        if self.reference.len() > self.nports {
            return Err(TouchstoneError::header(
                line,
                format!(
                    "[Reference] lists {} impedances for {} ports",
                    self.reference.len(),
                    self.nports
                ),
            ));
        }
        if self.reference.len() == self.nports {
            self.expecting_reference = false;
        }
        Ok(())
    }

    fn values_per_record(&self) -> usize {
        1 + 2 * self.matrix_format.values_per_matrix(self.nports)
    }

    /// Cumulative value count at the end of each matrix row, frequency included
    fn row_ends(&self) -> Vec<usize> {
        let mut end = 1;
        (0..self.nports)
            .map(|row| {
                end += 2 * self.matrix_format.row_pairs(self.nports, row);
                end
            })
            .collect()
    }

    /// Rejects a line that runs across a matrix row boundary.
    ///
    /// When the line itself began mid-row, the previous line left that row short.
    fn check_row_boundary(&self, start: usize, end: usize, line: usize) -> Result<(), TouchstoneError> {
        let row_ends = self.row_ends();
        let Some(row) = row_ends.iter().position(|&b| b > start) else {
            return Ok(());
        };
        if end <= row_ends[row] {
            return Ok(());
        }
        let row_start = if row == 0 { 0 } else { row_ends[row - 1] };
        if start == row_start {
            return Err(TouchstoneError::row(
                line,
                format!("line runs past the end of matrix row {}", row + 1),
            ));
        }
        Err(TouchstoneError::row(
            self.last_data_line,
            format!(
                "matrix row {} holds {} of {} values",
                row + 1,
                start - row_start,
                row_ends[row] - row_start
            ),
        ))
    }

    fn parse_data_line(&mut self, content: &str, line: usize) -> Result<(), TouchstoneError> {
        if self.is_v2() && self.ports_keyword_line.is_none() {
            return Err(TouchstoneError::header(
                line,
                "data before [Number of Ports]",
            ));
        }
        if self.option.is_none() {
            return Err(TouchstoneError::header(line, "data before option line"));
        }

        if self.record.is_empty() {
            self.record_line = line;
        }
        let start = self.record.len();
        for token in content.split_whitespace() {
            match token.parse::<f64>() {
                Ok(v) if v.is_finite() => self.record.push(v),
                _ => {
                    return Err(TouchstoneError::row(
                        line,
                        format!("invalid numeric token '{}'", token),
                    ))
                }
            }
        }

        let expected = self.values_per_record();
        let found = self.record.len();

        // 1- and 2-port records always sit on a single line
        if self.nports <= 2 && found != expected {
            return Err(TouchstoneError::row(
                line,
                format!(
                    "expected {} values for a {}-port record, found {}",
                    expected, self.nports, found
                ),
            ));
        }
        if self.nports > 2 {
            if start == 0 {
                self.row_structured = found <= self.row_ends()[0];
            }
            if self.row_structured {
                self.check_row_boundary(start, found, line)?;
            }
        }
        if found > expected {
            return Err(TouchstoneError::row(
                line,
                format!(
                    "record does not end at a line boundary: expected {} values, found {}",
                    expected, found
                ),
            ));
        }
        self.last_data_line = line;
        if found == expected {
            self.finish_record()?;
        }
        Ok(())
    }

    fn flush_partial_record(&self) -> Result<(), TouchstoneError> {
        if self.record.is_empty() {
            return Ok(());
        }
        Err(TouchstoneError::row(
            self.record_line,
            format!(
                "incomplete record: expected {} values, found {}",
                self.values_per_record(),
                self.record.len()
            ),
        ))
    }

    fn two_port_order(&self) -> TwoPortOrder {
        match self.options.two_port_order {
            TwoPortOrder::Auto => match self.version {
                TouchstoneVersion::V1 => TwoPortOrder::Order21_12,
                TouchstoneVersion::V2 => self.two_port_keyword.unwrap_or(TwoPortOrder::Order21_12),
            },
            forced => forced,
        }
    }

    fn finish_record(&mut self) -> Result<(), TouchstoneError> {
        let line = self.record_line;
        let option = self
            .option
            .ok_or_else(|| TouchstoneError::header(line, "data before option line"))?;

        let freq = self.record[0] * option.unit.multiplier();
        if freq < 0.0 {
            return Err(TouchstoneError::row(
                line,
                format!("negative frequency {}", self.record[0]),
            ));
        }
        if !freq.is_finite() {
            return Err(TouchstoneError::row(
                line,
                format!("frequency {} {} overflows", self.record[0], option.unit),
            ));
        }
        if let Some(&previous) = self.frequencies.last() {
            if freq <= previous {
                return Err(TouchstoneError::NonMonotonicFrequency {
                    line,
                    previous,
                    current: freq,
                });
            }
        }

        let n = self.nports;
        let pairs: Vec<Complex64> = self.record[1..]
            .chunks_exact(2)
            .map(|p| option.format.to_complex(p[0], p[1]))
            .collect();

        let mut matrix = vec![Complex64::new(0.0, 0.0); n * n];
        match self.matrix_format {
            MatrixFormat::Full => {
                let column_major = n == 2 && self.two_port_order() == TwoPortOrder::Order21_12;
                for (k, &c) in pairs.iter().enumerate() {
                    let (i, j) = if column_major { (k % n, k / n) } else { (k / n, k % n) };
                    matrix[i * n + j] = c;
                }
            }
            MatrixFormat::Lower => {
                let mut it = pairs.iter();
                for i in 0..n {
                    for j in 0..=i {
                        let c = *it.next().unwrap_or(&Complex64::new(0.0, 0.0));
                        matrix[i * n + j] = c;
                        matrix[j * n + i] = c;
                    }
                }
            }
            MatrixFormat::Upper => {
                let mut it = pairs.iter();
                for i in 0..n {
                    for j in i..n {
                        let c = *it.next().unwrap_or(&Complex64::new(0.0, 0.0));
                        matrix[i * n + j] = c;
                        matrix[j * n + i] = c;
                    }
                }
            }
        }

        self.frequencies.push(freq);
        self.values.extend(matrix);
        self.record.clear();
        Ok(())
    }

    fn finalize(mut self, total_lines: usize) -> Result<Network, TouchstoneError> {
        self.flush_partial_record()?;

        let last_line = total_lines.max(1);
        if !self.saw_content {
            return Err(TouchstoneError::EmptyDataset);
        }
        if self.is_v2() && self.ports_keyword_line.is_none() {
            return Err(TouchstoneError::header(last_line, "missing [Number of Ports]"));
        }
        if self.expecting_reference {
            let reference_line = self.reference_line;
            self.close_reference(reference_line)?;
        }
        let option = self
            .option
            .ok_or_else(|| TouchstoneError::header(last_line, "missing option line"))?;

        let nfreq = self.frequencies.len();
        if nfreq == 0 {
            return Err(TouchstoneError::EmptyDataset);
        }
        if let Some(declared) = self.declared_nfreq {
            if declared != nfreq {
                return Err(TouchstoneError::FrequencyCountMismatch {
                    declared,
                    found: nfreq,
                });
            }
        }

        let n = self.nports;
        let z0 = if self.reference.is_empty() {
            Array1::from_elem(n, option.z0)
        } else {
            Array1::from_vec(self.reference)
        };

        let data = Array3::from_shape_vec((nfreq, n, n), self.values)
            .map_err(|e| NetworkError::Shape(e.to_string()))?;
        let frequency = Frequency::from_hz(self.frequencies, option.unit).map_err(|e| match e {
            FrequencyAxisError::Empty => TouchstoneError::EmptyDataset,
            other => TouchstoneError::Network(NetworkError::Frequency(other)),
        })?;

        tracing::debug!(
            "Parsed {}-port {:?} file: {} points, {} {} {}",
            n,
            self.version,
            nfreq,
            option.unit,
            option.param_type.token(),
            option.format.token()
        );

        Ok(Network::new(frequency, data, z0)?
            .with_param_type(option.param_type)
            .with_format(option.format)
            .with_version(self.version)
            .with_comments(self.comments))
    }
}
