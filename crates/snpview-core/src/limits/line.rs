//! Limit line value types
//!
//! A [`LimitLine`] is an immutable value: every constructor validates its
//! geometry and the fields are only reachable through accessors, so a line
//! that exists is always well formed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::math::interp_points_hold;
use crate::numeric::{parse_numeric_input, parse_point_list, NumericError};

/// Limit construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LimitError {
    #[error(transparent)]
    InvalidNumber(#[from] NumericError),

    #[error("range minimum {min} must be below maximum {max}")]
    InvertedRange { min: f64, max: f64 },

    #[error("a point-based limit needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("duplicate frequency {0} Hz in point-based limit")]
    DuplicateFrequency(f64),

    #[error("limit coordinates must be finite")]
    NonFinite,

    #[error("invalid limit record: {0}")]
    InvalidRecord(String),
}

impl LimitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LimitError::InvalidNumber(_) => ErrorKind::InvalidNumber,
            _ => ErrorKind::InvalidLimit,
        }
    }
}

/// Which side of a threshold fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailSide {
    /// Values strictly greater than the threshold fail
    Above,
    /// Values strictly less than the threshold fail
    Below,
}

impl FailSide {
    #[inline]
    fn fails(self, value: f64, threshold: f64) -> bool {
        match self {
            FailSide::Above => value > threshold,
            FailSide::Below => value < threshold,
        }
    }
}

/// Meaning of the inside of a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandSense {
    /// Samples outside the band fail
    Acceptance,
    /// Samples inside the band fail
    Exclusion,
}

impl BandSense {
    #[inline]
    fn fails(self, x: f64, min: f64, max: f64) -> bool {
        let inside = x >= min && x <= max;
        match self {
            BandSense::Acceptance => !inside,
            BandSense::Exclusion => inside,
        }
    }
}

/// Stroke pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinePattern {
    Solid,
    #[default]
    #[serde(alias = "dashed")]
    Dash,
    #[serde(alias = "dotted")]
    Dot,
    #[serde(alias = "dash_dot")]
    DashDot,
}

/// Presentation attributes, carried but never interpreted here
#[derive(Debug, Clone, PartialEq)]
pub struct LimitStyle {
    pub color: String,
    pub pattern: LinePattern,
    pub width: f64,
    pub label: String,
    pub show_legend: bool,
    pub show_chart_label: bool,
}

/// Style applied to newly created limit lines
///
/// Passed explicitly to every constructor; there is no process-wide default.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefaults {
    pub color: String,
    pub pattern: LinePattern,
    pub width: f64,
    pub show_legend: bool,
    pub show_chart_label: bool,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            color: "red".to_string(),
            pattern: LinePattern::Dash,
            width: 2.0,
            show_legend: true,
            show_chart_label: false,
        }
    }
}

impl StyleDefaults {
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_pattern(mut self, pattern: LinePattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Concrete style for a new line
    pub fn style(&self, label: impl Into<String>) -> LimitStyle {
        LimitStyle {
            color: self.color.clone(),
            pattern: self.pattern,
            width: self.width,
            label: label.into(),
            show_legend: self.show_legend,
            show_chart_label: self.show_chart_label,
        }
    }
}

/// Limit geometry
#[derive(Debug, Clone, PartialEq)]
pub enum LimitKind {
    /// Constant value threshold across all frequencies
    Horizontal { value: f64, fail: FailSide },
    /// Constant frequency threshold
    Vertical { frequency: f64, fail: FailSide },
    /// Piecewise-linear threshold, sorted by frequency
    PointBased {
        points: Vec<(f64, f64)>,
        fail: FailSide,
    },
    /// Frequency band
    HorizontalRange {
        freq_min: f64,
        freq_max: f64,
        sense: BandSense,
    },
    /// Value band
    VerticalRange {
        value_min: f64,
        value_max: f64,
        sense: BandSense,
    },
}

fn check_finite(values: &[f64]) -> Result<(), LimitError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(LimitError::NonFinite)
    }
}

fn check_range(min: f64, max: f64) -> Result<(), LimitError> {
    check_finite(&[min, max])?;
    if min < max {
        Ok(())
    } else {
        Err(LimitError::InvertedRange { min, max })
    }
}

impl LimitKind {
    /// Validate and normalise the geometry
    ///
    /// Point lists are sorted by frequency; duplicates are rejected.
    pub fn validated(self) -> Result<Self, LimitError> {
        match self {
            LimitKind::Horizontal { value, .. } => check_finite(&[value])?,
            LimitKind::Vertical { frequency, .. } => check_finite(&[frequency])?,
            LimitKind::HorizontalRange {
                freq_min, freq_max, ..
            } => check_range(freq_min, freq_max)?,
            LimitKind::VerticalRange {
                value_min,
                value_max,
                ..
            } => check_range(value_min, value_max)?,
            LimitKind::PointBased { mut points, fail } => {
                if points.len() < 2 {
                    return Err(LimitError::TooFewPoints(points.len()));
                }
                if points.iter().any(|(f, v)| !f.is_finite() || !v.is_finite()) {
                    return Err(LimitError::NonFinite);
                }
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
                if let Some(w) = points.windows(2).find(|w| w[0].0 == w[1].0) {
                    return Err(LimitError::DuplicateFrequency(w[0].0));
                }
                return Ok(LimitKind::PointBased { points, fail });
            }
        }
        Ok(self)
    }

    /// Record `type` tag
    pub fn type_name(&self) -> &'static str {
        match self {
            LimitKind::Horizontal { .. } => "horizontal",
            LimitKind::Vertical { .. } => "vertical",
            LimitKind::PointBased { .. } => "points",
            LimitKind::HorizontalRange { .. } => "frequency_range",
            LimitKind::VerticalRange { .. } => "value_range",
        }
    }

    /// Threshold value at `frequency` for value-threshold kinds
    ///
    /// Point-based limits interpolate linearly and hold the end values
    /// outside their span.
    pub fn threshold_at(&self, frequency: f64) -> Option<f64> {
        match self {
            LimitKind::Horizontal { value, .. } => Some(*value),
            LimitKind::PointBased { points, .. } => interp_points_hold(points, frequency),
            _ => None,
        }
    }

    /// Whether a `(frequency, value)` sample fails this limit
    pub fn fails(&self, frequency: f64, value: f64) -> bool {
        match self {
            LimitKind::Horizontal { value: threshold, fail } => fail.fails(value, *threshold),
            LimitKind::Vertical {
                frequency: threshold,
                fail,
            } => fail.fails(frequency, *threshold),
            LimitKind::PointBased { fail, .. } => self
                .threshold_at(frequency)
                .is_some_and(|threshold| fail.fails(value, threshold)),
            LimitKind::HorizontalRange {
                freq_min,
                freq_max,
                sense,
            } => sense.fails(frequency, *freq_min, *freq_max),
            LimitKind::VerticalRange {
                value_min,
                value_max,
                sense,
            } => sense.fails(value, *value_min, *value_max),
        }
    }
}

/// A pass/fail limit on a chart
#[derive(Debug, Clone, PartialEq)]
pub struct LimitLine {
    id: String,
    kind: LimitKind,
    style: LimitStyle,
}

impl LimitLine {
    /// Build from any geometry, validating it
    pub fn new(
        id: impl Into<String>,
        kind: LimitKind,
        style: LimitStyle,
    ) -> Result<Self, LimitError> {
        Ok(Self {
            id: id.into(),
            kind: kind.validated()?,
            style,
        })
    }

    pub fn horizontal(
        id: impl Into<String>,
        value: f64,
        fail: FailSide,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        Self::new(id, LimitKind::Horizontal { value, fail }, defaults.style(""))
    }

    pub fn vertical(
        id: impl Into<String>,
        frequency: f64,
        fail: FailSide,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        Self::new(id, LimitKind::Vertical { frequency, fail }, defaults.style(""))
    }

    pub fn point_based(
        id: impl Into<String>,
        points: Vec<(f64, f64)>,
        fail: FailSide,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        Self::new(id, LimitKind::PointBased { points, fail }, defaults.style(""))
    }

    pub fn frequency_range(
        id: impl Into<String>,
        freq_min: f64,
        freq_max: f64,
        sense: BandSense,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        Self::new(
            id,
            LimitKind::HorizontalRange {
                freq_min,
                freq_max,
                sense,
            },
            defaults.style(""),
        )
    }

    pub fn value_range(
        id: impl Into<String>,
        value_min: f64,
        value_max: f64,
        sense: BandSense,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        Self::new(
            id,
            LimitKind::VerticalRange {
                value_min,
                value_max,
                sense,
            },
            defaults.style(""),
        )
    }

    /// Horizontal limit from user text such as `-10 dB`
    pub fn horizontal_from_input(
        id: impl Into<String>,
        text: &str,
        fail: FailSide,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        Self::horizontal(id, parse_numeric_input(text)?, fail, defaults)
    }

    /// Vertical limit from user text such as `2.4GHz`
    pub fn vertical_from_input(
        id: impl Into<String>,
        text: &str,
        fail: FailSide,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        Self::vertical(id, parse_numeric_input(text)?, fail, defaults)
    }

    /// Point-based limit from one `frequency, value` pair per line
    pub fn points_from_input(
        id: impl Into<String>,
        text: &str,
        fail: FailSide,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        Self::point_based(id, parse_point_list(text)?, fail, defaults)
    }

    /// Frequency band from two user-entered bounds
    pub fn frequency_range_from_input(
        id: impl Into<String>,
        min_text: &str,
        max_text: &str,
        sense: BandSense,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        let min = parse_numeric_input(min_text)?;
        let max = parse_numeric_input(max_text)?;
        Self::frequency_range(id, min, max, sense, defaults)
    }

    /// Value band from two user-entered bounds
    pub fn value_range_from_input(
        id: impl Into<String>,
        min_text: &str,
        max_text: &str,
        sense: BandSense,
        defaults: &StyleDefaults,
    ) -> Result<Self, LimitError> {
        let min = parse_numeric_input(min_text)?;
        let max = parse_numeric_input(max_text)?;
        Self::value_range(id, min, max, sense, defaults)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.style.label = label.into();
        self
    }

    pub fn with_style(mut self, style: LimitStyle) -> Self {
        self.style = style;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &LimitKind {
        &self.kind
    }

    pub fn style(&self) -> &LimitStyle {
        &self.style
    }

    /// Whether a `(frequency, value)` sample fails this limit
    #[inline]
    pub fn fails(&self, frequency: f64, value: f64) -> bool {
        self.kind.fails(frequency, value)
    }
}
