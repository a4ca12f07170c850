//! Limit line persistence
//!
//! Limit lines are stored as flat JSON objects so a project file can save and
//! restore them without knowing the internal representation:
//!
//! ```json
//! {"id": "rl", "type": "horizontal", "value": -10.0, "fail": "above",
//!  "label": "Return loss", "color": "red", "style": "dash", "width": 2.0}
//! ```
//!
//! Restoring runs every construction check again.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::line::{
    BandSense, FailSide, LimitError, LimitKind, LimitLine, LimitStyle, LinePattern, StyleDefaults,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LimitRecord {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    points: Option<Vec<(f64, f64)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fail: Option<FailSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sense: Option<BandSense>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    style: Option<LinePattern>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    show_legend: Option<bool>,
    #[serde(default)]
    show_chart_label: Option<bool>,
}

fn missing(field: &str, kind: &str) -> LimitError {
    LimitError::InvalidRecord(format!("'{}' limit without '{}'", kind, field))
}

impl LimitRecord {
    fn from_line(line: &LimitLine) -> Self {
        let style = line.style();
        let mut record = LimitRecord {
            id: line.id().to_string(),
            kind: line.kind().type_name().to_string(),
            value: None,
            min_value: None,
            max_value: None,
            points: None,
            fail: None,
            sense: None,
            label: Some(style.label.clone()),
            color: Some(style.color.clone()),
            style: Some(style.pattern),
            width: Some(style.width),
            show_legend: Some(style.show_legend),
            show_chart_label: Some(style.show_chart_label),
        };
        match line.kind() {
            LimitKind::Horizontal { value, fail } => {
                record.value = Some(*value);
                record.fail = Some(*fail);
            }
            LimitKind::Vertical { frequency, fail } => {
                record.value = Some(*frequency);
                record.fail = Some(*fail);
            }
            LimitKind::PointBased { points, fail } => {
                record.points = Some(points.clone());
                record.fail = Some(*fail);
            }
            LimitKind::HorizontalRange {
                freq_min,
                freq_max,
                sense,
            } => {
                record.min_value = Some(*freq_min);
                record.max_value = Some(*freq_max);
                record.sense = Some(*sense);
            }
            LimitKind::VerticalRange {
                value_min,
                value_max,
                sense,
            } => {
                record.min_value = Some(*value_min);
                record.max_value = Some(*value_max);
                record.sense = Some(*sense);
            }
        }
        record
    }

    fn into_line(self, defaults: &StyleDefaults) -> Result<LimitLine, LimitError> {
        let kind_name = self.kind.as_str();
        let fail = || self.fail.ok_or_else(|| missing("fail", kind_name));
        let sense = || self.sense.ok_or_else(|| missing("sense", kind_name));
        let value = || self.value.ok_or_else(|| missing("value", kind_name));
        let bounds = || -> Result<(f64, f64), LimitError> {
            Ok((
                self.min_value.ok_or_else(|| missing("min_value", kind_name))?,
                self.max_value.ok_or_else(|| missing("max_value", kind_name))?,
            ))
        };

        let kind = match kind_name {
            "horizontal" => LimitKind::Horizontal {
                value: value()?,
                fail: fail()?,
            },
            "vertical" => LimitKind::Vertical {
                frequency: value()?,
                fail: fail()?,
            },
            "points" => LimitKind::PointBased {
                points: self
                    .points
                    .clone()
                    .ok_or_else(|| missing("points", kind_name))?,
                fail: fail()?,
            },
            "frequency_range" => {
                let (freq_min, freq_max) = bounds()?;
                LimitKind::HorizontalRange {
                    freq_min,
                    freq_max,
                    sense: sense()?,
                }
            }
            "value_range" => {
                let (value_min, value_max) = bounds()?;
                LimitKind::VerticalRange {
                    value_min,
                    value_max,
                    sense: sense()?,
                }
            }
            other => {
                return Err(LimitError::InvalidRecord(format!(
                    "unknown limit type '{}'",
                    other
                )))
            }
        };

        let style = LimitStyle {
            color: self.color.clone().unwrap_or_else(|| defaults.color.clone()),
            pattern: self.style.unwrap_or(defaults.pattern),
            width: self.width.unwrap_or(defaults.width),
            label: self.label.clone().unwrap_or_default(),
            show_legend: self.show_legend.unwrap_or(defaults.show_legend),
            show_chart_label: self.show_chart_label.unwrap_or(defaults.show_chart_label),
        };

        LimitLine::new(self.id.clone(), kind, style)
    }
}

impl LimitLine {
    /// Flat key-value record for persistence
    pub fn to_record(&self) -> Value {
        serde_json::to_value(LimitRecord::from_line(self)).unwrap_or(Value::Null)
    }

    /// Restore from a record, with the built-in style defaults for absent keys
    pub fn from_record(record: &Value) -> Result<Self, LimitError> {
        Self::from_record_with(record, &StyleDefaults::default())
    }

    /// Restore from a record, filling absent style keys from `defaults`
    pub fn from_record_with(record: &Value, defaults: &StyleDefaults) -> Result<Self, LimitError> {
        let record: LimitRecord = serde_json::from_value(record.clone())
            .map_err(|e| LimitError::InvalidRecord(e.to_string()))?;
        record.into_line(defaults)
    }
}

/// Serialise a chart's limit lines as an ordered JSON array
pub fn limits_to_json(limits: &[LimitLine]) -> Value {
    Value::Array(limits.iter().map(LimitLine::to_record).collect())
}

/// Restore an ordered JSON array of limit records
///
/// The first invalid record aborts the restore.
pub fn limits_from_json(value: &Value) -> Result<Vec<LimitLine>, LimitError> {
    let records = value
        .as_array()
        .ok_or_else(|| LimitError::InvalidRecord("expected an array of limits".to_string()))?;
    records.iter().map(LimitLine::from_record).collect()
}
