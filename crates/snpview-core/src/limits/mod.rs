//! Pass/fail limit lines
//!
//! Five limit geometries ([`LimitKind`]) with chart styling, evaluation of a
//! derived series against a set of limits, and flat JSON records for saving
//! and restoring them.

mod evaluate;
mod line;
mod record;

pub use evaluate::{check, evaluate, LimitReport, Violation};
pub use line::{
    BandSense, FailSide, LimitError, LimitKind, LimitLine, LimitStyle, LinePattern, StyleDefaults,
};
pub use record::{limits_from_json, limits_to_json};
