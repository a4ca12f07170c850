//! Pass/fail evaluation of limit lines against a derived series

use std::collections::HashMap;

use super::line::LimitLine;
use crate::network::Sample;

/// A sample that fails a limit
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Hz
    pub frequency: f64,
    pub value: f64,
    pub limit_id: String,
}

/// Every violation of `limits` by `series`
///
/// Violations are ordered by frequency; violations at the same frequency keep
/// the order of `limits`. Neither input is modified.
pub fn evaluate(series: &[Sample], limits: &[LimitLine]) -> Vec<Violation> {
    let mut violations: Vec<Violation> = series
        .iter()
        .flat_map(|sample| {
            limits
                .iter()
                .filter(|limit| limit.fails(sample.frequency, sample.value))
                .map(|limit| Violation {
                    frequency: sample.frequency,
                    value: sample.value,
                    limit_id: limit.id().to_string(),
                })
        })
        .collect();

    // Stable, so ties keep limit order
    violations.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    violations
}

/// Evaluation summary
#[derive(Debug, Clone, PartialEq)]
pub struct LimitReport {
    violations: Vec<Violation>,
    /// Violation count per limit, in limit order
    counts: Vec<(String, usize)>,
    samples: usize,
}

impl LimitReport {
    /// True when no sample fails any limit
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn counts(&self) -> &[(String, usize)] {
        &self.counts
    }

    /// Violations of the limit named `id`
    pub fn count_for(&self, id: &str) -> usize {
        self.counts
            .iter()
            .find(|(limit_id, _)| limit_id == id)
            .map_or(0, |(_, n)| *n)
    }

    /// Number of samples evaluated
    pub fn samples(&self) -> usize {
        self.samples
    }
}

/// Evaluate and summarise per limit
pub fn check(series: &[Sample], limits: &[LimitLine]) -> LimitReport {
    let violations = evaluate(series, limits);

    let mut by_id: HashMap<&str, usize> = HashMap::new();
    for v in &violations {
        *by_id.entry(v.limit_id.as_str()).or_default() += 1;
    }
    let counts = limits
        .iter()
        .map(|l| (l.id().to_string(), by_id.get(l.id()).copied().unwrap_or(0)))
        .collect();

    LimitReport {
        violations,
        counts,
        samples: series.len(),
    }
}
