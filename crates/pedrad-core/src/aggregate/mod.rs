//! Batch-level descriptive statistics over outputs and per-case evaluations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod stats;

pub use stats::Aggregator;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputCounts {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Latency statistics in seconds. `throughput_per_min` is
/// `count / (total / 60)`, from summed latencies rather than wall-clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub total: f64,
    pub throughput_per_min: Option<f64>,
}

/// Completion length in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LengthSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: usize,
    pub max: usize,
}

/// `mean` is `None` when no case defines the metric.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreSummary {
    pub n: usize,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregateStatistics {
    pub outputs: OutputCounts,
    pub timing: Option<TimingSummary>,
    pub output_length: Option<LengthSummary>,
    /// Number of evaluation results the score summaries are computed over.
    pub evaluated: usize,
    pub completeness: ScoreSummary,
    pub coverage: ScoreSummary,
    /// `mean` is the fraction of evaluated cases free of disallowed terms.
    pub appropriateness: ScoreSummary,
    pub inappropriate_cases: usize,
    /// Section -> percentage of evaluated cases containing it.
    pub section_presence: BTreeMap<String, f64>,
    /// Disallowed term -> number of evaluated cases mentioning it.
    pub inappropriate_terms: BTreeMap<String, usize>,
    /// Catalog diagnosis -> number of outputs mentioning it.
    pub diagnosis_frequency: BTreeMap<String, usize>,
}
