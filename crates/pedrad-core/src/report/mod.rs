use crate::aggregate::AggregateStatistics;
use crate::model::{EvaluationResult, Exclusion};
use crate::storage::batch::BatchHeader;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod console;
pub mod csv;
pub mod json;
pub mod markdown;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Everything `pedrad evaluate` knows about one batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub label: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchHeader>,
    pub summary: AggregateStatistics,
    pub results: Vec<EvaluationResult>,
    pub excluded: Vec<Exclusion>,
}

/// Ground-truth-free statistics for one batch file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchAnalysis {
    pub label: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchHeader>,
    pub statistics: AggregateStatistics,
}

pub(crate) fn fmt_pct(v: Option<f64>) -> String {
    v.map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "n/a".into())
}

pub(crate) fn fmt_num(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "n/a".into())
}
