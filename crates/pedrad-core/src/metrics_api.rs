use crate::model::GroundTruthRecord;

/// Outcome of one metric on one case. `score` is `None` when the metric is
/// undefined for the case (for example no expected differentials).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    pub score: Option<f64>,
    pub passed: bool,
    pub details: serde_json::Value,
}

impl MetricResult {
    pub fn scored(score: f64, passed: bool, details: serde_json::Value) -> Self {
        Self {
            score: Some(score),
            passed,
            details,
        }
    }

    pub fn undefined(reason: &str) -> Self {
        Self {
            score: None,
            passed: true,
            details: serde_json::json!({ "skipped": reason }),
        }
    }
}

/// A per-case check of model output text against ground truth. Pure: no I/O.
pub trait Metric: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, output_text: &str, truth: &GroundTruthRecord) -> MetricResult;
}
