use std::sync::Arc;

use pedrad_core::config::MatchingConfig;
use pedrad_core::metrics_api::Metric;

pub mod appropriateness;
pub mod completeness;
pub mod coverage;
pub mod evaluator;

pub use evaluator::{BatchEvaluation, Evaluator};

/// The per-case checks as individual metrics, in report order.
pub fn default_metrics(m: &MatchingConfig) -> Vec<Arc<dyn Metric>> {
    vec![
        Arc::new(completeness::SectionCompletenessMetric::new(m.section_matcher())),
        Arc::new(coverage::DifferentialCoverageMetric::new(m.alias_matcher())),
        Arc::new(appropriateness::AppropriatenessMetric::new(m.disallowed_matcher())),
    ]
}
