use pedrad_core::matcher::TermMatcher;
use pedrad_core::metrics_api::{Metric, MetricResult};
use pedrad_core::model::GroundTruthRecord;

/// Flags adult-only diagnoses. The configured catalog applies to every
/// case; a record's own `inappropriate_diagnoses` extend it for that case.
pub struct AppropriatenessMetric {
    disallowed: TermMatcher,
}

impl AppropriatenessMetric {
    pub fn new(disallowed: TermMatcher) -> Self {
        Self { disallowed }
    }

    /// Canonical names of the disallowed terms present in `text`.
    pub fn check(&self, text: &str, case_specific: &[String]) -> Vec<String> {
        self.disallowed
            .with_literals(case_specific)
            .find_all(text)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

impl Metric for AppropriatenessMetric {
    fn name(&self) -> &'static str {
        "pediatric_appropriateness"
    }

    fn evaluate(&self, output_text: &str, truth: &GroundTruthRecord) -> MetricResult {
        let found = self.check(output_text, &truth.inappropriate_diagnoses);
        let ok = found.is_empty();
        MetricResult::scored(
            if ok { 1.0 } else { 0.0 },
            ok,
            serde_json::json!({ "inappropriate_found": found }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedrad_core::config::MatchingConfig;

    fn metric() -> AppropriatenessMetric {
        AppropriatenessMetric::new(MatchingConfig::default().disallowed_matcher())
    }

    #[test]
    fn flags_catalog_terms_case_insensitively() {
        let found = metric().check("Early OSTEOARTHRITIS is unlikely.", &[]);
        assert_eq!(found, vec!["osteoarthritis".to_string()]);
        assert!(!metric().evaluate("Early osteoarthritis.", &GroundTruthRecord::default()).passed);
    }

    #[test]
    fn clean_output_is_appropriate() {
        let r = metric().evaluate("Septic arthritis vs JIA.", &GroundTruthRecord::default());
        assert!(r.passed);
        assert_eq!(r.score, Some(1.0));
    }

    #[test]
    fn record_specific_terms_extend_the_catalog() {
        let extra = vec!["Gout".to_string()];
        assert_eq!(metric().check("possible gout", &extra), vec!["Gout".to_string()]);
        assert!(metric().check("possible gout", &[]).is_empty());
    }
}
