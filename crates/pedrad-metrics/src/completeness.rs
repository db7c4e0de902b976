use pedrad_core::matcher::TermMatcher;
use pedrad_core::metrics_api::{Metric, MetricResult};
use pedrad_core::model::GroundTruthRecord;
use std::collections::BTreeMap;

/// Fraction of the configured output sections whose heading appears.
pub struct SectionCompletenessMetric {
    sections: TermMatcher,
}

impl SectionCompletenessMetric {
    pub fn new(sections: TermMatcher) -> Self {
        Self { sections }
    }

    pub fn check(&self, text: &str) -> (f64, BTreeMap<String, bool>) {
        let found = self.sections.find_all(text);
        let presence: BTreeMap<String, bool> = self
            .sections
            .names()
            .map(|n| (n.to_string(), found.contains(&n)))
            .collect();
        if self.sections.is_empty() {
            return (0.0, presence);
        }
        (found.len() as f64 / self.sections.len() as f64, presence)
    }
}

impl Metric for SectionCompletenessMetric {
    fn name(&self) -> &'static str {
        "section_completeness"
    }

    fn evaluate(&self, output_text: &str, _truth: &GroundTruthRecord) -> MetricResult {
        let (score, presence) = self.check(output_text);
        MetricResult::scored(score, score >= 1.0, serde_json::json!({ "sections": presence }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedrad_core::config::MatchingConfig;

    fn metric() -> SectionCompletenessMetric {
        SectionCompletenessMetric::new(MatchingConfig::default().section_matcher())
    }

    #[test]
    fn all_four_sections() {
        let text = "CLINICAL ASSESSMENT: x\nDifferential Diagnosis: y\nclinical correlation: z\nRecommendations: w";
        let (score, presence) = metric().check(text);
        assert_eq!(score, 1.0);
        assert!(presence.values().all(|p| *p));
    }

    #[test]
    fn no_sections() {
        let (score, presence) = metric().check("The knee shows a small effusion.");
        assert_eq!(score, 0.0);
        assert_eq!(presence.len(), 4);
    }

    #[test]
    fn partial_sections() {
        let (score, presence) = metric().check("Differential diagnosis: JIA. Recommendation: MRI.");
        assert_eq!(score, 0.5);
        assert_eq!(presence.get("recommendations"), Some(&true));
        assert_eq!(presence.get("clinical_assessment"), Some(&false));
    }
}
