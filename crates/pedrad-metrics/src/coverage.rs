use pedrad_core::matcher::TermMatcher;
use pedrad_core::metrics_api::{Metric, MetricResult};
use pedrad_core::model::GroundTruthRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct CoverageCheck {
    /// `None` when nothing was expected.
    pub score: Option<f64>,
    pub matched: Vec<String>,
    pub missed: Vec<String>,
}

/// Share of expected differentials mentioned in the output. An expected
/// term with an alias entry matches on any of its surface forms, otherwise
/// on its own text.
pub struct DifferentialCoverageMetric {
    aliases: TermMatcher,
}

impl DifferentialCoverageMetric {
    pub fn new(aliases: TermMatcher) -> Self {
        Self { aliases }
    }

    pub fn check(&self, text: &str, expected: &[String]) -> CoverageCheck {
        let mut seen: Vec<String> = Vec::new();
        let mut matched = Vec::new();
        let mut missed = Vec::new();
        for e in expected {
            let key = e.trim().to_lowercase();
            if key.is_empty() || seen.contains(&key) {
                continue;
            }
            seen.push(key);
            if self.aliases.is_found(e, text) {
                matched.push(e.clone());
            } else {
                missed.push(e.clone());
            }
        }
        let total = matched.len() + missed.len();
        CoverageCheck {
            score: (total > 0).then(|| matched.len() as f64 / total as f64),
            matched,
            missed,
        }
    }
}

impl Metric for DifferentialCoverageMetric {
    fn name(&self) -> &'static str {
        "differential_coverage"
    }

    fn evaluate(&self, output_text: &str, truth: &GroundTruthRecord) -> MetricResult {
        let c = self.check(output_text, &truth.differential_diagnoses);
        match c.score {
            Some(score) => MetricResult::scored(
                score,
                c.missed.is_empty(),
                serde_json::json!({ "matched": c.matched, "missed": c.missed }),
            ),
            None => MetricResult::undefined("no expected differentials"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedrad_core::config::MatchingConfig;

    fn metric() -> DifferentialCoverageMetric {
        DifferentialCoverageMetric::new(MatchingConfig::default().alias_matcher())
    }

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_expected_set_is_undefined() {
        let c = metric().check("septic arthritis", &[]);
        assert_eq!(c.score, None);
        assert_eq!(
            metric().evaluate("septic arthritis", &GroundTruthRecord::default()).score,
            None
        );
    }

    #[test]
    fn literal_and_alias_matching() {
        let text = "Differential: septic arthritis vs JIA. Cellulitis less likely.";
        let c = metric().check(
            text,
            &v(&[
                "Septic arthritis",
                "Juvenile Idiopathic Arthritis (JIA)",
                "Soft tissue infection",
                "Osteomyelitis",
            ]),
        );
        assert_eq!(c.score, Some(0.75));
        assert_eq!(c.missed, v(&["Osteomyelitis"]));
    }

    #[test]
    fn duplicates_count_once() {
        let c = metric().check("septic arthritis", &v(&["Septic arthritis", "septic arthritis ", ""]));
        assert_eq!(c.score, Some(1.0));
        assert_eq!(c.matched.len(), 1);
    }
}
