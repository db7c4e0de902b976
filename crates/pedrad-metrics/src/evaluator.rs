use crate::appropriateness::AppropriatenessMetric;
use crate::completeness::SectionCompletenessMetric;
use crate::coverage::DifferentialCoverageMetric;
use pedrad_core::config::MatchingConfig;
use pedrad_core::model::{EvaluationResult, Exclusion, ExclusionReason, GroundTruthRecord, ModelOutput};
use pedrad_core::storage::ground_truth::GroundTruthStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchEvaluation {
    pub results: Vec<EvaluationResult>,
    pub excluded: Vec<Exclusion>,
}

/// Scores one model output against one ground-truth record. No I/O.
pub struct Evaluator {
    completeness: SectionCompletenessMetric,
    coverage: DifferentialCoverageMetric,
    appropriateness: AppropriatenessMetric,
}

impl Evaluator {
    pub fn new(
        completeness: SectionCompletenessMetric,
        coverage: DifferentialCoverageMetric,
        appropriateness: AppropriatenessMetric,
    ) -> Self {
        Self {
            completeness,
            coverage,
            appropriateness,
        }
    }

    pub fn from_config(m: &MatchingConfig) -> Self {
        Self::new(
            SectionCompletenessMetric::new(m.section_matcher()),
            DifferentialCoverageMetric::new(m.alias_matcher()),
            AppropriatenessMetric::new(m.disallowed_matcher()),
        )
    }

    /// `None` when the output carries an error or has no text.
    pub fn evaluate(&self, output: &ModelOutput, truth: &GroundTruthRecord) -> Option<EvaluationResult> {
        let text = output.usable_text()?;

        let (completeness, sections) = self.completeness.check(text);
        let coverage = self.coverage.check(text, &truth.differential_diagnoses);
        let inappropriate_found = self.appropriateness.check(text, &truth.inappropriate_diagnoses);

        Some(EvaluationResult {
            report_id: output.report_id.clone(),
            completeness,
            sections,
            coverage: coverage.score,
            differentials_matched: coverage.matched,
            differentials_missed: coverage.missed,
            appropriate: inappropriate_found.is_empty(),
            inappropriate_found,
            primary_diagnosis: truth.primary_diagnosis.clone(),
            latency_secs: output.latency_secs,
        })
    }

    /// Joins outputs with annotated ground truth by report id. Outputs that
    /// cannot be scored are listed in `excluded`, never zero-filled.
    pub fn evaluate_batch(&self, outputs: &[ModelOutput], truth: &GroundTruthStore) -> BatchEvaluation {
        let mut eval = BatchEvaluation::default();
        for o in outputs {
            let Some(record) = truth.get_annotated(&o.report_id) else {
                eval.excluded.push(Exclusion {
                    report_id: o.report_id.clone(),
                    reason: ExclusionReason::NoGroundTruth,
                });
                continue;
            };
            match self.evaluate(o, record) {
                Some(r) => eval.results.push(r),
                None => eval.excluded.push(Exclusion {
                    report_id: o.report_id.clone(),
                    reason: ExclusionReason::MissingOutput,
                }),
            }
        }
        tracing::info!(
            event = "pedrad.evaluate.batch",
            outputs = outputs.len(),
            evaluated = eval.results.len(),
            excluded = eval.excluded.len(),
            "evaluated batch"
        );
        eval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const FULL: &str = "1. CLINICAL ASSESSMENT\nSmall effusion.\n\
2. DIFFERENTIAL DIAGNOSIS\n- Septic arthritis\n- JIA\n\
3. CLINICAL CORRELATION\nFever.\n\
4. RECOMMENDATIONS\n- Aspiration\n";

    fn output(id: &str, text: &str) -> ModelOutput {
        ModelOutput {
            report_id: id.into(),
            text: text.into(),
            error: None,
            latency_secs: Some(12.0),
            timestamp: Utc::now(),
            model: "m".into(),
            prompt_version: "v1_current".into(),
        }
    }

    fn truth(differentials: &[&str]) -> GroundTruthRecord {
        GroundTruthRecord {
            primary_diagnosis: "Septic arthritis".into(),
            differential_diagnoses: differentials.iter().map(|s| s.to_string()).collect(),
            annotated: true,
            ..Default::default()
        }
    }

    fn evaluator() -> Evaluator {
        Evaluator::from_config(&MatchingConfig::default())
    }

    #[test]
    fn scores_a_complete_output() {
        let r = evaluator()
            .evaluate(&output("a", FULL), &truth(&["Septic arthritis", "Osteomyelitis"]))
            .unwrap();
        assert_eq!(r.completeness, 1.0);
        assert_eq!(r.coverage, Some(0.5));
        assert!(r.appropriate);
        assert_eq!(r.latency_secs, Some(12.0));
        assert_eq!(r.primary_diagnosis, "Septic arthritis");
    }

    #[test]
    fn missing_output_is_not_scored() {
        let mut failed = output("a", "");
        failed.error = Some("timed out".into());
        assert!(evaluator().evaluate(&failed, &truth(&[])).is_none());
        assert!(evaluator().evaluate(&output("a", "  \n"), &truth(&[])).is_none());
    }

    #[test]
    fn batch_excludes_unannotated_and_missing() {
        let mut store = GroundTruthStore::new();
        store.merge(vec![
            ("a".to_string(), truth(&["JIA flare"])),
            ("b".to_string(), truth(&[])),
            (
                "draft".to_string(),
                GroundTruthRecord {
                    annotated: false,
                    ..truth(&["x"])
                },
            ),
        ]);
        let mut failed = output("b", "");
        failed.error = Some("connection refused".into());
        let outputs = vec![
            output("a", FULL),
            failed,
            output("draft", FULL),
            output("unknown", FULL),
        ];

        let eval = evaluator().evaluate_batch(&outputs, &store);
        assert_eq!(eval.results.len(), 1);
        assert_eq!(eval.results[0].report_id, "a");
        assert_eq!(eval.results[0].coverage, Some(1.0));

        let reasons: Vec<_> = eval
            .excluded
            .iter()
            .map(|e| (e.report_id.as_str(), e.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("b", ExclusionReason::MissingOutput),
                ("draft", ExclusionReason::NoGroundTruth),
                ("unknown", ExclusionReason::NoGroundTruth),
            ]
        );
    }
}
