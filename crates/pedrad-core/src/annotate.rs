//! Pre-filled annotation records derived from model outputs.
//!
//! Suggestions are written as an ordinary ground-truth document with every
//! record marked `annotated: false`. A reviewer edits the file, flips
//! `annotated` to `true` on the records they accept, and merges it back.

use crate::config::MatchingConfig;
use crate::matcher::TermMatcher;
use crate::model::{GroundTruthRecord, ModelOutput, Report};
use crate::storage::ground_truth::{GroundTruthStore, MergeReport};
use std::collections::{BTreeMap, BTreeSet};

pub const REVIEW_PRIMARY: &str = "*** REVIEW AND EDIT ***";
pub const REVIEW_FINDINGS: &str = "*** REVIEW AND ADD FINDINGS ***";
pub const REVIEW_NOTES: &str = "*** AUTO-GENERATED - PLEASE REVIEW ***";

const DIFFERENTIAL_SECTION: &str = "differential_diagnosis";
const RECOMMENDATIONS_SECTION: &str = "recommendations";

pub struct Suggester {
    sections: TermMatcher,
    diagnoses: TermMatcher,
    disallowed: TermMatcher,
    recommendations: TermMatcher,
}

impl Suggester {
    pub fn from_config(m: &MatchingConfig) -> Self {
        Self {
            sections: m.section_matcher(),
            diagnoses: m.diagnosis_matcher(),
            disallowed: m.disallowed_matcher(),
            recommendations: m.recommendation_matcher(),
        }
    }

    /// Lower-cased body of `section`: from its heading to the next heading of
    /// any other configured section. Falls back to the whole text when the
    /// section is not configured or its heading is absent.
    fn section_body(&self, lowered: &str, section: &str) -> String {
        let Some(term) = self.sections.get(section) else {
            return lowered.to_string();
        };
        let Some((start, heading_len)) = term
            .forms()
            .iter()
            .filter_map(|f| lowered.find(f.as_str()).map(|i| (i, f.len())))
            .min()
        else {
            return lowered.to_string();
        };
        let body_start = start + heading_len;

        let end = self
            .sections
            .terms()
            .iter()
            .filter(|t| t.name != term.name)
            .flat_map(|t| t.forms())
            .filter_map(|f| lowered[body_start..].find(f.as_str()))
            .min()
            .map(|off| body_start + off)
            .unwrap_or(lowered.len());
        lowered[body_start..end].to_string()
    }

    pub fn suggest_differentials(&self, text: &str) -> Vec<String> {
        let body = self.section_body(&text.to_lowercase(), DIFFERENTIAL_SECTION);
        let disallowed: BTreeSet<&str> = self.disallowed.names().collect();
        self.diagnoses
            .find_all(&body)
            .into_iter()
            .filter(|d| !disallowed.contains(d) && self.disallowed.find_all(d).is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn suggest_recommendations(&self, text: &str) -> Vec<String> {
        let body = self.section_body(&text.to_lowercase(), RECOMMENDATIONS_SECTION);
        self.recommendations
            .find_all(&body)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn suggest_record(&self, text: &str, report: Option<&Report>) -> GroundTruthRecord {
        GroundTruthRecord {
            primary_diagnosis: REVIEW_PRIMARY.to_string(),
            differential_diagnoses: self.suggest_differentials(text),
            inappropriate_diagnoses: vec![],
            key_findings: vec![REVIEW_FINDINGS.to_string()],
            appropriate_recommendations: self.suggest_recommendations(text),
            notes: REVIEW_NOTES.to_string(),
            clinical_history: report.map(|r| r.clinical_history.clone()).unwrap_or_default(),
            annotated: false,
            auto_suggested: true,
        }
    }

    /// One suggestion per output with usable text whose report is not yet
    /// annotated. When a report appears more than once, the last output wins.
    pub fn suggest(
        &self,
        outputs: &[ModelOutput],
        reports: &[Report],
        store: &GroundTruthStore,
    ) -> BTreeMap<String, GroundTruthRecord> {
        let by_id: BTreeMap<&str, &Report> = reports.iter().map(|r| (r.id.as_str(), r)).collect();
        let mut out = BTreeMap::new();
        for o in outputs {
            if store.get_annotated(&o.report_id).is_some() {
                continue;
            }
            let Some(text) = o.usable_text() else {
                continue;
            };
            let record = self.suggest_record(text, by_id.get(o.report_id.as_str()).copied());
            out.insert(o.report_id.clone(), record);
        }
        out
    }
}

/// Adds suggestions to an existing suggestions document. Records a reviewer
/// already marked `annotated: true` are kept as they are.
pub fn merge_suggestions(
    doc: &mut GroundTruthStore,
    suggestions: BTreeMap<String, GroundTruthRecord>,
) -> MergeReport {
    let fresh: Vec<(String, GroundTruthRecord)> = suggestions
        .into_iter()
        .filter(|(id, _)| doc.get_annotated(id).is_none())
        .collect();
    doc.merge(fresh)
}

/// Copies reviewed records (`annotated: true`) from `reviewed` into `store`.
/// Records still awaiting review are left out.
pub fn merge_reviewed(store: &mut GroundTruthStore, reviewed: &GroundTruthStore) -> MergeReport {
    let accepted = reviewed.annotated().map(|(id, r)| {
        let mut r = r.clone();
        r.auto_suggested = false;
        (id.to_string(), r)
    });
    store.merge(accepted.collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const OUTPUT: &str = "1. CLINICAL ASSESSMENT\nSmall effusion.\n\n\
2. DIFFERENTIAL DIAGNOSIS\n- Septic arthritis\n- JIA\n- Osteoarthritis (unlikely)\n\n\
3. CLINICAL CORRELATION\nMRSA history raises concern for osteomyelitis.\n\n\
4. RECOMMENDATIONS\n- MRI\n- Blood cultures\n- Rheumatology referral\n";

    fn output(id: &str, text: &str) -> ModelOutput {
        ModelOutput {
            report_id: id.into(),
            text: text.into(),
            error: None,
            latency_secs: Some(1.0),
            timestamp: Utc::now(),
            model: "m".into(),
            prompt_version: "v1_current".into(),
        }
    }

    fn suggester() -> Suggester {
        Suggester::from_config(&MatchingConfig::default())
    }

    #[test]
    fn differentials_come_from_their_section_only() {
        let d = suggester().suggest_differentials(OUTPUT);
        assert!(d.contains(&"septic arthritis".to_string()));
        assert!(d.contains(&"juvenile idiopathic arthritis".to_string()));
        // mentioned in the correlation section, not the differential list
        assert!(!d.contains(&"osteomyelitis".to_string()));
        // never suggested even when the model lists it
        assert!(!d.contains(&"osteoarthritis".to_string()));
    }

    #[test]
    fn recommendations_are_mapped_to_catalog_entries() {
        let r = suggester().suggest_recommendations(OUTPUT);
        assert_eq!(
            r,
            vec![
                "Blood cultures".to_string(),
                "MRI if clinical suspicion persists".to_string(),
                "Rheumatology referral".to_string(),
            ]
        );
    }

    #[test]
    fn skips_annotated_reports_and_unusable_outputs() {
        let mut store = GroundTruthStore::new();
        store.merge(vec![(
            "done".to_string(),
            GroundTruthRecord {
                annotated: true,
                ..Default::default()
            },
        )]);
        let mut failed = output("failed", "");
        failed.error = Some("timeout".into());
        let reports = vec![Report {
            id: "new".into(),
            clinical_history: "14 month old".into(),
            findings: "effusion".into(),
            ..Default::default()
        }];

        let s = suggester().suggest(
            &[output("done", OUTPUT), output("new", OUTPUT), failed],
            &reports,
            &store,
        );
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["new"]);
        let rec = &s["new"];
        assert!(!rec.annotated);
        assert!(rec.auto_suggested);
        assert_eq!(rec.clinical_history, "14 month old");
        assert_eq!(rec.primary_diagnosis, REVIEW_PRIMARY);
    }

    #[test]
    fn new_suggestions_never_replace_reviewed_ones() {
        let mut doc = GroundTruthStore::new();
        doc.merge(vec![
            (
                "reviewed".to_string(),
                GroundTruthRecord {
                    primary_diagnosis: "Septic arthritis".into(),
                    annotated: true,
                    auto_suggested: true,
                    ..Default::default()
                },
            ),
            (
                "pending".to_string(),
                GroundTruthRecord {
                    auto_suggested: true,
                    ..Default::default()
                },
            ),
        ]);

        let again = suggester().suggest(
            &[output("reviewed", OUTPUT), output("pending", OUTPUT), output("new", OUTPUT)],
            &[],
            &GroundTruthStore::new(),
        );
        let report = merge_suggestions(&mut doc, again);

        assert_eq!(report.added, vec!["new"]);
        assert_eq!(report.replaced, vec!["pending"]);
        assert_eq!(doc.get("reviewed").unwrap().primary_diagnosis, "Septic arthritis");
        assert_eq!(doc.get("pending").unwrap().primary_diagnosis, REVIEW_PRIMARY);
    }

    #[test]
    fn merge_takes_only_reviewed_records() {
        let mut reviewed = GroundTruthStore::new();
        reviewed.merge(vec![
            (
                "a".to_string(),
                GroundTruthRecord {
                    primary_diagnosis: "Septic arthritis".into(),
                    annotated: true,
                    auto_suggested: true,
                    ..Default::default()
                },
            ),
            (
                "b".to_string(),
                GroundTruthRecord {
                    annotated: false,
                    auto_suggested: true,
                    ..Default::default()
                },
            ),
        ]);
        let mut store = GroundTruthStore::new();
        let report = merge_reviewed(&mut store, &reviewed);
        assert_eq!(report.added, vec!["a"]);
        assert!(store.get("b").is_none());
        assert!(!store.get("a").unwrap().auto_suggested);
    }
}
