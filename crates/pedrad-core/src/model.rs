use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A radiology report split into its labelled sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub examination: String,
    #[serde(default)]
    pub clinical_history: String,
    #[serde(default)]
    pub comparison: String,
    #[serde(default)]
    pub findings: String,
    #[serde(default)]
    pub conclusion: String,
}

impl Report {
    /// True when no section could be extracted at all.
    pub fn is_blank(&self) -> bool {
        [
            &self.examination,
            &self.clinical_history,
            &self.comparison,
            &self.findings,
            &self.conclusion,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// One model completion for one report, as produced by a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelOutput {
    pub report_id: String,
    #[serde(default)]
    pub text: String,
    /// Set when the client failed or timed out; `text` is empty in that case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Seconds spent in the client call. Only recorded for successful calls.
    #[serde(default)]
    pub latency_secs: Option<f64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub prompt_version: String,
}

impl ModelOutput {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The completion text, or `None` when there is nothing to score.
    pub fn usable_text(&self) -> Option<&str> {
        if self.error.is_some() || self.text.trim().is_empty() {
            None
        } else {
            Some(&self.text)
        }
    }
}

/// Manually curated reference answer for one report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroundTruthRecord {
    #[serde(default)]
    pub primary_diagnosis: String,
    #[serde(default)]
    pub differential_diagnoses: Vec<String>,
    #[serde(default)]
    pub inappropriate_diagnoses: Vec<String>,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub appropriate_recommendations: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub clinical_history: String,
    #[serde(default)]
    pub annotated: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_suggested: bool,
}

/// Per-case scores for one model output against its ground truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub report_id: String,
    pub completeness: f64,
    /// Section label -> present in output.
    pub sections: BTreeMap<String, bool>,
    /// `None` when the ground truth lists no differentials.
    pub coverage: Option<f64>,
    #[serde(default)]
    pub differentials_matched: Vec<String>,
    #[serde(default)]
    pub differentials_missed: Vec<String>,
    #[serde(default)]
    pub inappropriate_found: Vec<String>,
    pub appropriate: bool,
    #[serde(default)]
    pub primary_diagnosis: String,
    #[serde(default)]
    pub latency_secs: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    NoGroundTruth,
    MissingOutput,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::NoGroundTruth => "no_ground_truth",
            ExclusionReason::MissingOutput => "missing_output",
        }
    }
}

/// A model output that did not produce an [`EvaluationResult`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exclusion {
    pub report_id: String,
    pub reason: ExclusionReason,
}
