//! Report Store: a directory with one `*.txt` file per radiology report.
//!
//! Sections are introduced by labels such as `EXAMINATION:` or `FINDINGS:`
//! (case-insensitive) at the start of a line and run until the next
//! recognised label. A label word inside running prose is plain text.

use crate::model::Report;
use anyhow::Context;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Examination,
    ClinicalHistory,
    Comparison,
    Findings,
    Conclusion,
    ReportedBy,
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?im)^[ \t]*(EXAMINATION|CLINICAL DETAILS|CLINICAL HISTORY|COMPARISON|FINDINGS|REPORT|CONCLUSION|IMPRESSION|REPORTED BY)[ \t]*:",
        )
        .expect("static regex")
    })
}

fn classify(label: &str) -> Section {
    match label.to_ascii_uppercase().as_str() {
        "EXAMINATION" => Section::Examination,
        "CLINICAL DETAILS" | "CLINICAL HISTORY" => Section::ClinicalHistory,
        "COMPARISON" => Section::Comparison,
        "FINDINGS" | "REPORT" => Section::Findings,
        "CONCLUSION" | "IMPRESSION" => Section::Conclusion,
        _ => Section::ReportedBy,
    }
}

/// Splits report text into sections. The first occurrence of a section wins;
/// text before the first label and after `REPORTED BY:` is ignored.
pub fn parse_report(id: &str, text: &str) -> Report {
    let mut report = Report {
        id: id.to_string(),
        ..Default::default()
    };

    let labels: Vec<(Section, usize, usize)> = label_re()
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((classify(&c[1]), whole.start(), whole.end()))
        })
        .collect();

    for (i, (section, _, body_start)) in labels.iter().enumerate() {
        let body_end = labels.get(i + 1).map(|l| l.1).unwrap_or(text.len());
        let body = text[*body_start..body_end].trim();
        let slot = match section {
            Section::Examination => &mut report.examination,
            Section::ClinicalHistory => &mut report.clinical_history,
            Section::Comparison => &mut report.comparison,
            Section::Findings => &mut report.findings,
            Section::Conclusion => &mut report.conclusion,
            Section::ReportedBy => continue,
        };
        if slot.is_empty() {
            *slot = body.to_string();
        }
    }
    report
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedReport {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadedReports {
    pub reports: Vec<Report>,
    pub skipped: Vec<SkippedReport>,
}

#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Report identifiers (file stems of `*.txt`), sorted.
    pub fn list_ids(&self) -> anyhow::Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read report folder {}", self.dir.display()))?;
        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "txt") {
                if let Some(stem) = path.file_stem() {
                    ids.push(stem.to_string_lossy().to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", id))
    }

    /// Reads and parses one report. A report with no recognisable section is an error.
    pub fn load(&self, id: &str) -> anyhow::Result<Report> {
        let path = self.path_for(id);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read report {}", path.display()))?;
        let report = parse_report(id, &text);
        if report.is_blank() {
            anyhow::bail!("no labelled sections found in {}", path.display());
        }
        Ok(report)
    }

    /// Loads up to `limit` reports in identifier order. Unreadable or
    /// malformed files are skipped and logged, never fatal.
    pub fn load_all(&self, limit: Option<usize>) -> anyhow::Result<LoadedReports> {
        let mut ids = self.list_ids()?;
        if let Some(n) = limit {
            ids.truncate(n);
        }
        Ok(self.load_selected(&ids))
    }

    pub fn load_selected(&self, ids: &[String]) -> LoadedReports {
        let mut out = LoadedReports::default();
        for id in ids {
            match self.load(id) {
                Ok(r) => out.reports.push(r),
                Err(e) => {
                    tracing::warn!(
                        event = "pedrad.reports.skipped",
                        report_id = %id,
                        error = %format!("{:#}", e),
                        "skipping report"
                    );
                    out.skipped.push(SkippedReport {
                        id: id.clone(),
                        reason: format!("{:#}", e),
                    });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "EXAMINATION: XR KNEE LEFT\n\
CLINICAL DETAILS: 14month old with hx of septic arthritis. Swelling increasing.\n\
COMPARISON: 02/03/2021\n\
FINDINGS: There is a small knee joint effusion, improved since the previous x-ray.\n\
No fractures identified.\n\
CONCLUSION: Improving effusion.\n\
REPORTED BY: Dr Example\n";

    #[test]
    fn splits_labelled_sections() {
        let r = parse_report("a", SAMPLE);
        assert_eq!(r.examination, "XR KNEE LEFT");
        assert!(r.clinical_history.starts_with("14month old"));
        assert_eq!(r.comparison, "02/03/2021");
        assert!(r.findings.contains("No fractures identified."));
        assert_eq!(r.conclusion, "Improving effusion.");
    }

    #[test]
    fn report_label_and_lowercase_labels_are_accepted() {
        let r = parse_report("b", "examination: CHEST\nReport: Normal lungs.\nImpression: normal");
        assert_eq!(r.examination, "CHEST");
        assert_eq!(r.findings, "Normal lungs.");
        assert_eq!(r.conclusion, "normal");
    }

    #[test]
    fn label_words_inside_prose_stay_in_the_section() {
        let text = concat!(
            "CLINICAL DETAILS: On examination: swollen hot knee, MRSA history.\n",
            "FINDINGS: Effusion. Compared with the prior report: no bony change. Soft tissue swelling.\n",
            "  CONCLUSION: Effusion.\n",
        );
        let r = parse_report("d", text);
        assert_eq!(
            r.clinical_history,
            "On examination: swollen hot knee, MRSA history."
        );
        assert_eq!(
            r.findings,
            "Effusion. Compared with the prior report: no bony change. Soft tissue swelling."
        );
        // indented labels still start a section
        assert_eq!(r.conclusion, "Effusion.");
    }

    #[test]
    fn reported_by_is_not_taken_for_report_label() {
        let r = parse_report("c", "FINDINGS: effusion\nREPORTED BY: someone");
        assert_eq!(r.findings, "effusion");
    }

    #[test]
    fn loads_sorted_and_skips_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("a.txt"), "free text without any labels").unwrap();
        std::fs::write(dir.path().join("c.txt"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("notes.md"), SAMPLE).unwrap();

        let store = ReportStore::new(dir.path());
        assert_eq!(store.list_ids().unwrap(), vec!["a", "b", "c"]);

        let loaded = store.load_all(None).unwrap();
        let ids: Vec<_> = loaded.reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].id, "a");

        let limited = store.load_all(Some(2)).unwrap();
        assert_eq!(limited.reports.len(), 1);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let store = ReportStore::new("/definitely/not/here");
        assert!(store.load_all(None).is_err());
    }
}
