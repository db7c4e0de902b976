//! Ground Truth Store: one JSON document mapping report id -> record.
//!
//! The store is read wholesale and written wholesale. Updates follow an
//! explicit load / merge / save cycle; there is no locking, so two sessions
//! updating the same file concurrently race and the last writer wins.
//! Callers must serialize annotation sessions.

use crate::errors::StoreError;
use crate::model::GroundTruthRecord;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const GROUND_TRUTH_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    schema_version: u32,
    #[serde(default)]
    records: BTreeMap<String, GroundTruthRecord>,
}

/// Entry shape of the older list-based annotation files.
#[derive(Debug, Deserialize)]
struct LegacyEntry {
    filename: String,
    #[serde(default)]
    patient_info: LegacyPatientInfo,
    #[serde(default)]
    ground_truth: GroundTruthRecord,
    #[serde(default)]
    annotated: bool,
    #[serde(default)]
    auto_suggested: bool,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyPatientInfo {
    #[serde(default)]
    clinical_history: String,
}

/// Report ids are file stems; older files keyed records by file name.
pub fn normalize_id(raw: &str) -> String {
    let raw = raw.trim();
    raw.strip_suffix(".txt").unwrap_or(raw).to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    pub added: Vec<String>,
    pub replaced: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundTruthStore {
    records: BTreeMap<String, GroundTruthRecord>,
}

impl GroundTruthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A missing file is an empty store. A file that exists but does not
    /// parse is a [`StoreError`]: a corrupt source of truth is never used.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(
                event = "pedrad.ground_truth.missing",
                path = %path.display(),
                "no ground truth file yet, starting empty"
            );
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ground truth {}", path.display()))?;
        Self::parse(&raw)
            .with_context(|| format!("ground truth {} is corrupt", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| StoreError(format!("invalid JSON: {}", e)))?;

        match value {
            serde_json::Value::Array(_) => {
                let entries: Vec<LegacyEntry> = serde_json::from_value(value)
                    .map_err(|e| StoreError(format!("invalid legacy entry: {}", e)))?;
                let mut records = BTreeMap::new();
                for e in entries {
                    let mut rec = e.ground_truth;
                    rec.annotated = e.annotated;
                    rec.auto_suggested = e.auto_suggested;
                    if rec.clinical_history.is_empty() {
                        rec.clinical_history = e.patient_info.clinical_history;
                    }
                    // later entries replace earlier ones, as the old files were appended to
                    records.insert(normalize_id(&e.filename), rec);
                }
                Ok(Self { records })
            }
            serde_json::Value::Object(_) => {
                let doc: Document = serde_json::from_value(value)
                    .map_err(|e| StoreError(format!("invalid ground truth document: {}", e)))?;
                if doc.schema_version != GROUND_TRUTH_SCHEMA_VERSION {
                    return Err(StoreError(format!(
                        "unsupported ground truth schema version {}",
                        doc.schema_version
                    )));
                }
                let records = doc
                    .records
                    .into_iter()
                    .map(|(k, v)| (normalize_id(&k), v))
                    .collect();
                Ok(Self { records })
            }
            _ => Err(StoreError(
                "expected a JSON object or array at top level".into(),
            )),
        }
    }

    /// Writes the whole store, via a temp file and rename so readers never
    /// see a half-written document.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let doc = Document {
            schema_version: GROUND_TRUTH_SCHEMA_VERSION,
            records: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Load, apply `f`, save. Not atomic with respect to other writers.
    pub fn update<T>(path: &Path, f: impl FnOnce(&mut Self) -> T) -> anyhow::Result<T> {
        let mut store = Self::load(path)?;
        let out = f(&mut store);
        store.save(path)?;
        Ok(out)
    }

    /// Incoming records replace existing ones with the same id.
    pub fn merge<I>(&mut self, incoming: I) -> MergeReport
    where
        I: IntoIterator<Item = (String, GroundTruthRecord)>,
    {
        let mut report = MergeReport::default();
        for (id, rec) in incoming {
            let id = normalize_id(&id);
            if self.records.insert(id.clone(), rec).is_some() {
                report.replaced.push(id);
            } else {
                report.added.push(id);
            }
        }
        report
    }

    pub fn get(&self, id: &str) -> Option<&GroundTruthRecord> {
        self.records.get(id)
    }

    /// Only records a human has signed off count as ground truth.
    pub fn get_annotated(&self, id: &str) -> Option<&GroundTruthRecord> {
        self.records.get(id).filter(|r| r.annotated)
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &GroundTruthRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn annotated(&self) -> impl Iterator<Item = (&str, &GroundTruthRecord)> {
        self.records().filter(|(_, r)| r.annotated)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn annotated_count(&self) -> usize {
        self.annotated().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(primary: &str, annotated: bool) -> GroundTruthRecord {
        GroundTruthRecord {
            primary_diagnosis: primary.into(),
            differential_diagnoses: vec!["Septic arthritis".into()],
            annotated,
            ..Default::default()
        }
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = GroundTruthStore::load(&dir.path().join("gt.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gt.json");
        std::fs::write(&path, "{ \"schema_version\": 1, \"records\": ").unwrap();
        let err = GroundTruthStore::load(&path).unwrap_err();
        assert!(crate::errors::is_input_error(&err));
        assert!(format!("{:#}", err).contains("corrupt"));
    }

    #[test]
    fn reads_legacy_list_format() {
        let raw = r#"[
          {"filename": "abc.txt",
           "patient_info": {"age_category": "pediatric", "clinical_history": "MRSA positive"},
           "ground_truth": {"primary_diagnosis": "Normal radiographic examination",
                            "differential_diagnoses": ["Septic arthritis", "Soft tissue infection"],
                            "inappropriate_diagnoses": [], "key_findings": [],
                            "appropriate_recommendations": ["Blood cultures"], "notes": ""},
           "annotated": true},
          {"filename": "TEMPLATE", "ground_truth": {}, "annotated": false}
        ]"#;
        let store = GroundTruthStore::parse(raw).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.annotated_count(), 1);
        let abc = store.get_annotated("abc").unwrap();
        assert_eq!(abc.differential_diagnoses.len(), 2);
        assert_eq!(abc.clinical_history, "MRSA positive");
        assert!(store.get_annotated("TEMPLATE").is_none());
    }

    #[test]
    fn save_then_load_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("gt.json");
        let mut store = GroundTruthStore::new();
        store.merge(vec![("r1.txt".to_string(), rec("JIA flare", true))]);
        store.save(&path).unwrap();

        let back = GroundTruthStore::load(&path).unwrap();
        assert_eq!(back, store);
        assert!(back.get("r1").is_some());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn merge_replaces_by_id_last_writer_wins() {
        let mut store = GroundTruthStore::new();
        let first = store.merge(vec![("r1".to_string(), rec("A", true))]);
        assert_eq!(first.added, vec!["r1"]);

        let second = store.merge(vec![
            ("r1".to_string(), rec("B", true)),
            ("r2".to_string(), rec("C", false)),
        ]);
        assert_eq!(second.replaced, vec!["r1"]);
        assert_eq!(second.added, vec!["r2"]);
        assert_eq!(store.get("r1").unwrap().primary_diagnosis, "B");
    }

    #[test]
    fn update_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gt.json");
        let n = GroundTruthStore::update(&path, |s| {
            s.merge(vec![("r9".to_string(), rec("X", true))]);
            s.len()
        })
        .unwrap();
        assert_eq!(n, 1);
        assert_eq!(GroundTruthStore::load(&path).unwrap().annotated_count(), 1);
    }

    #[test]
    fn rejects_scalar_documents() {
        assert!(GroundTruthStore::parse("42").is_err());
    }
}
