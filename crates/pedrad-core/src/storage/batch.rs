//! Batch Result Store: JSON Lines, one header line then one line per output.
//!
//! Lines are flushed as soon as each output is produced, so an interrupted
//! run leaves a loadable prefix behind.

use crate::model::ModelOutput;
use crate::storage::ground_truth::normalize_id;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const BATCH_SCHEMA_VERSION: u32 = 1;

const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchHeader {
    pub schema_version: u32,
    pub run_id: String,
    pub model: String,
    pub provider: String,
    pub prompt_version: String,
    pub prompt_fingerprint: String,
    pub run_fingerprint: String,
    #[serde(default)]
    pub temperature: f32,
    pub created_at: DateTime<Utc>,
    pub pedrad_version: String,
}

impl BatchHeader {
    pub fn new(
        model: &str,
        provider: &str,
        template: &crate::prompt::PromptTemplate,
        temperature: f32,
    ) -> Self {
        let created_at = Utc::now();
        let run_fingerprint = crate::fingerprint::compute(crate::fingerprint::Context {
            model,
            prompt_version: &template.version,
            prompt_body: template.body(),
            temperature,
        });
        Self {
            schema_version: BATCH_SCHEMA_VERSION,
            run_id: format!("{}-{}", created_at.format("%Y%m%d_%H%M%S"), &run_fingerprint[..8]),
            model: model.to_string(),
            provider: provider.to_string(),
            prompt_version: template.version.clone(),
            prompt_fingerprint: template.fingerprint(),
            run_fingerprint,
            temperature,
            created_at,
            pedrad_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchLine {
    Header(BatchHeader),
    Output(ModelOutput),
}

/// `results/batch_results_<label>_<run_id>.jsonl`
pub fn default_batch_path(results_dir: &Path, label: &str, header: &BatchHeader) -> PathBuf {
    let label: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    results_dir.join(format!("batch_results_{}_{}.jsonl", label, header.run_id))
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

pub struct BatchWriter {
    path: PathBuf,
    out: BufWriter<File>,
    written: usize,
}

impl BatchWriter {
    /// Creates (truncating) the batch file and writes the header line.
    pub fn create(path: &Path, header: &BatchHeader) -> anyhow::Result<Self> {
        ensure_parent(path)?;
        let file = File::create(path)
            .with_context(|| format!("failed to create batch file {}", path.display()))?;
        Self::start(path.to_path_buf(), file, header)
    }

    /// Like `create`, but never opens an existing file: a taken name gets a
    /// `_2`, `_3`, ... suffix before the extension.
    pub fn create_new(path: &Path, header: &BatchHeader) -> anyhow::Result<Self> {
        ensure_parent(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
        for n in 1..=MAX_NAME_ATTEMPTS {
            let candidate = if n == 1 {
                path.to_path_buf()
            } else {
                let name = match &ext {
                    Some(ext) => format!("{}_{}.{}", stem, n, ext),
                    None => format!("{}_{}", stem, n),
                };
                path.with_file_name(name)
            };
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(file) => return Self::start(candidate, file, header),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("failed to create batch file {}", candidate.display())
                    })
                }
            }
        }
        anyhow::bail!(
            "failed to create batch file {}: {} names already taken",
            path.display(),
            MAX_NAME_ATTEMPTS
        )
    }

    fn start(path: PathBuf, file: File, header: &BatchHeader) -> anyhow::Result<Self> {
        let mut w = Self {
            path,
            out: BufWriter::new(file),
            written: 0,
        };
        w.write_line(&BatchLine::Header(header.clone()))?;
        Ok(w)
    }

    pub fn append(&mut self, output: &ModelOutput) -> anyhow::Result<()> {
        self.write_line(&BatchLine::Output(output.clone()))?;
        self.written += 1;
        Ok(())
    }

    fn write_line(&mut self, line: &BatchLine) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, line)?;
        self.out.write_all(b"\n")?;
        self.out
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> anyhow::Result<PathBuf> {
        self.out.flush()?;
        Ok(self.path)
    }
}

/// Output record of the older single-document batch files.
#[derive(Debug, Deserialize)]
struct LegacyOutput {
    filename: String,
    #[serde(default)]
    ai_diagnosis: String,
    #[serde(default)]
    processing_time: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchFile {
    pub path: PathBuf,
    /// `None` for legacy files, which carry no run metadata.
    pub header: Option<BatchHeader>,
    pub outputs: Vec<ModelOutput>,
}

impl BatchFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read batch file {}", path.display()))?;
        if raw.trim_start().starts_with('[') {
            return Self::parse_legacy(path, &raw);
        }
        Self::parse_jsonl(path, &raw)
    }

    fn parse_jsonl(path: &Path, raw: &str) -> anyhow::Result<Self> {
        let lines: Vec<(usize, &str)> = raw
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .collect();

        let mut header = None;
        let mut outputs = Vec::new();
        for (pos, (lineno, line)) in lines.iter().enumerate() {
            let parsed: BatchLine = match serde_json::from_str(line) {
                Ok(p) => p,
                Err(e) if pos + 1 == lines.len() => {
                    tracing::warn!(
                        event = "pedrad.batch.truncated_line",
                        path = %path.display(),
                        line = lineno + 1,
                        error = %e,
                        "skipping truncated trailing line"
                    );
                    break;
                }
                Err(e) => {
                    anyhow::bail!("{}:{}: invalid batch line: {}", path.display(), lineno + 1, e)
                }
            };
            match parsed {
                BatchLine::Header(h) if header.is_none() && outputs.is_empty() => header = Some(h),
                BatchLine::Header(_) => {
                    anyhow::bail!("{}:{}: unexpected second header", path.display(), lineno + 1)
                }
                BatchLine::Output(o) => outputs.push(o),
            }
        }

        if let Some(h) = &header {
            if h.schema_version != BATCH_SCHEMA_VERSION {
                anyhow::bail!(
                    "{}: unsupported batch schema version {}",
                    path.display(),
                    h.schema_version
                );
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            header,
            outputs,
        })
    }

    fn parse_legacy(path: &Path, raw: &str) -> anyhow::Result<Self> {
        let entries: Vec<LegacyOutput> = serde_json::from_str(raw)
            .with_context(|| format!("invalid legacy batch file {}", path.display()))?;
        let timestamp: DateTime<Utc> = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        let outputs = entries
            .into_iter()
            .map(|e| {
                let error = match e.error {
                    Some(err) => Some(err),
                    None if e.ai_diagnosis.trim().is_empty() => Some("empty output".to_string()),
                    None => None,
                };
                ModelOutput {
                    report_id: normalize_id(&e.filename),
                    latency_secs: if error.is_none() { e.processing_time } else { None },
                    text: e.ai_diagnosis,
                    error,
                    timestamp,
                    model: String::new(),
                    prompt_version: String::new(),
                }
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            header: None,
            outputs,
        })
    }

    /// Short display label: prompt version when known, else the file stem.
    pub fn label(&self) -> String {
        match &self.header {
            Some(h) => format!("{} ({})", h.model, h.prompt_version),
            None => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "batch".into()),
        }
    }
}
