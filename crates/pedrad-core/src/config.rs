use crate::errors::ConfigError;
use crate::matcher::TermMatcher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub mod path_resolver;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PedradConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub prompt: PromptSettings,
    #[serde(default)]
    pub matching: MatchingConfig,
}

impl Default for PedradConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            model: ModelSettings::default(),
            paths: PathSettings::default(),
            prompt: PromptSettings::default(),
            matching: MatchingConfig::default(),
        }
    }
}

fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSettings {
    /// ollama | fake
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama2:7b".into()
}
fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathSettings {
    #[serde(default = "default_reports_dir")]
    pub reports: String,
    #[serde(default = "default_ground_truth")]
    pub ground_truth: String,
    #[serde(default = "default_results_dir")]
    pub results: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            reports: default_reports_dir(),
            ground_truth: default_ground_truth(),
            results: default_results_dir(),
        }
    }
}

fn default_reports_dir() -> String {
    "all".into()
}
fn default_ground_truth() -> String {
    "data/ground_truth.json".into()
}
fn default_results_dir() -> String {
    "results".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptSettings {
    /// Name of a built-in prompt version, used when `template_file` is unset.
    #[serde(default = "default_prompt_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_file: Option<String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            version: default_prompt_version(),
            template_file: None,
        }
    }
}

fn default_prompt_version() -> String {
    crate::prompt::DEFAULT_VERSION.into()
}

/// Canonical term -> accepted surface forms, for every text check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchingConfig {
    /// Required output sections for the completeness score.
    #[serde(default = "default_sections")]
    pub sections: BTreeMap<String, Vec<String>>,
    /// Diagnoses that are never appropriate for a pediatric patient.
    #[serde(default = "default_disallowed")]
    pub disallowed: BTreeMap<String, Vec<String>>,
    /// Catalog tallied by the diagnosis-frequency statistic.
    #[serde(default = "default_diagnoses")]
    pub diagnoses: BTreeMap<String, Vec<String>>,
    /// Extra surface forms for expected differentials in ground truth.
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Catalog used when suggesting recommendations for annotation.
    #[serde(default = "default_recommendations")]
    pub recommendations: BTreeMap<String, Vec<String>>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            disallowed: default_disallowed(),
            diagnoses: default_diagnoses(),
            aliases: default_aliases(),
            recommendations: default_recommendations(),
        }
    }
}

impl MatchingConfig {
    pub fn section_matcher(&self) -> TermMatcher {
        TermMatcher::from_map(&self.sections)
    }
    pub fn disallowed_matcher(&self) -> TermMatcher {
        TermMatcher::from_map(&self.disallowed)
    }
    pub fn diagnosis_matcher(&self) -> TermMatcher {
        TermMatcher::from_map(&self.diagnoses)
    }
    pub fn alias_matcher(&self) -> TermMatcher {
        TermMatcher::from_map(&self.aliases)
    }
    pub fn recommendation_matcher(&self) -> TermMatcher {
        TermMatcher::from_map(&self.recommendations)
    }
}

/// `forms` is a `|`-separated list; empty means the name itself.
fn table(entries: &[(&str, &str)]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(name, forms)| {
            let forms: Vec<String> = forms
                .split('|')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect();
            (name.to_string(), forms)
        })
        .collect()
}

fn default_sections() -> BTreeMap<String, Vec<String>> {
    table(&[
        ("clinical_assessment", "clinical assessment"),
        ("differential_diagnosis", "differential diagnosis"),
        ("clinical_correlation", "clinical correlation"),
        ("recommendations", "recommendation"),
    ])
}

fn default_disallowed() -> BTreeMap<String, Vec<String>> {
    table(&[
        ("osteoarthritis", ""),
        ("degenerative changes", "degenerative"),
        ("degenerative disc disease", ""),
        ("rotator cuff", ""),
        ("age-related changes", "age-related|age related"),
        ("wear and tear", ""),
        ("arthropathy", ""),
    ])
}

fn default_diagnoses() -> BTreeMap<String, Vec<String>> {
    table(&[
        ("septic arthritis", ""),
        ("juvenile idiopathic arthritis", "juvenile idiopathic arthritis|jia"),
        ("osteomyelitis", ""),
        ("abscess", ""),
        ("cellulitis", ""),
        ("fracture", ""),
        ("effusion", ""),
        ("inflammation", ""),
        ("infection", ""),
        ("trauma", ""),
        ("normal", ""),
        ("osteoarthritis", ""),
        ("rotator cuff", ""),
        ("degenerative", ""),
    ])
}

fn default_aliases() -> BTreeMap<String, Vec<String>> {
    table(&[
        (
            "Juvenile Idiopathic Arthritis (JIA)",
            "juvenile idiopathic arthritis|jia",
        ),
        ("JIA flare", "jia|juvenile idiopathic arthritis"),
        ("Normal examination", "normal"),
        ("Traumatic effusion", "traumatic effusion|post-traumatic effusion"),
        ("Soft tissue infection", "soft tissue infection|cellulitis"),
        ("Enthesitis-related arthritis", "enthesitis"),
    ])
}

fn default_recommendations() -> BTreeMap<String, Vec<String>> {
    table(&[
        ("MRI if clinical suspicion persists", "mri"),
        ("Ultrasound for effusion/abscess localization", "ultrasound"),
        ("Blood cultures", "blood culture"),
        ("ESR, CRP, CBC", "esr|crp|cbc"),
        ("Joint aspiration if effusion develops", "aspiration"),
        ("Rheumatology referral", "rheumatolog"),
        ("Infectious disease consult", "infectious disease"),
        ("Orthopedics consult", "orthopedic|orthopaedic"),
    ])
}

pub fn load_config(path: &Path, strict: bool) -> Result<PedradConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw, path, strict)
}

pub fn parse_config(raw: &str, path: &Path, strict: bool) -> Result<PedradConfig, ConfigError> {
    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);

    let mut cfg: PedradConfig = serde_ignored::deserialize(deserializer, |p| {
        ignored_keys.insert(p.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    let meaningful_unknowns: Vec<_> = ignored_keys
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();

    if !meaningful_unknowns.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "Unknown fields detected in strict mode: {:?} (file: {})",
                meaningful_unknowns,
                path.display()
            )));
        }
        tracing::warn!(
            event = "pedrad.config.unknown_fields",
            fields = ?meaningful_unknowns,
            file = %path.display(),
            "ignored unknown config fields"
        );
    }

    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }

    validate(&cfg)?;

    let r = path_resolver::PathResolver::new(path);
    r.resolve_str(&mut cfg.paths.reports);
    r.resolve_str(&mut cfg.paths.ground_truth);
    r.resolve_str(&mut cfg.paths.results);
    r.resolve_opt_str(&mut cfg.prompt.template_file);

    Ok(cfg)
}

fn validate(cfg: &PedradConfig) -> Result<(), ConfigError> {
    if cfg.model.timeout_seconds == 0 {
        return Err(ConfigError("model.timeout_seconds must be > 0".into()));
    }
    if !(0.0..=2.0).contains(&cfg.model.temperature) {
        return Err(ConfigError(format!(
            "model.temperature must be within 0.0..=2.0 (got {})",
            cfg.model.temperature
        )));
    }
    if cfg.matching.sections.is_empty() {
        return Err(ConfigError(
            "matching.sections must list at least one section".into(),
        ));
    }
    Ok(())
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, crate::config::SAMPLE_CONFIG)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

pub const SAMPLE_CONFIG: &str = r#"version: 1
model:
  provider: ollama
  name: "llama2:7b"
  base_url: "http://localhost:11434"
  temperature: 0.1
  timeout_seconds: 300
paths:
  reports: all
  ground_truth: data/ground_truth.json
  results: results
prompt:
  version: v1_current
matching:
  sections:
    clinical_assessment: ["clinical assessment"]
    differential_diagnosis: ["differential diagnosis"]
    clinical_correlation: ["clinical correlation"]
    recommendations: ["recommendation"]
  disallowed:
    osteoarthritis: ["osteoarthritis"]
    degenerative changes: ["degenerative"]
    degenerative disc disease: ["degenerative disc disease"]
    rotator cuff: ["rotator cuff"]
    age-related changes: ["age-related", "age related"]
    wear and tear: ["wear and tear"]
    arthropathy: ["arthropathy"]
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses_with_defaults_filled_in() {
        let cfg = parse_config(SAMPLE_CONFIG, Path::new("/tmp/proj/pedrad.yaml"), true).unwrap();
        assert_eq!(cfg.model.name, "llama2:7b");
        assert_eq!(cfg.matching.sections.len(), 4);
        // not in the sample, so the built-in catalog applies
        assert!(cfg.matching.diagnoses.contains_key("septic arthritis"));
        assert_eq!(cfg.paths.reports, "/tmp/proj/all");
        assert_eq!(cfg.paths.ground_truth, "/tmp/proj/data/ground_truth.json");
    }

    #[test]
    fn strict_mode_rejects_unknown_fields() {
        let raw = "version: 1\nmodle:\n  name: x\n";
        let err = parse_config(raw, Path::new("pedrad.yaml"), true).unwrap_err();
        assert!(err.to_string().contains("Unknown fields"));

        // lenient mode only warns
        assert!(parse_config(raw, Path::new("pedrad.yaml"), false).is_ok());
    }

    #[test]
    fn rejects_unsupported_version_and_bad_values() {
        let err = parse_config("version: 7\n", Path::new("p.yaml"), false).unwrap_err();
        assert!(err.to_string().contains("unsupported config version 7"));

        let err = parse_config(
            "version: 1\nmodel:\n  timeout_seconds: 0\n",
            Path::new("p.yaml"),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = parse_config("{}", Path::new("p.yaml"), true).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.prompt.version, "v1_current");
        assert_eq!(cfg.matching, MatchingConfig::default());
    }
}
