//! Prompt experiments: the same reports run once per prompt version.

use super::runner::BatchRunner;
use crate::model::{ModelOutput, Report};
use crate::prompt::PromptTemplate;
use crate::storage::batch::{default_batch_path, BatchHeader, BatchWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ExperimentArm {
    pub prompt_version: String,
    pub outputs: Vec<ModelOutput>,
    /// Set when the arm was persisted to a batch file.
    pub batch_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct ExperimentResult {
    pub arms: Vec<ExperimentArm>,
}

impl ExperimentResult {
    pub fn arm(&self, prompt_version: &str) -> Option<&ExperimentArm> {
        self.arms.iter().find(|a| a.prompt_version == prompt_version)
    }
}

/// Runs every template over `reports`, one after the other. With
/// `results_dir`, each arm is also written to its own batch file.
pub async fn run_experiment(
    runner: &BatchRunner,
    reports: &[Report],
    templates: &[PromptTemplate],
    results_dir: Option<&Path>,
    temperature: f32,
) -> anyhow::Result<ExperimentResult> {
    let mut result = ExperimentResult::default();
    let client = runner.client();

    for template in templates {
        tracing::info!(
            event = "pedrad.experiment.arm",
            prompt_version = %template.version,
            reports = reports.len(),
            "running prompt version"
        );

        let (outputs, batch_path) = match results_dir {
            Some(dir) => {
                let header = BatchHeader::new(
                    client.model_name(),
                    client.provider_name(),
                    template,
                    temperature,
                );
                let path = default_batch_path(dir, &template.version, &header);
                let mut writer = BatchWriter::create_new(&path, &header)?;
                let outputs = runner.run_batch(reports, template, &mut writer).await?;
                (outputs, Some(writer.finish()?))
            }
            None => {
                let mut sink: Vec<ModelOutput> = Vec::new();
                let outputs = runner.run_batch(reports, template, &mut sink).await?;
                (outputs, None)
            }
        };

        result.arms.push(ExperimentArm {
            prompt_version: template.version.clone(),
            outputs,
            batch_path,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::fake::FakeClient;
    use crate::storage::batch::BatchFile;
    use std::sync::Arc;

    fn reports() -> Vec<Report> {
        vec![
            Report {
                id: "a".into(),
                findings: "effusion".into(),
                ..Default::default()
            },
            Report {
                id: "b".into(),
                findings: "normal".into(),
                ..Default::default()
            },
        ]
    }

    #[tokio::test]
    async fn one_arm_per_prompt_version_with_batch_files() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::new(Arc::new(FakeClient::canned("m")), 5);
        let templates = vec![
            crate::prompt::builtin("v1_current").unwrap(),
            crate::prompt::builtin("v3_simplified").unwrap(),
        ];

        let res = run_experiment(&runner, &reports(), &templates, Some(dir.path()), 0.1)
            .await
            .unwrap();

        assert_eq!(res.arms.len(), 2);
        let v3 = res.arm("v3_simplified").unwrap();
        assert_eq!(v3.outputs.len(), 2);
        assert!(v3.outputs.iter().all(|o| o.prompt_version == "v3_simplified"));

        let loaded = BatchFile::load(v3.batch_path.as_ref().unwrap()).unwrap();
        assert_eq!(loaded.header.unwrap().prompt_version, "v3_simplified");
        assert_eq!(loaded.outputs.len(), 2);
    }
}
