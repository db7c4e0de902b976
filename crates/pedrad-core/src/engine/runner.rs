use crate::model::{ModelOutput, Report};
use crate::prompt::PromptTemplate;
use crate::providers::llm::ModelClient;
use crate::storage::batch::BatchWriter;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};

/// Receives each output as soon as it is produced.
pub trait OutputSink {
    fn accept(&mut self, output: &ModelOutput) -> anyhow::Result<()>;
}

impl OutputSink for BatchWriter {
    fn accept(&mut self, output: &ModelOutput) -> anyhow::Result<()> {
        self.append(output)
    }
}

impl OutputSink for Vec<ModelOutput> {
    fn accept(&mut self, output: &ModelOutput) -> anyhow::Result<()> {
        self.push(output.clone());
        Ok(())
    }
}

/// Runs reports through the model one at a time, in input order.
#[derive(Clone)]
pub struct BatchRunner {
    client: Arc<dyn ModelClient>,
    timeout: Duration,
}

impl BatchRunner {
    pub fn new(client: Arc<dyn ModelClient>, timeout_secs: u64) -> Self {
        Self::with_timeout(client, Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(client: Arc<dyn ModelClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn client(&self) -> &Arc<dyn ModelClient> {
        &self.client
    }

    /// Never fails: client errors and timeouts become an output with empty
    /// text and an error marker.
    pub async fn run_one(&self, report: &Report, template: &PromptTemplate) -> ModelOutput {
        let prompt = template.render(report);

        let started = Instant::now();
        let result = timeout(self.timeout, self.client.complete(&prompt)).await;
        let elapsed = started.elapsed().as_secs_f64();

        let (text, error, latency_secs) = match result {
            Ok(Ok(resp)) => (resp.text, None, Some(elapsed)),
            Ok(Err(e)) => (String::new(), Some(format!("{:#}", e)), None),
            Err(_) => (
                String::new(),
                Some(format!("timed out after {}s", self.timeout.as_secs_f64())),
                None,
            ),
        };

        ModelOutput {
            report_id: report.id.clone(),
            text,
            error,
            latency_secs,
            timestamp: Utc::now(),
            model: self.client.model_name().to_string(),
            prompt_version: template.version.clone(),
        }
    }

    /// Processes every report and hands each output to `sink` before moving
    /// on. Only a sink failure aborts the batch.
    pub async fn run_batch(
        &self,
        reports: &[Report],
        template: &PromptTemplate,
        sink: &mut dyn OutputSink,
    ) -> anyhow::Result<Vec<ModelOutput>> {
        let total = reports.len();
        let mut outputs = Vec::with_capacity(total);

        tracing::info!(
            event = "pedrad.batch.start",
            reports = total,
            provider = self.client.provider_name(),
            model = self.client.model_name(),
            prompt_version = %template.version,
            "starting batch"
        );

        for (i, report) in reports.iter().enumerate() {
            let out = self.run_one(report, template).await;
            match (&out.error, out.latency_secs) {
                (Some(err), _) => tracing::warn!(
                    event = "pedrad.batch.report_failed",
                    report_id = %report.id,
                    index = i + 1,
                    total,
                    error = %err,
                    "model call failed"
                ),
                (None, latency) => tracing::info!(
                    event = "pedrad.batch.report_done",
                    report_id = %report.id,
                    index = i + 1,
                    total,
                    latency_secs = latency.unwrap_or_default(),
                    "report processed"
                ),
            }
            sink.accept(&out)?;
            outputs.push(out);
        }

        let failed = outputs.iter().filter(|o| !o.is_success()).count();
        tracing::info!(
            event = "pedrad.batch.finished",
            reports = total,
            failed,
            "batch finished"
        );
        Ok(outputs)
    }
}
