use crate::cli::args::{EvaluateArgs, GlobalArgs};
use anyhow::Context;
use pedrad_core::aggregate::{AggregateStatistics, Aggregator};
use pedrad_core::config::PedradConfig;
use pedrad_core::model::ModelOutput;
use pedrad_core::report::{self, EvaluationReport, REPORT_SCHEMA_VERSION};
use pedrad_core::storage::batch::BatchFile;
use pedrad_core::storage::ground_truth::GroundTruthStore;
use pedrad_metrics::{BatchEvaluation, Evaluator};
use std::path::Path;

use super::exit_codes;

pub fn run(g: &GlobalArgs, args: EvaluateArgs) -> anyhow::Result<i32> {
    let cfg = super::load_config(g)?;
    let truth = load_ground_truth(&cfg, args.ground_truth.as_ref())?;
    let batch = BatchFile::load(&args.batch)?;

    let eval = evaluation_report(&cfg, &batch, &truth);
    let out = args.out.unwrap_or_else(|| {
        report::json::timestamped_path(&super::results_dir(&cfg), "evaluation", "json")
    });
    report::json::write_pretty(&out, &eval)?;

    report::console::print_evaluation(&eval);
    eprintln!("wrote {}", out.display());

    if let Some(md) = &args.markdown {
        super::write_text(md, &report::markdown::evaluation_tables(&eval))?;
    }
    if let Some(csv) = &args.csv {
        write_cases_csv(csv, &eval)?;
    }

    if eval.summary.evaluated == 0 {
        eprintln!(
            "note: no output in {} has annotated ground truth",
            args.batch.display()
        );
    }
    Ok(exit_codes::OK)
}

pub(crate) fn load_ground_truth(
    cfg: &PedradConfig,
    flag: Option<&std::path::PathBuf>,
) -> anyhow::Result<GroundTruthStore> {
    let path = super::ground_truth_path(cfg, flag);
    let store = GroundTruthStore::load(&path)?;
    tracing::info!(
        event = "pedrad.ground_truth.loaded",
        path = %path.display(),
        records = store.len(),
        annotated = store.annotated_count(),
        "ground truth loaded"
    );
    Ok(store)
}

/// Scores `outputs` and aggregates them with the configured catalogs.
pub(crate) fn score(
    cfg: &PedradConfig,
    outputs: &[ModelOutput],
    truth: &GroundTruthStore,
) -> (BatchEvaluation, AggregateStatistics) {
    let evaluation = Evaluator::from_config(&cfg.matching).evaluate_batch(outputs, truth);
    let statistics =
        Aggregator::new(cfg.matching.diagnosis_matcher()).aggregate(outputs, &evaluation.results);
    (evaluation, statistics)
}

pub(crate) fn evaluation_report(
    cfg: &PedradConfig,
    batch: &BatchFile,
    truth: &GroundTruthStore,
) -> EvaluationReport {
    let (evaluation, summary) = score(cfg, &batch.outputs, truth);
    EvaluationReport {
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: chrono::Utc::now(),
        label: batch.label(),
        source: batch.path.display().to_string(),
        batch: batch.header.clone(),
        summary,
        results: evaluation.results,
        excluded: evaluation.excluded,
    }
}

fn write_cases_csv(path: &Path, eval: &EvaluationReport) -> anyhow::Result<()> {
    super::ensure_parent_dir(path)?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    report::csv::write_cases(file, eval)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
