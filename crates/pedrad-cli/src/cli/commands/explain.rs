use crate::cli::args::{ExplainArgs, GlobalArgs};
use pedrad_core::storage::batch::BatchFile;
use pedrad_core::storage::ground_truth::normalize_id;

use super::exit_codes;

pub fn run(g: &GlobalArgs, args: ExplainArgs) -> anyhow::Result<i32> {
    let cfg = super::load_config(g)?;
    let truth = super::evaluate::load_ground_truth(&cfg, args.ground_truth.as_ref())?;
    let batch = BatchFile::load(&args.batch)?;
    let id = normalize_id(&args.report);

    let Some(output) = batch.outputs.iter().rev().find(|o| o.report_id == id) else {
        eprintln!("config error: {} has no output for report {}", args.batch.display(), id);
        return Ok(exit_codes::CONFIG_ERROR);
    };
    let Some(record) = truth.get(&id) else {
        eprintln!("config error: no ground truth record for report {}", id);
        return Ok(exit_codes::CONFIG_ERROR);
    };
    if !record.annotated {
        eprintln!("note: ground truth for {} is not annotated yet; scores are provisional", id);
    }
    let Some(text) = output.usable_text() else {
        eprintln!(
            "report {}: no output to score ({})",
            id,
            output.error.as_deref().unwrap_or("empty text")
        );
        return Ok(exit_codes::TEST_FAILED);
    };

    let metrics = pedrad_metrics::default_metrics(&cfg.matching);
    let results: Vec<_> = metrics
        .iter()
        .map(|m| (m.name(), m.evaluate(text, record)))
        .collect();

    if args.format == "json" {
        let doc: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|(name, r)| {
                (
                    name.to_string(),
                    serde_json::json!({
                        "score": r.score,
                        "passed": r.passed,
                        "details": r.details,
                    }),
                )
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "report_id": id, "metrics": doc }))?
        );
    } else {
        eprintln!("Report {} ({})", id, batch.label());
        for (name, r) in &results {
            let score = r
                .score
                .map(|s| format!("{:.1}%", s * 100.0))
                .unwrap_or_else(|| "n/a".into());
            eprintln!(
                "  {:<28} {:>6}  {}",
                name,
                score,
                if r.passed { "PASS" } else { "FAIL" }
            );
            eprintln!("    {}", r.details);
        }
    }

    if results.iter().all(|(_, r)| r.passed) {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::TEST_FAILED)
    }
}
