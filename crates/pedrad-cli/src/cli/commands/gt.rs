use crate::cli::args::{GlobalArgs, GtArgs, GtSub};
use pedrad_core::annotate::{merge_reviewed, merge_suggestions, Suggester};
use pedrad_core::storage::batch::BatchFile;
use pedrad_core::storage::ground_truth::GroundTruthStore;
use pedrad_core::storage::reports::ReportStore;
use std::collections::BTreeSet;
use std::path::Path;

use super::exit_codes;

pub fn run(g: &GlobalArgs, args: GtArgs) -> anyhow::Result<i32> {
    let cfg = super::load_config(g)?;
    let gt_path = super::ground_truth_path(&cfg, args.ground_truth.as_ref());

    match args.cmd {
        GtSub::Suggest {
            batch,
            out,
            force,
            reports,
        } => {
            if same_file(&out, &gt_path) {
                eprintln!(
                    "config error: --out {} is the ground truth file; suggestions go to a separate file",
                    out.display()
                );
                return Ok(exit_codes::CONFIG_ERROR);
            }
            if out.exists() && !force {
                eprintln!(
                    "config error: {} already exists; merge it first or pass --force",
                    out.display()
                );
                return Ok(exit_codes::CONFIG_ERROR);
            }
            let batch = BatchFile::load(&batch)?;
            let truth = GroundTruthStore::load(&gt_path)?;

            let ids: BTreeSet<String> = batch.outputs.iter().map(|o| o.report_id.clone()).collect();
            let store = ReportStore::new(super::reports_dir(&cfg, reports.as_ref()));
            let loaded = store.load_selected(&ids.into_iter().collect::<Vec<_>>());

            let suggestions = Suggester::from_config(&cfg.matching).suggest(
                &batch.outputs,
                &loaded.reports,
                &truth,
            );
            let report = GroundTruthStore::update(&out, |doc| merge_suggestions(doc, suggestions))?;

            eprintln!(
                "wrote {} suggestions to {}",
                report.added.len() + report.replaced.len(),
                out.display()
            );
            eprintln!(
                "review them, set \"annotated\": true on accepted records, then run: pedrad gt merge --from {}",
                out.display()
            );
        }
        GtSub::Merge { from } => {
            if !from.exists() {
                eprintln!("config error: {} does not exist", from.display());
                return Ok(exit_codes::CONFIG_ERROR);
            }
            let reviewed = GroundTruthStore::load(&from)?;
            let pending = reviewed.len() - reviewed.annotated_count();
            let report = GroundTruthStore::update(&gt_path, |store| merge_reviewed(store, &reviewed))?;
            tracing::info!(
                event = "pedrad.ground_truth.merged",
                added = report.added.len(),
                replaced = report.replaced.len(),
                "merged reviewed records"
            );
            eprintln!(
                "merged into {}: {} added, {} replaced, {} still awaiting review",
                gt_path.display(),
                report.added.len(),
                report.replaced.len(),
                pending
            );
        }
        GtSub::Stats { reports } => {
            let truth = GroundTruthStore::load(&gt_path)?;
            let annotated = truth.annotated_count();
            eprintln!("Ground truth: {}", gt_path.display());
            eprintln!("  Records:           {}", truth.len());
            eprintln!("  Annotated:         {}", annotated);
            eprintln!("  Awaiting review:   {}", truth.len() - annotated);

            let store = ReportStore::new(super::reports_dir(&cfg, reports.as_ref()));
            if store.dir().exists() {
                let ids = store.list_ids()?;
                let done = ids.iter().filter(|id| truth.get_annotated(id).is_some()).count();
                let pct = if ids.is_empty() {
                    0.0
                } else {
                    done as f64 / ids.len() as f64 * 100.0
                };
                eprintln!("  Reports annotated: {} of {} ({:.1}%)", done, ids.len(), pct);
            }
        }
    }
    Ok(exit_codes::OK)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
