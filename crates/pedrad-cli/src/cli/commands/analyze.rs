use crate::cli::args::{AnalyzeArgs, GlobalArgs};
use anyhow::Context;
use pedrad_core::aggregate::Aggregator;
use pedrad_core::report::{self, BatchAnalysis};
use pedrad_core::storage::batch::BatchFile;
use std::path::{Path, PathBuf};

use super::exit_codes;

pub fn run(g: &GlobalArgs, args: AnalyzeArgs) -> anyhow::Result<i32> {
    let cfg = super::load_config(g)?;
    let results = super::results_dir(&cfg);

    let files = if args.batch.is_empty() {
        find_batch_files(&results)?
    } else {
        args.batch
    };
    if files.is_empty() {
        eprintln!("config error: no batch files found in {}", results.display());
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let aggregator = Aggregator::new(cfg.matching.diagnosis_matcher());
    let mut analyses = Vec::with_capacity(files.len());
    for path in &files {
        let batch = BatchFile::load(path)?;
        let analysis = BatchAnalysis {
            label: batch.label(),
            source: path.display().to_string(),
            statistics: aggregator.aggregate(&batch.outputs, &[]),
            batch: batch.header,
        };
        report::console::print_analysis(&analysis);
        analyses.push(analysis);
    }

    let out_dir = args.out_dir.unwrap_or(results);
    let json = report::json::timestamped_path(&out_dir, "analysis", "json");
    report::json::write_pretty(&json, &analyses)?;
    eprintln!("wrote {}", json.display());

    let mut md = report::markdown::performance_table(&analyses);
    for a in &analyses {
        md.push('\n');
        md.push_str(&report::markdown::diagnosis_frequency_table(a));
    }
    super::write_text(&report::json::timestamped_path(&out_dir, "analysis", "md"), &md)?;

    let csv = report::json::timestamped_path(&out_dir, "batch_summary", "csv");
    super::ensure_parent_dir(&csv)?;
    let file = std::fs::File::create(&csv)
        .with_context(|| format!("failed to create {}", csv.display()))?;
    report::csv::write_batch_summary(file, &analyses)?;
    eprintln!("wrote {}", csv.display());

    Ok(exit_codes::OK)
}

/// `batch_results_*.jsonl` and legacy `batch_results_*.json`, sorted by name.
fn find_batch_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if name.starts_with("batch_results_") && (name.ends_with(".jsonl") || name.ends_with(".json")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_only_batch_result_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "batch_results_b_1.jsonl",
            "batch_results_a_1.json",
            "evaluation_1.json",
            "batch_results_c.csv",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let names: Vec<String> = find_batch_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["batch_results_a_1.json", "batch_results_b_1.jsonl"]);
        assert!(find_batch_files(&dir.path().join("missing")).unwrap().is_empty());
    }
}
