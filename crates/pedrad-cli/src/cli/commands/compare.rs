use crate::cli::args::{CompareArgs, GlobalArgs};
use pedrad_core::aggregate::AggregateStatistics;
use pedrad_core::compare::{compare, Comparison};
use pedrad_core::config::PedradConfig;
use pedrad_core::report;
use pedrad_core::storage::batch::BatchFile;
use std::path::Path;

use super::exit_codes;

pub fn run(g: &GlobalArgs, args: CompareArgs) -> anyhow::Result<i32> {
    if args.batch.len() < 2 {
        eprintln!("config error: compare needs at least two --batch files");
        return Ok(exit_codes::CONFIG_ERROR);
    }
    let cfg = super::load_config(g)?;
    let truth = super::evaluate::load_ground_truth(&cfg, args.ground_truth.as_ref())?;

    let mut labelled = Vec::with_capacity(args.batch.len());
    for path in &args.batch {
        let batch = BatchFile::load(path)?;
        let (_, stats) = super::evaluate::score(&cfg, &batch.outputs, &truth);
        labelled.push((batch.label(), stats));
    }
    let comparison = compare(&unique_labels(labelled));

    write_comparison(&cfg, &comparison, args.out.as_deref(), args.markdown.as_deref())?;
    Ok(exit_codes::OK)
}

/// Prints the comparison and writes its JSON (and optional Markdown).
pub(crate) fn write_comparison(
    cfg: &PedradConfig,
    comparison: &Comparison,
    out: Option<&Path>,
    markdown: Option<&Path>,
) -> anyhow::Result<()> {
    report::console::print_comparison(comparison);
    let out = out.map(Path::to_path_buf).unwrap_or_else(|| {
        report::json::timestamped_path(&super::results_dir(cfg), "comparison", "json")
    });
    report::json::write_pretty(&out, comparison)?;
    eprintln!("wrote {}", out.display());
    if let Some(md) = markdown {
        super::write_text(md, &report::markdown::comparison_table(comparison))?;
    }
    Ok(())
}

/// Two batches of the same model and prompt would otherwise share a column.
pub(crate) fn unique_labels(
    labelled: Vec<(String, AggregateStatistics)>,
) -> Vec<(String, AggregateStatistics)> {
    let mut seen: Vec<String> = Vec::with_capacity(labelled.len());
    labelled
        .into_iter()
        .map(|(label, stats)| {
            let n = seen.iter().filter(|l| **l == label).count();
            seen.push(label.clone());
            let label = if n == 0 { label } else { format!("{} #{}", label, n + 1) };
            (label, stats)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_labels_get_a_suffix() {
        let s = AggregateStatistics::default();
        let out = unique_labels(vec![
            ("llama2 (v1)".into(), s.clone()),
            ("meditron (v1)".into(), s.clone()),
            ("llama2 (v1)".into(), s),
        ]);
        let labels: Vec<_> = out.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["llama2 (v1)", "meditron (v1)", "llama2 (v1) #2"]);
    }
}
