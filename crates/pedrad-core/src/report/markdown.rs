//! Markdown tables for papers and appendices.

use super::console::title;
use super::{fmt_num, fmt_pct, BatchAnalysis, EvaluationReport};
use crate::compare::Comparison;

fn row(cells: &[String]) -> String {
    format!("| {} |\n", cells.join(" | "))
}

fn header(cols: &[&str]) -> String {
    let mut out = row(&cols.iter().map(|c| c.to_string()).collect::<Vec<_>>());
    out.push_str(&row(&cols.iter().map(|_| "---".to_string()).collect::<Vec<_>>()));
    out
}

pub fn evaluation_tables(report: &EvaluationReport) -> String {
    let s = &report.summary;
    let mut md = format!("## Evaluation: {}\n\n", report.label);
    md.push_str(&header(&["Metric", "Value"]));
    md.push_str(&row(&["Total Cases Evaluated".into(), s.evaluated.to_string()]));
    md.push_str(&row(&["Average Completeness Score".into(), fmt_pct(s.completeness.mean)]));
    md.push_str(&row(&["Average Differential Coverage".into(), fmt_pct(s.coverage.mean)]));
    md.push_str(&row(&[
        "Pediatric Appropriateness Rate".into(),
        fmt_pct(s.appropriateness.mean),
    ]));
    md.push_str(&row(&[
        "Cases with Inappropriate Diagnoses".into(),
        s.inappropriate_cases.to_string(),
    ]));

    if !s.section_presence.is_empty() {
        md.push('\n');
        md.push_str(&header(&["Section", "Presence Rate"]));
        for (section, pct) in &s.section_presence {
            md.push_str(&row(&[title(section), format!("{:.1}%", pct)]));
        }
    }

    if !s.inappropriate_terms.is_empty() {
        md.push('\n');
        md.push_str(&header(&["Inappropriate Diagnosis", "Cases"]));
        for (term, count) in &s.inappropriate_terms {
            md.push_str(&row(&[title(term), count.to_string()]));
        }
    }

    if !report.results.is_empty() {
        md.push('\n');
        md.push_str(&header(&[
            "Case",
            "Completeness",
            "Differential Coverage",
            "Pediatric Appropriate",
            "Issues",
        ]));
        for r in &report.results {
            let issues = if r.inappropriate_found.is_empty() {
                "-".to_string()
            } else {
                r.inappropriate_found.join(", ")
            };
            md.push_str(&row(&[
                r.report_id.clone(),
                fmt_pct(Some(r.completeness)),
                fmt_pct(r.coverage),
                (if r.appropriate { "yes" } else { "no" }).to_string(),
                issues,
            ]));
        }
    }
    md
}

pub fn performance_table(analyses: &[BatchAnalysis]) -> String {
    let mut md = String::from("## Processing performance\n\n");
    md.push_str(&header(&[
        "Batch",
        "Reports",
        "Mean Time (s)",
        "Median Time (s)",
        "Std Dev (s)",
        "Throughput (reports/min)",
        "Mean Output Length (chars)",
    ]));
    for a in analyses {
        let s = &a.statistics;
        let t = s.timing.as_ref();
        md.push_str(&row(&[
            a.label.clone(),
            s.outputs.total.to_string(),
            fmt_num(t.map(|t| t.mean), 2),
            fmt_num(t.map(|t| t.median), 2),
            fmt_num(t.map(|t| t.stddev), 2),
            fmt_num(t.and_then(|t| t.throughput_per_min), 1),
            fmt_num(s.output_length.as_ref().map(|l| l.mean), 0),
        ]));
    }
    md
}

pub fn diagnosis_frequency_table(a: &BatchAnalysis) -> String {
    let s = &a.statistics;
    let mut md = format!("## Diagnosis mentions: {}\n\n", a.label);
    md.push_str(&header(&["Diagnosis", "Count", "Percentage"]));
    let mut freq: Vec<_> = s.diagnosis_frequency.iter().filter(|(_, c)| **c > 0).collect();
    freq.sort_by(|x, y| y.1.cmp(x.1).then_with(|| x.0.cmp(y.0)));
    for (name, count) in freq {
        let pct = if s.outputs.total > 0 {
            *count as f64 / s.outputs.total as f64 * 100.0
        } else {
            0.0
        };
        md.push_str(&row(&[title(name), count.to_string(), format!("{:.1}%", pct)]));
    }
    md
}

pub fn comparison_table(c: &Comparison) -> String {
    let mut cols: Vec<&str> = vec!["Metric"];
    cols.extend(c.labels.iter().map(String::as_str));
    cols.push("Winner");
    let mut md = String::from("## Comparison\n\n");
    md.push_str(&header(&cols));
    for m in &c.metrics {
        let mut cells = vec![title(&m.metric)];
        for v in &m.values {
            cells.push(if m.metric.ends_with("_secs") || m.metric.starts_with("throughput") {
                fmt_num(*v, 2)
            } else {
                fmt_pct(*v)
            });
        }
        cells.push(m.winner.to_string());
        md.push_str(&row(&cells));
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateStatistics, OutputCounts, TimingSummary};
    use std::collections::BTreeMap;

    fn analysis() -> BatchAnalysis {
        let mut freq = BTreeMap::new();
        freq.insert("effusion".to_string(), 3);
        freq.insert("septic arthritis".to_string(), 4);
        freq.insert("osteoarthritis".to_string(), 0);
        BatchAnalysis {
            label: "llama2 (v1_current)".into(),
            source: "b.jsonl".into(),
            batch: None,
            statistics: AggregateStatistics {
                outputs: OutputCounts {
                    total: 4,
                    successful: 4,
                    failed: 0,
                },
                timing: Some(TimingSummary {
                    count: 4,
                    mean: 30.0,
                    median: 30.0,
                    stddev: 0.0,
                    min: 30.0,
                    max: 30.0,
                    total: 120.0,
                    throughput_per_min: Some(2.0),
                }),
                diagnosis_frequency: freq,
                ..Default::default()
            },
        }
    }

    #[test]
    fn performance_table_has_one_row_per_batch() {
        let md = performance_table(&[analysis()]);
        assert!(md.contains("| llama2 (v1_current) | 4 | 30.00 | 30.00 | 0.00 | 2.0 | n/a |"));
    }

    #[test]
    fn diagnosis_table_sorted_by_count_and_skips_zeros() {
        let md = diagnosis_frequency_table(&analysis());
        let septic = md.find("Septic Arthritis").unwrap();
        let effusion = md.find("Effusion").unwrap();
        assert!(septic < effusion);
        assert!(!md.contains("Osteoarthritis"));
        assert!(md.contains("| Septic Arthritis | 4 | 100.0% |"));
    }
}
