use super::{fmt_num, fmt_pct, BatchAnalysis, EvaluationReport};
use crate::aggregate::AggregateStatistics;
use crate::compare::Comparison;

const RULE: &str = "----------------------------------------------------------------------";

/// `clinical_assessment` -> `Clinical Assessment`
pub fn title(s: &str) -> String {
    s.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(first) => first.to_uppercase().chain(cs).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_line(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

fn push_scores(out: &mut String, s: &AggregateStatistics) {
    push_line(out, format!("Total Cases Evaluated: {}", s.evaluated));
    push_line(out, format!("Average Completeness Score: {}", fmt_pct(s.completeness.mean)));
    push_line(
        out,
        format!(
            "Average Differential Coverage: {} (n={})",
            fmt_pct(s.coverage.mean),
            s.coverage.n
        ),
    );
    push_line(
        out,
        format!("Pediatric Appropriateness Rate: {}", fmt_pct(s.appropriateness.mean)),
    );
    push_line(
        out,
        format!("Cases with Inappropriate Diagnoses: {}", s.inappropriate_cases),
    );
}

fn push_timing(out: &mut String, s: &AggregateStatistics) {
    match &s.timing {
        Some(t) => {
            push_line(out, "Processing Time Statistics:");
            push_line(out, format!("  Mean:       {:.2}s", t.mean));
            push_line(out, format!("  Median:     {:.2}s", t.median));
            push_line(out, format!("  Std Dev:    {:.2}s", t.stddev));
            push_line(out, format!("  Range:      {:.2}s - {:.2}s", t.min, t.max));
            push_line(
                out,
                format!("  Total:      {:.2}s ({:.1} minutes)", t.total, t.total / 60.0),
            );
            push_line(
                out,
                format!(
                    "  Throughput: {} reports/minute",
                    fmt_num(t.throughput_per_min, 1)
                ),
            );
        }
        None => push_line(out, "Processing Time Statistics: no successful calls"),
    }
    if let Some(l) = &s.output_length {
        push_line(out, "Output Length Statistics:");
        push_line(out, format!("  Mean:       {:.0} characters", l.mean));
        push_line(out, format!("  Median:     {:.0} characters", l.median));
        push_line(out, format!("  Range:      {} - {} characters", l.min, l.max));
    }
}

pub fn render_evaluation(report: &EvaluationReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    push_line(&mut out, RULE);
    push_line(&mut out, "EVALUATION REPORT");
    push_line(&mut out, RULE);
    push_line(&mut out, format!("Batch: {} ({})", report.label, report.source));
    push_line(
        &mut out,
        format!(
            "Outputs: {} total, {} successful, {} failed; {} excluded from scoring",
            s.outputs.total,
            s.outputs.successful,
            s.outputs.failed,
            report.excluded.len()
        ),
    );
    out.push('\n');
    push_scores(&mut out, s);

    if !s.section_presence.is_empty() {
        out.push('\n');
        push_line(&mut out, "Section Presence (% of cases):");
        for (section, pct) in &s.section_presence {
            push_line(&mut out, format!("  {:<28} {:>5.1}%", title(section), pct));
        }
    }

    if !s.inappropriate_terms.is_empty() {
        out.push('\n');
        push_line(&mut out, "Inappropriate Diagnoses Found:");
        for (term, count) in &s.inappropriate_terms {
            push_line(&mut out, format!("  {}: {} cases", term, count));
        }
    }

    if !report.results.is_empty() {
        out.push('\n');
        push_line(&mut out, "Individual Cases:");
        for r in &report.results {
            let expected = r.differentials_matched.len() + r.differentials_missed.len();
            push_line(
                &mut out,
                format!(
                    "  {:<24} completeness {:>6}  coverage {:>6} ({}/{}){}",
                    r.report_id,
                    fmt_pct(Some(r.completeness)),
                    fmt_pct(r.coverage),
                    r.differentials_matched.len(),
                    expected,
                    if r.appropriate {
                        String::new()
                    } else {
                        format!("  WARNING inappropriate: {}", r.inappropriate_found.join(", "))
                    }
                ),
            );
        }
    }
    out
}

pub fn render_analysis(a: &BatchAnalysis) -> String {
    let s = &a.statistics;
    let mut out = String::new();
    push_line(&mut out, RULE);
    push_line(&mut out, format!("BATCH: {}", a.label));
    push_line(&mut out, RULE);
    push_line(
        &mut out,
        format!(
            "Total Reports Processed: {} ({} failed)",
            s.outputs.total, s.outputs.failed
        ),
    );
    push_timing(&mut out, s);

    let mut freq: Vec<(&String, &usize)> = s.diagnosis_frequency.iter().filter(|(_, c)| **c > 0).collect();
    // most mentioned first; ties keep name order
    freq.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    if !freq.is_empty() {
        push_line(&mut out, "Diagnosis Mention Frequency:");
        for (name, count) in freq.iter().take(10) {
            let pct = if s.outputs.total > 0 {
                **count as f64 / s.outputs.total as f64 * 100.0
            } else {
                0.0
            };
            push_line(&mut out, format!("  {:<32} {:>4} ({:>5.1}%)", title(name), count, pct));
        }
    }
    out
}

pub fn render_comparison(c: &Comparison) -> String {
    let mut out = String::new();
    let mut header = format!("{:<28}", "Metric");
    for l in &c.labels {
        header.push_str(&format!(" {:>18}", l));
    }
    header.push_str(&format!(" {:>18}", "Winner"));
    push_line(&mut out, &header);
    push_line(&mut out, "-".repeat(header.len()));

    for m in &c.metrics {
        let mut line = format!("{:<28}", title(&m.metric));
        for v in &m.values {
            let cell = if m.metric.ends_with("_secs") || m.metric.starts_with("throughput") {
                fmt_num(*v, 2)
            } else {
                fmt_pct(*v)
            };
            line.push_str(&format!(" {:>18}", cell));
        }
        line.push_str(&format!(" {:>18}", m.winner.to_string()));
        push_line(&mut out, line);
    }
    out
}

pub fn print_evaluation(report: &EvaluationReport) {
    eprint!("{}", render_evaluation(report));
}

pub fn print_analysis(a: &BatchAnalysis) {
    eprint!("{}", render_analysis(a));
}

pub fn print_comparison(c: &Comparison) {
    eprint!("{}", render_comparison(c));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ScoreSummary;

    #[test]
    fn titles_snake_case() {
        assert_eq!(title("clinical_assessment"), "Clinical Assessment");
        assert_eq!(title("septic arthritis"), "Septic Arthritis");
    }

    #[test]
    fn evaluation_summary_shows_no_data_as_na() {
        let report = EvaluationReport {
            schema_version: 1,
            generated_at: chrono::Utc::now(),
            label: "llama2".into(),
            source: "b.jsonl".into(),
            batch: None,
            summary: AggregateStatistics {
                evaluated: 2,
                completeness: ScoreSummary { n: 2, mean: Some(0.875) },
                ..Default::default()
            },
            results: vec![],
            excluded: vec![],
        };
        let text = render_evaluation(&report);
        assert!(text.contains("Average Completeness Score: 87.5%"));
        assert!(text.contains("Average Differential Coverage: n/a (n=0)"));
    }
}
