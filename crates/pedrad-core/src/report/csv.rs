use super::{BatchAnalysis, EvaluationReport};
use std::io::Write;

fn na(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "N/A".into())
}

/// One row per batch, in the column layout used for paper tables.
pub fn write_batch_summary<W: Write>(w: W, analyses: &[BatchAnalysis]) -> anyhow::Result<()> {
    let mut out = ::csv::Writer::from_writer(w);
    out.write_record([
        "Batch",
        "Total_Reports",
        "Mean_Time",
        "Median_Time",
        "Throughput_Reports_Per_Min",
        "Mean_Output_Length",
    ])?;
    for a in analyses {
        let s = &a.statistics;
        let t = s.timing.as_ref();
        out.write_record([
            a.label.clone(),
            s.outputs.total.to_string(),
            na(t.map(|t| t.mean), 2),
            na(t.map(|t| t.median), 2),
            na(t.and_then(|t| t.throughput_per_min), 2),
            na(s.output_length.as_ref().map(|l| l.mean), 0),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// One row per evaluated case.
pub fn write_cases<W: Write>(w: W, report: &EvaluationReport) -> anyhow::Result<()> {
    let mut out = ::csv::Writer::from_writer(w);
    out.write_record([
        "report_id",
        "completeness",
        "coverage",
        "differentials_matched",
        "differentials_missed",
        "appropriate",
        "inappropriate_found",
        "latency_secs",
    ])?;
    for r in &report.results {
        out.write_record([
            r.report_id.clone(),
            format!("{:.3}", r.completeness),
            na(r.coverage, 3),
            r.differentials_matched.join("; "),
            r.differentials_missed.join("; "),
            r.appropriate.to_string(),
            r.inappropriate_found.join("; "),
            na(r.latency_secs, 2),
        ])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateStatistics, LengthSummary, OutputCounts};

    #[test]
    fn missing_timing_is_written_as_na() {
        let a = BatchAnalysis {
            label: "20240101_000000".into(),
            source: "x".into(),
            batch: None,
            statistics: AggregateStatistics {
                outputs: OutputCounts {
                    total: 2,
                    successful: 0,
                    failed: 2,
                },
                output_length: Some(LengthSummary {
                    count: 1,
                    mean: 812.4,
                    median: 812.4,
                    min: 812,
                    max: 812,
                }),
                ..Default::default()
            },
        };
        let mut buf = Vec::new();
        write_batch_summary(&mut buf, &[a]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Batch,Total_Reports,Mean_Time,Median_Time,Throughput_Reports_Per_Min,Mean_Output_Length"
        );
        assert_eq!(lines[1], "20240101_000000,2,N/A,N/A,N/A,812");
    }
}
