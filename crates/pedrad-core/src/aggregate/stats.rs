use super::{AggregateStatistics, LengthSummary, OutputCounts, ScoreSummary, TimingSummary};
use crate::matcher::TermMatcher;
use crate::model::{EvaluationResult, ModelOutput};
use std::collections::BTreeMap;

/// Turns a batch of outputs and their evaluations into [`AggregateStatistics`].
///
/// Every floating-point reduction runs over sorted values, so the result does
/// not depend on input order.
pub struct Aggregator {
    diagnoses: TermMatcher,
}

impl Aggregator {
    pub fn new(diagnoses: TermMatcher) -> Self {
        Self { diagnoses }
    }

    pub fn aggregate(
        &self,
        outputs: &[ModelOutput],
        results: &[EvaluationResult],
    ) -> AggregateStatistics {
        let successful = outputs.iter().filter(|o| o.is_success()).count();
        let latencies: Vec<f64> = outputs.iter().filter_map(|o| o.latency_secs).collect();
        let lengths: Vec<usize> = outputs
            .iter()
            .filter_map(|o| o.usable_text())
            .map(|t| t.chars().count())
            .collect();

        let completeness: Vec<f64> = results.iter().map(|r| r.completeness).collect();
        let coverage: Vec<f64> = results.iter().filter_map(|r| r.coverage).collect();
        let appropriate = results.iter().filter(|r| r.appropriate).count();

        let mut section_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut inappropriate_terms: BTreeMap<String, usize> = BTreeMap::new();
        for r in results {
            for (section, present) in &r.sections {
                *section_counts.entry(section.clone()).or_default() += usize::from(*present);
            }
            for term in &r.inappropriate_found {
                *inappropriate_terms.entry(term.clone()).or_default() += 1;
            }
        }
        let section_presence = section_counts
            .into_iter()
            .map(|(k, c)| (k, percent(c, results.len())))
            .collect();

        AggregateStatistics {
            outputs: OutputCounts {
                total: outputs.len(),
                successful,
                failed: outputs.len() - successful,
            },
            timing: timing_summary(&latencies),
            output_length: length_summary(&lengths),
            evaluated: results.len(),
            completeness: score_summary(&completeness),
            coverage: score_summary(&coverage),
            appropriateness: ScoreSummary {
                n: results.len(),
                mean: ratio(appropriate, results.len()),
            },
            inappropriate_cases: results.len() - appropriate,
            section_presence,
            inappropriate_terms,
            diagnosis_frequency: self.diagnosis_frequency(outputs),
        }
    }

    /// Catalog term -> number of outputs mentioning it. Independent of ground
    /// truth; terms never mentioned are reported with 0.
    pub fn diagnosis_frequency(&self, outputs: &[ModelOutput]) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> =
            self.diagnoses.names().map(|n| (n.to_string(), 0)).collect();
        for text in outputs.iter().filter_map(|o| o.usable_text()) {
            for name in self.diagnoses.find_all(text) {
                *counts.entry(name.to_string()).or_default() += 1;
            }
        }
        counts
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut vs = values.to_vec();
    vs.sort_by(f64::total_cmp);
    vs
}

/// `vs` must be sorted and non-empty.
fn mean_of_sorted(vs: &[f64]) -> f64 {
    vs.iter().sum::<f64>() / vs.len() as f64
}

/// `vs` must be sorted and non-empty. Even counts take the mean of the two
/// middle values.
fn median_of_sorted(vs: &[f64]) -> f64 {
    let mid = vs.len() / 2;
    if vs.len() % 2 == 0 {
        (vs[mid - 1] + vs[mid]) / 2.0
    } else {
        vs[mid]
    }
}

/// Sample (n - 1) standard deviation; 0 for a single value.
fn sample_stddev(vs: &[f64], mean: f64) -> f64 {
    if vs.len() < 2 {
        return 0.0;
    }
    let mut sq: Vec<f64> = vs.iter().map(|x| (x - mean).powi(2)).collect();
    sq.sort_by(f64::total_cmp);
    (sq.iter().sum::<f64>() / (vs.len() - 1) as f64).sqrt()
}

pub fn timing_summary(latencies: &[f64]) -> Option<TimingSummary> {
    if latencies.is_empty() {
        return None;
    }
    let vs = sorted(latencies);
    let total: f64 = vs.iter().sum();
    let mean = total / vs.len() as f64;
    Some(TimingSummary {
        count: vs.len(),
        mean,
        median: median_of_sorted(&vs),
        stddev: sample_stddev(&vs, mean),
        min: vs[0],
        max: vs[vs.len() - 1],
        total,
        throughput_per_min: (total > 0.0).then(|| vs.len() as f64 / (total / 60.0)),
    })
}

fn length_summary(lengths: &[usize]) -> Option<LengthSummary> {
    let min = *lengths.iter().min()?;
    let max = *lengths.iter().max()?;
    let vs = sorted(&lengths.iter().map(|&l| l as f64).collect::<Vec<_>>());
    Some(LengthSummary {
        count: vs.len(),
        mean: mean_of_sorted(&vs),
        median: median_of_sorted(&vs),
        min,
        max,
    })
}

fn score_summary(values: &[f64]) -> ScoreSummary {
    if values.is_empty() {
        return ScoreSummary { n: 0, mean: None };
    }
    ScoreSummary {
        n: values.len(),
        mean: Some(mean_of_sorted(&sorted(values))),
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

fn percent(num: usize, den: usize) -> f64 {
    ratio(num, den).map(|r| r * 100.0).unwrap_or(0.0)
}
