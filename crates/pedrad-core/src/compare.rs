//! Side-by-side comparison of labelled batches (models or prompt versions).

use crate::aggregate::AggregateStatistics;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum Winner {
    Label(String),
    Tie,
    NoData,
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Label(l) => write!(f, "{}", l),
            Winner::Tie => write!(f, "Tie"),
            Winner::NoData => write!(f, "no data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: String,
    pub direction: Direction,
    /// One value per label, in label order; `None` is "no data".
    pub values: Vec<Option<f64>>,
    pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub labels: Vec<String>,
    pub metrics: Vec<MetricComparison>,
}

const METRICS: &[(&str, Direction)] = &[
    ("completeness", Direction::HigherIsBetter),
    ("differential_coverage", Direction::HigherIsBetter),
    ("pediatric_appropriateness", Direction::HigherIsBetter),
    ("mean_latency_secs", Direction::LowerIsBetter),
    ("throughput_per_min", Direction::HigherIsBetter),
];

fn metric_value(metric: &str, s: &AggregateStatistics) -> Option<f64> {
    match metric {
        "completeness" => s.completeness.mean,
        "differential_coverage" => s.coverage.mean,
        "pediatric_appropriateness" => s.appropriateness.mean,
        "mean_latency_secs" => s.timing.as_ref().map(|t| t.mean),
        "throughput_per_min" => s.timing.as_ref().and_then(|t| t.throughput_per_min),
        _ => None,
    }
}

/// Picks the best label per metric. Labels without data never win; equal
/// best values are a tie.
pub fn compare(labelled: &[(String, AggregateStatistics)]) -> Comparison {
    let metrics = METRICS
        .iter()
        .map(|(name, direction)| {
            let values: Vec<Option<f64>> = labelled
                .iter()
                .map(|(_, s)| metric_value(name, s))
                .collect();
            MetricComparison {
                metric: name.to_string(),
                direction: *direction,
                winner: pick_winner(labelled, &values, *direction),
                values,
            }
        })
        .collect();

    Comparison {
        labels: labelled.iter().map(|(l, _)| l.clone()).collect(),
        metrics,
    }
}

fn pick_winner(
    labelled: &[(String, AggregateStatistics)],
    values: &[Option<f64>],
    direction: Direction,
) -> Winner {
    let present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let best = present.iter().map(|(_, v)| *v).reduce(|a, b| match direction {
        Direction::HigherIsBetter => a.max(b),
        Direction::LowerIsBetter => a.min(b),
    });
    let Some(best) = best else {
        return Winner::NoData;
    };
    let leaders: Vec<usize> = present
        .iter()
        .filter(|(_, v)| *v == best)
        .map(|(i, _)| *i)
        .collect();
    match leaders.as_slice() {
        [only] if labelled.len() > 1 => Winner::Label(labelled[*only].0.clone()),
        [_] => Winner::NoData,
        _ => Winner::Tie,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{ScoreSummary, TimingSummary};

    fn stats(completeness: Option<f64>, latency: Option<f64>) -> AggregateStatistics {
        AggregateStatistics {
            completeness: ScoreSummary {
                n: completeness.map(|_| 10).unwrap_or(0),
                mean: completeness,
            },
            timing: latency.map(|mean| TimingSummary {
                count: 10,
                mean,
                median: mean,
                stddev: 0.0,
                min: mean,
                max: mean,
                total: mean * 10.0,
                throughput_per_min: Some(60.0 / mean),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn higher_completeness_and_lower_latency_win() {
        let c = compare(&[
            ("llama2".into(), stats(Some(0.9), Some(40.0))),
            ("meditron".into(), stats(Some(0.7), Some(20.0))),
        ]);
        let by_name = |n: &str| c.metrics.iter().find(|m| m.metric == n).unwrap().winner.clone();
        assert_eq!(by_name("completeness"), Winner::Label("llama2".into()));
        assert_eq!(by_name("mean_latency_secs"), Winner::Label("meditron".into()));
        assert_eq!(by_name("throughput_per_min"), Winner::Label("meditron".into()));
        assert_eq!(by_name("differential_coverage"), Winner::NoData);
    }

    #[test]
    fn equal_values_tie_and_missing_data_never_wins() {
        let c = compare(&[
            ("a".into(), stats(Some(0.5), None)),
            ("b".into(), stats(Some(0.5), None)),
            ("c".into(), stats(None, None)),
        ]);
        assert_eq!(c.metrics[0].winner, Winner::Tie);
        assert_eq!(c.metrics[0].values, vec![Some(0.5), Some(0.5), None]);

        let c = compare(&[
            ("a".into(), stats(None, None)),
            ("b".into(), stats(Some(0.1), None)),
        ]);
        assert_eq!(c.metrics[0].winner, Winner::Label("b".into()));

        // a single batch is not a comparison
        let c = compare(&[("a".into(), stats(Some(0.9), None))]);
        assert_eq!(c.metrics[0].winner, Winner::NoData);
    }
}
