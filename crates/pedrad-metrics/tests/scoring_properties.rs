use chrono::Utc;
use pedrad_core::aggregate::Aggregator;
use pedrad_core::config::MatchingConfig;
use pedrad_core::model::{GroundTruthRecord, ModelOutput};
use pedrad_core::storage::ground_truth::GroundTruthStore;
use pedrad_metrics::{default_metrics, Evaluator};

const SECTIONS: &str = "Clinical assessment: effusion. Differential diagnosis: septic arthritis, JIA. \
Clinical correlation: febrile child. Recommendations: aspiration.";

fn output(id: &str, text: &str, latency: f64) -> ModelOutput {
    ModelOutput {
        report_id: id.into(),
        text: text.into(),
        error: None,
        latency_secs: Some(latency),
        timestamp: Utc::now(),
        model: "llama2:7b".into(),
        prompt_version: "v1_current".into(),
    }
}

fn annotated(differentials: &[&str]) -> GroundTruthRecord {
    GroundTruthRecord {
        primary_diagnosis: "Septic arthritis".into(),
        differential_diagnoses: differentials.iter().map(|s| s.to_string()).collect(),
        annotated: true,
        ..Default::default()
    }
}

#[test]
fn three_of_four_osteoarthritis_cases_give_quarter_appropriateness() {
    let cfg = MatchingConfig::default();
    let mut store = GroundTruthStore::new();
    store.merge((1..=4).map(|i| (format!("r{}", i), annotated(&["Septic arthritis"]))));

    let outputs = vec![
        output("r1", &format!("{} Osteoarthritis considered.", SECTIONS), 30.0),
        output("r2", &format!("{} osteoarthritis", SECTIONS), 30.0),
        output("r3", &format!("{} early OSTEOARTHRITIS", SECTIONS), 30.0),
        output("r4", SECTIONS, 30.0),
    ];

    let eval = Evaluator::from_config(&cfg).evaluate_batch(&outputs, &store);
    let stats = Aggregator::new(cfg.diagnosis_matcher()).aggregate(&outputs, &eval.results);

    assert_eq!(stats.appropriateness.mean, Some(0.25));
    assert_eq!(stats.completeness.mean, Some(1.0));
    assert_eq!(stats.coverage.mean, Some(1.0));
    let timing = stats.timing.unwrap();
    assert_eq!(timing.throughput_per_min, Some(4.0 / (120.0 / 60.0)));
}

#[test]
fn empty_differentials_only_drop_out_of_coverage() {
    let cfg = MatchingConfig::default();
    let mut store = GroundTruthStore::new();
    store.merge(vec![
        ("a".to_string(), annotated(&[])),
        ("b".to_string(), annotated(&["Osteomyelitis"])),
    ]);
    let outputs = vec![output("a", SECTIONS, 1.0), output("b", SECTIONS, 1.0)];

    let eval = Evaluator::from_config(&cfg).evaluate_batch(&outputs, &store);
    let stats = Aggregator::new(cfg.diagnosis_matcher()).aggregate(&outputs, &eval.results);

    assert_eq!(stats.evaluated, 2);
    assert_eq!(stats.completeness.n, 2);
    assert_eq!(stats.coverage.n, 1);
    assert_eq!(stats.coverage.mean, Some(0.0));
}

#[test]
fn metric_trait_objects_agree_with_the_evaluator() {
    let cfg = MatchingConfig::default();
    let truth = annotated(&["Septic arthritis", "Osteomyelitis"]);
    let text = "Differential diagnosis: septic arthritis. Rotator cuff tear.";

    let by_name: std::collections::BTreeMap<_, _> = default_metrics(&cfg)
        .iter()
        .map(|m| (m.name(), m.evaluate(text, &truth)))
        .collect();

    let r = Evaluator::from_config(&cfg)
        .evaluate(&output("x", text, 1.0), &truth)
        .unwrap();
    assert_eq!(by_name["section_completeness"].score, Some(r.completeness));
    assert_eq!(by_name["differential_coverage"].score, r.coverage);
    assert!(!by_name["pediatric_appropriateness"].passed);
    assert_eq!(r.inappropriate_found, vec!["rotator cuff".to_string()]);
}
