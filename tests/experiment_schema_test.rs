//! Experiment schema tests: records, scale keys, datasets

use metaheur_results::experiment::{Dataset, ExperimentRecord, ScaleKey};
use metaheur_results::Error;

// =============================================================================
// ExperimentRecord Tests
// =============================================================================

#[test]
fn test_experiment_record_creation() {
    let record = ExperimentRecord::builder("LSCBO-Fixed", 100, 42)
        .metric("Makespan", 9.1e4)
        .metric("LoadBalanceRatio", 0.72)
        .metric("ExecutionTime_ms", 812.0)
        .build()
        .unwrap();

    assert_eq!(record.group_key(), "LSCBO-Fixed");
    assert_eq!(record.scale_key(), &ScaleKey::Numeric(100));
    assert_eq!(record.seed(), 42);
    assert_eq!(record.metric("LoadBalanceRatio"), Some(0.72));
    assert_eq!(record.metric("Energy"), None);
}

#[test]
fn test_experiment_record_last_metric_wins() {
    let record = ExperimentRecord::builder("CBO", 100, 42)
        .metric("Makespan", 1.0)
        .metric("Makespan", 2.0)
        .build()
        .unwrap();
    assert_eq!(record.metric("Makespan"), Some(2.0));
}

#[test]
fn test_experiment_record_rejects_infinity() {
    let result = ExperimentRecord::builder("CBO", 100, 42)
        .metric("Makespan", f64::INFINITY)
        .build();
    assert!(matches!(result, Err(Error::InvalidMetric { .. })));
}

#[test]
fn test_experiment_record_rejects_blank_group() {
    let result = ExperimentRecord::builder("  ", 100, 42).build();
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_experiment_record_serialization() {
    let record = ExperimentRecord::builder("HHO", "edge", 7)
        .metric("Makespan", 123.5)
        .build()
        .unwrap();

    let json = serde_json::to_string(&record).expect("serialization failed");
    let deserialized: ExperimentRecord =
        serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(record, deserialized);
    assert_eq!(deserialized.scale_key(), &ScaleKey::Label("edge".to_string()));
}

#[test]
fn test_scale_key_display() {
    assert_eq!(ScaleKey::Numeric(1000).to_string(), "1000");
    assert_eq!(ScaleKey::from("M=100").to_string(), "M=100");
}

// =============================================================================
// Dataset Tests
// =============================================================================

fn record(group: &str, scale: i64, seed: u64) -> ExperimentRecord {
    ExperimentRecord::builder(group, scale, seed)
        .metric("Makespan", 1.0)
        .build()
        .unwrap()
}

#[test]
fn test_dataset_rejects_empty() {
    assert!(matches!(Dataset::new(vec![]), Err(Error::EmptyDataset)));
}

#[test]
fn test_dataset_shape() {
    let dataset = Dataset::new(vec![
        record("GTO", 1000, 1024),
        record("CBO", 100, 42),
        record("GTO", 100, 42),
        record("AOA", 500, 123),
    ])
    .unwrap();

    assert_eq!(dataset.len(), 4);
    assert!(!dataset.is_empty());
    assert_eq!(dataset.groups(), ["GTO", "CBO", "AOA"]);
    assert_eq!(
        dataset.scales(),
        [ScaleKey::Numeric(100), ScaleKey::Numeric(500), ScaleKey::Numeric(1000)]
    );
    assert_eq!(dataset.seeds(), vec![42, 123, 1024]);
    assert!(dataset.contains_group("AOA"));
    assert!(!dataset.contains_group("HHO"));
    assert_eq!(dataset.of_group("GTO").count(), 2);
}

#[test]
fn test_dataset_summary_serializes() {
    let dataset = Dataset::new(vec![record("CBO", 100, 42)]).unwrap();
    let json = serde_json::to_value(dataset.summary()).unwrap();

    assert_eq!(json["record_count"], 1);
    assert_eq!(json["groups"][0], "CBO");
    assert_eq!(json["scales"][0], 100);
}
