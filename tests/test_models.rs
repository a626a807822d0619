use chrono::{TimeZone, Utc};
use serde_json::json;

use kubettl_backend::models::{ClusterRecord, RecordFailure, RecordOutcome, SweepAction, SweepReport};
use kubettl_backend::ttl::Phase;

#[test]
fn test_record_reads_document_without_optional_fields() {
    // documents written before stack refs and the notified flag existed
    let doc = json!({
        "id": "7d3c5e2a",
        "name": "demo",
        "numworkers": 1,
        "kubeversion": "1.12",
        "timeout": 10,
        "ttl": 4,
        "owner": "dev@example.com",
        "created": "1555000000"
    });

    let record: ClusterRecord = serde_json::from_value(doc).unwrap();
    assert_eq!(record.created_at, Utc.timestamp_opt(1_555_000_000, 0).unwrap());
    assert!(!record.notified);
    assert!(record.stacks.is_empty());
    assert!(record.has_owner());
    assert_eq!(record.object_key(), "7d3c5e2a.json");
}

#[test]
fn test_sweep_report_json_shape() {
    let mut report = SweepReport::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    report.outcomes.push(RecordOutcome {
        id: "a".to_string(),
        phase: Some(Phase::Expired),
        ttl: Some(-3),
        action: SweepAction::DeletedControlPlane {
            stack: "eksctl-a-cluster".to_string(),
        },
    });
    report.outcomes.push(RecordOutcome {
        id: "b".to_string(),
        phase: None,
        ttl: None,
        action: SweepAction::Vanished,
    });
    report.failures.push(RecordFailure {
        id: "c".to_string(),
        error: "throttled".to_string(),
    });

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(
        value["outcomes"][0],
        json!({
            "id": "a",
            "phase": "expired",
            "ttl": -3,
            "action": "deleted_control_plane",
            "stack": "eksctl-a-cluster"
        })
    );
    assert_eq!(value["outcomes"][1], json!({ "id": "b", "action": "vanished" }));
    assert_eq!(value["failures"][0]["id"], "c");

    assert!(!report.is_success());
    assert_eq!(report.failed_ids(), vec!["c"]);
    assert_eq!(report.destructive_steps(), 1);
}

#[test]
fn test_warned_is_not_destructive() {
    assert!(!SweepAction::Warned.is_destructive());
    assert!(!SweepAction::None.is_destructive());
    assert!(SweepAction::DeletedRecord.is_destructive());
}
