use std::collections::HashMap;
use std::time::Duration;

use kubettl_backend::config::{BackendKind, Config};

fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_config_default_values() {
    let config = config_from(&[("CLUSTER_BACKEND", "memory")]).unwrap();

    assert_eq!(config.server_address, "0.0.0.0:8080");
    assert_eq!(config.backend, BackendKind::Memory);
    assert_eq!(config.ses_region, "eu-west-1");
    assert_eq!(config.warning_window_minutes, 5);
    assert_eq!(config.reconcile_interval(), Some(Duration::from_secs(60)));
    assert_eq!(config.reconcile_concurrency, 8);
    assert_eq!(config.log_level, "info");
    assert!(config.notification_address.is_none());
    assert!(config.aws_region.is_none());

    let settings = config.reconciler_settings();
    assert_eq!(settings.warning_window, 5);
    assert_eq!(settings.record_timeout, Some(Duration::from_secs(120)));
}

#[test]
fn test_config_overrides() {
    let config = config_from(&[
        ("SERVER_ADDRESS", "127.0.0.1:9000"),
        ("CLUSTER_BACKEND", "AWS"),
        ("AWS_REGION", "us-west-2"),
        ("CLUSTER_METADATA_BUCKET", "eks-cluster-meta"),
        ("NOTIFICATION_EMAIL_ADDRESS", "ttl@example.com"),
        ("SES_REGION", "us-east-1"),
        ("WARNING_WINDOW_MINUTES", "10"),
        ("RECONCILE_CONCURRENCY", "2"),
    ])
    .unwrap();

    assert_eq!(config.server_address, "127.0.0.1:9000");
    assert_eq!(config.backend, BackendKind::Aws);
    assert_eq!(config.aws_region.as_deref(), Some("us-west-2"));
    assert_eq!(config.metadata_bucket.as_deref(), Some("eks-cluster-meta"));
    assert_eq!(config.notification_address.as_deref(), Some("ttl@example.com"));
    assert_eq!(config.ses_region, "us-east-1");
    assert_eq!(config.reconciler_settings().warning_window, 10);
    assert_eq!(config.reconciler_settings().concurrency, 2);
}

#[test]
fn test_aws_backend_requires_bucket() {
    let err = config_from(&[]).unwrap_err();
    assert!(err.to_string().contains("CLUSTER_METADATA_BUCKET"));
}

#[test]
fn test_zero_disables_schedule_and_deadline() {
    let config = config_from(&[
        ("CLUSTER_BACKEND", "memory"),
        ("RECONCILE_INTERVAL_SECS", "0"),
        ("RECONCILE_RECORD_TIMEOUT_SECS", "0"),
    ])
    .unwrap();

    assert_eq!(config.reconcile_interval(), None);
    assert_eq!(config.reconciler_settings().record_timeout, None);
}

#[test]
fn test_invalid_values_are_rejected() {
    let memory = ("CLUSTER_BACKEND", "memory");

    assert!(config_from(&[("CLUSTER_BACKEND", "gcp")]).is_err());
    assert!(config_from(&[memory, ("WARNING_WINDOW_MINUTES", "-1")]).is_err());
    assert!(config_from(&[memory, ("WARNING_WINDOW_MINUTES", "five")]).is_err());
    assert!(config_from(&[memory, ("RECONCILE_CONCURRENCY", "0")]).is_err());
    assert!(config_from(&[memory, ("RECONCILE_INTERVAL_SECS", "-60")]).is_err());
}

#[test]
fn test_blank_values_fall_back_to_defaults() {
    let config = config_from(&[
        ("CLUSTER_BACKEND", "memory"),
        ("NOTIFICATION_EMAIL_ADDRESS", ""),
        ("SES_REGION", "  "),
    ])
    .unwrap();

    assert!(config.notification_address.is_none());
    assert_eq!(config.ses_region, "eu-west-1");
}
