use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::ReconcilerSettings;
use crate::ttl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// S3 records, CloudFormation stacks, SES mail
    Aws,
    /// Everything simulated in process
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(BackendKind::Aws),
            "memory" => Ok(BackendKind::Memory),
            other => Err(anyhow!("Unknown CLUSTER_BACKEND '{}', expected 'aws' or 'memory'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server_address: String,
    pub backend: BackendKind,
    pub aws_region: Option<String>,
    pub metadata_bucket: Option<String>,
    pub notification_address: Option<String>,
    pub ses_region: String,
    pub warning_window_minutes: i64,
    pub reconcile_interval_secs: u64,
    pub reconcile_concurrency: usize,
    pub record_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // .env is only honoured when explicitly requested
        if env::var("USE_DOTENV").ok().as_deref() == Some("true") {
            dotenv::dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match var("CLUSTER_BACKEND") {
            Some(value) => value.parse()?,
            None => BackendKind::Aws,
        };

        let config = Config {
            server_address: var("SERVER_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            backend,
            aws_region: var("AWS_REGION"),
            metadata_bucket: var("CLUSTER_METADATA_BUCKET"),
            notification_address: var("NOTIFICATION_EMAIL_ADDRESS"),
            ses_region: var("SES_REGION").unwrap_or_else(|| "eu-west-1".to_string()),
            warning_window_minutes: parse_or(
                "WARNING_WINDOW_MINUTES",
                var("WARNING_WINDOW_MINUTES"),
                ttl::DEFAULT_WARNING_WINDOW,
            )?,
            reconcile_interval_secs: parse_or("RECONCILE_INTERVAL_SECS", var("RECONCILE_INTERVAL_SECS"), 60)?,
            reconcile_concurrency: parse_or("RECONCILE_CONCURRENCY", var("RECONCILE_CONCURRENCY"), 8)?,
            record_timeout_secs: parse_or(
                "RECONCILE_RECORD_TIMEOUT_SECS",
                var("RECONCILE_RECORD_TIMEOUT_SECS"),
                120,
            )?,
            log_level: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.warning_window_minutes < 0 {
            bail!(
                "WARNING_WINDOW_MINUTES must not be negative, got {}",
                self.warning_window_minutes
            );
        }
        if self.reconcile_concurrency == 0 {
            bail!("RECONCILE_CONCURRENCY must be at least 1");
        }
        if self.backend == BackendKind::Aws && self.metadata_bucket.is_none() {
            bail!("CLUSTER_METADATA_BUCKET is required with the aws backend");
        }
        Ok(())
    }

    /// `None` when the internal schedule is disabled.
    pub fn reconcile_interval(&self) -> Option<Duration> {
        (self.reconcile_interval_secs > 0).then(|| Duration::from_secs(self.reconcile_interval_secs))
    }

    pub fn reconciler_settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            warning_window: self.warning_window_minutes,
            concurrency: self.reconcile_concurrency,
            record_timeout: (self.record_timeout_secs > 0)
                .then(|| Duration::from_secs(self.record_timeout_secs)),
        }
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value '{}' for {}", raw, key)),
        None => Ok(default),
    }
}
