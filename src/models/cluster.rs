use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "unknown";
pub const DEFAULT_NUM_WORKERS: u32 = 1;
pub const DEFAULT_KUBE_VERSION: &str = "1.12";
pub const DEFAULT_TIMEOUT_MINUTES: i64 = 10;

/// A tracked cluster, persisted as one JSON document per id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "numworkers")]
    pub num_workers: u32,
    #[serde(rename = "kubeversion")]
    pub kube_version: String,
    /// Total lifetime budget in minutes.
    pub timeout: i64,
    /// Remaining minutes as of the last sweep. Informational only.
    #[serde(default)]
    pub ttl: i64,
    /// Contact address; empty disables notification.
    #[serde(default)]
    pub owner: String,
    #[serde(rename = "created", with = "unix_seconds")]
    pub created_at: DateTime<Utc>,
    /// Set once the heads-up for the current expiry has been sent.
    #[serde(default, skip_serializing_if = "is_false")]
    pub notified: bool,
    #[serde(default, skip_serializing_if = "StackRefs::is_empty")]
    pub stacks: StackRefs,
}

impl ClusterRecord {
    pub fn has_owner(&self) -> bool {
        !self.owner.trim().is_empty()
    }

    /// Store key for this record.
    pub fn object_key(&self) -> String {
        object_key(&self.id)
    }
}

pub fn object_key(id: &str) -> String {
    format!("{}.json", id)
}

/// Inverse of [`object_key`]; `None` for keys that are not records.
pub fn id_from_object_key(key: &str) -> Option<&str> {
    key.strip_suffix(".json").filter(|id| !id.is_empty())
}

/// Infrastructure stack names recorded at provisioning time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRefs {
    #[serde(rename = "controlplane", default, skip_serializing_if = "Option::is_none")]
    pub control_plane: Option<String>,
    #[serde(rename = "dataplane", default, skip_serializing_if = "Option::is_none")]
    pub data_plane: Option<String>,
}

impl StackRefs {
    pub fn is_empty(&self) -> bool {
        self.control_plane.is_none() && self.data_plane.is_none()
    }
}

/// Body of `POST /create`. Every field is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateClusterRequest {
    pub name: Option<String>,
    #[serde(rename = "numworkers")]
    pub num_workers: Option<u32>,
    #[serde(rename = "kubeversion")]
    pub kube_version: Option<String>,
    pub timeout: Option<i64>,
    pub owner: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// `created` is a decimal string of Unix seconds. Plain integers are
/// accepted on read.
mod unix_seconds {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.timestamp().to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        deserializer.deserialize_any(UnixSecondsVisitor)
    }

    struct UnixSecondsVisitor;

    impl UnixSecondsVisitor {
        fn from_secs<E: de::Error>(secs: i64) -> Result<DateTime<Utc>, E> {
            Utc.timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| E::custom(format!("timestamp out of range: {}", secs)))
        }
    }

    impl<'de> Visitor<'de> for UnixSecondsVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("unix seconds as a decimal string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let secs = v
                .trim()
                .parse::<i64>()
                .map_err(|_| E::custom(format!("invalid creation timestamp '{}'", v)))?;
            Self::from_secs(secs)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Self::from_secs(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            let secs = i64::try_from(v).map_err(|_| E::custom("timestamp out of range"))?;
            Self::from_secs(secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ClusterRecord {
        ClusterRecord {
            id: "c0ffee".to_string(),
            name: "demo".to_string(),
            num_workers: 2,
            kube_version: "1.12".to_string(),
            timeout: 20,
            ttl: 20,
            owner: "dev@example.com".to_string(),
            created_at: Utc.timestamp_opt(1_555_000_000, 0).unwrap(),
            notified: false,
            stacks: StackRefs::default(),
        }
    }

    #[test]
    fn test_record_uses_wire_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["created", "id", "kubeversion", "name", "numworkers", "owner", "timeout", "ttl"]
        );
        assert_eq!(value["created"], "1555000000");
    }

    #[test]
    fn test_optional_fields_only_written_when_set() {
        let mut record = sample();
        record.notified = true;
        record.stacks.data_plane = Some("demo-ng".to_string());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["notified"], true);
        assert_eq!(value["stacks"]["dataplane"], "demo-ng");
        assert!(value["stacks"].get("controlplane").is_none());
    }

    #[test]
    fn test_created_accepts_integer() {
        let json = r#"{"id":"a","name":"n","numworkers":1,"kubeversion":"1.12","timeout":10,"ttl":0,"owner":"","created":1555000000}"#;
        let record: ClusterRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.created_at.timestamp(), 1_555_000_000);
    }

    #[test]
    fn test_created_rejects_garbage() {
        let json = r#"{"id":"a","name":"n","numworkers":1,"kubeversion":"1.12","timeout":10,"created":"yesterday"}"#;
        assert!(serde_json::from_str::<ClusterRecord>(json).is_err());
    }

    #[test]
    fn test_object_key_round_trip() {
        assert_eq!(object_key("abc"), "abc.json");
        assert_eq!(id_from_object_key("abc.json"), Some("abc"));
        assert_eq!(id_from_object_key("notes.txt"), None);
        assert_eq!(id_from_object_key(".json"), None);
    }
}
