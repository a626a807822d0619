//! Cluster records stored as `<id>.json` objects in one bucket

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, Client};
use tracing::debug;

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use crate::backends::RecordStore;
use crate::models::{id_from_object_key, object_key, ClusterRecord};

pub struct S3RecordStore {
    client: Client,
    bucket: String,
}

impl S3RecordStore {
    pub fn from_context(ctx: &AwsContext, bucket: impl Into<String>) -> Self {
        Self {
            client: ctx.s3_client(),
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl RecordStore for S3RecordStore {
    async fn get(&self, id: &str) -> Result<Option<ClusterRecord>> {
        let key = object_key(id);
        let output = match self.client.get_object().bucket(&self.bucket).key(&key).send().await {
            Ok(output) => output,
            Err(e) if classify_sdk_error(&e).is_not_found() => {
                debug!(bucket = %self.bucket, key = %key, "Record object not found");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to fetch s3://{}/{}", self.bucket, key))
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .with_context(|| format!("Failed to read s3://{}/{}", self.bucket, key))?
            .into_bytes();
        let record = serde_json::from_slice(&bytes)
            .with_context(|| format!("Malformed cluster record in s3://{}/{}", self.bucket, key))?;
        Ok(Some(record))
    }

    async fn put(&self, record: &ClusterRecord) -> Result<()> {
        let key = record.object_key();
        let data = serde_json::to_vec(record).context("Failed to serialize cluster record")?;
        debug!(bucket = %self.bucket, key = %key, size = data.len(), "Uploading record");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type("application/json")
            .send()
            .await
            .with_context(|| format!("Failed to upload s3://{}/{}", self.bucket, key))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let key = object_key(id);
        debug!(bucket = %self.bucket, key = %key, "Deleting record");

        match self.client.delete_object().bucket(&self.bucket).key(&key).send().await {
            Ok(_) => Ok(()),
            Err(e) if classify_sdk_error(&e).is_not_found() => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete s3://{}/{}", self.bucket, key)),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut continuation_token = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to list bucket {}", self.bucket))?;

            ids.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter_map(id_from_object_key)
                    .map(str::to_string),
            );

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        Ok(ids)
    }
}
