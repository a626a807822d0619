use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use aws_sdk_ses::Client;
use tracing::{debug, info};

use crate::aws::context::AwsContext;
use crate::backends::Notifier;

const CHARSET: &str = "UTF-8";

/// Plain-text email through SES. Without a source address every send is
/// skipped.
pub struct SesNotifier {
    client: Client,
    source: Option<String>,
}

impl SesNotifier {
    pub fn from_context(ctx: &AwsContext, region: &str, source: Option<String>) -> Self {
        Self {
            client: ctx.ses_client(region),
            source: source.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[async_trait]
impl Notifier for SesNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let Some(source) = &self.source else {
            debug!(to = %to, subject = %subject, "No notification address configured, skipping email");
            return Ok(());
        };

        let subject_content = Content::builder()
            .data(subject)
            .charset(CHARSET)
            .build()
            .context("Failed to build email subject")?;
        let body_content = Content::builder()
            .data(body)
            .charset(CHARSET)
            .build()
            .context("Failed to build email body")?;
        let message = Message::builder()
            .subject(subject_content)
            .body(Body::builder().text(body_content).build())
            .build();

        self.client
            .send_email()
            .source(source)
            .destination(Destination::builder().to_addresses(to).build())
            .message(message)
            .send()
            .await
            .with_context(|| format!("Failed to send email to {}", to))?;

        info!(to = %to, subject = %subject, "Notification sent");
        Ok(())
    }
}
