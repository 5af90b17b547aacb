//! Deletion notices, written as CloudEvents to an outbox directory that a
//! mail relay drains.

use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

const CLOUDEVENT_VERSION: &str = "1.0";
const EVENT_TYPE: &str = "dormant.email";
const EVENT_SOURCE: &str = "dormant";
const DATA_CONTENT_TYPE: &str = "application/json";
const ID_LENGTH: usize = 16;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn is_available(&self) -> bool;

    async fn send_inactive_deletion_notice(
        &self,
        email: &str,
        name: &str,
        days_inactive: i64,
    ) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Template {
    InactiveDeletion,
}

#[derive(Debug, Serialize)]
struct Cloudevent<'a> {
    specversion: &'static str,
    r#type: &'static str,
    source: &'static str,
    id: String,
    time: String,
    datacontenttype: &'static str,
    data: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    to: &'a str,
    template: Template,
    username: &'a str,
    days_inactive: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OutboxNotifier {
    outbox: Option<PathBuf>,
}

impl OutboxNotifier {
    pub fn new(outbox: Option<PathBuf>) -> Self {
        Self { outbox }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    fn event_id(email: &str) -> String {
        let now = Utc::now();
        let mut hasher = Sha256::new();
        hasher.update(email.as_bytes());
        hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..ID_LENGTH].to_string()
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    fn is_available(&self) -> bool {
        self.outbox.is_some()
    }

    async fn send_inactive_deletion_notice(
        &self,
        email: &str,
        name: &str,
        days_inactive: i64,
    ) -> Result<()> {
        let Some(outbox) = &self.outbox else {
            tracing::debug!("outbox not configured, notice dropped");
            return Ok(());
        };

        let event = Cloudevent {
            specversion: CLOUDEVENT_VERSION,
            r#type: EVENT_TYPE,
            source: EVENT_SOURCE,
            id: Self::event_id(email),
            time: Utc::now().to_rfc3339(),
            datacontenttype: DATA_CONTENT_TYPE,
            data: Content {
                to: email,
                template: Template::InactiveDeletion,
                username: name,
                days_inactive,
            },
        };

        tokio::fs::create_dir_all(outbox).await?;
        let path = outbox.join(format!("{}.json", event.id));
        tokio::fs::write(&path, serde_json::to_vec_pretty(&event)?).await?;

        tracing::trace!(path = %path.display(), "deletion notice queued");
        Ok(())
    }
}
