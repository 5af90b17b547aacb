use crate::error::Result;
use crate::model::Handle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl ActivitySnapshot {
    /// Heartbeat first, then recorded activity, then the given fallback.
    pub fn last_seen_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.last_heartbeat
            .or(self.last_activity)
            .unwrap_or(fallback)
    }
}

#[async_trait]
pub trait ActivityMonitor: Send + Sync {
    async fn last_activity_for(&self, handle: &Handle) -> ActivitySnapshot;
    async fn reset_stats(&self, handle: &Handle) -> Result<()>;
    async fn record_activity(&self, handle: &Handle, at: DateTime<Utc>) -> Result<()>;
    async fn record_heartbeat(&self, handle: &Handle, at: DateTime<Utc>) -> Result<()>;
}

/// Activity statistics persisted as a single JSON map keyed by handle.
#[derive(Debug)]
pub struct JsonActivityMonitor {
    path: PathBuf,
    stats: RwLock<BTreeMap<String, ActivitySnapshot>>,
}

impl JsonActivityMonitor {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stats = match tokio::fs::read(&path).await {
            Ok(content) => serde_json::from_slice(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            stats: RwLock::new(stats),
        })
    }

    async fn persist(&self, stats: &BTreeMap<String, ActivitySnapshot>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(stats)?).await?;
        Ok(())
    }

    async fn update<F>(&self, handle: &Handle, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ActivitySnapshot) + Send,
    {
        let mut stats = self.stats.write().await;
        apply(stats.entry(handle.to_string()).or_default());
        self.persist(&stats).await
    }
}

#[async_trait]
impl ActivityMonitor for JsonActivityMonitor {
    async fn last_activity_for(&self, handle: &Handle) -> ActivitySnapshot {
        self.stats
            .read()
            .await
            .get(handle.as_str())
            .copied()
            .unwrap_or_default()
    }

    async fn reset_stats(&self, handle: &Handle) -> Result<()> {
        let mut stats = self.stats.write().await;
        if stats.remove(handle.as_str()).is_some() {
            self.persist(&stats).await?;
        }
        Ok(())
    }

    async fn record_activity(&self, handle: &Handle, at: DateTime<Utc>) -> Result<()> {
        self.update(handle, |s| s.last_activity = Some(at)).await
    }

    async fn record_heartbeat(&self, handle: &Handle, at: DateTime<Utc>) -> Result<()> {
        self.update(handle, |s| s.last_heartbeat = Some(at)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_last_seen_preference() {
        let now = Utc::now();
        let created = now - Duration::days(100);

        let empty = ActivitySnapshot::default();
        assert_eq!(empty.last_seen_or(created), created);

        let recorded = ActivitySnapshot {
            last_activity: Some(now - Duration::days(10)),
            last_heartbeat: None,
        };
        assert_eq!(recorded.last_seen_or(created), now - Duration::days(10));

        let live = ActivitySnapshot {
            last_activity: Some(now - Duration::days(10)),
            last_heartbeat: Some(now - Duration::days(20)),
        };
        assert_eq!(live.last_seen_or(created), now - Duration::days(20));
    }

    #[tokio::test]
    async fn test_persist_and_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats/activity.json");
        let handle = Handle::parse("alice").unwrap();
        let at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();

        let monitor = JsonActivityMonitor::open(&path).await.unwrap();
        monitor.record_heartbeat(&handle, at).await.unwrap();

        let reopened = JsonActivityMonitor::open(&path).await.unwrap();
        assert_eq!(
            reopened.last_activity_for(&handle).await.last_heartbeat,
            Some(at)
        );

        reopened.reset_stats(&handle).await.unwrap();
        assert_eq!(
            reopened.last_activity_for(&handle).await,
            ActivitySnapshot::default()
        );
        let again = JsonActivityMonitor::open(&path).await.unwrap();
        assert_eq!(again.last_activity_for(&handle).await, ActivitySnapshot::default());
    }
}
