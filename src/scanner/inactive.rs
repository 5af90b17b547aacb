use super::audit::audit;
use super::criteria::ScanCriteria;
use super::size::dir_size;
use super::token::confirmation_token;
use crate::activity::ActivityMonitor;
use crate::directories::{BaselineDirectorySet, DirectoryResolver, UserDirectorySet};
use crate::error::{Error, Result};
use crate::model::{Handle, UserRecord};
use crate::safety::ProtectionChecker;
use crate::store::AccountRepository;
use crate::template::TemplateProvider;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionCandidate {
    pub handle: Handle,
    pub display_name: String,
    pub last_activity: DateTime<Utc>,
    pub days_since_last_activity: i64,
    pub storage_size_bytes: u64,
    pub has_bound_email: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_unused: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub candidates: Vec<DeletionCandidate>,
    pub token: String,
    pub total_bytes: u64,
}

impl ScanOutcome {
    pub fn handles(&self) -> impl Iterator<Item = &Handle> {
        self.candidates.iter().map(|c| &c.handle)
    }
}

struct InactiveUser {
    user: UserRecord,
    dirs: UserDirectorySet,
    last_activity: DateTime<Utc>,
    days_inactive: i64,
}

/// Selects deletion candidates. Scanning never mutates anything.
#[derive(Clone)]
pub struct InactivityScanner {
    accounts: AccountRepository,
    monitor: Arc<dyn ActivityMonitor>,
    template: Arc<dyn TemplateProvider>,
    resolver: DirectoryResolver,
    default_handle: Handle,
    template_handle: Handle,
    workers: usize,
}

impl InactivityScanner {
    pub fn new(
        accounts: AccountRepository,
        monitor: Arc<dyn ActivityMonitor>,
        template: Arc<dyn TemplateProvider>,
        resolver: DirectoryResolver,
        default_handle: Handle,
        template_handle: Handle,
    ) -> Self {
        Self {
            accounts,
            monitor,
            template,
            resolver,
            default_handle,
            template_handle,
            workers: 4,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Protections for a pass run by `caller`, covering the default and
    /// template accounts.
    pub fn protections(&self, caller: Option<&Handle>) -> ProtectionChecker {
        ProtectionChecker::new(caller.cloned(), self.default_handle.clone())
            .with_template(self.template_handle.clone())
    }

    /// Template user directories, limited to what the active template ships.
    pub async fn baseline(&self) -> Result<BaselineDirectorySet> {
        let info = self.template.active_template().await?;
        if !info.exists {
            return Ok(BaselineDirectorySet::empty());
        }

        let dirs = self.resolver.directories_for(&self.template_handle)?;
        Ok(BaselineDirectorySet::from_template(
            dirs,
            &info.populated_categories,
        ))
    }

    pub async fn scan(
        &self,
        caller: Option<&Handle>,
        criteria: &ScanCriteria,
        now: DateTime<Utc>,
    ) -> Result<ScanOutcome> {
        criteria.validate()?;

        let protections = self.protections(caller);
        let threshold = criteria.inactivity_threshold();
        let mut inactive = Vec::new();

        for user in self.accounts.all_users().await? {
            if let Some(protection) = protections.check(&user) {
                tracing::debug!(handle = %user.handle, %protection, "protected, skipped");
                continue;
            }

            if criteria.exclude_active_subscriptions && user.subscription_active(now) {
                tracing::debug!(handle = %user.handle, "active subscription, skipped");
                continue;
            }

            let activity = self.monitor.last_activity_for(&user.handle).await;
            let last_activity = activity.last_seen_or(user.created);
            let elapsed = now - last_activity;
            if elapsed <= threshold {
                continue;
            }

            let dirs = self.resolver.directories_for(&user.handle)?;
            inactive.push(InactiveUser {
                user,
                dirs,
                last_activity,
                days_inactive: elapsed.num_days(),
            });
        }

        let baseline = if criteria.require_unused {
            Some(self.baseline().await?)
        } else {
            None
        };

        let candidates = self.evaluate(inactive, criteria.clone(), baseline).await?;
        let token = confirmation_token(criteria, candidates.iter().map(|c| &c.handle));
        let total_bytes = candidates.iter().map(|c| c.storage_size_bytes).sum();

        tracing::info!(
            candidates = candidates.len(),
            total_bytes,
            inactive_days = criteria.inactive_days,
            "inactive user scan finished"
        );

        Ok(ScanOutcome {
            candidates,
            token,
            total_bytes,
        })
    }

    /// Size and audit fan out over a bounded pool; each user's tree is
    /// walked by a single worker.
    async fn evaluate(
        &self,
        inactive: Vec<InactiveUser>,
        criteria: ScanCriteria,
        baseline: Option<BaselineDirectorySet>,
    ) -> Result<Vec<DeletionCandidate>> {
        if inactive.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.workers;
        let mut candidates = tokio::task::spawn_blocking(move || -> Result<Vec<DeletionCandidate>> {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| Error::Worker(e.to_string()))?;

            Ok(pool.install(|| {
                inactive
                    .into_par_iter()
                    .filter_map(|user| evaluate_user(user, &criteria, baseline.as_ref()))
                    .collect()
            }))
        })
        .await
        .map_err(|e| Error::Worker(e.to_string()))??;

        candidates.sort_by(|a, b| a.handle.cmp(&b.handle));
        Ok(candidates)
    }
}

fn evaluate_user(
    inactive: InactiveUser,
    criteria: &ScanCriteria,
    baseline: Option<&BaselineDirectorySet>,
) -> Option<DeletionCandidate> {
    let InactiveUser {
        user,
        dirs,
        last_activity,
        days_inactive,
    } = inactive;

    let size = dir_size(dirs.root());
    if criteria.exceeds_storage_cap(size) {
        tracing::debug!(handle = %user.handle, size, "over storage cap, skipped");
        return None;
    }

    let is_unused = match baseline {
        Some(baseline) => {
            if !audit(&dirs, baseline).is_unused {
                tracing::debug!(handle = %user.handle, "has own content, skipped");
                return None;
            }
            Some(true)
        }
        None => None,
    };

    Some(DeletionCandidate {
        has_bound_email: user.bound_email().is_some(),
        subscription_expiry: user.expires_at,
        display_name: user.name,
        handle: user.handle,
        last_activity,
        days_since_last_activity: days_inactive,
        storage_size_bytes: size,
        is_unused,
    })
}
