//! Administrative operations over the account store and the user data
//! root, wired from [`Config`].

use crate::activity::{ActivityMonitor, JsonActivityMonitor};
use crate::cleaner::{remove_tree, BulkDeletionExecutor, ConfirmRequest};
use crate::config::Config;
use crate::directories::DirectoryResolver;
use crate::error::{Error, Result};
use crate::history::{HistoryAction, HistoryEntry, HistoryLogger};
use crate::model::{Handle, UserRecord};
use crate::notify::{Notifier, OutboxNotifier};
use crate::output::{AuditReport, ExecutionReport, PreviewReport, SizeReport, UserSummary};
use crate::safety::Protection;
use crate::scanner::{audit, dir_size, InactivityScanner, ScanCriteria};
use crate::store::{AccountRepository, FsStore};
use crate::template::{IndexTemplate, TemplateProvider};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

pub struct ServiceParts {
    pub accounts: AccountRepository,
    pub monitor: Arc<dyn ActivityMonitor>,
    pub template: Arc<dyn TemplateProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub resolver: DirectoryResolver,
    pub default_handle: Handle,
    pub template_handle: Handle,
    pub workers: usize,
    pub history: HistoryLogger,
    pub log_history: bool,
}

pub struct AdminService {
    accounts: AccountRepository,
    monitor: Arc<dyn ActivityMonitor>,
    resolver: DirectoryResolver,
    scanner: InactivityScanner,
    executor: BulkDeletionExecutor,
    history: HistoryLogger,
    log_history: bool,
}

impl AdminService {
    pub fn new(parts: ServiceParts) -> Self {
        let scanner = InactivityScanner::new(
            parts.accounts.clone(),
            parts.monitor.clone(),
            parts.template,
            parts.resolver.clone(),
            parts.default_handle,
            parts.template_handle,
        )
        .with_workers(parts.workers);

        let executor = BulkDeletionExecutor::new(
            scanner.clone(),
            parts.accounts.clone(),
            parts.monitor.clone(),
            parts.notifier,
            parts.resolver.clone(),
        )
        .with_history(parts.log_history.then(|| parts.history.clone()));

        Self {
            accounts: parts.accounts,
            monitor: parts.monitor,
            resolver: parts.resolver,
            scanner,
            executor,
            history: parts.history,
            log_history: parts.log_history,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage = &config.storage;
        let monitor = JsonActivityMonitor::open(storage.activity_file.clone()).await?;

        tracing::debug!(
            data_root = %storage.data_root.display(),
            accounts = %storage.accounts_dir.display(),
            "admin service configured"
        );

        Ok(Self::new(ServiceParts {
            accounts: AccountRepository::new(Arc::new(FsStore::new(storage.accounts_dir.clone()))),
            monitor: Arc::new(monitor),
            template: Arc::new(IndexTemplate::new(storage.template_dir.clone())),
            notifier: Arc::new(OutboxNotifier::new(config.notify.outbox_dir.clone())),
            resolver: DirectoryResolver::new(storage.data_root.clone()),
            default_handle: Handle::parse(&config.accounts.default_handle)?,
            template_handle: Handle::parse(&config.accounts.template_handle)?,
            workers: config.scan.workers,
            history: HistoryLogger::new(storage.history_path()),
            log_history: config.clean.log_history,
        }))
    }

    pub async fn scan_inactive_users(
        &self,
        caller: Option<&Handle>,
        criteria: ScanCriteria,
    ) -> Result<PreviewReport> {
        let start = Instant::now();
        let outcome = self.scanner.scan(caller, &criteria, Utc::now()).await?;
        Ok(PreviewReport::new(
            criteria,
            outcome,
            start.elapsed().as_millis() as u64,
        ))
    }

    pub async fn confirm_delete_inactive_users(
        &self,
        caller: Option<&Handle>,
        request: &ConfirmRequest,
    ) -> Result<ExecutionReport> {
        let result = self.executor.execute(caller, request).await?;
        Ok(ExecutionReport::new(result))
    }

    pub async fn audit_user_usage(&self, handle: &Handle) -> Result<AuditReport> {
        self.require_user(handle).await?;

        let dirs = self.resolver.directories_for(handle)?;
        let baseline = self.scanner.baseline().await?;
        let result = tokio::task::spawn_blocking(move || audit(&dirs, &baseline))
            .await
            .map_err(|e| Error::Worker(e.to_string()))?;

        Ok(AuditReport::new(handle.clone(), result))
    }

    pub async fn compute_storage_size(&self, handle: &Handle) -> Result<SizeReport> {
        self.require_user(handle).await?;

        let root = self.resolver.root_for(handle);
        let walk_root = root.clone();
        let size_bytes = tokio::task::spawn_blocking(move || dir_size(&walk_root))
            .await
            .map_err(|e| Error::Worker(e.to_string()))?;

        Ok(SizeReport {
            handle: handle.clone(),
            root,
            size_bytes,
        })
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let now = Utc::now();
        let mut users = self.accounts.all_users().await?;
        users.sort_by(|a, b| a.handle.cmp(&b.handle));

        let mut summaries = Vec::with_capacity(users.len());
        for user in users {
            let activity = self.monitor.last_activity_for(&user.handle).await;
            let last_seen = activity.last_heartbeat.or(activity.last_activity);
            summaries.push(UserSummary::new(user, last_seen, now));
        }
        Ok(summaries)
    }

    pub async fn disable_user(&self, caller: Option<&Handle>, handle: &Handle) -> Result<UserRecord> {
        self.update_user(caller, handle, &[Protection::SelfAccount], |user| {
            user.enabled = false
        })
        .await
    }

    pub async fn enable_user(&self, caller: Option<&Handle>, handle: &Handle) -> Result<UserRecord> {
        self.update_user(caller, handle, &[], |user| user.enabled = true)
            .await
    }

    pub async fn promote_user(&self, caller: Option<&Handle>, handle: &Handle) -> Result<UserRecord> {
        self.update_user(caller, handle, &[], |user| user.admin = true)
            .await
    }

    pub async fn demote_user(&self, caller: Option<&Handle>, handle: &Handle) -> Result<UserRecord> {
        self.update_user(caller, handle, &[Protection::SelfAccount], |user| {
            user.admin = false
        })
        .await
    }

    /// Removes one account. With `purge` the user's data directory is
    /// removed too and the reclaimed size is returned.
    pub async fn delete_user(
        &self,
        caller: Option<&Handle>,
        handle: &Handle,
        purge: bool,
    ) -> Result<u64> {
        let user = self.require_user(handle).await?;
        self.refuse(
            caller,
            &user,
            &[
                Protection::SelfAccount,
                Protection::DefaultAccount,
                Protection::TemplateAccount,
            ],
        )?;

        let root = self.resolver.root_for(handle);
        let reclaimed = if purge {
            let walk_root = root.clone();
            tokio::task::spawn_blocking(move || dir_size(&walk_root))
                .await
                .map_err(|e| Error::Worker(e.to_string()))?
        } else {
            0
        };

        self.accounts.remove_user(handle).await?;
        self.accounts.remove_avatar(handle).await?;
        if let Err(e) = self.monitor.reset_stats(handle).await {
            tracing::warn!(%handle, error = %e, "activity stats not reset");
        }

        if purge {
            remove_tree(&root).await?;
        }

        tracing::info!(%handle, purge, bytes = reclaimed, "user deleted");

        if self.log_history {
            self.history
                .record(HistoryAction::Delete, handle, purge.then_some(reclaimed))?;
        }

        Ok(reclaimed)
    }

    pub fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        self.history.read_history(limit)
    }

    pub fn clear_history(&self) -> Result<usize> {
        let cleared = self.history.clear()?;
        tracing::info!(entries = cleared, "deletion history cleared");
        Ok(cleared)
    }

    async fn require_user(&self, handle: &Handle) -> Result<UserRecord> {
        self.accounts
            .user(handle)
            .await?
            .ok_or_else(|| Error::NotFound(handle.clone()))
    }

    fn refuse(&self, caller: Option<&Handle>, user: &UserRecord, refused: &[Protection]) -> Result<()> {
        match self.scanner.protections(caller).check(user) {
            Some(reason) if refused.contains(&reason) => Err(Error::Protected {
                handle: user.handle.clone(),
                reason,
            }),
            _ => Ok(()),
        }
    }

    async fn update_user<F>(
        &self,
        caller: Option<&Handle>,
        handle: &Handle,
        refused: &[Protection],
        apply: F,
    ) -> Result<UserRecord>
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut user = self.require_user(handle).await?;
        self.refuse(caller, &user, refused)?;

        apply(&mut user);
        self.accounts.save_user(&user).await?;
        tracing::info!(%handle, admin = user.admin, enabled = user.enabled, "user updated");
        Ok(user)
    }
}
