use crate::activity::ActivityMonitor;
use crate::directories::DirectoryResolver;
use crate::error::{Result, ValidationError};
use crate::history::{HistoryAction, HistoryLogger};
use crate::model::{Handle, UserRecord};
use crate::notify::Notifier;
use crate::safety::ProtectionChecker;
use crate::scanner::{confirmation_token, is_plausible, DeletionCandidate, InactivityScanner, ScanCriteria};
use crate::store::AccountRepository;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A destructive pass as submitted by the caller after a preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub criteria: ScanCriteria,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub handles: Option<Vec<Handle>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeStatus {
    Sent,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotFound,
    Protected,
    SubscriptionActive,
    StoreError,
    DirectoryError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedUser {
    pub handle: Handle,
    pub bytes_reclaimed: u64,
    pub notice: NoticeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedUser {
    pub handle: Handle,
    pub reason: FailureReason,
    pub error: String,
    pub notice: NoticeStatus,
}

impl FailedUser {
    fn new(handle: &Handle, reason: FailureReason, error: impl Into<String>) -> Self {
        Self {
            handle: handle.clone(),
            reason,
            error: error.into(),
            notice: NoticeStatus::Skipped,
        }
    }

    fn with_notice(mut self, notice: NoticeStatus) -> Self {
        self.notice = notice;
        self
    }
}

#[derive(Debug, Default)]
pub struct CleanResult {
    pub deleted: Vec<DeletedUser>,
    pub failed: Vec<FailedUser>,
    pub total_freed: u64,
    pub duration: Duration,
}

impl CleanResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.deleted.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Runs the confirmed deletion of inactive users.
#[derive(Clone)]
pub struct BulkDeletionExecutor {
    scanner: InactivityScanner,
    accounts: AccountRepository,
    monitor: Arc<dyn ActivityMonitor>,
    notifier: Arc<dyn Notifier>,
    resolver: DirectoryResolver,
    history: Option<HistoryLogger>,
}

impl BulkDeletionExecutor {
    pub fn new(
        scanner: InactivityScanner,
        accounts: AccountRepository,
        monitor: Arc<dyn ActivityMonitor>,
        notifier: Arc<dyn Notifier>,
        resolver: DirectoryResolver,
    ) -> Self {
        Self {
            scanner,
            accounts,
            monitor,
            notifier,
            resolver,
            history: None,
        }
    }

    pub fn with_history(mut self, history: Option<HistoryLogger>) -> Self {
        self.history = history;
        self
    }

    /// Validates the request against a fresh scan, then deletes every
    /// candidate. Nothing is deleted unless all preconditions hold.
    pub async fn execute(&self, caller: Option<&Handle>, request: &ConfirmRequest) -> Result<CleanResult> {
        let start = Instant::now();

        let token = request
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| is_plausible(token))
            .ok_or(ValidationError::MissingToken)?;
        let count = request
            .count
            .filter(|count| *count >= 0)
            .ok_or(ValidationError::InvalidCount)?;
        request.criteria.validate()?;

        if let Some(handles) = &request.handles {
            if confirmation_token(&request.criteria, handles) != token {
                return Err(ValidationError::CandidateMismatch.into());
            }
        }

        let fresh = self.scanner.scan(caller, &request.criteria, Utc::now()).await?;
        if fresh.token != token {
            tracing::warn!("confirmation token is stale, aborting");
            return Err(ValidationError::StaleToken.into());
        }

        let expected = fresh.candidates.len();
        if i64::try_from(expected).ok() != Some(count) {
            return Err(ValidationError::CountMismatch {
                expected,
                supplied: count,
            }
            .into());
        }

        tracing::info!(candidates = expected, "deletion confirmed");

        let mut result = self
            .delete_candidates(caller, &request.criteria, &fresh.candidates)
            .await;
        result.duration = start.elapsed();

        tracing::info!(
            deleted = result.success_count(),
            failed = result.failed_count(),
            freed = result.total_freed,
            "inactive user deletion finished"
        );

        Ok(result)
    }

    /// Deletes candidates one by one. A failure only affects its own
    /// candidate.
    pub(crate) async fn delete_candidates(
        &self,
        caller: Option<&Handle>,
        criteria: &ScanCriteria,
        candidates: &[DeletionCandidate],
    ) -> CleanResult {
        let protections = self.scanner.protections(caller);
        let mut result = CleanResult::new();

        for candidate in candidates {
            match self.delete_candidate(candidate, &protections, criteria).await {
                Ok(deleted) => {
                    result.total_freed += deleted.bytes_reclaimed;

                    if let Some(history) = &self.history {
                        if let Err(e) = history.record(
                            HistoryAction::DeleteInactive,
                            &deleted.handle,
                            Some(deleted.bytes_reclaimed),
                        ) {
                            tracing::warn!(handle = %deleted.handle, error = %e, "history write failed");
                        }
                    }

                    result.deleted.push(deleted);
                }
                Err(failed) => {
                    tracing::warn!(
                        handle = %failed.handle,
                        reason = ?failed.reason,
                        error = %failed.error,
                        "candidate not deleted"
                    );
                    result.failed.push(failed);
                }
            }
        }

        result
    }

    async fn delete_candidate(
        &self,
        candidate: &DeletionCandidate,
        protections: &ProtectionChecker,
        criteria: &ScanCriteria,
    ) -> std::result::Result<DeletedUser, FailedUser> {
        let handle = &candidate.handle;

        let record = match self.accounts.user(handle).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return Err(FailedUser::new(handle, FailureReason::NotFound, "account no longer exists"))
            }
            Err(e) => return Err(FailedUser::new(handle, FailureReason::StoreError, e.to_string())),
        };

        if let Some(protection) = protections.check(&record) {
            return Err(FailedUser::new(handle, FailureReason::Protected, protection.to_string()));
        }

        if criteria.exclude_active_subscriptions && record.subscription_active(Utc::now()) {
            return Err(FailedUser::new(
                handle,
                FailureReason::SubscriptionActive,
                "subscription became active",
            ));
        }

        let notice = self
            .send_notice(&record, candidate.days_since_last_activity)
            .await;

        if let Err(e) = self.accounts.remove_user(handle).await {
            return Err(FailedUser::new(handle, FailureReason::StoreError, e.to_string()).with_notice(notice));
        }

        if let Err(e) = self.accounts.remove_avatar(handle).await {
            tracing::warn!(%handle, error = %e, "avatar record not removed");
        }

        // The account record is gone at this point and stays gone even if
        // the directory cannot be removed.
        let removed = remove_tree(&self.resolver.root_for(handle)).await;

        if let Err(e) = self.monitor.reset_stats(handle).await {
            tracing::warn!(%handle, error = %e, "activity stats not reset");
        }

        if let Err(e) = removed {
            return Err(FailedUser::new(handle, FailureReason::DirectoryError, e.to_string()).with_notice(notice));
        }

        tracing::info!(%handle, bytes = candidate.storage_size_bytes, "user deleted");

        Ok(DeletedUser {
            handle: handle.clone(),
            bytes_reclaimed: candidate.storage_size_bytes,
            notice,
        })
    }

    async fn send_notice(&self, record: &UserRecord, days_inactive: i64) -> NoticeStatus {
        let Some(email) = record.bound_email() else {
            return NoticeStatus::Skipped;
        };

        if !self.notifier.is_available() {
            return NoticeStatus::Skipped;
        }

        match self
            .notifier
            .send_inactive_deletion_notice(email, &record.name, days_inactive)
            .await
        {
            Ok(()) => NoticeStatus::Sent,
            Err(e) => {
                tracing::warn!(handle = %record.handle, error = %e, "deletion notice failed");
                NoticeStatus::Failed
            }
        }
    }
}

pub(crate) async fn remove_tree(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::JsonActivityMonitor;
    use crate::directories::ContentCategory;
    use crate::error::Error;
    use crate::store::FsStore;
    use crate::template::{TemplateInfo, TemplateProvider};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedTemplate;

    #[async_trait]
    impl TemplateProvider for FixedTemplate {
        async fn active_template(&self) -> Result<TemplateInfo> {
            Ok(TemplateInfo {
                exists: true,
                populated_categories: vec![ContentCategory::Instruct],
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<(String, String, i64)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn is_available(&self) -> bool {
            true
        }

        async fn send_inactive_deletion_notice(&self, email: &str, name: &str, days: i64) -> Result<()> {
            if self.fail {
                return Err(Error::Io(std::io::Error::other("relay down")));
            }
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), name.to_string(), days));
            Ok(())
        }
    }

    struct Fixture {
        dir: TempDir,
        accounts: AccountRepository,
        monitor: Arc<JsonActivityMonitor>,
        notifier: Arc<RecordingNotifier>,
        scanner: InactivityScanner,
        executor: BulkDeletionExecutor,
    }

    impl Fixture {
        async fn new() -> Self {
            Self::with_notifier(RecordingNotifier::default()).await
        }

        async fn with_notifier(notifier: RecordingNotifier) -> Self {
            Self::build(notifier, "default-user").await
        }

        async fn build(notifier: RecordingNotifier, template_handle: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let accounts = AccountRepository::new(Arc::new(FsStore::new(dir.path().join("accounts"))));
            let monitor = Arc::new(
                JsonActivityMonitor::open(dir.path().join("activity.json"))
                    .await
                    .unwrap(),
            );
            let notifier = Arc::new(notifier);
            let resolver = DirectoryResolver::new(dir.path().join("data"));
            let scanner = InactivityScanner::new(
                accounts.clone(),
                monitor.clone(),
                Arc::new(FixedTemplate),
                resolver.clone(),
                Handle::parse("default-user").unwrap(),
                Handle::parse(template_handle).unwrap(),
            );
            let executor = BulkDeletionExecutor::new(
                scanner.clone(),
                accounts.clone(),
                monitor.clone(),
                notifier.clone(),
                resolver,
            )
            .with_history(Some(HistoryLogger::new(dir.path().join("history.log"))));

            Self {
                dir,
                accounts,
                monitor,
                notifier,
                scanner,
                executor,
            }
        }

        async fn user(&self, handle: &str, days_old: i64) -> UserRecord {
            let record = UserRecord::new(
                Handle::parse(handle).unwrap(),
                handle.to_uppercase(),
                Utc::now() - ChronoDuration::days(days_old),
            );
            self.accounts.save_user(&record).await.unwrap();
            record
        }

        fn write(&self, handle: &str, relative: &str, size: usize) {
            let path = self.root(handle).join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, vec![b'x'; size]).unwrap();
        }

        fn root(&self, handle: &str) -> std::path::PathBuf {
            self.dir.path().join("data").join(handle)
        }

        fn criteria() -> ScanCriteria {
            ScanCriteria {
                inactive_days: 60,
                require_unused: true,
                max_storage_bytes: None,
                exclude_active_subscriptions: true,
            }
        }

        async fn preview(&self) -> ConfirmRequest {
            self.preview_with(Self::criteria()).await
        }

        async fn preview_with(&self, criteria: ScanCriteria) -> ConfirmRequest {
            let outcome = self.scanner.scan(None, &criteria, Utc::now()).await.unwrap();
            ConfirmRequest {
                criteria,
                token: Some(outcome.token.clone()),
                count: Some(outcome.candidates.len() as i64),
                handles: None,
            }
        }

        async fn user_count(&self) -> usize {
            self.accounts.all_users().await.unwrap().len()
        }
    }

    #[tokio::test]
    async fn test_scan_then_confirm_deletes_carol() {
        let fx = Fixture::new().await;
        fx.user("default-user", 500).await;
        let carol = fx.user("carol", 120).await.with_email("carol@example.com");
        fx.accounts.save_user(&carol).await.unwrap();
        fx.accounts
            .set_avatar(&carol.handle, serde_json::json!("carol.png"))
            .await
            .unwrap();
        fx.monitor
            .record_activity(&carol.handle, Utc::now() - ChronoDuration::days(90))
            .await
            .unwrap();
        fx.write("default-user", "instruct/preset.json", 32);
        fx.write("carol", "instruct/preset.json", 32);
        fx.user("dave", 10).await;

        let request = fx.preview().await;
        assert_eq!(request.count, Some(1));

        let result = fx.executor.execute(None, &request).await.unwrap();

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failed_count(), 0);
        assert_eq!(result.total_freed, 32);
        assert_eq!(result.deleted[0].handle.as_str(), "carol");
        assert_eq!(result.deleted[0].notice, NoticeStatus::Sent);

        assert!(fx.accounts.user(&carol.handle).await.unwrap().is_none());
        assert!(fx.accounts.avatar(&carol.handle).await.unwrap().is_none());
        assert!(!fx.root("carol").exists());
        assert!(fx.root("default-user").exists());
        assert!(fx
            .monitor
            .last_activity_for(&carol.handle)
            .await
            .last_activity
            .is_none());

        let sent = fx.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![("carol@example.com".to_string(), "CAROL".to_string(), 90)]);

        let history = HistoryLogger::new(fx.dir.path().join("history.log"))
            .read_history(None)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].handle, carol.handle);
    }

    #[tokio::test]
    async fn test_missing_or_placeholder_token_rejected() {
        let fx = Fixture::new().await;
        fx.user("carol", 120).await;

        let mut request = fx.preview().await;
        request.token = None;
        let err = fx.executor.execute(None, &request).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingToken)));

        request.token = Some("abc".to_string());
        let err = fx.executor.execute(None, &request).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingToken)));

        assert_eq!(fx.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_negative_or_missing_count_rejected() {
        let fx = Fixture::new().await;
        fx.user("carol", 120).await;

        let mut request = fx.preview().await;
        request.count = Some(-1);
        let err = fx.executor.execute(None, &request).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::InvalidCount)));

        request.count = None;
        let err = fx.executor.execute(None, &request).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::InvalidCount)));
        assert_eq!(fx.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_stale_token_deletes_nothing() {
        let fx = Fixture::new().await;
        fx.user("carol", 120).await;
        let request = fx.preview().await;

        fx.user("erin", 120).await;

        let err = fx.executor.execute(None, &request).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::StaleToken)));
        assert_eq!(fx.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_changed_criteria_is_stale() {
        let fx = Fixture::new().await;
        fx.user("carol", 120).await;
        let mut request = fx.preview().await;
        request.criteria.inactive_days = 61;

        let err = fx.executor.execute(None, &request).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::StaleToken)));
        assert_eq!(fx.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_count_mismatch_deletes_nothing() {
        let fx = Fixture::new().await;
        fx.user("carol", 120).await;
        fx.user("erin", 120).await;
        let mut request = fx.preview().await;
        request.count = Some(1);

        let err = fx.executor.execute(None, &request).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::CountMismatch {
                expected: 2,
                supplied: 1
            })
        ));
        assert_eq!(fx.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_supplied_handles_must_match_token() {
        let fx = Fixture::new().await;
        fx.user("carol", 120).await;
        fx.user("erin", 120).await;
        let mut request = fx.preview().await;
        request.handles = Some(vec![Handle::parse("carol").unwrap()]);

        let err = fx.executor.execute(None, &request).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::CandidateMismatch)));

        request.handles = Some(vec![
            Handle::parse("erin").unwrap(),
            Handle::parse("carol").unwrap(),
        ]);
        let result = fx.executor.execute(None, &request).await.unwrap();
        assert_eq!(result.success_count(), 2);
    }

    #[tokio::test]
    async fn test_candidates_protected_after_scan_are_skipped() {
        let fx = Fixture::new().await;
        fx.user("carol", 120).await;
        fx.user("erin", 120).await;
        fx.user("frank", 120).await;

        let criteria = Fixture::criteria();
        let outcome = fx.scanner.scan(None, &criteria, Utc::now()).await.unwrap();
        assert_eq!(outcome.candidates.len(), 3);

        let carol = fx.accounts.user(&Handle::parse("carol").unwrap()).await.unwrap().unwrap();
        fx.accounts.save_user(&carol.with_admin(true)).await.unwrap();
        fx.accounts.remove_user(&Handle::parse("erin").unwrap()).await.unwrap();

        let frank = Handle::parse("frank").unwrap();
        let result = fx
            .executor
            .delete_candidates(Some(&frank), &criteria, &outcome.candidates)
            .await;

        assert_eq!(result.success_count(), 0);
        let reasons: Vec<_> = result.failed.iter().map(|f| (f.handle.as_str(), f.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                ("carol", FailureReason::Protected),
                ("erin", FailureReason::NotFound),
                ("frank", FailureReason::Protected),
            ]
        );
        assert_eq!(fx.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_subscription_rechecked_at_deletion_time() {
        let fx = Fixture::new().await;
        fx.user("carol", 120).await;

        let criteria = Fixture::criteria();
        let outcome = fx.scanner.scan(None, &criteria, Utc::now()).await.unwrap();

        let carol = fx.accounts.user(&Handle::parse("carol").unwrap()).await.unwrap().unwrap();
        let renewed = carol.with_expires_at(Some(Utc::now() + ChronoDuration::days(30)));
        fx.accounts.save_user(&renewed).await.unwrap();

        let result = fx.executor.delete_candidates(None, &criteria, &outcome.candidates).await;
        assert_eq!(result.failed[0].reason, FailureReason::SubscriptionActive);
        assert_eq!(fx.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_notice_failure_does_not_block_deletion() {
        let fx = Fixture::with_notifier(RecordingNotifier {
            fail: true,
            ..Default::default()
        })
        .await;
        let carol = fx.user("carol", 120).await.with_email("carol@example.com");
        fx.accounts.save_user(&carol).await.unwrap();
        fx.user("erin", 120).await;

        let request = fx.preview().await;
        let result = fx.executor.execute(None, &request).await.unwrap();

        assert_eq!(result.success_count(), 2);
        let notices: Vec<_> = result.deleted.iter().map(|d| d.notice).collect();
        assert_eq!(notices, vec![NoticeStatus::Failed, NoticeStatus::Skipped]);
    }

    #[tokio::test]
    async fn test_template_account_survives_bulk_deletion() {
        let fx = Fixture::build(RecordingNotifier::default(), "template").await;
        fx.user("default-user", 500).await;
        fx.user("template", 400).await;
        fx.user("carol", 120).await;
        fx.write("template", "instruct/preset.json", 32);
        fx.write("carol", "instruct/preset.json", 32);

        let request = fx.preview().await;
        assert_eq!(request.count, Some(1));
        let result = fx.executor.execute(None, &request).await.unwrap();
        assert_eq!(result.deleted[0].handle.as_str(), "carol");

        // A candidate list naming the template account is refused per user.
        let criteria = Fixture::criteria();
        fx.user("erin", 120).await;
        let mut candidates = fx.scanner.scan(None, &criteria, Utc::now()).await.unwrap().candidates;
        let mut template = candidates[0].clone();
        template.handle = Handle::parse("template").unwrap();
        candidates.push(template);

        let result = fx.executor.delete_candidates(None, &criteria, &candidates).await;
        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failed[0].handle.as_str(), "template");
        assert_eq!(result.failed[0].reason, FailureReason::Protected);
        assert!(fx.accounts.user(&Handle::parse("template").unwrap()).await.unwrap().is_some());
        assert!(fx.root("template").join("instruct/preset.json").exists());
    }

    #[tokio::test]
    async fn test_directory_failure_keeps_record_removed() {
        let fx = Fixture::new().await;
        let carol = fx.user("carol", 120).await;
        fx.user("erin", 120).await;
        fx.monitor
            .record_activity(&carol.handle, Utc::now() - ChronoDuration::days(90))
            .await
            .unwrap();
        fs::create_dir_all(fx.dir.path().join("data")).unwrap();
        fs::write(fx.root("carol"), b"not a directory").unwrap();

        let request = fx
            .preview_with(ScanCriteria {
                require_unused: false,
                ..Fixture::criteria()
            })
            .await;
        assert_eq!(request.count, Some(2));

        let result = fx.executor.execute(None, &request).await.unwrap();

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.deleted[0].handle.as_str(), "erin");
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.failed[0].handle, carol.handle);
        assert_eq!(result.failed[0].reason, FailureReason::DirectoryError);

        assert!(fx.accounts.user(&carol.handle).await.unwrap().is_none());
        assert!(fx
            .monitor
            .last_activity_for(&carol.handle)
            .await
            .last_activity
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_candidate_set_can_be_confirmed() {
        let fx = Fixture::new().await;
        fx.user("dave", 1).await;

        let request = fx.preview().await;
        assert_eq!(request.count, Some(0));

        let result = fx.executor.execute(None, &request).await.unwrap();
        assert_eq!(result.success_count(), 0);
        assert_eq!(result.failed_count(), 0);
    }

    #[test]
    fn test_confirm_request_json() {
        let request: ConfirmRequest = serde_json::from_str(
            r#"{
                "criteria": {
                    "inactiveDays": 60,
                    "requireUnused": true,
                    "maxStorageBytes": null,
                    "excludeActiveSubscriptions": false
                },
                "token": "t",
                "count": 1
            }"#,
        )
        .unwrap();

        assert_eq!(request.criteria.inactive_days, 60);
        assert_eq!(request.count, Some(1));
        assert!(request.handles.is_none());
    }
}
