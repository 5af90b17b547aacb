use crate::cleaner::{CleanResult, ConfirmRequest, DeletedUser, FailedUser};
use crate::directories::ContentCategory;
use crate::model::{Handle, UserRecord};
use crate::scanner::{AuditResult, CategoryAudit, DeletionCandidate, ScanCriteria, ScanOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

const REPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub criteria: ScanCriteria,
    pub candidates: Vec<DeletionCandidate>,
    pub count: usize,
    pub total_storage_bytes: u64,
    pub confirmation_token: String,
    pub scan_duration_ms: u64,
}

impl PreviewReport {
    pub fn new(criteria: ScanCriteria, outcome: ScanOutcome, duration_ms: u64) -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            criteria,
            count: outcome.candidates.len(),
            total_storage_bytes: outcome.total_bytes,
            candidates: outcome.candidates,
            confirmation_token: outcome.token,
            scan_duration_ms: duration_ms,
        }
    }

    /// The request that confirms exactly this preview.
    pub fn confirm_request(&self) -> ConfirmRequest {
        ConfirmRequest {
            criteria: self.criteria.clone(),
            token: Some(self.confirmation_token.clone()),
            count: i64::try_from(self.count).ok(),
            handles: Some(self.candidates.iter().map(|c| c.handle.clone()).collect()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Partial,
    Failed,
}

impl ExecutionStatus {
    pub fn from_counts(deleted: usize, failed: usize) -> Self {
        if failed == 0 {
            ExecutionStatus::Success
        } else if deleted > 0 {
            ExecutionStatus::Partial
        } else {
            ExecutionStatus::Failed
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub deleted_count: usize,
    pub failed_count: usize,
    pub total_freed_bytes: u64,
    pub deleted: Vec<DeletedUser>,
    pub failed: Vec<FailedUser>,
    pub duration_ms: u64,
}

impl ExecutionReport {
    pub fn new(result: CleanResult) -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            status: ExecutionStatus::from_counts(result.success_count(), result.failed_count()),
            deleted_count: result.success_count(),
            failed_count: result.failed_count(),
            total_freed_bytes: result.total_freed,
            duration_ms: result.duration.as_millis() as u64,
            deleted: result.deleted,
            failed: result.failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffendingContent {
    pub category: ContentCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub handle: Handle,
    pub is_unused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_offending: Option<OffendingContent>,
    pub details: BTreeMap<ContentCategory, CategoryAudit>,
}

impl AuditReport {
    pub fn new(handle: Handle, result: AuditResult) -> Self {
        let first_offending = result
            .first_offending()
            .map(|(category, audit)| OffendingContent {
                category,
                example: audit.example.clone(),
            });

        Self {
            version: REPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            handle,
            is_unused: result.is_unused,
            first_offending,
            details: result.details,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeReport {
    pub handle: Handle,
    pub root: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub handle: Handle,
    pub name: String,
    pub admin: bool,
    pub enabled: bool,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub subscription_active: bool,
    pub has_bound_email: bool,
    pub has_password: bool,
}

impl UserSummary {
    pub fn new(user: UserRecord, last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        Self {
            subscription_active: user.subscription_active(now),
            has_bound_email: user.bound_email().is_some(),
            has_password: user.has_password(),
            subscription_expiry: user.expires_at,
            last_activity,
            created: user.created,
            enabled: user.enabled,
            admin: user.admin,
            name: user.name,
            handle: user.handle,
        }
    }
}
