use crate::error::{Result, ValidationError};
use serde::{Deserialize, Serialize};

pub const MAX_INACTIVE_DAYS: u32 = 36_500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCriteria {
    pub inactive_days: u32,
    pub require_unused: bool,
    #[serde(default)]
    pub max_storage_bytes: Option<u64>,
    pub exclude_active_subscriptions: bool,
}

impl ScanCriteria {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_INACTIVE_DAYS).contains(&self.inactive_days) {
            return Err(ValidationError::InvalidCriteria {
                message: format!(
                    "inactive_days must be between 1 and {}, got {}",
                    MAX_INACTIVE_DAYS, self.inactive_days
                ),
            }
            .into());
        }
        Ok(())
    }

    pub fn inactivity_threshold(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.inactive_days))
    }

    pub fn exceeds_storage_cap(&self, size: u64) -> bool {
        self.max_storage_bytes.is_some_and(|cap| size > cap)
    }
}

impl Default for ScanCriteria {
    fn default() -> Self {
        Self {
            inactive_days: 90,
            require_unused: true,
            max_storage_bytes: None,
            exclude_active_subscriptions: true,
        }
    }
}
