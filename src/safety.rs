use crate::model::{Handle, UserRecord};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Protection {
    SelfAccount,
    DefaultAccount,
    TemplateAccount,
    Admin,
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protection::SelfAccount => write!(f, "caller's own account"),
            Protection::DefaultAccount => write!(f, "default account"),
            Protection::TemplateAccount => write!(f, "template account"),
            Protection::Admin => write!(f, "admin account"),
        }
    }
}

/// Absolute protections that no scan criteria can override.
#[derive(Debug, Clone)]
pub struct ProtectionChecker {
    caller: Option<Handle>,
    default_handle: Handle,
    template_handle: Option<Handle>,
}

impl ProtectionChecker {
    pub fn new(caller: Option<Handle>, default_handle: Handle) -> Self {
        Self {
            caller,
            default_handle,
            template_handle: None,
        }
    }

    /// Also protects the account whose tree is the audit baseline.
    pub fn with_template(mut self, template_handle: Handle) -> Self {
        self.template_handle = Some(template_handle);
        self
    }

    pub fn check(&self, record: &UserRecord) -> Option<Protection> {
        if self.is_caller(&record.handle) {
            return Some(Protection::SelfAccount);
        }

        if self.is_default(&record.handle) {
            return Some(Protection::DefaultAccount);
        }

        if self.template_handle.as_ref() == Some(&record.handle) {
            return Some(Protection::TemplateAccount);
        }

        if record.admin {
            return Some(Protection::Admin);
        }

        None
    }

    pub fn is_caller(&self, handle: &Handle) -> bool {
        self.caller.as_ref() == Some(handle)
    }

    pub fn is_default(&self, handle: &Handle) -> bool {
        &self.default_handle == handle
    }
}
