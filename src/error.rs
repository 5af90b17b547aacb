use crate::model::Handle;
use crate::safety::Protection;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("user not found: {0}")]
    NotFound(Handle),

    #[error("user {handle} is protected ({reason})")]
    Protected { handle: Handle, reason: Protection },

    #[error("path {} escapes the user root {}", path.display(), root.display())]
    PathEscape { path: PathBuf, root: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("could not write config: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("config key {key}: {message}")]
    Config { key: String, message: String },

    #[error("worker pool failed: {0}")]
    Worker(String),
}

/// Reasons a request is rejected before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("a confirmation token is required")]
    MissingToken,

    #[error("a non-negative confirmation count is required")]
    InvalidCount,

    #[error("confirmation token no longer matches the candidate set")]
    StaleToken,

    #[error("confirmation count {supplied} does not match {expected} candidates")]
    CountMismatch { expected: usize, supplied: i64 },

    #[error("supplied candidate handles do not match the confirmation token")]
    CandidateMismatch,

    #[error("invalid criteria: {message}")]
    InvalidCriteria { message: String },

    #[error("invalid handle: {value:?}")]
    InvalidHandle { value: String },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingToken => "missing_token",
            ValidationError::InvalidCount => "invalid_count",
            ValidationError::StaleToken => "stale_token",
            ValidationError::CountMismatch { .. } => "count_mismatch",
            ValidationError::CandidateMismatch => "candidate_mismatch",
            ValidationError::InvalidCriteria { .. } => "invalid_criteria",
            ValidationError::InvalidHandle { .. } => "invalid_handle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_codes_are_machine_readable() {
        let err = ValidationError::CountMismatch {
            expected: 2,
            supplied: 3,
        };
        assert_eq!(err.code(), "count_mismatch");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["reason"], "count_mismatch");
        assert_eq!(json["expected"], 2);
    }

    #[test]
    fn test_validation_converts_into_error() {
        let err: Error = ValidationError::StaleToken.into();
        assert!(matches!(err, Error::Validation(ValidationError::StaleToken)));
        assert!(err.to_string().contains("no longer matches"));
    }
}
