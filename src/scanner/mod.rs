pub mod audit;
pub mod criteria;
pub mod inactive;
pub mod size;
pub mod token;

pub use audit::{audit, AuditResult, CategoryAudit};
pub use criteria::ScanCriteria;
pub use inactive::{DeletionCandidate, InactivityScanner, ScanOutcome};
pub use size::dir_size;
pub use token::{confirmation_token, is_plausible};
