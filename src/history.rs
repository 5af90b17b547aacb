//! Append-only deletion log, one line per removed account:
//! `<rfc3339> <ACTION> <handle>[ size=<bytes>]`.

use crate::error::Result;
use crate::model::Handle;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    /// Removed by a confirmed inactive-user pass.
    DeleteInactive,
    /// Removed by a single-user delete.
    Delete,
}

impl HistoryAction {
    fn tag(self) -> &'static str {
        match self {
            HistoryAction::DeleteInactive => "DELETE_INACTIVE",
            HistoryAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for HistoryAction {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "DELETE_INACTIVE" => Ok(HistoryAction::DeleteInactive),
            "DELETE" => Ok(HistoryAction::Delete),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: HistoryAction,
    pub handle: Handle,
    pub size: Option<u64>,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.timestamp.to_rfc3339(), self.action, self.handle)?;
        if let Some(size) = self.size {
            write!(f, " size={}", size)?;
        }
        Ok(())
    }
}

impl FromStr for HistoryEntry {
    type Err = ();

    fn from_str(line: &str) -> std::result::Result<Self, ()> {
        let mut fields = line.split_whitespace();
        let timestamp = fields
            .next()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .ok_or(())?
            .with_timezone(&Utc);
        let action = fields.next().ok_or(())?.parse()?;
        let handle = fields
            .next()
            .and_then(|h| Handle::parse(h).ok())
            .ok_or(())?;
        let size = fields
            .next()
            .and_then(|s| s.strip_prefix("size="))
            .and_then(|s| s.parse().ok());

        Ok(Self {
            timestamp,
            action,
            handle,
            size,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLogger {
    log_path: PathBuf,
}

impl HistoryLogger {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    pub fn record(&self, action: HistoryAction, handle: &Handle, size: Option<u64>) -> Result<()> {
        let entry = HistoryEntry {
            timestamp: Utc::now(),
            action,
            handle: handle.clone(),
            size,
        };

        if let Some(parent) = self.log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }

    /// Newest entries first. Lines that do not parse are skipped.
    pub fn read_history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        let content = match fs::read_to_string(&self.log_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let entries = content
            .lines()
            .rev()
            .filter_map(|line| line.parse::<HistoryEntry>().ok())
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        Ok(entries)
    }

    /// Removes the log and returns how many entries it held.
    pub fn clear(&self) -> Result<usize> {
        let cleared = self.read_history(None)?.len();
        match fs::remove_file(&self.log_path) {
            Ok(()) => Ok(cleared),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}
