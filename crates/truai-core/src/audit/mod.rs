//! # Audit Log
//!
//! Append-only, newline-delimited JSON record of every decision the core
//! makes. Four streams live under the configured data directory:
//!
//! - **audit**: every [`AuditEntry`], the stream of record
//! - **maintenance**: maintenance operations only, written after the audit
//!   stream succeeds
//! - **ai-history**: one shard per day holding AI interactions
//! - **core events**: arbitration decisions, maintenance-mode transitions and
//!   authorization approvals
//!
//! All writes go through one in-process mutex held for the whole record, so
//! concurrent callers never interleave partial lines. The audit stream is
//! written first. A failure there is returned to the caller and nothing else
//! is written; a failure on the maintenance stream or a history shard is
//! logged and reported in the [`AppendReceipt`] only.
//!
//! ## Usage
//!
//! ```no_run
//! use truai_core::audit::{AuditFilter, AuditLog, EntryType, PolicyCheck};
//! use truai_core::CoreConfig;
//!
//! # fn example() -> truai_core::Result<()> {
//! let log = AuditLog::new(&CoreConfig::default());
//!
//! log.log_policy_check(PolicyCheck {
//!     policy_name: "localhost_only".to_string(),
//!     context: serde_json::Value::Null,
//!     result: true,
//!     violations: Vec::new(),
//! })?;
//!
//! let checks = log.query(&AuditFilter::new().by_type(EntryType::PolicyCheck))?;
//! let stats = log.statistics()?;
//! # Ok(())
//! # }
//! ```

mod entry;
mod query;

pub use entry::{
    AiInteraction, AuditEntry, AuditPayload, AuditRecord, CopilotEscalation, CoreEvent,
    CoreEventKind, EntryType, MaintenanceOperation, Outcome, PolicyCheck, SettingProposal,
    UserDecision,
};
pub use query::{AuditFilter, AuditStatistics, StoredEntry};

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::error::{Result, TruAiError};
use crate::types::{now, Timestamp};

/// What happened to one append beyond the primary stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendReceipt {
    /// Timestamp stamped on the written record
    pub timestamp: Timestamp,

    /// Set when the maintenance stream could not be written
    pub maintenance_error: Option<String>,

    /// Set when the AI-history shard could not be written
    pub history_error: Option<String>,
}

impl AppendReceipt {
    /// Whether every stream the entry belongs to was written
    pub fn is_complete(&self) -> bool {
        self.maintenance_error.is_none() && self.history_error.is_none()
    }
}

/// Document produced by [`AuditLog::export`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    pub exported_at: Timestamp,
    pub total_entries: usize,
    pub filters_applied: AuditFilter,
    pub entries: Vec<StoredEntry>,
}

/// Append-only audit store
#[derive(Debug)]
pub struct AuditLog {
    audit_path: PathBuf,
    maintenance_path: PathBuf,
    core_path: PathBuf,
    history_dir: PathBuf,
    recent_limit: usize,
    write_lock: Mutex<()>,
}

impl AuditLog {
    /// Create a log over the streams named in `config`; nothing is touched on disk yet
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            audit_path: config.audit_log_path(),
            maintenance_path: config.maintenance_log_path(),
            core_path: config.core_log_path(),
            history_dir: config.ai_history_dir(),
            recent_limit: config.recent_entries_limit,
            write_lock: Mutex::new(()),
        }
    }

    pub fn audit_path(&self) -> &Path {
        &self.audit_path
    }

    pub fn maintenance_path(&self) -> &Path {
        &self.maintenance_path
    }

    pub fn core_path(&self) -> &Path {
        &self.core_path
    }

    /// How many entries statistics report as recent
    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// Shard file holding AI interactions written on `date`
    pub fn history_shard_path(&self, date: NaiveDate) -> PathBuf {
        self.history_dir
            .join(format!("ai-history-{}.json", date.format("%Y-%m-%d")))
    }

    /// Append one entry to every stream it belongs to
    pub fn append(&self, entry: AuditEntry) -> Result<AppendReceipt> {
        let record = AuditRecord::new(entry);
        let entry_type = record.entry.entry_type();
        let _guard = self.write_lock.lock();

        self.write_line("audit", &self.audit_path, &record)?;

        let mut receipt = AppendReceipt {
            timestamp: record.timestamp,
            maintenance_error: None,
            history_error: None,
        };

        if entry_type == EntryType::MaintenanceOperation {
            if let Err(e) = self.write_line("maintenance", &self.maintenance_path, &record) {
                tracing::warn!(
                    "Maintenance stream write failed ({}): {}",
                    self.maintenance_path.display(),
                    e
                );
                receipt.maintenance_error = Some(e.to_string());
            }
        }

        if entry_type == EntryType::AiInteraction {
            let shard = self.history_shard_path(record.timestamp.date_naive());
            if let Err(e) = self.write_line("ai-history", &shard, &record) {
                tracing::warn!("AI history shard write failed ({}): {}", shard.display(), e);
                receipt.history_error = Some(e.to_string());
            }
        }

        tracing::debug!("Audit entry recorded: {}", entry_type);
        Ok(receipt)
    }

    pub fn log_ai_interaction(&self, interaction: AiInteraction) -> Result<AppendReceipt> {
        self.append(AuditEntry::AiInteraction(interaction))
    }

    pub fn log_maintenance_operation(
        &self,
        operation: MaintenanceOperation,
    ) -> Result<AppendReceipt> {
        self.append(AuditEntry::MaintenanceOperation(operation))
    }

    pub fn log_setting_proposal(&self, proposal: SettingProposal) -> Result<AppendReceipt> {
        self.append(AuditEntry::SettingProposal(proposal))
    }

    pub fn log_policy_check(&self, check: PolicyCheck) -> Result<AppendReceipt> {
        self.append(AuditEntry::PolicyCheck(check))
    }

    pub fn log_copilot_escalation(&self, escalation: CopilotEscalation) -> Result<AppendReceipt> {
        self.append(AuditEntry::CopilotEscalation(escalation))
    }

    /// Append a decision event to the core event stream
    pub fn record_event(&self, kind: CoreEventKind, data: serde_json::Value) -> Result<()> {
        let event = CoreEvent::new(kind, data);
        let _guard = self.write_lock.lock();
        self.write_line("core", &self.core_path, &event)
    }

    /// Entries of the audit stream matching `filter`, oldest first
    pub fn query(&self, filter: &AuditFilter) -> Result<Vec<StoredEntry>> {
        let entries = read_lines::<StoredEntry>("audit", &self.audit_path)?;
        Ok(entries.into_iter().filter(|e| filter.matches(e)).collect())
    }

    /// Entries of the maintenance stream, oldest first
    pub fn maintenance_entries(&self) -> Result<Vec<StoredEntry>> {
        read_lines("maintenance", &self.maintenance_path)
    }

    /// AI interactions recorded in the shard for `date`
    pub fn history_entries(&self, date: NaiveDate) -> Result<Vec<StoredEntry>> {
        read_lines("ai-history", &self.history_shard_path(date))
    }

    /// Events of the core event stream, oldest first
    pub fn events(&self) -> Result<Vec<CoreEvent>> {
        read_lines("core", &self.core_path)
    }

    /// Counts by type and user plus the most recent entries
    pub fn statistics(&self) -> Result<AuditStatistics> {
        let entries = self.query(&AuditFilter::new())?;
        Ok(AuditStatistics::replay(entries, self.recent_limit))
    }

    /// Write the filtered entries to `output` as one pretty-printed document
    pub fn export(&self, output: impl AsRef<Path>, filter: &AuditFilter) -> Result<usize> {
        let entries = self.query(filter)?;
        let export = AuditExport {
            exported_at: now(),
            total_entries: entries.len(),
            filters_applied: filter.clone(),
            entries,
        };

        let content = serde_json::to_string_pretty(&export)?;
        fs::write(output.as_ref(), content)
            .map_err(|e| TruAiError::storage(output.as_ref().display().to_string(), e))?;

        tracing::info!(
            "Exported {} audit entries to {}",
            export.total_entries,
            output.as_ref().display()
        );
        Ok(export.total_entries)
    }

    /// Serialize and append one line; the caller holds the write lock
    fn write_line<T: Serialize>(&self, stream: &str, path: &Path, value: &T) -> Result<()> {
        let mut line = serde_json::to_string(value)?;
        line.push('\n');

        let result = (|| {
            if let Some(dir) = path.parent() {
                if !dir.as_os_str().is_empty() {
                    fs::create_dir_all(dir)?;
                }
            }
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(line.as_bytes())?;
            file.flush()
        })();

        result.map_err(|e| {
            tracing::error!("Audit stream '{}' write failed: {}", stream, e);
            TruAiError::storage(stream, e)
        })
    }
}

/// Read a JSONL stream, skipping blank and malformed lines
fn read_lines<T: for<'de> Deserialize<'de>>(stream: &str, path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|e| TruAiError::storage(stream, e))?;
    let mut items = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!("Skipping malformed line {} of '{}': {}", index + 1, stream, e);
            }
        }
    }

    Ok(items)
}
