// ============================================================================
// src/util/audit.rs – Append-only record of destructive provisioning runs
// ============================================================================

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    ProvisionStart,
    ProvisionOk,
    ProvisionFail,
}

impl AuditEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditEvent::ProvisionStart => "PROVISION_START",
            AuditEvent::ProvisionOk => "PROVISION_OK",
            AuditEvent::ProvisionFail => "PROVISION_FAIL",
        }
    }
}

/// `key=value` pairs separated by spaces. Values that are empty or contain
/// whitespace or quotes are written as quoted strings so each line splits
/// back into the same fields.
pub fn format_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| {
            if value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == '"') {
                format!("{key}={value:?}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append `[timestamp] EVENT key=value ...` to the audit file (created 0600).
/// An unwritable file never blocks provisioning.
pub fn audit_log(path: &Path, event: AuditEvent, fields: &[(&str, &str)]) {
    let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)
    else {
        tracing::debug!(path = %path.display(), event = event.as_str(), "audit log unwritable");
        return;
    };
    let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%:z");
    let _ = writeln!(file, "[{ts}] {} {}", event.as_str(), format_fields(fields));
}
