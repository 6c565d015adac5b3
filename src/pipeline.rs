// ============================================================================
// src/pipeline.rs – Format → mkdir → mount → UUID → fstab → mount -a
// ============================================================================
//
// Every step is gated on the previous one. There is no retry and no rollback:
// a failure leaves earlier steps in place for the operator to clean up.

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

use crate::devices::DeviceDescriptor;
use crate::error::ProvisionError;
use crate::fstab;
use crate::host::HostOps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    ParsePermissions,
    Format,
    CreateMountPoint,
    Mount,
    ResolveUuid,
    PersistEntry,
    VerifyMountTable,
}

impl PipelineStep {
    pub fn number(self) -> u8 {
        match self {
            PipelineStep::ParsePermissions => 1,
            PipelineStep::Format => 2,
            PipelineStep::CreateMountPoint => 3,
            PipelineStep::Mount => 4,
            PipelineStep::ResolveUuid => 5,
            PipelineStep::PersistEntry => 6,
            PipelineStep::VerifyMountTable => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelineStep::ParsePermissions => "parse permissions",
            PipelineStep::Format => "format device",
            PipelineStep::CreateMountPoint => "create mount point",
            PipelineStep::Mount => "mount device",
            PipelineStep::ResolveUuid => "resolve UUID",
            PipelineStep::PersistEntry => "persist fstab entry",
            PipelineStep::VerifyMountTable => "verify mount table",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.label())
    }
}

/// Everything the operator chose, handed to the pipeline as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub device: DeviceDescriptor,
    pub mount_point: String,
    /// Raw octal text as typed; parsed by the first step.
    pub permissions: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Success,
    Failed(ProvisionError),
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success)
    }

    pub fn failure(&self) -> Option<&ProvisionError> {
        match self {
            PipelineOutcome::Success => None,
            PipelineOutcome::Failed(err) => Some(err),
        }
    }
}

/// Octal file mode, e.g. `"0755"` → `0o755`. Surrounding whitespace is
/// ignored; signs, prefixes and non-octal digits are rejected.
pub fn parse_permissions(text: &str) -> Result<u32, ProvisionError> {
    let digits = text.trim();
    if digits.is_empty() {
        return Err(ProvisionError::InvalidPermissions(
            "empty permission string".to_string(),
        ));
    }
    if let Some(bad) = digits.chars().find(|c| !('0'..='7').contains(c)) {
        return Err(ProvisionError::InvalidPermissions(format!(
            "{digits:?} is not an octal mode (unexpected {bad:?})"
        )));
    }
    u32::from_str_radix(digits, 8)
        .map_err(|e| ProvisionError::InvalidPermissions(format!("{digits:?}: {e}")))
}

fn cause(err: anyhow::Error) -> String {
    format!("{err:#}")
}

/// Run all steps against `host`. Never panics on step failure; the failure
/// comes back as data.
pub fn execute<H: HostOps + ?Sized>(host: &H, request: &ProvisionRequest) -> PipelineOutcome {
    info!(
        device = %request.device,
        mount_point = %request.mount_point,
        "provisioning started"
    );
    match run_steps(host, request) {
        Ok(()) => {
            info!(device = %request.device, "provisioning complete");
            PipelineOutcome::Success
        }
        Err(err) => {
            warn!(step = ?err.step(), error = %err, "provisioning aborted");
            PipelineOutcome::Failed(err)
        }
    }
}

fn run_steps<H: HostOps + ?Sized>(host: &H, request: &ProvisionRequest) -> Result<(), ProvisionError> {
    let device = request.device.path();
    let mount_point = Path::new(&request.mount_point);

    let mode = parse_permissions(&request.permissions)?;
    info!(step = %PipelineStep::ParsePermissions, mode = format_args!("{mode:o}"), "ok");

    host.format_ext4(device)
        .map_err(|e| ProvisionError::FormatFailed(cause(e)))?;
    info!(step = %PipelineStep::Format, "ok");

    host.create_mount_point(mount_point, mode)
        .map_err(|e| ProvisionError::MkdirFailed(cause(e)))?;
    info!(step = %PipelineStep::CreateMountPoint, "ok");

    host.mount(device, mount_point)
        .map_err(|e| ProvisionError::MountFailed(cause(e)))?;
    info!(step = %PipelineStep::Mount, "ok");

    let raw = host
        .filesystem_uuid(device)
        .map_err(|e| ProvisionError::UuidLookupFailed(cause(e)))?;
    let uuid = fstab::parse_uuid(&raw).ok_or_else(|| {
        ProvisionError::UuidLookupFailed(format!(
            "no usable UUID reported for {} (got {:?})",
            request.device,
            raw.trim()
        ))
    })?;
    info!(step = %PipelineStep::ResolveUuid, uuid, "ok");

    host.append_mount_entry(&fstab::entry(uuid, &request.mount_point))
        .map_err(|e| ProvisionError::FstabWriteFailed(cause(e)))?;
    info!(step = %PipelineStep::PersistEntry, "ok");

    host.mount_all()
        .map_err(|e| ProvisionError::VerifyMountFailed(cause(e)))?;
    info!(step = %PipelineStep::VerifyMountTable, "ok");

    Ok(())
}

/// Dispatch one pipeline run on a worker thread. Exactly one outcome is sent
/// on `done`.
pub fn spawn<H>(
    host: Arc<H>,
    request: ProvisionRequest,
    done: Sender<PipelineOutcome>,
) -> Result<JoinHandle<()>>
where
    H: HostOps + Send + Sync + ?Sized + 'static,
{
    thread::Builder::new()
        .name("provision".to_string())
        .spawn(move || {
            let outcome = execute(&*host, &request);
            // Receiver only disappears if the process is already tearing down.
            let _ = done.send(outcome);
        })
        .context("spawn provisioning worker")
}
