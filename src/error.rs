// ============================================================================
// src/error.rs – Failure taxonomy for enumeration and provisioning
// ============================================================================

use thiserror::Error;

use crate::pipeline::PipelineStep;

/// Startup-only failure: the device list could not be produced.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("lsblk unavailable: {0}")]
    Unavailable(String),
    #[error("lsblk failed: {0}")]
    Failed(String),
}

/// A failed provisioning step. Each variant carries the underlying cause
/// captured from the step that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    #[error("invalid permissions: {0}")]
    InvalidPermissions(String),
    #[error("failed to format disk: {0}")]
    FormatFailed(String),
    #[error("failed to create mount point: {0}")]
    MkdirFailed(String),
    #[error("failed to mount disk: {0}")]
    MountFailed(String),
    #[error("failed to get disk UUID: {0}")]
    UuidLookupFailed(String),
    #[error("failed to update fstab: {0}")]
    FstabWriteFailed(String),
    #[error("failed to test mount: {0}")]
    VerifyMountFailed(String),
    /// The worker thread ended without handing back an outcome.
    #[error("provisioning worker exited without reporting: {0}")]
    WorkerLost(String),
}

impl ProvisionError {
    /// Step that failed; `None` when the worker was lost mid-run and the
    /// step is unknown.
    pub fn step(&self) -> Option<PipelineStep> {
        match self {
            ProvisionError::InvalidPermissions(_) => Some(PipelineStep::ParsePermissions),
            ProvisionError::FormatFailed(_) => Some(PipelineStep::Format),
            ProvisionError::MkdirFailed(_) => Some(PipelineStep::CreateMountPoint),
            ProvisionError::MountFailed(_) => Some(PipelineStep::Mount),
            ProvisionError::UuidLookupFailed(_) => Some(PipelineStep::ResolveUuid),
            ProvisionError::FstabWriteFailed(_) => Some(PipelineStep::PersistEntry),
            ProvisionError::VerifyMountFailed(_) => Some(PipelineStep::VerifyMountTable),
            ProvisionError::WorkerLost(_) => None,
        }
    }

    /// The captured cause, without the step prefix.
    pub fn cause(&self) -> &str {
        match self {
            ProvisionError::InvalidPermissions(c)
            | ProvisionError::FormatFailed(c)
            | ProvisionError::MkdirFailed(c)
            | ProvisionError::MountFailed(c)
            | ProvisionError::UuidLookupFailed(c)
            | ProvisionError::FstabWriteFailed(c)
            | ProvisionError::VerifyMountFailed(c)
            | ProvisionError::WorkerLost(c) => c,
        }
    }
}
