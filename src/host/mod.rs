// ============================================================================
// src/host/mod.rs – Capabilities the provisioning pipeline needs from the OS
// ============================================================================

use anyhow::Result;
use std::path::Path;

mod linux;

#[cfg(test)]
pub mod fake;

pub use linux::LinuxHost;

/// Narrow seam over the destructive system operations. The pipeline owns
/// ordering and failure classification; implementations only do the work.
pub trait HostOps {
    /// Create an ext4 filesystem on `device`, destroying its contents.
    fn format_ext4(&self, device: &Path) -> Result<()>;

    /// Recursively create `path` with `mode`.
    fn create_mount_point(&self, path: &Path, mode: u32) -> Result<()>;

    fn mount(&self, device: &Path, target: &Path) -> Result<()>;

    /// Raw UUID lookup output; the caller decides whether it is usable.
    fn filesystem_uuid(&self, device: &Path) -> Result<String>;

    /// Append one line to the boot-time mount table.
    fn append_mount_entry(&self, line: &str) -> Result<()>;

    /// Mount everything listed in the boot-time mount table.
    fn mount_all(&self) -> Result<()>;
}
