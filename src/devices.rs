// ============================================================================
// src/devices.rs – Block device enumeration (lsblk)
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::cmd::base::resolve_binary;
use crate::cmd::Cmd;
use crate::config::Config;
use crate::error::EnumerationError;

const LSBLK_BINARIES: &[&str] = &["/bin/lsblk", "/usr/bin/lsblk"];

/// One block device offered by the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    path: PathBuf,
}

impl DeviceDescriptor {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Ask lsblk for top-level device names (no headers) and root them under
/// `devices.root`.
pub fn list_devices(cfg: &Config) -> Result<Vec<DeviceDescriptor>, EnumerationError> {
    let binary =
        resolve_binary(LSBLK_BINARIES).map_err(|e| EnumerationError::Unavailable(e.to_string()))?;
    let cmd = Cmd::new_allowlisted(binary, Duration::from_secs(cfg.commands.timeout_secs))
        .map_err(|e| EnumerationError::Unavailable(e.to_string()))?;

    let args = ["-dn", "-o", "NAME"];
    debug!(command = %cmd.describe(&args), "enumerating block devices");
    let out = cmd
        .run(&args, None)
        .map_err(|e| EnumerationError::Unavailable(format!("{e:#}")))?;
    if !out.success() {
        return Err(EnumerationError::Failed(out.diagnostic()));
    }

    let devices = parse_device_names(&out.stdout, &cfg.devices.root);
    info!(count = devices.len(), "block devices enumerated");
    Ok(devices)
}

/// One name per line; blank lines are skipped.
pub fn parse_device_names(stdout: &str, root: &str) -> Vec<DeviceDescriptor> {
    let root = root.trim_end_matches('/');
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|name| DeviceDescriptor::new(format!("{root}/{name}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_names_and_skips_blanks() {
        let out = "sda\n\n  sdb  \nnvme0n1\n\n";
        let devices = parse_device_names(out, "/dev");
        let paths: Vec<String> = devices.iter().map(|d| d.to_string()).collect();
        assert_eq!(paths, vec!["/dev/sda", "/dev/sdb", "/dev/nvme0n1"]);
    }

    #[test]
    fn tolerates_trailing_slash_in_root() {
        let devices = parse_device_names("loop0\n", "/dev/");
        assert_eq!(devices[0].path(), Path::new("/dev/loop0"));
    }

    #[test]
    fn empty_output_yields_no_devices() {
        assert!(parse_device_names("\n\n", "/dev").is_empty());
    }
}
