// ============================================================================
// src/host/linux.rs – HostOps backed by mkfs.ext4 / mount / blkid
// ============================================================================

use anyhow::{anyhow, bail, Context, Result};
use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::HostOps;
use crate::cmd::base::resolve_binary;
use crate::cmd::{Cmd, OutputData};
use crate::config::Config;
use crate::fstab;

const MKFS_BINARIES: &[&str] = &[
    "/sbin/mkfs.ext4",
    "/usr/sbin/mkfs.ext4",
    "/usr/bin/mkfs.ext4",
];
const MOUNT_BINARIES: &[&str] = &["/bin/mount", "/usr/bin/mount", "/sbin/mount", "/usr/sbin/mount"];
const BLKID_BINARIES: &[&str] = &["/sbin/blkid", "/usr/sbin/blkid", "/usr/bin/blkid"];
const SUDO_BINARIES: &[&str] = &["/usr/bin/sudo", "/bin/sudo", "/usr/local/bin/sudo"];

#[derive(Debug, Clone)]
pub struct LinuxHost {
    sudo: Option<String>,
    timeout: Duration,
    format_timeout: Duration,
    fstab_path: PathBuf,
}

impl LinuxHost {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let sudo = if cfg.commands.sudo {
            Some(resolve_binary(SUDO_BINARIES).context("sudo requested but not installed")?)
        } else {
            None
        };
        Ok(Self {
            sudo,
            timeout: Duration::from_secs(cfg.commands.timeout_secs),
            format_timeout: Duration::from_secs(cfg.commands.format_timeout_secs),
            fstab_path: cfg.fstab.path.clone(),
        })
    }

    /// Refresh sudo's credential cache while the terminal is still in
    /// cooked mode, so the elevated steps can run with `sudo -n`.
    pub fn prime_credentials(&self) -> Result<()> {
        let Some(helper) = &self.sudo else {
            return Ok(());
        };
        let sudo = Cmd::new_allowlisted(helper.as_str(), self.timeout)?;
        let out = sudo
            .run(&["-v"], None)
            .context("sudo credential check")?;
        if !out.success() {
            bail!("sudo credential check failed ({})", out.diagnostic());
        }
        debug!("sudo credentials cached");
        Ok(())
    }

    fn command(&self, candidates: &[&str], timeout: Duration) -> Result<Cmd> {
        let cmd = Cmd::new_allowlisted(resolve_binary(candidates)?, timeout)?;
        match &self.sudo {
            Some(helper) => cmd.elevated_via(helper.as_str()),
            None => Ok(cmd),
        }
    }

    fn run_checked(cmd: &Cmd, args: &[&str]) -> Result<OutputData> {
        debug!(command = %cmd.describe(args), elevated = cmd.is_elevated(), "running");
        let out = cmd.run(args, None)?;
        if !out.success() {
            return Err(anyhow!("{} ({})", cmd.describe(args), out.diagnostic()));
        }
        Ok(out)
    }
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("path is not valid UTF-8: {}", path.display()))
}

impl HostOps for LinuxHost {
    fn format_ext4(&self, device: &Path) -> Result<()> {
        let cmd = self.command(MKFS_BINARIES, self.format_timeout)?;
        Self::run_checked(&cmd, &[path_arg(device)?])?;
        Ok(())
    }

    fn create_mount_point(&self, path: &Path, mode: u32) -> Result<()> {
        DirBuilder::new()
            .recursive(true)
            .mode(mode)
            .create(path)
            .with_context(|| format!("mkdir {} (mode {:o})", path.display(), mode))
    }

    fn mount(&self, device: &Path, target: &Path) -> Result<()> {
        let cmd = self.command(MOUNT_BINARIES, self.timeout)?;
        Self::run_checked(&cmd, &[path_arg(device)?, path_arg(target)?])?;
        Ok(())
    }

    fn filesystem_uuid(&self, device: &Path) -> Result<String> {
        let cmd = self.command(BLKID_BINARIES, self.timeout)?;
        let out = Self::run_checked(&cmd, &["-s", "UUID", "-o", "value", path_arg(device)?])?;
        Ok(out.stdout)
    }

    fn append_mount_entry(&self, line: &str) -> Result<()> {
        fstab::append(&self.fstab_path, line)
    }

    fn mount_all(&self) -> Result<()> {
        let cmd = self.command(MOUNT_BINARIES, self.timeout)?;
        Self::run_checked(&cmd, &["-a"])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn unprivileged(fstab_path: PathBuf) -> LinuxHost {
        let mut cfg = Config::default();
        cfg.commands.sudo = false;
        cfg.fstab.path = fstab_path;
        LinuxHost::from_config(&cfg).unwrap()
    }

    #[test]
    fn priming_without_sudo_is_a_no_op() {
        let dir = tempdir().unwrap();
        let host = unprivileged(dir.path().join("fstab"));
        host.prime_credentials().unwrap();
    }

    #[test]
    fn creates_nested_mount_point_with_mode() {
        let dir = tempdir().unwrap();
        let host = unprivileged(dir.path().join("fstab"));
        let target = dir.path().join("mnt/data");

        host.create_mount_point(&target, 0o755).unwrap();

        let meta = fs::metadata(&target).unwrap();
        assert!(meta.is_dir());
        // umask can only clear bits.
        assert_eq!(meta.permissions().mode() & 0o777 & !0o755, 0);
    }

    #[test]
    fn mount_point_collision_with_file_fails() {
        let dir = tempdir().unwrap();
        let host = unprivileged(dir.path().join("fstab"));
        let target = dir.path().join("occupied");
        fs::write(&target, b"not a directory").unwrap();

        assert!(host.create_mount_point(&target, 0o755).is_err());
    }

    #[test]
    fn appends_to_configured_table() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("fstab");
        fs::write(&table, "").unwrap();
        let host = unprivileged(table.clone());

        host.append_mount_entry(&fstab::entry("1234-5678", "/mnt/data"))
            .unwrap();

        assert_eq!(
            fs::read_to_string(&table).unwrap(),
            "UUID=1234-5678 /mnt/data ext4 defaults,nofail 0 2\n"
        );
    }
}
