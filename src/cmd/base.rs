// ============================================================================
// src/cmd/base.rs – Allowlisted external command runner (for system utilities)
// ============================================================================

use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Absolute paths the runner is willing to spawn.
const ALLOWED: &[&str] = &[
    // device enumeration
    "/bin/lsblk",
    "/usr/bin/lsblk",
    // ext4 formatting
    "/sbin/mkfs.ext4",
    "/usr/sbin/mkfs.ext4",
    "/usr/bin/mkfs.ext4",
    // mount / mount -a
    "/bin/mount",
    "/usr/bin/mount",
    "/sbin/mount",
    "/usr/sbin/mount",
    // UUID lookup
    "/sbin/blkid",
    "/usr/sbin/blkid",
    "/usr/bin/blkid",
    // privilege escalation
    "/usr/bin/sudo",
    "/bin/sudo",
    "/usr/local/bin/sudo",
];

/// Escalation helper flag: fail instead of prompting for a password.
const NON_INTERACTIVE: &str = "-n";

/// Safe wrapper for external process execution.
/// Used for invoking allowlisted system tools like `mkfs.ext4`, `mount`, etc.
#[derive(Debug, Clone)]
pub struct Cmd {
    pub path: String,
    pub timeout: Duration,
    elevate: Option<String>,
}

#[derive(Debug)]
pub struct OutputData {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl OutputData {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Short human-readable reason for a failed run, preferring stderr.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return format!("exit status {}: {}", self.status, stderr);
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return format!("exit status {}: {}", self.status, stdout);
        }
        format!("exit status {}", self.status)
    }
}

impl Cmd {
    /// Create a new allowlisted command runner.
    pub fn new_allowlisted<S: Into<String>>(path: S, timeout: Duration) -> Result<Self> {
        let path_str = path.into();
        if !ALLOWED.contains(&path_str.as_str()) {
            return Err(anyhow!("Command '{}' not in allowlist", path_str));
        }

        Ok(Self {
            path: path_str,
            timeout,
            elevate: None,
        })
    }

    /// Run the binary through `sudo` (or another allowlisted escalation helper).
    /// The helper runs non-interactively (`-n`): with no cached credentials it
    /// fails at once instead of prompting on a terminal it does not own.
    pub fn elevated_via<S: Into<String>>(mut self, helper: S) -> Result<Self> {
        let helper = helper.into();
        if !ALLOWED.contains(&helper.as_str()) {
            return Err(anyhow!("Escalation helper '{}' not in allowlist", helper));
        }
        self.elevate = Some(helper);
        Ok(self)
    }

    pub fn is_elevated(&self) -> bool {
        self.elevate.is_some()
    }

    /// Command line as it will be executed, for logs.
    pub fn describe(&self, args: &[&str]) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(args.len() + 2);
        if let Some(helper) = &self.elevate {
            parts.push(helper);
            parts.push(NON_INTERACTIVE);
        }
        parts.push(&self.path);
        parts.extend_from_slice(args);
        parts.join(" ")
    }

    /// Run command with arguments, returning `OutputData`
    pub fn run(&self, args: &[&str], input: Option<&[u8]>) -> Result<OutputData> {
        let mut cmd = match &self.elevate {
            Some(helper) => {
                let mut c = Command::new(helper);
                c.arg(NON_INTERACTIVE).arg(&self.path);
                c
            }
            None => Command::new(&self.path),
        };
        cmd.args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawn {}", self.describe(args)))?;

        if let Some(input_bytes) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input_bytes).context("writing stdin")?;
            }
        }

        self.wait_with_timeout(child)
    }

    fn wait_with_timeout(&self, mut child: Child) -> Result<OutputData> {
        let start = Instant::now();

        loop {
            match child.try_wait().context("try_wait")? {
                Some(status) => {
                    let output = child.wait_with_output().context("collect output")?;
                    return Ok(OutputData {
                        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                        status: status.code().unwrap_or(-1),
                    });
                }
                None => {
                    if start.elapsed() > self.timeout {
                        // Best effort terminate, then kill.
                        #[cfg(unix)]
                        {
                            use nix::sys::signal::{kill, Signal::SIGTERM};
                            use nix::unistd::Pid;
                            let _ = kill(Pid::from_raw(child.id() as i32), SIGTERM);
                        }
                        thread::sleep(Duration::from_millis(200));
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(anyhow!(
                            "{} timed out after {:?}",
                            self.path,
                            self.timeout
                        ));
                    }
                    thread::sleep(Duration::from_millis(30));
                }
            }
        }
    }
}

/// Pick the first candidate that exists on this host.
pub fn resolve_binary(candidates: &[&str]) -> Result<String> {
    candidates
        .iter()
        .find(|p| Path::new(p).exists())
        .map(|p| p.to_string())
        .ok_or_else(|| {
            anyhow!(
                "None of the candidate binaries {:?} were found on this system",
                candidates
            )
        })
}

#[cfg(test)]
mod tests {
    use super::{Cmd, OutputData};
    use std::time::Duration;

    #[test]
    fn provisioning_tools_are_allowlisted() {
        let paths = [
            "/usr/bin/lsblk",
            "/sbin/mkfs.ext4",
            "/usr/sbin/mkfs.ext4",
            "/bin/mount",
            "/usr/bin/mount",
            "/sbin/blkid",
            "/usr/bin/sudo",
        ];

        for path in paths {
            assert!(
                Cmd::new_allowlisted(path, Duration::from_secs(1)).is_ok(),
                "expected {path} to be allowlisted"
            );
        }
    }

    #[test]
    fn rejects_unlisted_binaries() {
        assert!(Cmd::new_allowlisted("/bin/sh", Duration::from_secs(1)).is_err());
        assert!(Cmd::new_allowlisted("mount", Duration::from_secs(1)).is_err());

        let cmd = Cmd::new_allowlisted("/bin/mount", Duration::from_secs(1)).unwrap();
        assert!(cmd.elevated_via("/tmp/sudo").is_err());
    }

    #[test]
    fn describe_includes_escalation_helper() {
        let cmd = Cmd::new_allowlisted("/sbin/mkfs.ext4", Duration::from_secs(1))
            .unwrap()
            .elevated_via("/usr/bin/sudo")
            .unwrap();
        assert!(cmd.is_elevated());
        assert_eq!(
            cmd.describe(&["/dev/sdb"]),
            "/usr/bin/sudo -n /sbin/mkfs.ext4 /dev/sdb"
        );
    }

    #[test]
    fn plain_command_has_no_escalation_flag() {
        let cmd = Cmd::new_allowlisted("/bin/mount", Duration::from_secs(1)).unwrap();
        assert!(!cmd.is_elevated());
        assert_eq!(cmd.describe(&["-a"]), "/bin/mount -a");
    }

    #[test]
    fn diagnostic_prefers_stderr() {
        let out = OutputData {
            stdout: "noise".into(),
            stderr: "mount: /mnt/data: device busy.\n".into(),
            status: 32,
        };
        assert!(!out.success());
        assert_eq!(out.diagnostic(), "exit status 32: mount: /mnt/data: device busy.");

        let silent = OutputData {
            stdout: String::new(),
            stderr: String::new(),
            status: 1,
        };
        assert_eq!(silent.diagnostic(), "exit status 1");
    }
}
