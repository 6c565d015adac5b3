// ============================================================================
// src/config.rs – strict config loader
// ============================================================================

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/mountforge.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commands {
    /// Run format/mount/blkid through sudo.
    #[serde(default = "default_true")]
    pub sudo: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// mkfs.ext4 on a large disk takes a while.
    #[serde(default = "default_format_timeout_secs")]
    pub format_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_format_timeout_secs() -> u64 {
    900
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            sudo: true,
            timeout_secs: default_timeout_secs(),
            format_timeout_secs: default_format_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Devices {
    /// Prefix joined onto each name reported by lsblk.
    #[serde(default = "default_device_root")]
    pub root: String,
}

fn default_device_root() -> String {
    "/dev".to_string()
}

impl Default for Devices {
    fn default() -> Self {
        Self {
            root: default_device_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fstab {
    #[serde(default = "default_fstab_path")]
    pub path: PathBuf,
}

fn default_fstab_path() -> PathBuf {
    PathBuf::from("/etc/fstab")
}

impl Default for Fstab {
    fn default() -> Self {
        Self {
            path: default_fstab_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ui {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_tick_ms() -> u64 {
    100
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
    #[serde(default = "default_audit_path")]
    pub audit_path: PathBuf,
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("/var/log/mountforge.log")
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("/var/log/mountforge-audit.log")
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for Log {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            audit_path: default_audit_path(),
            level: default_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub commands: Commands,
    #[serde(default)]
    pub devices: Devices,
    #[serde(default)]
    pub fstab: Fstab,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Config {
    pub fn load<P: AsRef<Path>>(p: P) -> Result<Self> {
        let s = fs::read_to_string(&p)
            .with_context(|| format!("read config: {}", p.as_ref().display()))?;
        let ext = p.as_ref().extension().and_then(|e| e.to_str());
        let cfg: Self = match ext {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&s).context("yaml parse")?,
            _ => toml::from_str(&s).context("toml parse")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load an explicit path, or the default location when it exists.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ui.tick_ms == 0 {
            bail!("ui.tick_ms must be greater than zero");
        }
        if self.commands.timeout_secs == 0 || self.commands.format_timeout_secs == 0 {
            bail!("command timeouts must be greater than zero");
        }
        if self.devices.root.trim().is_empty() {
            bail!("devices.root must not be empty");
        }
        Ok(())
    }
}
