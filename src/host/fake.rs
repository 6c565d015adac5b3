//! Recording HostOps for tests.
//!
//! Nothing touches real hardware: each call is logged, and a single
//! operation can be told to fail with a fixed cause.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::HostOps;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    FormatExt4 { device: PathBuf },
    CreateMountPoint { path: PathBuf, mode: u32 },
    Mount { device: PathBuf, target: PathBuf },
    FilesystemUuid { device: PathBuf },
    AppendMountEntry { line: String },
    MountAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    FormatExt4,
    CreateMountPoint,
    Mount,
    FilesystemUuid,
    AppendMountEntry,
    MountAll,
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::FormatExt4 { .. } => OpKind::FormatExt4,
            Operation::CreateMountPoint { .. } => OpKind::CreateMountPoint,
            Operation::Mount { .. } => OpKind::Mount,
            Operation::FilesystemUuid { .. } => OpKind::FilesystemUuid,
            Operation::AppendMountEntry { .. } => OpKind::AppendMountEntry,
            Operation::MountAll => OpKind::MountAll,
        }
    }
}

#[derive(Debug, Default)]
struct FakeHostState {
    operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct FakeHost {
    state: Arc<Mutex<FakeHostState>>,
    uuid_output: String,
    failure: Option<(OpKind, String)>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeHostState::default())),
            uuid_output: "1234-5678\n".to_string(),
            failure: None,
        }
    }

    pub fn with_uuid_output(mut self, raw: &str) -> Self {
        self.uuid_output = raw.to_string();
        self
    }

    pub fn failing(mut self, kind: OpKind, cause: &str) -> Self {
        self.failure = Some((kind, cause.to_string()));
        self
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    pub fn kinds(&self) -> Vec<OpKind> {
        self.operations().iter().map(Operation::kind).collect()
    }

    fn record(&self, op: Operation) -> Result<()> {
        let kind = op.kind();
        self.state.lock().unwrap().operations.push(op);
        match &self.failure {
            Some((failing, cause)) if *failing == kind => Err(anyhow!("{cause}")),
            _ => Ok(()),
        }
    }
}

impl HostOps for FakeHost {
    fn format_ext4(&self, device: &Path) -> Result<()> {
        self.record(Operation::FormatExt4 {
            device: device.to_path_buf(),
        })
    }

    fn create_mount_point(&self, path: &Path, mode: u32) -> Result<()> {
        self.record(Operation::CreateMountPoint {
            path: path.to_path_buf(),
            mode,
        })
    }

    fn mount(&self, device: &Path, target: &Path) -> Result<()> {
        self.record(Operation::Mount {
            device: device.to_path_buf(),
            target: target.to_path_buf(),
        })
    }

    fn filesystem_uuid(&self, device: &Path) -> Result<String> {
        self.record(Operation::FilesystemUuid {
            device: device.to_path_buf(),
        })?;
        Ok(self.uuid_output.clone())
    }

    fn append_mount_entry(&self, line: &str) -> Result<()> {
        self.record(Operation::AppendMountEntry {
            line: line.to_string(),
        })
    }

    fn mount_all(&self) -> Result<()> {
        self.record(Operation::MountAll)
    }
}
