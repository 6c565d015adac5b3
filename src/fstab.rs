// ============================================================================
// src/fstab.rs – Boot-time mount table entries
// ============================================================================

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// `UUID=<uuid> <mount point> ext4 defaults,nofail 0 2`, newline terminated.
pub fn entry(uuid: &str, mount_point: &str) -> String {
    format!("UUID={uuid} {mount_point} ext4 defaults,nofail 0 2\n")
}

/// Reduce raw `blkid -o value` output to a UUID, or `None` when unusable.
pub fn parse_uuid(raw: &str) -> Option<&str> {
    let uuid = raw.trim();
    if uuid.is_empty() || uuid.contains(char::is_whitespace) {
        return None;
    }
    Some(uuid)
}

/// Append one line to an existing table and sync it to disk. The file is
/// never created, and the handle is dropped before returning on every path.
pub fn append(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("open {} for append", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("write to {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    file.sync_all()
        .with_context(|| format!("sync {}", path.display()))?;
    Ok(())
}
