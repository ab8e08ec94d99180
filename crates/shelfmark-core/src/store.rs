//! Persisted JSON document: blocks and assignments in one file.
//!
//! The portable on-disk format. One pretty-printed JSON document holds the
//! whole registry; writers replace it atomically (temp file, fsync, rename,
//! directory sync) so readers observe either the old or the new complete
//! document, never a torn write.

use crate::assignment::Assignment;
use crate::block::Block;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current document schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Wire shape of the persisted registry.
///
/// Unknown fields are ignored on load; absent lists default to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for RegistryDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            blocks: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

/// Errors from document load/save.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("corrupted store: {0}")]
    Corrupt(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("unsupported schema version {found} (supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

/// Read the registry document. A missing file is an empty document; a
/// corrupt or unreadable file is an error, never silently discarded.
pub fn read_document_from_path(path: impl AsRef<Path>) -> Result<RegistryDocument, StoreError> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(RegistryDocument::default());
        }
        Err(err) => return Err(StoreError::Io(format!("{}: {err}", path.display()))),
    };
    validate_substrate_bytes(path, &bytes)?;
    let text = std::str::from_utf8(&bytes).map_err(|_| {
        StoreError::Corrupt(format!(
            "{}: contains non-UTF-8 byte sequence(s)",
            path.display()
        ))
    })?;
    let document: RegistryDocument = serde_json::from_str(text)
        .map_err(|e| StoreError::Parse(format!("{}: {e}", path.display())))?;
    if document.schema_version != SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema {
            found: document.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(document)
}

/// Write the registry document with an atomic replace.
pub fn write_document_to_path(
    path: impl AsRef<Path>,
    document: &RegistryDocument,
) -> Result<(), StoreError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| StoreError::Io(format!("{}: {e}", parent.display())))?;
    }

    let payload = serde_json::to_string_pretty(document)
        .map_err(|e| StoreError::Serialize(e.to_string()))?;

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), StoreError> {
        let mut file = File::create(&tmp_path)
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp_path.display())))?;
        file.write_all(payload.as_bytes())
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp_path.display())))?;
        file.write_all(b"\n")
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp_path.display())))?;
        file.sync_all()
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp_path.display())))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::Io(format!(
            "{} -> {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let dir = File::open(parent)
            .map_err(|e| StoreError::Io(format!("{}: {e}", parent.display())))?;
        dir.sync_all()
            .map_err(|e| StoreError::Io(format!("{}: {e}", parent.display())))?;
    }

    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

fn validate_substrate_bytes(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if bytes.contains(&0) {
        return Err(StoreError::Corrupt(format!(
            "{}: contains NUL byte(s)",
            path.display()
        )));
    }
    Ok(())
}
