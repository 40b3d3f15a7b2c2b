//! Temporary resource manager
//!
//! Image and audio payloads arrive base64 encoded. They are written to
//! uniquely named files under the service temp directory so inference tools
//! can read them by path. Each [`TemporaryAsset`] deletes its file exactly
//! once: on explicit [`TemporaryAsset::release`], or on drop when the owning
//! request unwinds or is cancelled.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, warn};

/// File name prefix for every materialized asset
pub const ASSET_PREFIX: &str = "pantry-";

/// Binary payload kinds backed by a temporary file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Audio,
}

impl AssetKind {
    /// File suffix handed to inference providers
    pub fn suffix(self) -> &'static str {
        match self {
            AssetKind::Image => ".jpg",
            AssetKind::Audio => ".wav",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Image => write!(f, "image"),
            AssetKind::Audio => write!(f, "audio"),
        }
    }
}

/// Temporary resource errors
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Empty {0} payload")]
    EmptyPayload(AssetKind),

    #[error("Failed to write temporary file: {0}")]
    Io(#[from] std::io::Error),
}

/// Creates temporary assets in one directory and tracks how many are live
#[derive(Debug, Clone)]
pub struct TempAssetManager {
    dir: PathBuf,
    outstanding: Arc<AtomicUsize>,
}

impl TempAssetManager {
    /// Use `dir` for temporary files, creating it if needed
    pub fn new(dir: &Path) -> Result<Self, ResourceError> {
        std::fs::create_dir_all(dir)?;
        let dir = dir.canonicalize()?;
        debug!("Temporary asset directory: {}", dir.display());

        Ok(Self {
            dir,
            outstanding: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Decode `payload` and write it to a new file with the kind's suffix
    ///
    /// Accepts bare base64 or a `data:<mime>;base64,` URI.
    pub fn materialize(&self, payload: &str, kind: AssetKind) -> Result<TemporaryAsset, ResourceError> {
        let encoded: String = strip_data_uri(payload)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = STANDARD.decode(encoded.as_bytes())?;
        if bytes.is_empty() {
            return Err(ResourceError::EmptyPayload(kind));
        }

        let mut file = tempfile::Builder::new()
            .prefix(ASSET_PREFIX)
            .suffix(kind.suffix())
            .tempfile_in(&self.dir)?;
        file.write_all(&bytes)?;
        file.flush()?;

        let temp_path = file.into_temp_path();
        let path = temp_path.to_path_buf();
        self.outstanding.fetch_add(1, Ordering::SeqCst);

        debug!(kind = %kind, bytes = bytes.len(), path = %path.display(), "Materialized temporary asset");

        Ok(TemporaryAsset {
            temp_path: Some(temp_path),
            path,
            kind,
            outstanding: Arc::clone(&self.outstanding),
        })
    }

    /// True when `path` names a file this manager could have created
    ///
    /// The file itself may already be gone.
    pub fn owns(&self, path: &Path) -> bool {
        let prefixed = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(ASSET_PREFIX))
            .unwrap_or(false);
        if !prefixed {
            return false;
        }

        match path.parent().map(Path::canonicalize) {
            Some(Ok(parent)) => parent == self.dir,
            _ => false,
        }
    }

    /// Number of assets materialized and not yet released
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// A transient file backing one request's binary payload
pub struct TemporaryAsset {
    temp_path: Option<TempPath>,
    path: PathBuf,
    kind: AssetKind,
    outstanding: Arc<AtomicUsize>,
}

impl TemporaryAsset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Delete the file
    ///
    /// A file already removed by a tool is expected and only logged.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        let Some(temp_path) = self.temp_path.take() else {
            return;
        };

        match temp_path.close() {
            Ok(()) => debug!(path = %self.path.display(), "Released temporary asset"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Temporary asset already removed")
            }
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove temporary asset"),
        }
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Drop for TemporaryAsset {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for TemporaryAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryAsset")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("released", &self.temp_path.is_none())
            .finish()
    }
}

fn strip_data_uri(payload: &str) -> &str {
    let payload = payload.trim();
    if payload.starts_with("data:") {
        if let Some(idx) = payload.find(";base64,") {
            return &payload[idx + ";base64,".len()..];
        }
    }
    payload
}
