use std::fs;
use std::path::{Component, Path};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use tracing::info;

use crate::audio::AudioFormat;
use crate::error::ConcatError;

/// URL prefix the storage root is served under.
pub const PUBLIC_PREFIX: &str = "/user_files";

static KEY_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Key relative to the storage root, extension included.
    pub key: String,
    /// Path the file can be downloaded from.
    pub public_path: String,
}

/// Validate a caller-supplied key and make it end in the format's extension,
/// appending one unless it is already there. The static file service picks
/// the served content type from that extension. Keys must stay inside the
/// storage root.
pub fn normalize_key(key: &str, format: AudioFormat) -> Result<String, ConcatError> {
    let key = key.trim();
    if key.is_empty() || key.ends_with('/') || key.contains('\\') {
        return Err(ConcatError::InvalidKey(key.to_string()));
    }

    let path = Path::new(key);
    if !path
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(ConcatError::InvalidKey(key.to_string()));
    }

    let has_format_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(format.extension()));
    if has_format_extension {
        Ok(key.to_string())
    } else {
        Ok(format!("{key}.{}", format.extension()))
    }
}

/// Key for requests that did not name one, e.g.
/// `concat/2025-04-03-14-03-07-0.mp3`.
pub fn generate_key(format: AudioFormat) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let n = KEY_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("concat/{timestamp}-{n}.{}", format.extension())
}

/// Write `bytes` under `root/key`, creating parent directories. Existing files
/// are overwritten.
pub fn store(root: &Path, key: &str, bytes: &[u8]) -> Result<StoredFile, ConcatError> {
    let target = root.join(key);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, bytes)?;
    info!("Stored {} bytes at {}", bytes.len(), target.display());

    Ok(StoredFile {
        key: key.to_string(),
        public_path: format!("{PUBLIC_PREFIX}/{key}"),
    })
}
