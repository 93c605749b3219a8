//! Profile-image object storage.
//!
//! MediaStore is the interface the rest of the crate talks to; the default
//! implementation maps keys to local filesystem paths. Can be swapped for
//! an S3-style backend by implementing this trait.

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("invalid media key: {0}")]
    InvalidKey(String),
}

/// Storage for uploaded binary objects (profile images).
///
/// Keys are path-like strings: `profile-images/3f2a….png`.
pub trait MediaStore: Send + Sync {
    /// Store an object. Overwrites if the key already exists.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), MediaError>;

    /// Delete an object. No-op if the key does not exist.
    fn delete(&self, key: &str) -> Result<(), MediaError>;

    /// Public URL for a stored object.
    fn url_for(&self, key: &str) -> String;

    /// Recover the storage key from a URL previously returned by `url_for`.
    /// Returns None for URLs this store did not produce.
    fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str>;
}

/// MediaStore backed by the local filesystem.
///
/// Keys map to paths under `root`; `public_base` is the URL prefix an
/// external file server exposes that directory under.
pub struct FileStore {
    root: PathBuf,
    public_base: String,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created if it
    /// doesn't exist.
    pub fn open(root: &Path, public_base: &str) -> Result<Self, MediaError> {
        fs::create_dir_all(root).map_err(|e| MediaError::Io(e.to_string()))?;
        Ok(Self {
            root: root.to_path_buf(),
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a key to a filesystem path. Rejects keys that could escape
    /// the root directory.
    fn resolve(&self, key: &str) -> Result<PathBuf, MediaError> {
        if key.is_empty() || key.starts_with('/') || key.starts_with('\\') {
            return Err(MediaError::InvalidKey(key.to_string()));
        }
        if key.split(['/', '\\']).any(|part| part == "..") {
            return Err(MediaError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl MediaStore for FileStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), MediaError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MediaError::Io(e.to_string()))?;
        }
        fs::write(&path, data).map_err(|e| MediaError::Io(e.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), MediaError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }

    fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.public_base)
            .map(|rest| rest.trim_start_matches('/'))
            .filter(|key| !key.is_empty())
    }
}
