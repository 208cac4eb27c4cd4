//! On-disk token cache shared by every process using the same identity.
//!
//! Each `(tenant_id, username)` pair owns one JSON file holding the last
//! token obtained for it. Entries are overwritten after each successful
//! authentication and never removed; a stale entry is simply ignored.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::token::Token;

/// Why a cached entry could not be used. Never surfaced to callers.
#[derive(Error, Debug)]
enum CacheReadError {
    #[error("no cached token")]
    Missing,
    #[error("failed to read token cache: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse token cache: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Token cache rooted at a directory
#[derive(Clone, Debug)]
pub struct TokenCache {
    dir: PathBuf,
}

impl TokenCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for an identity.
    ///
    /// Both parts are hex encoded so the `-` separator cannot appear inside
    /// them, which keeps distinct identities on distinct files.
    pub fn path_for(&self, tenant_id: &str, username: &str) -> PathBuf {
        self.dir.join(format!(
            "token-{}-{}.json",
            hex::encode(tenant_id),
            hex::encode(username)
        ))
    }

    /// Load the cached token for an identity, if one can be read
    pub fn load(&self, tenant_id: &str, username: &str) -> Option<Token> {
        let path = self.path_for(tenant_id, username);
        match read_entry(&path) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(path = %path.display(), "Ignoring token cache entry: {}", e);
                None
            }
        }
    }

    /// Persist `token` for an identity, replacing any existing entry.
    ///
    /// The serialized token is written in full to a sibling file and then
    /// renamed over the entry, so readers never observe a partial write.
    pub fn save(&self, tenant_id: &str, username: &str, token: &Token) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(tenant_id, username);
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        let contents = serde_json::to_vec(token)?;
        // Leftover from a crashed writer; it may carry wider permissions
        let _ = std::fs::remove_file(&tmp);
        write_private(&tmp, &contents)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        debug!(path = %path.display(), "Saved token to cache");
        Ok(())
    }
}

/// Create `path` holding `contents`, readable only by the owner on unix
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn read_entry(path: &Path) -> Result<Token, CacheReadError> {
    let contents = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(CacheReadError::Missing),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&contents)?)
}
