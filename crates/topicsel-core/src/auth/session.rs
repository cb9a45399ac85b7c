use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Storage file name in cache directory
const STORAGE_FILE: &str = "storage.json";

/// Scratch file a write goes to before it replaces `STORAGE_FILE`
const STORAGE_TMP_FILE: &str = "storage.json.tmp";

/// Key the bearer token is stored under
pub const TOKEN_KEY: &str = "token";

/// Read/write access to the current session token.
///
/// Implementations must be safe to share between the HTTP clients and the
/// router; writes are last-write-wins.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>>;

    fn set(&self, token: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;

    /// An empty stored string counts as logged out.
    fn is_authenticated(&self) -> Result<bool> {
        Ok(self.get()?.is_some_and(|t| !t.is_empty()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>> {
        let guard = self.token.read().map_err(|_| anyhow!("Token lock poisoned"))?;
        Ok(guard.clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut guard = self.token.write().map_err(|_| anyhow!("Token lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.token.write().map_err(|_| anyhow!("Token lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StorageData {
    #[serde(default)]
    entries: BTreeMap<String, String>,
    updated_at: Option<DateTime<Utc>>,
}

/// Key-value file store, the on-disk counterpart of browser local storage.
///
/// Every read goes back to disk so that a login performed by another
/// process is picked up by the next request. Writes replace the file
/// atomically and, on Unix, leave it readable by the owner only. A file
/// that no longer parses is reported by reads and replaced by the next write.
pub struct FileTokenStore {
    path: PathBuf,
    tmp_path: PathBuf,
    lock: RwLock<()>,
}

impl FileTokenStore {
    /// Open (or lazily create) the store inside `cache_dir`.
    pub fn open(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self {
            path: cache_dir.join(STORAGE_FILE),
            tmp_path: cache_dir.join(STORAGE_TMP_FILE),
            lock: RwLock::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the store was last written, if ever.
    pub fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        let _guard = self.lock.read().map_err(|_| anyhow!("Storage lock poisoned"))?;
        Ok(self.read_data()?.updated_at)
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.read().map_err(|_| anyhow!("Storage lock poisoned"))?;
        Ok(self.read_data()?.entries.get(key).cloned())
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.write().map_err(|_| anyhow!("Storage lock poisoned"))?;
        let (mut data, _) = self.read_for_update()?;
        data.entries.insert(key.to_string(), value.to_string());
        self.write_data(data)
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.write().map_err(|_| anyhow!("Storage lock poisoned"))?;
        let (mut data, reset) = self.read_for_update()?;
        if data.entries.remove(key).is_some() || reset {
            self.write_data(data)?;
        }
        Ok(())
    }

    fn read_contents(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read storage file")?;
        Ok(Some(contents))
    }

    fn read_data(&self) -> Result<StorageData> {
        match self.read_contents()? {
            Some(contents) => serde_json::from_str(&contents).context("Failed to parse storage file"),
            None => Ok(StorageData::default()),
        }
    }

    /// Current contents for a read-modify-write. A file that does not parse
    /// starts over empty; the flag tells the caller it must be rewritten.
    fn read_for_update(&self) -> Result<(StorageData, bool)> {
        let Some(contents) = self.read_contents()? else {
            return Ok((StorageData::default(), false));
        };
        match serde_json::from_str(&contents) {
            Ok(data) => Ok((data, false)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Resetting unparsable storage file");
                Ok((StorageData::default(), true))
            }
        }
    }

    fn write_data(&self, mut data: StorageData) -> Result<()> {
        data.updated_at = Some(Utc::now());
        let contents = serde_json::to_string_pretty(&data)?;
        write_private(&self.tmp_path, contents.as_bytes())
            .context("Failed to write storage file")?;
        std::fs::rename(&self.tmp_path, &self.path).context("Failed to replace storage file")?;
        debug!(path = %self.path.display(), "Storage saved");
        Ok(())
    }
}

/// Write `contents` to `path`, flushed to disk, with owner-only permissions
/// on Unix.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // `mode` only applies when the file is created
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.sync_all()
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>> {
        self.get_item(TOKEN_KEY)
    }

    fn set(&self, token: &str) -> Result<()> {
        self.set_item(TOKEN_KEY, token)
    }

    fn clear(&self) -> Result<()> {
        self.remove_item(TOKEN_KEY)
    }
}
