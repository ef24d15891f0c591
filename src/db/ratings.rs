use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Key-value persistence for user ratings
///
/// Keys are decimal movie ids, values are numeric ratings. Backends store raw
/// values only; domain validation happens in `RatingStore`.
#[async_trait::async_trait]
pub trait RatingBackend: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<f64>>;

    async fn set(&self, key: &str, value: f64) -> AppResult<()>;

    /// Removes a key, returning whether it was present
    async fn delete(&self, key: &str) -> AppResult<bool>;

    /// Every stored entry
    async fn all(&self) -> AppResult<HashMap<String, f64>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Ratings kept in a single JSON object on disk
///
/// The whole file is rewritten on every mutation through a temporary sibling
/// file and a rename, so a crash mid-write never leaves a truncated file.
pub struct JsonFileBackend {
    path: PathBuf,
    entries: Mutex<HashMap<String, f64>>,
}

impl JsonFileBackend {
    /// Opens the ratings file, treating a missing file as an empty store
    ///
    /// A file that is not a JSON object is a `Persistence` error. Entries whose
    /// value is not a number are dropped with a warning.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => parse_entries(&path, &raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No ratings file yet, starting empty");
                HashMap::new()
            }
            Err(e) => {
                return Err(AppError::Persistence(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn write_file(&self, entries: &HashMap<String, f64>) -> AppResult<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| AppError::Persistence(format!("failed to encode ratings: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Persistence(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| {
            AppError::Persistence(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            AppError::Persistence(format!("failed to replace {}: {}", self.path.display(), e))
        })
    }
}

fn parse_entries(path: &Path, raw: &str) -> AppResult<HashMap<String, f64>> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
        .map_err(|e| {
            AppError::Persistence(format!("malformed ratings file {}: {}", path.display(), e))
        })?;

    let mut entries = HashMap::with_capacity(object.len());
    for (key, value) in object {
        match value.as_f64() {
            Some(v) => {
                entries.insert(key, v);
            }
            None => tracing::warn!(key = %key, value = %value, "Skipping non-numeric rating"),
        }
    }
    Ok(entries)
}

#[async_trait::async_trait]
impl RatingBackend for JsonFileBackend {
    async fn get(&self, key: &str) -> AppResult<Option<f64>> {
        Ok(self.entries.lock().await.get(key).copied())
    }

    async fn set(&self, key: &str, value: f64) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.write_file(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(false);
        }
        let mut next = entries.clone();
        next.remove(key);
        self.write_file(&next).await?;
        *entries = next;
        Ok(true)
    }

    async fn all(&self) -> AppResult<HashMap<String, f64>> {
        Ok(self.entries.lock().await.clone())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Process-local backend, used by tests and ephemeral runs
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, f64>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: HashMap<String, f64>) -> Self {
        Self {
            entries: Mutex::new(entries),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent write fail with a `Persistence` error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("memory backend is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RatingBackend for MemoryBackend {
    async fn get(&self, key: &str) -> AppResult<Option<f64>> {
        Ok(self.entries.lock().await.get(key).copied())
    }

    async fn set(&self, key: &str, value: f64) -> AppResult<()> {
        self.check_writable()?;
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.check_writable()?;
        Ok(self.entries.lock().await.remove(key).is_some())
    }

    async fn all(&self) -> AppResult<HashMap<String, f64>> {
        Ok(self.entries.lock().await.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
