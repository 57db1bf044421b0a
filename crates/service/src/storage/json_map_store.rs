use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};
use tracing::warn;

use crate::errors::ServiceError;

/// Upper bounds on the JSON encoding of a single key and a single value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_key_bytes: usize,
    pub max_value_bytes: usize,
}

impl Default for StoreLimits {
    fn default() -> Self { Self { max_key_bytes: 64, max_value_bytes: 64 * 1024 } }
}

impl StoreLimits {
    pub fn from_config(cfg: &configs::StorageConfig) -> Self {
        Self { max_key_bytes: cfg.max_key_bytes, max_value_bytes: cfg.max_value_bytes }
    }
}

/// Generic ordered key-value map, optionally persisted to a JSON file.
///
/// Iteration follows ascending key order. Every mutation holds the write lock
/// while the new snapshot is written to `<file>.tmp`, synced and renamed over
/// the file, so a reader never observes an unpersisted change. On unix the
/// parent directory is synced after the rename so the new entry survives a
/// crash. When the write fails the in-memory map is restored and the file keeps
/// its previous content.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<BTreeMap<K, V>>>,
    file_path: Option<PathBuf>,
    limits: StoreLimits,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Open the store at `path`. Creates the file with an empty map if missing.
    ///
    /// A file that exists but cannot be decoded is an error; its content is
    /// left alone.
    pub async fn open<P: Into<PathBuf>>(
        path: P,
        limits: StoreLimits,
    ) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
            }
        }

        let map: BTreeMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Storage(format!("cannot decode {}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let empty = BTreeMap::new();
                write_snapshot(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(ServiceError::storage(e)),
        };

        Ok(Arc::new(Self {
            inner: Arc::new(RwLock::new(map)),
            file_path: Some(file_path),
            limits,
        }))
    }

    /// A store that lives only as long as the process.
    pub fn in_memory(limits: StoreLimits) -> Arc<Self> {
        Arc::new(Self { inner: Arc::new(RwLock::new(BTreeMap::new())), file_path: None, limits })
    }

    pub fn file_path(&self) -> Option<&Path> { self.file_path.as_deref() }

    async fn save(&self, map: &BTreeMap<K, V>) -> Result<(), ServiceError> {
        match &self.file_path {
            Some(path) => write_snapshot(path, map).await,
            None => Ok(()),
        }
    }

    fn check_limits(&self, key: &K, value: &V) -> Result<(), ServiceError> {
        let key_len = serde_json::to_vec(key).map_err(ServiceError::storage)?.len();
        if key_len > self.limits.max_key_bytes {
            return Err(ServiceError::Storage(format!(
                "key of {key_len} bytes exceeds the {} byte limit",
                self.limits.max_key_bytes
            )));
        }
        let value_len = serde_json::to_vec(value).map_err(ServiceError::storage)?.len();
        if value_len > self.limits.max_value_bytes {
            return Err(ServiceError::Storage(format!(
                "value of {value_len} bytes exceeds the {} byte limit",
                self.limits.max_value_bytes
            )));
        }
        Ok(())
    }

    /// List all entries as `(key, value)` pairs in key order.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Snapshot of all values in key order.
    pub async fn values(&self) -> Vec<V> {
        let map = self.inner.read().await;
        map.values().cloned().collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    pub async fn contains_key(&self, key: &K) -> bool {
        self.inner.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Insert or replace a value and persist; returns the replaced value.
    pub async fn insert(&self, key: K, value: V) -> Result<Option<V>, ServiceError> {
        self.check_limits(&key, &value)?;
        let mut map = self.inner.write().await;
        let previous = map.insert(key.clone(), value);
        if let Err(e) = self.save(&map).await {
            match &previous {
                Some(prev) => {
                    map.insert(key, prev.clone());
                }
                None => {
                    map.remove(&key);
                }
            }
            warn!(error = %e, "insert rolled back");
            return Err(e);
        }
        Ok(previous)
    }

    /// Remove a key and persist; returns the removed value.
    pub async fn remove(&self, key: &K) -> Result<Option<V>, ServiceError> {
        let mut map = self.inner.write().await;
        let Some(removed) = map.remove(key) else {
            return Ok(None);
        };
        if let Err(e) = self.save(&map).await {
            map.insert(key.clone(), removed);
            warn!(error = %e, "remove rolled back");
            return Err(e);
        }
        Ok(Some(removed))
    }

    /// Drop every entry and persist the empty map.
    pub async fn clear(&self) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        let previous = std::mem::take(&mut *map);
        if let Err(e) = self.save(&map).await {
            *map = previous;
            warn!(error = %e, "clear rolled back");
            return Err(e);
        }
        Ok(())
    }
}

async fn write_snapshot<T: Serialize>(path: &Path, value: &T) -> Result<(), ServiceError> {
    let data = serde_json::to_vec(value).map_err(ServiceError::storage)?;
    let tmp = tmp_path(path);
    let mut file = fs::File::create(&tmp).await.map_err(ServiceError::storage)?;
    file.write_all(&data).await.map_err(ServiceError::storage)?;
    file.sync_all().await.map_err(ServiceError::storage)?;
    drop(file);
    fs::rename(&tmp, path).await.map_err(ServiceError::storage)?;
    sync_parent(path).await
}

#[cfg(unix)]
async fn sync_parent(path: &Path) -> Result<(), ServiceError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let dir = fs::File::open(parent).await.map_err(ServiceError::storage)?;
    dir.sync_all().await.map_err(ServiceError::storage)
}

#[cfg(not(unix))]
async fn sync_parent(_path: &Path) -> Result<(), ServiceError> {
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
