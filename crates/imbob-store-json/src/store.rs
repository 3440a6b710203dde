//! [`JsonStore`], the flat-file implementation of [`CollectionStore`].

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Arc,
};

use imbob_core::{
  entity::{Collection, Entity},
  store::CollectionStore,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{Error, Result, cache::CollectionCache};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A collection store backed by one JSON file per collection.
///
/// Cloning is cheap; the inner state is reference-counted.
#[derive(Clone)]
pub struct JsonStore {
  inner: Arc<Inner>,
}

struct Inner {
  dir:        PathBuf,
  cache:      CollectionCache,
  /// Held for the whole read-modify-write of any upsert.
  write_lock: Mutex<()>,
}

impl std::fmt::Debug for JsonStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("JsonStore")
      .field("dir", &self.inner.dir)
      .finish_non_exhaustive()
  }
}

impl JsonStore {
  /// Open a store rooted at `dir`, creating the directory if needed.
  ///
  /// Collection files are created lazily on first write; a missing file reads
  /// as an empty collection.
  pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&dir)
      .await
      .map_err(|source| Error::Io { path: dir.clone(), source })?;
    info!(dir = %dir.display(), "opened json store");
    Ok(Self {
      inner: Arc::new(Inner {
        dir,
        cache: CollectionCache::default(),
        write_lock: Mutex::new(()),
      }),
    })
  }

  fn path(&self, collection: Collection) -> PathBuf {
    self.inner.dir.join(collection.file_name())
  }

  // ─── Raw access ────────────────────────────────────────────────────────

  /// The cached contents of `collection`, loading them on a miss.
  async fn cached(&self, collection: Collection) -> Result<Arc<Vec<Value>>> {
    let generation = match self.inner.cache.lookup(collection) {
      Ok(hit) => return Ok(hit),
      Err(generation) => generation,
    };
    let records = self.read(collection).await?;
    Ok(self.inner.cache.fill(collection, generation, records))
  }

  async fn read(&self, collection: Collection) -> Result<Vec<Value>> {
    let path = self.path(collection);
    let bytes = match tokio::fs::read(&path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => return Err(Error::Io { path, source }),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
      return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).map_err(|source| Error::Malformed { path, source })
  }

  /// Write via a sibling temp file, then rename over the collection file.
  async fn write(&self, collection: Collection, records: &[Value]) -> Result<()> {
    let path = self.path(collection);
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(records)?;
    tokio::fs::write(&tmp, data)
      .await
      .map_err(|source| Error::Io { path: tmp.clone(), source })?;
    tokio::fs::rename(&tmp, &path)
      .await
      .map_err(|source| Error::Io { path: path.clone(), source })?;
    debug!(%collection, len = records.len(), "collection written");
    Ok(())
  }
}

fn decode<T: Entity>(record: &Value) -> Result<T> {
  Ok(serde_json::from_value(record.clone())?)
}

fn record_id(record: &Value) -> Option<&str> {
  record.get("id").and_then(Value::as_str)
}

// ─── CollectionStore impl ────────────────────────────────────────────────────

impl CollectionStore for JsonStore {
  type Error = Error;

  async fn list<T: Entity>(&self) -> Result<Vec<T>> {
    self.cached(T::COLLECTION).await?.iter().map(decode).collect()
  }

  async fn get_by_id<'a, T: Entity>(&'a self, id: &'a str) -> Result<Option<T>> {
    self
      .cached(T::COLLECTION)
      .await?
      .iter()
      .find(|r| record_id(r) == Some(id))
      .map(decode)
      .transpose()
  }

  async fn upsert<T: Entity>(&self, entity: T) -> Result<T> {
    let _guard = self.inner.write_lock.lock().await;

    // Read-modify-write against the file, never the cache.
    let mut records = self.read(T::COLLECTION).await?;
    let raw = serde_json::to_value(&entity)?;
    match records.iter_mut().find(|r| record_id(r) == Some(entity.id())) {
      Some(slot) => *slot = raw,
      None => records.push(raw),
    }
    self.write(T::COLLECTION, &records).await?;
    self.inner.cache.invalidate(T::COLLECTION);
    debug!(collection = %T::COLLECTION, id = entity.id(), "upserted");
    Ok(entity)
  }
}

#[cfg(test)]
impl JsonStore {
  pub(crate) fn is_cached(&self, collection: Collection) -> bool {
    self.inner.cache.contains(collection)
  }
}
