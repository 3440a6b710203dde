//! Read-through cache of raw collection contents.

use std::{
  collections::HashMap,
  sync::{Arc, RwLock},
};

use imbob_core::entity::Collection;
use serde_json::Value;
use tracing::debug;

/// The decoded JSON array of each collection, keyed by collection.
///
/// Entries are filled on first read and dropped by [`CollectionCache::invalidate`]
/// after every write; nothing else evicts them. Every invalidation bumps the
/// collection's generation, and a fill started under an older generation is
/// not stored.
#[derive(Debug, Default)]
pub(crate) struct CollectionCache {
  state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
  entries:     HashMap<Collection, Arc<Vec<Value>>>,
  generations: HashMap<Collection, u64>,
}

impl State {
  fn generation(&self, collection: Collection) -> u64 {
    self.generations.get(&collection).copied().unwrap_or_default()
  }
}

impl CollectionCache {
  /// The cached records, or on a miss the generation to hand to
  /// [`CollectionCache::fill`].
  pub(crate) fn lookup(
    &self,
    collection: Collection,
  ) -> Result<Arc<Vec<Value>>, u64> {
    let state = self.state.read().unwrap_or_else(|e| e.into_inner());
    match state.entries.get(&collection) {
      Some(hit) => Ok(Arc::clone(hit)),
      None => Err(state.generation(collection)),
    }
  }

  /// Store `records` read from disk since `generation` was observed. The
  /// records are returned either way but only cached if no write has
  /// invalidated the collection in between.
  pub(crate) fn fill(
    &self,
    collection: Collection,
    generation: u64,
    records: Vec<Value>,
  ) -> Arc<Vec<Value>> {
    let records = Arc::new(records);
    let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
    if state.generation(collection) == generation {
      debug!(%collection, len = records.len(), "cache filled");
      state.entries.insert(collection, Arc::clone(&records));
    } else {
      debug!(%collection, "stale read not cached");
    }
    records
  }

  pub(crate) fn invalidate(&self, collection: Collection) {
    let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
    *state.generations.entry(collection).or_default() += 1;
    if state.entries.remove(&collection).is_some() {
      debug!(%collection, "cache invalidated");
    }
  }

  #[cfg(test)]
  pub(crate) fn contains(&self, collection: Collection) -> bool {
    self.lookup(collection).is_ok()
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn fill_after_invalidate_is_not_cached() {
    let cache = CollectionCache::default();
    let generation = cache.lookup(Collection::Persons).unwrap_err();

    // A write lands while the reader still holds the old file contents.
    cache.invalidate(Collection::Persons);
    let stale = cache.fill(Collection::Persons, generation, vec![json!({"id": "old"})]);

    assert_eq!(stale.len(), 1);
    assert!(!cache.contains(Collection::Persons));

    let fresh = cache.lookup(Collection::Persons).unwrap_err();
    cache.fill(Collection::Persons, fresh, vec![json!({"id": "new"})]);
    let hit = cache.lookup(Collection::Persons).unwrap();
    assert_eq!(hit[0]["id"], "new");
  }

  #[test]
  fn generations_are_per_collection() {
    let cache = CollectionCache::default();
    let generation = cache.lookup(Collection::Movies).unwrap_err();
    cache.invalidate(Collection::Persons);
    cache.fill(Collection::Movies, generation, Vec::new());
    assert!(cache.contains(Collection::Movies));
  }
}
