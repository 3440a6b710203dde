//! The `CollectionStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `imbob-store-json`).
//! Higher layers (`imbob-api`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::entity::Entity;

/// Abstraction over a named-collection store backend.
///
/// Records are keyed by [`Entity::id`] within their
/// [`Entity::COLLECTION`]. The store is the only component that serializes
/// concurrent writers; callers never lock around it.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CollectionStore: Clone + Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every record of `T`'s collection, in storage order.
  fn list<T: Entity>(
    &self,
  ) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get_by_id<'a, T: Entity>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send + 'a;

  /// Insert `entity`, or replace the record with the same id, and return the
  /// persisted copy.
  fn upsert<T: Entity>(
    &self,
    entity: T,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + '_;
}
