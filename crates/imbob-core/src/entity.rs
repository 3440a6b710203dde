//! The [`Entity`] abstraction shared by every stored record.

use serde::{Serialize, de::DeserializeOwned};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// The named collections a [`crate::store::CollectionStore`] holds.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Collection {
  Persons,
  Movies,
  Triples,
}

impl Collection {
  /// File name used by flat-file backends, e.g. `persons.json`.
  pub fn file_name(self) -> String { format!("{self}.json") }
}

/// A record owned by a collection.
///
/// `id` is assigned once at creation and never changes; stores use it as the
/// upsert key.
pub trait Entity:
  Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
  const COLLECTION: Collection;

  fn id(&self) -> &str;
}

/// A fresh identifier for a newly created entity.
pub fn new_id() -> String { Uuid::new_v4().to_string() }
