//! Relationship triples: `subject -[predicate]-> object`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  entity::{Collection, Entity, new_id},
  pagination::{Cursored, SortValue},
  person::KnownPerson,
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Predicate {
  Knows,
  Likes,
  WorkedWith,
  MarriedTo,
  DivorcedFrom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
  pub id:         String,
  pub subject:    KnownPerson,
  pub predicate:  Predicate,
  pub object:     KnownPerson,
  /// Server-assigned; orders relationship edges.
  pub created_at: DateTime<Utc>,
}

impl Entity for Triple {
  const COLLECTION: Collection = Collection::Triples;

  fn id(&self) -> &str { &self.id }
}

/// Input for recording a relationship.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTriple {
  pub subject:   KnownPerson,
  pub predicate: Predicate,
  pub object:    KnownPerson,
}

impl NewTriple {
  pub fn into_triple(self) -> Triple {
    Triple {
      id:         new_id(),
      subject:    self.subject,
      predicate:  self.predicate,
      object:     self.object,
      created_at: Utc::now(),
    }
  }
}

/// The object of a triple, stamped with the time the relationship was
/// recorded. This is the node type of relationship connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedPerson {
  #[serde(flatten)]
  pub person:     KnownPerson,
  pub created_at: DateTime<Utc>,
}

impl Cursored for RelatedPerson {
  fn cursor(&self) -> &str { &self.person.id }

  fn sort_value(&self, field: &str) -> SortValue<'_> {
    match field {
      "id" => self.person.id.as_str().into(),
      "first_name" | "firstName" => self.person.first_name.as_str().into(),
      "last_name" | "lastName" => self.person.last_name.as_str().into(),
      "dob" => self.person.dob.map_or(SortValue::Missing, SortValue::Date),
      "created_at" | "createdAt" => SortValue::Time(self.created_at),
      _ => SortValue::Missing,
    }
  }
}
