//! People, the primary entity of the graph.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{Collection, Entity, new_id},
  pagination::{Cursored, SortValue},
  scope::Resolvable,
};

/// A person in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:         String,
  pub first_name: String,
  pub last_name:  String,
  pub dob:        Option<NaiveDate>,
  /// Personal data; redacted for callers without the `personal` scope.
  pub email:      Option<String>,
}

impl Entity for Person {
  const COLLECTION: Collection = Collection::Persons;

  fn id(&self) -> &str { &self.id }
}

impl Resolvable for Person {
  const TYPE_NAME: &'static str = "Person";
}

impl Cursored for Person {
  fn cursor(&self) -> &str { &self.id }

  fn sort_value(&self, field: &str) -> SortValue<'_> {
    match field {
      "id" => self.id.as_str().into(),
      "first_name" | "firstName" => self.first_name.as_str().into(),
      "last_name" | "lastName" => self.last_name.as_str().into(),
      "dob" => self.dob.map_or(SortValue::Missing, SortValue::Date),
      "email" => self.email.as_deref().into(),
      _ => SortValue::Missing,
    }
  }
}

/// Input for creating a person. The id is always assigned by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
  pub first_name: String,
  pub last_name:  String,
  pub dob:        Option<NaiveDate>,
  pub email:      Option<String>,
}

impl NewPerson {
  pub fn into_person(self) -> Person {
    Person {
      id:         new_id(),
      first_name: self.first_name,
      last_name:  self.last_name,
      dob:        self.dob,
      email:      self.email,
    }
  }
}

/// A reference to a person already known to the system, embedded in movies
/// and triples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownPerson {
  pub id:         String,
  pub first_name: String,
  pub last_name:  String,
  pub dob:        Option<NaiveDate>,
}

impl From<&Person> for KnownPerson {
  fn from(p: &Person) -> Self {
    Self {
      id:         p.id.clone(),
      first_name: p.first_name.clone(),
      last_name:  p.last_name.clone(),
      dob:        p.dob,
    }
  }
}
