//! Read-side resolvers over the stored collections.
//!
//! These functions never touch the store; callers load the collections and
//! pass them in.

use serde::{Deserialize, Serialize};

use crate::{
  movie::{Actor, Movie, MovieRef, Role},
  person::Person,
  triple::{Predicate, RelatedPerson, Triple},
};

/// Result of a combined person/actor search.
///
/// The variant is chosen when the hit is constructed, never inferred from
/// the fields present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SearchHit {
  Person(Person),
  Actor(Actor),
}

/// Every distinct cast member across `movies`, in first-seen order, each with
/// one role per movie they appear in.
pub fn actors(movies: &[Movie]) -> Vec<Actor> {
  let mut out: Vec<Actor> = Vec::new();
  for movie in movies {
    for cast in &movie.actors {
      let role = Role {
        character: cast.role.clone(),
        movie:     MovieRef { id: movie.id.clone(), title: movie.title.clone() },
      };
      match out.iter_mut().find(|a| a.person.id == cast.person.id) {
        Some(actor) => actor.roles.push(role),
        None => out.push(Actor { person: cast.person.clone(), roles: vec![role] }),
      }
    }
  }
  out
}

pub fn actor(movies: &[Movie], id: &str) -> Option<Actor> {
  actors(movies).into_iter().find(|a| a.person.id == id)
}

/// Objects of every triple whose subject is `subject_id` and whose predicate
/// is `predicate`.
pub fn related(
  triples: &[Triple],
  subject_id: &str,
  predicate: Predicate,
) -> Vec<RelatedPerson> {
  triples
    .iter()
    .filter(|t| t.subject.id == subject_id && t.predicate == predicate)
    .map(|t| RelatedPerson { person: t.object.clone(), created_at: t.created_at })
    .collect()
}

/// Persons matching both names exactly. `None` leaves that name unfiltered.
pub fn filter_persons(
  persons: Vec<Person>,
  first_name: Option<&str>,
  last_name: Option<&str>,
) -> Vec<Person> {
  persons
    .into_iter()
    .filter(|p| first_name.is_none_or(|f| p.first_name == f))
    .filter(|p| last_name.is_none_or(|l| p.last_name == l))
    .collect()
}

/// Actors then persons sharing `last_name`.
pub fn search_person_actor(
  persons: Vec<Person>,
  movies: &[Movie],
  last_name: &str,
) -> Vec<SearchHit> {
  let actors = actors(movies)
    .into_iter()
    .filter(|a| a.person.last_name == last_name)
    .map(SearchHit::Actor);
  let persons = filter_persons(persons, None, Some(last_name))
    .into_iter()
    .map(SearchHit::Person);
  actors.chain(persons).collect()
}
