//! Movies, their casts, and derived actors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  entity::{Collection, Entity, new_id},
  person::KnownPerson,
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Genre {
  Drama,
  Comedy,
  Horror,
  Other,
}

/// A known person appearing in a movie, with the character they played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
  #[serde(flatten)]
  pub person: KnownPerson,
  /// Full or partial name of the character.
  pub role:   String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
  pub id:           String,
  pub title:        String,
  pub release_date: Option<NaiveDate>,
  pub genre:        Option<Genre>,
  #[serde(default)]
  pub directors:    Vec<KnownPerson>,
  #[serde(default)]
  pub actors:       Vec<CastMember>,
}

impl Entity for Movie {
  const COLLECTION: Collection = Collection::Movies;

  fn id(&self) -> &str { &self.id }
}

impl Movie {
  /// Every person id the movie references, directors first.
  pub fn people(&self) -> impl Iterator<Item = &KnownPerson> {
    self
      .directors
      .iter()
      .chain(self.actors.iter().map(|a| &a.person))
  }

  /// Merge an update into this movie.
  ///
  /// Scalar fields are replaced when present. Directors and actors are
  /// unioned: entries not already present (by full equality) are appended.
  pub fn apply(&mut self, update: MovieUpdate) {
    if let Some(title) = update.title {
      self.title = title;
    }
    if update.release_date.is_some() {
      self.release_date = update.release_date;
    }
    if update.genre.is_some() {
      self.genre = update.genre;
    }
    union_into(&mut self.directors, update.directors);
    union_into(&mut self.actors, update.actors);
  }
}

fn union_into<T: PartialEq>(existing: &mut Vec<T>, incoming: Vec<T>) {
  for item in incoming {
    if !existing.contains(&item) {
      existing.push(item);
    }
  }
}

/// Input for creating a movie.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
  pub title:        String,
  pub release_date: Option<NaiveDate>,
  pub genre:        Option<Genre>,
  #[serde(default)]
  pub directors:    Vec<KnownPerson>,
  #[serde(default)]
  pub actors:       Vec<CastMember>,
}

impl NewMovie {
  pub fn into_movie(self) -> Movie {
    Movie {
      id:           new_id(),
      title:        self.title,
      release_date: self.release_date,
      genre:        self.genre,
      directors:    self.directors,
      actors:       self.actors,
    }
  }
}

/// Partial update for an existing movie. See [`Movie::apply`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieUpdate {
  pub title:        Option<String>,
  pub release_date: Option<NaiveDate>,
  pub genre:        Option<Genre>,
  #[serde(default)]
  pub directors:    Vec<KnownPerson>,
  #[serde(default)]
  pub actors:       Vec<CastMember>,
}

// ─── Actors ──────────────────────────────────────────────────────────────────

/// The movie a [`Role`] appeared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRef {
  pub id:    String,
  pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub character: String,
  pub movie:     MovieRef,
}

/// A person seen through the movies they acted in. Never stored; derived from
/// movie casts by [`crate::graph::actors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  #[serde(flatten)]
  pub person: KnownPerson,
  pub roles:  Vec<Role>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn known(id: &str) -> KnownPerson {
    KnownPerson {
      id:         id.into(),
      first_name: format!("First {id}"),
      last_name:  format!("Last {id}"),
      dob:        None,
    }
  }

  #[test]
  fn apply_replaces_scalars_and_unions_people() {
    let mut movie = NewMovie {
      title:        "Original".into(),
      release_date: None,
      genre:        Some(Genre::Drama),
      directors:    vec![known("d1")],
      actors:       vec![CastMember { person: known("a1"), role: "Hero".into() }],
    }
    .into_movie();

    movie.apply(MovieUpdate {
      title: Some("Renamed".into()),
      directors: vec![known("d1"), known("d2")],
      actors: vec![
        CastMember { person: known("a1"), role: "Hero".into() },
        CastMember { person: known("a2"), role: "Villain".into() },
      ],
      ..Default::default()
    });

    assert_eq!(movie.title, "Renamed");
    assert_eq!(movie.genre, Some(Genre::Drama));
    assert_eq!(movie.directors.len(), 2);
    assert_eq!(movie.actors.len(), 2);
    assert_eq!(movie.people().count(), 4);
  }

  #[test]
  fn genre_wire_format() {
    let g: Genre = serde_json::from_str("\"HORROR\"").unwrap();
    assert_eq!(g, Genre::Horror);
    assert_eq!("comedy".parse::<Genre>().unwrap(), Genre::Comedy);
  }

  #[test]
  fn cast_member_is_flat() {
    let cast = CastMember { person: known("a1"), role: "Hero".into() };
    let json = serde_json::to_value(&cast).unwrap();
    assert_eq!(json["id"], "a1");
    assert_eq!(json["role"], "Hero");
  }
}
