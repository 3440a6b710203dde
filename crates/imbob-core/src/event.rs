//! Event envelopes and the channels they are published on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result, entity::Collection, movie::Genre};

// ─── Event kinds ─────────────────────────────────────────────────────────────

/// Whether an entity event reports a creation or a modification.
///
/// Chosen explicitly by the publisher; subscribers may filter on it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventAction {
  Added,
  Updated,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventName {
  Ping,
  PersonEventTypeAdd,
  PersonEventTypeUpdate,
  MovieEventTypeAdd,
  MovieEventTypeUpdate,
  TripleEventTypeAdd,
  TripleEventTypeUpdate,
}

impl EventName {
  pub fn for_entity(collection: Collection, action: EventAction) -> Self {
    use EventAction::*;
    match (collection, action) {
      (Collection::Persons, Added) => Self::PersonEventTypeAdd,
      (Collection::Persons, Updated) => Self::PersonEventTypeUpdate,
      (Collection::Movies, Added) => Self::MovieEventTypeAdd,
      (Collection::Movies, Updated) => Self::MovieEventTypeUpdate,
      (Collection::Triples, Added) => Self::TripleEventTypeAdd,
      (Collection::Triples, Updated) => Self::TripleEventTypeUpdate,
    }
  }

  /// `None` for events that are not about an entity (pings).
  pub fn action(self) -> Option<EventAction> {
    match self {
      Self::Ping => None,
      Self::PersonEventTypeAdd
      | Self::MovieEventTypeAdd
      | Self::TripleEventTypeAdd => Some(EventAction::Added),
      Self::PersonEventTypeUpdate
      | Self::MovieEventTypeUpdate
      | Self::TripleEventTypeUpdate => Some(EventAction::Updated),
    }
  }

  /// The collection whose entity the body carries, if any.
  pub fn collection(self) -> Option<Collection> {
    match self {
      Self::Ping => None,
      Self::PersonEventTypeAdd | Self::PersonEventTypeUpdate => {
        Some(Collection::Persons)
      }
      Self::MovieEventTypeAdd | Self::MovieEventTypeUpdate => {
        Some(Collection::Movies)
      }
      Self::TripleEventTypeAdd | Self::TripleEventTypeUpdate => {
        Some(Collection::Triples)
      }
    }
  }
}

// ─── Channels ────────────────────────────────────────────────────────────────

/// A named topic subscribers attach to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Channel {
  #[serde(rename = "GENERAL_EVENT_CHANNEL")]
  #[strum(serialize = "GENERAL_EVENT_CHANNEL")]
  General,
  #[serde(rename = "PERSON_CHANNEL")]
  #[strum(serialize = "PERSON_CHANNEL")]
  Person,
  #[serde(rename = "TRIPLE_CHANNEL")]
  #[strum(serialize = "TRIPLE_CHANNEL")]
  Triple,
  #[serde(rename = "MOVIE_CHANNEL")]
  #[strum(serialize = "MOVIE_CHANNEL")]
  Movie,
  #[serde(rename = "HORROR_MOVIE_CHANNEL")]
  #[strum(serialize = "HORROR_MOVIE_CHANNEL")]
  HorrorMovie,
  #[serde(rename = "DRAMA_MOVIE_CHANNEL")]
  #[strum(serialize = "DRAMA_MOVIE_CHANNEL")]
  DramaMovie,
  #[serde(rename = "COMEDY_MOVIE_CHANNEL")]
  #[strum(serialize = "COMEDY_MOVIE_CHANNEL")]
  ComedyMovie,
}

impl Channel {
  /// Parse a channel name, mapping failures to [`Error::UnknownChannel`].
  pub fn parse(name: &str) -> Result<Self> {
    name
      .parse()
      .map_err(|_| Error::UnknownChannel(name.to_owned()))
  }

  /// Outlets for a movie event: always [`Channel::Movie`], plus the genre
  /// channel when the genre has one.
  pub fn for_movie(genre: Option<Genre>) -> Vec<Self> {
    let mut out = vec![Self::Movie];
    match genre {
      Some(Genre::Horror) => out.push(Self::HorrorMovie),
      Some(Genre::Drama) => out.push(Self::DramaMovie),
      Some(Genre::Comedy) => out.push(Self::ComedyMovie),
      Some(Genre::Other) | None => {}
    }
    out
  }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// An immutable, delivered-then-discarded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub id:         Uuid,
  pub name:       EventName,
  pub created_at: DateTime<Utc>,
  /// Equal to `created_at`; events are never persisted.
  pub stored_at:  DateTime<Utc>,
  /// A plain string for pings, the entity for entity events.
  pub body:       Value,
}

impl Event {
  /// Stamp a fresh envelope around `body`.
  pub fn new(name: EventName, body: Value) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      name,
      created_at: now,
      stored_at: now,
      body,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn movie_routing_by_genre() {
    assert_eq!(
      Channel::for_movie(Some(Genre::Horror)),
      [Channel::Movie, Channel::HorrorMovie]
    );
    assert_eq!(
      Channel::for_movie(Some(Genre::Comedy)),
      [Channel::Movie, Channel::ComedyMovie]
    );
    assert_eq!(Channel::for_movie(Some(Genre::Other)), [Channel::Movie]);
    assert_eq!(Channel::for_movie(None), [Channel::Movie]);
  }

  #[test]
  fn channel_names() {
    assert_eq!(Channel::HorrorMovie.to_string(), "HORROR_MOVIE_CHANNEL");
    assert_eq!(Channel::parse("person_channel").unwrap(), Channel::Person);
    assert!(matches!(
      Channel::parse("NOPE"),
      Err(Error::UnknownChannel(name)) if name == "NOPE"
    ));
    let json = serde_json::to_string(&Channel::General).unwrap();
    assert_eq!(json, "\"GENERAL_EVENT_CHANNEL\"");
  }

  #[test]
  fn event_names_carry_explicit_actions() {
    let add = EventName::for_entity(Collection::Persons, EventAction::Added);
    let update = EventName::for_entity(Collection::Persons, EventAction::Updated);
    assert_eq!(add.to_string(), "PERSON_EVENT_TYPE_ADD");
    assert_eq!(add.action(), Some(EventAction::Added));
    assert_eq!(update.action(), Some(EventAction::Updated));
    assert_eq!(EventName::Ping.action(), None);
    assert_eq!(
      EventName::TripleEventTypeUpdate.collection(),
      Some(Collection::Triples)
    );
  }

  #[test]
  fn envelope_stamps_fresh_ids() {
    let a = Event::new(EventName::Ping, Value::from("hello"));
    let b = Event::new(EventName::Ping, Value::from("hello"));
    assert_ne!(a.id, b.id);
    assert_eq!(a.created_at, a.stored_at);
    assert_eq!(a.body, "hello");
  }
}
