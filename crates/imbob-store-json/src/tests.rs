//! Integration tests for `JsonStore` against a throwaway directory.

use chrono::Utc;
use imbob_core::{
  entity::Collection,
  movie::{Genre, Movie, MovieUpdate},
  person::{KnownPerson, NewPerson, Person},
  store::CollectionStore,
  triple::{Predicate, Triple},
};
use tempfile::TempDir;

use crate::{Error, JsonStore};

async fn store() -> (TempDir, JsonStore) {
  let dir = tempfile::tempdir().expect("temp dir");
  let store = JsonStore::open(dir.path()).await.expect("open store");
  (dir, store)
}

fn new_person(first: &str, last: &str) -> Person {
  NewPerson {
    first_name: first.into(),
    last_name:  last.into(),
    dob:        None,
    email:      Some(format!("{first}@example.com").to_lowercase()),
  }
  .into_person()
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_file_is_empty_collection() {
  let (_dir, s) = store().await;
  let persons: Vec<Person> = s.list().await.unwrap();
  assert!(persons.is_empty());
  assert!(s.get_by_id::<Person>("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn reads_existing_file() {
  let (dir, s) = store().await;
  std::fs::write(
    dir.path().join("persons.json"),
    r#"[{"id":"p1","first_name":"Ada","last_name":"Lovelace","dob":"1815-12-10","email":null}]"#,
  )
  .unwrap();

  let persons: Vec<Person> = s.list().await.unwrap();
  assert_eq!(persons.len(), 1);
  assert_eq!(persons[0].last_name, "Lovelace");
  assert_eq!(persons[0].dob.unwrap().to_string(), "1815-12-10");

  let found = s.get_by_id::<Person>("p1").await.unwrap().unwrap();
  assert_eq!(found, persons[0]);
}

#[tokio::test]
async fn malformed_file_is_reported() {
  let (dir, s) = store().await;
  std::fs::write(dir.path().join("movies.json"), "{not json").unwrap();
  let err = s.list::<Movie>().await.unwrap_err();
  assert!(matches!(err, Error::Malformed { .. }), "{err}");
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_appends_then_replaces() {
  let (_dir, s) = store().await;
  let ada = s.upsert(new_person("Ada", "Lovelace")).await.unwrap();
  let alan = s.upsert(new_person("Alan", "Turing")).await.unwrap();

  let mut renamed = ada.clone();
  renamed.last_name = "King".into();
  s.upsert(renamed).await.unwrap();

  let persons: Vec<Person> = s.list().await.unwrap();
  let names: Vec<&str> = persons.iter().map(|p| p.last_name.as_str()).collect();
  assert_eq!(names, ["King", "Turing"]);
  assert_eq!(persons[1].id, alan.id);
}

#[tokio::test]
async fn upsert_invalidates_cache() {
  let (_dir, s) = store().await;
  s.upsert(new_person("Ada", "Lovelace")).await.unwrap();

  let _: Vec<Person> = s.list().await.unwrap();
  assert!(s.is_cached(Collection::Persons));

  s.upsert(new_person("Alan", "Turing")).await.unwrap();
  assert!(!s.is_cached(Collection::Persons));

  let persons: Vec<Person> = s.list().await.unwrap();
  assert_eq!(persons.len(), 2);
}

#[tokio::test]
async fn collections_are_independent_files() {
  let (dir, s) = store().await;
  let ada = s.upsert(new_person("Ada", "Lovelace")).await.unwrap();
  let known = KnownPerson::from(&ada);
  s.upsert(Triple {
    id:         "t1".into(),
    subject:    known.clone(),
    predicate:  Predicate::Knows,
    object:     known,
    created_at: Utc::now(),
  })
  .await
  .unwrap();

  assert!(dir.path().join("persons.json").exists());
  assert!(dir.path().join("triples.json").exists());
  assert!(!dir.path().join("movies.json").exists());
  assert_eq!(s.list::<Triple>().await.unwrap().len(), 1);
  assert_eq!(s.list::<Person>().await.unwrap().len(), 1);
}

#[tokio::test]
async fn updated_movie_round_trips() {
  let (_dir, s) = store().await;
  let mut movie = Movie {
    id:           "m1".into(),
    title:        "Draft".into(),
    release_date: None,
    genre:        None,
    directors:    Vec::new(),
    actors:       Vec::new(),
  };
  s.upsert(movie.clone()).await.unwrap();

  movie.apply(MovieUpdate {
    title: Some("Final".into()),
    genre: Some(Genre::Drama),
    ..MovieUpdate::default()
  });
  s.upsert(movie).await.unwrap();

  let stored = s.get_by_id::<Movie>("m1").await.unwrap().unwrap();
  assert_eq!(stored.title, "Final");
  assert_eq!(stored.genre, Some(Genre::Drama));
  assert_eq!(s.list::<Movie>().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_upserts_are_all_kept() {
  let (_dir, s) = store().await;
  let handles: Vec<_> = (0..16)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        s.upsert(new_person("Test", &format!("Person{i:02}"))).await
      })
    })
    .collect();
  for h in handles {
    h.await.unwrap().unwrap();
  }
  assert_eq!(s.list::<Person>().await.unwrap().len(), 16);
}
