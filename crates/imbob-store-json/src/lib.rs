//! Flat-file JSON backend for the IMBOB collection store.
//!
//! Each collection lives in one JSON array file under a data directory
//! (`persons.json`, `movies.json`, `triples.json`). Reads go through an
//! explicit per-collection cache that every upsert invalidates.

mod cache;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::JsonStore;

#[cfg(test)]
mod tests;
