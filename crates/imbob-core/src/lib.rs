//! Core types and engines for the IMBOB demonstration API.
//!
//! This crate is deliberately free of HTTP and storage dependencies. It holds
//! the entity model, the [`store::CollectionStore`] abstraction, and the three
//! engines the API is built on: cursor pagination ([`pagination`],
//! [`connection`]), the scope overlay ([`scope`]) and the event bus ([`bus`]).

pub mod bus;
pub mod connection;
pub mod entity;
pub mod error;
pub mod event;
pub mod graph;
pub mod movie;
pub mod pagination;
pub mod person;
pub mod scope;
pub mod store;
pub mod triple;

pub use error::{Error, Result};
