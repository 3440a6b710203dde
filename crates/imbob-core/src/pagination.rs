//! Cursor pagination: resolving a [`CursorSpec`] against a collection.
//!
//! [`compute_window`] is pure: it sorts a borrowed view of the items and
//! returns the resolved boundaries as a [`Window`]. The caller's spec is never
//! modified. [`crate::connection`] turns a window into the page shapes the API
//! returns.

use std::{cmp::Ordering, ops::Range};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of items returned when a forward request does not give `first`.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Sort field used when neither the caller nor the call site names one.
pub const DEFAULT_SORT_FIELD: &str = "last_name";

// ─── Request ─────────────────────────────────────────────────────────────────

/// A caller-supplied windowing request.
///
/// `before` and `after` are opaque entity ids and are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorSpec {
  /// Return items strictly before this cursor, moving backward.
  pub before:          Option<String>,
  /// Return items after this cursor, moving forward.
  pub after:           Option<String>,
  /// Forward page size.
  pub first:           Option<usize>,
  /// Backward page size.
  pub last:            Option<usize>,
  /// Attribute used for the ascending total order.
  pub sort_field_name: Option<String>,
}

impl CursorSpec {
  /// Fill in `sort_field_name` if the caller left it empty.
  pub fn with_default_sort(mut self, field: &str) -> Self {
    if self.sort_field_name.as_deref().is_none_or(str::is_empty) {
      self.sort_field_name = Some(field.to_owned());
    }
    self
  }

  pub fn sort_field(&self) -> &str {
    self.sort_field_name.as_deref().unwrap_or(DEFAULT_SORT_FIELD)
  }

  pub fn direction(&self) -> Direction {
    if self.before.is_some() {
      Direction::Backward
    } else {
      Direction::Forward
    }
  }
}

/// Which way a page walks through the sorted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Forward,
  Backward,
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

/// A comparable projection of one attribute.
///
/// Items that lack the requested attribute yield [`SortValue::Missing`], which
/// orders after every present value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
  Number(i64),
  Date(NaiveDate),
  Time(DateTime<Utc>),
  Text(&'a str),
  Missing,
}

impl<'a> From<&'a str> for SortValue<'a> {
  fn from(s: &'a str) -> Self { Self::Text(s) }
}

impl<'a> From<Option<&'a str>> for SortValue<'a> {
  fn from(s: Option<&'a str>) -> Self { s.map_or(Self::Missing, Self::Text) }
}

/// Anything that can be paginated: it has a cursor id and sortable fields.
pub trait Cursored {
  /// The opaque cursor for this item (its entity id).
  fn cursor(&self) -> &str;

  /// Project the attribute named `field`. Implementations accept both the
  /// `snake_case` and `camelCase` spelling of their field names.
  fn sort_value(&self, field: &str) -> SortValue<'_>;
}

// ─── Window ──────────────────────────────────────────────────────────────────

/// The resolved result of a [`CursorSpec`]: the sorted view plus boundaries.
///
/// `start` and `end` are stored in request order; use [`Window::range`] for
/// slicing.
#[derive(Debug)]
pub struct Window<'a, T> {
  pub sorted:    Vec<&'a T>,
  pub start:     usize,
  pub end:       usize,
  pub direction: Direction,
}

impl<'a, T> Window<'a, T> {
  /// The numerically ordered, length-clamped slice range.
  pub fn range(&self) -> Range<usize> {
    let len = self.sorted.len();
    let lo = self.start.min(self.end).min(len);
    let hi = self.start.max(self.end).min(len);
    lo..hi
  }

  /// The windowed items, in request direction.
  pub fn items(&self) -> Vec<&'a T> {
    let mut items = self.sorted[self.range()].to_vec();
    if self.direction == Direction::Backward {
      items.reverse();
    }
    items
  }

  pub fn is_empty(&self) -> bool { self.range().is_empty() }
}

/// Sort `items` by `spec.sort_field()` and resolve the window `spec` asks for.
///
/// An empty collection yields an empty window rather than an error.
///
/// An `after` cursor naming the first sorted item does not advance past it.
/// Consecutive pages are therefore not disjoint when a page ends on the first
/// item: walking with `first = 1` returns the first item on every page and
/// never moves on. Clients that need disjoint pages should page with
/// `first >= 2`.
pub fn compute_window<'a, T: Cursored>(
  items: &'a [T],
  spec: &CursorSpec,
) -> Result<Window<'a, T>> {
  if let (Some(before), Some(after)) = (&spec.before, &spec.after) {
    return Err(Error::InvalidPaginationSpec {
      before: before.clone(),
      after:  after.clone(),
    });
  }

  let field = spec.sort_field();
  let mut sorted: Vec<&T> = items.iter().collect();
  // `sort_by` is stable, so ties keep their input order.
  sorted.sort_by(|a, b| compare(*a, *b, field));

  let direction = spec.direction();
  if sorted.is_empty() {
    return Ok(Window { sorted, start: 0, end: 0, direction });
  }

  let (start, end) = match &spec.before {
    Some(before) => {
      let end = locate(&sorted, before)?;
      let start = spec.last.map_or(0, |last| end.saturating_sub(last));
      (start, end)
    }
    None => {
      let start = match &spec.after {
        // The first item is never skipped, even when named as the cursor.
        Some(after) => match locate(&sorted, after)? {
          0 => 0,
          idx => idx + 1,
        },
        None => 0,
      };
      let count = spec.first.unwrap_or(DEFAULT_PAGE_SIZE);
      let len = sorted.len();
      (start.min(len), start.saturating_add(count).min(len))
    }
  };

  Ok(Window { sorted, start, end, direction })
}

fn compare<T: Cursored>(a: &T, b: &T, field: &str) -> Ordering {
  a.sort_value(field).cmp(&b.sort_value(field))
}

/// Index of the item whose cursor equals `cursor`.
fn locate<T: Cursored>(sorted: &[&T], cursor: &str) -> Result<usize> {
  sorted
    .iter()
    .position(|item| item.cursor() == cursor)
    .ok_or_else(|| Error::CursorNotFound(cursor.to_owned()))
}
