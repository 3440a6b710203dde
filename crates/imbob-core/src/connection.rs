//! Page shapes built from a pagination [`Window`].
//!
//! Two isomorphic views exist: the flat [`Page`] (`collection` + `page_info`)
//! and the relay-style [`Connection`] (`edges` + `page_info`). Both come from
//! the same window, so they always agree on items and cursors.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  pagination::{CursorSpec, Cursored, Direction, Window, compute_window},
};

/// Next-page metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
  /// Id of the last item in the returned (direction-ordered) items.
  pub end_cursor:    String,
  /// Whether another page exists in the direction of travel.
  pub has_next_page: bool,
}

/// The flat page shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub collection: Vec<T>,
  pub page_info:  PageInfo,
}

/// One item paired with its own cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge<T> {
  pub cursor: String,
  pub node:   T,
}

/// The edge/node page shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection<T> {
  pub edges:     Vec<Edge<T>>,
  pub page_info: PageInfo,
}

impl<T> Page<T> {
  /// Transform every item, keeping the page metadata.
  pub fn try_map<U, E>(
    self,
    f: impl FnMut(T) -> Result<U, E>,
  ) -> Result<Page<U>, E> {
    Ok(Page {
      collection: self.collection.into_iter().map(f).collect::<Result<_, _>>()?,
      page_info:  self.page_info,
    })
  }
}

impl<T> Connection<T> {
  /// Transform every node, keeping cursors and page metadata.
  pub fn try_map<U, E>(
    self,
    mut f: impl FnMut(T) -> Result<U, E>,
  ) -> Result<Connection<U>, E> {
    let edges = self
      .edges
      .into_iter()
      .map(|e| Ok(Edge { cursor: e.cursor, node: f(e.node)? }))
      .collect::<Result<_, E>>()?;
    Ok(Connection { edges, page_info: self.page_info })
  }
}

/// Resolve `spec` against `items` and return the flat page, or `None` when
/// the window holds nothing.
pub fn build_page<T: Cursored + Clone>(
  items: &[T],
  spec: &CursorSpec,
) -> Result<Option<Page<T>>> {
  let window = compute_window(items, spec)?;
  Ok(paged(&window).map(|(collection, page_info)| Page {
    collection,
    page_info,
  }))
}

/// Resolve `spec` against `items` and return the edge view, or `None` when
/// the window holds nothing.
pub fn build_connection<T: Cursored + Clone>(
  items: &[T],
  spec: &CursorSpec,
) -> Result<Option<Connection<T>>> {
  let window = compute_window(items, spec)?;
  Ok(paged(&window).map(|(nodes, page_info)| Connection {
    edges: nodes
      .into_iter()
      .map(|node| Edge { cursor: node.cursor().to_owned(), node })
      .collect(),
    page_info,
  }))
}

fn paged<T: Cursored + Clone>(
  window: &Window<'_, T>,
) -> Option<(Vec<T>, PageInfo)> {
  let range = window.range();
  let items = window.items();
  let last = items.last()?;

  let has_next_page = match window.direction {
    // The end cursor sits at `range.end - 1`; another item must follow it.
    Direction::Forward => range.end < window.sorted.len(),
    // Reversed: the end cursor is the lowest index of the slice.
    Direction::Backward => range.start > 0,
  };
  let page_info = PageInfo {
    end_cursor: last.cursor().to_owned(),
    has_next_page,
  };
  Some((items.into_iter().cloned().collect(), page_info))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    Error,
    pagination::tests::{Row, rows},
  };

  fn spec() -> CursorSpec { CursorSpec::default().with_default_sort("name") }

  fn ids(page: &Page<Row>) -> Vec<&str> {
    page.collection.iter().map(|r| r.id.as_str()).collect()
  }

  #[test]
  fn pages_through_twenty_five_rows() {
    let data = rows(25);

    let p1 = build_page(&data, &CursorSpec { first: Some(10), ..spec() })
      .unwrap()
      .unwrap();
    assert_eq!(p1.collection.len(), 10);
    assert_eq!(p1.collection[0].id, "id-00");
    assert_eq!(p1.page_info.end_cursor, "id-09");
    assert!(p1.page_info.has_next_page);

    let p2 = build_page(
      &data,
      &CursorSpec {
        after: Some(p1.page_info.end_cursor.clone()),
        ..spec()
      },
    )
    .unwrap()
    .unwrap();
    assert_eq!(p2.collection.len(), 10);
    assert_eq!(p2.collection[0].id, "id-10");
    assert_eq!(p2.page_info.end_cursor, "id-19");
    assert!(p2.page_info.has_next_page);
    assert!(ids(&p1).iter().all(|id| !ids(&p2).contains(id)));

    let p3 = build_page(
      &data,
      &CursorSpec {
        after: Some("id-19".into()),
        first: Some(10),
        ..spec()
      },
    )
    .unwrap()
    .unwrap();
    assert_eq!(ids(&p3), ["id-20", "id-21", "id-22", "id-23", "id-24"]);
    assert_eq!(p3.page_info.end_cursor, "id-24");
    assert!(!p3.page_info.has_next_page);
  }

  #[test]
  fn consecutive_pages_never_overlap() {
    let data = rows(23);
    let mut seen: Vec<String> = Vec::new();
    let mut s = CursorSpec { first: Some(4), ..spec() };
    while let Some(page) = build_page(&data, &s).unwrap() {
      for row in &page.collection {
        assert!(!seen.contains(&row.id), "{} returned twice", row.id);
        seen.push(row.id.clone());
      }
      if !page.page_info.has_next_page {
        break;
      }
      s.after = Some(page.page_info.end_cursor);
    }
    assert_eq!(seen.len(), 23);
  }

  #[test]
  fn backward_page_is_reversed_and_ends_at_lowest_item() {
    let data = rows(10);
    let page = build_page(
      &data,
      &CursorSpec {
        before: Some("id-05".into()),
        last: Some(2),
        ..spec()
      },
    )
    .unwrap()
    .unwrap();
    assert_eq!(ids(&page), ["id-04", "id-03"]);
    assert_eq!(page.page_info.end_cursor, "id-03");
    assert!(page.page_info.has_next_page);

    let head = build_page(
      &data,
      &CursorSpec { before: Some("id-02".into()), ..spec() },
    )
    .unwrap()
    .unwrap();
    assert_eq!(ids(&head), ["id-01", "id-00"]);
    assert!(!head.page_info.has_next_page);
  }

  #[test]
  fn empty_window_is_no_page() {
    let empty: Vec<Row> = Vec::new();
    assert!(build_page(&empty, &spec()).unwrap().is_none());
    assert!(build_connection(&empty, &spec()).unwrap().is_none());

    let data = rows(3);
    let past_end = CursorSpec { after: Some("id-02".into()), ..spec() };
    assert!(build_page(&data, &past_end).unwrap().is_none());
  }

  #[test]
  fn connection_matches_page() {
    let data = rows(12);
    let s = CursorSpec {
      after: Some("id-03".into()),
      first: Some(5),
      ..spec()
    };
    let page = build_page(&data, &s).unwrap().unwrap();
    let conn = build_connection(&data, &s).unwrap().unwrap();
    assert_eq!(conn.page_info, page.page_info);
    let cursors: Vec<&str> =
      conn.edges.iter().map(|e| e.cursor.as_str()).collect();
    assert_eq!(cursors, ids(&page));
    assert!(conn.edges.iter().all(|e| e.cursor == e.node.id));
  }

  #[test]
  fn errors_propagate_from_the_window() {
    let data = rows(3);
    let bad = CursorSpec { after: Some("missing".into()), ..spec() };
    assert!(matches!(
      build_connection(&data, &bad),
      Err(Error::CursorNotFound(_))
    ));
  }

  #[test]
  fn try_map_keeps_page_info() {
    let data = rows(3);
    let page = build_page(&data, &spec()).unwrap().unwrap();
    let info = page.page_info.clone();
    let names = page
      .try_map(|r| Ok::<_, Error>(r.name.unwrap_or_default()))
      .unwrap();
    assert_eq!(names.collection, ["name-00", "name-01", "name-02"]);
    assert_eq!(names.page_info, info);
  }
}
