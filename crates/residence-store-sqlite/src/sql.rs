//! Translation of a [`ListQuery`] into a parameterised `SELECT`.
//!
//! Column names come from the static list declarations in `residence-core`,
//! never from user input, so they are interpolated directly. Values are
//! always bound.

use residence_core::query::ListQuery;
use rusqlite::types::Value;

use crate::encode::encode_filter_value;

pub struct Select {
  pub sql:    String,
  pub params: Vec<Value>,
}

pub fn select(columns: &str, table: &str, query: &ListQuery) -> Select {
  let mut conds: Vec<String> = Vec::new();
  let mut params: Vec<Value> = Vec::new();

  for filter in &query.filters {
    conds.push(format!("{} = ?", filter.column));
    params.push(encode_filter_value(&filter.value));
  }

  if let Some(search) = &query.search {
    for term in &search.terms {
      let pattern = format!("%{}%", escape_like(term));
      let alternatives: Vec<String> = search
        .columns
        .iter()
        .map(|column| {
          params.push(Value::Text(pattern.clone()));
          format!("{column} LIKE ? ESCAPE '\\'")
        })
        .collect();
      conds.push(format!("({})", alternatives.join(" OR ")));
    }
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", conds.join(" AND "))
  };

  // `id` always comes last so equal sort keys still list deterministically.
  let mut order: Vec<String> = query
    .ordering
    .iter()
    .map(|o| format!("{} {}", o.column, if o.descending { "DESC" } else { "ASC" }))
    .collect();
  if !query.ordering.iter().any(|o| o.column == "id") {
    order.push("id ASC".to_owned());
  }

  Select {
    sql: format!("SELECT {columns} FROM {table}{where_clause} ORDER BY {}", order.join(", ")),
    params,
  }
}

/// SQLite `LIKE` is already case-insensitive for ASCII; only the wildcards
/// need escaping.
fn escape_like(term: &str) -> String {
  let mut out = String::with_capacity(term.len());
  for c in term.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

#[cfg(test)]
mod tests {
  use residence_core::query::{Filter, FilterValue, Order, Search};

  use super::*;

  #[test]
  fn empty_query_orders_by_id() {
    let select = select("id, name", "buildings", &ListQuery::default());
    assert_eq!(select.sql, "SELECT id, name FROM buildings ORDER BY id ASC");
    assert!(select.params.is_empty());
  }

  #[test]
  fn filters_and_search_are_bound() {
    let query = ListQuery {
      filters:  vec![Filter { column: "capacity", value: FilterValue::Integer(2) }],
      search:   Some(Search {
        terms:   vec!["10%".into()],
        columns: vec!["room_number", "notes"],
      }),
      ordering: vec![Order { column: "capacity", descending: true }],
    };
    let select = select("id", "rooms", &query);
    assert_eq!(
      select.sql,
      "SELECT id FROM rooms WHERE capacity = ? AND \
       (room_number LIKE ? ESCAPE '\\' OR notes LIKE ? ESCAPE '\\') \
       ORDER BY capacity DESC, id ASC"
    );
    assert_eq!(select.params, vec![
      Value::Integer(2),
      Value::Text("%10\\%%".into()),
      Value::Text("%10\\%%".into()),
    ]);
  }

  #[test]
  fn explicit_id_ordering_is_not_repeated() {
    let query = ListQuery {
      ordering: vec![Order { column: "id", descending: true }],
      ..ListQuery::default()
    };
    assert!(select("id", "rooms", &query).sql.ends_with("ORDER BY id DESC"));
  }
}
